//! Filesystem measurement: the depth-bounded folder size calculator.

pub mod sizer;

pub use sizer::{DEFAULT_MAX_DEPTH, Measurement, compute_size, measure};

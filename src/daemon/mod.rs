//! Daily-schedule daemon: tick computation, signal handling, and the loop
//! that triggers the engine's scheduled silent check.

pub mod loop_main;
pub mod schedule;
pub mod signals;

pub use loop_main::run;
pub use signals::SignalHandler;

//! Depth-bounded folder size calculator.
//!
//! The sizer is a pure function of (path, depth limit): it walks a subtree
//! recursively, sums regular-file sizes, and truncates descent past the depth
//! limit so a pathological tree cannot stall a scan indefinitely. Every
//! per-item failure — unreadable metadata, permission-denied listings,
//! entries that vanish mid-walk — degrades to a zero contribution; the walk
//! itself never fails. A folder the user cannot fully read is still reported
//! as whatever size is measurable.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Depth limit applied when the caller has no configured override.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Outcome of one subtree measurement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Measurement {
    /// Total bytes of all regular files within the depth bound.
    pub bytes: u64,
    /// Subtrees and entries that could not be read and contributed zero.
    pub skipped: Vec<PathBuf>,
}

/// Compute the total byte size of the subtree rooted at `root`.
///
/// The root is at depth 0. A directory at depth `d <= max_depth` has its
/// non-hidden children enumerated at depth `d + 1`; any node past the depth
/// limit contributes zero. Hidden (dot-prefixed) entries are skipped
/// uniformly. Symlinks are not followed.
#[must_use]
pub fn compute_size(root: &Path, max_depth: usize) -> u64 {
    measure(root, max_depth).bytes
}

/// Like [`compute_size`], but also reports which entries were skipped due to
/// read failures. The byte total is identical.
#[must_use]
pub fn measure(root: &Path, max_depth: usize) -> Measurement {
    let mut measurement = Measurement::default();
    size_of_node(root, 0, max_depth, &mut measurement);
    measurement
}

fn size_of_node(path: &Path, depth: usize, max_depth: usize, out: &mut Measurement) {
    // Depth-truncation policy: anything past the limit contributes zero,
    // bounding worst-case latency on huge or deeply nested trees.
    if depth > max_depth {
        return;
    }

    let Ok(meta) = fs::symlink_metadata(path) else {
        out.skipped.push(path.to_path_buf());
        return;
    };

    if meta.is_file() {
        out.bytes = out.bytes.saturating_add(meta.len());
        return;
    }

    if !meta.is_dir() {
        // Symlinks, sockets, fifos: no contribution.
        return;
    }

    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(_) => {
            // Listing failure (permission denied, I/O error, transient
            // unmount): this subtree contributes zero, siblings continue.
            out.skipped.push(path.to_path_buf());
            return;
        }
    };

    for entry_result in entries {
        let Ok(entry) = entry_result else {
            continue;
        };
        if is_hidden(&entry.file_name()) {
            continue;
        }
        size_of_node(&entry.path(), depth + 1, max_depth, out);
    }
}

fn is_hidden(name: &OsStr) -> bool {
    name.as_encoded_bytes().first() == Some(&b'.')
}

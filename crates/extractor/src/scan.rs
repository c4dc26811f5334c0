//! Recursive archive discovery.
//!
//! Top-level discovery and the nested scan share one walk; they differ only in
//! when they run and how they log.

use crate::format::is_supported;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Every file under `dir` (any depth) with a supported extension.
///
/// Entries are visited in file-name order and symlinks are not followed.
/// Unreadable entries are logged and skipped.
pub fn find_archives(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %dir.display(), "Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if entry.file_type().is_file() && is_supported(entry.path()) {
            found.push(entry.into_path());
        }
    }

    found
}

/// Find the top-level archives under a user-chosen root.
pub fn discover(root: &Path) -> Vec<PathBuf> {
    info!("Scanning folder '{}' for top-level archives", root.display());
    let found = find_archives(root);
    info!(
        "Found {} top-level archive(s) in '{}'",
        found.len(),
        root.display()
    );
    found
}

/// Find archives exposed by a just-finished extraction.
pub fn scan_nested(extracted: &Path) -> Vec<PathBuf> {
    info!("Recursively scanning extracted folder '{}'", extracted.display());
    find_archives(extracted)
}

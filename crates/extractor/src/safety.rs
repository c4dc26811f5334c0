//! Entry-name checks for decoders that write entries themselves.
//!
//! The zip and tar crates refuse to write outside the destination on their own.
//! RAR entries are written one by one, so their names go through
//! [`resolve_entry`] first.

use crate::error::SecurityError;
use std::path::{Component, Path, PathBuf};

/// Normalise an archive entry name into a relative path.
///
/// Absolute names, drive prefixes and `..` components are rejected; `.`
/// components and duplicate separators are dropped.
///
/// ```
/// use std::path::Path;
/// use extractor::safety::validate_entry_path;
///
/// assert_eq!(
///     validate_entry_path(Path::new("./dir//file.txt")).unwrap(),
///     Path::new("dir/file.txt")
/// );
/// assert!(validate_entry_path(Path::new("../../etc/passwd")).is_err());
/// assert!(validate_entry_path(Path::new("/etc/passwd")).is_err());
/// ```
pub fn validate_entry_path(path: &Path) -> Result<PathBuf, SecurityError> {
    let display = || path.display().to_string();
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => return Err(SecurityError::PathTraversal(display())),
            Component::RootDir | Component::Prefix(_) => {
                return Err(SecurityError::AbsolutePath(display()))
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(SecurityError::PathTraversal(format!(
            "{} normalizes to an empty path",
            display()
        )));
    }

    Ok(normalized)
}

/// Join a validated entry name onto the destination directory.
pub fn resolve_entry(dest: &Path, entry: &Path) -> Result<PathBuf, SecurityError> {
    validate_entry_path(entry).map(|relative| dest.join(relative))
}

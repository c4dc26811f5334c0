//! Supported archive formats, extension matching and the destination naming rule.

use crate::types::CodecKind;
use std::fmt;
use std::path::{Path, PathBuf};

/// Extensions recognised as archives (lower-case, without the dot).
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["zip", "rar", "7z", "tar", "gz", "bz2"];

/// An archive format, identified by the file's final extension only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    Zip,
    SevenZip,
    Rar,
    Tar,
    Gzip,
    Bzip2,
}

impl ArchiveFormat {
    pub const ALL: [ArchiveFormat; 6] = [
        ArchiveFormat::Zip,
        ArchiveFormat::SevenZip,
        ArchiveFormat::Rar,
        ArchiveFormat::Tar,
        ArchiveFormat::Gzip,
        ArchiveFormat::Bzip2,
    ];

    /// Match an extension, with or without its leading dot, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.strip_prefix('.').unwrap_or(ext).to_ascii_lowercase();
        match ext.as_str() {
            "zip" => Some(ArchiveFormat::Zip),
            "7z" => Some(ArchiveFormat::SevenZip),
            "rar" => Some(ArchiveFormat::Rar),
            "tar" => Some(ArchiveFormat::Tar),
            "gz" => Some(ArchiveFormat::Gzip),
            "bz2" => Some(ArchiveFormat::Bzip2),
            _ => None,
        }
    }

    /// Format of `path` by its final extension. `a.tar.gz` is `Gzip`.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::SevenZip => "7z",
            ArchiveFormat::Rar => "rar",
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::Gzip => "gz",
            ArchiveFormat::Bzip2 => "bz2",
        }
    }

    /// Short label used in logs and error messages.
    pub fn label(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "ZIP",
            ArchiveFormat::SevenZip => "7Z",
            ArchiveFormat::Rar => "RAR",
            ArchiveFormat::Tar => "TAR",
            ArchiveFormat::Gzip => "GZIP",
            ArchiveFormat::Bzip2 => "BZIP2",
        }
    }

    /// The codec capability that decodes this format.
    pub fn codec(self) -> CodecKind {
        match self {
            ArchiveFormat::Zip => CodecKind::Zip,
            ArchiveFormat::SevenZip => CodecKind::SevenZip,
            ArchiveFormat::Rar | ArchiveFormat::Tar | ArchiveFormat::Gzip | ArchiveFormat::Bzip2 => {
                CodecKind::Generic
            }
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether `path` has a supported archive extension.
pub fn is_supported(path: &Path) -> bool {
    ArchiveFormat::from_path(path).is_some()
}

/// File name without its final extension.
///
/// Falls back to the full file name (or "archive") when there is no stem.
pub fn stem(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string())
}

/// Destination directory for `source` under `base`: `base/stem(source)`.
///
/// Archives sharing a stem in the same base (`a.zip`, `a.tar`) map to the
/// same directory and their contents are merged.
pub fn destination_dir(source: &Path, base: &Path) -> PathBuf {
    base.join(stem(source))
}

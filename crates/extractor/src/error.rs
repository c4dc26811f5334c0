//! Error types for archive extraction operations.

use crate::types::CodecKind;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error raised while decoding a single archive.
///
/// Every variant maps onto one [`ErrorKind`]; the extractor converts these into
/// an outcome and never lets them reach the coordinator.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The file extension is not in the supported set.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The archive is structurally corrupt.
    #[error("Bad archive format: {0}")]
    BadArchive(String),

    /// A decoder needed for this archive (or one of its entries) is unavailable.
    #[error("Missing codec capability: {0}")]
    MissingCodec(String),

    /// Permission denied, path not found, disk full and similar.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Failure reported by the multi-format decoder.
    #[error("Failed to decode {format} archive: {message}")]
    Decode {
        /// Format label, e.g. "RAR"
        format: &'static str,
        /// Message reported by the decoder
        message: String,
    },
}

impl ExtractError {
    /// Classify this error into the outcome taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            ExtractError::BadArchive(_) => ErrorKind::BadArchiveFormat,
            ExtractError::MissingCodec(_) => ErrorKind::MissingCodecCapability,
            ExtractError::Io(_) => ErrorKind::FilesystemError,
            ExtractError::Decode { .. } => ErrorKind::OpaqueDecodeFailure,
        }
    }

    /// Wrap an I/O error raised while a decoder was reading archive data.
    ///
    /// Errors that point at the filesystem stay `Io`; anything else is
    /// treated as a decode failure of `format`.
    pub(crate) fn from_decode_io(format: &'static str, err: io::Error) -> Self {
        if is_filesystem_error(&err) {
            return ExtractError::Io(err);
        }
        ExtractError::Decode {
            format,
            message: err.to_string(),
        }
    }

    /// Wrap an I/O error from a decoder that reports its own corruption
    /// (ZIP, 7z): anything that is not a filesystem error means the archive
    /// data is malformed.
    pub(crate) fn from_archive_io(err: io::Error) -> Self {
        if is_filesystem_error(&err) {
            return ExtractError::Io(err);
        }
        ExtractError::BadArchive(err.to_string())
    }
}

fn is_filesystem_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::AlreadyExists
            | io::ErrorKind::StorageFull
            | io::ErrorKind::ReadOnlyFilesystem
    )
}

/// Outcome taxonomy for a failed (or skipped) extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Not an error; the file was passed over.
    UnsupportedFormat,
    BadArchiveFormat,
    MissingCodecCapability,
    FilesystemError,
    OpaqueDecodeFailure,
    /// The task panicked or was lost by the worker pool.
    Unexpected,
}

/// Configuration problems detected before any extraction starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A codec slot was left empty when building the dispatcher.
    #[error("No codec registered for {0}")]
    MissingCodec(CodecKind),

    /// The output base is the same directory as the input root.
    #[error("Output directory cannot be the same as the input directory: {0}")]
    OutputIsInput(PathBuf),

    /// The input root does not exist or is not a directory.
    #[error("Input directory not found: {0}")]
    InputNotFound(PathBuf),

    /// Nothing was selected.
    #[error("No input archives given")]
    NoInput,

    /// The worker count must be at least one.
    #[error("Invalid worker count: {0}")]
    InvalidWorkers(usize),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Security-related errors for archive entry names.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// Path traversal attempt detected (e.g., "../../../etc/passwd").
    #[error("Path traversal attempt: {0}")]
    PathTraversal(String),

    /// Absolute path not allowed in archive entries.
    #[error("Absolute path not allowed: {0}")]
    AbsolutePath(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            ExtractError::BadArchive("x".into()).kind(),
            ErrorKind::BadArchiveFormat
        );
        assert_eq!(
            ExtractError::MissingCodec("x".into()).kind(),
            ErrorKind::MissingCodecCapability
        );
        assert_eq!(
            ExtractError::Io(io::Error::from(io::ErrorKind::NotFound)).kind(),
            ErrorKind::FilesystemError
        );
        assert_eq!(
            ExtractError::Decode {
                format: "RAR",
                message: "x".into()
            }
            .kind(),
            ErrorKind::OpaqueDecodeFailure
        );
    }

    #[test]
    fn test_from_decode_io() {
        let err = ExtractError::from_decode_io(
            "TAR",
            io::Error::new(io::ErrorKind::InvalidData, "bad header"),
        );
        assert_eq!(err.kind(), ErrorKind::OpaqueDecodeFailure);

        let err = ExtractError::from_decode_io(
            "TAR",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert_eq!(err.kind(), ErrorKind::FilesystemError);
    }

    #[test]
    fn test_from_archive_io() {
        for kind in [
            io::ErrorKind::InvalidData,
            io::ErrorKind::UnexpectedEof,
            io::ErrorKind::Other,
        ] {
            let err = ExtractError::from_archive_io(io::Error::new(kind, "corrupt"));
            assert_eq!(err.kind(), ErrorKind::BadArchiveFormat);
        }

        let err = ExtractError::from_archive_io(io::Error::from(io::ErrorKind::StorageFull));
        assert_eq!(err.kind(), ErrorKind::FilesystemError);
    }
}

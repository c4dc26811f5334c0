//! # Extractor
//!
//! Concurrent batch extraction of archive files.
//!
//! Each archive is extracted into its own `<output>/<stem>/` directory by a
//! bounded pool of workers. With recursion enabled, archives exposed by an
//! extraction are extracted in place as well, on the same worker.
//!
//! ## Supported Formats
//!
//! - ZIP
//! - 7-Zip
//! - RAR (read-only)
//! - TAR, plus GZIP and BZIP2 (tarballs or single compressed files)
//!
//! ## Example
//!
//! ```rust,no_run
//! use extractor::{BatchOptions, CodecSet, Coordinator, InputSource};
//! use std::path::{Path, PathBuf};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let options = BatchOptions {
//!     recursive: true,
//!     ..BatchOptions::default()
//! };
//! let coordinator = Coordinator::new(&options, CodecSet::builtin())?;
//!
//! let source = InputSource::Directory(PathBuf::from("downloads"));
//! let summary = coordinator
//!     .run_source(&source, Path::new("extracted"), options.recursive)
//!     .await?;
//!
//! println!("Success: {}, Failures: {}", summary.success_count, summary.failure_count);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod coordinator;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod format;
pub mod safety;
pub mod scan;
pub mod types;

// Re-export main types
pub use codec::{Codec, GenericCodec, SevenZipCodec, ZipCodec};
pub use coordinator::{plan, Coordinator, InputSource};
pub use dispatch::{CodecSet, Dispatcher};
pub use error::{ConfigError, ErrorKind, ExtractError, SecurityError};
pub use extract::Extractor;
pub use format::{destination_dir, is_supported, ArchiveFormat, SUPPORTED_EXTENSIONS};
pub use scan::{discover, find_archives, scan_nested};
pub use types::{
    default_workers, ArchiveTask, BatchOptions, CodecKind, ExtractionOutcome, RunSummary,
    DEFAULT_MAX_DEPTH,
};

use std::path::Path;

/// Type alias for progress callback functions.
///
/// The callback receives:
/// - `outcome`: The top-level outcome that just finished
/// - `completed`: Number of top-level tasks finished so far
/// - `total`: Number of top-level tasks in the run
pub type ProgressCallback<'a> = dyn Fn(&ExtractionOutcome, usize, usize) + Send + Sync + 'a;

/// Extract a batch of archives with the built-in codecs.
///
/// # Arguments
///
/// * `source` - Selected files, or a directory to search for archives
/// * `output_dir` - Base directory receiving one sub-directory per archive
/// * `options` - Worker count, recursion and depth limit
///
/// # Errors
///
/// Returns an error only for configuration problems detected before any
/// archive is touched: an empty selection, a missing input directory, an
/// output directory equal to the input directory, or zero workers. Failures
/// of individual archives are counted in the returned summary.
pub async fn extract_batch(
    source: &InputSource,
    output_dir: &Path,
    options: &BatchOptions,
) -> Result<RunSummary, ConfigError> {
    let coordinator = Coordinator::new(options, CodecSet::builtin())?;
    coordinator
        .run_source(source, output_dir, options.recursive)
        .await
}

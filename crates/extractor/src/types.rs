//! Type definitions for batch extraction.

use crate::error::{ErrorKind, ExtractError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default limit on how many archives deep nested extraction descends.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Smallest worker pool the coordinator will size itself to by default.
pub const MIN_WORKERS: usize = 4;

/// One archive waiting to be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveTask {
    /// Absolute path of the archive file
    pub source: PathBuf,

    /// Directory under which `<stem>/` is created
    pub output_base: PathBuf,

    /// Whether to extract archives found inside the extracted output
    pub recursive: bool,
}

impl ArchiveTask {
    pub fn new(source: impl Into<PathBuf>, output_base: impl Into<PathBuf>, recursive: bool) -> Self {
        Self {
            source: source.into(),
            output_base: output_base.into(),
            recursive,
        }
    }
}

/// Result of extracting one archive, including any archives nested inside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    /// Archive this outcome belongs to
    pub source: PathBuf,

    /// Whether the primary extraction succeeded (skips count as success)
    pub succeeded: bool,

    /// Set when the file was passed over because its extension is unsupported
    pub skipped: bool,

    /// Directory the archive was extracted into, when one was created
    pub destination: Option<PathBuf>,

    /// Failure classification
    pub error_kind: Option<ErrorKind>,

    /// Human-readable failure message
    pub error: Option<String>,

    /// 0 for top-level archives, parent depth + 1 for nested ones
    pub depth: usize,

    /// Outcomes for archives found inside this one, in discovery order
    pub nested: Vec<ExtractionOutcome>,
}

impl ExtractionOutcome {
    pub(crate) fn success(source: &Path, destination: PathBuf, depth: usize) -> Self {
        Self {
            source: source.to_path_buf(),
            succeeded: true,
            skipped: false,
            destination: Some(destination),
            error_kind: None,
            error: None,
            depth,
            nested: Vec::new(),
        }
    }

    pub(crate) fn skipped(source: &Path, depth: usize) -> Self {
        Self {
            source: source.to_path_buf(),
            succeeded: true,
            skipped: true,
            destination: None,
            error_kind: Some(ErrorKind::UnsupportedFormat),
            error: None,
            depth,
            nested: Vec::new(),
        }
    }

    pub(crate) fn failure(
        source: &Path,
        destination: Option<PathBuf>,
        err: &ExtractError,
        depth: usize,
    ) -> Self {
        Self {
            source: source.to_path_buf(),
            succeeded: false,
            skipped: false,
            destination,
            error_kind: Some(err.kind()),
            error: Some(err.to_string()),
            depth,
            nested: Vec::new(),
        }
    }

    /// Outcome for a task that never produced one of its own (panic, lost task).
    pub(crate) fn unexpected(source: &Path, message: String) -> Self {
        Self {
            source: source.to_path_buf(),
            succeeded: false,
            skipped: false,
            destination: None,
            error_kind: Some(ErrorKind::Unexpected),
            error: Some(message),
            depth: 0,
            nested: Vec::new(),
        }
    }

    /// Number of nested outcomes below this one, at any depth.
    pub fn nested_count(&self) -> usize {
        self.nested.iter().map(|n| 1 + n.nested_count()).sum()
    }

    /// Number of nested outcomes below this one that failed, at any depth.
    pub fn nested_failures(&self) -> usize {
        self.nested
            .iter()
            .map(|n| usize::from(!n.succeeded) + n.nested_failures())
            .sum()
    }
}

/// Tally of a coordinator run.
///
/// Counts only cover top-level archives; nested results live inside each
/// outcome and are informational.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub success_count: usize,
    pub failure_count: usize,

    /// Top-level outcomes in completion order
    pub outcomes: Vec<ExtractionOutcome>,
}

impl RunSummary {
    /// Record one top-level outcome.
    pub(crate) fn record(&mut self, outcome: ExtractionOutcome) {
        if outcome.succeeded {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
        self.outcomes.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.success_count + self.failure_count
    }

    /// True when no top-level archive failed.
    pub fn is_success(&self) -> bool {
        self.failure_count == 0
    }
}

/// Options for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Number of archives extracted in parallel
    pub workers: usize,

    /// Extract archives found inside extracted output
    pub recursive: bool,

    /// Maximum nesting depth for recursive extraction
    pub max_depth: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            recursive: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Available parallelism, but never fewer than [`MIN_WORKERS`].
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(MIN_WORKERS)
        .max(MIN_WORKERS)
}

/// The three decoding capabilities the dispatcher can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    /// Built-in ZIP decoder
    Zip,
    /// 7z container decoder
    SevenZip,
    /// Multi-format decoder for RAR, TAR, GZIP and BZIP2
    Generic,
}

impl CodecKind {
    pub const ALL: [CodecKind; 3] = [CodecKind::Zip, CodecKind::SevenZip, CodecKind::Generic];

    pub(crate) fn index(self) -> usize {
        match self {
            CodecKind::Zip => 0,
            CodecKind::SevenZip => 1,
            CodecKind::Generic => 2,
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodecKind::Zip => "zip",
            CodecKind::SevenZip => "7z",
            CodecKind::Generic => "generic",
        };
        f.write_str(name)
    }
}

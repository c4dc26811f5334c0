//! Single-archive extraction with optional recursion into nested archives.

use crate::dispatch::Dispatcher;
use crate::error::ExtractError;
use crate::format::{destination_dir, ArchiveFormat};
use crate::scan::scan_nested;
use crate::types::{ArchiveTask, ExtractionOutcome, DEFAULT_MAX_DEPTH};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Extracts one archive into `output_base/<stem>/`, then (when the task asks
/// for it) every archive that extraction exposed.
///
/// Nested archives are extracted next to where they were found and run on the
/// calling thread, so a worker stays busy for the whole nested chain.
#[derive(Debug, Clone)]
pub struct Extractor {
    dispatcher: Arc<Dispatcher>,
    max_depth: usize,
}

impl Extractor {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit how many archives deep recursion goes. Archives found below the
    /// limit are left unextracted.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Extract `task`. Errors never escape; they are classified into the outcome.
    pub fn extract(&self, task: &ArchiveTask) -> ExtractionOutcome {
        self.extract_at(task, 0)
    }

    fn extract_at(&self, task: &ArchiveTask, depth: usize) -> ExtractionOutcome {
        let source = task.source.as_path();

        if !source.is_file() {
            let err = ExtractError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("not a file: {}", source.display()),
            ));
            error!("Input path is not a file: {}", source.display());
            return ExtractionOutcome::failure(source, None, &err, depth);
        }

        let Some(format) = ArchiveFormat::from_path(source) else {
            warn!("Skipping unsupported file format: {}", source.display());
            return ExtractionOutcome::skipped(source, depth);
        };

        let dest = destination_dir(source, &task.output_base);
        info!(
            "Attempting to extract '{}' -> '{}'",
            display_name(source),
            dest.display()
        );

        let result = fs::create_dir_all(&dest)
            .map_err(ExtractError::from)
            .and_then(|()| self.dispatcher.dispatch(format, source, &dest));

        if let Err(e) = result {
            error!("Extraction failed for '{}': {}", display_name(source), e);
            return ExtractionOutcome::failure(source, Some(dest), &e, depth);
        }

        info!("Successfully extracted '{}'", display_name(source));
        let mut outcome = ExtractionOutcome::success(source, dest.clone(), depth);

        if task.recursive {
            outcome.nested = self.extract_nested(&dest, &task.output_base, depth);
        }

        outcome
    }

    fn extract_nested(&self, dest: &Path, base: &Path, depth: usize) -> Vec<ExtractionOutcome> {
        let found = scan_nested(dest);
        if found.is_empty() {
            info!("No nested archives found in '{}'", dest.display());
            return Vec::new();
        }

        if depth >= self.max_depth {
            warn!(
                "Not extracting {} nested archive(s) in '{}': depth limit {} reached",
                found.len(),
                dest.display(),
                self.max_depth
            );
            return Vec::new();
        }

        info!(
            "Found {} nested archive(s) in '{}'",
            found.len(),
            dest.display()
        );

        found
            .into_iter()
            .map(|path| {
                let relative = path.strip_prefix(base).unwrap_or(&path);
                info!("Starting nested extraction for '{}'", relative.display());

                let parent = path.parent().unwrap_or(dest).to_path_buf();
                let nested = self.extract_at(&ArchiveTask::new(path.clone(), parent, true), depth + 1);

                if nested.succeeded {
                    info!("Finished nested extraction for '{}'", display_name(&path));
                } else {
                    warn!("Nested extraction failed for '{}'", display_name(&path));
                }
                nested
            })
            .collect()
    }
}

fn display_name(path: &Path) -> std::borrow::Cow<'_, str> {
    path.file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_else(|| path.to_string_lossy())
}

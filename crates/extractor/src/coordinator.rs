//! Batch coordination: input planning and the bounded worker pool.

use crate::dispatch::{CodecSet, Dispatcher};
use crate::error::ConfigError;
use crate::extract::Extractor;
use crate::scan::discover;
use crate::types::{ArchiveTask, BatchOptions, ExtractionOutcome, RunSummary};
use crate::ProgressCallback;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinError, JoinSet};
use tracing::{error, info, warn};

/// Where the top-level archives come from. Exactly one per run.
#[derive(Debug, Clone)]
pub enum InputSource {
    /// Explicitly selected archive files
    Files(Vec<PathBuf>),
    /// A root directory walked by discovery
    Directory(PathBuf),
}

/// Turn an input selection into top-level tasks.
///
/// Relative paths are resolved against the current directory. When the input
/// is a directory the output base must not be that same directory.
pub fn plan(
    source: &InputSource,
    output_base: &Path,
    recursive: bool,
) -> Result<Vec<ArchiveTask>, ConfigError> {
    let output_base = std::path::absolute(output_base)?;

    let paths = match source {
        InputSource::Files(files) => files
            .iter()
            .map(std::path::absolute)
            .collect::<Result<Vec<_>, _>>()?,
        InputSource::Directory(root) => {
            if !root.is_dir() {
                return Err(ConfigError::InputNotFound(root.clone()));
            }
            let root = root.canonicalize()?;
            if same_dir(&root, &output_base) {
                return Err(ConfigError::OutputIsInput(output_base));
            }
            discover(&root)
        }
    };

    if paths.is_empty() {
        return Err(ConfigError::NoInput);
    }

    Ok(paths
        .into_iter()
        .map(|path| ArchiveTask::new(path, output_base.clone(), recursive))
        .collect())
}

fn same_dir(root: &Path, output: &Path) -> bool {
    match output.canonicalize() {
        Ok(output) => output == root,
        // Not created yet, so it cannot be an existing input root
        Err(_) => output == root,
    }
}

/// Runs top-level tasks over a fixed-size pool and tallies their outcomes.
#[derive(Debug, Clone)]
pub struct Coordinator {
    extractor: Arc<Extractor>,
    workers: usize,
}

impl Coordinator {
    /// Build a coordinator; fails if a codec is missing or `workers` is zero.
    pub fn new(options: &BatchOptions, codecs: CodecSet) -> Result<Self, ConfigError> {
        if options.workers == 0 {
            return Err(ConfigError::InvalidWorkers(options.workers));
        }
        let dispatcher = Arc::new(Dispatcher::new(codecs)?);
        let extractor = Extractor::new(dispatcher).with_max_depth(options.max_depth);

        Ok(Self {
            extractor: Arc::new(extractor),
            workers: options.workers,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Extract every task and return the top-level tally.
    pub async fn run(&self, tasks: Vec<ArchiveTask>) -> RunSummary {
        self.run_with_progress(tasks, &|_, _, _| {}).await
    }

    /// Like [`Coordinator::run`], calling `progress` once per finished
    /// top-level task with `(outcome, completed, total)`.
    pub async fn run_with_progress(
        &self,
        tasks: Vec<ArchiveTask>,
        progress: &ProgressCallback<'_>,
    ) -> RunSummary {
        let total = tasks.len();
        let recursive = tasks.iter().any(|t| t.recursive);
        info!(
            "Starting extraction of {} top-level archive(s) using up to {} workers",
            total, self.workers
        );
        info!(
            "Recursive extraction is {}",
            if recursive { "ENABLED" } else { "DISABLED" }
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut join_set = JoinSet::new();
        let mut sources = HashMap::with_capacity(total);

        for task in tasks {
            let semaphore = semaphore.clone();
            let extractor = self.extractor.clone();
            let source = task.source.clone();

            let handle = join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let source = task.source.clone();

                let result =
                    tokio::task::spawn_blocking(move || run_guarded(&extractor, &task)).await;

                match result {
                    Ok(outcome) => outcome,
                    Err(e) => ExtractionOutcome::unexpected(&source, e.to_string()),
                }
            });
            sources.insert(handle.id(), source);
        }

        let mut summary = RunSummary::default();
        while let Some(joined) = join_set.join_next_with_id().await {
            let outcome = match joined {
                Ok((id, outcome)) => {
                    sources.remove(&id);
                    outcome
                }
                Err(e) => lost_task_outcome(&mut sources, e),
            };

            let done = summary.total() + 1;
            log_progress(&outcome, done, total);
            progress(&outcome, done, total);
            summary.record(outcome);
        }

        info!(
            "Top-level extraction finished. Success: {}, Failures: {}",
            summary.success_count, summary.failure_count
        );
        summary
    }

    /// Plan `source` and run it.
    pub async fn run_source(
        &self,
        source: &InputSource,
        output_base: &Path,
        recursive: bool,
    ) -> Result<RunSummary, ConfigError> {
        let tasks = plan(source, output_base, recursive)?;
        Ok(self.run(tasks).await)
    }
}

/// Run one task, converting a panic into a failed outcome.
fn run_guarded(extractor: &Extractor, task: &ArchiveTask) -> ExtractionOutcome {
    panic::catch_unwind(AssertUnwindSafe(|| extractor.extract(task))).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        error!(
            "Unexpected error processing '{}': {}",
            task.source.display(),
            message
        );
        ExtractionOutcome::unexpected(&task.source, message)
    })
}

/// Failed outcome for a task the pool lost, attributed to its archive.
fn lost_task_outcome(
    sources: &mut HashMap<task::Id, PathBuf>,
    err: JoinError,
) -> ExtractionOutcome {
    let source = sources.remove(&err.id()).unwrap_or_default();
    error!("Extraction task for '{}' was lost: {}", source.display(), err);
    ExtractionOutcome::unexpected(&source, err.to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

fn log_progress(outcome: &ExtractionOutcome, done: usize, total: usize) {
    let name = outcome.source.display();
    if outcome.succeeded {
        info!("Progress: {}/{} - Processed top-level '{}'", done, total, name);
    } else {
        warn!(
            "Progress: {}/{} - Failed to process top-level '{}'",
            done, total, name
        );
    }
    let nested_failures = outcome.nested_failures();
    if nested_failures > 0 {
        warn!(
            "'{}': {} of {} nested archive(s) failed",
            name,
            nested_failures,
            outcome.nested_count()
        );
    }
}

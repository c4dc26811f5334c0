//! Integration tests for batch coordination.

use extractor::{
    extract_batch, plan, ArchiveFormat, ArchiveTask, BatchOptions, Codec, CodecKind, CodecSet,
    ConfigError, Coordinator, ErrorKind, ExtractError, InputSource,
};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

fn create_zip(path: &Path, files: &[(&str, &[u8])]) -> std::io::Result<()> {
    use zip::write::{SimpleFileOptions, ZipWriter};

    let mut zip = ZipWriter::new(File::create(path)?);
    for (name, content) in files {
        zip.start_file(*name, SimpleFileOptions::default())?;
        zip.write_all(content)?;
    }
    zip.finish()?;
    Ok(())
}

/// Write `count` small zip files named `archive_<n>.zip` into `dir`.
fn create_many(dir: &Path, count: usize) -> Vec<PathBuf> {
    fs::create_dir_all(dir).unwrap();
    (0..count)
        .map(|i| {
            let path = dir.join(format!("archive_{i}.zip"));
            let body = format!("payload {i}");
            create_zip(&path, &[("payload.txt", body.as_bytes())]).unwrap();
            path
        })
        .collect()
}

fn options(workers: usize, recursive: bool) -> BatchOptions {
    BatchOptions {
        workers,
        recursive,
        ..BatchOptions::default()
    }
}

fn tasks_for(paths: &[PathBuf], out: &Path, recursive: bool) -> Vec<ArchiveTask> {
    paths
        .iter()
        .map(|p| ArchiveTask::new(p, out, recursive))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_hundred_archives_all_counted() {
    let temp = TempDir::new().unwrap();
    let inputs = create_many(&temp.path().join("in"), 100);
    let coordinator = Coordinator::new(&options(4, false), CodecSet::builtin()).unwrap();

    for trial in 0..3 {
        let out = temp.path().join(format!("out_{trial}"));
        let summary = coordinator.run(tasks_for(&inputs, &out, false)).await;

        assert_eq!(summary.success_count, 100);
        assert_eq!(summary.failure_count, 0);
        assert_eq!(summary.outcomes.len(), 100);
        assert!(summary.is_success());
        assert_eq!(
            fs::read_to_string(out.join("archive_42/payload.txt")).unwrap(),
            "payload 42"
        );
    }
}

#[tokio::test]
async fn test_task_count_is_conserved() {
    let temp = TempDir::new().unwrap();
    let mut inputs = create_many(&temp.path().join("in"), 7);

    let broken = temp.path().join("in/broken.zip");
    fs::write(&broken, b"not a zip").unwrap();
    inputs.push(broken);
    inputs.push(temp.path().join("in/missing.zip"));
    let skipped = temp.path().join("in/readme.txt");
    fs::write(&skipped, b"text").unwrap();
    inputs.push(skipped);

    for workers in [1, 2, 4, 16] {
        let out = temp.path().join(format!("out_{workers}"));
        let coordinator = Coordinator::new(&options(workers, false), CodecSet::builtin()).unwrap();
        let summary = coordinator.run(tasks_for(&inputs, &out, false)).await;

        assert_eq!(summary.total(), inputs.len());
        assert_eq!(summary.success_count, 8);
        assert_eq!(summary.failure_count, 2);
    }
}

#[tokio::test]
async fn test_nested_results_do_not_change_tally() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("in");
    fs::create_dir_all(&input).unwrap();

    let outer = input.join("outer.zip");
    create_zip(
        &outer,
        &[("inner.rar", b"corrupted rar"), ("also_bad.zip", b"corrupted zip")],
    )
    .unwrap();

    let out = temp.path().join("out");
    let coordinator = Coordinator::new(&options(2, true), CodecSet::builtin()).unwrap();
    let summary = coordinator
        .run_source(&InputSource::Directory(input), &out, true)
        .await
        .unwrap();

    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.failure_count, 0);
    let outcome = &summary.outcomes[0];
    assert_eq!(outcome.nested.len(), 2);
    assert_eq!(outcome.nested_failures(), 2);
    assert!(out.join("outer/inner").is_dir());
}

struct PanickingCodec;

impl Codec for PanickingCodec {
    fn extract(&self, _: ArchiveFormat, _: &Path, _: &Path) -> Result<(), ExtractError> {
        panic!("codec blew up");
    }
}

#[tokio::test]
async fn test_panicking_task_counts_as_failure() {
    let temp = TempDir::new().unwrap();
    let mut inputs = create_many(&temp.path().join("in"), 3);
    let tarball = temp.path().join("in/x.tar");
    fs::write(&tarball, b"whatever").unwrap();
    inputs.push(tarball.clone());

    let codecs = CodecSet::builtin().with(CodecKind::Generic, PanickingCodec);
    let coordinator = Coordinator::new(&options(2, false), codecs).unwrap();
    let summary = coordinator
        .run(tasks_for(&inputs, &temp.path().join("out"), false))
        .await;

    assert_eq!(summary.success_count, 3);
    assert_eq!(summary.failure_count, 1);
    let failed = summary.outcomes.iter().find(|o| !o.succeeded).unwrap();
    assert_eq!(failed.source, tarball);
    assert_eq!(failed.error_kind, Some(ErrorKind::Unexpected));
}

/// Records the peak number of concurrent decodes.
struct SlowCodec {
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl Codec for SlowCodec {
    fn extract(&self, _: ArchiveFormat, _: &Path, _: &Path) -> Result<(), ExtractError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pool_bounds_concurrency() {
    let temp = TempDir::new().unwrap();
    let inputs = create_many(&temp.path().join("in"), 24);

    let peak = Arc::new(AtomicUsize::new(0));
    let codec = SlowCodec {
        active: Arc::new(AtomicUsize::new(0)),
        peak: peak.clone(),
    };
    let codecs = CodecSet::builtin().with(CodecKind::Zip, codec);
    let coordinator = Coordinator::new(&options(3, false), codecs).unwrap();

    let summary = coordinator
        .run(tasks_for(&inputs, &temp.path().join("out"), false))
        .await;

    assert_eq!(summary.success_count, 24);
    assert!(peak.load(Ordering::SeqCst) <= 3);
    assert!(peak.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_progress_callback_sees_every_task() {
    let temp = TempDir::new().unwrap();
    let inputs = create_many(&temp.path().join("in"), 5);
    let coordinator = Coordinator::new(&options(2, false), CodecSet::builtin()).unwrap();

    let seen = Mutex::new(Vec::new());
    let progress = |_outcome: &extractor::ExtractionOutcome, done: usize, total: usize| {
        seen.lock().unwrap().push((done, total));
    };
    coordinator
        .run_with_progress(tasks_for(&inputs, &temp.path().join("out"), false), &progress)
        .await;

    let seen = seen.into_inner().unwrap();
    assert_eq!(seen, (1..=5).map(|d| (d, 5)).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_extract_batch_from_files() {
    let temp = TempDir::new().unwrap();
    let inputs = create_many(&temp.path().join("in"), 2);
    let out = temp.path().join("out");

    let summary = extract_batch(&InputSource::Files(inputs), &out, &options(2, false))
        .await
        .unwrap();

    assert_eq!(summary.success_count, 2);
    assert!(out.join("archive_0/payload.txt").is_file());
    assert!(out.join("archive_1/payload.txt").is_file());
}

#[tokio::test]
async fn test_extract_batch_rejects_output_in_input() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("in");
    create_many(&input, 1);

    let result = extract_batch(
        &InputSource::Directory(input.clone()),
        &input,
        &options(2, false),
    )
    .await;

    assert!(matches!(result, Err(ConfigError::OutputIsInput(_))));
    assert!(!input.join("archive_0").exists());
}

#[test]
fn test_missing_codec_is_config_error() {
    let result = Coordinator::new(
        &options(2, false),
        CodecSet::builtin().without(CodecKind::SevenZip),
    );
    assert!(matches!(
        result,
        Err(ConfigError::MissingCodec(CodecKind::SevenZip))
    ));
}

#[test]
fn test_plan_files_keeps_order() {
    let temp = TempDir::new().unwrap();
    let files = vec![temp.path().join("b.zip"), temp.path().join("a.rar")];
    let tasks = plan(&InputSource::Files(files.clone()), &temp.path().join("out"), true).unwrap();

    let sources: Vec<_> = tasks.into_iter().map(|t| t.source).collect();
    assert_eq!(sources, files);
}

//! Command-line interface for batch archive extraction.
//!
//! Extracts a list of archives, or every archive found under a folder, into
//! one sub-folder per archive, optionally descending into nested archives.

use clap::{Parser, Subcommand};
use extractor::{
    default_workers, discover, BatchOptions, CodecSet, Coordinator, ExtractionOutcome,
    InputSource, RunSummary, DEFAULT_MAX_DEPTH,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "bulk-extract")]
#[command(version, about = "Extract many archives in parallel", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract archives into one sub-folder each
    Extract {
        /// Archive files to extract
        #[arg(required_unless_present = "dir", conflicts_with = "dir")]
        archives: Vec<PathBuf>,

        /// Folder to search (recursively) for archives instead of listing files
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// Also extract archives found inside extracted archives
        #[arg(short, long)]
        recursive: bool,

        /// Number of archives extracted in parallel
        #[arg(short, long, default_value_t = default_workers())]
        workers: usize,

        /// How many archives deep recursive extraction may go
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Hide the progress bar
        #[arg(long)]
        quiet: bool,
    },

    /// List the archives a folder scan would extract
    Scan {
        /// Folder to search
        dir: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct ScanReport {
    root: PathBuf,
    archives: Vec<PathBuf>,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_thread_names(true)
        .init();

    if let Err(e) = ctrlc::set_handler(|| {
        warn!("Interrupted; partially extracted folders are left on disk");
        process::exit(130);
    }) {
        warn!("Could not install interrupt handler: {}", e);
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            archives,
            dir,
            out,
            recursive,
            workers,
            max_depth,
            json,
            quiet,
        } => {
            let source = match dir {
                Some(dir) => InputSource::Directory(dir),
                None => InputSource::Files(archives),
            };
            let options = BatchOptions {
                workers,
                recursive,
                max_depth,
            };
            handle_extract(source, out, options, json, quiet)
        }
        Commands::Scan { dir, json } => handle_scan(dir, json),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    }
}

fn handle_extract(
    source: InputSource,
    out: PathBuf,
    options: BatchOptions,
    json: bool,
    quiet: bool,
) -> Result<i32, Box<dyn std::error::Error>> {
    let coordinator = Coordinator::new(&options, CodecSet::builtin())?;
    let tasks = extractor::plan(&source, &out, options.recursive)?;
    info!("Output directory set to '{}'", out.display());

    let bar = if quiet || json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(tasks.len() as u64)
    };
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")?.progress_chars("=> "),
    );

    let progress = |outcome: &ExtractionOutcome, _done: usize, _total: usize| {
        if let Some(name) = outcome.source.file_name() {
            bar.set_message(name.to_string_lossy().into_owned());
        }
        bar.inc(1);
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("extractor")
        .enable_all()
        .build()?;
    let summary = runtime.block_on(coordinator.run_with_progress(tasks, &progress));
    bar.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, options.recursive);
    }

    Ok(if summary.is_success() { 0 } else { 1 })
}

fn print_summary(summary: &RunSummary, recursive: bool) {
    for outcome in summary.outcomes.iter().filter(|o| !o.succeeded) {
        println!(
            "FAILED {}: {}",
            outcome.source.display(),
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }

    let nested: usize = summary.outcomes.iter().map(|o| o.nested_count()).sum();
    let nested_failed: usize = summary.outcomes.iter().map(|o| o.nested_failures()).sum();
    if recursive {
        println!(
            "Nested archives: {} extracted, {} failed",
            nested - nested_failed,
            nested_failed
        );
    }

    println!(
        "Success: {}, Failures: {}",
        summary.success_count, summary.failure_count
    );
}

fn handle_scan(dir: PathBuf, json: bool) -> Result<i32, Box<dyn std::error::Error>> {
    if !dir.is_dir() {
        return Err(extractor::ConfigError::InputNotFound(dir).into());
    }
    let archives = discover(&dir);

    if json {
        let report = ScanReport {
            root: dir,
            archives,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for archive in &archives {
            println!("{}", archive.display());
        }
        println!("{} archive(s)", archives.len());
    }

    Ok(0)
}

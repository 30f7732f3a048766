// ==============================================================================
// main.rs - Variant Annotation Entry Point
// ==============================================================================
// Description: Command-line entry point; annotates each input file and writes
//              <stem>_varied.tsv into the output directory
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use varied::error::AnnotateError;
use varied::{AnnotationProcessor, AnnovarOutcome, Config};

#[derive(Parser, Debug)]
#[command(author, version, about = "Annotate variants with allele frequencies and functional annotations", long_about = None)]
struct Args {
    /// Input TSV files (chromosome, position, ref, alt)
    #[arg(short, long = "input-files", num_args = 1.., required = true)]
    input_files: Vec<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short = 'c', long)]
    conf: PathBuf,

    /// Directory for results
    #[arg(short = 'd', long, default_value = "varied_output")]
    output_dir: PathBuf,

    /// Number of input files processed concurrently
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "varied=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    info!("varied {} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::load(&args.conf).context("Failed to load configuration")?;

    if !args.output_dir.exists() {
        std::fs::create_dir_all(&args.output_dir).map_err(|source| AnnotateError::OutputDir {
            path: args.output_dir.clone(),
            source,
        })?;
    }

    let jobs = args.jobs.max(1);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(jobs)
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let processor = AnnotationProcessor::new(Arc::new(config), args.output_dir);
    processor
        .check_inputs(&args.input_files)
        .context("Input files would overwrite each other's results")?;
    runtime.block_on(annotate_all(processor, args.input_files, jobs))
}

/// Process every input, at most `jobs` at a time; stops at the first failure
async fn annotate_all(processor: AnnotationProcessor, inputs: Vec<PathBuf>, jobs: usize) -> Result<()> {
    let progress = ProgressBar::new(inputs.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("Annotating ... {bar:40} {pos}/{len} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let semaphore = Arc::new(Semaphore::new(jobs));
    let mut tasks = JoinSet::new();

    for input in inputs {
        let processor = processor.clone();
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let result = processor.process(&input).await;
            (input, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (input, result) = joined.context("Annotation task panicked")?;
        match result {
            Ok(report) => {
                let annovar = match &report.annovar {
                    AnnovarOutcome::Applied(summary) => format!("{} ANNOVAR columns", summary.width),
                    AnnovarOutcome::Skipped(reason) => format!("ANNOVAR skipped ({})", reason),
                };
                info!(
                    "{:?} -> {:?}: {} variants, {} columns, {}",
                    report.input, report.output, report.variants, report.columns, annovar
                );
                progress.inc(1);
            }
            Err(e) => {
                error!("Failed to annotate {:?}: {}", input, e);
                progress.abandon();
                tasks.abort_all();
                return Err(e).with_context(|| format!("Failed to annotate {}", input.display()));
            }
        }
    }

    progress.finish();
    info!("All inputs annotated into {:?}", processor.output_dir());
    Ok(())
}

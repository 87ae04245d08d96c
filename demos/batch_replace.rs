//! Batch find-and-replace over a directory of Word documents
//!
//! Run with:
//!   cargo run --example batch_replace -- reports/ -r 2024=2025 --backup-dir backups/
//!   cargo run --example batch_replace -- reports/ --config batch.yaml

use clap::Parser;
use docx_batch::batch::{BatchConfig, BatchProcessor, RuleConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(about = "Format-preserving find-and-replace across .docx files")]
struct Args {
    /// Directory to scan, or individual .docx files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// YAML configuration file; command-line rules are appended to its rules
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replacement rule as SEARCH=REPLACE (repeatable, applied in order)
    #[arg(short, long = "rule", value_parser = parse_rule)]
    rules: Vec<RuleConfig>,

    /// Number of worker threads
    #[arg(short, long)]
    workers: Option<usize>,

    /// Directory for backups (defaults to each document's own directory)
    #[arg(long)]
    backup_dir: Option<PathBuf>,

    /// Do not back up documents before editing them
    #[arg(long)]
    no_backup: bool,

    /// Only scan the top level of input directories
    #[arg(long)]
    no_recursive: bool,
}

fn parse_rule(raw: &str) -> Result<RuleConfig, String> {
    let (search, replace) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SEARCH=REPLACE, got {raw:?}"))?;
    Ok(RuleConfig {
        search: search.to_string(),
        replace: replace.to_string(),
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(2)
        },
    }
}

fn run(args: Args) -> Result<bool, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => BatchConfig::from_file(path)?,
        None => BatchConfig::default(),
    };
    config.rules.extend(args.rules);
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if args.backup_dir.is_some() {
        config.backup_dir = args.backup_dir;
    }
    config.create_backup &= !args.no_backup;
    config.recursive &= !args.no_recursive;

    let rules = config.rules()?;
    if rules.is_empty() {
        return Err("no replacement rules given".into());
    }

    let mut files = Vec::new();
    for input in &args.inputs {
        if input.is_dir() {
            files.extend(BatchProcessor::get_files_from_directory(input, config.recursive)?);
        } else {
            files.push(input.clone());
        }
    }

    let processor = BatchProcessor::with_config(&config)?;
    processor.process_documents(
        &files,
        &rules,
        &config.options(),
        |done, total| eprint!("\r{done}/{total} documents"),
        |result| {
            if !result.success {
                eprintln!("\n{}: {}", result.file_name(), result.message);
            }
        },
    )?;
    eprintln!();

    let summary = processor.summary();
    println!(
        "{} documents, {} succeeded, {} failed, {} replacements ({:.0}% success)",
        summary.total,
        summary.successful,
        summary.failed,
        summary.total_replacements,
        summary.success_rate * 100.0
    );
    for result in processor.successful_results() {
        if let Some(backup) = &result.backup_path {
            println!("  {} -> backup {}", result.file_name(), backup.display());
        }
    }
    Ok(summary.failed == 0)
}

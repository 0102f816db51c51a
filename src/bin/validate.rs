//! Archive validation CLI
//!
//! Drives every record stream of a snapshot archive to completion, counts
//! decoded records per entity, and prints a summary. Under collect policy
//! also prints the first few recorded failures per entity plus the distinct
//! offending raw values. Exits non-zero when nothing at all decoded.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bgm_archive::{ArchiveReader, ErrorPolicy, LoaderConfig};

#[derive(Parser)]
#[command(name = "validate-archive")]
#[command(about = "Validate a Bangumi wiki snapshot archive")]
struct Cli {
    /// Path to the snapshot zip
    archive: PathBuf,

    /// Error policy (overrides config)
    #[arg(short, long, value_enum)]
    policy: Option<ErrorPolicy>,

    /// Failures printed per entity under collect policy (overrides config)
    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(total) if total > 0 => ExitCode::SUCCESS,
        Ok(_) => {
            eprintln!("no records decoded");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u64> {
    let config = LoaderConfig::load().context("loading configuration")?;
    let policy = cli.policy.unwrap_or(config.policy);
    let limit = cli.limit.unwrap_or(config.report.max_shown);

    let reader = ArchiveReader::open(&cli.archive, policy)?;

    let mut counts: BTreeMap<&'static str, u64> = BTreeMap::new();
    for (member, stream) in reader.load_all()? {
        println!("Validating {member}...");
        let mut count = 0u64;
        for record in stream {
            record.with_context(|| format!("while validating {member}"))?;
            count += 1;
        }
        counts.insert(member, count);
    }

    println!("\nValidation summary:");
    for (member, count) in &counts {
        println!("  {member}: {count}");
    }
    let total: u64 = counts.values().sum();
    println!("  total: {total}");

    if policy == ErrorPolicy::Collect {
        print_failures(&reader, &config, limit);
    }

    Ok(total)
}

fn print_failures(reader: &ArchiveReader, config: &LoaderConfig, limit: usize) {
    let report = reader.failure_report();
    if report.is_empty() {
        return;
    }

    println!("\n{} decode failures:", report.total());
    for (member, failures) in report.members() {
        println!("  {member}: {}", failures.len());
        for failure in failures.iter().take(limit) {
            println!("    line {}: {}", failure.line, failure.failure);
        }
        if failures.len() > limit {
            println!("    ... and {} more", failures.len() - limit);
        }
        if config.report.distinct_values {
            let distinct: Vec<&str> = report.distinct_values(member).into_iter().collect();
            if !distinct.is_empty() {
                println!("    distinct offending values: {}", distinct.join(", "));
            }
        }
    }
}

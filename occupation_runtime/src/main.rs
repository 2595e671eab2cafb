//! occupation-populate: build the occupation schema from reference data,
//! populate it from the rating files and write a snapshot.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use occupation_model::ratings::CollisionPolicy;
use occupation_runtime::config::RunConfig;
use occupation_runtime::error::Result;
use occupation_runtime::run::{run, RunOutput};

#[derive(Debug, Parser)]
#[command(name = "occupation-populate", version, about)]
struct Cli {
    /// TOML run configuration. Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the reference files.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Where the snapshot is written.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Let later rating rows overwrite earlier ones instead of failing.
    #[arg(long)]
    last_write_wins: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn run_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_toml_file(path)?,
            None => RunConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if self.last_write_wins {
            config.collision_policy = CollisionPolicy::LastWriteWins;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.run_config().and_then(|config| run(&config)) {
        Ok(output) => {
            print_report(&output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "population run failed");
            ExitCode::FAILURE
        }
    }
}

fn print_report(output: &RunOutput) {
    let stats = &output.stats;
    println!("Schema:       {} elements, {} slots", output.schema.len(), output.schema.slot_count());
    for family in &output.families {
        println!("  {:<24} {:>5} elements {:>6} scales", family.family, family.elements_with_scales, family.scales_attached);
    }
    for report in &output.parse_reports {
        println!(
            "  {:<44} {:>8} accepted {:>6} skipped",
            report.file_name,
            report.accepted,
            report.skipped_total()
        );
    }
    println!("Occupations:  {}", stats.total_entities);
    println!("Populated:    {} / {} ({:.2}%)", stats.populated, stats.total_possible, stats.coverage_pct());
    println!("Missing:      {} ({} out of range)", stats.missing, stats.out_of_range);
    println!("Unmatched:    {}", stats.unmatched);
    println!("Fingerprint:  {}", output.snapshot.schema_fingerprint);
    println!("Snapshot:     {}", output.output_dir.display());
}

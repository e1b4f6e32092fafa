use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use support_ops_consolidator::headers::{self, HeaderSynonyms};
use support_ops_consolidator::loader::load_table;
use support_ops_consolidator::models::SourceKind;
use support_ops_consolidator::{export, process, report};
use support_ops_consolidator::{DateRange, PipelineConfig, ProcessOutput, ReportInputs};

#[derive(Parser)]
#[command(name = "support-ops-consolidator")]
#[command(about = "Consolidates sales, support and quality reports into per-agent metrics", long_about = None)]
struct Cli {
    /// JSON file overriding pipeline literals and header synonyms
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RunArgs {
    #[arg(long)]
    sales: PathBuf,
    #[arg(long)]
    performance: PathBuf,
    #[arg(long)]
    audits: PathBuf,
    #[arg(long)]
    roster: Option<PathBuf>,
    #[arg(long)]
    inspections: Option<PathBuf>,
    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    from: NaiveDate,
    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    to: NaiveDate,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportKind {
    Sales,
    Performance,
    Audits,
    Inspections,
    Roster,
}

impl From<ReportKind> for SourceKind {
    fn from(kind: ReportKind) -> Self {
        match kind {
            ReportKind::Sales => SourceKind::Sales,
            ReportKind::Performance => SourceKind::Performance,
            ReportKind::Audits => SourceKind::Audits,
            ReportKind::Inspections => SourceKind::Inspections,
            ReportKind::Roster => SourceKind::Roster,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the daily, weekly and summary tables
    Process {
        #[command(flatten)]
        run: RunArgs,
        #[arg(long, default_value = "output")]
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },
    /// Generate a markdown digest
    Report {
        #[command(flatten)]
        run: RunArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Show how a file's headers map onto canonical column names
    Headers {
        path: PathBuf,
        /// Which report the file is, for error messages
        #[arg(long, value_enum)]
        kind: ReportKind,
    },
}

fn run_pipeline(run: &RunArgs, config: &PipelineConfig) -> anyhow::Result<ProcessOutput> {
    let range = DateRange::new(run.from, run.to)?;
    let optional = |path: Option<&Path>, kind| path.map(|p| load_table(p, kind)).transpose();
    let inputs = ReportInputs {
        sales: Some(load_table(&run.sales, SourceKind::Sales)?),
        performance: Some(load_table(&run.performance, SourceKind::Performance)?),
        audits: Some(load_table(&run.audits, SourceKind::Audits)?),
        roster: optional(run.roster.as_deref(), SourceKind::Roster)?,
        inspections: optional(run.inspections.as_deref(), SourceKind::Inspections)?,
    };
    let output = process(inputs, range, config).context("consolidation failed")?;
    Ok(output)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::load(cli.config.as_deref()).context("failed to load config")?;

    match cli.command {
        Commands::Process { run, out, format } => {
            let output = run_pipeline(&run, &config)?;
            if output.daily.is_empty() {
                println!("No activity found between {} and {}.", run.from, run.to);
            }
            let tables = export::tables(&output, &config);
            let stem = export::file_stem(&output);
            match format {
                OutputFormat::Csv => {
                    let written = export::write_csv_dir(&tables, &out, &stem)
                        .with_context(|| format!("failed to write tables to {}", out.display()))?;
                    for path in written {
                        println!("Wrote {}.", path.display());
                    }
                }
                OutputFormat::Json => {
                    let path = out.join(format!("{stem}.json"));
                    export::write_json(&tables, &path)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Wrote {}.", path.display());
                }
            }
            println!(
                "{} agents across {} agent-days.",
                output.summary.len(),
                output.daily.len()
            );
        }
        Commands::Report { run, out } => {
            let output = run_pipeline(&run, &config)?;
            let report = report::build_report(&output, &config);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Headers { path, kind } => {
            let synonyms: HeaderSynonyms = config.header_synonym_table()?;
            let table = load_table(&path, kind.into())
                .with_context(|| format!("failed to load {}", path.display()))?;
            for raw in &table.headers {
                println!("{raw} -> {}", headers::normalize_header(raw, &synonyms));
            }
        }
    }

    Ok(())
}

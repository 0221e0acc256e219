// Entry point and high-level CLI flow.
//
// - `run` loads and cleans the input, resolves country names, then writes the
//   cleaned table, three aggregates, the audit and a JSON summary.
// - `audit` stops after resolution and only reports how labels resolved.
// - `resolve` prints the resolution trace for labels given on the command line.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;
use visa_report::config::PipelineConfig;
use visa_report::loader::{self, LoadReport};
use visa_report::output;
use visa_report::pipeline::{Pipeline, Resolved};
use visa_report::reports;
use visa_report::types::RawRecord;
use visa_report::util::{format_int, format_number};
use visa_report::{load_reference, ContinentLookup};

#[derive(Parser)]
#[command(name = "visa_report")]
#[command(about = "Clean visa issuance records and build country and continent aggregates")]
#[command(version)]
struct Cli {
    /// TOML configuration file (defaults to ./visa_report.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log per-label resolution decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Minimum fuzzy match score (0-100)
    #[arg(long, global = true)]
    threshold: Option<u8>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write every output
    Run {
        /// Input CSV file, or a directory of CSV files
        #[arg(short, long, default_value = "input")]
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Year for the top-countries aggregate
        #[arg(long)]
        year: Option<i32>,

        /// Number of countries in the top-countries aggregate
        #[arg(long)]
        top: Option<usize>,

        /// Skip malformed rows instead of failing
        #[arg(long)]
        lenient: bool,
    },
    /// Resolve country labels and write only the resolution audit
    Audit {
        #[arg(short, long, default_value = "input")]
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        lenient: bool,
    },
    /// Show how individual labels resolve
    Resolve {
        #[arg(required = true)]
        labels: Vec<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Load, normalize and type the input, printing a short textual summary.
fn handle_load(input: &Path, config: &PipelineConfig) -> Result<Vec<RawRecord>> {
    let (data, load_report) = loader::load_and_clean(input, config)
        .with_context(|| format!("failed to load {}", input.display()))?;
    print_load_report(&load_report);
    Ok(data)
}

fn print_load_report(report: &LoadReport) {
    println!(
        "Processing dataset... ({} rows read from {} file(s), {} loaded)",
        format_int(report.total_rows),
        report.files,
        format_int(report.loaded_rows)
    );
    if report.null_rows > 0 {
        println!("Note: {} empty rows dropped.", format_int(report.null_rows));
    }
    if report.malformed_rows > 0 {
        println!(
            "Note: {} rows skipped due to parse/validation errors.",
            format_int(report.malformed_rows)
        );
    }
    println!();
}

fn write_audit(resolved: &Resolved, dir: &Path) -> Result<()> {
    let audit = resolved.audit_rows();
    let path = output::output_path(dir, output::AUDIT_FILE)?;
    output::write_csv(&path, &audit).context("failed to write audit")?;

    let review = resolved.review_rows();
    output::preview_table(
        "Labels needing review",
        Some("unmatched without override, or no continent"),
        &review,
        review.len(),
    );
    println!("(Full audit exported to {})\n", path.display());
    Ok(())
}

/// Write the cleaned table and every aggregate, with console previews.
fn handle_generate_reports(resolved: &Resolved, config: &PipelineConfig) -> Result<()> {
    let dir = config.output_dir.as_path();
    let data = &resolved.records;

    let cleaned = output::output_path(dir, output::CLEANED_FILE)?;
    output::write_csv(&cleaned, data).context("failed to write cleaned table")?;
    info!(path = %cleaned.display(), rows = data.len(), "wrote cleaned table");

    println!("Generating reports...\n");

    let r1 = reports::yearly_by_continent(data);
    let file1 = output::output_path(dir, output::CONTINENT_FILE)?;
    output::write_csv(&file1, &r1)?;
    output::preview_table("Visa applications by continent and year", None, &r1, 7);
    println!("(Full table exported to {})\n", file1.display());

    let r2 = reports::top_countries_for_year(data, config.target_year, config.top_n, config);
    let file2 = output::output_path(dir, &output::top_countries_file(config.top_n, config.target_year))?;
    output::write_csv(&file2, &r2)?;
    let title = format!(
        "Top {} countries by visa applications in {}",
        config.top_n, config.target_year
    );
    output::preview_table(&title, None, &r2, config.top_n);
    println!("(Full table exported to {})\n", file2.display());

    let r3 = reports::yearly_by_country(data, config);
    let file3 = output::output_path(dir, output::COUNTRY_MAP_FILE)?;
    output::write_csv(&file3, &r3)?;
    output::preview_table("Visa applications by country over time", None, &r3, 5);
    println!("(Full table exported to {})\n", file3.display());

    write_audit(resolved, dir)?;

    let summary = reports::generate_summary(resolved, config);
    let summary_path = output::output_path(dir, output::SUMMARY_FILE)?;
    output::write_json(&summary_path, &summary)?;
    println!("Summary Stats ({}):", summary_path.display());
    println!(
        "{} rows, {} labels ({} matched, {} overridden, {} unmatched, {} without continent), {} visas issued\n",
        format_int(summary.total_rows),
        format_int(summary.distinct_labels),
        summary.matched_labels,
        summary.overridden_labels,
        summary.unmatched_labels,
        summary.unmapped_continent_labels,
        format_number(summary.total_issued, 0)
    );
    Ok(())
}

fn handle_resolve(labels: &[String], config: &PipelineConfig) -> Result<()> {
    let reference = load_reference(config).context("failed to load reference data")?;
    let pipeline = Pipeline::new(&reference, config);
    for label in labels {
        let (resolution, continent) = pipeline.resolve_label(label);
        let continent = match continent {
            ContinentLookup::Found(c) => c.to_string(),
            ContinentLookup::Unmapped(reason) => format!("none ({})", reason),
        };
        println!(
            "{:?} -> best {:?} (score {}, {}){} -> {:?} [{}]",
            resolution.input,
            resolution.fuzzy.candidate.as_deref().unwrap_or(""),
            resolution.fuzzy.score,
            resolution.fuzzy.outcome,
            if resolution.override_applied { " -> override" } else { "" },
            resolution.corrected,
            continent
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = PipelineConfig::load(cli.config.as_deref()).context("invalid configuration")?;
    if let Some(t) = cli.threshold {
        config.threshold = t;
    }

    match cli.command {
        Commands::Run {
            input,
            output,
            year,
            top,
            lenient,
        } => {
            if let Some(dir) = output {
                config.output_dir = dir;
            }
            if let Some(y) = year {
                config.target_year = y;
            }
            if let Some(n) = top {
                config.top_n = n;
            }
            config.strict &= !lenient;
            config.validate().context("invalid configuration")?;

            let reference = load_reference(&config).context("failed to load reference data")?;
            let data = handle_load(&input, &config)?;
            let pipeline = Pipeline::new(&reference, &config);
            let resolved = pipeline.run(&data);
            handle_generate_reports(&resolved, &config)?;
        }
        Commands::Audit {
            input,
            output,
            lenient,
        } => {
            if let Some(dir) = output {
                config.output_dir = dir;
            }
            config.strict &= !lenient;
            config.validate().context("invalid configuration")?;

            let reference = load_reference(&config).context("failed to load reference data")?;
            let data = handle_load(&input, &config)?;
            let resolved = Pipeline::new(&reference, &config).run(&data);
            write_audit(&resolved, &config.output_dir)?;
        }
        Commands::Resolve { labels } => {
            config.validate().context("invalid configuration")?;
            handle_resolve(&labels, &config)?;
        }
    }
    Ok(())
}

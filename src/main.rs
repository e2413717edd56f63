//! JanTrack - promise and fund reports for civic candidate data
//!
//! A CLI that validates a candidate snapshot exported from the candidate
//! store and writes promise-completion, ward-fund and comparison reports.
//!
//! Exit codes:
//!   0 - Success (no overruns, or no --fail-on-overrun set)
//!   1 - Runtime error (unreadable or invalid snapshot, bad config, write failure)
//!   2 - Fund overruns found with --fail-on-overrun

use anyhow::{Context, Result};
use chrono::Utc;
use jantrack::analysis::{self, ComparisonOptions, DirectoryQuery, RowOrder};
use jantrack::cli::{Args, OutputFormat};
use jantrack::config::{Config, CONFIG_FILE_NAME};
use jantrack::models::{Candidate, Report, ReportMetadata, AMOUNT_UNIT};
use jantrack::{report, snapshot};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is read before logging starts so `general.verbose` can apply
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    info!("JanTrack v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Config: {:?}", config);

    match run_report(args, config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Report failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .jantrack.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize comparisons, report sections and validation.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level(config.general.verbose);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Build and write the report. Returns exit code (0 or 2).
fn run_report(args: Args, mut config: Config) -> Result<i32> {
    let start_time = Instant::now();

    config.merge_with_args(&args);

    let input: PathBuf = args
        .input
        .clone()
        .context("A snapshot file is required (--input)")?;

    // Step 1: Load and validate the snapshot
    println!("📥 Loading snapshot: {}", input.display());
    let candidates = snapshot::load(&input, config.validation.unknown_status)?;

    if args.dry_run {
        return handle_dry_run(&candidates);
    }

    // Step 2: Aggregate
    println!("🧮 Aggregating {} candidates...", candidates.len());

    let wards = analysis::aggregate_by_ward(&candidates);
    let warnings = analysis::collect_warnings(&candidates, &wards);
    for warning in &warnings {
        warn!("{}", warning);
    }

    let query = args.directory_query();
    let scorecards = if config.report.include_directory {
        let listed = analysis::filter_directory(&candidates, &query);
        debug!("Directory lists {} candidates", listed.len());
        Some(listed.into_iter().map(analysis::scorecard).collect())
    } else {
        None
    };

    let comparison = args.selector().map(|selector| {
        let options = ComparisonOptions {
            top_promises: config.comparison.top_promises,
            order: if config.comparison.natural_order {
                RowOrder::WardNatural
            } else {
                RowOrder::Input
            },
        };
        analysis::build_comparison(&candidates, &selector, &options)
    });

    if let Some(ref comparison) = comparison {
        if comparison.rows.is_empty() {
            warn!("No candidates matched the comparison selector");
        } else {
            info!("{} ({} candidates)", comparison.title, comparison.rows.len());
        }
    }

    // Step 3: Build the report
    println!("📝 Generating report...");

    let overruns = warnings.iter().filter(|w| w.is_overrun()).count();
    let warning_count = warnings.len();

    let metadata = ReportMetadata {
        snapshot: input.display().to_string(),
        generated_at: Utc::now(),
        candidates: candidates.len(),
        wards: wards.len(),
        promises: candidates.iter().map(|c| c.promises.len()).sum(),
        amount_unit: AMOUNT_UNIT.to_string(),
        directory_filter: describe_query(&query),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let report = Report {
        metadata,
        wards,
        scorecards,
        comparison,
        warnings: config.report.include_warnings.then_some(warnings),
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = config.output_path(args.format);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    println!("\n📊 Snapshot Summary:");
    println!("   Candidates: {}", report.metadata.candidates);
    println!("   Wards: {}", report.metadata.wards);
    println!("   Promises tracked: {}", report.metadata.promises);
    println!(
        "   Warnings: {} ({} fund overruns)",
        warning_count, overruns
    );
    println!(
        "\n✅ Report complete! Saved to: {}",
        output_path.display()
    );

    if args.fail_on_overrun && overruns > 0 {
        eprintln!(
            "\n⛔ {} fund overrun(s) found. Failing (exit code 2).",
            overruns
        );
        return Ok(2);
    }

    Ok(0)
}

/// Handle --dry-run: print what the snapshot contains, write nothing.
fn handle_dry_run(candidates: &[Candidate]) -> Result<i32> {
    println!("\n🔍 Dry run: snapshot is valid.\n");

    let wards = analysis::unique_wards(candidates);
    let promises: usize = candidates.iter().map(|c| c.promises.len()).sum();
    let wardless = candidates.iter().filter(|c| c.ward.is_empty()).count();

    println!("   Candidates: {}", candidates.len());
    println!("   Promises: {}", promises);
    println!("   Wards ({}):", wards.len());
    for ward in &wards {
        println!("     🏙️  {}", ward);
    }
    if wardless > 0 {
        println!("   Candidates without a ward: {}", wardless);
    }

    println!("\n✅ Dry run complete. No report was written.");
    Ok(0)
}

/// Describe an active directory filter for the report metadata.
fn describe_query(query: &DirectoryQuery) -> Option<String> {
    let mut parts = Vec::new();

    if let Some(ref search) = query.search {
        if !search.is_empty() {
            parts.push(format!("search {:?}", search));
        }
    }
    if let Some(ref ward) = query.ward {
        parts.push(format!("ward {:?}", ward));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before the subscriber is installed, so problems go to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}. Using defaults.", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}

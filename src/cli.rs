//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::{ComparisonSelector, DirectoryQuery};
use clap::Parser;
use std::path::PathBuf;

/// JanTrack - promise and fund reports for civic candidate data
///
/// Reads a candidate snapshot exported from the candidate store and
/// reports promise-completion scores, ward fund totals and side-by-side
/// candidate comparisons as Markdown or JSON.
///
/// Examples:
///   jantrack --input candidates.json
///   jantrack --input candidates.json --ward "Ward 1"
///   jantrack --input candidates.json --candidate 12 --format json
///   jantrack --input candidates.json --search andheri --filter-ward "Ward 4"
///   jantrack --input candidates.json --dry-run
///   jantrack --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Candidate snapshot (JSON array of candidate records)
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "JANTRACK_SNAPSHOT",
        required_unless_present = "init_config"
    )]
    pub input: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to the config file setting, or jantrack_report.md
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Compare every candidate contesting this ward
    #[arg(long, value_name = "WARD", conflicts_with_all = ["candidate", "all"])]
    pub ward: Option<String>,

    /// Compare this candidate with its ward-mates
    #[arg(long, value_name = "ID", conflicts_with = "all")]
    pub candidate: Option<String>,

    /// Compare every candidate in the snapshot
    #[arg(long)]
    pub all: bool,

    /// Only list scorecards whose name or constituency contains this text
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Only list scorecards for this ward
    #[arg(long, value_name = "WARD")]
    pub filter_ward: Option<String>,

    /// Leave candidate scorecards out of the report
    #[arg(long)]
    pub no_directory: bool,

    /// Promises listed per candidate in comparisons
    #[arg(long, value_name = "COUNT")]
    pub top_promises: Option<usize>,

    /// Order comparison rows by ward label
    #[arg(long)]
    pub natural_order: bool,

    /// Reject snapshots containing unknown promise statuses
    #[arg(long)]
    pub strict_status: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .jantrack.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Validate the snapshot and print counts without writing a report
    #[arg(long, conflicts_with = "fail_on_overrun")]
    pub dry_run: bool,

    /// Exit with code 2 when any candidate or ward is over budget
    #[arg(long)]
    pub fail_on_overrun: bool,

    /// Generate a default .jantrack.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// File extension for reports in this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        match self.input {
            None => return Err("A snapshot file is required (--input)".to_string()),
            Some(ref path) if !path.is_file() => {
                return Err(format!("Snapshot file does not exist: {}", path.display()));
            }
            Some(_) => {}
        }

        if matches!(self.ward.as_deref(), Some("")) {
            return Err("Ward must not be empty".to_string());
        }

        if matches!(self.candidate.as_deref(), Some("")) {
            return Err("Candidate id must not be empty".to_string());
        }

        if self.top_promises == Some(0) {
            return Err("Top promises must be at least 1".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the comparison requested on the command line, if any.
    pub fn selector(&self) -> Option<ComparisonSelector> {
        if let Some(ref ward) = self.ward {
            Some(ComparisonSelector::Ward(ward.clone()))
        } else if let Some(ref id) = self.candidate {
            Some(ComparisonSelector::Candidate(id.clone()))
        } else if self.all {
            Some(ComparisonSelector::All)
        } else {
            None
        }
    }

    /// Returns the directory filter for the scorecard listing.
    pub fn directory_query(&self) -> DirectoryQuery {
        DirectoryQuery {
            search: self.search.clone(),
            ward: self.filter_ward.clone(),
        }
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `general.verbose` from the config file; `--quiet`
    /// still wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(input: PathBuf) -> Args {
        Args {
            input: Some(input),
            output: None,
            format: OutputFormat::Markdown,
            ward: None,
            candidate: None,
            all: false,
            search: None,
            filter_ward: None,
            no_directory: false,
            top_promises: None,
            natural_order: false,
            strict_status: false,
            config: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            fail_on_overrun: false,
            init_config: false,
        }
    }

    fn fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/candidates.json")
    }

    #[test]
    fn test_validation_accepts_fixture() {
        assert!(make_args(fixture()).validate().is_ok());
    }

    #[test]
    fn test_validation_missing_input() {
        let args = make_args(PathBuf::from("no/such/snapshot.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args(fixture());
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_top_promises() {
        let mut args = make_args(fixture());
        args.top_promises = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_selector() {
        let mut args = make_args(fixture());
        assert_eq!(args.selector(), None);

        args.all = true;
        assert_eq!(args.selector(), Some(ComparisonSelector::All));

        args.candidate = Some("4".to_string());
        assert_eq!(
            args.selector(),
            Some(ComparisonSelector::Candidate("4".to_string()))
        );
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "jantrack",
            "--input",
            "snapshot.json",
            "--ward",
            "Ward 1",
            "--format",
            "json",
            "--top-promises",
            "3",
        ])
        .unwrap();

        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.top_promises, Some(3));
        assert_eq!(
            args.selector(),
            Some(ComparisonSelector::Ward("Ward 1".to_string()))
        );

        let conflict = Args::try_parse_from([
            "jantrack", "--input", "s.json", "--ward", "Ward 1", "--candidate", "2",
        ]);
        assert!(conflict.is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(fixture());
        assert_eq!(args.log_level(false), tracing::Level::INFO);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }

    #[test]
    fn test_dry_run_conflicts_with_fail_on_overrun() {
        let both = Args::try_parse_from([
            "jantrack",
            "--input",
            "s.json",
            "--dry-run",
            "--fail-on-overrun",
        ]);
        assert!(both.is_err());

        let dry = Args::try_parse_from(["jantrack", "--input", "s.json", "--dry-run"]).unwrap();
        assert!(dry.dry_run);
    }
}

//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.jantrack.toml` files.

use crate::analysis::DEFAULT_TOP_PROMISES;
use crate::cli::OutputFormat;
use crate::snapshot::UnknownStatusPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".jantrack.toml";

/// Report file name used when no output path is configured.
const DEFAULT_OUTPUT_STEM: &str = "jantrack_report";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Comparison table settings.
    #[serde(default)]
    pub comparison: ComparisonConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Snapshot validation settings.
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Output file path. Unset means `jantrack_report.<ext>` for the chosen format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Comparison table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonConfig {
    /// Promises listed per candidate.
    #[serde(default = "default_top_promises")]
    pub top_promises: usize,

    /// Order rows by ward label instead of snapshot order.
    #[serde(default)]
    pub natural_order: bool,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            top_promises: default_top_promises(),
            natural_order: false,
        }
    }
}

fn default_top_promises() -> usize {
    DEFAULT_TOP_PROMISES
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include per-candidate scorecards.
    #[serde(default = "default_true")]
    pub include_directory: bool,

    /// Include the data warnings section.
    #[serde(default = "default_true")]
    pub include_warnings: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_directory: true,
            include_warnings: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Snapshot validation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// `count` keeps promises with unknown statuses, `reject` fails the load.
    #[serde(default)]
    pub unknown_status: UnknownStatusPolicy,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.jantrack.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// where the CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }

        if let Some(top) = args.top_promises {
            self.comparison.top_promises = top;
        }

        if args.natural_order {
            self.comparison.natural_order = true;
        }

        if args.strict_status {
            self.validation.unknown_status = UnknownStatusPolicy::Reject;
        }

        if args.no_directory {
            self.report.include_directory = false;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Resolve where the report is written for the given format.
    pub fn output_path(&self, format: OutputFormat) -> PathBuf {
        match self.general.output {
            Some(ref output) => PathBuf::from(output),
            None => PathBuf::from(format!("{}.{}", DEFAULT_OUTPUT_STEM, format.extension())),
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output, None);
        assert!(!config.general.verbose);
        assert_eq!(config.comparison.top_promises, 2);
        assert!(!config.comparison.natural_order);
        assert!(config.report.include_directory);
        assert_eq!(config.validation.unknown_status, UnknownStatusPolicy::Count);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "ward_report.json"
verbose = true

[comparison]
top_promises = 3
natural_order = true

[validation]
unknown_status = "reject"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output.as_deref(), Some("ward_report.json"));
        assert!(config.general.verbose);
        assert_eq!(config.comparison.top_promises, 3);
        assert!(config.comparison.natural_order);
        assert_eq!(config.validation.unknown_status, UnknownStatusPolicy::Reject);
        assert!(config.report.include_warnings);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[comparison]"));
        assert!(toml_str.contains("[validation]"));
        assert!(toml_str.contains("unknown_status = \"count\""));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.comparison.top_promises, 2);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        let mut file = std::fs::File::create(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        file.write_all(b"[comparison]\ntop_promises = 5\n").unwrap();

        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.comparison.top_promises, 5);
        assert_eq!(config.general.output, None);
    }

    #[test]
    fn test_output_path_follows_format() {
        let mut config = Config::default();
        assert_eq!(
            config.output_path(OutputFormat::Markdown),
            PathBuf::from("jantrack_report.md")
        );
        assert_eq!(
            config.output_path(OutputFormat::Json),
            PathBuf::from("jantrack_report.json")
        );

        config.general.output = Some("out/ward.txt".to_string());
        assert_eq!(config.output_path(OutputFormat::Json), PathBuf::from("out/ward.txt"));
    }

    #[test]
    fn test_merge_verbose_and_output_from_args() {
        let args = crate::cli::Args::try_parse_from([
            "jantrack", "--input", "s.json", "--verbose", "-o", "report.json",
        ])
        .unwrap();

        let mut config: Config = toml::from_str("[general]\nverbose = false\n").unwrap();
        config.merge_with_args(&args);
        assert!(config.general.verbose);
        assert_eq!(config.output_path(OutputFormat::Markdown), PathBuf::from("report.json"));
    }

    #[test]
    fn test_config_verbose_raises_log_level() {
        let args = crate::cli::Args::try_parse_from(["jantrack", "--input", "s.json"]).unwrap();
        let config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();

        assert_eq!(args.log_level(config.general.verbose), tracing::Level::DEBUG);
        assert_eq!(
            args.log_level(Config::default().general.verbose),
            tracing::Level::INFO
        );
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[comparison\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }
}

//! CLI argument parsing for compready

use crate::report::{ConfigError, PullRequest, ReleaseWindow, ReportConfiguration, ViewPreset};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "compready")]
#[command(version)]
#[command(about = "Component Readiness report configuration and URL codec", long_about = None)]
pub struct Cli {
    /// Settings file (TOML); the embedded defaults are used when omitted
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug tracing output to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a report URL from the default configuration plus overrides
    Encode(EncodeArgs),

    /// Decode a report query string into a configuration
    Decode {
        /// Query string, with or without the leading '?'
        query: String,

        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Classify a regression status code
    Classify {
        /// Signed status code (negative = regression)
        #[arg(allow_negative_numbers = true)]
        status: i64,

        /// Gray factor reported with the result
        #[arg(long = "gray-factor", value_name = "FACTOR")]
        gray_factor: Option<f64>,

        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Prefill a bug report for a failing test
    BugUrl {
        /// Test name
        name: String,

        /// Release the failure was observed on
        #[arg(long)]
        release: String,

        /// Evidence link to use instead of the analysis page
        #[arg(long = "test-grid-url", value_name = "URL")]
        test_grid_url: Option<String>,

        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List dimensions available for grouping and filtering
    Dimensions,
}

/// Overrides applied on top of the default configuration
#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Select a view preset (copies its release identifiers only)
    #[arg(long, value_name = "NAME")]
    pub view: Option<String>,

    #[arg(long = "base-release", value_name = "RELEASE")]
    pub base_release: Option<String>,

    #[arg(long = "base-start", value_name = "RFC3339")]
    pub base_start: Option<DateTime<Utc>>,

    #[arg(long = "base-end", value_name = "RFC3339")]
    pub base_end: Option<DateTime<Utc>>,

    #[arg(long = "sample-release", value_name = "RELEASE")]
    pub sample_release: Option<String>,

    #[arg(long = "sample-start", value_name = "RFC3339")]
    pub sample_start: Option<DateTime<Utc>>,

    #[arg(long = "sample-end", value_name = "RFC3339")]
    pub sample_end: Option<DateTime<Utc>>,

    /// Evaluate a pull request (e.g., --pr openshift/origin#1234)
    #[arg(long = "pr", value_name = "ORG/REPO#N", value_parser = parse_pull_request)]
    pub pull_request: Option<PullRequest>,

    /// Replace the group-by set (comma-separated)
    #[arg(long = "group-by", value_name = "DIMS", value_delimiter = ',')]
    pub group_by: Option<Vec<String>>,

    /// Toggle a group-by dimension (repeatable)
    #[arg(long = "toggle-group-by", value_name = "DIM")]
    pub toggle_group_by: Vec<String>,

    /// Restrict a dimension to a value (e.g., --include Platform=aws, repeatable)
    #[arg(long = "include", value_name = "DIM=VALUE", value_parser = parse_key_value)]
    pub include: Vec<(String, String)>,

    #[arg(long, allow_negative_numbers = true)]
    pub confidence: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub pity: Option<i64>,

    #[arg(long = "min-fail", allow_negative_numbers = true)]
    pub min_fail: Option<i64>,

    #[arg(long = "ignore-missing", value_name = "BOOL")]
    pub ignore_missing: Option<bool>,

    #[arg(long = "ignore-disruption", value_name = "BOOL")]
    pub ignore_disruption: Option<bool>,

    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl EncodeArgs {
    /// Apply the overrides in order: view, releases and windows, selections, tolerances
    pub fn apply(
        &self,
        config: &mut ReportConfiguration,
        views: &[ViewPreset],
    ) -> Result<(), ConfigError> {
        if let Some(view) = &self.view {
            config.select_view(view, views);
        }

        let basis = override_window(
            config.basis(),
            &self.base_release,
            self.base_start,
            self.base_end,
        );
        config.set_basis_release_with_window(basis)?;

        let sample = override_window(
            config.sample(),
            &self.sample_release,
            self.sample_start,
            self.sample_end,
        );
        config.set_sample_release_with_window(sample)?;

        if self.pull_request.is_some() {
            config.set_sample_pull_request(self.pull_request.clone());
        }

        if let Some(group_by) = &self.group_by {
            config.set_group_by(group_by.iter().filter(|d| !d.is_empty()).cloned())?;
        }
        for dimension in &self.toggle_group_by {
            config.toggle_group_by(dimension)?;
        }
        for (dimension, value) in &self.include {
            config.include_variant(dimension, value)?;
        }

        if let Some(confidence) = self.confidence {
            config.set_confidence(confidence);
        }
        if let Some(pity) = self.pity {
            config.set_pity(pity);
        }
        if let Some(min_fail) = self.min_fail {
            config.set_min_fail(min_fail);
        }
        if let Some(ignore) = self.ignore_missing {
            config.set_ignore_missing(ignore);
        }
        if let Some(ignore) = self.ignore_disruption {
            config.set_ignore_disruption(ignore);
        }
        Ok(())
    }
}

fn override_window(
    current: &ReleaseWindow,
    release: &Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> ReleaseWindow {
    ReleaseWindow::new(
        release.clone().unwrap_or_else(|| current.release.clone()),
        start.unwrap_or(current.start),
        end.unwrap_or(current.end),
    )
}

/// Parse `DIM=VALUE`
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected DIM=VALUE, got '{}'", s)),
    }
}

/// Parse `org/repo#number`
fn parse_pull_request(s: &str) -> Result<PullRequest, String> {
    let invalid = || format!("expected ORG/REPO#NUMBER, got '{}'", s);
    let (path, number) = s.rsplit_once('#').ok_or_else(invalid)?;
    let (org, repo) = path.split_once('/').ok_or_else(invalid)?;
    if org.is_empty() || repo.is_empty() {
        return Err(invalid());
    }
    let number = number.parse::<u64>().map_err(|_| invalid())?;
    Ok(PullRequest::new(org, repo, number))
}

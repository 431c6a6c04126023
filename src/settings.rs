//! TOML settings for the report configuration engine
//!
//! One file carries everything that would otherwise be hardcoded: default
//! release windows and tolerances, clamping bounds, the severity breakpoint
//! table, view presets, bug-tracker form fields and the variant catalog.
//! A copy ships inside the binary (`compready-default.toml`) for zero-config
//! use.

use crate::bugs::BugTracker;
use crate::report::{
    ConfigError, ConfigurationCodec, Limits, ReleaseWindow, ReportConfiguration, ViewPreset,
    DEFAULT_CONFIDENCE, DEFAULT_MIN_FAIL, DEFAULT_PITY,
};
use crate::severity::SeverityClassifier;
use crate::variants::VariantCatalog;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../compready-default.toml");

/// `[defaults]` section: the configuration a fresh session starts from
///
/// Tolerances are read as plain integers and clamped into `[bounds]` when the
/// default configuration is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsSection {
    pub basis: ReleaseWindow,
    pub sample: ReleaseWindow,

    #[serde(default)]
    pub group_by: Vec<String>,

    #[serde(default)]
    pub include_variants: BTreeMap<String, Vec<String>>,

    #[serde(default = "default_confidence")]
    pub confidence: i64,

    #[serde(default = "default_pity")]
    pub pity: i64,

    #[serde(default = "default_min_fail")]
    pub min_fail: i64,

    #[serde(default)]
    pub ignore_missing: bool,

    #[serde(default = "default_true")]
    pub ignore_disruption: bool,
}

fn default_confidence() -> i64 {
    i64::from(DEFAULT_CONFIDENCE)
}

fn default_pity() -> i64 {
    i64::from(DEFAULT_PITY)
}

fn default_min_fail() -> i64 {
    i64::from(DEFAULT_MIN_FAIL)
}

fn default_true() -> bool {
    true
}

/// Complete settings file
///
/// # Example TOML
/// ```toml
/// [defaults]
/// basis = { release = "4.15", start = "2024-01-01T00:00:00Z", end = "2024-02-01T00:00:00Z" }
/// sample = { release = "4.16", start = "2024-05-01T00:00:00Z", end = "2024-06-01T00:00:00Z" }
/// group_by = ["Platform", "Architecture", "Network"]
///
/// [bounds]
/// confidence = { min = 1, max = 100 }
/// pity = { min = 0, max = 100 }
/// min_fail = { min = 0, max = 1000 }
///
/// [[dimension]]
/// name = "Platform"
/// values = ["aws", "azure", "gcp", "metal"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub defaults: DefaultsSection,

    #[serde(default)]
    pub bounds: Limits,

    #[serde(default)]
    pub severity: SeverityClassifier,

    #[serde(default, rename = "view")]
    pub views: Vec<ViewPreset>,

    #[serde(default)]
    pub bug_tracker: BugTracker,

    #[serde(default, rename = "dimension")]
    pub dimensions: VariantCatalog,
}

impl Settings {
    /// Load and validate settings from a TOML file
    ///
    /// # Errors
    /// Returns error if the file can't be read, isn't valid TOML, or fails
    /// [`Settings::validate`].
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read settings file: {}", path.as_ref().display())
        })?;
        let settings = Self::parse(&content)
            .with_context(|| format!("Invalid settings file: {}", path.as_ref().display()))?;
        tracing::info!(
            path = %path.as_ref().display(),
            dimensions = settings.dimensions.dimensions().len(),
            views = settings.views.len(),
            "loaded settings"
        );
        Ok(settings)
    }

    /// Parse and validate settings from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let settings: Settings =
            toml::from_str(content).context("Failed to parse TOML settings")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Settings compiled into the binary
    pub fn embedded() -> Result<Self> {
        Self::parse(DEFAULT_TOML).context("Failed to load embedded compready-default.toml")
    }

    /// Settings from `path` if given, otherwise the embedded defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_toml(path),
            None => {
                tracing::debug!("no settings file given, using embedded defaults");
                Self::embedded()
            }
        }
    }

    /// Cross-section consistency checks
    pub fn validate(&self) -> Result<()> {
        self.bounds
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid [bounds]: {}", e))?;

        let mut names = HashSet::new();
        for view in &self.views {
            if !names.insert(view.name.as_str()) {
                anyhow::bail!("Duplicate view '{}'", view.name);
            }
            for (role, window) in [("base", &view.base_release), ("sample", &view.sample_release)] {
                if !window.is_ordered() {
                    anyhow::bail!(
                        "View '{}' has an inverted {} window ({} > {})",
                        view.name,
                        role,
                        window.start,
                        window.end
                    );
                }
            }
        }

        // An empty catalog is allowed, but then nothing is selectable
        if !self.dimensions.is_empty() {
            self.dimensions
                .validate()
                .context("Invalid [[dimension]] catalog")?;
        }

        self.bug_tracker
            .validate()
            .context("Invalid [bug_tracker] section")?;

        // Checks [defaults] dimensions against the catalog
        self.default_configuration()
            .context("Invalid [defaults] section")?;
        Ok(())
    }

    pub fn catalog(&self) -> &VariantCatalog {
        &self.dimensions
    }

    /// Configuration a fresh session starts from
    pub fn default_configuration(&self) -> std::result::Result<ReportConfiguration, ConfigError> {
        let defaults = &self.defaults;
        let mut config = ReportConfiguration::new(defaults.basis.clone(), defaults.sample.clone())?
            .with_limits(self.bounds)
            .with_catalog(self.dimensions.clone())?;

        config.set_group_by(defaults.group_by.iter().cloned())?;
        for (dimension, values) in &defaults.include_variants {
            config.set_included_variants(dimension, values.iter().cloned())?;
        }

        config.set_confidence(defaults.confidence);
        config.set_pity(defaults.pity);
        config.set_min_fail(defaults.min_fail);
        config.set_ignore_missing(defaults.ignore_missing);
        config.set_ignore_disruption(defaults.ignore_disruption);
        Ok(config)
    }

    /// Codec bound to these defaults and, through them, to the catalog
    pub fn codec(&self) -> std::result::Result<ConfigurationCodec, ConfigError> {
        Ok(ConfigurationCodec::new(self.default_configuration()?))
    }

    pub fn severity(&self) -> &SeverityClassifier {
        &self.severity
    }

    pub fn bug_tracker(&self) -> &BugTracker {
        &self.bug_tracker
    }

    pub fn views(&self) -> &[ViewPreset] {
        &self.views
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::Tier;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[defaults]
basis = { release = "4.15", start = "2024-01-01T00:00:00Z", end = "2024-02-01T00:00:00Z" }
sample = { release = "4.16", start = "2024-05-01T00:00:00Z", end = "2024-06-01T00:00:00Z" }
"#;

    fn write_settings(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_embedded_settings_load() {
        let settings = Settings::embedded().unwrap();
        assert!(!settings.catalog().is_empty());
        assert!(!settings.views().is_empty());

        let eligible = settings.catalog().eligible_dimensions();
        assert!(eligible.contains(&"Platform"));
        assert!(!eligible.contains(&"Release"));
    }

    #[test]
    fn test_embedded_default_configuration() {
        let settings = Settings::embedded().unwrap();
        let config = settings.default_configuration().unwrap();

        assert!(config.basis().is_ordered());
        assert!(config.sample().is_ordered());
        assert_eq!(config.confidence(), 95);
        assert!(config.group_by().contains("Platform"));
    }

    #[test]
    fn test_minimal_settings_use_defaults() {
        let settings = Settings::parse(MINIMAL).unwrap();
        let config = settings.default_configuration().unwrap();

        assert_eq!(config.confidence(), DEFAULT_CONFIDENCE);
        assert_eq!(config.pity(), DEFAULT_PITY);
        assert_eq!(config.min_fail(), DEFAULT_MIN_FAIL);
        assert!(!config.ignore_missing());
        assert!(config.ignore_disruption());
        assert!(config.group_by().is_empty());
        assert_eq!(settings.severity().classify(-3, None).tier, Tier::Critical);
        assert_eq!(settings.bug_tracker(), &BugTracker::default());
    }

    #[test]
    fn test_from_toml_file() {
        let file = write_settings(MINIMAL);
        let settings = Settings::from_toml(file.path()).unwrap();
        assert_eq!(settings.defaults.sample.release, "4.16");
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::from_toml("/nonexistent/compready.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read settings file"));
    }

    #[test]
    fn test_defaults_are_clamped_into_bounds() {
        let toml_str = format!(
            "{}confidence = 150\npity = -4\n\n[bounds]\nconfidence = {{ min = 50, max = 99 }}\npity = {{ min = 0, max = 10 }}\nmin_fail = {{ min = 1, max = 20 }}\n",
            MINIMAL
        );
        let settings = Settings::parse(&toml_str).unwrap();
        let config = settings.default_configuration().unwrap();

        assert_eq!(config.confidence(), 99);
        assert_eq!(config.pity(), 0);
        assert_eq!(config.min_fail(), 3);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let toml_str = format!(
            "{}\n[bounds]\nconfidence = {{ min = 90, max = 10 }}\npity = {{ min = 0, max = 10 }}\nmin_fail = {{ min = 0, max = 20 }}\n",
            MINIMAL
        );
        let err = Settings::parse(&toml_str).unwrap_err();
        assert!(format!("{:#}", err).contains("inverted"));
    }

    #[test]
    fn test_inverted_default_window_rejected() {
        let toml_str = r#"
[defaults]
basis = { release = "4.15", start = "2024-03-01T00:00:00Z", end = "2024-02-01T00:00:00Z" }
sample = { release = "4.16", start = "2024-05-01T00:00:00Z", end = "2024-06-01T00:00:00Z" }
"#;
        let err = Settings::parse(toml_str).unwrap_err();
        assert!(format!("{:#}", err).contains("basis window"));
    }

    #[test]
    fn test_structural_default_group_by_rejected() {
        let toml_str = format!("{}group_by = [\"Release\"]\n", MINIMAL);
        let err = Settings::parse(&toml_str).unwrap_err();
        assert!(format!("{:#}", err).contains("structural"));
    }

    #[test]
    fn test_unknown_default_dimension_rejected() {
        let toml_str = format!(
            "{}group_by = [\"Cloud\"]\n\n[[dimension]]\nname = \"Platform\"\nvalues = [\"aws\"]\n",
            MINIMAL
        );
        let err = Settings::parse(&toml_str).unwrap_err();
        assert!(format!("{:#}", err).contains("'Cloud' is not in the variant catalog"));
    }

    #[test]
    fn test_empty_catalog_rejects_default_dimensions() {
        let toml_str = format!("{}group_by = [\"Platform\"]\n", MINIMAL);
        let err = Settings::parse(&toml_str).unwrap_err();
        assert!(format!("{:#}", err).contains("not in the variant catalog"));
    }

    #[test]
    fn test_invalid_bug_tracker_endpoint_rejected() {
        let toml_str = format!("{}\n[bug_tracker]\nendpoint = \"not a url\"\n", MINIMAL);
        let err = Settings::parse(&toml_str).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid [bug_tracker] section"));
    }

    #[test]
    fn test_duplicate_view_rejected() {
        let view = r#"
[[view]]
name = "main"
base_release = { release = "4.15", start = "2024-01-01T00:00:00Z", end = "2024-02-01T00:00:00Z" }
sample_release = { release = "4.16", start = "2024-05-01T00:00:00Z", end = "2024-06-01T00:00:00Z" }
"#;
        let toml_str = format!("{}{}{}", MINIMAL, view, view);
        let err = Settings::parse(&toml_str).unwrap_err();
        assert!(err.to_string().contains("Duplicate view 'main'"));
    }

    #[test]
    fn test_codec_uses_defaults() {
        let settings = Settings::embedded().unwrap();
        let codec = settings.codec().unwrap();
        let decoded = codec.decode_query("").unwrap();

        let defaults = settings.default_configuration().unwrap();
        assert_eq!(decoded.catalog(), settings.catalog());
        assert_eq!(decoded.basis(), defaults.basis());
        assert_eq!(decoded.group_by(), defaults.group_by());
        assert!(decoded.included_variants().is_empty());
    }
}

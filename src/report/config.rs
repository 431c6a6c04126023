// Report configuration: the accumulated state of one comparison request
//
// One value per UI session. Every field has a dedicated setter that validates
// before it stores, so a failed call leaves the configuration untouched.
// Numeric setters never fail: out-of-range input is clamped to the nearest
// configured bound.

use crate::report::codec::is_reserved_key;
use crate::report::view::{find_view, ViewPreset};
use crate::report::window::{PullRequest, ReleaseWindow, WindowRole};
use crate::variants::VariantCatalog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

pub const DEFAULT_CONFIDENCE: u32 = 95;
pub const DEFAULT_PITY: u32 = 5;
pub const DEFAULT_MIN_FAIL: u32 = 3;

/// Configuration invariant violations
///
/// These are contract violations by the caller (selecting a structural
/// dimension, inverting a window), not user-input problems.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Dimension '{0}' is structural and cannot be grouped by or filtered on")]
    StructuralDimension(String),

    #[error("Invalid dimension name '{0}'")]
    InvalidDimensionName(String),

    #[error("Dimension '{0}' is not in the variant catalog")]
    UnknownDimension(String),

    #[error("The {role} window starts after it ends ({start} > {end})")]
    InvertedWindow {
        role: WindowRole,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Inclusive clamping range for a numeric setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bound {
    pub min: u32,
    pub max: u32,
}

impl Bound {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Clamp arbitrary input into `[min, max]`
    ///
    /// If the bound is inverted every input clamps to the minimum.
    pub fn clamp(&self, value: i64) -> u32 {
        let max = self.max.max(self.min);
        if value < i64::from(self.min) {
            self.min
        } else if value > i64::from(max) {
            max
        } else {
            value as u32
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= i64::from(self.min) && value <= i64::from(self.max)
    }
}

/// Clamping bounds for the statistical tolerance parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Confidence percentage, must stay within (0, 100]
    pub confidence: Bound,
    /// Pity margin percentage
    pub pity: Bound,
    /// Minimum failure count
    pub min_fail: Bound,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            confidence: Bound::new(1, 100),
            pity: Bound::new(0, 100),
            min_fail: Bound::new(0, 1000),
        }
    }
}

impl Limits {
    /// Validate bounds
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (name, bound) in [
            ("confidence", self.confidence),
            ("pity", self.pity),
            ("min_fail", self.min_fail),
        ] {
            if bound.min > bound.max {
                return Err(format!(
                    "{} bound is inverted: min {} > max {}",
                    name, bound.min, bound.max
                ));
            }
        }

        if self.confidence.min == 0 || self.confidence.max > 100 {
            return Err(format!(
                "confidence bound must lie within (0, 100], got [{}, {}]",
                self.confidence.min, self.confidence.max
            ));
        }

        Ok(())
    }
}

/// State of one Component Readiness comparison request
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use compready::report::{ConfigError, ReleaseWindow, ReportConfiguration};
/// use compready::variants::{VariantCatalog, VariantDimension};
///
/// let basis = ReleaseWindow::new(
///     "4.15",
///     Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
/// );
/// let sample = ReleaseWindow::new(
///     "4.16",
///     Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
/// );
///
/// let catalog = VariantCatalog::new(vec![VariantDimension::new("Platform", ["aws", "gcp"])]);
///
/// let mut config = ReportConfiguration::new(basis, sample)
///     .unwrap()
///     .with_catalog(catalog)
///     .unwrap();
/// assert_eq!(config.set_confidence(150), 100);
/// assert!(config.toggle_group_by("Platform").unwrap());
/// assert!(config.toggle_group_by("Release").is_err());
/// assert_eq!(
///     config.toggle_group_by("Cloud"),
///     Err(ConfigError::UnknownDimension("Cloud".to_string()))
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfiguration {
    view: Option<String>,
    basis: ReleaseWindow,
    sample: ReleaseWindow,
    sample_pull_request: Option<PullRequest>,
    group_by: BTreeSet<String>,
    included_variants: BTreeMap<String, BTreeSet<String>>,
    confidence: u32,
    pity: u32,
    min_fail: u32,
    ignore_missing: bool,
    ignore_disruption: bool,
    #[serde(skip)]
    limits: Limits,
    #[serde(skip)]
    catalog: VariantCatalog,
}

impl ReportConfiguration {
    /// Create a configuration with default tolerances and no grouping
    ///
    /// The catalog starts empty, so no dimension is selectable until one is
    /// attached with [`ReportConfiguration::with_catalog`].
    pub fn new(basis: ReleaseWindow, sample: ReleaseWindow) -> Result<Self> {
        ensure_ordered(WindowRole::Basis, &basis)?;
        ensure_ordered(WindowRole::Sample, &sample)?;

        Ok(Self {
            view: None,
            basis,
            sample,
            sample_pull_request: None,
            group_by: BTreeSet::new(),
            included_variants: BTreeMap::new(),
            confidence: DEFAULT_CONFIDENCE,
            pity: DEFAULT_PITY,
            min_fail: DEFAULT_MIN_FAIL,
            ignore_missing: false,
            ignore_disruption: true,
            limits: Limits::default(),
            catalog: VariantCatalog::default(),
        })
    }

    /// Attach the variant catalog that group-by and filters are checked against
    ///
    /// Fails if a current selection names a dimension the catalog lacks.
    pub fn with_catalog(mut self, catalog: VariantCatalog) -> Result<Self> {
        self.catalog = catalog;
        let selected = self.group_by.iter().chain(self.included_variants.keys());
        for dimension in selected {
            self.ensure_selectable(dimension)?;
        }
        Ok(self)
    }

    /// Replace the clamping bounds, re-clamping the current values
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self.confidence = limits.confidence.clamp(i64::from(self.confidence));
        self.pity = limits.pity.clamp(i64::from(self.pity));
        self.min_fail = limits.min_fail.clamp(i64::from(self.min_fail));
        self
    }

    // Accessors

    pub fn view(&self) -> Option<&str> {
        self.view.as_deref()
    }

    pub fn basis(&self) -> &ReleaseWindow {
        &self.basis
    }

    pub fn sample(&self) -> &ReleaseWindow {
        &self.sample
    }

    pub fn sample_pull_request(&self) -> Option<&PullRequest> {
        self.sample_pull_request.as_ref()
    }

    pub fn group_by(&self) -> &BTreeSet<String> {
        &self.group_by
    }

    /// Selected values per dimension; dimensions without a restriction are absent
    pub fn included_variants(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.included_variants
    }

    pub fn confidence(&self) -> u32 {
        self.confidence
    }

    pub fn pity(&self) -> u32 {
        self.pity
    }

    pub fn min_fail(&self) -> u32 {
        self.min_fail
    }

    pub fn ignore_missing(&self) -> bool {
        self.ignore_missing
    }

    pub fn ignore_disruption(&self) -> bool {
        self.ignore_disruption
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn catalog(&self) -> &VariantCatalog {
        &self.catalog
    }

    // View

    /// Select a named preset
    ///
    /// Overwrites the basis and sample release identifiers from the matching
    /// preset. Windows and variant selections are NOT copied from the preset.
    /// An unknown name is still recorded as the active view.
    pub fn select_view(&mut self, name: &str, views: &[ViewPreset]) {
        match find_view(views, name) {
            Some(preset) => {
                tracing::debug!(
                    view = name,
                    basis = %preset.base_release.release,
                    sample = %preset.sample_release.release,
                    "selected view"
                );
                self.basis.release = preset.base_release.release.clone();
                self.sample.release = preset.sample_release.release.clone();
            }
            None => {
                tracing::warn!(view = name, "view does not match any preset, releases unchanged");
            }
        }
        self.view = Some(name.to_string());
    }

    pub fn clear_view(&mut self) {
        self.view = None;
    }

    /// Record the view name without touching releases (URL restore path)
    pub(crate) fn restore_view(&mut self, name: String) {
        self.view = Some(name);
    }

    // Releases and windows

    pub fn set_basis_release(&mut self, release: impl Into<String>) {
        self.basis.release = release.into();
        tracing::debug!(basis = %self.basis.release, "set basis release");
    }

    pub fn set_sample_release(&mut self, release: impl Into<String>) {
        self.sample.release = release.into();
        tracing::debug!(sample = %self.sample.release, "set sample release");
    }

    /// Set basis release and window together
    pub fn set_basis_release_with_window(&mut self, window: ReleaseWindow) -> Result<()> {
        ensure_ordered(WindowRole::Basis, &window)?;
        tracing::debug!(basis = %window.release, "set basis release with window");
        self.basis = window;
        Ok(())
    }

    /// Set sample release and window together
    pub fn set_sample_release_with_window(&mut self, window: ReleaseWindow) -> Result<()> {
        ensure_ordered(WindowRole::Sample, &window)?;
        tracing::debug!(sample = %window.release, "set sample release with window");
        self.sample = window;
        Ok(())
    }

    pub fn set_basis_start(&mut self, start: DateTime<Utc>) -> Result<()> {
        ensure_bounds(WindowRole::Basis, start, self.basis.end)?;
        self.basis.start = start;
        Ok(())
    }

    pub fn set_basis_end(&mut self, end: DateTime<Utc>) -> Result<()> {
        ensure_bounds(WindowRole::Basis, self.basis.start, end)?;
        self.basis.end = end;
        Ok(())
    }

    pub fn set_sample_start(&mut self, start: DateTime<Utc>) -> Result<()> {
        ensure_bounds(WindowRole::Sample, start, self.sample.end)?;
        self.sample.start = start;
        Ok(())
    }

    pub fn set_sample_end(&mut self, end: DateTime<Utc>) -> Result<()> {
        ensure_bounds(WindowRole::Sample, self.sample.start, end)?;
        self.sample.end = end;
        Ok(())
    }

    /// Evaluate a pull request instead of the published sample release
    pub fn set_sample_pull_request(&mut self, pull_request: Option<PullRequest>) {
        match &pull_request {
            Some(pr) => tracing::debug!(pull_request = %pr, "set sample pull request"),
            None => tracing::debug!("cleared sample pull request"),
        }
        self.sample_pull_request = pull_request;
    }

    // Group-by and variant selection

    /// Add `dimension` to group-by if absent, remove it if present
    ///
    /// Returns whether the dimension is selected after the call.
    pub fn toggle_group_by(&mut self, dimension: &str) -> Result<bool> {
        self.ensure_selectable(dimension)?;
        let selected = if self.group_by.remove(dimension) {
            false
        } else {
            self.group_by.insert(dimension.to_string());
            true
        };
        tracing::debug!(dimension, selected, "toggled group-by");
        Ok(selected)
    }

    /// Replace the whole group-by set
    ///
    /// Every name is validated before anything is stored.
    pub fn set_group_by<I, S>(&mut self, dimensions: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dimensions: BTreeSet<String> = dimensions.into_iter().map(Into::into).collect();
        for dimension in &dimensions {
            self.ensure_selectable(dimension)?;
        }
        self.group_by = dimensions;
        Ok(())
    }

    /// Add `value` to the restriction for `dimension` if absent, remove it if present
    ///
    /// A dimension whose last value is removed drops out of the map entirely,
    /// which is the same as "no restriction". Returns whether the value is
    /// selected after the call.
    pub fn toggle_included_variant(&mut self, dimension: &str, value: &str) -> Result<bool> {
        self.ensure_selectable(dimension)?;

        let values = self
            .included_variants
            .entry(dimension.to_string())
            .or_default();
        let selected = if values.remove(value) {
            false
        } else {
            values.insert(value.to_string());
            true
        };
        if values.is_empty() {
            self.included_variants.remove(dimension);
        }

        tracing::debug!(dimension, value, selected, "toggled included variant");
        Ok(selected)
    }

    /// Add `value` to the restriction for `dimension` (no-op if already present)
    pub fn include_variant(&mut self, dimension: &str, value: &str) -> Result<()> {
        self.ensure_selectable(dimension)?;
        self.included_variants
            .entry(dimension.to_string())
            .or_default()
            .insert(value.to_string());
        Ok(())
    }

    /// Replace the restriction for one dimension; an empty set lifts it
    pub fn set_included_variants<I, S>(&mut self, dimension: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ensure_selectable(dimension)?;
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.included_variants.remove(dimension);
        } else {
            self.included_variants.insert(dimension.to_string(), values);
        }
        Ok(())
    }

    /// Lift every variant restriction
    pub fn clear_included_variants(&mut self) {
        self.included_variants.clear();
    }

    // Statistical tolerances

    /// Set the confidence percentage, clamped into the configured bound
    ///
    /// Returns the stored value.
    pub fn set_confidence(&mut self, confidence: i64) -> u32 {
        self.confidence = clamp_logged("confidence", self.limits.confidence, confidence);
        self.confidence
    }

    /// Set the pity margin percentage, clamped into the configured bound
    pub fn set_pity(&mut self, pity: i64) -> u32 {
        self.pity = clamp_logged("pity", self.limits.pity, pity);
        self.pity
    }

    /// Set the minimum failure count, clamped into the configured bound
    pub fn set_min_fail(&mut self, min_fail: i64) -> u32 {
        self.min_fail = clamp_logged("min_fail", self.limits.min_fail, min_fail);
        self.min_fail
    }

    pub fn set_ignore_missing(&mut self, ignore: bool) {
        self.ignore_missing = ignore;
    }

    pub fn set_ignore_disruption(&mut self, ignore: bool) {
        self.ignore_disruption = ignore;
    }

    /// Dimensions must be non-structural, must survive the query encoding
    /// and must be listed in the catalog
    fn ensure_selectable(&self, dimension: &str) -> Result<()> {
        if VariantCatalog::is_structural(dimension) {
            return Err(ConfigError::StructuralDimension(dimension.to_string()));
        }
        if dimension.is_empty() || dimension.contains(',') || is_reserved_key(dimension) {
            return Err(ConfigError::InvalidDimensionName(dimension.to_string()));
        }
        if !self.catalog.contains(dimension) {
            return Err(ConfigError::UnknownDimension(dimension.to_string()));
        }
        Ok(())
    }
}

fn clamp_logged(field: &str, bound: Bound, value: i64) -> u32 {
    let clamped = bound.clamp(value);
    if i64::from(clamped) != value {
        tracing::warn!(field, requested = value, stored = clamped, "clamped out-of-range value");
    } else {
        tracing::debug!(field, value, "set tolerance");
    }
    clamped
}

fn ensure_ordered(role: WindowRole, window: &ReleaseWindow) -> Result<()> {
    ensure_bounds(role, window.start, window.end)
}

fn ensure_bounds(role: WindowRole, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if start > end {
        return Err(ConfigError::InvertedWindow { role, start, end });
    }
    Ok(())
}

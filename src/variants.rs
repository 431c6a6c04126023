//! Variant catalog: the grouping dimensions a comparison can be broken down by
//!
//! The catalog lists every known dimension with its ordered values. A fixed
//! subset of dimensions is structural: they are always implicit in the
//! comparison (release, aggregation, ...) and never offered as free-form
//! include/exclude filters or group-by choices.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Dimensions that are never user-selectable
pub const STRUCTURAL_DIMENSIONS: [&str; 11] = [
    "Aggregation",
    "FromRelease",
    "FromReleaseMajor",
    "FromReleaseMinor",
    "NetworkAccess",
    "NetworkStack",
    "Release",
    "ReleaseMajor",
    "ReleaseMinor",
    "Scheduler",
    "SecurityMode",
];

/// Errors for catalog validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Duplicate variant dimension '{0}'")]
    DuplicateDimension(String),

    #[error("Catalog is missing structural dimensions: {}", .0.join(", "))]
    MissingStructural(Vec<String>),
}

/// One grouping dimension and its possible values, in catalog order
///
/// # Example TOML
/// ```toml
/// [[dimension]]
/// name = "Platform"
/// values = ["aws", "azure", "gcp", "metal"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDimension {
    pub name: String,

    #[serde(default)]
    pub values: Vec<String>,
}

impl VariantDimension {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Known set of variant dimensions, order preserved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantCatalog {
    dimensions: Vec<VariantDimension>,
}

impl VariantCatalog {
    pub fn new(dimensions: Vec<VariantDimension>) -> Self {
        Self { dimensions }
    }

    /// Whether `name` is one of the fixed structural dimensions
    pub fn is_structural(name: &str) -> bool {
        STRUCTURAL_DIMENSIONS.contains(&name)
    }

    pub fn dimensions(&self) -> &[VariantDimension] {
        &self.dimensions
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dimensions.iter().any(|d| d.name == name)
    }

    /// Ordered values of a dimension, `None` if the dimension is unknown
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.values.as_slice())
    }

    /// Dimensions offered for user-driven grouping and filtering
    ///
    /// All catalog dimensions minus the structural ones, in catalog order.
    ///
    /// # Example
    /// ```
    /// use compready::variants::{VariantCatalog, VariantDimension};
    ///
    /// let catalog = VariantCatalog::new(vec![
    ///     VariantDimension::new("Platform", ["aws", "gcp"]),
    ///     VariantDimension::new("Release", ["4.16"]),
    ///     VariantDimension::new("Network", ["ovn"]),
    /// ]);
    /// assert_eq!(catalog.eligible_dimensions(), vec!["Platform", "Network"]);
    /// ```
    pub fn eligible_dimensions(&self) -> Vec<&str> {
        self.dimensions
            .iter()
            .map(|d| d.name.as_str())
            .filter(|name| !Self::is_structural(name))
            .collect()
    }

    /// Check that dimension names are unique and every structural dimension is listed
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for dimension in &self.dimensions {
            if !seen.insert(dimension.name.as_str()) {
                return Err(CatalogError::DuplicateDimension(dimension.name.clone()));
            }
        }

        let missing: Vec<String> = STRUCTURAL_DIMENSIONS
            .iter()
            .filter(|name| !seen.contains(*name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(CatalogError::MissingStructural(missing));
        }

        Ok(())
    }
}

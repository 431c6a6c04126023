use crate::report::window::ReleaseWindow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named preset a user can pick instead of filling in every field
///
/// Selecting a view only copies the two release identifiers into the active
/// configuration. Windows, group-by and variant selections stored here are
/// informational and are left untouched on selection.
///
/// # Example TOML
/// ```toml
/// [[view]]
/// name = "4.16-main"
/// base_release = { release = "4.15", start = "2024-01-01T00:00:00Z", end = "2024-02-01T00:00:00Z" }
/// sample_release = { release = "4.16", start = "2024-05-01T00:00:00Z", end = "2024-06-01T00:00:00Z" }
/// group_by = ["Platform", "Architecture", "Network"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewPreset {
    pub name: String,
    pub base_release: ReleaseWindow,
    pub sample_release: ReleaseWindow,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub include_variants: BTreeMap<String, Vec<String>>,
}

/// Find a preset by exact name
pub fn find_view<'a>(views: &'a [ViewPreset], name: &str) -> Option<&'a ViewPreset> {
    views.iter().find(|v| v.name == name)
}

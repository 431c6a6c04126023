use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the comparison a window belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowRole {
    /// Historical release used as the regression baseline
    Basis,
    /// Release (or pull request) being evaluated
    Sample,
}

impl fmt::Display for WindowRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowRole::Basis => f.write_str("basis"),
            WindowRole::Sample => f.write_str("sample"),
        }
    }
}

/// A release identifier plus the time window of job runs to consider
///
/// # Example TOML
/// ```toml
/// [defaults.basis]
/// release = "4.15"
/// start = "2024-01-01T00:00:00Z"
/// end = "2024-02-01T00:00:00Z"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseWindow {
    pub release: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReleaseWindow {
    pub fn new(release: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            release: release.into(),
            start,
            end,
        }
    }

    /// `start <= end`
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }
}

/// In-flight change evaluated in place of a published sample release
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PullRequest {
    pub org: String,
    pub repo: String,
    pub number: u64,
}

impl PullRequest {
    pub fn new(org: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            org: org.into(),
            repo: repo.into(),
            number,
        }
    }
}

impl fmt::Display for PullRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.org, self.repo, self.number)
    }
}

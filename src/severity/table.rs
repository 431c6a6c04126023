use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Display severity of a classified status, lowest first
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl Tier {
    /// All tiers in ascending order
    pub const fn all() -> &'static [Tier] {
        &[
            Tier::None,
            Tier::Low,
            Tier::Medium,
            Tier::High,
            Tier::Critical,
        ]
    }

    /// One step lower, saturating at `None`
    pub const fn downgrade(self) -> Tier {
        match self {
            Tier::None | Tier::Low => Tier::None,
            Tier::Medium => Tier::Low,
            Tier::High => Tier::Medium,
            Tier::Critical => Tier::High,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Tier::None => "none",
            Tier::Low => "low",
            Tier::Medium => "medium",
            Tier::High => "high",
            Tier::Critical => "critical",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label family selected by the sign of a status code
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Negative status codes
    Regression,
    /// Zero and positive status codes
    Improvement,
}

impl Direction {
    pub fn of(status: i64) -> Direction {
        if status < 0 {
            Direction::Regression
        } else {
            Direction::Improvement
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Regression => f.write_str("regression"),
            Direction::Improvement => f.write_str("improvement"),
        }
    }
}

/// Errors validating a breakpoint table
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("The {0} breakpoint table is empty")]
    Empty(Direction),

    #[error("The {0} breakpoint table has no catch-all entry (min_magnitude = 0)")]
    MissingCatchAll(Direction),

    #[error("The {family} breakpoint table lists magnitude {magnitude} twice")]
    DuplicateMagnitude { family: Direction, magnitude: u64 },

    #[error("Gray threshold must be finite and non-negative, got {0}")]
    GrayThreshold(f64),
}

/// One row of a breakpoint table
///
/// # Example TOML
/// ```toml
/// [[severity.regression]]
/// min_magnitude = 3
/// tier = "critical"
/// label = "ExtremeRegression detected ( >15% pass rate change)"
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    /// Smallest |status| this row applies to
    pub min_magnitude: u64,
    pub tier: Tier,
    pub label: String,
}

impl Breakpoint {
    pub fn new(min_magnitude: u64, tier: Tier, label: impl Into<String>) -> Self {
        Self {
            min_magnitude,
            tier,
            label: label.into(),
        }
    }
}

/// Breakpoints for one direction, largest magnitude first
///
/// The catch-all row (min_magnitude = 0) is held apart so lookups are total.
#[derive(Debug, Clone, PartialEq)]
struct Family {
    ranked: Vec<Breakpoint>,
    catch_all: Breakpoint,
}

impl Family {
    fn build(direction: Direction, mut rows: Vec<Breakpoint>) -> Result<Self, TableError> {
        if rows.is_empty() {
            return Err(TableError::Empty(direction));
        }

        let mut seen = HashSet::new();
        for row in &rows {
            if !seen.insert(row.min_magnitude) {
                return Err(TableError::DuplicateMagnitude {
                    family: direction,
                    magnitude: row.min_magnitude,
                });
            }
        }

        rows.sort_by(|a, b| b.min_magnitude.cmp(&a.min_magnitude));
        let catch_all = match rows.pop() {
            Some(row) if row.min_magnitude == 0 => row,
            _ => return Err(TableError::MissingCatchAll(direction)),
        };

        Ok(Self {
            ranked: rows,
            catch_all,
        })
    }

    fn lookup(&self, magnitude: u64) -> &Breakpoint {
        self.ranked
            .iter()
            .find(|row| magnitude >= row.min_magnitude)
            .unwrap_or(&self.catch_all)
    }

    fn rows(&self) -> Vec<Breakpoint> {
        let mut rows = self.ranked.clone();
        rows.push(self.catch_all.clone());
        rows
    }
}

/// Magnitude breakpoints for both directions
///
/// Both families are guaranteed at construction to carry a catch-all row, so
/// every status code maps to some row.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakpointTable {
    regression: Family,
    improvement: Family,
}

impl BreakpointTable {
    /// Build and validate a table; rows may be given in any order
    pub fn new(
        regression: Vec<Breakpoint>,
        improvement: Vec<Breakpoint>,
    ) -> Result<Self, TableError> {
        Ok(Self {
            regression: Family::build(Direction::Regression, regression)?,
            improvement: Family::build(Direction::Improvement, improvement)?,
        })
    }

    /// First row, scanning from largest to smallest magnitude, that `magnitude` reaches
    pub fn lookup(&self, direction: Direction, magnitude: u64) -> &Breakpoint {
        self.family(direction).lookup(magnitude)
    }

    /// Rows of one direction, largest magnitude first
    pub fn rows(&self, direction: Direction) -> Vec<Breakpoint> {
        self.family(direction).rows()
    }

    fn family(&self, direction: Direction) -> &Family {
        match direction {
            Direction::Regression => &self.regression,
            Direction::Improvement => &self.improvement,
        }
    }
}

impl Default for BreakpointTable {
    /// Component Readiness status codes as the dashboard renders them
    fn default() -> Self {
        Self {
            regression: Family {
                ranked: vec![
                    Breakpoint::new(
                        3,
                        Tier::Critical,
                        "ExtremeRegression detected ( >15% pass rate change)",
                    ),
                    Breakpoint::new(2, Tier::High, "SignificantRegression detected"),
                    Breakpoint::new(1, Tier::Low, "Missing Sample (sample data missing)"),
                ],
                catch_all: Breakpoint::new(0, Tier::None, "NoSignificantDifference detected"),
            },
            improvement: Family {
                ranked: vec![
                    Breakpoint::new(
                        3,
                        Tier::Low,
                        "SignificantImprovement detected (improved sample rate)",
                    ),
                    Breakpoint::new(
                        2,
                        Tier::Low,
                        "Missing Basis And Sample (basis and sample data missing)",
                    ),
                    Breakpoint::new(1, Tier::Low, "Missing Basis (basis data missing)"),
                ],
                catch_all: Breakpoint::new(0, Tier::None, "NoSignificantDifference detected"),
            },
        }
    }
}

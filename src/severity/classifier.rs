use crate::severity::table::{Breakpoint, BreakpointTable, Direction, TableError, Tier};
use serde::{Deserialize, Serialize};

/// Default gray factor above which a tier is dampened
pub const DEFAULT_GRAY_THRESHOLD: f64 = 0.5;

/// Result of classifying one status code
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub status: i64,
    pub direction: Direction,
    pub label: String,
    pub tier: Tier,
    /// Tier was lowered one step because of the gray factor
    pub dampened: bool,
}

impl Classification {
    /// Tooltip text, e.g. `-2: SignificantRegression detected`
    pub fn status_text(&self) -> String {
        format!("{}: {}", self.status, self.label)
    }
}

/// Maps regression status codes to a label and display tier
///
/// Breakpoints and the gray dampening threshold are configuration; the
/// classifier itself is pure.
///
/// # Example
/// ```
/// use compready::severity::{SeverityClassifier, Tier};
///
/// let classifier = SeverityClassifier::default();
/// let plain = classifier.classify(-3, None);
/// let gray = classifier.classify(-3, Some(0.9));
///
/// assert_eq!(plain.tier, Tier::Critical);
/// assert_eq!(gray.tier, Tier::High);
/// assert_eq!(plain.label, gray.label);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeveritySettings", into = "SeveritySettings")]
pub struct SeverityClassifier {
    table: BreakpointTable,
    gray_threshold: f64,
}

impl Default for SeverityClassifier {
    fn default() -> Self {
        Self {
            table: BreakpointTable::default(),
            gray_threshold: DEFAULT_GRAY_THRESHOLD,
        }
    }
}

impl SeverityClassifier {
    pub fn new(table: BreakpointTable, gray_threshold: f64) -> Result<Self, TableError> {
        if !gray_threshold.is_finite() || gray_threshold < 0.0 {
            return Err(TableError::GrayThreshold(gray_threshold));
        }
        Ok(Self {
            table,
            gray_threshold,
        })
    }

    pub fn gray_threshold(&self) -> f64 {
        self.gray_threshold
    }

    /// Classify a status code
    ///
    /// The sign picks the label family, the magnitude picks the row. A gray
    /// factor strictly above the threshold lowers the tier one step (never
    /// below `Tier::None`) and leaves the label alone.
    pub fn classify(&self, status: i64, gray_factor: Option<f64>) -> Classification {
        let direction = Direction::of(status);
        let row = self.table.lookup(direction, status.unsigned_abs());

        let dampened = gray_factor.is_some_and(|g| g > self.gray_threshold);
        let tier = if dampened {
            row.tier.downgrade()
        } else {
            row.tier
        };

        Classification {
            status,
            direction,
            label: row.label.clone(),
            tier,
            dampened,
        }
    }
}

/// On-disk shape of the `[severity]` settings section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeveritySettings {
    #[serde(default = "default_gray_threshold")]
    pub gray_threshold: f64,
    pub regression: Vec<Breakpoint>,
    pub improvement: Vec<Breakpoint>,
}

fn default_gray_threshold() -> f64 {
    DEFAULT_GRAY_THRESHOLD
}

impl TryFrom<SeveritySettings> for SeverityClassifier {
    type Error = TableError;

    fn try_from(settings: SeveritySettings) -> Result<Self, Self::Error> {
        let table = BreakpointTable::new(settings.regression, settings.improvement)?;
        SeverityClassifier::new(table, settings.gray_threshold)
    }
}

impl From<SeverityClassifier> for SeveritySettings {
    fn from(classifier: SeverityClassifier) -> Self {
        Self {
            gray_threshold: classifier.gray_threshold,
            regression: classifier.table.rows(Direction::Regression),
            improvement: classifier.table.rows(Direction::Improvement),
        }
    }
}

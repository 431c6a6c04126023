// Flat query-parameter codec for report configurations
//
// Wire format (stable, URLs are shared and bookmarked):
//   view=<name>                      omitted when no view is selected
//   baseRelease / baseStartTime / baseEndTime
//   sampleRelease / sampleStartTime / sampleEndTime
//   samplePROrg / samplePRRepo / samplePRNumber   omitted as a triple
//   groupBy=<dim>,<dim>,...          always present, possibly empty
//   confidence / pity / minFail / ignoreMissing / ignoreDisruption
//   <Dimension>=<value>              repeated, one pair per selected value
//
// Timestamps are RFC 3339 in UTC. Absent keys fall back to the codec's
// default configuration; present but malformed values are errors.

use crate::report::config::{ConfigError, ReportConfiguration};
use crate::report::window::{PullRequest, ReleaseWindow};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use thiserror::Error;
use url::form_urlencoded;

/// Query parameter names
pub mod keys {
    pub const VIEW: &str = "view";
    pub const BASE_RELEASE: &str = "baseRelease";
    pub const BASE_START_TIME: &str = "baseStartTime";
    pub const BASE_END_TIME: &str = "baseEndTime";
    pub const SAMPLE_RELEASE: &str = "sampleRelease";
    pub const SAMPLE_START_TIME: &str = "sampleStartTime";
    pub const SAMPLE_END_TIME: &str = "sampleEndTime";
    pub const SAMPLE_PR_ORG: &str = "samplePROrg";
    pub const SAMPLE_PR_REPO: &str = "samplePRRepo";
    pub const SAMPLE_PR_NUMBER: &str = "samplePRNumber";
    pub const GROUP_BY: &str = "groupBy";
    pub const CONFIDENCE: &str = "confidence";
    pub const PITY: &str = "pity";
    pub const MIN_FAIL: &str = "minFail";
    pub const IGNORE_MISSING: &str = "ignoreMissing";
    pub const IGNORE_DISRUPTION: &str = "ignoreDisruption";

    pub const ALL: [&str; 16] = [
        VIEW,
        BASE_RELEASE,
        BASE_START_TIME,
        BASE_END_TIME,
        SAMPLE_RELEASE,
        SAMPLE_START_TIME,
        SAMPLE_END_TIME,
        SAMPLE_PR_ORG,
        SAMPLE_PR_REPO,
        SAMPLE_PR_NUMBER,
        GROUP_BY,
        CONFIDENCE,
        PITY,
        MIN_FAIL,
        IGNORE_MISSING,
        IGNORE_DISRUPTION,
    ];
}

/// Route the report page is served under
pub const REPORT_ROUTE: &str = "/component_readiness/main";

/// Flat, ordered key/value pairs; duplicate keys allowed
pub type QueryParams = Vec<(String, String)>;

/// Whether `key` names a scalar field of the wire format
pub fn is_reserved_key(key: &str) -> bool {
    keys::ALL.contains(&key)
}

/// Errors decoding a query into a configuration
///
/// Every variant names the offending key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed value '{value}' for key '{key}': {reason}")]
    Malformed {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Incomplete pull request reference: key '{key}' is missing")]
    IncompletePullRequest { key: String },

    #[error("Value for key '{key}' violates a configuration invariant: {source}")]
    Invariant {
        key: String,
        #[source]
        source: ConfigError,
    },
}

impl DecodeError {
    /// The query key that caused the failure
    pub fn key(&self) -> &str {
        match self {
            DecodeError::Malformed { key, .. }
            | DecodeError::IncompletePullRequest { key }
            | DecodeError::Invariant { key, .. } => key,
        }
    }

    fn malformed(key: &str, value: &str, reason: impl ToString) -> Self {
        DecodeError::Malformed {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn invariant(key: &str, source: ConfigError) -> Self {
        DecodeError::Invariant {
            key: key.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;

/// Encodes configurations to query parameters and decodes them back
///
/// Absent keys fall back to the default configuration. The catalog attached
/// to the defaults tells dimension keys apart from unknown keys.
#[derive(Debug, Clone)]
pub struct ConfigurationCodec {
    defaults: ReportConfiguration,
}

impl ConfigurationCodec {
    pub fn new(defaults: ReportConfiguration) -> Self {
        Self { defaults }
    }

    /// Flatten a configuration into query parameters
    pub fn encode(&self, config: &ReportConfiguration) -> QueryParams {
        encode(config)
    }

    /// Rebuild a configuration from query parameters
    ///
    /// Unknown keys are ignored. A repeated scalar key keeps its last value.
    /// Included variants never fall back to the defaults: no dimension keys
    /// means no restriction.
    pub fn decode<I, K, V>(&self, params: I) -> Result<ReportConfiguration>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut scalars: BTreeMap<&'static str, String> = BTreeMap::new();
        let mut variants: Vec<(String, String)> = Vec::new();
        let mut ignored = 0usize;

        for (key, value) in params {
            let (key, value) = (key.as_ref(), value.as_ref());
            if let Some(known) = keys::ALL.iter().find(|k| **k == key) {
                scalars.insert(*known, value.to_string());
            } else if self.defaults.catalog().contains(key) {
                variants.push((key.to_string(), value.to_string()));
            } else {
                ignored += 1;
                tracing::debug!(key, "ignoring unknown query key");
            }
        }

        let mut config = self.defaults.clone();

        let basis = decode_window(
            &scalars,
            self.defaults.basis(),
            [keys::BASE_RELEASE, keys::BASE_START_TIME, keys::BASE_END_TIME],
        )?;
        config
            .set_basis_release_with_window(basis)
            .map_err(|e| {
                let key = window_order_key(&scalars, keys::BASE_START_TIME, keys::BASE_END_TIME);
                DecodeError::invariant(key, e)
            })?;

        let sample = decode_window(
            &scalars,
            self.defaults.sample(),
            [
                keys::SAMPLE_RELEASE,
                keys::SAMPLE_START_TIME,
                keys::SAMPLE_END_TIME,
            ],
        )?;
        config
            .set_sample_release_with_window(sample)
            .map_err(|e| {
                let key =
                    window_order_key(&scalars, keys::SAMPLE_START_TIME, keys::SAMPLE_END_TIME);
                DecodeError::invariant(key, e)
            })?;

        config.set_sample_pull_request(decode_pull_request(&scalars)?);

        match scalars.get(keys::VIEW) {
            Some(view) => config.restore_view(view.clone()),
            None => config.clear_view(),
        }

        if let Some(group_by) = scalars.get(keys::GROUP_BY) {
            let dimensions = group_by.split(',').filter(|d| !d.is_empty());
            config
                .set_group_by(dimensions)
                .map_err(|e| DecodeError::invariant(keys::GROUP_BY, e))?;
        }

        if let Some(value) = scalars.get(keys::CONFIDENCE) {
            config.set_confidence(parse_integer(keys::CONFIDENCE, value)?);
        }
        if let Some(value) = scalars.get(keys::PITY) {
            config.set_pity(parse_integer(keys::PITY, value)?);
        }
        if let Some(value) = scalars.get(keys::MIN_FAIL) {
            config.set_min_fail(parse_integer(keys::MIN_FAIL, value)?);
        }
        if let Some(value) = scalars.get(keys::IGNORE_MISSING) {
            config.set_ignore_missing(parse_bool(keys::IGNORE_MISSING, value)?);
        }
        if let Some(value) = scalars.get(keys::IGNORE_DISRUPTION) {
            config.set_ignore_disruption(parse_bool(keys::IGNORE_DISRUPTION, value)?);
        }

        config.clear_included_variants();
        for (dimension, value) in &variants {
            config
                .include_variant(dimension, value)
                .map_err(|e| DecodeError::invariant(dimension, e))?;
        }

        tracing::debug!(
            scalars = scalars.len(),
            variants = variants.len(),
            ignored,
            "decoded report configuration"
        );
        Ok(config)
    }

    /// Decode an `application/x-www-form-urlencoded` query string
    pub fn decode_query(&self, query: &str) -> Result<ReportConfiguration> {
        self.decode(parse_query_string(query))
    }
}

/// Flatten a configuration into query parameters
pub fn encode(config: &ReportConfiguration) -> QueryParams {
    let mut params = QueryParams::new();
    let mut push = |key: &str, value: String| params.push((key.to_string(), value));

    if let Some(view) = config.view() {
        push(keys::VIEW, view.to_string());
    }

    let basis = config.basis();
    push(keys::BASE_RELEASE, basis.release.clone());
    push(keys::BASE_START_TIME, format_timestamp(&basis.start));
    push(keys::BASE_END_TIME, format_timestamp(&basis.end));

    let sample = config.sample();
    push(keys::SAMPLE_RELEASE, sample.release.clone());
    push(keys::SAMPLE_START_TIME, format_timestamp(&sample.start));
    push(keys::SAMPLE_END_TIME, format_timestamp(&sample.end));

    if let Some(pr) = config.sample_pull_request() {
        push(keys::SAMPLE_PR_ORG, pr.org.clone());
        push(keys::SAMPLE_PR_REPO, pr.repo.clone());
        push(keys::SAMPLE_PR_NUMBER, pr.number.to_string());
    }

    let group_by: Vec<&str> = config.group_by().iter().map(String::as_str).collect();
    push(keys::GROUP_BY, group_by.join(","));

    push(keys::CONFIDENCE, config.confidence().to_string());
    push(keys::PITY, config.pity().to_string());
    push(keys::MIN_FAIL, config.min_fail().to_string());
    push(keys::IGNORE_MISSING, config.ignore_missing().to_string());
    push(keys::IGNORE_DISRUPTION, config.ignore_disruption().to_string());

    for (dimension, values) in config.included_variants() {
        for value in values {
            push(dimension.as_str(), value.clone());
        }
    }

    params
}

/// Serialize pairs as a percent-encoded query string (no leading `?`)
pub fn to_query_string(params: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

/// Parse a query string into pairs; a leading `?` is accepted
pub fn parse_query_string(query: &str) -> QueryParams {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// Path to the report page for a configuration
///
/// # Example
/// ```
/// use compready::report::codec::report_path;
///
/// let params = vec![("groupBy".to_string(), "Platform,Network".to_string())];
/// assert_eq!(
///     report_path(&params),
///     "/component_readiness/main?groupBy=Platform%2CNetwork"
/// );
/// ```
pub fn report_path(params: &[(String, String)]) -> String {
    format!("{}?{}", REPORT_ROUTE, to_query_string(params))
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_timestamp(key: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DecodeError::malformed(key, value, e))
}

fn parse_integer(key: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|e| DecodeError::malformed(key, value, e))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value
        .parse::<bool>()
        .map_err(|e| DecodeError::malformed(key, value, e))
}

fn decode_window(
    scalars: &BTreeMap<&'static str, String>,
    default: &ReleaseWindow,
    [release_key, start_key, end_key]: [&str; 3],
) -> Result<ReleaseWindow> {
    let release = scalars
        .get(release_key)
        .cloned()
        .unwrap_or_else(|| default.release.clone());
    let start = match scalars.get(start_key) {
        Some(value) => parse_timestamp(start_key, value)?,
        None => default.start,
    };
    let end = match scalars.get(end_key) {
        Some(value) => parse_timestamp(end_key, value)?,
        None => default.end,
    };
    Ok(ReleaseWindow::new(release, start, end))
}

/// Key blamed for an inverted window: the end bound whenever the query set it
fn window_order_key(
    scalars: &BTreeMap<&'static str, String>,
    start_key: &'static str,
    end_key: &'static str,
) -> &'static str {
    if scalars.contains_key(end_key) {
        end_key
    } else {
        start_key
    }
}

/// The pull request triple is all-or-nothing
fn decode_pull_request(scalars: &BTreeMap<&'static str, String>) -> Result<Option<PullRequest>> {
    let org = scalars.get(keys::SAMPLE_PR_ORG);
    let repo = scalars.get(keys::SAMPLE_PR_REPO);
    let number = scalars.get(keys::SAMPLE_PR_NUMBER);

    match (org, repo, number) {
        (None, None, None) => Ok(None),
        (Some(org), Some(repo), Some(number)) => {
            let number = number
                .trim()
                .parse::<u64>()
                .map_err(|e| DecodeError::malformed(keys::SAMPLE_PR_NUMBER, number, e))?;
            Ok(Some(PullRequest::new(org.clone(), repo.clone(), number)))
        }
        _ => {
            let missing = [
                (keys::SAMPLE_PR_ORG, org.is_none()),
                (keys::SAMPLE_PR_REPO, repo.is_none()),
                (keys::SAMPLE_PR_NUMBER, number.is_none()),
            ]
            .into_iter()
            .find(|(_, absent)| *absent)
            .map_or(keys::SAMPLE_PR_NUMBER, |(key, _)| key);
            Err(DecodeError::IncompletePullRequest {
                key: missing.to_string(),
            })
        }
    }
}

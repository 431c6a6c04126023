//! Bug signals for report result items
//!
//! Pure helpers used to rank and colour test/component results by their bug
//! linkage, and to prefill a bug-tracker form for a failing test. Nothing here
//! talks to the bug tracker; [`BugTracker::draft`] only builds the URL.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use url::{form_urlencoded, Url};

/// Reference to a bug as returned by the report backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugRef {
    /// Tracker key, e.g. `OCPBUGS-1234`
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl BugRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            summary: None,
            url: None,
        }
    }
}

/// One test or component row of a report, as consumed from the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    /// Test or component identifier
    pub name: String,

    /// Signed regression code (negative = regression)
    pub status: i64,

    /// Dampening signal for low-confidence results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gray_factor: Option<f64>,

    /// Bugs explicitly filed against this item
    #[serde(default)]
    pub bugs: Vec<BugRef>,

    /// Bugs related to this item by heuristic
    #[serde(default)]
    pub associated_bugs: Vec<BugRef>,

    /// Pre-existing evidence link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_grid_url: Option<String>,
}

impl ResultItem {
    pub fn new(name: impl Into<String>, status: i64) -> Self {
        Self {
            name: name.into(),
            status,
            gray_factor: None,
            bugs: Vec::new(),
            associated_bugs: Vec::new(),
            test_grid_url: None,
        }
    }
}

/// Triage colour of an item, keyed on its bug linkage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageColor {
    /// At least one directly linked bug
    Linked,
    /// No linked bug, at least one associated bug
    AssociatedOnly,
    None,
}

impl TriageColor {
    /// CSS colour name the dashboard renders
    pub const fn css_color(self) -> &'static str {
        match self {
            TriageColor::Linked => "black",
            TriageColor::AssociatedOnly => "darkred",
            TriageColor::None => "lightgray",
        }
    }
}

/// Linked bugs take priority over associated ones
pub fn triage_color(item: &ResultItem) -> TriageColor {
    if !item.bugs.is_empty() {
        TriageColor::Linked
    } else if !item.associated_bugs.is_empty() {
        TriageColor::AssociatedOnly
    } else {
        TriageColor::None
    }
}

/// Relative ranking weight: one linked bug outweighs 99 associated bugs
pub fn bug_weight(linked: &[BugRef], associated: &[BugRef]) -> i64 {
    100 * linked.len() as i64 + associated.len() as i64
}

/// Difference of bug weights; positive when `a` carries more bug signal
pub fn compare_bug_weight(a: &ResultItem, b: &ResultItem) -> i64 {
    bug_weight(&a.bugs, &a.associated_bugs) - bug_weight(&b.bugs, &b.associated_bugs)
}

/// Sort items by descending bug weight; ties keep their order
pub fn rank_by_bug_weight(items: &mut [ResultItem]) {
    items.sort_by(|a, b| match compare_bug_weight(b, a) {
        w if w < 0 => Ordering::Less,
        0 => Ordering::Equal,
        _ => Ordering::Greater,
    });
}

pub const DEFAULT_ENDPOINT: &str = "https://bugzilla.redhat.com/enter_bug.cgi";
pub const DEFAULT_CLASSIFICATION: &str = "Red Hat";
pub const DEFAULT_PRODUCT: &str = "OpenShift Container Platform";
pub const DEFAULT_WHITEBOARD: &str = "trt";
pub const DEFAULT_VERSION: &str = "4.9";
pub const DEFAULT_CC: &str = "sippy@dptools.openshift.org";
pub const DEFAULT_ANALYSIS_BASE: &str = "https://sippy.ci.openshift.org/sippy-ng/tests";

const JOB_PLACEHOLDER: &str = "FIXME: Replace this paragraph with a particular job URI from the search results to ground discussion.  A given test may fail for several reasons, and this bug should be scoped to one of those reasons.  Ideally you'd pick a job showing the most-common reason, but since that's hard to determine, you may also chose to pick a job at random.  Release-gating jobs (release-openshift-...) should be preferred over presubmits (pull-ci-...) because they are closer to the released product and less likely to have in-flight code changes that complicate analysis.";

const SNIPPET_PLACEHOLDER: &str =
    "FIXME: Provide a snippet of the test failure or error from the job log";

/// Prefilled bug report for a failing item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BugReportDraft {
    pub title: String,
    pub body: String,
    /// Tracker form URL with every field percent-encoded, spaces as `%20`
    pub url: String,
}

/// Fixed bug-tracker form settings
///
/// `version` is a constant product version, not derived from the release
/// under analysis.
///
/// # Example TOML
/// ```toml
/// [bug_tracker]
/// endpoint = "https://bugzilla.redhat.com/enter_bug.cgi"
/// product = "OpenShift Container Platform"
/// version = "4.9"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BugTracker {
    /// Form URL; checked by [`BugTracker::validate`]
    pub endpoint: String,
    pub classification: String,
    pub product: String,
    pub whiteboard: String,
    pub version: String,
    pub cc: String,
    /// Base of the test analysis page, `{base}/{release}/analysis?test=...`
    pub analysis_base: String,
}

impl Default for BugTracker {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            classification: DEFAULT_CLASSIFICATION.to_string(),
            product: DEFAULT_PRODUCT.to_string(),
            whiteboard: DEFAULT_WHITEBOARD.to_string(),
            version: DEFAULT_VERSION.to_string(),
            cc: DEFAULT_CC.to_string(),
            analysis_base: DEFAULT_ANALYSIS_BASE.to_string(),
        }
    }
}

impl BugTracker {
    /// The endpoint must be an absolute URL
    pub fn validate(&self) -> Result<(), url::ParseError> {
        Url::parse(&self.endpoint).map(|_| ())
    }

    /// Evidence link for an item: its test grid URL, else the analysis page
    pub fn evidence_url(&self, item: &ResultItem, target_release: &str) -> String {
        match &item.test_grid_url {
            Some(url) => url.clone(),
            None => format!(
                "{}/{}/analysis?test={}",
                self.analysis_base.trim_end_matches('/'),
                target_release,
                encode_component(&item.name)
            ),
        }
    }

    /// Build a prefilled bug report for `item`
    ///
    /// # Example
    /// ```
    /// use compready::bugs::{BugTracker, ResultItem};
    ///
    /// let item = ResultItem::new("should create pod", -3);
    /// let draft = BugTracker::default().draft(&item, "4.16");
    /// assert_eq!(draft.title, "should create pod");
    /// assert!(draft.url.contains("short_desc=should%20create%20pod"));
    /// ```
    pub fn draft(&self, item: &ResultItem, target_release: &str) -> BugReportDraft {
        let title = item.name.clone();
        let evidence = self.evidence_url(item, target_release);
        let body = format!(
            "\n{title}\n\nis failing frequently in CI, see:\n{evidence}\n\n{JOB_PLACEHOLDER}\n\n{SNIPPET_PLACEHOLDER}\n"
        );

        let query = [
            ("classification", self.classification.as_str()),
            ("product", self.product.as_str()),
            ("cf_internal_whiteboard", self.whiteboard.as_str()),
            ("short_desc", title.as_str()),
            ("comment", body.as_str()),
            ("version", self.version.as_str()),
            ("cc", self.cc.as_str()),
        ]
        .iter()
        .map(|(key, value)| format!("{}={}", key, encode_component(value)))
        .collect::<Vec<_>>()
        .join("&");
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        let url = format!("{}{}{}", self.endpoint, separator, query);

        tracing::debug!(item = %item.name, release = target_release, "drafted bug report");

        BugReportDraft { title, body, url }
    }
}

/// Draft a bug report against the default tracker settings
pub fn draft_bug_report(item: &ResultItem, target_release: &str) -> BugReportDraft {
    BugTracker::default().draft(item, target_release)
}

/// Percent-encode one URI component with spaces as `%20`
///
/// `byte_serialize` escapes a literal `+` as `%2B`, so every `+` it emits
/// stands for a space.
fn encode_component(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn bugs(n: usize, prefix: &str) -> Vec<BugRef> {
        (0..n)
            .map(|i| BugRef::new(format!("{}-{}", prefix, i)))
            .collect()
    }

    fn item(name: &str, linked: usize, associated: usize) -> ResultItem {
        let mut item = ResultItem::new(name, -2);
        item.bugs = bugs(linked, "OCPBUGS");
        item.associated_bugs = bugs(associated, "ASSOC");
        item
    }

    fn query_of(url: &str) -> HashMap<String, String> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .into_owned()
            .collect()
    }

    #[test]
    fn test_triage_color_linked_takes_priority() {
        assert_eq!(triage_color(&item("a", 1, 3)), TriageColor::Linked);
        assert_eq!(triage_color(&item("b", 0, 3)), TriageColor::AssociatedOnly);
        assert_eq!(triage_color(&item("c", 0, 0)), TriageColor::None);
    }

    #[test]
    fn test_css_colors() {
        assert_eq!(TriageColor::Linked.css_color(), "black");
        assert_eq!(TriageColor::AssociatedOnly.css_color(), "darkred");
        assert_eq!(TriageColor::None.css_color(), "lightgray");
    }

    #[test]
    fn test_bug_weight() {
        assert_eq!(bug_weight(&bugs(1, "L"), &[]), 100);
        assert_eq!(bug_weight(&bugs(2, "L"), &bugs(3, "A")), 203);
        assert_eq!(bug_weight(&[], &[]), 0);
    }

    #[test]
    fn test_one_linked_outranks_fifty_associated() {
        let linked = item("linked", 1, 0);
        let associated = item("associated", 0, 50);

        assert_eq!(compare_bug_weight(&linked, &associated), 50);
        assert_eq!(compare_bug_weight(&associated, &linked), -50);
        assert_eq!(compare_bug_weight(&linked, &linked), 0);
    }

    #[test]
    fn test_rank_by_bug_weight_descending_and_stable() {
        let mut items = vec![
            item("none-1", 0, 0),
            item("assoc", 0, 50),
            item("none-2", 0, 0),
            item("linked", 1, 0),
        ];
        rank_by_bug_weight(&mut items);

        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["linked", "assoc", "none-1", "none-2"]);
    }

    #[test]
    fn test_draft_without_test_grid_url() {
        let item = ResultItem::new("should create pod", -3);
        let draft = draft_bug_report(&item, "4.16");

        assert_eq!(draft.title, "should create pod");
        assert!(draft.url.starts_with(DEFAULT_ENDPOINT));

        let query = query_of(&draft.url);
        assert_eq!(query["short_desc"], "should create pod");
        assert_eq!(query["classification"], "Red Hat");
        assert_eq!(query["product"], "OpenShift Container Platform");
        assert_eq!(query["cf_internal_whiteboard"], "trt");
        assert_eq!(query["version"], "4.9");
        assert_eq!(query["cc"], "sippy@dptools.openshift.org");

        let comment = &query["comment"];
        assert_eq!(comment, &draft.body);
        assert!(comment.contains(JOB_PLACEHOLDER));
        assert!(comment.contains(SNIPPET_PLACEHOLDER));
        assert!(comment.contains(
            "https://sippy.ci.openshift.org/sippy-ng/tests/4.16/analysis?test=should%20create%20pod"
        ));
    }

    #[test]
    fn test_draft_prefers_test_grid_url() {
        let mut item = ResultItem::new("[sig-network] pods should talk & listen", -2);
        item.test_grid_url = Some("https://testgrid.example/#dashboard".to_string());

        let draft = draft_bug_report(&item, "4.16");
        let query = query_of(&draft.url);

        assert_eq!(query["short_desc"], "[sig-network] pods should talk & listen");
        assert!(query["comment"].contains("https://testgrid.example/#dashboard"));
        assert!(!query["comment"].contains("/analysis?test="));
        // Raw '&' must not leak into the URL unencoded
        assert!(!draft.url.contains("talk & listen"));
    }

    #[test]
    fn test_draft_encodes_spaces_as_percent_20() {
        let item = ResultItem::new("a+b should create pod", -3);
        let draft = draft_bug_report(&item, "4.16");

        assert!(draft.url.contains("classification=Red%20Hat&"));
        assert!(draft.url.contains("short_desc=a%2Bb%20should%20create%20pod&"));
        assert!(!draft.url.contains('+'));
        assert!(!draft.url.contains(' '));
        assert_eq!(query_of(&draft.url)["short_desc"], "a+b should create pod");
    }

    #[test]
    fn test_encode_component_matches_uri_component_encoding() {
        assert_eq!(encode_component("should create pod"), "should%20create%20pod");
        assert_eq!(encode_component("1+1 = 2"), "1%2B1%20%3D%202");
        assert_eq!(encode_component("a&b/c"), "a%26b%2Fc");
    }

    #[test]
    fn test_validate_endpoint() {
        assert!(BugTracker::default().validate().is_ok());

        let tracker = BugTracker {
            endpoint: "enter_bug.cgi".to_string(),
            ..BugTracker::default()
        };
        assert!(tracker.validate().is_err());
    }

    #[test]
    fn test_endpoint_with_query_appends_fields() {
        let tracker = BugTracker {
            endpoint: "https://bugs.example/enter_bug.cgi?format=guided".to_string(),
            ..BugTracker::default()
        };
        let draft = tracker.draft(&ResultItem::new("t", -1), "4.16");
        assert!(draft
            .url
            .starts_with("https://bugs.example/enter_bug.cgi?format=guided&classification="));
        assert_eq!(query_of(&draft.url)["format"], "guided");
    }

    #[test]
    fn test_version_is_not_taken_from_release() {
        let item = ResultItem::new("t", -1);
        let query = query_of(&draft_bug_report(&item, "4.17").url);
        assert_eq!(query["version"], DEFAULT_VERSION);
    }

    #[test]
    fn test_result_item_from_backend_json() {
        let json = r#"{
            "name": "[sig-storage] volume mounts",
            "status": -3,
            "gray_factor": 0.8,
            "bugs": [{"key": "OCPBUGS-1", "url": "https://issues.example/OCPBUGS-1"}],
            "associated_bugs": []
        }"#;
        let item: ResultItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.status, -3);
        assert_eq!(item.gray_factor, Some(0.8));
        assert_eq!(item.bugs.len(), 1);
        assert!(item.test_grid_url.is_none());
        assert_eq!(triage_color(&item), TriageColor::Linked);
    }
}

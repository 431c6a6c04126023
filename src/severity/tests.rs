// Tests for configuration-driven severity classification
//
// Toyota Way Principle: Jidoka (Quality at the Source)
// - Invalid tables are rejected when loaded, never at classification time
// - Gray dampening changes the tier, never the label

use super::*;

fn percent_table() -> SeverityClassifier {
    let table = BreakpointTable::new(
        vec![
            Breakpoint::new(0, Tier::None, "No regression"),
            Breakpoint::new(10, Tier::Low, "Minor regression"),
            Breakpoint::new(40, Tier::Medium, "Regression"),
            Breakpoint::new(60, Tier::High, "Significant regression"),
            Breakpoint::new(80, Tier::Critical, "Extreme regression"),
        ],
        vec![
            Breakpoint::new(0, Tier::None, "No change"),
            Breakpoint::new(50, Tier::Low, "Improvement"),
        ],
    )
    .unwrap();
    SeverityClassifier::new(table, 0.3).unwrap()
}

#[test]
fn test_default_table_matches_status_codes() {
    let classifier = SeverityClassifier::default();

    let cases = [
        (-5, Tier::Critical, "ExtremeRegression detected ( >15% pass rate change)"),
        (-3, Tier::Critical, "ExtremeRegression detected ( >15% pass rate change)"),
        (-2, Tier::High, "SignificantRegression detected"),
        (-1, Tier::Low, "Missing Sample (sample data missing)"),
        (0, Tier::None, "NoSignificantDifference detected"),
        (1, Tier::Low, "Missing Basis (basis data missing)"),
        (
            2,
            Tier::Low,
            "Missing Basis And Sample (basis and sample data missing)",
        ),
        (
            3,
            Tier::Low,
            "SignificantImprovement detected (improved sample rate)",
        ),
    ];

    for (status, tier, label) in cases {
        let result = classifier.classify(status, None);
        assert_eq!(result.tier, tier, "status {}", status);
        assert_eq!(result.label, label, "status {}", status);
        assert!(!result.dampened);
    }
}

#[test]
fn test_sign_selects_family() {
    let classifier = percent_table();
    let regression = classifier.classify(-55, None);
    let improvement = classifier.classify(55, None);

    assert_eq!(regression.direction, Direction::Regression);
    assert_eq!(regression.label, "Regression");
    assert_eq!(improvement.direction, Direction::Improvement);
    assert_eq!(improvement.label, "Improvement");
}

#[test]
fn test_first_match_from_largest_magnitude() {
    let classifier = percent_table();
    assert_eq!(classifier.classify(-80, None).tier, Tier::Critical);
    assert_eq!(classifier.classify(-79, None).tier, Tier::High);
    assert_eq!(classifier.classify(-10, None).tier, Tier::Low);
    assert_eq!(classifier.classify(-9, None).tier, Tier::None);
}

#[test]
fn test_gray_factor_downgrades_one_tier() {
    let classifier = percent_table();
    let plain = classifier.classify(-90, None);
    let heavy = classifier.classify(-90, Some(0.9));

    assert_eq!(plain.tier, Tier::Critical);
    assert_eq!(heavy.tier, Tier::High);
    assert_eq!(heavy.label, plain.label);
    assert!(heavy.dampened);
}

#[test]
fn test_gray_factor_threshold_is_strict() {
    let classifier = percent_table();
    assert!(!classifier.classify(-90, Some(0.3)).dampened);
    assert!(classifier.classify(-90, Some(0.31)).dampened);
    assert!(!classifier.classify(-90, Some(f64::NAN)).dampened);
}

#[test]
fn test_gray_factor_never_below_lowest_tier() {
    let classifier = percent_table();
    let result = classifier.classify(-1, Some(1.0));
    assert_eq!(result.tier, Tier::None);
    assert_eq!(result.label, "No regression");
}

#[test]
fn test_classify_is_total() {
    let classifier = percent_table();
    for status in -100..=100 {
        let result = classifier.classify(status, None);
        assert!(!result.label.is_empty());
    }

    // Extremes of the representable range
    assert_eq!(classifier.classify(i64::MIN, None).tier, Tier::Critical);
    assert_eq!(classifier.classify(i64::MAX, None).tier, Tier::Low);
}

#[test]
fn test_status_text() {
    let classifier = SeverityClassifier::default();
    assert_eq!(
        classifier.classify(-2, None).status_text(),
        "-2: SignificantRegression detected"
    );
}

#[test]
fn test_invalid_gray_threshold() {
    assert_eq!(
        SeverityClassifier::new(BreakpointTable::default(), -0.1),
        Err(TableError::GrayThreshold(-0.1))
    );
    assert!(SeverityClassifier::new(BreakpointTable::default(), f64::INFINITY).is_err());
}

#[test]
fn test_load_from_toml() {
    let toml_str = r#"
gray_threshold = 0.25

[[regression]]
min_magnitude = 0
tier = "none"
label = "fine"

[[regression]]
min_magnitude = 2
tier = "high"
label = "bad"

[[improvement]]
min_magnitude = 0
tier = "none"
label = "fine"
"#;

    let classifier: SeverityClassifier = toml::from_str(toml_str).unwrap();
    assert_eq!(classifier.gray_threshold(), 0.25);
    assert_eq!(classifier.classify(-7, None).label, "bad");
    assert_eq!(classifier.classify(-7, Some(0.5)).tier, Tier::Medium);
}

#[test]
fn test_toml_without_catch_all_fails_to_load() {
    let toml_str = r#"
[[regression]]
min_magnitude = 1
tier = "high"
label = "bad"

[[improvement]]
min_magnitude = 0
tier = "none"
label = "fine"
"#;

    let err = toml::from_str::<SeverityClassifier>(toml_str).unwrap_err();
    assert!(err.to_string().contains("catch-all"));
}

#[test]
fn test_serialize_round_trip() {
    let classifier = percent_table();
    let text = toml::to_string(&classifier).unwrap();
    let reloaded: SeverityClassifier = toml::from_str(&text).unwrap();
    assert_eq!(reloaded, classifier);
}

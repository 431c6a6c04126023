//! compready - Component Readiness report configuration engine
//!
//! This library holds the non-visual logic behind a release-health comparison
//! dashboard: the report configuration state and its URL codec, the variant
//! catalog, severity classification of regression status codes, and bug
//! signals for triage.

pub mod bugs;
pub mod cli;
pub mod report;
pub mod settings;
pub mod severity;
pub mod variants;

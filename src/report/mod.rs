// Component Readiness report configuration
//
// A report compares a "sample" release window (or an in-flight pull request)
// against a "basis" release window, broken down by a user-chosen set of
// variant dimensions and filtered by statistical tolerances.
//
// - `config`: the mutable session state and its validating setters
// - `codec`: flat query-parameter encoding for shareable report URLs
// - `view`: named presets
// - `window`: release windows and pull request references
//
// The configuration is an explicit value: callers own it and pass it by
// reference. Setters take `&mut self`, so a multi-threaded host needs a
// single writer (e.g. a Mutex around the value).

pub mod codec;
mod config;
mod view;
mod window;

pub use codec::{ConfigurationCodec, DecodeError, QueryParams};
pub use config::{
    Bound, ConfigError, Limits, ReportConfiguration, DEFAULT_CONFIDENCE, DEFAULT_MIN_FAIL,
    DEFAULT_PITY,
};
pub use view::{find_view, ViewPreset};
pub use window::{PullRequest, ReleaseWindow, WindowRole};

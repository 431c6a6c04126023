// Severity classification for Component Readiness status codes
//
// The report backend returns a signed status per test or component:
// negative codes are regressions, zero and positive codes are neutral or
// improvements, and the magnitude grows with severity. This module turns a
// code into a label and a display tier using a configurable breakpoint table
// instead of hardcoded thresholds.
//
// Tables are validated once at construction (every family needs a catch-all
// row), so `classify` is total and never fails at call time.

mod classifier;
mod table;

pub use classifier::{Classification, SeverityClassifier, SeveritySettings, DEFAULT_GRAY_THRESHOLD};
pub use table::{Breakpoint, BreakpointTable, Direction, TableError, Tier};

#[cfg(test)]
mod tests;

//! Boundary check result and usage snapshot types.

use serde::{Deserialize, Serialize};

/// Snapshot of one calendar day's usage counters at check time.
///
/// The `day` key is an integer day index — whole days since the Unix epoch
/// in UTC — so day-boundary behavior never depends on string parsing or
/// local timezones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Days since the Unix epoch (UTC).
    pub day: i64,
    /// Trades recorded today.
    pub trades: u32,
    /// Content posts recorded today.
    pub posts: u32,
    /// Builds recorded today.
    pub builds: u32,
    /// Cumulative spend recorded today.
    pub spend: f64,
}

/// The outcome of checking one action against the configured boundaries.
///
/// Computed fresh on every call and never persisted standalone. Boundary
/// checks never fail: malformed or missing inputs surface as warning
/// strings, not errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryCheckResult {
    /// True iff `violations` is empty.
    pub passed: bool,

    /// Hard violations. Any entry blocks immediate execution.
    pub violations: Vec<String>,

    /// Soft, informational warnings. Never block execution.
    pub warnings: Vec<String>,

    /// Today's usage counters at the time of the check.
    pub usage: UsageSnapshot,
}

impl BoundaryCheckResult {
    /// Build a result from collected violations and warnings.
    pub fn new(violations: Vec<String>, warnings: Vec<String>, usage: UsageSnapshot) -> Self {
        Self {
            passed: violations.is_empty(),
            violations,
            warnings,
            usage,
        }
    }
}

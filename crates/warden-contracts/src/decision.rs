//! The authoritative decision record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    action::Action,
    risk::{Outcome, RiskAssessment},
};

/// Unique identifier for a routed decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecisionId(pub uuid::Uuid);

impl DecisionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for DecisionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DecisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The authoritative verdict for one routed action.
///
/// Created exactly once per routed action. `outcome` is always set to one
/// of the four `Outcome` values, and may later transition only from
/// `QueueApproval` to `AutoExecute` (approved) or `Reject` (rejected) via
/// an approval-queue call, which also stamps the reviewer fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub id: DecisionId,

    /// The action as submitted, embedded for a self-contained record.
    pub action: Action,

    /// The risk assessment the verdict was based on.
    pub assessment: RiskAssessment,

    /// The routed verdict.
    pub outcome: Outcome,

    /// Human-readable explanation of how the verdict was reached.
    pub reason: String,

    /// Mirrors `action.metadata.reversible`.
    pub rollback_available: bool,

    /// Wall-clock time (UTC) the router produced this decision.
    pub decided_at: DateTime<Utc>,

    /// Reviewer who resolved a queued decision, once resolved.
    pub approved_by: Option<String>,

    /// When the queued decision was resolved, once resolved.
    pub approved_at: Option<DateTime<Utc>>,
}

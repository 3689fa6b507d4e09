//! Audit ledger entry types.
//!
//! `AuditEntry` is a single record in the hash-chained ledger. Entries are
//! append-only and never edited in place; tampering with any stored field
//! is detected by chain verification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{action::ActionId, decision::DecisionId};

/// The closed set of lifecycle events the ledger records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    ActionReceived,
    RiskAssessed,
    DecisionMade,
    QueuedApproval,
    Approved,
    Rejected,
    Executed,
    ExecutionFailed,
    RolledBack,
    BoundaryViolation,
    Escalated,
}

impl AuditKind {
    /// Stable tag fed into the entry hash and written to exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActionReceived => "action_received",
            Self::RiskAssessed => "risk_assessed",
            Self::DecisionMade => "decision_made",
            Self::QueuedApproval => "queued_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Executed => "executed",
            Self::ExecutionFailed => "execution_failed",
            Self::RolledBack => "rolled_back",
            Self::BoundaryViolation => "boundary_violation",
            Self::Escalated => "escalated",
        }
    }
}

impl std::fmt::Display for AuditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable record in the hash-chained audit ledger.
///
/// Each entry commits to the previous entry via `prev_hash`. Modifying any
/// field — including the payload — invalidates `hash` and every subsequent
/// `prev_hash`, which integrity verification detects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry identifier.
    pub id: uuid::Uuid,

    /// Monotonically increasing position in the chain, starting at 0.
    pub sequence: u64,

    /// Wall-clock time (UTC) the entry was appended.
    pub timestamp: DateTime<Utc>,

    /// Which lifecycle event this entry records.
    pub kind: AuditKind,

    /// The action the event concerns.
    pub action_id: ActionId,

    /// The decision the event concerns, when one exists yet.
    pub decision_id: Option<DecisionId>,

    /// Arbitrary event payload (scores, violations, reviewer names, …).
    pub payload: serde_json::Value,

    /// SHA-256 hash (hex) of the previous entry, or the genesis sentinel
    /// for the first entry in the chain.
    pub prev_hash: String,

    /// SHA-256 hash (hex) of this entry's canonical content.
    pub hash: String,
}

impl AuditEntry {
    /// The sentinel `prev_hash` used for the first entry of every chain.
    ///
    /// 64 hex zeros — never the SHA-256 of real data, so genesis detection
    /// is unambiguous.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

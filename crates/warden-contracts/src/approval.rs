//! Approval request types: a decision awaiting human review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{action::Urgency, decision::Decision};

/// Unique identifier for an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub uuid::Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of an approval request.
///
/// `Pending` is the only live state; the other three are terminal, and a
/// request leaves the queue's pending set the moment it becomes terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

/// A decision held in the approval queue awaiting human review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: RequestId,

    /// The queued decision. Its `outcome` flips from `QueueApproval` to
    /// `AutoExecute` or `Reject` when this request is resolved.
    pub decision: Decision,

    /// Computed priority; higher sorts first. Derived from urgency, risk
    /// level, and estimated value at enqueue time.
    pub priority: f64,

    /// Copied from the action metadata for quick sorting and display.
    pub urgency: Urgency,

    /// When the request lapses if nobody reviews it. Expiration is the
    /// only cancellation mechanism — there is no explicit cancel call.
    pub expires_at: DateTime<Utc>,

    /// Channels and escalation markers already notified about this
    /// request. Makes repeated escalation sweeps idempotent.
    pub notified: Vec<String>,

    pub status: ApprovalStatus,

    pub created_at: DateTime<Utc>,

    /// Who resolved the request, once resolved.
    pub reviewer: Option<String>,

    /// When the request was resolved, once resolved.
    pub resolved_at: Option<DateTime<Utc>>,

    /// Reviewer feedback (approval note or rejection reason).
    pub feedback: Option<String>,
}

impl ApprovalRequest {
    /// Age of the request at `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }
}

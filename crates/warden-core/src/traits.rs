//! Core trait definitions for the governance pipeline.
//!
//! These four traits define the seams of the engine:
//!
//! - `RiskScorer`           — pure scoring (classification never blocks)
//! - `BoundaryGuard`        — policy limits over running usage counters
//! - `AuditSink`            — tamper-evident record of every transition
//! - `NotificationChannel`  — external delivery transport
//!
//! The router wires the first three together in a fixed order. Channel
//! implementations are external collaborators: the engine formats messages
//! and decides when to send; delivery may fail independently per channel.

use warden_contracts::{
    action::{Action, ActionId},
    audit::{AuditEntry, AuditKind},
    boundary::BoundaryCheckResult,
    decision::DecisionId,
    error::WardenResult,
    notify::NotificationMessage,
    risk::{RiskAssessment, RiskLevel},
};

/// A classifier that scores a single action.
///
/// Implementations must be **deterministic**: identical (action, config)
/// always yields an identical score and level, across repeated calls. They
/// must also be pure — no I/O, no mutation — so `route()` never blocks on
/// classification.
pub trait RiskScorer: Send + Sync {
    /// Score `action` across the configured risk factors.
    fn classify(&self, action: &Action) -> RiskAssessment;
}

/// Enforces configured policy limits against running usage counters.
///
/// `check` never fails and never blocks: malformed or missing action
/// telemetry surfaces as warning strings inside the result.
pub trait BoundaryGuard: Send + Sync {
    /// Check `action` against every applicable limit.
    fn check(&self, action: &Action, level: RiskLevel) -> BoundaryCheckResult;

    /// Record one executed action in today's usage counters.
    ///
    /// The only mutator of usage state. Called exactly once per executed
    /// action — after a successful auto-execute or an approved review.
    fn record_usage(&self, action: &Action);
}

/// The tamper-evident ledger every lifecycle transition is mirrored into.
///
/// A failed append is fatal to the caller: a transition that cannot be
/// audited cannot proceed.
pub trait AuditSink: Send + Sync {
    /// Append one entry to the ledger and return it as written.
    fn log(
        &self,
        kind: AuditKind,
        action_id: ActionId,
        decision_id: Option<DecisionId>,
        payload: serde_json::Value,
    ) -> WardenResult<AuditEntry>;
}

/// One delivery transport (webhook, chat API, terminal, …).
///
/// Implementations are external collaborators. A failed `deliver` is
/// isolated by the notification manager: it is logged and does not prevent
/// delivery attempts on the remaining channels.
pub trait NotificationChannel: Send + Sync {
    /// Stable channel name, matched against the configured channel list.
    fn name(&self) -> &str;

    /// Deliver one formatted message.
    fn deliver(&self, message: &NotificationMessage) -> WardenResult<()>;
}

//! The decision router: the single entry point that turns a proposed
//! action into a final verdict.
//!
//! The router enforces the governance pipeline:
//!
//!   Action → RiskScorer → BoundaryGuard → outcome → Decision → Audit
//!
//! `route()` is synchronous and always returns a final outcome — there is
//! no suspension while waiting for human review. A queued decision is
//! resolved later, asynchronously, through the approval queue; the router
//! never blocks on it.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};

use warden_contracts::{
    action::{Action, ActionCategory},
    audit::AuditKind,
    boundary::BoundaryCheckResult,
    config::AutonomyLevel,
    decision::{Decision, DecisionId},
    error::WardenResult,
    risk::{Outcome, RiskAssessment, RiskLevel},
};

use crate::{
    events::{EventDispatcher, GovernanceEvent},
    traits::{AuditSink, BoundaryGuard, RiskScorer},
};

/// Violation substrings that mark a hard numeric or irreversibility limit.
/// Such failures queue for review instead of rejecting outright.
const REVIEWABLE_MARKERS: [&str; 3] = ["exceeds", "limit", "irreversible"];

/// The central router. Construct one per configured autonomy level and
/// share it for the lifetime of the process.
pub struct DecisionRouter {
    classifier: Box<dyn RiskScorer>,
    boundaries: Box<dyn BoundaryGuard>,
    audit: Arc<dyn AuditSink>,
    events: EventDispatcher,
    autonomy: AutonomyLevel,
}

impl DecisionRouter {
    pub fn new(
        classifier: Box<dyn RiskScorer>,
        boundaries: Box<dyn BoundaryGuard>,
        audit: Arc<dyn AuditSink>,
        events: EventDispatcher,
        autonomy: AutonomyLevel,
    ) -> Self {
        Self {
            classifier,
            boundaries,
            audit,
            events,
            autonomy,
        }
    }

    /// Route one proposed action to a final verdict.
    ///
    /// # Pipeline
    ///
    /// 1. Audit `action_received`.
    /// 2. Classify via the risk scorer; audit `risk_assessed`.
    /// 3. Check boundaries; on failure audit `boundary_violation` and emit
    ///    `boundary:violation`.
    /// 4. Determine the outcome (see `decide`) and build the `Decision`.
    /// 5. Audit `decision_made`; emit `decision:made` plus the
    ///    outcome-specific event.
    ///
    /// # Errors
    ///
    /// Only audit-append failures propagate. Boundary violations and risk
    /// escalations are verdicts, not errors.
    pub fn route(&self, action: &Action) -> WardenResult<Decision> {
        debug!(
            action_id = %action.id,
            kind = %action.kind,
            category = %action.category,
            "routing action"
        );

        self.audit.log(
            AuditKind::ActionReceived,
            action.id,
            None,
            json!({ "kind": action.kind, "engine": action.engine, "category": action.category }),
        )?;

        // ── Classification ───────────────────────────────────────────────────
        let assessment = self.classifier.classify(action);

        self.audit.log(
            AuditKind::RiskAssessed,
            action.id,
            None,
            json!({
                "score": assessment.score,
                "level": assessment.level,
                "recommendation": assessment.recommendation,
            }),
        )?;

        // ── Boundary check ───────────────────────────────────────────────────
        let check = self.boundaries.check(action, assessment.level);

        if !check.passed {
            warn!(
                action_id = %action.id,
                violations = check.violations.len(),
                "boundary check failed"
            );

            self.audit.log(
                AuditKind::BoundaryViolation,
                action.id,
                None,
                json!({ "violations": check.violations, "warnings": check.warnings }),
            )?;

            self.events.emit(&GovernanceEvent::BoundaryViolation {
                action_id: action.id,
                violations: check.violations.clone(),
            });
        }

        // ── Outcome ──────────────────────────────────────────────────────────
        let (outcome, reason) = self.decide(action, &assessment, &check);

        let decision = Decision {
            id: DecisionId::new(),
            action: action.clone(),
            assessment,
            outcome,
            reason,
            rollback_available: action.metadata.reversible,
            decided_at: Utc::now(),
            approved_by: None,
            approved_at: None,
        };

        self.audit.log(
            AuditKind::DecisionMade,
            action.id,
            Some(decision.id),
            json!({ "outcome": decision.outcome, "reason": decision.reason }),
        )?;

        info!(
            action_id = %action.id,
            decision_id = %decision.id,
            outcome = %decision.outcome,
            "decision made"
        );

        self.events.emit(&GovernanceEvent::DecisionMade(decision.clone()));
        self.events.emit(&match decision.outcome {
            Outcome::AutoExecute => GovernanceEvent::DecisionAutoExecute(decision.clone()),
            Outcome::QueueApproval => GovernanceEvent::DecisionQueued(decision.clone()),
            Outcome::Escalate => GovernanceEvent::DecisionEscalated(decision.clone()),
            Outcome::Reject => GovernanceEvent::DecisionRejected(decision.clone()),
        });

        Ok(decision)
    }

    /// The outcome table.
    ///
    /// Ordering is deliberate: a production-deployment block always
    /// escalates; a critical risk level escalates next (so full autonomy
    /// still escalates critical actions regardless of boundary results);
    /// then boundary failures route to review or rejection; and only then
    /// does the autonomy table apply.
    fn decide(
        &self,
        action: &Action,
        assessment: &RiskAssessment,
        check: &BoundaryCheckResult,
    ) -> (Outcome, String) {
        if let Some(violation) = check
            .violations
            .iter()
            .find(|v| v.to_lowercase().contains("production"))
        {
            return (Outcome::Escalate, violation.clone());
        }

        if assessment.level == RiskLevel::Critical && self.autonomy >= AutonomyLevel::Bounded {
            return (
                Outcome::Escalate,
                format!(
                    "critical risk (score {:.0}) requires human escalation",
                    assessment.score
                ),
            );
        }

        if !check.passed {
            let reviewable = check.violations.iter().any(|v| {
                let v = v.to_lowercase();
                REVIEWABLE_MARKERS.iter().any(|m| v.contains(m))
            });
            let first = check
                .violations
                .first()
                .cloned()
                .unwrap_or_else(|| "boundary violation".to_string());

            return if reviewable {
                (Outcome::QueueApproval, first)
            } else {
                (Outcome::Reject, first)
            };
        }

        match self.autonomy {
            AutonomyLevel::Manual => (
                Outcome::QueueApproval,
                "manual mode: every action requires approval".to_string(),
            ),

            AutonomyLevel::Bounded => match assessment.level {
                RiskLevel::Safe | RiskLevel::Low => {
                    if action.category == ActionCategory::Trading && !is_scheduled_trade(action) {
                        (
                            Outcome::QueueApproval,
                            "bounded autonomy: unscheduled trades require approval".to_string(),
                        )
                    } else {
                        (
                            Outcome::AutoExecute,
                            format!("{} risk within bounded autonomy", assessment.level),
                        )
                    }
                }
                RiskLevel::Medium | RiskLevel::High => (
                    Outcome::QueueApproval,
                    format!("{} risk requires approval at bounded autonomy", assessment.level),
                ),
                RiskLevel::Critical => (
                    Outcome::Escalate,
                    "critical risk requires human escalation".to_string(),
                ),
            },

            AutonomyLevel::Supervised => match assessment.level {
                RiskLevel::Safe | RiskLevel::Low | RiskLevel::Medium => (
                    Outcome::AutoExecute,
                    format!("{} risk within supervised autonomy", assessment.level),
                ),
                RiskLevel::High => (
                    Outcome::QueueApproval,
                    "high risk requires approval at supervised autonomy".to_string(),
                ),
                RiskLevel::Critical => (
                    Outcome::Escalate,
                    "critical risk requires human escalation".to_string(),
                ),
            },

            AutonomyLevel::Full => match assessment.level {
                RiskLevel::Critical => (
                    Outcome::Escalate,
                    "critical risk requires human escalation".to_string(),
                ),
                level => (
                    Outcome::AutoExecute,
                    format!("{} risk within full autonomy", level),
                ),
            },
        }
    }

    /// Record a successful execution.
    ///
    /// Called by the executor after a successful auto-execute or an
    /// approved action. Forwards to the boundary guard's usage counters —
    /// exactly once per executed action.
    pub fn record_execution(&self, action: &Action) -> WardenResult<()> {
        self.boundaries.record_usage(action);
        self.audit.log(
            AuditKind::Executed,
            action.id,
            None,
            json!({ "kind": action.kind, "value": action.metadata.estimated_value }),
        )?;
        Ok(())
    }

    /// Record a failed execution attempt. Usage counters are untouched.
    pub fn record_execution_failure(
        &self,
        action: &Action,
        error: impl Into<String>,
    ) -> WardenResult<()> {
        self.audit.log(
            AuditKind::ExecutionFailed,
            action.id,
            None,
            json!({ "error": error.into() }),
        )?;
        Ok(())
    }

    /// Record that an executed action was rolled back.
    pub fn record_rollback(&self, action: &Action, reason: impl Into<String>) -> WardenResult<()> {
        self.audit.log(
            AuditKind::RolledBack,
            action.id,
            None,
            json!({ "reason": reason.into() }),
        )?;
        Ok(())
    }

    /// The dispatcher this router emits through, for wiring subscribers.
    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }
}

/// Bounded autonomy lets pre-planned trades through: a trade is considered
/// scheduled when its params say so or its kind marks a DCA strategy.
fn is_scheduled_trade(action: &Action) -> bool {
    action
        .params
        .get("scheduled")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
        || action.kind.to_lowercase().contains("dca")
}

// ── Tests ────────────────────────────────────────────────────────────────────

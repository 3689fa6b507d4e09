//! The bounded, priority-ordered approval queue.
//!
//! Holds decisions awaiting human review. One `Mutex` guards the pending
//! set, so the synchronous add/approve/reject path and the periodic sweep
//! serialize on it — a sweep-triggered eviction can never race a
//! concurrent approval of the same request into a lost update.
//!
//! Resolving an unknown id returns `None` with a logged warning. That is a
//! normal race with background expiration, not an error.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::{info, warn};

use warden_contracts::{
    action::Urgency,
    approval::{ApprovalRequest, ApprovalStatus, RequestId},
    audit::AuditKind,
    config::QueueConfig,
    decision::Decision,
    error::WardenResult,
    risk::{Outcome, RiskLevel},
};
use warden_core::{
    events::{EventDispatcher, GovernanceEvent},
    traits::AuditSink,
};

/// Marker pushed onto a request's notified list when it is escalated, so
/// repeated sweeps escalate each request at most once.
const ESCALATED_MARKER: &str = "escalated";

/// What one sweep did.
#[derive(Debug, Default, Clone)]
pub struct SweepReport {
    pub expired: Vec<RequestId>,
    pub escalated: Vec<RequestId>,
    pub auto_rejected: Vec<RequestId>,
}

/// Bounded priority collection of pending approval requests.
pub struct ApprovalQueue {
    config: QueueConfig,
    audit: Arc<dyn AuditSink>,
    events: EventDispatcher,
    pending: Mutex<HashMap<RequestId, ApprovalRequest>>,
}

impl ApprovalQueue {
    pub fn new(config: QueueConfig, audit: Arc<dyn AuditSink>, events: EventDispatcher) -> Self {
        Self {
            config,
            audit,
            events,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Enqueue a decision for review at an explicit clock reading.
    ///
    /// Priority is `urgency·10 + risk weight + min(value/10, 10)`. If the
    /// insert pushes the queue past capacity, the lowest-priority pending
    /// request — possibly the incoming one — is evicted and marked
    /// expired.
    pub fn add_at(&self, decision: Decision, now: DateTime<Utc>) -> WardenResult<ApprovalRequest> {
        let priority = compute_priority(&decision);
        let request = ApprovalRequest {
            id: RequestId::new(),
            urgency: decision.action.metadata.urgency,
            expires_at: now + Duration::hours(self.config.expires_after_hours),
            notified: Vec::new(),
            status: ApprovalStatus::Pending,
            created_at: now,
            reviewer: None,
            resolved_at: None,
            feedback: None,
            priority,
            decision,
        };

        self.audit.log(
            AuditKind::QueuedApproval,
            request.decision.action.id,
            Some(request.decision.id),
            json!({ "request_id": request.id, "priority": priority }),
        )?;

        let evicted = {
            let mut pending = self.pending.lock().expect("approval queue lock poisoned");
            pending.insert(request.id, request.clone());

            let mut evicted = Vec::new();
            while pending.len() > self.config.max_pending {
                // Lowest priority goes first; ties evict the oldest.
                let victim_id = pending
                    .values()
                    .min_by(|a, b| {
                        a.priority
                            .partial_cmp(&b.priority)
                            .unwrap_or(std::cmp::Ordering::Equal)
                            .then(a.created_at.cmp(&b.created_at))
                    })
                    .map(|r| r.id)
                    .expect("queue over capacity implies at least one entry");

                let mut victim = pending
                    .remove(&victim_id)
                    .expect("victim id taken from the same map");
                victim.status = ApprovalStatus::Expired;
                victim.resolved_at = Some(now);
                evicted.push(victim);
            }
            evicted
        };

        info!(
            request_id = %request.id,
            priority = priority,
            "approval request queued"
        );
        self.events.emit(&GovernanceEvent::ItemAdded(request.clone()));

        for victim in evicted {
            warn!(
                request_id = %victim.id,
                priority = victim.priority,
                "approval request evicted at capacity"
            );
            self.audit.log(
                AuditKind::Rejected,
                victim.decision.action.id,
                Some(victim.decision.id),
                json!({ "request_id": victim.id, "reason": "evicted: queue at capacity" }),
            )?;
            self.events.emit(&GovernanceEvent::ItemExpired(victim));
        }

        self.emit_queue_changed();

        Ok(request)
    }

    /// Approve a pending request.
    ///
    /// Flips the embedded decision's outcome to `AutoExecute` and stamps
    /// the reviewer fields. Returns `Ok(None)` when the id is absent — the
    /// request may have just expired, which callers must treat as an
    /// expected race.
    pub fn approve_at(
        &self,
        id: RequestId,
        reviewer: &str,
        feedback: Option<String>,
        now: DateTime<Utc>,
    ) -> WardenResult<Option<ApprovalRequest>> {
        let Some(mut request) = self.take(id) else {
            warn!(request_id = %id, "approve: request not found (already resolved or expired)");
            return Ok(None);
        };

        request.status = ApprovalStatus::Approved;
        request.reviewer = Some(reviewer.to_string());
        request.resolved_at = Some(now);
        request.feedback = feedback;
        request.decision.outcome = Outcome::AutoExecute;
        request.decision.approved_by = Some(reviewer.to_string());
        request.decision.approved_at = Some(now);

        self.audit.log(
            AuditKind::Approved,
            request.decision.action.id,
            Some(request.decision.id),
            json!({ "request_id": request.id, "reviewer": reviewer }),
        )?;

        info!(request_id = %id, reviewer = reviewer, "approval request approved");
        self.events.emit(&GovernanceEvent::ItemApproved(request.clone()));
        self.emit_queue_changed();

        Ok(Some(request))
    }

    /// Reject a pending request. Same race semantics as `approve_at`.
    pub fn reject_at(
        &self,
        id: RequestId,
        reason: &str,
        reviewer: &str,
        now: DateTime<Utc>,
    ) -> WardenResult<Option<ApprovalRequest>> {
        let Some(mut request) = self.take(id) else {
            warn!(request_id = %id, "reject: request not found (already resolved or expired)");
            return Ok(None);
        };

        request.status = ApprovalStatus::Rejected;
        request.reviewer = Some(reviewer.to_string());
        request.resolved_at = Some(now);
        request.feedback = Some(reason.to_string());
        request.decision.outcome = Outcome::Reject;
        request.decision.approved_by = Some(reviewer.to_string());
        request.decision.approved_at = Some(now);

        self.audit.log(
            AuditKind::Rejected,
            request.decision.action.id,
            Some(request.decision.id),
            json!({ "request_id": request.id, "reviewer": reviewer, "reason": reason }),
        )?;

        info!(request_id = %id, reviewer = reviewer, "approval request rejected");
        self.events.emit(&GovernanceEvent::ItemRejected(request.clone()));
        self.emit_queue_changed();

        Ok(Some(request))
    }

    /// The periodic maintenance pass, intended for an hourly cadence.
    ///
    /// In order: expire requests past `expires_at`; escalate requests past
    /// the escalation age (or at critical risk), at most once each; then
    /// auto-reject requests past the longer auto-reject age.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> WardenResult<SweepReport> {
        let mut report = SweepReport::default();

        // ── Expiration ───────────────────────────────────────────────────────
        let expired: Vec<ApprovalRequest> = {
            let mut pending = self.pending.lock().expect("approval queue lock poisoned");
            let ids: Vec<RequestId> = pending
                .values()
                .filter(|r| r.expires_at <= now)
                .map(|r| r.id)
                .collect();
            ids.iter()
                .filter_map(|id| pending.remove(id))
                .map(|mut r| {
                    r.status = ApprovalStatus::Expired;
                    r.resolved_at = Some(now);
                    r
                })
                .collect()
        };

        for request in expired {
            info!(request_id = %request.id, "approval request expired unreviewed");
            self.audit.log(
                AuditKind::Rejected,
                request.decision.action.id,
                Some(request.decision.id),
                json!({ "request_id": request.id, "reason": "expired unreviewed" }),
            )?;
            report.expired.push(request.id);
            self.events.emit(&GovernanceEvent::ItemExpired(request));
        }

        // ── Escalation ───────────────────────────────────────────────────────
        let escalation_age = Duration::hours(self.config.escalate_after_hours);
        let to_escalate: Vec<ApprovalRequest> = {
            let mut pending = self.pending.lock().expect("approval queue lock poisoned");
            let ids: Vec<RequestId> = pending
                .values()
                .filter(|r| {
                    let overdue = r.age(now) > escalation_age
                        || r.decision.assessment.level == RiskLevel::Critical;
                    overdue && !r.notified.iter().any(|n| n == ESCALATED_MARKER)
                })
                .map(|r| r.id)
                .collect();

            ids.iter()
                .filter_map(|id| {
                    let request = pending.get_mut(id)?;
                    request.notified.push(ESCALATED_MARKER.to_string());
                    Some(request.clone())
                })
                .collect()
        };

        for request in to_escalate {
            info!(request_id = %request.id, "approval request escalated");
            self.audit.log(
                AuditKind::Escalated,
                request.decision.action.id,
                Some(request.decision.id),
                json!({ "request_id": request.id, "age_hours": request.age(now).num_hours() }),
            )?;
            report.escalated.push(request.id);
            self.events.emit(&GovernanceEvent::ItemEscalated(request));
        }

        // ── Auto-rejection ───────────────────────────────────────────────────
        let reject_age = Duration::hours(self.config.auto_reject_after_hours);
        let stale: Vec<RequestId> = {
            let pending = self.pending.lock().expect("approval queue lock poisoned");
            pending
                .values()
                .filter(|r| r.age(now) > reject_age)
                .map(|r| r.id)
                .collect()
        };

        for id in stale {
            let reason = format!(
                "auto-rejected after {} hours without review",
                self.config.auto_reject_after_hours
            );
            if self.reject_at(id, &reason, "system", now)?.is_some() {
                report.auto_rejected.push(id);
            }
        }

        if !report.expired.is_empty() {
            self.emit_queue_changed();
        }

        Ok(report)
    }

    /// Enqueue a decision for review now.
    pub fn add(&self, decision: Decision) -> WardenResult<ApprovalRequest> {
        self.add_at(decision, Utc::now())
    }

    /// Approve a pending request now.
    pub fn approve(
        &self,
        id: RequestId,
        reviewer: &str,
        feedback: Option<String>,
    ) -> WardenResult<Option<ApprovalRequest>> {
        self.approve_at(id, reviewer, feedback, Utc::now())
    }

    /// Reject a pending request now.
    pub fn reject(
        &self,
        id: RequestId,
        reason: &str,
        reviewer: &str,
    ) -> WardenResult<Option<ApprovalRequest>> {
        self.reject_at(id, reason, reviewer, Utc::now())
    }

    /// Run the maintenance pass now.
    pub fn sweep(&self) -> WardenResult<SweepReport> {
        self.sweep_at(Utc::now())
    }

    /// Pending requests sorted by descending priority.
    pub fn pending(&self) -> Vec<ApprovalRequest> {
        let pending = self.pending.lock().expect("approval queue lock poisoned");
        let mut requests: Vec<ApprovalRequest> = pending.values().cloned().collect();
        requests.sort_by(|a, b| {
            b.priority
                .partial_cmp(&a.priority)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.created_at.cmp(&b.created_at))
        });
        requests
    }

    pub fn get(&self, id: RequestId) -> Option<ApprovalRequest> {
        let pending = self.pending.lock().expect("approval queue lock poisoned");
        pending.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        let pending = self.pending.lock().expect("approval queue lock poisoned");
        pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take(&self, id: RequestId) -> Option<ApprovalRequest> {
        let mut pending = self.pending.lock().expect("approval queue lock poisoned");
        pending.remove(&id)
    }

    fn emit_queue_changed(&self) {
        self.events.emit(&GovernanceEvent::QueueChanged { pending: self.len() });
    }
}

/// `urgency weight · 10 + risk weight + min(value / 10, 10)`.
fn compute_priority(decision: &Decision) -> f64 {
    let urgency_weight = match decision.action.metadata.urgency {
        Urgency::Low => 1.0,
        Urgency::Normal => 2.0,
        Urgency::High => 3.0,
        Urgency::Critical => 4.0,
    };
    let risk_weight = match decision.assessment.level {
        RiskLevel::Safe => 0.0,
        RiskLevel::Low => 2.0,
        RiskLevel::Medium => 4.0,
        RiskLevel::High => 6.0,
        RiskLevel::Critical => 8.0,
    };
    let value_weight = decision
        .action
        .metadata
        .estimated_value
        .map(|v| (v / 10.0).min(10.0))
        .unwrap_or(0.0);

    urgency_weight * 10.0 + risk_weight + value_weight
}

// ── Tests ────────────────────────────────────────────────────────────────────

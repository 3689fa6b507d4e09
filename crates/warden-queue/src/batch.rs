//! Bulk query and review operations over the approval queue.
//!
//! Read-mostly aggregation (`summary`, `filter`) plus bulk mutation
//! (`approve_matching`, `reject_matching`) with per-item success/failure
//! reporting — an id that expires mid-batch is a reported failure, not an
//! error.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use warden_contracts::{
    action::ActionCategory,
    approval::{ApprovalRequest, RequestId},
    error::WardenResult,
    risk::RiskLevel,
};

use crate::queue::ApprovalQueue;

/// Criteria for selecting pending requests. Unset fields match anything.
#[derive(Debug, Default, Clone)]
pub struct ApprovalFilter {
    pub category: Option<ActionCategory>,
    pub level: Option<RiskLevel>,
    pub engine: Option<String>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub min_age_hours: Option<i64>,
}

impl ApprovalFilter {
    fn matches(&self, request: &ApprovalRequest, now: DateTime<Utc>) -> bool {
        let decision = &request.decision;

        if let Some(category) = self.category {
            if decision.action.category != category {
                return false;
            }
        }
        if let Some(level) = self.level {
            if decision.assessment.level != level {
                return false;
            }
        }
        if let Some(engine) = &self.engine {
            if &decision.action.engine != engine {
                return false;
            }
        }
        if let Some(min) = self.min_score {
            if decision.assessment.score < min {
                return false;
            }
        }
        if let Some(max) = self.max_score {
            if decision.assessment.score > max {
                return false;
            }
        }
        if let Some(hours) = self.min_age_hours {
            if request.age(now) < Duration::hours(hours) {
                return false;
            }
        }

        true
    }
}

/// Aggregate view of the pending queue.
#[derive(Debug, Clone, Default)]
pub struct QueueSummary {
    pub total: usize,
    pub by_category: HashMap<ActionCategory, usize>,
    pub by_level: HashMap<RiskLevel, usize>,
    pub by_engine: HashMap<String, usize>,
    pub total_value: f64,
    pub average_score: f64,
    /// Age of the oldest pending request, when any are pending.
    pub oldest_age: Option<Duration>,
}

/// Per-item outcome of one bulk operation.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Requests the operation resolved.
    pub resolved: Vec<RequestId>,
    /// Requests that vanished mid-batch (resolved or expired concurrently).
    pub missed: Vec<RequestId>,
}

/// The bulk review layer. Cheap to construct; holds only a queue handle.
pub struct BatchApproval {
    queue: Arc<ApprovalQueue>,
}

impl BatchApproval {
    pub fn new(queue: Arc<ApprovalQueue>) -> Self {
        Self { queue }
    }

    /// Aggregate counts, value, and age over the pending set.
    pub fn summary_at(&self, now: DateTime<Utc>) -> QueueSummary {
        let pending = self.queue.pending();

        let mut summary = QueueSummary {
            total: pending.len(),
            ..QueueSummary::default()
        };

        let mut score_sum = 0.0;
        for request in &pending {
            let decision = &request.decision;
            *summary.by_category.entry(decision.action.category).or_default() += 1;
            *summary.by_level.entry(decision.assessment.level).or_default() += 1;
            *summary.by_engine.entry(decision.action.engine.clone()).or_default() += 1;
            summary.total_value += decision.action.metadata.estimated_value.unwrap_or(0.0);
            score_sum += decision.assessment.score;
        }

        if !pending.is_empty() {
            summary.average_score = score_sum / pending.len() as f64;
            summary.oldest_age = pending.iter().map(|r| r.age(now)).max();
        }

        summary
    }

    /// Pending requests matching `filter`, in priority order.
    pub fn filter_at(&self, filter: &ApprovalFilter, now: DateTime<Utc>) -> Vec<ApprovalRequest> {
        self.queue
            .pending()
            .into_iter()
            .filter(|r| filter.matches(r, now))
            .collect()
    }

    /// Approve every pending request matching `filter`.
    pub fn approve_matching_at(
        &self,
        filter: &ApprovalFilter,
        reviewer: &str,
        now: DateTime<Utc>,
    ) -> WardenResult<BatchOutcome> {
        let matched = self.filter_at(filter, now);
        let mut outcome = BatchOutcome::default();

        for request in matched {
            match self.queue.approve_at(request.id, reviewer, None, now)? {
                Some(_) => outcome.resolved.push(request.id),
                None => outcome.missed.push(request.id),
            }
        }

        info!(
            resolved = outcome.resolved.len(),
            missed = outcome.missed.len(),
            reviewer = reviewer,
            "batch approval applied"
        );
        Ok(outcome)
    }

    /// Reject every pending request matching `filter`.
    pub fn reject_matching_at(
        &self,
        filter: &ApprovalFilter,
        reason: &str,
        reviewer: &str,
        now: DateTime<Utc>,
    ) -> WardenResult<BatchOutcome> {
        let matched = self.filter_at(filter, now);
        let mut outcome = BatchOutcome::default();

        for request in matched {
            match self.queue.reject_at(request.id, reason, reviewer, now)? {
                Some(_) => outcome.resolved.push(request.id),
                None => outcome.missed.push(request.id),
            }
        }

        info!(
            resolved = outcome.resolved.len(),
            missed = outcome.missed.len(),
            reviewer = reviewer,
            "batch rejection applied"
        );
        Ok(outcome)
    }

    /// Preset: approve everything assessed safe or low risk.
    pub fn approve_all_safe_at(
        &self,
        reviewer: &str,
        now: DateTime<Utc>,
    ) -> WardenResult<BatchOutcome> {
        let matched: Vec<ApprovalRequest> = self
            .queue
            .pending()
            .into_iter()
            .filter(|r| r.decision.assessment.level <= RiskLevel::Low)
            .collect();

        let mut outcome = BatchOutcome::default();
        for request in matched {
            match self.queue.approve_at(request.id, reviewer, None, now)? {
                Some(_) => outcome.resolved.push(request.id),
                None => outcome.missed.push(request.id),
            }
        }
        Ok(outcome)
    }

    /// Aggregate counts, value, and age over the pending set, now.
    pub fn summary(&self) -> QueueSummary {
        self.summary_at(Utc::now())
    }

    /// Pending requests matching `filter`, now.
    pub fn filter(&self, filter: &ApprovalFilter) -> Vec<ApprovalRequest> {
        self.filter_at(filter, Utc::now())
    }

    /// Approve every matching pending request, now.
    pub fn approve_matching(
        &self,
        filter: &ApprovalFilter,
        reviewer: &str,
    ) -> WardenResult<BatchOutcome> {
        self.approve_matching_at(filter, reviewer, Utc::now())
    }

    /// Reject every matching pending request, now.
    pub fn reject_matching(
        &self,
        filter: &ApprovalFilter,
        reason: &str,
        reviewer: &str,
    ) -> WardenResult<BatchOutcome> {
        self.reject_matching_at(filter, reason, reviewer, Utc::now())
    }

    /// Preset: approve everything assessed safe or low risk, now.
    pub fn approve_all_safe(&self, reviewer: &str) -> WardenResult<BatchOutcome> {
        self.approve_all_safe_at(reviewer, Utc::now())
    }

    /// Preset: reject everything older than `hours`, now.
    pub fn reject_older_than(
        &self,
        hours: i64,
        reason: &str,
        reviewer: &str,
    ) -> WardenResult<BatchOutcome> {
        self.reject_older_than_at(hours, reason, reviewer, Utc::now())
    }

    /// Preset: reject everything older than `hours`.
    pub fn reject_older_than_at(
        &self,
        hours: i64,
        reason: &str,
        reviewer: &str,
        now: DateTime<Utc>,
    ) -> WardenResult<BatchOutcome> {
        let filter = ApprovalFilter {
            min_age_hours: Some(hours),
            ..ApprovalFilter::default()
        };
        self.reject_matching_at(&filter, reason, reviewer, now)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

//! Single-action risk classification.
//!
//! Five independent factors — financial impact, reversibility, category,
//! urgency, visibility — each scored 0–100, weighted, and summed into one
//! score that the configured boundaries map onto the risk ladder.
//!
//! Classification is pure and deterministic: identical (action, config)
//! always yields an identical assessment, so results are cacheable.

use chrono::Utc;
use tracing::debug;

use warden_contracts::{
    action::{Action, ActionCategory, Urgency},
    config::{LevelBoundaries, RiskConfig},
    risk::{Outcome, RiskAssessment, RiskFactor, RiskLevel},
};
use warden_core::traits::RiskScorer;

/// Map a 0–100 score onto the risk ladder via the four ascending
/// boundaries. Shared by the action and pipeline classifiers.
pub(crate) fn level_for(score: f64, boundaries: &LevelBoundaries) -> RiskLevel {
    if score < boundaries.low {
        RiskLevel::Safe
    } else if score < boundaries.medium {
        RiskLevel::Low
    } else if score < boundaries.high {
        RiskLevel::Medium
    } else if score < boundaries.critical {
        RiskLevel::High
    } else {
        RiskLevel::Critical
    }
}

/// The default recommendation for a computed level, before allow/deny
/// lists are considered.
pub(crate) fn default_recommendation(level: RiskLevel) -> Outcome {
    match level {
        RiskLevel::Safe | RiskLevel::Low => Outcome::AutoExecute,
        RiskLevel::Medium | RiskLevel::High => Outcome::QueueApproval,
        RiskLevel::Critical => Outcome::Escalate,
    }
}

/// The weighted multi-factor classifier for single actions.
pub struct RiskClassifier {
    config: RiskConfig,
}

impl RiskClassifier {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    // ── Factors ──────────────────────────────────────────────────────────────

    /// Bucket estimated value against the four configured thresholds.
    /// A missing value is neutral, never a failure.
    fn financial_factor(&self, action: &Action) -> RiskFactor {
        let thresholds = &self.config.financial;
        let weight = self.config.weights.financial;

        let Some(value) = action.metadata.estimated_value else {
            return RiskFactor {
                name: "financial".to_string(),
                weight,
                score: 5.0,
                threshold: Some(thresholds.significant),
                exceeded: false,
                reason: "no estimated value provided; assuming minimal impact".to_string(),
            };
        };

        let score = if value <= thresholds.minor {
            5.0
        } else if value <= thresholds.moderate {
            20.0
        } else if value <= thresholds.significant {
            40.0
        } else if value <= thresholds.major {
            70.0
        } else {
            100.0
        };

        RiskFactor {
            name: "financial".to_string(),
            weight,
            score,
            threshold: Some(thresholds.significant),
            exceeded: value > thresholds.significant,
            reason: format!("estimated value ${}", value),
        }
    }

    fn reversibility_factor(&self, action: &Action) -> RiskFactor {
        let reversible = action.metadata.reversible;
        RiskFactor {
            name: "reversibility".to_string(),
            weight: self.config.weights.reversibility,
            score: if reversible { 10.0 } else { 80.0 },
            threshold: None,
            exceeded: !reversible,
            reason: if reversible {
                "action can be rolled back".to_string()
            } else {
                "action cannot be undone once executed".to_string()
            },
        }
    }

    /// Base risk by category: config override first, else the built-in
    /// total mapping. The category enum is closed, so there is no unknown
    /// fallthrough.
    fn category_factor(&self, action: &Action) -> RiskFactor {
        let base = match action.category {
            ActionCategory::Trading => 70.0,
            ActionCategory::Deployment => 60.0,
            ActionCategory::Configuration => 50.0,
            ActionCategory::Build => 40.0,
            ActionCategory::Content => 30.0,
        };
        let score = self
            .config
            .category_overrides
            .get(&action.category)
            .copied()
            .unwrap_or(base);

        RiskFactor {
            name: "category".to_string(),
            weight: self.config.weights.category,
            score,
            threshold: None,
            exceeded: false,
            reason: format!("base risk for {} actions", action.category),
        }
    }

    fn urgency_factor(&self, action: &Action) -> RiskFactor {
        let score = match action.metadata.urgency {
            Urgency::Low => 10.0,
            Urgency::Normal => 30.0,
            Urgency::High => 60.0,
            Urgency::Critical => 90.0,
        };

        RiskFactor {
            name: "urgency".to_string(),
            weight: self.config.weights.urgency,
            score,
            threshold: None,
            exceeded: action.metadata.urgency == Urgency::Critical,
            reason: format!("urgency rated {:?}", action.metadata.urgency).to_lowercase(),
        }
    }

    /// Public-posting actions carry reputational exposure.
    fn visibility_factor(&self, action: &Action) -> RiskFactor {
        let kind = action.kind.to_lowercase();
        let public = self
            .config
            .public_keywords
            .iter()
            .any(|k| kind.contains(&k.to_lowercase()));

        RiskFactor {
            name: "visibility".to_string(),
            weight: self.config.weights.visibility,
            score: if public { 60.0 } else { 20.0 },
            threshold: None,
            exceeded: public,
            reason: if public {
                "action publishes publicly visible output".to_string()
            } else {
                "action has no public surface".to_string()
            },
        }
    }

    fn recommendation(&self, action: &Action, level: RiskLevel) -> Outcome {
        if self.config.safe_kinds.iter().any(|k| k == &action.kind) {
            return Outcome::AutoExecute;
        }
        if self.config.dangerous_kinds.iter().any(|k| k == &action.kind) {
            return Outcome::Escalate;
        }
        default_recommendation(level)
    }

    fn constraints(&self, action: &Action, factors: &[RiskFactor]) -> Vec<String> {
        let mut constraints = Vec::new();

        if !action.metadata.reversible {
            constraints.push("prepare a rollback plan before execution".to_string());
        }
        if factors.iter().any(|f| f.name == "financial" && f.exceeded) {
            constraints.push("monitor position after execution".to_string());
        }
        if action.metadata.estimated_value.is_none() {
            constraints.push("estimated value missing; verify impact manually".to_string());
        }

        constraints
    }
}

impl RiskScorer for RiskClassifier {
    /// Score `action` across the five weighted factors.
    fn classify(&self, action: &Action) -> RiskAssessment {
        let factors = vec![
            self.financial_factor(action),
            self.reversibility_factor(action),
            self.category_factor(action),
            self.urgency_factor(action),
            self.visibility_factor(action),
        ];

        let score: f64 = factors.iter().map(|f| f.weight * f.score).sum();
        let level = level_for(score, &self.config.boundaries);
        let recommendation = self.recommendation(action, level);
        let constraints = self.constraints(action, &factors);

        debug!(
            action_id = %action.id,
            score = score,
            level = %level,
            "action classified"
        );

        RiskAssessment {
            action_id: action.id,
            level,
            score,
            factors,
            recommendation,
            constraints,
            assessed_at: Utc::now(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

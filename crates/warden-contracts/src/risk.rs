//! Risk assessment types: levels, factors, recommendations, and the
//! six-hats advisory result.
//!
//! A `RiskAssessment` is a pure function of (action, configuration) — it is
//! never mutated after creation, so repeated classification of the same
//! action under the same configuration yields an identical assessment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::ActionId;

/// The five-step risk ladder an assessment maps onto.
///
/// `Ord` follows severity, so `level >= RiskLevel::High` reads naturally.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four possible verdicts for a routed action.
///
/// Doubles as the classifier's recommendation and the router's final
/// outcome: a `Decision.outcome` always holds exactly one of these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Execute immediately without human involvement.
    AutoExecute,
    /// Hold for human sign-off in the approval queue.
    QueueApproval,
    /// Urgent human attention required; do not execute.
    Escalate,
    /// Refused outright.
    Reject,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoExecute => "auto_execute",
            Self::QueueApproval => "queue_approval",
            Self::Escalate => "escalate",
            Self::Reject => "reject",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weighted component of a risk score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Stable factor name ("financial", "reversibility", …).
    pub name: String,

    /// The factor's weight in the overall score. Weights sum to 1.0.
    pub weight: f64,

    /// Raw factor score on the 0–100 scale, before weighting.
    pub score: f64,

    /// The configured threshold this factor was judged against, if any.
    pub threshold: Option<f64>,

    /// True when the factor crossed its threshold (or tripped a
    /// categorical check such as a dangerous tool combination).
    pub exceeded: bool,

    /// Human-readable explanation for approval requests and audit payloads.
    pub reason: String,
}

/// The scored output of classifying an action or pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// The action (or pipeline) this assessment describes.
    pub action_id: ActionId,

    /// Score mapped onto the risk ladder via the configured boundaries.
    pub level: RiskLevel,

    /// Weighted sum of all factor scores, 0–100.
    pub score: f64,

    /// All factors in evaluation order.
    pub factors: Vec<RiskFactor>,

    /// What the classifier recommends. Advisory — the router combines this
    /// with boundary results and the autonomy level for the final outcome.
    pub recommendation: Outcome,

    /// Free-text operating constraints ("requires rollback plan", …).
    pub constraints: Vec<String>,

    /// Wall-clock time (UTC) the assessment was produced.
    pub assessed_at: DateTime<Utc>,
}

// ── Six hats ──────────────────────────────────────────────────────────────────

/// The six qualitative perspectives of the advisory consensus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hat {
    Facts,
    Intuition,
    Caution,
    Benefits,
    Alternatives,
    Process,
}

impl Hat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Facts => "facts",
            Self::Intuition => "intuition",
            Self::Caution => "caution",
            Self::Benefits => "benefits",
            Self::Alternatives => "alternatives",
            Self::Process => "process",
        }
    }
}

/// A single perspective's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HatVerdict {
    Proceed,
    Caution,
    Stop,
    Review,
}

/// One perspective's scored opinion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HatScore {
    pub hat: Hat,
    pub verdict: HatVerdict,
    /// 0–100; higher is more favorable to proceeding.
    pub score: f64,
    /// Supporting bullet points for the human reviewer.
    pub points: Vec<String>,
}

/// The combined verdict across all six perspectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consensus {
    StrongProceed,
    Proceed,
    Caution,
    Mixed,
    Stop,
}

/// The advisory six-perspective evaluation of a single action.
///
/// Advisory input only: it surfaces a human-readable rationale alongside
/// the automated decision and never gates routing by itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SixHatsResult {
    pub action_id: ActionId,
    /// All six perspectives in fixed order: facts, intuition, caution,
    /// benefits, alternatives, process.
    pub hats: Vec<HatScore>,
    pub consensus: Consensus,
    /// Fixed weighted average of the six perspective scores.
    pub score: f64,
}

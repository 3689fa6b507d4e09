//! Six-perspective qualitative consensus.
//!
//! Six independent scoring functions — Facts, Intuition, Caution,
//! Benefits, Alternatives, Process — each seeded only from the action's
//! metadata and its already-computed risk assessment (no recomputation of
//! risk). The combined consensus is advisory: it surfaces a human-readable
//! rationale alongside automated decisions and never gates routing by
//! itself.

use warden_contracts::{
    action::{Action, Urgency},
    risk::{
        Consensus, Hat, HatScore, HatVerdict, Outcome, RiskAssessment, RiskLevel, SixHatsResult,
    },
};

/// Fixed consensus weights per perspective. Caution carries the most
/// weight; intuition and alternatives the least.
const WEIGHTS: [(Hat, f64); 6] = [
    (Hat::Caution, 0.25),
    (Hat::Facts, 0.20),
    (Hat::Process, 0.20),
    (Hat::Benefits, 0.15),
    (Hat::Intuition, 0.10),
    (Hat::Alternatives, 0.10),
];

/// The six-perspective evaluator. Stateless; every output is a pure
/// function of its inputs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SixHatsEvaluator;

impl SixHatsEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate all six perspectives and fold them into a consensus.
    pub fn evaluate(&self, action: &Action, assessment: &RiskAssessment) -> SixHatsResult {
        let hats = vec![
            facts(action, assessment),
            intuition(assessment),
            caution(action, assessment),
            benefits(action, assessment),
            alternatives(action),
            process(assessment),
        ];

        let consensus = consensus_of(&hats);
        let score = weighted_score(&hats);

        SixHatsResult {
            action_id: action.id,
            hats,
            consensus,
            score,
        }
    }
}

/// Consensus rule: any stop (or three cautions) stops; five proceeds is a
/// strong proceed; four is a proceed; two cautions lean caution; anything
/// else is mixed.
fn consensus_of(hats: &[HatScore]) -> Consensus {
    let count = |v: HatVerdict| hats.iter().filter(|h| h.verdict == v).count();

    let stops = count(HatVerdict::Stop);
    let cautions = count(HatVerdict::Caution);
    let proceeds = count(HatVerdict::Proceed);

    if stops > 0 || cautions >= 3 {
        Consensus::Stop
    } else if proceeds >= 5 {
        Consensus::StrongProceed
    } else if proceeds >= 4 {
        Consensus::Proceed
    } else if cautions >= 2 {
        Consensus::Caution
    } else {
        Consensus::Mixed
    }
}

fn weighted_score(hats: &[HatScore]) -> f64 {
    WEIGHTS
        .iter()
        .map(|(hat, weight)| {
            hats.iter()
                .find(|h| h.hat == *hat)
                .map(|h| weight * h.score)
                .unwrap_or(0.0)
        })
        .sum()
}

// ── Perspectives ──────────────────────────────────────────────────────────────

/// White hat: what do we objectively know, and how complete is it?
fn facts(action: &Action, assessment: &RiskAssessment) -> HatScore {
    let mut points = vec![format!(
        "risk score {:.0} maps to level {}",
        assessment.score, assessment.level
    )];
    let mut score = 70.0;

    match action.metadata.estimated_value {
        Some(value) => points.push(format!("estimated value ${}", value)),
        None => {
            score -= 20.0;
            points.push("no estimated value — impact is a guess".to_string());
        }
    }

    let exceeded = assessment.factors.iter().filter(|f| f.exceeded).count();
    if exceeded > 0 {
        score -= 10.0 * exceeded.min(3) as f64;
        points.push(format!("{} risk factors over threshold", exceeded));
    }

    let verdict = if assessment.score >= 75.0 {
        HatVerdict::Caution
    } else if action.metadata.estimated_value.is_none() {
        HatVerdict::Review
    } else {
        HatVerdict::Proceed
    };

    HatScore { hat: Hat::Facts, verdict, score: score.max(0.0), points }
}

/// Red hat: the gut read straight off the risk level.
fn intuition(assessment: &RiskAssessment) -> HatScore {
    let (verdict, score, note) = match assessment.level {
        RiskLevel::Safe => (HatVerdict::Proceed, 85.0, "feels routine"),
        RiskLevel::Low => (HatVerdict::Proceed, 70.0, "comfortable"),
        RiskLevel::Medium => (HatVerdict::Caution, 50.0, "uneasy but workable"),
        RiskLevel::High => (HatVerdict::Caution, 30.0, "this would keep me up at night"),
        RiskLevel::Critical => (HatVerdict::Stop, 10.0, "every instinct says no"),
    };

    HatScore {
        hat: Hat::Intuition,
        verdict,
        score,
        points: vec![note.to_string()],
    }
}

/// Black hat: what can go wrong, and can we come back from it?
fn caution(action: &Action, assessment: &RiskAssessment) -> HatScore {
    let exceeded = assessment.factors.iter().filter(|f| f.exceeded).count();
    let irreversible = !action.metadata.reversible;

    let mut points = Vec::new();
    let mut score = 90.0 - 25.0 * exceeded as f64;

    if irreversible {
        score -= 15.0;
        points.push("no way back after execution".to_string());
    }
    for factor in assessment.factors.iter().filter(|f| f.exceeded) {
        points.push(factor.reason.clone());
    }
    if points.is_empty() {
        points.push("no threshold breaches to worry about".to_string());
    }

    let verdict = if irreversible && assessment.level >= RiskLevel::High {
        HatVerdict::Stop
    } else if exceeded >= 2 {
        HatVerdict::Caution
    } else if exceeded == 1 {
        HatVerdict::Review
    } else {
        HatVerdict::Proceed
    };

    HatScore { hat: Hat::Caution, verdict, score: score.max(5.0), points }
}

/// Yellow hat: what does acting now buy us?
fn benefits(action: &Action, assessment: &RiskAssessment) -> HatScore {
    let mut score: f64 = match action.metadata.urgency {
        Urgency::Critical => 80.0,
        Urgency::High => 70.0,
        Urgency::Normal => 55.0,
        Urgency::Low => 40.0,
    };
    let mut points = vec![format!("urgency {:?}", action.metadata.urgency).to_lowercase()];

    if action.metadata.reversible {
        score = (score + 10.0).min(100.0);
        points.push("reversible, so upside comes cheap".to_string());
    }

    let verdict = if action.metadata.reversible && assessment.level <= RiskLevel::Low {
        HatVerdict::Proceed
    } else if action.metadata.urgency >= Urgency::High {
        HatVerdict::Proceed
    } else {
        HatVerdict::Review
    };

    HatScore { hat: Hat::Benefits, verdict, score, points }
}

/// Green hat: is there a safer shape for the same outcome?
fn alternatives(action: &Action) -> HatScore {
    if action.metadata.reversible {
        HatScore {
            hat: Hat::Alternatives,
            verdict: HatVerdict::Proceed,
            score: 75.0,
            points: vec!["can be rolled back if outcomes disappoint".to_string()],
        }
    } else {
        HatScore {
            hat: Hat::Alternatives,
            verdict: HatVerdict::Review,
            score: 40.0,
            points: vec![
                "consider a staged or reversible variant before committing".to_string(),
            ],
        }
    }
}

/// Blue hat: does the process itself say go?
fn process(assessment: &RiskAssessment) -> HatScore {
    let (verdict, score, note) = match assessment.recommendation {
        Outcome::AutoExecute => (HatVerdict::Proceed, 80.0, "classifier recommends auto-execution"),
        Outcome::QueueApproval => (HatVerdict::Review, 60.0, "classifier recommends human review"),
        Outcome::Escalate => (HatVerdict::Caution, 35.0, "classifier recommends escalation"),
        Outcome::Reject => (HatVerdict::Stop, 10.0, "classifier recommends rejection"),
    };

    let mut points = vec![note.to_string()];
    points.extend(assessment.constraints.iter().cloned());

    HatScore { hat: Hat::Process, verdict, score, points }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use warden_contracts::{
        action::{ActionCategory, ActionMetadata},
        risk::RiskFactor,
    };

    use super::*;

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn make_action(reversible: bool, urgency: Urgency, value: Option<f64>) -> Action {
        Action::new("unit_test", "test-engine", ActionCategory::Content, "test")
            .with_metadata(ActionMetadata {
                estimated_value: value,
                reversible,
                urgency,
                lines_changed: None,
                files_changed: None,
            })
    }

    fn make_assessment(
        action: &Action,
        level: RiskLevel,
        score: f64,
        recommendation: Outcome,
        exceeded: usize,
    ) -> RiskAssessment {
        let factors = (0..exceeded)
            .map(|i| RiskFactor {
                name: format!("factor-{i}"),
                weight: 0.2,
                score: 80.0,
                threshold: Some(50.0),
                exceeded: true,
                reason: format!("factor {i} over threshold"),
            })
            .collect();

        RiskAssessment {
            action_id: action.id,
            level,
            score,
            factors,
            recommendation,
            constraints: vec![],
            assessed_at: Utc::now(),
        }
    }

    // ── Consensus ────────────────────────────────────────────────────────────

    /// A reversible, low-risk, valued action earns a proceed from every
    /// perspective.
    #[test]
    fn benign_action_reaches_strong_proceed() {
        let action = make_action(true, Urgency::Normal, Some(5.0));
        let assessment =
            make_assessment(&action, RiskLevel::Safe, 12.0, Outcome::AutoExecute, 0);

        let result = SixHatsEvaluator::new().evaluate(&action, &assessment);

        assert_eq!(result.consensus, Consensus::StrongProceed);
        assert!(result.score > 65.0, "score {}", result.score);
    }

    /// Critical risk trips the intuition stop, which alone forces an
    /// overall stop.
    #[test]
    fn critical_level_forces_stop() {
        let action = make_action(false, Urgency::Normal, Some(50_000.0));
        let assessment =
            make_assessment(&action, RiskLevel::Critical, 92.0, Outcome::Escalate, 3);

        let result = SixHatsEvaluator::new().evaluate(&action, &assessment);

        assert_eq!(result.consensus, Consensus::Stop);
    }

    /// An irreversible high-risk action stops via the caution perspective
    /// even without a critical level.
    #[test]
    fn irreversible_high_risk_stops_via_caution() {
        let action = make_action(false, Urgency::Normal, Some(2_000.0));
        let assessment =
            make_assessment(&action, RiskLevel::High, 70.0, Outcome::QueueApproval, 2);

        let result = SixHatsEvaluator::new().evaluate(&action, &assessment);

        let caution = result.hats.iter().find(|h| h.hat == Hat::Caution).unwrap();
        assert_eq!(caution.verdict, HatVerdict::Stop);
        assert_eq!(result.consensus, Consensus::Stop);
    }

    /// A middling action with split verdicts lands on mixed.
    #[test]
    fn middling_action_is_mixed() {
        let action = make_action(false, Urgency::Normal, Some(200.0));
        let assessment =
            make_assessment(&action, RiskLevel::Medium, 50.0, Outcome::QueueApproval, 1);

        let result = SixHatsEvaluator::new().evaluate(&action, &assessment);

        // facts: proceed; intuition: caution; caution: review; benefits:
        // review; alternatives: review; process: review — one caution, one
        // proceed, no stop.
        assert_eq!(result.consensus, Consensus::Mixed);
    }

    // ── Result shape ─────────────────────────────────────────────────────────

    #[test]
    fn all_six_hats_are_present_in_order() {
        let action = make_action(true, Urgency::Low, Some(1.0));
        let assessment =
            make_assessment(&action, RiskLevel::Safe, 10.0, Outcome::AutoExecute, 0);

        let result = SixHatsEvaluator::new().evaluate(&action, &assessment);

        let order: Vec<Hat> = result.hats.iter().map(|h| h.hat).collect();
        assert_eq!(
            order,
            vec![
                Hat::Facts,
                Hat::Intuition,
                Hat::Caution,
                Hat::Benefits,
                Hat::Alternatives,
                Hat::Process
            ]
        );

        for hat in &result.hats {
            assert!(!hat.points.is_empty(), "{:?} has no supporting points", hat.hat);
            assert!((0.0..=100.0).contains(&hat.score));
        }
    }

    #[test]
    fn evaluation_is_deterministic() {
        let action = make_action(false, Urgency::High, Some(750.0));
        let assessment =
            make_assessment(&action, RiskLevel::Medium, 55.0, Outcome::QueueApproval, 1);

        let evaluator = SixHatsEvaluator::new();
        let first = evaluator.evaluate(&action, &assessment);
        let again = evaluator.evaluate(&action, &assessment);

        assert_eq!(first.consensus, again.consensus);
        assert_eq!(first.score, again.score);
    }

    #[test]
    fn missing_value_downgrades_facts() {
        let action = make_action(true, Urgency::Normal, None);
        let assessment =
            make_assessment(&action, RiskLevel::Low, 25.0, Outcome::AutoExecute, 0);

        let result = SixHatsEvaluator::new().evaluate(&action, &assessment);

        let facts = result.hats.iter().find(|h| h.hat == Hat::Facts).unwrap();
        assert_eq!(facts.verdict, HatVerdict::Review);
        assert!(facts.points.iter().any(|p| p.contains("no estimated value")));
    }
}

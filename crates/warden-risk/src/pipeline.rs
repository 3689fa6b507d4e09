//! Multi-step pipeline risk classification.
//!
//! Aggregates per-tool base risk, dangerous tool combinations, structural
//! complexity (including dependency depth over the step DAG), sensitive
//! data flow, and the pipeline's self-declared risk into one weighted
//! score on the same ladder the single-action classifier uses.
//!
//! Unknown tool names are caught up front against the configured tool
//! table and reported in the assessment's constraints — they never default
//! silently deep inside the scoring math.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::debug;

use warden_contracts::{
    config::{LevelBoundaries, PipelineRiskConfig},
    error::{WardenError, WardenResult},
    pipeline::{Pipeline, PipelineStep},
    risk::{Outcome, RiskAssessment, RiskFactor, RiskLevel},
};

use crate::classifier::{default_recommendation, level_for};

/// Per-step base score at or above this escalates the whole pipeline.
const STEP_ESCALATION_SCORE: f64 = 90.0;

/// The weighted multi-factor classifier for tool pipelines.
pub struct PipelineRiskClassifier {
    config: PipelineRiskConfig,
    boundaries: LevelBoundaries,
}

impl PipelineRiskClassifier {
    pub fn new(config: PipelineRiskConfig, boundaries: LevelBoundaries) -> Self {
        Self { config, boundaries }
    }

    /// Score `pipeline` across the five weighted factors.
    ///
    /// # Errors
    ///
    /// `InvalidPipeline` for an empty pipeline, a dependency edge naming an
    /// unknown step id, or a dependency cycle. Unknown *tools* are not
    /// errors — they score at the configured default and are listed in the
    /// assessment's constraints.
    pub fn classify(&self, pipeline: &Pipeline) -> WardenResult<RiskAssessment> {
        if pipeline.steps.is_empty() {
            return Err(WardenError::InvalidPipeline {
                reason: "pipeline has no steps".to_string(),
            });
        }

        let depth = dependency_depth(&pipeline.steps)?;

        let step_scores: Vec<f64> = pipeline
            .steps
            .iter()
            .map(|s| self.tool_score(&s.tool))
            .collect();
        let unknown_tools: Vec<&str> = pipeline
            .steps
            .iter()
            .map(|s| s.tool.as_str())
            .filter(|t| !self.config.tool_risk.contains_key(*t))
            .collect();

        let factors = vec![
            self.tool_risk_factor(&step_scores),
            self.combination_factor(pipeline),
            self.complexity_factor(pipeline, depth),
            self.data_flow_factor(pipeline),
            self.declared_factor(pipeline),
        ];

        let score: f64 = factors.iter().map(|f| f.weight * f.score).sum();
        let level = level_for(score, &self.boundaries);
        let recommendation = self.recommendation(pipeline, &step_scores, level);

        let mut constraints = Vec::new();
        if !unknown_tools.is_empty() {
            constraints.push(format!(
                "unknown tools scored at default {}: {}",
                self.config.unknown_tool_score,
                unknown_tools.join(", ")
            ));
        }
        if depth > 3 {
            constraints.push(format!("dependency chain is {} levels deep", depth));
        }

        debug!(
            pipeline_id = %pipeline.id,
            steps = pipeline.steps.len(),
            score = score,
            level = %level,
            "pipeline classified"
        );

        Ok(RiskAssessment {
            action_id: pipeline.id,
            level,
            score,
            factors,
            recommendation,
            constraints,
            assessed_at: Utc::now(),
        })
    }

    fn tool_score(&self, tool: &str) -> f64 {
        self.config
            .tool_risk
            .get(tool)
            .copied()
            .unwrap_or(self.config.unknown_tool_score)
    }

    // ── Factors ──────────────────────────────────────────────────────────────

    /// Cumulative tool risk: a position-discounted average blended with the
    /// single riskiest step.
    ///
    /// Step i is discounted by 1/(i+1); the discounted sum is divided by
    /// ln(step_count + 1) so long pipelines do not grow without bound, and
    /// capped at 100. Combined as 0.6·average + 0.4·max so one dangerous
    /// step cannot hide behind many harmless ones.
    fn tool_risk_factor(&self, step_scores: &[f64]) -> RiskFactor {
        let discounted_sum: f64 = step_scores
            .iter()
            .enumerate()
            .map(|(i, s)| s / (i as f64 + 1.0))
            .sum();
        let weighted_avg =
            (discounted_sum / ((step_scores.len() as f64 + 1.0).ln())).min(100.0);
        let max = step_scores.iter().cloned().fold(0.0, f64::max);

        let score = 0.6 * weighted_avg + 0.4 * max;

        RiskFactor {
            name: "tool_risk".to_string(),
            weight: self.config.weights.tool_risk,
            score,
            threshold: Some(STEP_ESCALATION_SCORE),
            exceeded: max >= STEP_ESCALATION_SCORE,
            reason: format!(
                "{} steps, discounted average {:.0}, riskiest step {:.0}",
                step_scores.len(),
                weighted_avg,
                max
            ),
        }
    }

    /// Dangerous tool combinations: fires when the pipeline's tool set is
    /// a superset of any configured combination.
    fn combination_factor(&self, pipeline: &Pipeline) -> RiskFactor {
        let tools = pipeline.tool_set();

        let matched: Vec<String> = self
            .config
            .dangerous_combinations
            .iter()
            .filter(|combo| combo.iter().all(|t| tools.contains(t.as_str())))
            .map(|combo| combo.join(" + "))
            .collect();

        let score = if matched.is_empty() {
            15.0
        } else {
            (60.0 + 25.0 * (matched.len() as f64 - 1.0)).min(100.0)
        };

        RiskFactor {
            name: "combinations".to_string(),
            weight: self.config.weights.combinations,
            score,
            threshold: None,
            exceeded: !matched.is_empty(),
            reason: if matched.is_empty() {
                "no dangerous tool combinations".to_string()
            } else {
                format!("dangerous combination: {}", matched.join("; "))
            },
        }
    }

    /// Structural complexity: step count, conditional steps, dependency
    /// depth, and the configured review threshold.
    fn complexity_factor(&self, pipeline: &Pipeline, depth: usize) -> RiskFactor {
        let steps = pipeline.steps.len();
        let has_condition = pipeline.steps.iter().any(|s| s.condition.is_some());
        let over_review = steps > self.config.review_step_threshold;

        let mut score = 10.0 + (5.0 * steps as f64).min(30.0);
        if has_condition {
            score += 15.0;
        }
        if depth > 3 {
            score += 20.0;
        }
        if over_review {
            score += 15.0;
        }

        RiskFactor {
            name: "complexity".to_string(),
            weight: self.config.weights.complexity,
            score,
            threshold: Some(self.config.review_step_threshold as f64),
            exceeded: depth > 3 || over_review,
            reason: format!(
                "{} steps, dependency depth {}{}",
                steps,
                depth,
                if has_condition { ", conditional" } else { "" }
            ),
        }
    }

    /// Sensitive data flow: serialized step inputs scanned against the
    /// configured term list.
    fn data_flow_factor(&self, pipeline: &Pipeline) -> RiskFactor {
        let mut matches = 0usize;
        let mut seen: HashSet<&str> = HashSet::new();

        for step in &pipeline.steps {
            let serialized = step.inputs.to_string().to_lowercase();
            for term in &self.config.sensitive_terms {
                if serialized.contains(&term.to_lowercase()) {
                    matches += 1;
                    seen.insert(term.as_str());
                }
            }
        }

        let score = (10.0 + 20.0 * matches as f64).min(80.0);

        RiskFactor {
            name: "data_flow".to_string(),
            weight: self.config.weights.data_flow,
            score,
            threshold: None,
            exceeded: matches > 0,
            reason: if matches == 0 {
                "no sensitive terms in step inputs".to_string()
            } else {
                let mut terms: Vec<&str> = seen.into_iter().collect();
                terms.sort_unstable();
                format!("sensitive terms in step inputs: {}", terms.join(", "))
            },
        }
    }

    /// The pipeline's own risk declaration, taken as one factor among five.
    fn declared_factor(&self, pipeline: &Pipeline) -> RiskFactor {
        let (score, reason) = match pipeline.declared_risk {
            Some(RiskLevel::Safe) => (10.0, "pipeline declares itself safe"),
            Some(RiskLevel::Low) => (25.0, "pipeline declares low risk"),
            Some(RiskLevel::Medium) => (50.0, "pipeline declares medium risk"),
            Some(RiskLevel::High) => (75.0, "pipeline declares high risk"),
            Some(RiskLevel::Critical) => (95.0, "pipeline declares critical risk"),
            None => (50.0, "no declared risk; assuming medium"),
        };

        RiskFactor {
            name: "declared".to_string(),
            weight: self.config.weights.declared,
            score,
            threshold: None,
            exceeded: matches!(
                pipeline.declared_risk,
                Some(RiskLevel::High) | Some(RiskLevel::Critical)
            ),
            reason: reason.to_string(),
        }
    }

    /// Any single step at or above the escalation score escalates the
    /// whole pipeline; a self-declared safe pipeline auto-executes unless
    /// the aggregate says critical.
    fn recommendation(
        &self,
        pipeline: &Pipeline,
        step_scores: &[f64],
        level: RiskLevel,
    ) -> Outcome {
        if step_scores.iter().any(|s| *s >= STEP_ESCALATION_SCORE) {
            return Outcome::Escalate;
        }
        if pipeline.declared_risk == Some(RiskLevel::Safe) && level != RiskLevel::Critical {
            return Outcome::AutoExecute;
        }
        default_recommendation(level)
    }
}

/// Longest path through the step dependency DAG.
///
/// depth(step) = 0 with no dependencies, else 1 + max(depth(dep)).
/// Memoized so shared subtrees are computed once.
fn dependency_depth(steps: &[PipelineStep]) -> WardenResult<usize> {
    let index: HashMap<&str, &PipelineStep> =
        steps.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut memo: HashMap<&str, usize> = HashMap::new();
    let mut max_depth = 0;

    for step in steps {
        let mut visiting = HashSet::new();
        let d = depth_of(step, &index, &mut memo, &mut visiting)?;
        max_depth = max_depth.max(d);
    }

    Ok(max_depth)
}

fn depth_of<'a>(
    step: &'a PipelineStep,
    index: &HashMap<&'a str, &'a PipelineStep>,
    memo: &mut HashMap<&'a str, usize>,
    visiting: &mut HashSet<&'a str>,
) -> WardenResult<usize> {
    if let Some(&d) = memo.get(step.id.as_str()) {
        return Ok(d);
    }
    if !visiting.insert(step.id.as_str()) {
        return Err(WardenError::InvalidPipeline {
            reason: format!("dependency cycle at step '{}'", step.id),
        });
    }

    let mut depth = 0;
    for dep_id in &step.depends_on {
        let dep = index
            .get(dep_id.as_str())
            .ok_or_else(|| WardenError::InvalidPipeline {
                reason: format!("step '{}' depends on unknown step '{}'", step.id, dep_id),
            })?;
        depth = depth.max(1 + depth_of(dep, index, memo, visiting)?);
    }

    visiting.remove(step.id.as_str());
    memo.insert(step.id.as_str(), depth);
    Ok(depth)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn classifier() -> PipelineRiskClassifier {
        PipelineRiskClassifier::new(PipelineRiskConfig::default(), LevelBoundaries::default())
    }

    fn pipeline_of(tools: &[&str]) -> Pipeline {
        let steps = tools
            .iter()
            .enumerate()
            .map(|(i, tool)| PipelineStep::new(format!("step-{i}"), *tool))
            .collect();
        Pipeline::new("test pipeline").with_steps(steps)
    }

    fn factor<'a>(assessment: &'a RiskAssessment, name: &str) -> &'a RiskFactor {
        assessment
            .factors
            .iter()
            .find(|f| f.name == name)
            .unwrap_or_else(|| panic!("missing factor '{name}'"))
    }

    // ── Structure validation ─────────────────────────────────────────────────

    #[test]
    fn empty_pipeline_is_invalid() {
        let result = classifier().classify(&Pipeline::new("empty"));
        assert!(matches!(result, Err(WardenError::InvalidPipeline { .. })));
    }

    #[test]
    fn unknown_dependency_id_is_invalid() {
        let pipeline = Pipeline::new("dangling").with_steps(vec![
            PipelineStep::new("a", "data_reader").depends(&["ghost"]),
        ]);

        match classifier().classify(&pipeline) {
            Err(WardenError::InvalidPipeline { reason }) => {
                assert!(reason.contains("unknown step 'ghost'"));
            }
            other => panic!("expected InvalidPipeline, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn dependency_cycle_is_invalid() {
        let pipeline = Pipeline::new("cyclic").with_steps(vec![
            PipelineStep::new("a", "data_reader").depends(&["b"]),
            PipelineStep::new("b", "data_reader").depends(&["a"]),
        ]);

        match classifier().classify(&pipeline) {
            Err(WardenError::InvalidPipeline { reason }) => {
                assert!(reason.contains("dependency cycle"));
            }
            other => panic!("expected InvalidPipeline, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn dependency_depth_is_longest_path() {
        // a ← b ← c, plus an unrelated d: depth 2.
        let steps = vec![
            PipelineStep::new("a", "data_reader"),
            PipelineStep::new("b", "data_reader").depends(&["a"]),
            PipelineStep::new("c", "data_reader").depends(&["b"]),
            PipelineStep::new("d", "data_reader"),
        ];
        assert_eq!(dependency_depth(&steps).unwrap(), 2);
    }

    // ── Dangerous combinations ───────────────────────────────────────────────

    /// Any pipeline whose tool set is a superset of a configured dangerous
    /// combination must flag that combination with `exceeded = true`.
    #[test]
    fn superset_of_dangerous_combination_fires() {
        let assessment = classifier()
            .classify(&pipeline_of(&["wallet_agent", "trading_agent", "data_reader"]))
            .unwrap();

        let combos = factor(&assessment, "combinations");
        assert!(combos.exceeded);
        assert!(combos.reason.contains("wallet_agent + trading_agent"));
    }

    #[test]
    fn wallet_plus_trading_pushes_level_to_high() {
        let assessment = classifier()
            .classify(&pipeline_of(&["wallet_agent", "trading_agent"]))
            .unwrap();

        assert!(
            assessment.level >= RiskLevel::High,
            "expected high or critical, got {} (score {:.1})",
            assessment.level,
            assessment.score
        );
    }

    #[test]
    fn benign_tools_have_baseline_combination_score() {
        let assessment = classifier()
            .classify(&pipeline_of(&["data_reader", "http_fetch"]))
            .unwrap();

        let combos = factor(&assessment, "combinations");
        assert!(!combos.exceeded);
        assert_eq!(combos.score, 15.0);
    }

    // ── Tool risk ────────────────────────────────────────────────────────────

    #[test]
    fn later_steps_are_discounted() {
        // Same tools, different order: the riskier-first pipeline must not
        // score lower than the riskier-last one.
        let risky_first = classifier()
            .classify(&pipeline_of(&["wallet_agent", "data_reader"]))
            .unwrap();
        let risky_last = classifier()
            .classify(&pipeline_of(&["data_reader", "wallet_agent"]))
            .unwrap();

        let first = factor(&risky_first, "tool_risk").score;
        let last = factor(&risky_last, "tool_risk").score;
        assert!(
            first >= last,
            "discounting must favor the early position: {first} vs {last}"
        );
    }

    #[test]
    fn unknown_tools_are_reported_in_constraints() {
        let assessment = classifier()
            .classify(&pipeline_of(&["quantum_oracle", "data_reader"]))
            .unwrap();

        assert!(assessment
            .constraints
            .iter()
            .any(|c| c.contains("quantum_oracle")));
    }

    // ── Complexity ───────────────────────────────────────────────────────────

    #[test]
    fn complexity_accumulates_all_components() {
        // Six steps in a five-deep chain with one condition: every
        // complexity component fires.
        let steps = vec![
            PipelineStep::new("s0", "data_reader"),
            PipelineStep::new("s1", "data_reader").depends(&["s0"]),
            PipelineStep::new("s2", "data_reader").depends(&["s1"]),
            PipelineStep::new("s3", "data_reader").depends(&["s2"]),
            PipelineStep::new("s4", "data_reader").depends(&["s3"]),
            PipelineStep::new("s5", "data_reader")
                .depends(&["s4"])
                .with_condition("only when market open"),
        ];
        let pipeline = Pipeline::new("complex").with_steps(steps);

        let assessment = classifier().classify(&pipeline).unwrap();
        let complexity = factor(&assessment, "complexity");

        // 10 base + 30 capped step term + 15 condition + 20 depth + 15 review.
        assert_eq!(complexity.score, 90.0);
        assert!(complexity.exceeded);
    }

    // ── Data flow ────────────────────────────────────────────────────────────

    #[test]
    fn sensitive_terms_in_inputs_raise_data_flow() {
        let steps = vec![PipelineStep::new("s0", "http_fetch")
            .with_inputs(json!({ "url": "https://api.example.com", "wallet": "0xabc" }))];
        let pipeline = Pipeline::new("sensitive").with_steps(steps);

        let assessment = classifier().classify(&pipeline).unwrap();
        let data_flow = factor(&assessment, "data_flow");

        assert!(data_flow.exceeded);
        assert!(data_flow.reason.contains("wallet"));
        assert!(data_flow.score > 10.0);
    }

    #[test]
    fn clean_inputs_have_baseline_data_flow() {
        let assessment = classifier()
            .classify(&pipeline_of(&["data_reader"]))
            .unwrap();

        assert_eq!(factor(&assessment, "data_flow").score, 10.0);
    }

    // ── Recommendation ───────────────────────────────────────────────────────

    #[test]
    fn any_step_at_escalation_score_escalates() {
        let assessment = classifier()
            .classify(&pipeline_of(&["shell_exec", "data_reader"]))
            .unwrap();

        assert_eq!(assessment.recommendation, Outcome::Escalate);
    }

    #[test]
    fn declared_safe_pipeline_auto_executes_when_not_critical() {
        let pipeline = pipeline_of(&["data_reader"]).declaring(RiskLevel::Safe);
        let assessment = classifier().classify(&pipeline).unwrap();

        assert_eq!(assessment.recommendation, Outcome::AutoExecute);
    }

    #[test]
    fn declared_safe_cannot_mask_dangerous_combination() {
        // The self-declaration discounts the declared factor, but the
        // aggregate still reflects the dangerous combination.
        let pipeline =
            pipeline_of(&["wallet_agent", "trading_agent"]).declaring(RiskLevel::Safe);
        let assessment = classifier().classify(&pipeline).unwrap();

        assert!(assessment.level >= RiskLevel::Medium);
    }

    // ── Determinism ──────────────────────────────────────────────────────────

    #[test]
    fn classification_is_deterministic() {
        let classifier = classifier();
        let pipeline = pipeline_of(&["wallet_agent", "trading_agent", "social_agent"]);

        let first = classifier.classify(&pipeline).unwrap();
        for _ in 0..5 {
            let again = classifier.classify(&pipeline).unwrap();
            assert_eq!(again.score, first.score);
            assert_eq!(again.level, first.level);
        }
    }
}

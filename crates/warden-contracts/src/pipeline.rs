//! Multi-step tool pipeline types.
//!
//! A pipeline is an ordered list of typed steps, each naming a tool. Steps
//! may declare dependency edges to other step ids, forming a DAG whose
//! longest path ("dependency depth") contributes to the complexity factor.

use serde::{Deserialize, Serialize};

use crate::{action::ActionId, risk::RiskLevel};

/// One step of a tool pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStep {
    /// Step identifier, unique within the pipeline. Referenced by
    /// `depends_on` edges of other steps.
    pub id: String,

    /// The tool this step invokes. Scored against the configured tool
    /// risk table.
    pub tool: String,

    /// Input parameters handed to the tool. Serialized and scanned for
    /// sensitive terms by the data-flow factor.
    #[serde(default)]
    pub inputs: serde_json::Value,

    /// Step ids this step depends on.
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Optional execution condition. Its presence counts toward
    /// structural complexity.
    pub condition: Option<String>,

    /// Optional per-step timeout.
    pub timeout_secs: Option<u64>,
}

impl PipelineStep {
    /// A step with no inputs, dependencies, condition, or timeout.
    pub fn new(id: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tool: tool.into(),
            inputs: serde_json::Value::Null,
            depends_on: Vec::new(),
            condition: None,
            timeout_secs: None,
        }
    }

    pub fn with_inputs(mut self, inputs: serde_json::Value) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn depends(mut self, ids: &[&str]) -> Self {
        self.depends_on = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// An ordered multi-step tool pipeline submitted for governance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    /// Pipeline identifier, used as the action id of its assessment.
    pub id: ActionId,

    /// Human-readable pipeline name.
    pub name: String,

    /// Steps in declaration order. Order matters: later steps are
    /// discounted by the cumulative tool-risk factor.
    pub steps: Vec<PipelineStep>,

    /// Risk level the pipeline declares about itself, if any. Trusted only
    /// as one factor among five — a "safe" declaration cannot mask a
    /// critical aggregate score.
    pub declared_risk: Option<RiskLevel>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ActionId::new(),
            name: name.into(),
            steps: Vec::new(),
            declared_risk: None,
        }
    }

    pub fn with_steps(mut self, steps: Vec<PipelineStep>) -> Self {
        self.steps = steps;
        self
    }

    pub fn declaring(mut self, level: RiskLevel) -> Self {
        self.declared_risk = Some(level);
        self
    }

    /// The set of distinct tool names across all steps.
    pub fn tool_set(&self) -> std::collections::HashSet<&str> {
        self.steps.iter().map(|s| s.tool.as_str()).collect()
    }
}

//! Action identity and metadata types.
//!
//! An `Action` is a proposed operation submitted by an engine adapter for
//! governance. It is immutable once submitted — the router never edits it,
//! only embeds it into the resulting `Decision`.

use serde::{Deserialize, Serialize};

/// Unique identifier for a proposed action.
///
/// Assigned by the submitting engine adapter and carried through every
/// assessment, decision, and audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionId(pub uuid::Uuid);

impl ActionId {
    /// Create a new, unique action ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The closed set of action categories the engine governs.
///
/// Categories are an enumeration rather than free strings so unknown
/// categories are rejected at the ingress boundary instead of silently
/// falling through risk tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Trading,
    Content,
    Build,
    Deployment,
    Configuration,
}

impl ActionCategory {
    /// Stable string tag, matching the wire format used in audit payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trading => "trading",
            Self::Content => "content",
            Self::Build => "build",
            Self::Deployment => "deployment",
            Self::Configuration => "configuration",
        }
    }
}

impl std::fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How soon the submitting engine believes the action must run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// Optional telemetry describing the proposed action.
///
/// Every field except `reversible` and `urgency` is optional: the engine is
/// designed to never block a decision on missing telemetry. `reversible`
/// defaults to `false` — irreversibility is the safe assumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionMetadata {
    /// Estimated monetary impact in account currency, if known.
    pub estimated_value: Option<f64>,

    /// Whether the action can be undone after execution.
    pub reversible: bool,

    /// The submitting engine's urgency rating.
    pub urgency: Urgency,

    /// For build/commit actions: lines changed.
    pub lines_changed: Option<u32>,

    /// For build/commit actions: files changed.
    pub files_changed: Option<u32>,
}

impl Default for ActionMetadata {
    fn default() -> Self {
        Self {
            estimated_value: None,
            reversible: false,
            urgency: Urgency::Normal,
            lines_changed: None,
            files_changed: None,
        }
    }
}

/// A proposed operation submitted for governance.
///
/// Constructed by an engine adapter; the governance core never executes the
/// underlying operation and does not validate its business semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Unique identifier for this proposal.
    pub id: ActionId,

    /// Free-form type tag (e.g. "execute_trade", "post_tweet", "auto_commit").
    /// Matched against the configured safe/dangerous kind lists.
    pub kind: String,

    /// The engine (bot, pipeline, subsystem) that produced this action.
    pub engine: String,

    /// Which governed category the action belongs to.
    pub category: ActionCategory,

    /// Human-readable description, shown in approval requests and notifications.
    pub description: String,

    /// Optional telemetry about impact and urgency.
    pub metadata: ActionMetadata,

    /// Arbitrary engine-specific parameters. The boundary checker inspects
    /// well-known keys ("token", "target", "paths", …); everything else is
    /// carried through untouched.
    pub params: serde_json::Value,
}

impl Action {
    /// Create an action with default metadata and no parameters.
    pub fn new(
        kind: impl Into<String>,
        engine: impl Into<String>,
        category: ActionCategory,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: ActionId::new(),
            kind: kind.into(),
            engine: engine.into(),
            category,
            description: description.into(),
            metadata: ActionMetadata::default(),
            params: serde_json::Value::Null,
        }
    }

    /// Replace the metadata block.
    pub fn with_metadata(mut self, metadata: ActionMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Replace the engine-specific parameters.
    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }

    /// Fetch a string parameter by key, if present.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_str())
    }

    /// Fetch a numeric parameter by key, if present.
    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.params.get(key).and_then(|v| v.as_f64())
    }
}

//! Governance configuration schema.
//!
//! `GovernanceConfig` is one immutable value covering every tunable in the
//! engine. Each section deserializes independently with full defaults, so a
//! config file only has to name the fields it overrides. Construct either
//! via [`GovernanceConfig::builder`] (explicit section merge, no reflection)
//! or by deserializing TOML through `warden-policy`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::action::ActionCategory;

/// How aggressively the router auto-executes, 1–4.
///
/// - **Manual (1)**: every action queues for approval.
/// - **Bounded (2)**: safe/low risk auto-executes, trading still queues
///   unless explicitly scheduled.
/// - **Supervised (3)**: up to medium risk auto-executes.
/// - **Full (4)**: everything auto-executes except critical risk.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AutonomyLevel {
    Manual,
    Bounded,
    Supervised,
    Full,
}

impl AutonomyLevel {
    /// Map the numeric 1–4 setting onto a level. Out-of-range values fall
    /// back to `Manual`, the most conservative level.
    pub fn from_u8(v: u8) -> Self {
        match v {
            2 => Self::Bounded,
            3 => Self::Supervised,
            4 => Self::Full,
            _ => Self::Manual,
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Manual => 1,
            Self::Bounded => 2,
            Self::Supervised => 3,
            Self::Full => 4,
        }
    }
}

impl Default for AutonomyLevel {
    fn default() -> Self {
        Self::Manual
    }
}

impl std::fmt::Display for AutonomyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Manual => "manual",
            Self::Bounded => "bounded",
            Self::Supervised => "supervised",
            Self::Full => "full",
        };
        write!(f, "L{} ({})", self.as_u8(), name)
    }
}

// ── Risk classification ───────────────────────────────────────────────────────

/// Per-factor weights for single-action classification. Must sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorWeights {
    pub financial: f64,
    pub reversibility: f64,
    pub category: f64,
    pub urgency: f64,
    pub visibility: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            financial: 0.30,
            reversibility: 0.25,
            category: 0.20,
            urgency: 0.15,
            visibility: 0.10,
        }
    }
}

/// The four ascending score boundaries mapping a 0–100 score onto the
/// risk ladder: below `low` is safe, below `medium` is low, and so on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelBoundaries {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for LevelBoundaries {
    fn default() -> Self {
        Self {
            low: 20.0,
            medium: 40.0,
            high: 60.0,
            critical: 80.0,
        }
    }
}

/// The four ascending value thresholds bucketing estimated monetary impact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialThresholds {
    pub minor: f64,
    pub moderate: f64,
    pub significant: f64,
    pub major: f64,
}

impl Default for FinancialThresholds {
    fn default() -> Self {
        Self {
            minor: 10.0,
            moderate: 100.0,
            significant: 1_000.0,
            major: 10_000.0,
        }
    }
}

/// Configuration for the single-action risk classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub weights: FactorWeights,
    pub boundaries: LevelBoundaries,
    pub financial: FinancialThresholds,

    /// Per-category base-risk overrides. Categories not listed here use
    /// the built-in total mapping.
    pub category_overrides: HashMap<ActionCategory, f64>,

    /// Action kinds that always receive an auto-execute recommendation.
    pub safe_kinds: Vec<String>,

    /// Action kinds that always receive an escalate recommendation.
    pub dangerous_kinds: Vec<String>,

    /// Substrings of an action kind that mark it as publicly visible.
    pub public_keywords: Vec<String>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            weights: FactorWeights::default(),
            boundaries: LevelBoundaries::default(),
            financial: FinancialThresholds::default(),
            category_overrides: HashMap::new(),
            safe_kinds: Vec::new(),
            dangerous_kinds: Vec::new(),
            public_keywords: ["post", "tweet", "publish", "announce", "broadcast"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

// ── Pipeline classification ───────────────────────────────────────────────────

/// Per-factor weights for pipeline classification. Must sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineFactorWeights {
    pub tool_risk: f64,
    pub combinations: f64,
    pub complexity: f64,
    pub data_flow: f64,
    pub declared: f64,
}

impl Default for PipelineFactorWeights {
    fn default() -> Self {
        Self {
            tool_risk: 0.35,
            combinations: 0.30,
            complexity: 0.10,
            data_flow: 0.10,
            declared: 0.15,
        }
    }
}

/// Configuration for the pipeline risk classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineRiskConfig {
    pub weights: PipelineFactorWeights,

    /// Base risk score per tool name.
    pub tool_risk: HashMap<String, f64>,

    /// Score assigned to tools absent from `tool_risk`. Unknown tools are
    /// also reported in the assessment's constraints so they are caught at
    /// the boundary rather than silently defaulted.
    pub unknown_tool_score: f64,

    /// Tool sets considered dangerous in combination. A combination fires
    /// when the pipeline's tool set is a superset of it.
    pub dangerous_combinations: Vec<Vec<String>>,

    /// Step count above which a pipeline picks up extra complexity score.
    pub review_step_threshold: usize,

    /// Terms whose presence in serialized step inputs marks sensitive
    /// data flow.
    pub sensitive_terms: Vec<String>,
}

impl Default for PipelineRiskConfig {
    fn default() -> Self {
        let tool_risk = [
            ("data_reader", 20.0),
            ("http_fetch", 30.0),
            ("file_writer", 45.0),
            ("social_agent", 50.0),
            ("config_writer", 60.0),
            ("deploy_agent", 75.0),
            ("trading_agent", 80.0),
            ("wallet_agent", 85.0),
            ("shell_exec", 90.0),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect();

        let dangerous_combinations = vec![
            vec!["wallet_agent".to_string(), "trading_agent".to_string()],
            vec!["wallet_agent".to_string(), "social_agent".to_string()],
            vec!["deploy_agent".to_string(), "config_writer".to_string()],
            vec!["shell_exec".to_string(), "http_fetch".to_string()],
        ];

        Self {
            weights: PipelineFactorWeights::default(),
            tool_risk,
            unknown_tool_score: 50.0,
            dangerous_combinations,
            review_step_threshold: 5,
            sensitive_terms: [
                "wallet", "key", "secret", "transfer", "deploy", "private", "password",
                "credential", "seed",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

// ── Boundaries ────────────────────────────────────────────────────────────────

/// Limits applied to trading actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingLimits {
    pub max_daily_trades: u32,
    /// Engines allowed to trade. Empty means any engine.
    pub allowed_bots: Vec<String>,
    /// Tokens allowed to be traded. Empty means any token.
    pub allowed_tokens: Vec<String>,
    /// Largest position as a percentage of the portfolio.
    pub max_position_pct: f64,
    /// Largest single trade value.
    pub max_trade_value: f64,
}

impl Default for TradingLimits {
    fn default() -> Self {
        Self {
            max_daily_trades: 10,
            allowed_bots: Vec::new(),
            allowed_tokens: Vec::new(),
            max_position_pct: 5.0,
            max_trade_value: 500.0,
        }
    }
}

/// Limits applied to content actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentLimits {
    pub max_daily_posts: u32,
    pub max_weekly_posts: u32,
    /// Topics that may never appear in autonomous content.
    pub restricted_topics: Vec<String>,
}

impl Default for ContentLimits {
    fn default() -> Self {
        Self {
            max_daily_posts: 5,
            max_weekly_posts: 20,
            restricted_topics: ["politics", "medical advice", "financial advice"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Limits applied to build actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildLimits {
    pub max_daily_builds: u32,
    /// Largest change (in lines) eligible for auto-commit.
    pub max_auto_lines: u32,
    /// Largest change (in files) eligible for auto-commit.
    pub max_auto_files: u32,
    /// Path prefixes autonomous changes may never touch.
    pub restricted_paths: Vec<String>,
}

impl Default for BuildLimits {
    fn default() -> Self {
        Self {
            max_daily_builds: 20,
            max_auto_lines: 500,
            max_auto_files: 10,
            restricted_paths: [".github/", "secrets/", "infra/prod/"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Limits applied to deployment actions.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentLimits {
    /// Production deployments are a hard violation unless this is set.
    pub allow_production: bool,
    /// Staging deployments draw a soft warning when this is unset.
    pub staging_enabled: bool,
}

/// Spending ceilings applied to every action regardless of category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SpendingLimits {
    /// Expense at or below this auto-approves without comment.
    pub auto_approve_ceiling: f64,
    /// Expense above this is a hard violation; between the two ceilings it
    /// draws a warning.
    pub approval_ceiling: f64,
    /// Cap on projected total spend per calendar day.
    pub daily_cap: f64,
}

impl Default for SpendingLimits {
    fn default() -> Self {
        Self {
            auto_approve_ceiling: 50.0,
            approval_ceiling: 5_000.0,
            daily_cap: 2_000.0,
        }
    }
}

/// A daily time window during which non-critical actions draw a warning.
///
/// The window may wrap midnight (`start_hour > end_hour`), e.g. 22–6.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct QuietHours {
    pub enabled: bool,
    /// Hour of day (0–23, UTC) the window opens.
    pub start_hour: u32,
    /// Hour of day (0–23, UTC) the window closes (exclusive).
    pub end_hour: u32,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            enabled: true,
            start_hour: 22,
            end_hour: 6,
        }
    }
}

/// All configured boundary limits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    pub trading: TradingLimits,
    pub content: ContentLimits,
    pub build: BuildLimits,
    pub deployment: DeploymentLimits,
    pub spending: SpendingLimits,
    pub quiet_hours: QuietHours,
}

// ── Queue, notifications, audit retention ─────────────────────────────────────

/// Approval queue capacity and age thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Hard cap on pending requests. The lowest-priority pending request
    /// is evicted when an insert would exceed it.
    pub max_pending: usize,
    /// Hours until an unreviewed request expires.
    pub expires_after_hours: i64,
    /// Hours of age after which a pending request is escalated.
    pub escalate_after_hours: i64,
    /// Hours of age after which a pending request is auto-rejected.
    pub auto_reject_after_hours: i64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_pending: 50,
            expires_after_hours: 24,
            escalate_after_hours: 4,
            auto_reject_after_hours: 48,
        }
    }
}

/// Notification fan-out configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Channel names notifications are delivered to. Registered channels
    /// not named here are skipped.
    pub channels: Vec<String>,
    /// Sliding one-minute cap; messages beyond it are dropped, not queued.
    pub max_per_minute: u32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            max_per_minute: 10,
        }
    }
}

/// Audit ledger retention policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    /// Entries older than this many days are pruned. `None` keeps all.
    pub max_age_days: Option<u32>,
    /// The in-memory ledger is trimmed to this many entries, oldest first.
    pub max_entries: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_age_days: Some(90),
            max_entries: 10_000,
        }
    }
}

// ── Top-level config ──────────────────────────────────────────────────────────

/// The complete, immutable configuration of the governance engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    pub autonomy: AutonomyLevel,
    pub risk: RiskConfig,
    pub pipeline: PipelineRiskConfig,
    pub boundaries: BoundaryConfig,
    pub queue: QueueConfig,
    pub notifications: NotificationConfig,
    pub retention: RetentionPolicy,
}

impl GovernanceConfig {
    /// Start building a configuration from defaults.
    pub fn builder() -> GovernanceConfigBuilder {
        GovernanceConfigBuilder::default()
    }
}

/// Explicit section-by-section builder for `GovernanceConfig`.
///
/// Each setter replaces one named section; `build()` fills every section
/// not set from its default. This is the deliberate alternative to a
/// recursive deep-merge: what you pass is what you get, field for field.
#[derive(Debug, Default)]
pub struct GovernanceConfigBuilder {
    autonomy: Option<AutonomyLevel>,
    risk: Option<RiskConfig>,
    pipeline: Option<PipelineRiskConfig>,
    boundaries: Option<BoundaryConfig>,
    queue: Option<QueueConfig>,
    notifications: Option<NotificationConfig>,
    retention: Option<RetentionPolicy>,
}

impl GovernanceConfigBuilder {
    pub fn autonomy(mut self, level: AutonomyLevel) -> Self {
        self.autonomy = Some(level);
        self
    }

    pub fn risk(mut self, risk: RiskConfig) -> Self {
        self.risk = Some(risk);
        self
    }

    pub fn pipeline(mut self, pipeline: PipelineRiskConfig) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn boundaries(mut self, boundaries: BoundaryConfig) -> Self {
        self.boundaries = Some(boundaries);
        self
    }

    pub fn queue(mut self, queue: QueueConfig) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn notifications(mut self, notifications: NotificationConfig) -> Self {
        self.notifications = Some(notifications);
        self
    }

    pub fn retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = Some(retention);
        self
    }

    /// Produce the immutable configuration, defaulting unset sections.
    pub fn build(self) -> GovernanceConfig {
        GovernanceConfig {
            autonomy: self.autonomy.unwrap_or_default(),
            risk: self.risk.unwrap_or_default(),
            pipeline: self.pipeline.unwrap_or_default(),
            boundaries: self.boundaries.unwrap_or_default(),
            queue: self.queue.unwrap_or_default(),
            notifications: self.notifications.unwrap_or_default(),
            retention: self.retention.unwrap_or_default(),
        }
    }
}

//! Boundary enforcement over running daily usage counters.
//!
//! The checker never fails and never blocks: every outcome is expressed as
//! violation (hard, blocks execution) or warning (soft, informational)
//! strings inside a `BoundaryCheckResult`. Missing telemetry is treated as
//! neutral, not as an error.
//!
//! Usage counters are keyed by an integer day index — whole days since the
//! Unix epoch, UTC — so the day boundary is a plain integer rollover with
//! no string parsing or timezone ambiguity.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Timelike, Utc};
use tracing::{debug, warn};

use warden_contracts::{
    action::{Action, ActionCategory, Urgency},
    boundary::{BoundaryCheckResult, UsageSnapshot},
    config::{BoundaryConfig, QuietHours},
    risk::RiskLevel,
};
use warden_core::traits::BoundaryGuard;

/// Whole days since the Unix epoch, UTC.
fn day_index(now: DateTime<Utc>) -> i64 {
    now.timestamp().div_euclid(86_400)
}

/// One calendar day's usage counters. Counters only ever increase within a
/// day; a new day index simply starts a fresh bucket.
#[derive(Debug, Default, Clone, Copy)]
struct DayUsage {
    trades: u32,
    posts: u32,
    builds: u32,
    spend: f64,
}

/// All recorded usage, keyed by day index. Ordered so trailing-window
/// queries (weekly post cap) stay simple.
#[derive(Debug, Default)]
struct UsageLedger {
    days: BTreeMap<i64, DayUsage>,
}

impl UsageLedger {
    fn day(&self, day: i64) -> DayUsage {
        self.days.get(&day).copied().unwrap_or_default()
    }

    /// Posts over the trailing 7-day window ending at `day` (inclusive).
    fn posts_in_week(&self, day: i64) -> u32 {
        self.days
            .range(day - 6..=day)
            .map(|(_, usage)| usage.posts)
            .sum()
    }
}

/// Enforces the configured per-category and global limits.
///
/// # Thread safety
///
/// The ledger sits behind a `Mutex`; `check` and `record_usage` serialize
/// on it, so concurrent routing and execution recording cannot lose
/// updates.
pub struct BoundaryChecker {
    config: BoundaryConfig,
    ledger: Mutex<UsageLedger>,
}

impl BoundaryChecker {
    pub fn new(config: BoundaryConfig) -> Self {
        Self {
            config,
            ledger: Mutex::new(UsageLedger::default()),
        }
    }

    /// Check `action` against every applicable limit at an explicit clock
    /// reading. Production callers go through the `BoundaryGuard` impl,
    /// which pins `now` to `Utc::now()`.
    pub fn check_at(
        &self,
        action: &Action,
        level: RiskLevel,
        now: DateTime<Utc>,
    ) -> BoundaryCheckResult {
        let mut violations = Vec::new();
        let mut warnings = Vec::new();

        let today = day_index(now);
        let (usage, weekly_posts) = {
            let ledger = self.ledger.lock().expect("usage ledger lock poisoned");
            (ledger.day(today), ledger.posts_in_week(today))
        };

        match action.category {
            ActionCategory::Trading => {
                self.check_trading(action, usage, &mut violations);
            }
            ActionCategory::Content => {
                self.check_content(action, usage, weekly_posts, &mut violations);
            }
            ActionCategory::Build => {
                self.check_build(action, usage, &mut violations);
            }
            ActionCategory::Deployment => {
                self.check_deployment(action, &mut violations, &mut warnings);
            }
            ActionCategory::Configuration => {}
        }

        self.check_global(action, level, usage, now, &mut violations, &mut warnings);

        if !violations.is_empty() {
            warn!(
                action_id = %action.id,
                category = %action.category,
                violations = violations.len(),
                "boundary violations"
            );
        } else {
            debug!(action_id = %action.id, "boundaries passed");
        }

        BoundaryCheckResult::new(
            violations,
            warnings,
            UsageSnapshot {
                day: today,
                trades: usage.trades,
                posts: usage.posts,
                builds: usage.builds,
                spend: usage.spend,
            },
        )
    }

    /// Record one executed action at an explicit clock reading.
    pub fn record_usage_at(&self, action: &Action, now: DateTime<Utc>) {
        let mut ledger = self.ledger.lock().expect("usage ledger lock poisoned");
        let usage = ledger.days.entry(day_index(now)).or_default();

        match action.category {
            ActionCategory::Trading => usage.trades += 1,
            ActionCategory::Content => usage.posts += 1,
            ActionCategory::Build => usage.builds += 1,
            ActionCategory::Deployment | ActionCategory::Configuration => {}
        }
        if let Some(value) = action.metadata.estimated_value {
            usage.spend += value;
        }

        debug!(
            action_id = %action.id,
            category = %action.category,
            "usage recorded"
        );
    }

    // ── Category rules ───────────────────────────────────────────────────────

    fn check_trading(&self, action: &Action, usage: DayUsage, violations: &mut Vec<String>) {
        let limits = &self.config.trading;

        if usage.trades >= limits.max_daily_trades {
            violations.push(format!(
                "Daily trade limit of {} reached",
                limits.max_daily_trades
            ));
        }

        if !limits.allowed_bots.is_empty() && !limits.allowed_bots.contains(&action.engine) {
            violations.push(format!(
                "Bot '{}' is not on the trading allow-list",
                action.engine
            ));
        }

        if let Some(token) = action.param_str("token") {
            if !limits.allowed_tokens.is_empty()
                && !limits.allowed_tokens.iter().any(|t| t == token)
            {
                violations.push(format!("Token '{}' is not on the allowed token list", token));
            }
        }

        if let Some(pct) = action.param_f64("position_pct") {
            if pct > limits.max_position_pct {
                violations.push(format!(
                    "Position {:.1}% exceeds the {:.1}% portfolio limit",
                    pct, limits.max_position_pct
                ));
            }
        }

        if let Some(value) = action.metadata.estimated_value {
            if value > limits.max_trade_value {
                violations.push(format!(
                    "Trade size ${} exceeds max ${}",
                    value, limits.max_trade_value
                ));
            }
        }
    }

    fn check_content(
        &self,
        action: &Action,
        usage: DayUsage,
        weekly_posts: u32,
        violations: &mut Vec<String>,
    ) {
        let limits = &self.config.content;

        if usage.posts >= limits.max_daily_posts {
            violations.push(format!(
                "Daily post limit of {} reached",
                limits.max_daily_posts
            ));
        }

        if weekly_posts >= limits.max_weekly_posts {
            violations.push(format!(
                "Weekly post limit of {} reached",
                limits.max_weekly_posts
            ));
        }

        let mut text = action.description.to_lowercase();
        if let Some(title) = action.param_str("title") {
            text.push(' ');
            text.push_str(&title.to_lowercase());
        }
        for topic in &limits.restricted_topics {
            if text.contains(&topic.to_lowercase()) {
                violations.push(format!("Content touches restricted topic '{}'", topic));
            }
        }
    }

    fn check_build(&self, action: &Action, usage: DayUsage, violations: &mut Vec<String>) {
        let limits = &self.config.build;

        if usage.builds >= limits.max_daily_builds {
            violations.push(format!(
                "Daily build limit of {} reached",
                limits.max_daily_builds
            ));
        }

        if let Some(lines) = action.metadata.lines_changed {
            if lines > limits.max_auto_lines {
                violations.push(format!(
                    "Change of {} lines exceeds the {}-line auto-commit limit",
                    lines, limits.max_auto_lines
                ));
            }
        }

        if let Some(files) = action.metadata.files_changed {
            if files > limits.max_auto_files {
                violations.push(format!(
                    "Change of {} files exceeds the {}-file auto-commit limit",
                    files, limits.max_auto_files
                ));
            }
        }

        if let Some(paths) = action.params.get("paths").and_then(|v| v.as_array()) {
            for path in paths.iter().filter_map(|p| p.as_str()) {
                if let Some(prefix) = limits
                    .restricted_paths
                    .iter()
                    .find(|prefix| path.starts_with(prefix.as_str()))
                {
                    violations.push(format!(
                        "Path '{}' is under restricted prefix '{}'",
                        path, prefix
                    ));
                }
            }
        }
    }

    fn check_deployment(
        &self,
        action: &Action,
        violations: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) {
        let limits = &self.config.deployment;
        let target = action.param_str("target").unwrap_or("staging");

        if target == "production" && !limits.allow_production {
            violations.push(
                "Production deployment requires explicit opt-in (allow_production)".to_string(),
            );
        } else if target == "staging" && !limits.staging_enabled {
            warnings.push("Staging deployments are currently disabled in config".to_string());
        }
    }

    // ── Global rules ─────────────────────────────────────────────────────────

    fn check_global(
        &self,
        action: &Action,
        level: RiskLevel,
        usage: DayUsage,
        now: DateTime<Utc>,
        violations: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) {
        let spending = &self.config.spending;

        if let Some(value) = action.metadata.estimated_value {
            if value > spending.approval_ceiling {
                violations.push(format!(
                    "Expense ${} exceeds the approval ceiling ${}",
                    value, spending.approval_ceiling
                ));
            } else if value > spending.auto_approve_ceiling {
                warnings.push(format!(
                    "Expense ${} is above the auto-approve ceiling ${}",
                    value, spending.auto_approve_ceiling
                ));
            }

            let projected = usage.spend + value;
            if projected > spending.daily_cap {
                violations.push(format!(
                    "Projected daily spend ${} exceeds the ${} daily cap",
                    projected, spending.daily_cap
                ));
            } else if projected >= 0.8 * spending.daily_cap {
                warnings.push(format!(
                    "Projected daily spend ${} is at {:.0}% of the daily cap",
                    projected,
                    100.0 * projected / spending.daily_cap
                ));
            }
        } else {
            warnings.push("No estimated value provided; spend checks skipped".to_string());
        }

        if action.metadata.urgency != Urgency::Critical
            && in_quiet_hours(&self.config.quiet_hours, now)
        {
            warnings.push(format!(
                "Action falls inside quiet hours ({:02}:00-{:02}:00 UTC)",
                self.config.quiet_hours.start_hour, self.config.quiet_hours.end_hour
            ));
        }

        if level == RiskLevel::Critical {
            violations.push("Risk level critical blocks autonomous execution".to_string());
        }
    }
}

/// True when `now` falls inside the configured quiet window.
///
/// The window may wrap midnight (start > end, e.g. 22–6). The wrap case
/// must stay an explicit `||` branch: `hour >= start || hour < end` is
/// correct for wrap-around windows and must not be "simplified" into the
/// non-wrapping comparison.
fn in_quiet_hours(quiet: &QuietHours, now: DateTime<Utc>) -> bool {
    if !quiet.enabled {
        return false;
    }
    let hour = now.hour();
    if quiet.start_hour <= quiet.end_hour {
        hour >= quiet.start_hour && hour < quiet.end_hour
    } else {
        hour >= quiet.start_hour || hour < quiet.end_hour
    }
}

impl BoundaryGuard for BoundaryChecker {
    fn check(&self, action: &Action, level: RiskLevel) -> BoundaryCheckResult {
        self.check_at(action, level, Utc::now())
    }

    fn record_usage(&self, action: &Action) {
        self.record_usage_at(action, Utc::now());
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use warden_contracts::{
        action::{ActionMetadata, Urgency},
        config::{ContentLimits, DeploymentLimits, QuietHours, SpendingLimits, TradingLimits},
    };

    use super::*;

    // ── Helpers ──────────────────────────────────────────────────────────────

    /// Midday UTC, far from quiet hours and day boundaries.
    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn checker() -> BoundaryChecker {
        BoundaryChecker::new(BoundaryConfig::default())
    }

    fn trade(value: f64) -> Action {
        Action::new("execute_trade", "momentum-bot", ActionCategory::Trading, "buy")
            .with_metadata(ActionMetadata {
                estimated_value: Some(value),
                ..ActionMetadata::default()
            })
    }

    fn post(description: &str) -> Action {
        Action::new("post_tweet", "social-bot", ActionCategory::Content, description)
    }

    // ── Trading ──────────────────────────────────────────────────────────────

    /// The canonical oversized-trade violation, message pinned.
    #[test]
    fn oversized_trade_reports_exact_violation() {
        let result = checker().check_at(&trade(5000.0), RiskLevel::High, noon());

        assert!(!result.passed);
        assert!(
            result.violations.iter().any(|v| v.contains("exceeds $500")),
            "expected an 'exceeds $500' violation, got: {:?}",
            result.violations
        );
        assert!(result
            .violations
            .iter()
            .any(|v| v == "Trade size $5000 exceeds max $500"));
    }

    #[test]
    fn trade_within_limits_passes() {
        let result = checker().check_at(&trade(40.0), RiskLevel::Low, noon());
        assert!(result.passed, "violations: {:?}", result.violations);
    }

    #[test]
    fn daily_trade_cap_blocks_after_limit() {
        let checker = BoundaryChecker::new(BoundaryConfig {
            trading: TradingLimits {
                max_daily_trades: 2,
                ..TradingLimits::default()
            },
            ..BoundaryConfig::default()
        });

        let action = trade(10.0);
        checker.record_usage_at(&action, noon());
        checker.record_usage_at(&action, noon());

        let result = checker.check_at(&action, RiskLevel::Low, noon());
        assert!(result
            .violations
            .iter()
            .any(|v| v.contains("Daily trade limit of 2")));
    }

    #[test]
    fn unknown_bot_violates_allow_list() {
        let checker = BoundaryChecker::new(BoundaryConfig {
            trading: TradingLimits {
                allowed_bots: vec!["dca-bot".to_string()],
                ..TradingLimits::default()
            },
            ..BoundaryConfig::default()
        });

        let result = checker.check_at(&trade(10.0), RiskLevel::Low, noon());
        assert!(result
            .violations
            .iter()
            .any(|v| v.contains("'momentum-bot' is not on the trading allow-list")));
    }

    #[test]
    fn disallowed_token_is_a_violation() {
        let checker = BoundaryChecker::new(BoundaryConfig {
            trading: TradingLimits {
                allowed_tokens: vec!["SOL".to_string(), "USDC".to_string()],
                ..TradingLimits::default()
            },
            ..BoundaryConfig::default()
        });

        let action = trade(10.0).with_params(serde_json::json!({ "token": "SHIB" }));
        let result = checker.check_at(&action, RiskLevel::Low, noon());
        assert!(result.violations.iter().any(|v| v.contains("'SHIB'")));
    }

    // ── Content ──────────────────────────────────────────────────────────────

    #[test]
    fn restricted_topic_is_a_violation() {
        let result = checker().check_at(
            &post("Hot take on politics tonight"),
            RiskLevel::Safe,
            noon(),
        );
        assert!(result
            .violations
            .iter()
            .any(|v| v.contains("restricted topic 'politics'")));
    }

    #[test]
    fn weekly_post_cap_counts_trailing_window() {
        let checker = BoundaryChecker::new(BoundaryConfig {
            content: ContentLimits {
                max_daily_posts: 10,
                max_weekly_posts: 3,
                restricted_topics: vec![],
            },
            ..BoundaryConfig::default()
        });

        // Three posts spread over the previous three days.
        for days_ago in 1..=3 {
            let then = noon() - chrono::Duration::days(days_ago);
            checker.record_usage_at(&post("update"), then);
        }

        let result = checker.check_at(&post("another update"), RiskLevel::Safe, noon());
        assert!(result
            .violations
            .iter()
            .any(|v| v.contains("Weekly post limit of 3")));
    }

    // ── Build ────────────────────────────────────────────────────────────────

    #[test]
    fn oversized_change_exceeds_auto_commit_limit() {
        let action = Action::new("auto_commit", "ci-bot", ActionCategory::Build, "refactor")
            .with_metadata(ActionMetadata {
                lines_changed: Some(1200),
                files_changed: Some(3),
                ..ActionMetadata::default()
            });

        let result = checker().check_at(&action, RiskLevel::Medium, noon());
        assert!(result
            .violations
            .iter()
            .any(|v| v.contains("1200 lines exceeds the 500-line auto-commit limit")));
    }

    #[test]
    fn restricted_path_prefix_is_a_violation() {
        let action = Action::new("auto_commit", "ci-bot", ActionCategory::Build, "tweak ci")
            .with_params(serde_json::json!({ "paths": [".github/workflows/deploy.yml"] }));

        let result = checker().check_at(&action, RiskLevel::Medium, noon());
        assert!(result
            .violations
            .iter()
            .any(|v| v.contains("restricted prefix '.github/'")));
    }

    // ── Deployment ───────────────────────────────────────────────────────────

    #[test]
    fn production_deploy_without_opt_in_is_hard_violation() {
        let action = Action::new("deploy", "deploy-bot", ActionCategory::Deployment, "ship it")
            .with_params(serde_json::json!({ "target": "production" }));

        let result = checker().check_at(&action, RiskLevel::Medium, noon());
        assert!(result
            .violations
            .iter()
            .any(|v| v.contains("Production deployment requires explicit opt-in")));
    }

    #[test]
    fn production_deploy_with_opt_in_passes() {
        let checker = BoundaryChecker::new(BoundaryConfig {
            deployment: DeploymentLimits {
                allow_production: true,
                staging_enabled: true,
            },
            ..BoundaryConfig::default()
        });

        let action = Action::new("deploy", "deploy-bot", ActionCategory::Deployment, "ship it")
            .with_params(serde_json::json!({ "target": "production" }));

        let result = checker.check_at(&action, RiskLevel::Medium, noon());
        assert!(result.passed, "violations: {:?}", result.violations);
    }

    #[test]
    fn staging_deploy_while_disabled_is_soft_warning() {
        let action = Action::new("deploy", "deploy-bot", ActionCategory::Deployment, "stage it")
            .with_params(serde_json::json!({ "target": "staging" }));

        let result = checker().check_at(&action, RiskLevel::Low, noon());
        assert!(result.passed);
        assert!(result.warnings.iter().any(|w| w.contains("Staging")));
    }

    // ── Global ───────────────────────────────────────────────────────────────

    #[test]
    fn critical_risk_is_a_hard_violation() {
        let result = checker().check_at(&post("harmless"), RiskLevel::Critical, noon());
        assert!(result
            .violations
            .iter()
            .any(|v| v.contains("critical blocks autonomous execution")));
    }

    #[test]
    fn daily_spend_cap_projects_todays_usage() {
        let checker = BoundaryChecker::new(BoundaryConfig {
            spending: SpendingLimits {
                daily_cap: 100.0,
                approval_ceiling: 5_000.0,
                auto_approve_ceiling: 50.0,
            },
            ..BoundaryConfig::default()
        });

        checker.record_usage_at(&trade(90.0), noon());

        let result = checker.check_at(&trade(20.0), RiskLevel::Low, noon());
        assert!(result
            .violations
            .iter()
            .any(|v| v.contains("exceeds the $100 daily cap")));
    }

    #[test]
    fn missing_value_warns_instead_of_failing() {
        let action = Action::new("execute_trade", "bot", ActionCategory::Trading, "blind trade");
        let result = checker().check_at(&action, RiskLevel::Low, noon());

        assert!(result.passed);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("No estimated value provided")));
    }

    // ── Quiet hours ──────────────────────────────────────────────────────────

    /// The wrap-around window (22–6) must match both sides of midnight.
    #[test]
    fn quiet_hours_wrap_midnight() {
        let quiet = QuietHours {
            enabled: true,
            start_hour: 22,
            end_hour: 6,
        };

        let late = Utc.with_ymd_and_hms(2025, 3, 10, 23, 0, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2025, 3, 10, 3, 0, 0).unwrap();
        let midday = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();

        assert!(in_quiet_hours(&quiet, late));
        assert!(in_quiet_hours(&quiet, early));
        assert!(!in_quiet_hours(&quiet, midday));
    }

    #[test]
    fn quiet_hours_non_wrapping_window() {
        let quiet = QuietHours {
            enabled: true,
            start_hour: 9,
            end_hour: 17,
        };

        let inside = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let outside = Utc.with_ymd_and_hms(2025, 3, 10, 20, 0, 0).unwrap();

        assert!(in_quiet_hours(&quiet, inside));
        assert!(!in_quiet_hours(&quiet, outside));
    }

    #[test]
    fn critical_urgency_skips_quiet_hours_warning() {
        let late = Utc.with_ymd_and_hms(2025, 3, 10, 23, 30, 0).unwrap();

        let urgent = post("incident update").with_metadata(ActionMetadata {
            urgency: Urgency::Critical,
            ..ActionMetadata::default()
        });
        let result = checker().check_at(&urgent, RiskLevel::Low, late);
        assert!(!result.warnings.iter().any(|w| w.contains("quiet hours")));

        let routine = post("routine update");
        let result = checker().check_at(&routine, RiskLevel::Low, late);
        assert!(result.warnings.iter().any(|w| w.contains("quiet hours")));
    }

    // ── Day boundary ─────────────────────────────────────────────────────────

    #[test]
    fn usage_resets_at_day_boundary() {
        let checker = checker();
        let action = trade(10.0);

        checker.record_usage_at(&action, noon());
        checker.record_usage_at(&action, noon());

        let today = checker.check_at(&action, RiskLevel::Low, noon());
        assert_eq!(today.usage.trades, 2);

        // The next day's bucket starts from zero.
        let tomorrow = noon() + chrono::Duration::days(1);
        let result = checker.check_at(&action, RiskLevel::Low, tomorrow);
        assert_eq!(result.usage.trades, 0);
        assert!((result.usage.spend - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn record_usage_increments_matching_counter_only() {
        let checker = checker();

        checker.record_usage_at(&trade(25.0), noon());
        checker.record_usage_at(&post("hello"), noon());

        let snapshot = checker.check_at(&trade(1.0), RiskLevel::Low, noon()).usage;
        assert_eq!(snapshot.trades, 1);
        assert_eq!(snapshot.posts, 1);
        assert_eq!(snapshot.builds, 0);
        assert!((snapshot.spend - 25.0).abs() < 1e-9);
    }
}

//! TOML loading for the governance configuration.
//!
//! The schema itself lives in `warden_contracts::config`; this module only
//! parses. Every section and field carries a default, so a config file
//! names just the values it overrides:
//!
//! ```toml
//! autonomy = "supervised"
//!
//! [boundaries.trading]
//! max_trade_value = 250.0
//!
//! [queue]
//! max_pending = 25
//! ```

use std::path::Path;

use warden_contracts::{
    config::GovernanceConfig,
    error::{WardenError, WardenResult},
};

/// Parse `s` as a TOML governance configuration.
///
/// Returns `WardenError::ConfigError` if the TOML is malformed or does not
/// match the `GovernanceConfig` schema.
pub fn from_toml_str(s: &str) -> WardenResult<GovernanceConfig> {
    toml::from_str(s).map_err(|e| WardenError::ConfigError {
        reason: format!("failed to parse governance TOML: {}", e),
    })
}

/// Read the file at `path` and parse it as TOML governance configuration.
pub fn from_file(path: &Path) -> WardenResult<GovernanceConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| WardenError::ConfigError {
        reason: format!("failed to read config file '{}': {}", path.display(), e),
    })?;
    from_toml_str(&contents)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use warden_contracts::config::AutonomyLevel;
    use warden_contracts::error::WardenError;

    use super::*;

    #[test]
    fn empty_toml_is_all_defaults() {
        let config = from_toml_str("").unwrap();

        assert_eq!(config.autonomy, AutonomyLevel::Manual);
        assert_eq!(config.queue.max_pending, 50);
        assert!((config.boundaries.trading.max_trade_value - 500.0).abs() < 1e-9);
    }

    #[test]
    fn partial_overrides_leave_siblings_at_default() {
        let toml = r#"
            autonomy = "supervised"

            [boundaries.trading]
            max_trade_value = 250.0

            [queue]
            max_pending = 25
        "#;

        let config = from_toml_str(toml).unwrap();

        assert_eq!(config.autonomy, AutonomyLevel::Supervised);
        assert!((config.boundaries.trading.max_trade_value - 250.0).abs() < 1e-9);
        // Sibling fields inside the overridden sections keep their defaults.
        assert_eq!(config.boundaries.trading.max_daily_trades, 10);
        assert_eq!(config.queue.expires_after_hours, 24);
    }

    #[test]
    fn risk_lists_parse() {
        let toml = r#"
            [risk]
            safe_kinds = ["health_check", "metrics_snapshot"]
            dangerous_kinds = ["drain_wallet"]
        "#;

        let config = from_toml_str(toml).unwrap();
        assert_eq!(config.risk.safe_kinds, vec!["health_check", "metrics_snapshot"]);
        assert_eq!(config.risk.dangerous_kinds, vec!["drain_wallet"]);
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let result = from_toml_str("this is not valid toml ][[[");

        match result {
            Err(WardenError::ConfigError { reason }) => {
                assert!(
                    reason.contains("failed to parse governance TOML"),
                    "expected parse error message, got: {reason}"
                );
            }
            other => panic!("expected ConfigError, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn missing_file_is_config_error() {
        let result = from_file(Path::new("/nonexistent/warden.toml"));
        assert!(matches!(result, Err(WardenError::ConfigError { .. })));
    }
}

//! Runtime error types for the Warden governance engine.
//!
//! All fallible operations in the engine return `WardenResult<T>`. Expected
//! races — approving a request that just expired, notifying when no channel
//! is enabled — are `Option`/count results, not errors; the variants here
//! cover genuine failures only.

use thiserror::Error;

/// The unified error type for the Warden crates.
#[derive(Debug, Error)]
pub enum WardenError {
    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The audit logger could not append an entry.
    ///
    /// Treated as fatal by the router — a transition that cannot be
    /// audited cannot proceed.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// A notification channel refused or failed delivery.
    ///
    /// Isolated per channel: the manager logs this and continues with
    /// the remaining channels.
    #[error("notification via '{channel}' failed: {reason}")]
    NotificationFailed { channel: String, reason: String },

    /// A submitted pipeline is structurally unsound (empty, dangling
    /// dependency edge, or dependency cycle).
    #[error("invalid pipeline: {reason}")]
    InvalidPipeline { reason: String },
}

/// Convenience alias used throughout the Warden crates.
pub type WardenResult<T> = Result<T, WardenError>;

//! Channel-agnostic notification payload types.
//!
//! The notification manager formats one `NotificationMessage` per event and
//! fans it out to every enabled channel; actual delivery (webhook POST,
//! chat API call) is an external transport behind the channel trait.

use serde::{Deserialize, Serialize};

/// What kind of event a notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ApprovalNeeded,
    Escalation,
    DecisionResult,
    DailySummary,
}

/// A formatted, channel-agnostic notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
}

/// Aggregate figures for the end-of-day summary notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailySummary {
    /// Integer day index (days since the Unix epoch, UTC).
    pub day: i64,
    pub decisions: u32,
    pub auto_executed: u32,
    pub queued: u32,
    pub rejected: u32,
    pub escalated: u32,
    pub total_value: f64,
}

//! Notification formatting, fan-out, and rate limiting.
//!
//! The manager formats one channel-agnostic message per event and delivers
//! it to every enabled channel independently: a failure on one channel is
//! logged and does not prevent delivery attempts on the others. A sliding
//! one-minute window caps total notifications; calls beyond the limit are
//! dropped (logged, never queued or retried).

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use warden_contracts::{
    approval::ApprovalRequest,
    config::NotificationConfig,
    decision::Decision,
    notify::{DailySummary, NotificationKind, NotificationMessage},
};
use warden_core::traits::NotificationChannel;

/// Fan-out manager over the registered channels.
pub struct NotificationManager {
    config: NotificationConfig,
    channels: Vec<Box<dyn NotificationChannel>>,
    /// Delivery timestamps within the sliding window, oldest first.
    window: Mutex<VecDeque<DateTime<Utc>>>,
}

impl NotificationManager {
    pub fn new(config: NotificationConfig) -> Self {
        Self {
            config,
            channels: Vec::new(),
            window: Mutex::new(VecDeque::new()),
        }
    }

    /// Register a delivery channel. Only channels named in the configured
    /// channel list actually receive messages.
    pub fn register(&mut self, channel: Box<dyn NotificationChannel>) {
        self.channels.push(channel);
    }

    // ── Message formatting ───────────────────────────────────────────────────

    /// A decision needs human sign-off.
    pub fn notify_approval_needed(&self, request: &ApprovalRequest) -> usize {
        let decision = &request.decision;
        let message = NotificationMessage {
            kind: NotificationKind::ApprovalNeeded,
            title: format!("Approval needed: {}", decision.action.description),
            body: format!(
                "{} action from '{}' scored {:.0} ({}).\nReason: {}\nPriority {:.1}, expires {}.",
                decision.action.category,
                decision.action.engine,
                decision.assessment.score,
                decision.assessment.level,
                decision.reason,
                request.priority,
                request.expires_at.format("%Y-%m-%d %H:%M UTC"),
            ),
        };
        self.dispatch_at(message, Utc::now())
    }

    /// A request was escalated (aged out or critical risk).
    pub fn notify_escalation(&self, request: &ApprovalRequest) -> usize {
        let decision = &request.decision;
        let message = NotificationMessage {
            kind: NotificationKind::Escalation,
            title: format!("ESCALATED: {}", decision.action.description),
            body: format!(
                "Pending approval from '{}' needs urgent attention: {} risk, waiting since {}.",
                decision.action.engine,
                decision.assessment.level,
                request.created_at.format("%Y-%m-%d %H:%M UTC"),
            ),
        };
        self.dispatch_at(message, Utc::now())
    }

    /// A decision was resolved (any outcome).
    pub fn notify_decision(&self, decision: &Decision) -> usize {
        let message = NotificationMessage {
            kind: NotificationKind::DecisionResult,
            title: format!("Decision: {} — {}", decision.outcome, decision.action.description),
            body: format!(
                "Outcome {} for {} action from '{}'.\nReason: {}",
                decision.outcome, decision.action.category, decision.action.engine, decision.reason,
            ),
        };
        self.dispatch_at(message, Utc::now())
    }

    /// The end-of-day digest.
    pub fn notify_daily_summary(&self, summary: &DailySummary) -> usize {
        let message = NotificationMessage {
            kind: NotificationKind::DailySummary,
            title: "Daily governance summary".to_string(),
            body: format!(
                "{} decisions: {} auto-executed, {} queued, {} rejected, {} escalated. Total value ${:.2}.",
                summary.decisions,
                summary.auto_executed,
                summary.queued,
                summary.rejected,
                summary.escalated,
                summary.total_value,
            ),
        };
        self.dispatch_at(message, Utc::now())
    }

    // ── Delivery ─────────────────────────────────────────────────────────────

    /// Deliver `message` to every enabled channel at an explicit clock
    /// reading. Returns the number of channels that accepted delivery.
    pub fn dispatch_at(&self, message: NotificationMessage, now: DateTime<Utc>) -> usize {
        if !self.admit(now) {
            warn!(
                kind = ?message.kind,
                title = %message.title,
                limit = self.config.max_per_minute,
                "notification dropped: per-minute rate limit reached"
            );
            return 0;
        }

        let mut delivered = 0;
        for channel in &self.channels {
            if !self.config.channels.iter().any(|c| c == channel.name()) {
                continue;
            }
            match channel.deliver(&message) {
                Ok(()) => {
                    debug!(channel = channel.name(), title = %message.title, "notification delivered");
                    delivered += 1;
                }
                Err(e) => {
                    // One channel's failure never blocks the others.
                    warn!(channel = channel.name(), error = %e, "notification delivery failed");
                }
            }
        }
        delivered
    }

    /// Admit one send against the sliding one-minute window.
    fn admit(&self, now: DateTime<Utc>) -> bool {
        let mut window = self.window.lock().expect("notification window lock poisoned");
        let cutoff = now - Duration::seconds(60);

        while window.front().is_some_and(|t| *t < cutoff) {
            window.pop_front();
        }

        if window.len() >= self.config.max_per_minute as usize {
            return false;
        }
        window.push_back(now);
        true
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::TimeZone;

    use warden_contracts::error::{WardenError, WardenResult};

    use super::*;

    // ── Helpers ──────────────────────────────────────────────────────────────

    /// A channel that counts deliveries and can be told to fail.
    struct MockChannel {
        name: String,
        delivered: Arc<AtomicUsize>,
        fail: bool,
    }

    impl MockChannel {
        fn new(name: &str) -> (Box<Self>, Arc<AtomicUsize>) {
            let delivered = Arc::new(AtomicUsize::new(0));
            (
                Box::new(Self {
                    name: name.to_string(),
                    delivered: delivered.clone(),
                    fail: false,
                }),
                delivered,
            )
        }

        fn failing(name: &str) -> Box<Self> {
            Box::new(Self {
                name: name.to_string(),
                delivered: Arc::new(AtomicUsize::new(0)),
                fail: true,
            })
        }
    }

    impl NotificationChannel for MockChannel {
        fn name(&self) -> &str {
            &self.name
        }

        fn deliver(&self, _message: &NotificationMessage) -> WardenResult<()> {
            if self.fail {
                return Err(WardenError::NotificationFailed {
                    channel: self.name.clone(),
                    reason: "simulated outage".to_string(),
                });
            }
            self.delivered.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
    }

    fn message() -> NotificationMessage {
        NotificationMessage {
            kind: NotificationKind::DecisionResult,
            title: "test".to_string(),
            body: "body".to_string(),
        }
    }

    fn manager_with(channels: Vec<&str>, max_per_minute: u32) -> NotificationManager {
        NotificationManager::new(NotificationConfig {
            channels: channels.iter().map(|s| s.to_string()).collect(),
            max_per_minute,
        })
    }

    // ── Fan-out ──────────────────────────────────────────────────────────────

    #[test]
    fn delivers_to_every_enabled_channel() {
        let mut manager = manager_with(vec!["webhook", "chat"], 10);
        let (webhook, webhook_count) = MockChannel::new("webhook");
        let (chat, chat_count) = MockChannel::new("chat");
        manager.register(webhook);
        manager.register(chat);

        let delivered = manager.dispatch_at(message(), start());

        assert_eq!(delivered, 2);
        assert_eq!(webhook_count.load(Ordering::SeqCst), 1);
        assert_eq!(chat_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disabled_channels_are_skipped() {
        let mut manager = manager_with(vec!["webhook"], 10);
        let (webhook, webhook_count) = MockChannel::new("webhook");
        let (chat, chat_count) = MockChannel::new("chat");
        manager.register(webhook);
        manager.register(chat);

        let delivered = manager.dispatch_at(message(), start());

        assert_eq!(delivered, 1);
        assert_eq!(webhook_count.load(Ordering::SeqCst), 1);
        assert_eq!(chat_count.load(Ordering::SeqCst), 0, "chat is not enabled");
    }

    /// One failing channel never blocks the rest.
    #[test]
    fn channel_failure_is_isolated() {
        let mut manager = manager_with(vec!["flaky", "webhook"], 10);
        manager.register(MockChannel::failing("flaky"));
        let (webhook, webhook_count) = MockChannel::new("webhook");
        manager.register(webhook);

        let delivered = manager.dispatch_at(message(), start());

        assert_eq!(delivered, 1, "the healthy channel still delivers");
        assert_eq!(webhook_count.load(Ordering::SeqCst), 1);
    }

    // ── Rate limiting ────────────────────────────────────────────────────────

    #[test]
    fn over_limit_messages_are_dropped() {
        let mut manager = manager_with(vec!["webhook"], 3);
        let (webhook, webhook_count) = MockChannel::new("webhook");
        manager.register(webhook);

        for _ in 0..5 {
            manager.dispatch_at(message(), start());
        }

        assert_eq!(
            webhook_count.load(Ordering::SeqCst),
            3,
            "only the first three messages within the minute go out"
        );
    }

    #[test]
    fn window_slides_after_a_minute() {
        let mut manager = manager_with(vec!["webhook"], 2);
        let (webhook, webhook_count) = MockChannel::new("webhook");
        manager.register(webhook);

        manager.dispatch_at(message(), start());
        manager.dispatch_at(message(), start());
        // Limit reached inside the window.
        assert_eq!(manager.dispatch_at(message(), start() + Duration::seconds(30)), 0);

        // Both earlier sends fall out of the window.
        let later = start() + Duration::seconds(90);
        assert_eq!(manager.dispatch_at(message(), later), 1);
        assert_eq!(webhook_count.load(Ordering::SeqCst), 3);
    }

    // ── Formatting ───────────────────────────────────────────────────────────

    #[test]
    fn daily_summary_formats_counts() {
        let mut manager = manager_with(vec!["webhook"], 10);
        let (webhook, _) = MockChannel::new("webhook");
        manager.register(webhook);

        let summary = DailySummary {
            day: 20_000,
            decisions: 12,
            auto_executed: 8,
            queued: 2,
            rejected: 1,
            escalated: 1,
            total_value: 420.5,
        };

        assert_eq!(manager.notify_daily_summary(&summary), 1);
    }
}

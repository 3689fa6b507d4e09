//! # warden-audit
//!
//! Immutable, append-only, SHA-256 hash-chained audit ledger for the
//! Warden governance engine.
//!
//! ## Overview
//!
//! Every lifecycle transition the engine records is wrapped in an
//! `AuditEntry` that links to the previous entry via its SHA-256 hash.
//! Tampering with any entry — even a single byte of its payload — breaks
//! the chain and is detected by `verify_integrity`, which reports the
//! index of the first broken entry.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warden_audit::AuditLogger;
//! use warden_contracts::{audit::AuditKind, config::RetentionPolicy};
//!
//! let logger = AuditLogger::new(RetentionPolicy::default());
//! logger.log(AuditKind::ActionReceived, action.id, None, payload)?;
//!
//! let verdict = logger.verify_integrity();
//! assert!(verdict.valid);
//! let ledger = logger.export();
//! ```

pub mod chain;
pub mod logger;

pub use chain::{hash_entry, verify_chain, ChainVerdict};
pub use logger::AuditLogger;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    use warden_contracts::{
        action::ActionId,
        audit::{AuditEntry, AuditKind},
        config::RetentionPolicy,
    };
    use warden_core::traits::AuditSink;

    use super::{AuditLogger, ChainVerdict};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn logger() -> AuditLogger {
        AuditLogger::new(RetentionPolicy {
            max_age_days: None,
            max_entries: 1_000,
        })
    }

    fn log_n(logger: &AuditLogger, n: usize) -> ActionId {
        let action_id = ActionId::new();
        for i in 0..n {
            logger
                .log(
                    AuditKind::DecisionMade,
                    action_id,
                    None,
                    json!({ "step": i }),
                )
                .unwrap();
        }
        action_id
    }

    // ── Chain integrity ───────────────────────────────────────────────────────

    /// An untouched chain of any length verifies, including the empty one.
    #[test]
    fn untouched_chain_is_valid_for_any_length() {
        for n in [0usize, 1, 3, 10] {
            let logger = logger();
            log_n(&logger, n);
            assert_eq!(
                logger.verify_integrity(),
                ChainVerdict::VALID,
                "chain of {n} entries must verify"
            );
        }
    }

    /// Mutating one entry's payload in place reports that exact index.
    #[test]
    fn tampering_reports_first_broken_index() {
        let logger = logger();
        log_n(&logger, 3);

        logger.tamper_payload(1, json!({ "step": "TAMPERED" }));

        let verdict = logger.verify_integrity();
        assert!(!verdict.valid);
        assert_eq!(verdict.broken_at, Some(1));
    }

    #[test]
    fn tampering_the_first_entry_breaks_at_zero() {
        let logger = logger();
        log_n(&logger, 3);

        logger.tamper_payload(0, json!({ "swapped": true }));

        assert_eq!(logger.verify_integrity().broken_at, Some(0));
    }

    /// The first entry links to the genesis sentinel.
    #[test]
    fn first_entry_links_to_genesis() {
        let logger = logger();
        log_n(&logger, 1);

        let entries = logger.export();
        assert_eq!(entries[0].prev_hash, AuditEntry::GENESIS_HASH);
    }

    /// Each entry's prev_hash is the previous entry's hash, and sequences
    /// are gapless from zero.
    #[test]
    fn entries_link_and_sequence_monotonically() {
        let logger = logger();
        log_n(&logger, 5);

        let entries = logger.export();
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.sequence, i as u64);
            if i > 0 {
                assert_eq!(entry.prev_hash, entries[i - 1].hash);
            }
        }
    }

    #[test]
    fn export_returns_all_entries_in_order() {
        let logger = logger();
        let action_id = log_n(&logger, 4);

        let entries = logger.export();
        assert_eq!(entries.len(), 4);
        assert!(entries.iter().all(|e| e.action_id == action_id));
    }

    // ── Retention ─────────────────────────────────────────────────────────────

    /// The entry cap trims oldest-first after each append, and the chain
    /// still verifies from its new anchor.
    #[test]
    fn entry_cap_trims_oldest_and_reanchors() {
        let logger = AuditLogger::new(RetentionPolicy {
            max_age_days: None,
            max_entries: 3,
        });
        log_n(&logger, 6);

        assert_eq!(logger.len(), 3);

        let entries = logger.export();
        // The oldest retained entry is sequence 3.
        assert_eq!(entries[0].sequence, 3);
        assert_eq!(logger.verify_integrity(), ChainVerdict::VALID);
    }

    /// Entries older than the age limit are pruned on the next append.
    #[test]
    fn age_limit_prunes_old_entries() {
        let logger = AuditLogger::new(RetentionPolicy {
            max_age_days: Some(7),
            max_entries: 1_000,
        });
        let action_id = ActionId::new();
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

        logger
            .log_at(AuditKind::ActionReceived, action_id, None, json!({}), start)
            .unwrap();
        logger
            .log_at(
                AuditKind::DecisionMade,
                action_id,
                None,
                json!({}),
                start + Duration::days(10),
            )
            .unwrap();

        // The first entry is past the 7-day window at the second append.
        assert_eq!(logger.len(), 1);
        assert_eq!(logger.export()[0].kind, AuditKind::DecisionMade);
        assert_eq!(logger.verify_integrity(), ChainVerdict::VALID);
    }

    /// Tamper detection still works inside the retained window after
    /// pruning.
    #[test]
    fn tampering_after_prune_is_still_detected() {
        let logger = AuditLogger::new(RetentionPolicy {
            max_age_days: None,
            max_entries: 3,
        });
        log_n(&logger, 6);

        logger.tamper_payload(1, json!({ "evil": true }));

        let verdict = logger.verify_integrity();
        assert!(!verdict.valid);
        assert_eq!(verdict.broken_at, Some(1));
    }

    // ── Write path ────────────────────────────────────────────────────────────

    /// A detected break does not block further appends: verification is a
    /// diagnostic, not a write barrier.
    #[test]
    fn broken_chain_does_not_block_appends() {
        let logger = logger();
        log_n(&logger, 2);

        logger.tamper_payload(0, json!({ "evil": true }));
        assert!(!logger.verify_integrity().valid);

        log_n(&logger, 1);
        assert_eq!(logger.len(), 3);
    }
}

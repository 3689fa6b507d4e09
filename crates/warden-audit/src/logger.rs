//! The in-memory, append-only audit logger.
//!
//! `AuditLogger` is the reference implementation of the `AuditSink` trait.
//! Entries live in a `Vec` behind a `Mutex`, so appends are serialized per
//! process — no two entries can ever compute a hash from the same
//! `prev_hash`.
//!
//! Integrity is checked on demand via `verify_integrity()`; it is not
//! enforced on the write path. A detected break is a health signal, not a
//! write barrier — an out-of-band mutation will not block later appends.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use warden_contracts::{
    action::ActionId,
    audit::{AuditEntry, AuditKind},
    config::RetentionPolicy,
    decision::DecisionId,
    error::{WardenError, WardenResult},
};
use warden_core::traits::AuditSink;

use crate::chain::{hash_entry, verify_chain, ChainVerdict};

/// Interior state: the entries, the running tail hash, and the anchor the
/// chain verifies from.
struct ChainState {
    entries: Vec<AuditEntry>,
    /// Next sequence number to assign.
    sequence: u64,
    /// `hash` of the last appended entry, or the genesis sentinel.
    last_hash: String,
    /// Expected `prev_hash` of `entries[0]`. The genesis sentinel until
    /// retention pruning discards the front of the chain, after which it
    /// re-anchors at the first retained entry's `prev_hash`.
    anchor_hash: String,
}

/// An in-memory, append-only audit ledger backed by a SHA-256 hash chain.
///
/// # Thread safety
///
/// All operations acquire an internal `Mutex`, so the logger can be shared
/// (behind an `Arc`) between the router and the approval queue.
pub struct AuditLogger {
    retention: RetentionPolicy,
    state: Mutex<ChainState>,
}

impl AuditLogger {
    /// Create a logger with the given retention policy.
    pub fn new(retention: RetentionPolicy) -> Self {
        Self {
            retention,
            state: Mutex::new(ChainState {
                entries: Vec::new(),
                sequence: 0,
                last_hash: AuditEntry::GENESIS_HASH.to_string(),
                anchor_hash: AuditEntry::GENESIS_HASH.to_string(),
            }),
        }
    }

    /// Append one entry at an explicit clock reading. The `AuditSink` impl
    /// pins `now` to `Utc::now()`.
    pub fn log_at(
        &self,
        kind: AuditKind,
        action_id: ActionId,
        decision_id: Option<DecisionId>,
        payload: serde_json::Value,
        now: DateTime<Utc>,
    ) -> WardenResult<AuditEntry> {
        let mut state = self.state.lock().map_err(|e| WardenError::AuditWriteFailed {
            reason: format!("audit state lock poisoned: {}", e),
        })?;

        let id = uuid::Uuid::new_v4();
        let sequence = state.sequence;
        let prev_hash = state.last_hash.clone();

        let hash = hash_entry(
            &id,
            sequence,
            now,
            kind,
            action_id,
            decision_id,
            &payload,
            &prev_hash,
        );

        let entry = AuditEntry {
            id,
            sequence,
            timestamp: now,
            kind,
            action_id,
            decision_id,
            payload,
            prev_hash,
            hash: hash.clone(),
        };

        state.entries.push(entry.clone());
        state.sequence += 1;
        state.last_hash = hash;

        Self::prune_locked(&mut state, &self.retention, now);

        debug!(kind = %kind, action_id = %action_id, sequence, "audit entry appended");

        Ok(entry)
    }

    /// Apply the retention policy: drop entries past the age limit, then
    /// trim to the entry cap (oldest first). Pruning re-anchors chain
    /// verification at the first retained entry.
    fn prune_locked(state: &mut ChainState, retention: &RetentionPolicy, now: DateTime<Utc>) {
        let before = state.entries.len();

        if let Some(days) = retention.max_age_days {
            let cutoff = now - Duration::days(days as i64);
            state.entries.retain(|e| e.timestamp >= cutoff);
        }

        if state.entries.len() > retention.max_entries {
            let excess = state.entries.len() - retention.max_entries;
            state.entries.drain(..excess);
        }

        if state.entries.len() != before {
            state.anchor_hash = state
                .entries
                .first()
                .map(|e| e.prev_hash.clone())
                .unwrap_or_else(|| state.last_hash.clone());
            info!(
                pruned = before - state.entries.len(),
                retained = state.entries.len(),
                "audit retention applied"
            );
        }
    }

    /// Replay the chain from its anchor, recomputing every hash.
    ///
    /// Read-only: a detected break is reported, never repaired, and does
    /// not block subsequent appends.
    pub fn verify_integrity(&self) -> ChainVerdict {
        let state = self.state.lock().expect("audit state lock poisoned");
        verify_chain(&state.entries, &state.anchor_hash)
    }

    /// The full ledger, in chain order, for external persistence.
    pub fn export(&self) -> Vec<AuditEntry> {
        let state = self.state.lock().expect("audit state lock poisoned");
        state.entries.clone()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        let state = self.state.lock().expect("audit state lock poisoned");
        state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Test hook: mutate a stored entry's payload in place, simulating
    /// out-of-band tampering.
    #[cfg(test)]
    pub(crate) fn tamper_payload(&self, index: usize, payload: serde_json::Value) {
        let mut state = self.state.lock().unwrap();
        state.entries[index].payload = payload;
    }
}

impl AuditSink for AuditLogger {
    fn log(
        &self,
        kind: AuditKind,
        action_id: ActionId,
        decision_id: Option<DecisionId>,
        payload: serde_json::Value,
    ) -> WardenResult<AuditEntry> {
        self.log_at(kind, action_id, decision_id, payload, Utc::now())
    }
}

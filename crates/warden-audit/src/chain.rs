//! Hash-chain primitives: entry hashing and chain verification.
//!
//! Every field that contributes to an entry's hash is listed explicitly so
//! nothing is accidentally omitted.
//!
//! Hash input layout (bytes, in order):
//!   1. id as 16 raw UUID bytes
//!   2. sequence as 8-byte little-endian
//!   3. timestamp as RFC 3339 UTF-8 bytes
//!   4. kind tag as UTF-8 bytes (e.g. "decision_made")
//!   5. action_id as 16 raw UUID bytes
//!   6. decision_id as 16 raw UUID bytes, or the single byte 0x00 when absent
//!   7. canonical JSON of payload (serde_json, no pretty-printing)
//!   8. prev_hash as UTF-8 bytes (64 ASCII hex chars)

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use warden_contracts::{
    action::ActionId,
    audit::{AuditEntry, AuditKind},
    decision::DecisionId,
};

/// Compute the SHA-256 hash for a single audit entry.
///
/// Returns a lowercase 64-character hex string.
///
/// # Panics
///
/// Panics if `payload` cannot be serialized to JSON — which cannot happen
/// for a value that is already a `serde_json::Value`.
#[allow(clippy::too_many_arguments)]
pub fn hash_entry(
    id: &uuid::Uuid,
    sequence: u64,
    timestamp: DateTime<Utc>,
    kind: AuditKind,
    action_id: ActionId,
    decision_id: Option<DecisionId>,
    payload: &serde_json::Value,
    prev_hash: &str,
) -> String {
    let payload_json =
        serde_json::to_vec(payload).expect("serde_json::Value must always serialize");

    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(timestamp.to_rfc3339().as_bytes());
    hasher.update(kind.as_str().as_bytes());
    hasher.update(action_id.0.as_bytes());
    match decision_id {
        Some(did) => hasher.update(did.0.as_bytes()),
        None => hasher.update([0u8]),
    }
    hasher.update(&payload_json);
    hasher.update(prev_hash.as_bytes());

    hex::encode(hasher.finalize())
}

/// Recompute the hash of a stored entry from its own fields.
pub fn recompute(entry: &AuditEntry) -> String {
    hash_entry(
        &entry.id,
        entry.sequence,
        entry.timestamp,
        entry.kind,
        entry.action_id,
        entry.decision_id,
        &entry.payload,
        &entry.prev_hash,
    )
}

/// The result of replaying a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainVerdict {
    /// True when every link and every hash checks out.
    pub valid: bool,
    /// Index of the first broken entry, when invalid.
    pub broken_at: Option<usize>,
}

impl ChainVerdict {
    pub const VALID: Self = Self {
        valid: true,
        broken_at: None,
    };

    fn broken(index: usize) -> Self {
        Self {
            valid: false,
            broken_at: Some(index),
        }
    }
}

/// Verify a chain starting from `anchor` (the expected `prev_hash` of the
/// first entry — the genesis sentinel for an unpruned chain).
///
/// Two rules per entry, checked in order:
///
/// 1. **Prev-hash linkage** — the stored `prev_hash` equals the previous
///    entry's `hash` (or the anchor for entry 0).
/// 2. **Hash correctness** — the stored `hash` matches the value
///    recomputed from the entry's own fields.
///
/// Returns the index of the first entry violating either rule. An empty
/// chain is defined as valid.
pub fn verify_chain(entries: &[AuditEntry], anchor: &str) -> ChainVerdict {
    let mut expected_prev = anchor.to_string();

    for (index, entry) in entries.iter().enumerate() {
        if entry.prev_hash != expected_prev {
            return ChainVerdict::broken(index);
        }
        if entry.hash != recompute(entry) {
            return ChainVerdict::broken(index);
        }
        expected_prev = entry.hash.clone();
    }

    ChainVerdict::VALID
}

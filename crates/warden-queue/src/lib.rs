//! # warden-queue
//!
//! The bounded, priority-ordered approval queue for the Warden governance
//! engine, plus the batch review layer on top of it.
//!
//! ## Overview
//!
//! - [`ApprovalQueue`] — holds decisions awaiting human review. Priority
//!   ordered, capacity bounded (lowest-priority eviction), with a
//!   caller-driven periodic sweep for expiration, escalation, and
//!   auto-rejection.
//! - [`BatchApproval`] — aggregation and bulk approve/reject over the
//!   queue, with per-item success reporting and presets for the common
//!   review flows.
//!
//! The queue shares the engine's audit sink and event dispatcher: every
//! transition is mirrored into the ledger and emitted as an `item:*` /
//! `queue:changed` event.

pub mod batch;
pub mod queue;

pub use batch::{ApprovalFilter, BatchApproval, BatchOutcome, QueueSummary};
pub use queue::{ApprovalQueue, SweepReport};

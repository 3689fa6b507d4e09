//! # warden-core
//!
//! Trait seams, synchronous event dispatch, and the decision router for
//! the Warden governance engine.
//!
//! The router is the single entry point: engine adapters construct an
//! [`warden_contracts::action::Action`] and call
//! [`router::DecisionRouter::route`], which classifies, boundary-checks,
//! and returns a final [`warden_contracts::decision::Decision`] without
//! ever suspending. Implementations of the classifier, boundary guard,
//! and audit sink live in the leaf crates and plug in through
//! [`traits`].

pub mod events;
pub mod router;
pub mod traits;

pub use events::{EventDispatcher, EventKind, GovernanceEvent, SubscriptionId};
pub use router::DecisionRouter;

//! Synchronous governance event dispatch.
//!
//! An explicit subscribe/unsubscribe API rather than an implicit global
//! bus: handlers are registered per event kind and invoked synchronously
//! in registration order. No ordering guarantee exists across distinct
//! event kinds.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use warden_contracts::{
    action::ActionId, approval::ApprovalRequest, decision::Decision,
};

/// The names of every event the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    DecisionMade,
    DecisionAutoExecute,
    DecisionQueued,
    DecisionEscalated,
    DecisionRejected,
    BoundaryViolation,
    ItemAdded,
    ItemApproved,
    ItemRejected,
    ItemExpired,
    ItemEscalated,
    QueueChanged,
}

impl EventKind {
    /// The event's wire name, e.g. `decision:made`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DecisionMade => "decision:made",
            Self::DecisionAutoExecute => "decision:auto_execute",
            Self::DecisionQueued => "decision:queued",
            Self::DecisionEscalated => "decision:escalated",
            Self::DecisionRejected => "decision:rejected",
            Self::BoundaryViolation => "boundary:violation",
            Self::ItemAdded => "item:added",
            Self::ItemApproved => "item:approved",
            Self::ItemRejected => "item:rejected",
            Self::ItemExpired => "item:expired",
            Self::ItemEscalated => "item:escalated",
            Self::QueueChanged => "queue:changed",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One emitted governance event with its payload.
#[derive(Debug, Clone)]
pub enum GovernanceEvent {
    /// A decision was produced (fires for every routed action, alongside
    /// the outcome-specific event).
    DecisionMade(Decision),
    DecisionAutoExecute(Decision),
    DecisionQueued(Decision),
    DecisionEscalated(Decision),
    DecisionRejected(Decision),
    BoundaryViolation {
        action_id: ActionId,
        violations: Vec<String>,
    },
    ItemAdded(ApprovalRequest),
    ItemApproved(ApprovalRequest),
    ItemRejected(ApprovalRequest),
    ItemExpired(ApprovalRequest),
    ItemEscalated(ApprovalRequest),
    QueueChanged {
        pending: usize,
    },
}

impl GovernanceEvent {
    /// The kind handlers subscribe under.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::DecisionMade(_) => EventKind::DecisionMade,
            Self::DecisionAutoExecute(_) => EventKind::DecisionAutoExecute,
            Self::DecisionQueued(_) => EventKind::DecisionQueued,
            Self::DecisionEscalated(_) => EventKind::DecisionEscalated,
            Self::DecisionRejected(_) => EventKind::DecisionRejected,
            Self::BoundaryViolation { .. } => EventKind::BoundaryViolation,
            Self::ItemAdded(_) => EventKind::ItemAdded,
            Self::ItemApproved(_) => EventKind::ItemApproved,
            Self::ItemRejected(_) => EventKind::ItemRejected,
            Self::ItemExpired(_) => EventKind::ItemExpired,
            Self::ItemEscalated(_) => EventKind::ItemEscalated,
            Self::QueueChanged { .. } => EventKind::QueueChanged,
        }
    }
}

/// Token returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn Fn(&GovernanceEvent) + Send + Sync>;

struct DispatchState {
    handlers: HashMap<EventKind, Vec<(u64, Handler)>>,
    next_id: u64,
}

/// Synchronous, registration-ordered event dispatcher.
///
/// Cheap to clone — clones share the same subscriber table, so the router
/// and the approval queue can emit through the same dispatcher.
#[derive(Clone)]
pub struct EventDispatcher {
    state: Arc<Mutex<DispatchState>>,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DispatchState {
                handlers: HashMap::new(),
                next_id: 0,
            })),
        }
    }

    /// Register `handler` for events of `kind`.
    ///
    /// Handlers for the same kind run synchronously in registration order.
    pub fn subscribe(
        &self,
        kind: EventKind,
        handler: impl Fn(&GovernanceEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let mut state = self.state.lock().expect("event dispatch lock poisoned");
        let id = state.next_id;
        state.next_id += 1;
        state
            .handlers
            .entry(kind)
            .or_default()
            .push((id, Box::new(handler)));
        SubscriptionId(id)
    }

    /// Remove a previously registered handler. Returns false if the token
    /// was already removed.
    pub fn unsubscribe(&self, token: SubscriptionId) -> bool {
        let mut state = self.state.lock().expect("event dispatch lock poisoned");
        for handlers in state.handlers.values_mut() {
            if let Some(pos) = handlers.iter().position(|(id, _)| *id == token.0) {
                handlers.remove(pos);
                return true;
            }
        }
        false
    }

    /// Invoke every handler registered for the event's kind, in
    /// registration order.
    pub fn emit(&self, event: &GovernanceEvent) {
        let state = self.state.lock().expect("event dispatch lock poisoned");
        if let Some(handlers) = state.handlers.get(&event.kind()) {
            for (_, handler) in handlers {
                handler(event);
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

//! Change notifications for screens that mirror the same progression graph.
//!
//! Unlike a per-tick simulation, progression changes are rare and driven by
//! single user actions, so events are delivered synchronously, right after
//! the mutation that produced them, in subscription order.
//!
//! # Subscriber Filters
//!
//! - [`ChangeBus::subscribe`]: every event.
//! - [`ChangeBus::subscribe_to`]: only events of one [`EventKind`].

use crate::id::{NodeId, SubscriptionId};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Something observable changed in a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressionEvent {
    NodeUnlocked {
        node: NodeId,
        level: u32,
        price: u64,
    },
    BalanceChanged {
        balance: u64,
    },
    /// Nodes whose eligibility flipped because of a level-up.
    EligibilityChanged {
        nodes: Vec<NodeId>,
    },
    /// Nodes that became visible because of a level-up.
    NodesRevealed {
        nodes: Vec<NodeId>,
    },
    Reset {
        nodes: Vec<NodeId>,
        refunded: u64,
    },
    /// The last state write failed; it will be retried.
    PersistFailed {
        reason: String,
    },
}

/// Discriminant tag for event types, used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NodeUnlocked,
    BalanceChanged,
    EligibilityChanged,
    NodesRevealed,
    Reset,
    PersistFailed,
}

impl ProgressionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ProgressionEvent::NodeUnlocked { .. } => EventKind::NodeUnlocked,
            ProgressionEvent::BalanceChanged { .. } => EventKind::BalanceChanged,
            ProgressionEvent::EligibilityChanged { .. } => EventKind::EligibilityChanged,
            ProgressionEvent::NodesRevealed { .. } => EventKind::NodesRevealed,
            ProgressionEvent::Reset { .. } => EventKind::Reset,
            ProgressionEvent::PersistFailed { .. } => EventKind::PersistFailed,
        }
    }
}

// ---------------------------------------------------------------------------
// ChangeBus
// ---------------------------------------------------------------------------

/// A listener receives events read-only.
pub type ChangeListener = Box<dyn FnMut(&ProgressionEvent)>;

struct Subscriber {
    id: SubscriptionId,
    filter: Option<EventKind>,
    listener: ChangeListener,
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// Ordered list of listeners. Delivery is immediate.
#[derive(Debug, Default)]
pub struct ChangeBus {
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every event.
    pub fn subscribe(&mut self, listener: ChangeListener) -> SubscriptionId {
        self.push(None, listener)
    }

    /// Register a listener for one kind of event.
    pub fn subscribe_to(&mut self, kind: EventKind, listener: ChangeListener) -> SubscriptionId {
        self.push(Some(kind), listener)
    }

    /// Remove a listener. Returns `false` if the id was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver an event to every matching listener in subscription order.
    pub fn emit(&mut self, event: &ProgressionEvent) {
        let kind = event.kind();
        for sub in &mut self.subscribers {
            if sub.filter.is_none_or(|k| k == kind) {
                (sub.listener)(event);
            }
        }
    }

    fn push(&mut self, filter: Option<EventKind>, listener: ChangeListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            filter,
            listener,
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<ProgressionEvent>>>, ChangeListener) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        (log, Box::new(move |e: &ProgressionEvent| sink.borrow_mut().push(e.clone())))
    }

    #[test]
    fn events_delivered_in_subscription_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut bus = ChangeBus::new();
        for tag in ["research_screen", "home_badge"] {
            let order = Rc::clone(&order);
            bus.subscribe(Box::new(move |_| order.borrow_mut().push(tag)));
        }
        bus.emit(&ProgressionEvent::BalanceChanged { balance: 10 });
        assert_eq!(*order.borrow(), vec!["research_screen", "home_badge"]);
    }

    #[test]
    fn filtered_subscriber_sees_only_its_kind() {
        let (log, listener) = recorder();
        let mut bus = ChangeBus::new();
        bus.subscribe_to(EventKind::BalanceChanged, listener);

        bus.emit(&ProgressionEvent::NodeUnlocked {
            node: NodeId::from("a"),
            level: 1,
            price: 5,
        });
        bus.emit(&ProgressionEvent::BalanceChanged { balance: 3 });

        assert_eq!(
            *log.borrow(),
            vec![ProgressionEvent::BalanceChanged { balance: 3 }]
        );
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let (log, listener) = recorder();
        let mut bus = ChangeBus::new();
        let id = bus.subscribe(listener);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert!(bus.is_empty());

        bus.emit(&ProgressionEvent::BalanceChanged { balance: 1 });
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn subscription_ids_are_unique() {
        let mut bus = ChangeBus::new();
        let a = bus.subscribe(Box::new(|_| {}));
        let b = bus.subscribe(Box::new(|_| {}));
        assert_ne!(a, b);
        assert_eq!(bus.len(), 2);
    }
}

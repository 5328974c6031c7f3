//! Shared test helpers for unit tests, property tests, and the integration
//! test crate.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::cost::CostSchedule;
use crate::event::ProgressionEvent;
use crate::fixed::f64_to_fixed64;
use crate::graph::ProgressionGraph;
use crate::node::NodeDef;
use crate::persist::{KeyValueStore, MemoryKeyValueStore, PersistError};
use crate::store::{ProgressionStore, StoreConfig};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

// ===========================================================================
// Definition helpers
// ===========================================================================

pub fn growth(base: u64, multiplier: f64) -> CostSchedule {
    CostSchedule::Growth {
        base,
        multiplier: f64_to_fixed64(multiplier),
    }
}

pub fn flat_node(id: &str, price: u64) -> NodeDef {
    NodeDef::new(id, id, CostSchedule::Flat(price))
}

/// `A` (free, already owned) and `B` (500, requires `A`).
pub fn seeded_pair() -> ProgressionGraph {
    ProgressionGraph::new(vec![
        flat_node("A", 0).owned(),
        flat_node("B", 500).requires("A"),
    ])
    .expect("seeded pair is valid")
}

/// `S`: three levels, 100 then x1.5 per purchase.
pub fn leveled_skill() -> ProgressionGraph {
    ProgressionGraph::new(vec![
        NodeDef::new("S", "S", growth(100, 1.5)).with_max_level(3),
    ])
    .expect("leveled skill is valid")
}

// ===========================================================================
// Store helpers
// ===========================================================================

/// Open a store over a fresh in-memory backend. The backend handle shares
/// entries with the store's copy.
pub fn open_store(graph: ProgressionGraph, balance: u64) -> (ProgressionStore, MemoryKeyValueStore) {
    let backend = MemoryKeyValueStore::new();
    let config = StoreConfig {
        starting_balance: balance,
        ..StoreConfig::default()
    };
    let store = ProgressionStore::open("test", graph, config, Box::new(backend.clone()))
        .expect("memory backend never fails to read");
    (store, backend)
}

/// Subscribe a recorder to every event of a store.
pub fn record_events(store: &mut ProgressionStore) -> Rc<RefCell<Vec<ProgressionEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    store.subscribe(Box::new(move |event: &ProgressionEvent| {
        sink.borrow_mut().push(event.clone())
    }));
    log
}

// ===========================================================================
// Flaky backend
// ===========================================================================

/// In-memory backend whose writes can be switched to fail.
#[derive(Debug, Clone, Default)]
pub struct FlakyKeyValueStore {
    inner: MemoryKeyValueStore,
    failing: Rc<Cell<bool>>,
    attempts: Rc<Cell<u32>>,
}

impl FlakyKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn write_attempts(&self) -> u32 {
        self.attempts.get()
    }

    pub fn inner(&self) -> &MemoryKeyValueStore {
        &self.inner
    }
}

impl KeyValueStore for FlakyKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, blob: &[u8]) -> Result<(), PersistError> {
        self.attempts.set(self.attempts.get() + 1);
        if self.failing.get() {
            return Err(PersistError::Backend {
                key: key.to_string(),
                detail: "disk full".to_string(),
            });
        }
        self.inner.set(key, blob)
    }
}

//! The stateful facade screens talk to.
//!
//! A [`ProgressionStore`] exclusively owns one feature's graph and balance.
//! Screens read [`ProgressionSnapshot`]s and issue commands; every command
//! updates memory first, then writes the save, then notifies subscribers.

use crate::event::{ChangeBus, ChangeListener, EventKind, ProgressionEvent};
use crate::evaluator::{RejectReason, RevealPolicy, UnlockEvaluator, Visibility};
use crate::executor::{UnlockExecutor, UnlockResult};
use crate::feedback::FeedbackSink;
use crate::gate::{GateEvaluator, OpenGates, gate_passes};
use crate::graph::{ProgressionError, ProgressionGraph};
use crate::id::{NodeId, SubscriptionId};
use crate::node::{Effect, NodeStatus, Placement, ProgressionNode};
use crate::persist::{KeyValueStore, PersistError, PersistedState, decode_state, encode_state};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Prefix of every feature's storage key.
pub const KEY_PREFIX: &str = "progression";

/// Storage key for a feature's save.
pub fn storage_key(feature: &str) -> String {
    format!("{KEY_PREFIX}/{feature}")
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Per-feature store behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub reveal: RevealPolicy,
    /// Refund the currency spent on non-permanent nodes when resetting.
    pub refund_on_reset: bool,
    /// Balance for a feature with no save.
    pub starting_balance: u64,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors opening a store. Fatal only when starting fresh would overwrite a
/// save that may still be readable: a failed read, or a save written by a
/// newer format version.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read saved progression for {feature}: {source}")]
    Load {
        feature: String,
        #[source]
        source: PersistError,
    },
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Read-only view of one node, with everything a screen renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeView {
    pub id: NodeId,
    pub name: String,
    pub placement: Placement,
    pub level: u32,
    pub max_level: u32,
    /// `None` once maxed.
    pub next_price: Option<u64>,
    pub eligible: bool,
    /// Why the next level is unavailable, for an inline message.
    pub blocked_by: Option<RejectReason>,
    pub revealed: bool,
    pub status: NodeStatus,
    pub effect: Effect,
}

/// Read-only copy of a store's state at one moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionSnapshot {
    pub feature: String,
    pub balance: u64,
    /// Definition order.
    pub nodes: Vec<NodeView>,
}

impl ProgressionSnapshot {
    pub fn node(&self, id: &str) -> Option<&NodeView> {
        self.nodes.iter().find(|view| view.id.as_str() == id)
    }

    pub fn eligible(&self) -> impl Iterator<Item = &NodeView> {
        self.nodes.iter().filter(|view| view.eligible)
    }
}

/// What a reset did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetSummary {
    /// Non-permanent nodes that had progress and were cleared.
    pub nodes: Vec<NodeId>,
    pub refunded: u64,
    pub balance: u64,
}

// ---------------------------------------------------------------------------
// ProgressionStore
// ---------------------------------------------------------------------------

/// Owns one feature's graph and balance. The only mutable surface.
pub struct ProgressionStore {
    feature: String,
    graph: ProgressionGraph,
    balance: u64,
    config: StoreConfig,
    executor: UnlockExecutor,
    backend: Box<dyn KeyValueStore>,
    gates: Box<dyn GateEvaluator>,
    feedback: Option<Box<dyn FeedbackSink>>,
    bus: ChangeBus,
    /// Set while the last write failed; cleared by the next good write.
    persist_pending: bool,
}

impl std::fmt::Debug for ProgressionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressionStore")
            .field("feature", &self.feature)
            .field("graph", &self.graph)
            .field("balance", &self.balance)
            .field("config", &self.config)
            .field("bus", &self.bus)
            .field("persist_pending", &self.persist_pending)
            .finish_non_exhaustive()
    }
}

impl ProgressionStore {
    /// Open a feature's store, restoring its save if one exists.
    ///
    /// A save that fails to decode is logged and discarded; saved nodes the
    /// graph no longer defines are skipped. A save from a newer format
    /// version is left untouched and reported as [`StoreError::Load`].
    pub fn open(
        feature: impl Into<String>,
        mut graph: ProgressionGraph,
        config: StoreConfig,
        backend: Box<dyn KeyValueStore>,
    ) -> Result<Self, StoreError> {
        let feature = feature.into();
        let key = storage_key(&feature);
        let mut balance = config.starting_balance;

        let blob = backend.get(&key).map_err(|source| StoreError::Load {
            feature: feature.clone(),
            source,
        })?;

        if let Some(blob) = blob {
            match decode_state(&blob) {
                Ok(saved) => {
                    balance = saved.balance;
                    let unknown = saved.apply_to(&mut graph);
                    if !unknown.is_empty() {
                        warn!(
                            target: "grovekeep::persist",
                            feature = %feature,
                            ?unknown,
                            "save.unknown_nodes_skipped"
                        );
                    }
                    info!(target: "grovekeep::persist", feature = %feature, balance, "save.restored");
                }
                Err(source @ PersistError::FutureVersion(_)) => {
                    return Err(StoreError::Load { feature, source });
                }
                Err(err) => {
                    warn!(
                        target: "grovekeep::persist",
                        feature = %feature,
                        error = %err,
                        "save.discarded"
                    );
                }
            }
        }

        Ok(Self {
            feature,
            graph,
            balance,
            config,
            executor: UnlockExecutor::new(UnlockEvaluator::new(config.reveal)),
            backend,
            gates: Box::new(OpenGates),
            feedback: None,
            bus: ChangeBus::new(),
            persist_pending: false,
        })
    }

    /// Replace the gate evaluator (e.g. with a [`PlayerLevel`](crate::gate::PlayerLevel)).
    pub fn with_gates(mut self, gates: impl GateEvaluator + 'static) -> Self {
        self.gates = Box::new(gates);
        self
    }

    pub fn set_gates(&mut self, gates: Box<dyn GateEvaluator>) {
        self.gates = gates;
    }

    pub fn set_feedback(&mut self, feedback: impl FeedbackSink + 'static) {
        self.feedback = Some(Box::new(feedback));
    }

    // -- Query API --

    pub fn feature(&self) -> &str {
        &self.feature
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn graph(&self) -> &ProgressionGraph {
        &self.graph
    }

    /// Whether the last write failed and is waiting for a retry.
    pub fn is_persist_pending(&self) -> bool {
        self.persist_pending
    }

    pub fn snapshot(&self) -> ProgressionSnapshot {
        ProgressionSnapshot {
            feature: self.feature.clone(),
            balance: self.balance,
            nodes: self.graph.nodes().map(|node| self.view(node)).collect(),
        }
    }

    pub fn node_view(&self, id: &str) -> Result<NodeView, ProgressionError> {
        self.graph.node(id).map(|node| self.view(node))
    }

    pub fn can_unlock(&self, id: &str) -> Result<bool, ProgressionError> {
        self.node_view(id).map(|view| view.eligible)
    }

    /// Ids unlockable right now, in definition order.
    pub fn eligible_nodes(&self) -> Vec<NodeId> {
        self.graph
            .nodes()
            .filter(|node| {
                self.executor.evaluator().can_unlock(
                    node,
                    &self.graph,
                    self.balance,
                    gate_passes(node, self.gates.as_ref()),
                )
            })
            .map(|node| node.id().clone())
            .collect()
    }

    // -- Commands --

    /// Unlock the next level of a node.
    ///
    /// Memory is updated first and the save written before returning. A
    /// rejection changes nothing and writes nothing.
    pub fn request_unlock(&mut self, id: &str) -> Result<UnlockResult, ProgressionError> {
        let result =
            self.executor
                .unlock(&mut self.graph, &mut self.balance, id, self.gates.as_ref())?;

        match &result {
            UnlockResult::NewLevel(receipt) => {
                debug!(
                    target: "grovekeep::store",
                    feature = %self.feature,
                    node = %receipt.node,
                    level = receipt.level,
                    price = receipt.price,
                    balance = receipt.balance,
                    "unlock.accepted"
                );
                self.persist();

                if let Some(feedback) = self.feedback.as_mut() {
                    feedback.on_unlock(&receipt.node, receipt.level);
                }

                self.bus.emit(&ProgressionEvent::NodeUnlocked {
                    node: receipt.node.clone(),
                    level: receipt.level,
                    price: receipt.price,
                });
                self.bus.emit(&ProgressionEvent::BalanceChanged {
                    balance: receipt.balance,
                });
                if !receipt.eligibility_changed.is_empty() {
                    self.bus.emit(&ProgressionEvent::EligibilityChanged {
                        nodes: receipt.eligibility_changed.clone(),
                    });
                }
                if !receipt.revealed.is_empty() {
                    self.bus.emit(&ProgressionEvent::NodesRevealed {
                        nodes: receipt.revealed.clone(),
                    });
                }
            }
            UnlockResult::Rejected(reason) => {
                debug!(
                    target: "grovekeep::store",
                    feature = %self.feature,
                    node = id,
                    ?reason,
                    "unlock.rejected"
                );
            }
        }

        Ok(result)
    }

    /// Add earned currency. Saturates at `u64::MAX`. Returns the new balance.
    pub fn credit(&mut self, amount: u64) -> u64 {
        self.balance = self.balance.saturating_add(amount);
        debug!(
            target: "grovekeep::store",
            feature = %self.feature,
            amount,
            balance = self.balance,
            "balance.credited"
        );
        self.persist();
        self.bus.emit(&ProgressionEvent::BalanceChanged {
            balance: self.balance,
        });
        self.balance
    }

    /// Return every non-permanent node to level 0, refunding what was spent
    /// on them when the config asks for it. The only backward transition.
    pub fn reset(&mut self) -> ResetSummary {
        let refund = self.config.refund_on_reset;
        let mut cleared = Vec::new();
        let mut refunded: u64 = 0;

        for node in self.graph.nodes_mut() {
            if node.def().permanent {
                continue;
            }
            let state = node.state();
            let had_progress =
                state.current_level > 0 || state.spent > 0 || state.cost_override.is_some();
            if refund {
                refunded = refunded.saturating_add(state.spent);
            }
            node.clear();
            if had_progress {
                cleared.push(node.id().clone());
            }
        }

        self.balance = self.balance.saturating_add(refunded);
        info!(
            target: "grovekeep::store",
            feature = %self.feature,
            cleared = cleared.len(),
            refunded,
            balance = self.balance,
            "progression.reset"
        );
        self.persist();

        self.bus.emit(&ProgressionEvent::Reset {
            nodes: cleared.clone(),
            refunded,
        });
        if refunded > 0 {
            self.bus.emit(&ProgressionEvent::BalanceChanged {
                balance: self.balance,
            });
        }

        ResetSummary {
            nodes: cleared,
            refunded,
            balance: self.balance,
        }
    }

    /// Retry a pending write (call on app resume). A no-op when nothing is
    /// pending.
    pub fn flush(&mut self) -> Result<(), PersistError> {
        if !self.persist_pending {
            return Ok(());
        }
        self.write_state()
    }

    // -- Subscriptions --

    pub fn subscribe(&mut self, listener: ChangeListener) -> SubscriptionId {
        self.bus.subscribe(listener)
    }

    pub fn subscribe_to(&mut self, kind: EventKind, listener: ChangeListener) -> SubscriptionId {
        self.bus.subscribe_to(kind, listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    // -- Internal helpers --

    fn view(&self, node: &ProgressionNode) -> NodeView {
        let evaluator = self.executor.evaluator();
        let gate_ok = gate_passes(node, self.gates.as_ref());
        let check = evaluator.evaluate(node, &self.graph, self.balance, gate_ok);
        let eligible = check.is_ok();
        NodeView {
            id: node.id().clone(),
            name: node.def().name.clone(),
            placement: node.def().placement,
            level: node.level(),
            max_level: node.max_level(),
            next_price: node.next_price(),
            eligible,
            blocked_by: check.err(),
            revealed: evaluator.visibility(node, &self.graph) == Visibility::Revealed,
            status: node.status(eligible),
            effect: node.def().effect.clone(),
        }
    }

    /// Write the save; failures are logged and left for a retry. Memory is
    /// never rolled back.
    fn persist(&mut self) {
        let _ = self.write_state();
    }

    fn write_state(&mut self) -> Result<(), PersistError> {
        let key = storage_key(&self.feature);
        let outcome = encode_state(&PersistedState::capture(&self.graph, self.balance))
            .and_then(|blob| self.backend.set(&key, &blob));

        match &outcome {
            Ok(()) => {
                if self.persist_pending {
                    info!(target: "grovekeep::persist", feature = %self.feature, "save.recovered");
                }
                self.persist_pending = false;
            }
            Err(err) => {
                warn!(
                    target: "grovekeep::persist",
                    feature = %self.feature,
                    error = %err,
                    "save.failed"
                );
                self.persist_pending = true;
                self.bus.emit(&ProgressionEvent::PersistFailed {
                    reason: err.to_string(),
                });
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::CostSchedule;
    use crate::gate::PlayerLevel;
    use crate::node::{Gate, NodeDef};
    use crate::test_utils::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn seeded_pair_unlock_then_maxed() {
        let (mut store, _) = open_store(seeded_pair(), 500);

        let result = store.request_unlock("B").unwrap();
        assert_eq!(result.level(), Some(1));
        assert_eq!(store.balance(), 0);

        let again = store.request_unlock("B").unwrap();
        assert_eq!(again, UnlockResult::Rejected(RejectReason::AlreadyMaxed));
        assert_eq!(store.balance(), 0);
    }

    #[test]
    fn insufficient_currency_changes_nothing() {
        let (mut store, backend) = open_store(seeded_pair(), 499);

        let result = store.request_unlock("B").unwrap();
        assert!(matches!(
            result.rejection(),
            Some(RejectReason::InsufficientCurrency { .. })
        ));
        assert_eq!(store.balance(), 499);
        assert_eq!(store.node_view("B").unwrap().level, 0);
        assert!(!backend.contains(&storage_key("test")));
    }

    #[test]
    fn unknown_node_is_an_error() {
        let (mut store, _) = open_store(seeded_pair(), 0);
        assert_eq!(
            store.request_unlock("Z").unwrap_err(),
            ProgressionError::NodeNotFound(NodeId::from("Z"))
        );
    }

    #[test]
    fn snapshot_reports_status_and_blocker() {
        let (store, _) = open_store(seeded_pair(), 100);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.balance, 100);

        let a = snapshot.node("A").unwrap();
        assert_eq!(a.status, NodeStatus::Maxed);
        assert_eq!(a.blocked_by, Some(RejectReason::AlreadyMaxed));

        let b = snapshot.node("B").unwrap();
        assert_eq!(b.status, NodeStatus::Locked);
        assert!(b.revealed);
        assert_eq!(b.next_price, Some(500));
        assert_eq!(
            b.blocked_by,
            Some(RejectReason::InsufficientCurrency {
                price: 500,
                balance: 100
            })
        );
        assert_eq!(snapshot.eligible().count(), 0);
    }

    #[test]
    fn successful_unlock_notifies_subscribers() {
        let (mut store, _) = open_store(seeded_pair(), 500);
        let log = record_events(&mut store);

        store.request_unlock("B").unwrap();

        let events = log.borrow();
        assert_eq!(
            events[0],
            ProgressionEvent::NodeUnlocked {
                node: NodeId::from("B"),
                level: 1,
                price: 500
            }
        );
        assert_eq!(events[1], ProgressionEvent::BalanceChanged { balance: 0 });
        assert_eq!(
            events[2],
            ProgressionEvent::EligibilityChanged {
                nodes: vec![NodeId::from("B")]
            }
        );
    }

    #[test]
    fn rejection_does_not_notify() {
        let (mut store, _) = open_store(seeded_pair(), 0);
        let log = record_events(&mut store);
        store.request_unlock("B").unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn feedback_fires_only_on_success() {
        let (mut store, _) = open_store(seeded_pair(), 500);
        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&fired);
        store.set_feedback(move |node: &NodeId, level: u32| {
            sink.borrow_mut().push((node.clone(), level))
        });

        store.request_unlock("B").unwrap();
        store.request_unlock("B").unwrap();
        assert_eq!(*fired.borrow(), vec![(NodeId::from("B"), 1)]);
    }

    #[test]
    fn credit_adds_and_saturates() {
        let (mut store, _) = open_store(seeded_pair(), 10);
        assert_eq!(store.credit(490), 500);
        assert!(store.can_unlock("B").unwrap());
        assert_eq!(store.credit(u64::MAX), u64::MAX);
    }

    #[test]
    fn player_level_gate() {
        let graph = ProgressionGraph::new(vec![
            flat_node("meadow", 0).owned().permanent(),
            flat_node("marsh", 200)
                .requires("meadow")
                .with_gate(Gate::MinPlayerLevel(5)),
        ])
        .unwrap();
        let level = PlayerLevel::new(3);
        let (store, _) = open_store(graph, 1000);
        let mut store = store.with_gates(level.clone());

        assert_eq!(
            store.request_unlock("marsh").unwrap(),
            UnlockResult::Rejected(RejectReason::GateUnmet)
        );
        level.set(5);
        assert!(store.request_unlock("marsh").unwrap().is_unlocked());
        assert_eq!(store.balance(), 800);
    }

    #[test]
    fn reset_refunds_and_keeps_permanent_nodes() {
        let graph = ProgressionGraph::new(vec![
            flat_node("root", 0).owned().permanent(),
            NodeDef::new("bark", "Bark", growth(100, 1.5))
                .with_max_level(3)
                .requires("root"),
            flat_node("sap", 50).requires("bark"),
        ])
        .unwrap();
        let backend = crate::persist::MemoryKeyValueStore::new();
        let config = StoreConfig {
            refund_on_reset: true,
            starting_balance: 400,
            ..StoreConfig::default()
        };
        let mut store =
            ProgressionStore::open("skills", graph, config, Box::new(backend)).unwrap();

        store.request_unlock("bark").unwrap();
        store.request_unlock("bark").unwrap();
        store.request_unlock("sap").unwrap();
        assert_eq!(store.balance(), 100);

        let summary = store.reset();
        assert_eq!(summary.refunded, 300);
        assert_eq!(summary.balance, 400);
        assert_eq!(summary.nodes, vec![NodeId::from("bark"), NodeId::from("sap")]);
        assert_eq!(store.node_view("root").unwrap().level, 1);
        assert_eq!(store.node_view("bark").unwrap().level, 0);
        assert_eq!(store.node_view("bark").unwrap().next_price, Some(100));
    }

    #[test]
    fn reset_without_refund_keeps_balance() {
        let (mut store, _) = open_store(seeded_pair(), 600);
        store.request_unlock("B").unwrap();
        let summary = store.reset();
        assert_eq!(summary.refunded, 0);
        assert_eq!(store.balance(), 100);
        // A is owned but not permanent, so it is cleared too.
        assert_eq!(store.node_view("A").unwrap().level, 0);
    }

    #[test]
    fn reopen_restores_state() {
        let (mut store, backend) = open_store(leveled_skill(), 400);
        store.request_unlock("S").unwrap();

        let reopened = ProgressionStore::open(
            "test",
            leveled_skill(),
            StoreConfig::default(),
            Box::new(backend),
        )
        .unwrap();
        assert_eq!(reopened.balance(), 300);
        let s = reopened.node_view("S").unwrap();
        assert_eq!(s.level, 1);
        assert_eq!(s.next_price, Some(150));
    }

    #[test]
    fn corrupt_save_is_discarded() {
        let mut backend = crate::persist::MemoryKeyValueStore::new();
        backend.set(&storage_key("test"), &[0xFF; 4]).unwrap();
        let config = StoreConfig {
            starting_balance: 77,
            ..StoreConfig::default()
        };
        let store =
            ProgressionStore::open("test", seeded_pair(), config, Box::new(backend)).unwrap();
        assert_eq!(store.balance(), 77);
    }

    #[test]
    fn failed_write_keeps_memory_and_retries() {
        let backend = FlakyKeyValueStore::new();
        let config = StoreConfig {
            starting_balance: 500,
            ..StoreConfig::default()
        };
        let mut store =
            ProgressionStore::open("test", seeded_pair(), config, Box::new(backend.clone()))
                .unwrap();
        let log = record_events(&mut store);

        backend.set_failing(true);
        assert!(store.request_unlock("B").unwrap().is_unlocked());
        assert_eq!(store.balance(), 0);
        assert!(store.is_persist_pending());
        assert!(matches!(log.borrow()[0], ProgressionEvent::PersistFailed { .. }));
        assert!(store.flush().is_err());

        backend.set_failing(false);
        store.flush().unwrap();
        assert!(!store.is_persist_pending());
        assert!(backend.inner().contains(&storage_key("test")));
    }

    #[test]
    fn flush_without_pending_write_is_noop() {
        let backend = FlakyKeyValueStore::new();
        let mut store = ProgressionStore::open(
            "test",
            seeded_pair(),
            StoreConfig::default(),
            Box::new(backend.clone()),
        )
        .unwrap();
        store.flush().unwrap();
        assert_eq!(backend.write_attempts(), 0);
    }

    #[test]
    fn unreadable_backend_fails_open() {
        struct Unreadable;
        impl KeyValueStore for Unreadable {
            fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError> {
                Err(PersistError::Backend {
                    key: key.to_string(),
                    detail: "locked".to_string(),
                })
            }
            fn set(&mut self, _key: &str, _blob: &[u8]) -> Result<(), PersistError> {
                Ok(())
            }
        }
        let err = ProgressionStore::open(
            "research",
            seeded_pair(),
            StoreConfig::default(),
            Box::new(Unreadable),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::Load { ref feature, .. } if feature == "research"));
    }

    fn three_level_skill(cost: CostSchedule) -> ProgressionGraph {
        ProgressionGraph::new(vec![NodeDef::new("S", "S", cost).with_max_level(3)]).unwrap()
    }

    #[test]
    fn third_level_unaffordable_for_table_and_growth() {
        for cost in [CostSchedule::Table(vec![100, 150, 225]), growth(100, 1.5)] {
            let (mut store, _) = open_store(three_level_skill(cost.clone()), 400);

            assert_eq!(store.request_unlock("S").unwrap().level(), Some(1));
            assert_eq!(store.request_unlock("S").unwrap().level(), Some(2));
            assert_eq!(store.balance(), 150, "{cost:?}");

            assert_eq!(
                store.request_unlock("S").unwrap(),
                UnlockResult::Rejected(RejectReason::InsufficientCurrency {
                    price: 225,
                    balance: 150
                }),
                "{cost:?}"
            );
            assert_eq!(store.balance(), 150);
            assert_eq!(store.node_view("S").unwrap().level, 2);
        }
    }

    #[test]
    fn newer_format_save_is_not_overwritten() {
        let mut saved = PersistedState::capture(&seeded_pair(), 9_999);
        saved.header.version = crate::persist::FORMAT_VERSION + 1;
        let blob = encode_state(&saved).unwrap();

        let mut backend = crate::persist::MemoryKeyValueStore::new();
        backend.set(&storage_key("test"), &blob).unwrap();

        let err = ProgressionStore::open(
            "test",
            seeded_pair(),
            StoreConfig::default(),
            Box::new(backend.clone()),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Load {
                source: PersistError::FutureVersion(_),
                ..
            }
        ));
        assert_eq!(backend.get(&storage_key("test")).unwrap(), Some(blob));
    }
}

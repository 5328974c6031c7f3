//! Grovekeep Core -- the progression engine behind the research tree, skill
//! tree, and world map.
//!
//! Every one of those screens is the same shape: a graph of nodes gated by
//! prerequisites, an optional external gate (player level), and a currency
//! price per level. This crate implements that shape once.
//!
//! # Unlock Pipeline
//!
//! A call to [`store::ProgressionStore::request_unlock`] runs through:
//!
//! 1. **Gate** -- resolve the node's external gate through the store's
//!    [`gate::GateEvaluator`].
//! 2. **Evaluate** -- [`evaluator::UnlockEvaluator`] checks level cap,
//!    prerequisites, gate, and price, in that order.
//! 3. **Execute** -- [`executor::UnlockExecutor`] debits the balance, raises
//!    the level, advances growth pricing, and reports which nodes changed
//!    eligibility. All of it applies or none of it does.
//! 4. **Persist** -- the mutable state is written through the
//!    [`persist::KeyValueStore`]. A failed write is retried later; memory is
//!    never rolled back.
//! 5. **Notify** -- subscribers receive [`event::ProgressionEvent`]s and the
//!    feedback sink fires.
//!
//! Rejections (`AlreadyMaxed`, `PrerequisiteUnmet`, `GateUnmet`,
//! `InsufficientCurrency`) are ordinary results, not errors.
//!
//! # Key Types
//!
//! - [`graph::ProgressionGraph`] -- validated DAG of nodes with a reverse
//!   dependents index.
//! - [`node::NodeDef`] / [`node::ProgressionNode`] -- static definition plus
//!   mutable level state.
//! - [`cost::CostSchedule`] -- flat, table, linear, and growth pricing.
//! - [`store::ProgressionStore`] -- the only mutable surface screens touch.

pub mod cost;
pub mod evaluator;
pub mod event;
pub mod executor;
pub mod feedback;
pub mod fixed;
pub mod gate;
pub mod graph;
pub mod id;
pub mod node;
pub mod persist;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

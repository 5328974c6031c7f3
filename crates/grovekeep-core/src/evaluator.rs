//! Side-effect-free eligibility and visibility checks.

use crate::graph::ProgressionGraph;
use crate::id::NodeId;
use crate::node::{Prerequisite, ProgressionNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Why an unlock request was refused. Expected outcomes, never faults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// The node is already at `max_level`.
    AlreadyMaxed,
    /// A prerequisite is below its required level.
    PrerequisiteUnmet {
        prerequisite: NodeId,
        required_level: u32,
    },
    /// The external gate (e.g. player level) does not hold.
    GateUnmet,
    /// The balance does not cover the next level's price.
    InsufficientCurrency { price: u64, balance: u64 },
}

/// How far ahead of the player's progress a chain reveals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevealPolicy {
    /// A node is revealed once its own prerequisites are satisfied.
    #[default]
    Direct,
    /// A node is also revealed when every prerequisite is revealed within
    /// `depth - 1` hops. `depth: 1` behaves like `Direct`.
    Transitive { depth: u32 },
}

impl RevealPolicy {
    /// Number of hops past satisfied prerequisites that are revealed.
    pub fn depth(self) -> u32 {
        match self {
            RevealPolicy::Direct => 1,
            RevealPolicy::Transitive { depth } => depth.max(1),
        }
    }
}

/// Display-level availability of a node. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Revealed,
}

/// Pure eligibility predicate over a graph, a balance, and a gate result.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnlockEvaluator {
    reveal: RevealPolicy,
}

impl UnlockEvaluator {
    pub fn new(reveal: RevealPolicy) -> Self {
        Self { reveal }
    }

    pub fn reveal_policy(&self) -> RevealPolicy {
        self.reveal
    }

    /// Check whether `node` can go to its next level. On success returns the
    /// price to pay; on failure the first reason found, checked in the order
    /// maxed, prerequisites, gate, currency.
    pub fn evaluate(
        &self,
        node: &ProgressionNode,
        graph: &ProgressionGraph,
        balance: u64,
        gate_ok: bool,
    ) -> Result<u64, RejectReason> {
        if node.is_maxed() {
            return Err(RejectReason::AlreadyMaxed);
        }

        if let Some(prereq) = first_unmet_prerequisite(node, graph) {
            return Err(RejectReason::PrerequisiteUnmet {
                prerequisite: prereq.node.clone(),
                required_level: prereq.min_level,
            });
        }

        if !gate_ok {
            return Err(RejectReason::GateUnmet);
        }

        // A maxed check passed and validation guarantees tables cover every
        // level below the cap, so a missing price only means bad state.
        let price = node.next_price().unwrap_or(u64::MAX);
        if balance < price {
            return Err(RejectReason::InsufficientCurrency { price, balance });
        }

        Ok(price)
    }

    pub fn can_unlock(
        &self,
        node: &ProgressionNode,
        graph: &ProgressionGraph,
        balance: u64,
        gate_ok: bool,
    ) -> bool {
        self.evaluate(node, graph, balance, gate_ok).is_ok()
    }

    /// Visibility of one node under this evaluator's reveal policy.
    pub fn visibility(&self, node: &ProgressionNode, graph: &ProgressionGraph) -> Visibility {
        let mut memo = HashMap::new();
        if is_revealed(node, graph, self.reveal.depth(), &mut memo) {
            Visibility::Revealed
        } else {
            Visibility::Hidden
        }
    }
}

/// Revealed within `hops`: no prerequisites, already unlocked, prerequisites
/// satisfied, or (with hops to spare) every prerequisite revealed one hop
/// closer.
fn is_revealed<'g>(
    node: &'g ProgressionNode,
    graph: &'g ProgressionGraph,
    hops: u32,
    memo: &mut HashMap<(&'g NodeId, u32), bool>,
) -> bool {
    if let Some(&known) = memo.get(&(node.id(), hops)) {
        return known;
    }

    let prereqs = &node.def().prerequisites;
    let revealed = prereqs.is_empty()
        || node.is_unlocked()
        || first_unmet_prerequisite(node, graph).is_none()
        || (hops > 1
            && prereqs.iter().all(|p| {
                graph
                    .get_node(p.node.as_str())
                    .is_some_and(|parent| is_revealed(parent, graph, hops - 1, memo))
            }));

    memo.insert((node.id(), hops), revealed);
    revealed
}

/// The first prerequisite below its required level, in definition order.
/// A prerequisite missing from the graph counts as unmet.
pub fn first_unmet_prerequisite<'n>(
    node: &'n ProgressionNode,
    graph: &ProgressionGraph,
) -> Option<&'n Prerequisite> {
    node.def().prerequisites.iter().find(|prereq| {
        graph
            .get_node(prereq.node.as_str())
            .is_none_or(|p| p.level() < prereq.min_level)
    })
}

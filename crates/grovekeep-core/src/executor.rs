//! The only mutating operation on a progression graph.

use crate::evaluator::{RejectReason, UnlockEvaluator, Visibility};
use crate::gate::{GateEvaluator, gate_passes};
use crate::graph::{ProgressionError, ProgressionGraph};
use crate::id::NodeId;

/// What a successful unlock did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockReceipt {
    pub node: NodeId,
    /// Level reached by this unlock.
    pub level: u32,
    /// Currency debited.
    pub price: u64,
    /// Balance after the debit.
    pub balance: u64,
    /// The node itself and any direct dependents whose eligibility flipped.
    pub eligibility_changed: Vec<NodeId>,
    /// Descendants that went from hidden to revealed.
    pub revealed: Vec<NodeId>,
}

/// Outcome of an unlock request. Rejection is data, not a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockResult {
    NewLevel(UnlockReceipt),
    Rejected(RejectReason),
}

impl UnlockResult {
    pub fn is_unlocked(&self) -> bool {
        matches!(self, UnlockResult::NewLevel(_))
    }

    /// The level reached, if the unlock succeeded.
    pub fn level(&self) -> Option<u32> {
        match self {
            UnlockResult::NewLevel(receipt) => Some(receipt.level),
            UnlockResult::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&RejectReason> {
        match self {
            UnlockResult::NewLevel(_) => None,
            UnlockResult::Rejected(reason) => Some(reason),
        }
    }
}

/// Applies unlocks: debit, level-up, growth pricing, and change reporting,
/// all or nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnlockExecutor {
    evaluator: UnlockEvaluator,
}

impl UnlockExecutor {
    pub fn new(evaluator: UnlockEvaluator) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &UnlockEvaluator {
        &self.evaluator
    }

    /// Unlock the next level of `id`.
    ///
    /// Re-evaluates eligibility first; a rejection leaves the graph and the
    /// balance untouched. `Err` is reserved for ids the graph does not know.
    pub fn unlock(
        &self,
        graph: &mut ProgressionGraph,
        balance: &mut u64,
        id: &str,
        gates: &dyn GateEvaluator,
    ) -> Result<UnlockResult, ProgressionError> {
        let node = graph.node(id)?;
        let gate_ok = gate_passes(node, gates);
        let price = match self.evaluator.evaluate(node, graph, *balance, gate_ok) {
            Ok(price) => price,
            Err(reason) => return Ok(UnlockResult::Rejected(reason)),
        };
        let node_id = node.id().clone();

        let mut affected: Vec<NodeId> = vec![node_id.clone()];
        affected.extend(graph.dependents_of(id).iter().cloned());
        let eligible_before = self.eligibility(graph, *balance, &affected, gates);

        let reveal_scope = self.reveal_scope(graph, id);
        let hidden_before: Vec<NodeId> = reveal_scope
            .into_iter()
            .filter(|dep| self.visibility_of(graph, dep) == Visibility::Hidden)
            .collect();

        // Evaluation passed, so the price fits in the balance.
        let new_balance = balance.saturating_sub(price);
        let Some(node) = graph.node_mut(id) else {
            return Err(ProgressionError::NodeNotFound(node_id));
        };
        let next_override = node.def().cost.next_override(price);
        let state = node.state_mut();
        state.current_level += 1;
        state.spent = state.spent.saturating_add(price);
        state.cost_override = next_override;
        let level = state.current_level;
        *balance = new_balance;

        let eligible_after = self.eligibility(graph, *balance, &affected, gates);
        let eligibility_changed = affected
            .into_iter()
            .zip(eligible_before.into_iter().zip(eligible_after))
            .filter(|(_, (before, after))| before != after)
            .map(|(id, _)| id)
            .collect();

        let revealed = hidden_before
            .into_iter()
            .filter(|dep| self.visibility_of(graph, dep) == Visibility::Revealed)
            .collect();

        Ok(UnlockResult::NewLevel(UnlockReceipt {
            node: node_id,
            level,
            price,
            balance: new_balance,
            eligibility_changed,
            revealed,
        }))
    }

    fn eligibility(
        &self,
        graph: &ProgressionGraph,
        balance: u64,
        ids: &[NodeId],
        gates: &dyn GateEvaluator,
    ) -> Vec<bool> {
        ids.iter()
            .map(|id| {
                graph.get_node(id.as_str()).is_some_and(|node| {
                    self.evaluator
                        .can_unlock(node, graph, balance, gate_passes(node, gates))
                })
            })
            .collect()
    }

    /// Nodes whose visibility an unlock of `id` can change: direct
    /// dependents, or every descendant when reveal looks further ahead.
    fn reveal_scope(&self, graph: &ProgressionGraph, id: &str) -> Vec<NodeId> {
        if self.evaluator.reveal_policy().depth() > 1 {
            graph.descendants_of(id)
        } else {
            graph.dependents_of(id).to_vec()
        }
    }

    fn visibility_of(&self, graph: &ProgressionGraph, id: &NodeId) -> Visibility {
        graph
            .get_node(id.as_str())
            .map_or(Visibility::Hidden, |node| {
                self.evaluator.visibility(node, graph)
            })
    }
}

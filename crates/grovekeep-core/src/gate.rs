//! External gate evaluation. The graph only describes a gate; whoever owns
//! the condition (player profile, quest log) answers it.

use crate::node::{Gate, ProgressionNode};
use std::cell::Cell;
use std::rc::Rc;

/// Answers gate conditions that live outside the progression graph.
pub trait GateEvaluator {
    fn evaluate(&self, gate: &Gate) -> bool;
}

impl<F> GateEvaluator for F
where
    F: Fn(&Gate) -> bool,
{
    fn evaluate(&self, gate: &Gate) -> bool {
        self(gate)
    }
}

/// Every gate holds. The default for features without external gates.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGates;

impl GateEvaluator for OpenGates {
    fn evaluate(&self, _gate: &Gate) -> bool {
        true
    }
}

/// Shared, settable player level for world-map style gates.
///
/// Clones share the same level, so the player profile can hold one handle
/// and the store another.
#[derive(Debug, Clone, Default)]
pub struct PlayerLevel(Rc<Cell<u32>>);

impl PlayerLevel {
    pub fn new(level: u32) -> Self {
        Self(Rc::new(Cell::new(level)))
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }

    pub fn set(&self, level: u32) {
        self.0.set(level);
    }
}

impl GateEvaluator for PlayerLevel {
    /// `Custom` gates are unknown to a level provider and never hold.
    fn evaluate(&self, gate: &Gate) -> bool {
        match gate {
            Gate::MinPlayerLevel(required) => self.get() >= *required,
            Gate::Custom(_) => false,
        }
    }
}

/// Resolve a node's gate. Nodes without a gate always pass.
pub fn gate_passes(node: &ProgressionNode, gates: &dyn GateEvaluator) -> bool {
    node.def()
        .gate
        .as_ref()
        .is_none_or(|gate| gates.evaluate(gate))
}

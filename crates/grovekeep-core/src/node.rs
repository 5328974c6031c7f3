//! Progression nodes: a static [`NodeDef`] compiled into the build plus the
//! mutable [`NodeState`] that is persisted.

use crate::cost::CostSchedule;
use crate::fixed::Fixed64;
use crate::id::NodeId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Definition data
// ---------------------------------------------------------------------------

/// Where a node is drawn. Display only; unlock logic never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// Research tier (1-indexed column).
    Tier(u32),
    /// Skill-tree or world-map coordinates.
    Point { x: i32, y: i32 },
}

/// A node that must reach `min_level` before the dependent becomes eligible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prerequisite {
    pub node: NodeId,
    pub min_level: u32,
}

impl Prerequisite {
    /// Requires the node to be unlocked (level >= 1).
    pub fn new(node: impl Into<NodeId>) -> Self {
        Self {
            node: node.into(),
            min_level: 1,
        }
    }

    pub fn at_level(node: impl Into<NodeId>, min_level: u32) -> Self {
        Self {
            node: node.into(),
            min_level,
        }
    }
}

/// A condition outside the graph. The graph stores only the description;
/// the caller supplies the result through a
/// [`GateEvaluator`](crate::gate::GateEvaluator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gate {
    /// The player must have reached this level.
    MinPlayerLevel(u32),
    /// Game-defined condition. The key is opaque to the engine.
    Custom(String),
}

/// Gameplay impact of a node. Opaque to the graph; game systems that consume
/// unlocks interpret it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    #[default]
    None,
    /// Game-defined effect key.
    Custom(String),
    /// A stat bonus applied once per level.
    Modifier { stat: String, per_level: Fixed64 },
}

/// Static definition of a node. Immutable after the graph is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDef {
    pub id: NodeId,
    pub name: String,
    pub placement: Placement,
    pub cost: CostSchedule,
    /// 1 for single-shot unlocks, greater for leveled nodes.
    pub max_level: u32,
    pub prerequisites: Vec<Prerequisite>,
    pub gate: Option<Gate>,
    pub effect: Effect,
    /// Permanently owned nodes keep their level across a reset.
    pub permanent: bool,
    /// Level the node starts at. Seed nodes start already owned.
    pub initial_level: u32,
}

impl NodeDef {
    /// A single-level node with no prerequisites, placed at tier 1.
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>, cost: CostSchedule) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            placement: Placement::Tier(1),
            cost,
            max_level: 1,
            prerequisites: Vec::new(),
            gate: None,
            effect: Effect::None,
            permanent: false,
            initial_level: 0,
        }
    }

    pub fn with_max_level(mut self, max_level: u32) -> Self {
        self.max_level = max_level;
        self
    }

    pub fn requires(mut self, node: impl Into<NodeId>) -> Self {
        self.prerequisites.push(Prerequisite::new(node));
        self
    }

    pub fn requires_level(mut self, node: impl Into<NodeId>, min_level: u32) -> Self {
        self.prerequisites.push(Prerequisite::at_level(node, min_level));
        self
    }

    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = effect;
        self
    }

    pub fn at(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn permanent(mut self) -> Self {
        self.permanent = true;
        self
    }

    /// Start fully owned (`initial_level == max_level`). Call after
    /// [`with_max_level`](Self::with_max_level).
    pub fn owned(mut self) -> Self {
        self.initial_level = self.max_level;
        self
    }
}

// ---------------------------------------------------------------------------
// Runtime state
// ---------------------------------------------------------------------------

/// The mutable part of a node. This is all that gets persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    /// 0 means locked.
    pub current_level: u32,
    /// Runtime price of the next level for growth schedules.
    pub cost_override: Option<u64>,
    /// Currency paid into this node since the last reset.
    pub spent: u64,
}

/// Lifecycle of a node as the player sees it. Only moves forward until a
/// reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    /// Level 0 and not currently unlockable.
    Locked,
    /// Level 0 and unlockable right now.
    Eligible,
    /// Owned at the given level, below the cap.
    Unlocked(u32),
    /// At `max_level`.
    Maxed,
}

/// A definition paired with its current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionNode {
    def: NodeDef,
    state: NodeState,
}

impl ProgressionNode {
    pub(crate) fn new(def: NodeDef) -> Self {
        let state = NodeState {
            current_level: def.initial_level,
            cost_override: None,
            spent: 0,
        };
        Self { def, state }
    }

    pub fn id(&self) -> &NodeId {
        &self.def.id
    }

    pub fn def(&self) -> &NodeDef {
        &self.def
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut NodeState {
        &mut self.state
    }

    pub fn level(&self) -> u32 {
        self.state.current_level
    }

    pub fn max_level(&self) -> u32 {
        self.def.max_level
    }

    pub fn is_unlocked(&self) -> bool {
        self.state.current_level > 0
    }

    pub fn is_maxed(&self) -> bool {
        self.state.current_level >= self.def.max_level
    }

    /// Price of the next level, or `None` once maxed.
    pub fn next_price(&self) -> Option<u64> {
        if self.is_maxed() {
            return None;
        }
        self.def
            .cost
            .price_at(self.state.current_level, self.state.cost_override)
    }

    /// Status given the externally computed eligibility.
    pub fn status(&self, eligible: bool) -> NodeStatus {
        match self.state.current_level {
            _ if self.is_maxed() => NodeStatus::Maxed,
            0 if eligible => NodeStatus::Eligible,
            0 => NodeStatus::Locked,
            level => NodeStatus::Unlocked(level),
        }
    }

    /// Back to level 0 with no price override and nothing spent.
    pub(crate) fn clear(&mut self) {
        self.state = NodeState::default();
    }
}

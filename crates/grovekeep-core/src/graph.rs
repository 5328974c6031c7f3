use crate::id::NodeId;
use crate::node::{NodeDef, NodeState, ProgressionNode};
use std::collections::{HashMap, HashSet, VecDeque};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Definition data that cannot form a valid graph. Fatal at construction:
/// the feature must not start on an inconsistent graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("duplicate node id: {0}")]
    DuplicateId(NodeId),

    #[error("prerequisite {prerequisite} for node {node} does not exist")]
    UnknownPrerequisite { node: NodeId, prerequisite: NodeId },

    #[error("node {node} lists prerequisite {prerequisite} more than once")]
    DuplicatePrerequisite { node: NodeId, prerequisite: NodeId },

    #[error(
        "node {node} requires {prerequisite} at level {min_level}, but it caps at {max_level}"
    )]
    UnreachableThreshold {
        node: NodeId,
        prerequisite: NodeId,
        min_level: u32,
        max_level: u32,
    },

    #[error("node {0} must have max_level >= 1")]
    InvalidMaxLevel(NodeId),

    #[error("cost table for node {node} has {prices} prices but max_level is {max_level}")]
    CostTableTooShort {
        node: NodeId,
        prices: usize,
        max_level: u32,
    },

    #[error("node {node} starts at level {initial_level} above max_level {max_level}")]
    InitialLevelOutOfRange {
        node: NodeId,
        initial_level: u32,
        max_level: u32,
    },

    #[error("prerequisite cycle detected: {0:?}")]
    CycleDetected(Vec<NodeId>),
}

/// Errors from runtime graph queries and commands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressionError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),
}

// ---------------------------------------------------------------------------
// ProgressionGraph
// ---------------------------------------------------------------------------

/// The full set of nodes for one feature, plus the reverse prerequisite index.
///
/// Built once from definitions and validated on construction. Node order is
/// definition order, which keeps every iteration deterministic. Levels change
/// only through the [`UnlockExecutor`](crate::executor::UnlockExecutor) and the
/// store's reset.
#[derive(Debug, Clone)]
pub struct ProgressionGraph {
    nodes: Vec<ProgressionNode>,
    index: HashMap<NodeId, usize>,
    /// For each node (by position), the nodes that list it as a prerequisite.
    dependents: Vec<Vec<NodeId>>,
}

impl ProgressionGraph {
    /// Build and validate a graph from definitions.
    pub fn new(defs: Vec<NodeDef>) -> Result<Self, ConfigError> {
        let mut index = HashMap::with_capacity(defs.len());
        for (pos, def) in defs.iter().enumerate() {
            if index.insert(def.id.clone(), pos).is_some() {
                return Err(ConfigError::DuplicateId(def.id.clone()));
            }
        }

        let mut dependents = vec![Vec::new(); defs.len()];
        for def in &defs {
            for prereq in &def.prerequisites {
                if let Some(&pos) = index.get(&prereq.node) {
                    dependents[pos].push(def.id.clone());
                }
            }
        }

        let graph = Self {
            nodes: defs.into_iter().map(ProgressionNode::new).collect(),
            index,
            dependents,
        };
        graph.validate()?;
        Ok(graph)
    }

    /// Check structural integrity: per-node limits, resolvable and unique
    /// prerequisites, reachable thresholds, and acyclicity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for node in &self.nodes {
            let def = node.def();
            if def.max_level == 0 {
                return Err(ConfigError::InvalidMaxLevel(def.id.clone()));
            }
            if def.initial_level > def.max_level {
                return Err(ConfigError::InitialLevelOutOfRange {
                    node: def.id.clone(),
                    initial_level: def.initial_level,
                    max_level: def.max_level,
                });
            }
            if !def.cost.covers(def.max_level) {
                let prices = match &def.cost {
                    crate::cost::CostSchedule::Table(prices) => prices.len(),
                    _ => 0,
                };
                return Err(ConfigError::CostTableTooShort {
                    node: def.id.clone(),
                    prices,
                    max_level: def.max_level,
                });
            }

            let mut seen = HashSet::new();
            for prereq in &def.prerequisites {
                if !seen.insert(&prereq.node) {
                    return Err(ConfigError::DuplicatePrerequisite {
                        node: def.id.clone(),
                        prerequisite: prereq.node.clone(),
                    });
                }
                let Some(target) = self.get_node(prereq.node.as_str()) else {
                    return Err(ConfigError::UnknownPrerequisite {
                        node: def.id.clone(),
                        prerequisite: prereq.node.clone(),
                    });
                };
                if prereq.min_level > target.max_level() {
                    return Err(ConfigError::UnreachableThreshold {
                        node: def.id.clone(),
                        prerequisite: prereq.node.clone(),
                        min_level: prereq.min_level,
                        max_level: target.max_level(),
                    });
                }
            }
        }

        self.topological_order().map(|_| ())
    }

    // -- Query API --

    pub fn get_node(&self, id: &str) -> Option<&ProgressionNode> {
        self.index.get(id).map(|&pos| &self.nodes[pos])
    }

    /// Like [`get_node`](Self::get_node) but reports a missing id as an error.
    pub fn node(&self, id: &str) -> Result<&ProgressionNode, ProgressionError> {
        self.get_node(id)
            .ok_or_else(|| ProgressionError::NodeNotFound(NodeId::from(id)))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Nodes that list `id` as a prerequisite. Empty for unknown ids.
    pub fn dependents_of(&self, id: &str) -> &[NodeId] {
        self.index
            .get(id)
            .map(|&pos| self.dependents[pos].as_slice())
            .unwrap_or(&[])
    }

    /// Every node reachable from `id` through dependents, nearest first.
    pub fn descendants_of(&self, id: &str) -> Vec<NodeId> {
        let mut seen: HashSet<&NodeId> = HashSet::new();
        let mut order = Vec::new();
        let mut queue: VecDeque<&NodeId> = self.dependents_of(id).iter().collect();
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            order.push(next.clone());
            queue.extend(self.dependents_of(next.as_str()));
        }
        order
    }

    /// All nodes in definition order.
    pub fn nodes(&self) -> impl Iterator<Item = &ProgressionNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `(prerequisite, dependent)` pairs in definition order. Used to draw
    /// skill-tree connection lines.
    pub fn connections(&self) -> Vec<(NodeId, NodeId)> {
        self.nodes
            .iter()
            .flat_map(|node| {
                node.def()
                    .prerequisites
                    .iter()
                    .map(|prereq| (prereq.node.clone(), node.id().clone()))
            })
            .collect()
    }

    /// Prerequisites before dependents. Ties resolve in definition order.
    ///
    /// Runs Kahn's algorithm. If nodes remain, one of the cycles among them is
    /// reported.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, ConfigError> {
        let mut in_degree: Vec<usize> = self
            .nodes
            .iter()
            .map(|node| {
                node.def()
                    .prerequisites
                    .iter()
                    .filter(|p| self.contains(p.node.as_str()))
                    .count()
            })
            .collect();

        let mut queue: VecDeque<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, deg)| **deg == 0)
            .map(|(pos, _)| pos)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(pos) = queue.pop_front() {
            order.push(self.nodes[pos].id().clone());
            for dependent in &self.dependents[pos] {
                let dep_pos = self.index[dependent];
                in_degree[dep_pos] -= 1;
                if in_degree[dep_pos] == 0 {
                    queue.push_back(dep_pos);
                }
            }
        }

        if order.len() < self.nodes.len() {
            return Err(ConfigError::CycleDetected(self.find_cycle(&in_degree)));
        }
        Ok(order)
    }

    /// Walk prerequisite edges among the nodes Kahn's algorithm left behind
    /// until one repeats. Every leftover node has a leftover prerequisite, so
    /// the walk always closes a loop.
    fn find_cycle(&self, in_degree: &[usize]) -> Vec<NodeId> {
        let Some(start) = in_degree.iter().position(|deg| *deg > 0) else {
            return Vec::new();
        };

        let mut path: Vec<usize> = Vec::new();
        let mut on_path: HashMap<usize, usize> = HashMap::new();
        let mut current = start;
        loop {
            if let Some(&at) = on_path.get(&current) {
                return path[at..]
                    .iter()
                    .map(|&pos| self.nodes[pos].id().clone())
                    .collect();
            }
            on_path.insert(current, path.len());
            path.push(current);

            let next = self.nodes[current]
                .def()
                .prerequisites
                .iter()
                .filter_map(|p| self.index.get(&p.node).copied())
                .find(|&pos| in_degree[pos] > 0);
            match next {
                Some(pos) => current = pos,
                None => return path.iter().map(|&p| self.nodes[p].id().clone()).collect(),
            }
        }
    }

    // -- Mutation (crate-internal) --

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut ProgressionNode> {
        self.index.get(id).map(|&pos| &mut self.nodes[pos])
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut ProgressionNode> {
        self.nodes.iter_mut()
    }

    /// Overwrite a node's state from a save. The level is clamped to the cap.
    pub(crate) fn restore_state(&mut self, id: &str, mut state: NodeState) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        state.current_level = state.current_level.min(node.max_level());
        *node.state_mut() = state;
        true
    }
}

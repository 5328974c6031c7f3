//! Serde structs for feature definition files.
//!
//! These mirror the core node types in a file-friendly shape: plain strings
//! for ids, `f64` for multipliers, optional fields with defaults. They are
//! resolved into core types by [`resolve`](crate::resolve).

use serde::Deserialize;

// ===========================================================================
// Feature
// ===========================================================================

/// One feature's definition file.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureData {
    /// Storage key suffix and log label, e.g. `"research"`.
    pub feature: String,
    #[serde(default)]
    pub starting_balance: u64,
    #[serde(default)]
    pub reveal: RevealData,
    #[serde(default)]
    pub refund_on_reset: bool,
    pub nodes: Vec<NodeData>,
}

/// How far ahead locked nodes are revealed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum RevealData {
    #[default]
    Direct,
    Transitive { depth: u32 },
}

// ===========================================================================
// Nodes
// ===========================================================================

/// A node definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub placement: PlacementData,
    pub cost: CostData,
    #[serde(default = "default_max_level")]
    pub max_level: u32,
    #[serde(default)]
    pub prerequisites: Vec<PrerequisiteData>,
    #[serde(default)]
    pub gate: Option<GateData>,
    #[serde(default)]
    pub effect: EffectData,
    #[serde(default)]
    pub permanent: bool,
    /// Start at `max_level` (seed nodes).
    #[serde(default)]
    pub owned: bool,
}

fn default_max_level() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PlacementData {
    Tier(u32),
    Point { x: i32, y: i32 },
}

impl Default for PlacementData {
    fn default() -> Self {
        PlacementData::Tier(1)
    }
}

/// A prerequisite entry, either a bare id (level 1) or an id with a level.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PrerequisiteData {
    /// Short form: `"node_id"`.
    Id(String),
    /// Full form with an explicit level threshold.
    Leveled { node: String, min_level: u32 },
}

impl PrerequisiteData {
    pub fn node(&self) -> &str {
        match self {
            PrerequisiteData::Id(node) => node,
            PrerequisiteData::Leveled { node, .. } => node,
        }
    }

    pub fn min_level(&self) -> u32 {
        match self {
            PrerequisiteData::Id(_) => 1,
            PrerequisiteData::Leveled { min_level, .. } => *min_level,
        }
    }
}

/// Price schedule of a node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum CostData {
    Flat(u64),
    Table(Vec<u64>),
    Linear { base: u64, increment: u64 },
    Growth { base: u64, multiplier: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum GateData {
    MinPlayerLevel(u32),
    Custom(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub enum EffectData {
    #[default]
    None,
    Custom(String),
    Modifier { stat: String, per_level: f64 },
}

// ===========================================================================
// Tests
// ===========================================================================

//! Turns parsed [`FeatureData`] into core types.

use crate::loader::DataLoadError;
use crate::schema::{
    CostData, EffectData, FeatureData, GateData, NodeData, PlacementData, RevealData,
};
use grovekeep_core::cost::CostSchedule;
use grovekeep_core::evaluator::RevealPolicy;
use grovekeep_core::fixed::f64_to_fixed64;
use grovekeep_core::graph::ProgressionGraph;
use grovekeep_core::node::{Effect, Gate, NodeDef, Placement};
use grovekeep_core::persist::KeyValueStore;
use grovekeep_core::store::{ProgressionStore, StoreConfig, StoreError};
use std::path::Path;

/// A validated feature, ready to open a store over.
#[derive(Debug, Clone)]
pub struct FeatureDefinition {
    pub feature: String,
    pub config: StoreConfig,
    pub graph: ProgressionGraph,
}

impl FeatureDefinition {
    /// Open this feature's store, restoring any save the backend holds.
    pub fn open_store(
        self,
        backend: Box<dyn KeyValueStore>,
    ) -> Result<ProgressionStore, StoreError> {
        ProgressionStore::open(self.feature, self.graph, self.config, backend)
    }
}

/// Resolve a parsed feature file. `file` is used for error context.
pub fn resolve_feature(data: FeatureData, file: &Path) -> Result<FeatureDefinition, DataLoadError> {
    let defs = data
        .nodes
        .iter()
        .map(|node| resolve_node(node, file))
        .collect::<Result<Vec<_>, DataLoadError>>()?;

    let graph = ProgressionGraph::new(defs).map_err(|source| DataLoadError::Graph {
        file: file.to_path_buf(),
        source,
    })?;

    Ok(FeatureDefinition {
        feature: data.feature,
        config: StoreConfig {
            reveal: resolve_reveal(data.reveal),
            refund_on_reset: data.refund_on_reset,
            starting_balance: data.starting_balance,
        },
        graph,
    })
}

fn resolve_node(data: &NodeData, file: &Path) -> Result<NodeDef, DataLoadError> {
    let invalid = |detail: String| DataLoadError::InvalidValue {
        file: file.to_path_buf(),
        node: data.id.clone(),
        detail,
    };

    let cost = resolve_cost(&data.cost).map_err(invalid)?;
    let effect = resolve_effect(&data.effect).map_err(invalid)?;

    let mut def = NodeDef::new(data.id.as_str(), data.name.as_str(), cost)
        .with_max_level(data.max_level)
        .at(resolve_placement(data.placement))
        .with_effect(effect);
    for prereq in &data.prerequisites {
        def = def.requires_level(prereq.node(), prereq.min_level());
    }
    if let Some(gate) = &data.gate {
        def = def.with_gate(resolve_gate(gate));
    }
    if data.permanent {
        def = def.permanent();
    }
    if data.owned {
        def = def.owned();
    }
    Ok(def)
}

fn resolve_cost(data: &CostData) -> Result<CostSchedule, String> {
    match data {
        CostData::Flat(price) => Ok(CostSchedule::Flat(*price)),
        CostData::Table(prices) => Ok(CostSchedule::Table(prices.clone())),
        CostData::Linear { base, increment } => Ok(CostSchedule::Linear {
            base: *base,
            increment: *increment,
        }),
        CostData::Growth { base, multiplier } => {
            if !multiplier.is_finite() || *multiplier <= 0.0 {
                return Err(format!("growth multiplier must be positive, got {multiplier}"));
            }
            Ok(CostSchedule::Growth {
                base: *base,
                multiplier: f64_to_fixed64(*multiplier),
            })
        }
    }
}

fn resolve_effect(data: &EffectData) -> Result<Effect, String> {
    match data {
        EffectData::None => Ok(Effect::None),
        EffectData::Custom(key) => Ok(Effect::Custom(key.clone())),
        EffectData::Modifier { stat, per_level } => {
            if !per_level.is_finite() {
                return Err(format!("modifier '{stat}' is not finite"));
            }
            Ok(Effect::Modifier {
                stat: stat.clone(),
                per_level: f64_to_fixed64(*per_level),
            })
        }
    }
}

fn resolve_gate(data: &GateData) -> Gate {
    match data {
        GateData::MinPlayerLevel(level) => Gate::MinPlayerLevel(*level),
        GateData::Custom(key) => Gate::Custom(key.clone()),
    }
}

fn resolve_placement(data: PlacementData) -> Placement {
    match data {
        PlacementData::Tier(tier) => Placement::Tier(tier),
        PlacementData::Point { x, y } => Placement::Point { x, y },
    }
}

fn resolve_reveal(data: RevealData) -> RevealPolicy {
    match data {
        RevealData::Direct => RevealPolicy::Direct,
        RevealData::Transitive { depth } => RevealPolicy::Transitive { depth },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PrerequisiteData;
    use grovekeep_core::fixed::f64_to_fixed64;
    use grovekeep_core::node::Prerequisite;

    fn node(id: &str, cost: CostData) -> NodeData {
        NodeData {
            id: id.to_string(),
            name: id.to_uppercase(),
            placement: PlacementData::default(),
            cost,
            max_level: 1,
            prerequisites: Vec::new(),
            gate: None,
            effect: EffectData::None,
            permanent: false,
            owned: false,
        }
    }

    fn feature(nodes: Vec<NodeData>) -> FeatureData {
        FeatureData {
            feature: "test".to_string(),
            starting_balance: 0,
            reveal: RevealData::Direct,
            refund_on_reset: false,
            nodes,
        }
    }

    #[test]
    fn resolves_every_field() {
        let mut data = node("thorns", CostData::Growth { base: 100, multiplier: 1.5 });
        data.max_level = 3;
        data.placement = PlacementData::Point { x: 2, y: 1 };
        data.prerequisites = vec![PrerequisiteData::Id("bark".to_string())];
        data.gate = Some(GateData::MinPlayerLevel(4));
        data.effect = EffectData::Modifier {
            stat: "damage".to_string(),
            per_level: 0.25,
        };

        let def = resolve_node(&data, Path::new("skills.toml")).unwrap();
        assert_eq!(def.id.as_str(), "thorns");
        assert_eq!(def.name, "THORNS");
        assert_eq!(def.max_level, 3);
        assert_eq!(def.placement, Placement::Point { x: 2, y: 1 });
        assert_eq!(def.prerequisites, vec![Prerequisite::new("bark")]);
        assert_eq!(def.gate, Some(Gate::MinPlayerLevel(4)));
        assert_eq!(
            def.cost,
            CostSchedule::Growth {
                base: 100,
                multiplier: f64_to_fixed64(1.5)
            }
        );
        assert_eq!(
            def.effect,
            Effect::Modifier {
                stat: "damage".to_string(),
                per_level: f64_to_fixed64(0.25)
            }
        );
    }

    #[test]
    fn owned_nodes_start_maxed() {
        let mut seed = node("seed", CostData::Flat(0));
        seed.owned = true;
        seed.max_level = 2;
        let def = resolve_feature(feature(vec![seed]), Path::new("f.ron")).unwrap();
        let node = def.graph.get_node("seed").unwrap();
        assert!(node.is_maxed());
    }

    #[test]
    fn bad_multiplier_is_rejected() {
        let data = feature(vec![node(
            "s",
            CostData::Growth {
                base: 10,
                multiplier: -2.0,
            },
        )]);
        let err = resolve_feature(data, Path::new("f.ron")).unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidValue { ref node, .. } if node == "s"));
    }

    #[test]
    fn unknown_prerequisite_is_a_graph_error() {
        let mut orphan = node("orphan", CostData::Flat(5));
        orphan.prerequisites = vec![PrerequisiteData::Id("ghost".to_string())];
        let err = resolve_feature(feature(vec![orphan]), Path::new("f.ron")).unwrap_err();
        assert!(matches!(err, DataLoadError::Graph { .. }));
    }

    #[test]
    fn store_config_follows_file() {
        let mut data = feature(vec![node("a", CostData::Flat(1))]);
        data.starting_balance = 250;
        data.refund_on_reset = true;
        data.reveal = RevealData::Transitive { depth: 3 };
        let def = resolve_feature(data, Path::new("f.ron")).unwrap();
        assert_eq!(
            def.config,
            StoreConfig {
                reveal: RevealPolicy::Transitive { depth: 3 },
                refund_on_reset: true,
                starting_balance: 250,
            }
        );
    }
}

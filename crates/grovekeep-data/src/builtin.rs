//! The game's three progression screens, embedded at compile time.
//!
//! Each screen is the same generic graph with different definitions:
//! research unlocks plants tier by tier, skills are leveled upgrades with
//! growing prices, and world-map zones are gated on the player's level.

use crate::loader::{DataLoadError, Format, deserialize_str};
use crate::resolve::{FeatureDefinition, resolve_feature};
use crate::schema::FeatureData;
use std::path::Path;
use tracing::debug;

pub const RESEARCH: &str = include_str!("../assets/research.ron");
pub const SKILLS: &str = include_str!("../assets/skills.toml");
pub const WORLD_MAP: &str = include_str!("../assets/world_map.json");

/// Names accepted by [`by_name`].
pub const FEATURES: [&str; 3] = ["research", "skills", "world_map"];

pub fn research() -> Result<FeatureDefinition, DataLoadError> {
    parse(RESEARCH, Format::Ron, "builtin/research.ron")
}

pub fn skills() -> Result<FeatureDefinition, DataLoadError> {
    parse(SKILLS, Format::Toml, "builtin/skills.toml")
}

pub fn world_map() -> Result<FeatureDefinition, DataLoadError> {
    parse(WORLD_MAP, Format::Json, "builtin/world_map.json")
}

/// Look up a built-in feature. `None` for names not in [`FEATURES`].
pub fn by_name(name: &str) -> Option<Result<FeatureDefinition, DataLoadError>> {
    match name {
        "research" => Some(research()),
        "skills" => Some(skills()),
        "world_map" => Some(world_map()),
        _ => None,
    }
}

fn parse(content: &str, format: Format, origin: &str) -> Result<FeatureDefinition, DataLoadError> {
    let origin = Path::new(origin);
    let data: FeatureData = deserialize_str(content, format, origin)?;
    let definition = resolve_feature(data, origin)?;
    debug!(
        target: "grovekeep::data",
        feature = %definition.feature,
        nodes = definition.graph.len(),
        "builtin.parsed"
    );
    Ok(definition)
}

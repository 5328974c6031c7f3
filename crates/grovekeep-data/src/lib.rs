//! Data-driven feature definitions for the progression core.
//!
//! A feature file (RON, TOML or JSON) describes one screen's nodes and store
//! settings. [`loader`] reads it, [`resolve`] turns it into a validated
//! [`ProgressionGraph`](grovekeep_core::graph::ProgressionGraph), and
//! [`builtin`] ships the game's three screens.

pub mod builtin;
pub mod loader;
pub mod resolve;
pub mod schema;

pub use loader::{DataLoadError, load_feature, load_feature_dir};
pub use resolve::FeatureDefinition;

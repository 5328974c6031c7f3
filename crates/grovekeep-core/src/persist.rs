//! Persistence of the mutable progression state.
//!
//! Only levels, growth price overrides, spent totals, and the balance are
//! written; definitions are compiled into the build. Blobs are `bitcode`
//! with a versioned header so a future format can be detected before
//! decoding.

use crate::graph::ProgressionGraph;
use crate::id::NodeId;
use crate::node::NodeState;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a Grovekeep progression save.
pub const SAVE_MAGIC: u32 = 0x6709_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors from saving or loading progression state. Never fatal to gameplay.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("storage backend failed for key {key}: {detail}")]
    Backend { key: String, detail: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SAVE_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("save from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
}

// ---------------------------------------------------------------------------
// Key-value service
// ---------------------------------------------------------------------------

/// The device key-value service. `get` returns `None` for absent keys.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError>;
    fn set(&mut self, key: &str, blob: &[u8]) -> Result<(), PersistError>;
}

/// In-memory backend. Clones share the same entries, which lets a test (or
/// a second screen) reopen the same save.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Rc<RefCell<HashMap<String, Vec<u8>>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.borrow_mut().remove(key)
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, blob: &[u8]) -> Result<(), PersistError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), blob.to_vec());
        Ok(())
    }
}

/// One file per key under a root directory. Keys may contain `/` to form
/// subdirectories. Within a segment, bytes outside `[A-Za-z0-9_-]` are
/// written as `%XX`, so distinct keys always map to distinct files.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Empty keys and empty segments (`"a//b"`, a leading or trailing `/`)
    /// have no file of their own and are rejected.
    fn path_for(&self, key: &str) -> Result<PathBuf, PersistError> {
        if key.is_empty() || key.split('/').any(str::is_empty) {
            return Err(PersistError::Backend {
                key: key.to_string(),
                detail: "key has an empty path segment".to_string(),
            });
        }
        let mut path = self.root.clone();
        for segment in key.split('/') {
            path.push(encode_segment(segment));
        }
        path.set_extension("sav");
        Ok(path)
    }
}

fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError> {
        match std::fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes to a sibling temp file and renames it into place, so a crash
    /// mid-write leaves the previous save intact.
    fn set(&mut self, key: &str, blob: &[u8]) -> Result<(), PersistError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("sav.tmp");
        std::fs::write(&tmp, blob)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Save format
// ---------------------------------------------------------------------------

/// Header prepended to every save. Checked before the payload is trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveHeader {
    pub magic: u32,
    pub version: u32,
}

impl SaveHeader {
    pub fn new() -> Self {
        Self {
            magic: SAVE_MAGIC,
            version: FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), PersistError> {
        if self.magic != SAVE_MAGIC {
            return Err(PersistError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(PersistError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(PersistError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

impl Default for SaveHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Persisted form of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedNode {
    pub current_level: u32,
    pub cost_override: Option<u64>,
    pub spent: u64,
}

impl From<&NodeState> for PersistedNode {
    fn from(state: &NodeState) -> Self {
        Self {
            current_level: state.current_level,
            cost_override: state.cost_override,
            spent: state.spent,
        }
    }
}

impl From<PersistedNode> for NodeState {
    fn from(node: PersistedNode) -> Self {
        Self {
            current_level: node.current_level,
            cost_override: node.cost_override,
            spent: node.spent,
        }
    }
}

/// Everything written for one feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub header: SaveHeader,
    pub balance: u64,
    /// Sorted by id so identical states encode to identical bytes.
    pub nodes: BTreeMap<NodeId, PersistedNode>,
}

impl PersistedState {
    /// Capture the mutable state of a graph and its balance.
    pub fn capture(graph: &ProgressionGraph, balance: u64) -> Self {
        Self {
            header: SaveHeader::new(),
            balance,
            nodes: graph
                .nodes()
                .map(|node| (node.id().clone(), PersistedNode::from(node.state())))
                .collect(),
        }
    }

    /// Apply saved node states onto a graph. Returns the ids that the graph
    /// does not define (left over from older content) so the caller can
    /// report them.
    pub fn apply_to(self, graph: &mut ProgressionGraph) -> Vec<NodeId> {
        let mut unknown = Vec::new();
        for (id, node) in self.nodes {
            if !graph.restore_state(id.as_str(), node.into()) {
                unknown.push(id);
            }
        }
        unknown
    }
}

/// Serialize state to a save blob.
pub fn encode_state(state: &PersistedState) -> Result<Vec<u8>, PersistError> {
    bitcode::serialize(state).map_err(|e| PersistError::Encode(e.to_string()))
}

/// Deserialize a save blob and validate its header.
pub fn decode_state(data: &[u8]) -> Result<PersistedState, PersistError> {
    let state: PersistedState =
        bitcode::deserialize(data).map_err(|e| PersistError::Decode(e.to_string()))?;
    state.header.validate()?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::CostSchedule;
    use crate::node::NodeDef;

    fn graph() -> ProgressionGraph {
        ProgressionGraph::new(vec![
            NodeDef::new("seed", "Seed", CostSchedule::Flat(0)).owned(),
            NodeDef::new("sprout", "Sprout", CostSchedule::Flat(100)).requires("seed"),
        ])
        .unwrap()
    }

    fn temp_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "grovekeep_persist_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn capture_then_apply_restores_levels() {
        let mut source = graph();
        source.node_mut("sprout").unwrap().state_mut().current_level = 1;
        let saved = decode_state(&encode_state(&PersistedState::capture(&source, 42)).unwrap())
            .unwrap();
        assert_eq!(saved.balance, 42);

        let mut target = graph();
        let unknown = saved.apply_to(&mut target);
        assert!(unknown.is_empty());
        assert_eq!(target.get_node("sprout").unwrap().level(), 1);
    }

    #[test]
    fn apply_reports_unknown_ids() {
        let mut state = PersistedState::capture(&graph(), 0);
        state.nodes.insert(
            NodeId::from("retired_node"),
            PersistedNode {
                current_level: 1,
                cost_override: None,
                spent: 10,
            },
        );
        let unknown = state.apply_to(&mut graph());
        assert_eq!(unknown, vec![NodeId::from("retired_node")]);
    }

    #[test]
    fn header_rejects_wrong_magic_and_versions() {
        let bad_magic = SaveHeader {
            magic: 0xDEAD_BEEF,
            version: FORMAT_VERSION,
        };
        assert!(matches!(
            bad_magic.validate(),
            Err(PersistError::InvalidMagic(0xDEAD_BEEF))
        ));

        let future = SaveHeader {
            magic: SAVE_MAGIC,
            version: FORMAT_VERSION + 1,
        };
        assert!(matches!(future.validate(), Err(PersistError::FutureVersion(_))));

        let old = SaveHeader {
            magic: SAVE_MAGIC,
            version: 0,
        };
        assert!(matches!(old.validate(), Err(PersistError::UnsupportedVersion(0))));
    }

    #[test]
    fn decode_garbage_fails() {
        assert!(decode_state(&[1, 2, 3]).is_err());
    }

    #[test]
    fn memory_store_clones_share_entries() {
        let mut a = MemoryKeyValueStore::new();
        let b = a.clone();
        a.set("progression/research", b"blob").unwrap();
        assert_eq!(b.get("progression/research").unwrap(), Some(b"blob".to_vec()));
        assert_eq!(b.get("progression/skills").unwrap(), None);
    }

    #[test]
    fn file_store_round_trip() {
        let dir = temp_dir("round_trip");
        let mut store = FileKeyValueStore::new(&dir);
        assert_eq!(store.get("progression/world map").unwrap(), None);

        store.set("progression/world map", b"zones").unwrap();
        assert_eq!(
            store.get("progression/world map").unwrap(),
            Some(b"zones".to_vec())
        );
        assert!(dir.join("progression").join("world%20map.sav").exists());

        store.set("progression/world map", b"zones v2").unwrap();
        assert_eq!(
            store.get("progression/world map").unwrap(),
            Some(b"zones v2".to_vec())
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_store_keeps_similar_keys_apart() {
        let dir = temp_dir("similar_keys");
        let mut store = FileKeyValueStore::new(&dir);
        store.set("progression/world map", b"spaced").unwrap();
        store.set("progression/world_map", b"underscored").unwrap();
        store.set("progression/world.map", b"dotted").unwrap();

        assert_eq!(store.get("progression/world map").unwrap(), Some(b"spaced".to_vec()));
        assert_eq!(
            store.get("progression/world_map").unwrap(),
            Some(b"underscored".to_vec())
        );
        assert_eq!(store.get("progression/world.map").unwrap(), Some(b"dotted".to_vec()));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_store_rejects_empty_segments() {
        let dir = temp_dir("empty_segments");
        let mut store = FileKeyValueStore::new(&dir);
        for key in ["", "/", "//", "progression/", "/research", "a//b"] {
            assert!(
                matches!(store.set(key, b"x"), Err(PersistError::Backend { .. })),
                "{key:?} should be rejected"
            );
            assert!(store.get(key).is_err(), "{key:?} should be rejected");
        }
        assert!(!dir.exists());
    }
}

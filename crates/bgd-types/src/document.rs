//! The project document model.
//!
//! A document is a list of named targets, each holding a flat, id-addressed
//! block graph plus keyed collections of variables, lists and binary assets.
//! Container extraction is an external collaborator; this module consumes
//! the already-extracted metadata JSON.
//!
//! Fields this engine does not interpret (coordinates, volume, layer order,
//! broadcast tables, ...) are preserved verbatim through flattened maps so
//! a replayed document round-trips them untouched.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DocumentError, DocumentResult};

/// A complete project document: targets plus uninterpreted metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    pub targets: Vec<Target>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ProjectDocument {
    /// Parse a document from raw metadata JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> DocumentResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Parse a document from a metadata JSON string.
    pub fn from_json_str(s: &str) -> DocumentResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Read and parse a document from an extracted metadata file on disk.
    ///
    /// An unreadable file is fatal to the whole comparison; the offending
    /// path is carried in the error.
    pub fn load(path: impl AsRef<Path>) -> DocumentResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_slice(&bytes)
    }

    /// Look up a target by name.
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// Look up a target by name, mutably.
    pub fn target_mut(&mut self, name: &str) -> Option<&mut Target> {
        self.targets.iter_mut().find(|t| t.name == name)
    }
}

/// A named actor (stage or sprite-equivalent) owning its own scripts and
/// resource collections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    #[serde(default, rename = "isStage")]
    pub is_stage: bool,
    /// Flat block graph: opaque id -> block record.
    #[serde(default)]
    pub blocks: BTreeMap<String, RawBlockEntry>,
    /// Variable entries keyed by opaque id; each entry is `[name, value]`
    /// with an optional trailing cloud flag.
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
    /// List entries keyed by opaque id; each entry is `[name, [items...]]`.
    #[serde(default)]
    pub lists: BTreeMap<String, Value>,
    #[serde(default)]
    pub costumes: Vec<Value>,
    #[serde(default)]
    pub sounds: Vec<Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Target {
    /// An empty target shell, created when replaying an addition into a
    /// document that does not yet contain the named target.
    pub fn shell(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_stage: false,
            blocks: BTreeMap::new(),
            variables: BTreeMap::new(),
            lists: BTreeMap::new(),
            costumes: Vec::new(),
            sounds: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// The variable collection keyed by variable name instead of opaque id.
    ///
    /// Entries keep their native `[name, value, ...]` shape. Entries whose
    /// name slot is not a string are unaddressable and skipped.
    pub fn variables_by_name(&self) -> BTreeMap<String, Value> {
        entries_by_name(self.variables.values())
    }

    /// The list collection keyed by list name instead of opaque id.
    pub fn lists_by_name(&self) -> BTreeMap<String, Value> {
        entries_by_name(self.lists.values())
    }

    /// The costume collection keyed by stable asset identity.
    pub fn costumes_by_key(&self) -> BTreeMap<String, Value> {
        assets_by_key(&self.costumes)
    }

    /// The sound collection keyed by stable asset identity.
    pub fn sounds_by_key(&self) -> BTreeMap<String, Value> {
        assets_by_key(&self.sounds)
    }

    /// The stable identity key of an asset entry.
    ///
    /// Prefers the content-addressed filename token (`md5ext`), then the
    /// `assetId` + `dataFormat` pair. An entry carrying neither gets a
    /// deterministic positional key derived from its index in the owning
    /// collection -- never a random fallback.
    pub fn asset_key(entry: &Value, index: usize) -> String {
        if let Some(md5ext) = entry.get("md5ext").and_then(Value::as_str) {
            return md5ext.to_string();
        }
        if let (Some(asset_id), Some(format)) = (
            entry.get("assetId").and_then(Value::as_str),
            entry.get("dataFormat").and_then(Value::as_str),
        ) {
            return format!("{asset_id}.{format}");
        }
        format!("@{index}")
    }
}

fn entries_by_name<'a>(entries: impl Iterator<Item = &'a Value>) -> BTreeMap<String, Value> {
    entries
        .filter_map(|entry| {
            let name = entry.get(0)?.as_str()?;
            Some((name.to_string(), entry.clone()))
        })
        .collect()
}

fn assets_by_key(entries: &[Value]) -> BTreeMap<String, Value> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| (Target::asset_key(entry, index), entry.clone()))
        .collect()
}

/// One entry in a target's flat block map.
///
/// Most entries are full [`RawBlock`] records. The native format also
/// stores bare variable/list reporters as compact arrays
/// (`[12, name, id, x?, y?]` for variables, `[13, ...]` for lists).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawBlockEntry {
    Block(RawBlock),
    Primitive(Vec<Value>),
}

impl RawBlockEntry {
    /// The full block record, if this entry is one.
    pub fn as_block(&self) -> Option<&RawBlock> {
        match self {
            Self::Block(block) => Some(block),
            Self::Primitive(_) => None,
        }
    }
}

/// A raw block record exactly as stored in the flat graph.
///
/// `next`, `parent` and input slots reference other blocks by opaque id;
/// nothing here is owned tree structure yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawBlock {
    pub opcode: String,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub inputs: BTreeMap<String, Value>,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default)]
    pub shadow: bool,
    #[serde(default, rename = "topLevel")]
    pub top_level: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RawBlock {
    /// A minimal record with the given opcode and everything else empty.
    /// Primarily a test convenience.
    pub fn with_opcode(opcode: impl Into<String>) -> Self {
        Self {
            opcode: opcode.into(),
            next: None,
            parent: None,
            inputs: BTreeMap::new(),
            fields: BTreeMap::new(),
            shadow: false,
            top_level: false,
            mutation: None,
            x: None,
            y: None,
            extra: BTreeMap::new(),
        }
    }
}

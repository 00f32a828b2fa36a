//! The durable diff wire format.
//!
//! A diff is an ordered list of typed items plus a per-type count summary.
//! The JSON shape (`{type, location: {targetName}, old?, new?, fingerprint?,
//! diff?}`) and the fixed enumeration of `type` strings are a wire contract
//! consumed by the reconstructor and by external renderers; both must stay
//! stable across versions for round-trip compatibility.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fingerprint::Fingerprint;

/// What a diff item is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeKind {
    Script,
    Block,
    Variable,
    List,
    Costume,
    Sound,
}

/// What happened to the changed thing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeOp {
    Add,
    Delete,
    Edit,
}

impl ChangeOp {
    /// The operation to apply when replaying in reverse: additions become
    /// deletions and vice versa; edits stay edits (with payloads swapped).
    pub fn reversed(self) -> Self {
        match self {
            Self::Add => Self::Delete,
            Self::Delete => Self::Add,
            Self::Edit => Self::Edit,
        }
    }
}

macro_rules! change_types {
    ($(($variant:ident, $kind:ident, $op:ident, $wire:literal)),+ $(,)?) => {
        /// The fixed `type` enumeration of the diff wire format.
        ///
        /// All kind/op combinations are wire-valid even though the engine
        /// currently emits only script- and collection-level items;
        /// block-level items remain parseable for compatibility.
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub enum ChangeType {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl ChangeType {
            /// Look up the variant for a kind/op pair.
            pub fn of(kind: ChangeKind, op: ChangeOp) -> Self {
                match (kind, op) {
                    $((ChangeKind::$kind, ChangeOp::$op) => Self::$variant),+
                }
            }

            /// The subject of the change.
            pub fn kind(self) -> ChangeKind {
                match self {
                    $(Self::$variant => ChangeKind::$kind),+
                }
            }

            /// The operation of the change.
            pub fn op(self) -> ChangeOp {
                match self {
                    $(Self::$variant => ChangeOp::$op),+
                }
            }

            /// The stable wire string.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }
    };
}

change_types![
    (ScriptAdd, Script, Add, "script-add"),
    (ScriptDelete, Script, Delete, "script-delete"),
    (ScriptEdit, Script, Edit, "script-edit"),
    (BlockAdd, Block, Add, "block-add"),
    (BlockDelete, Block, Delete, "block-delete"),
    (BlockEdit, Block, Edit, "block-edit"),
    (VariableAdd, Variable, Add, "variable-add"),
    (VariableDelete, Variable, Delete, "variable-delete"),
    (VariableEdit, Variable, Edit, "variable-edit"),
    (ListAdd, List, Add, "list-add"),
    (ListDelete, List, Delete, "list-delete"),
    (ListEdit, List, Edit, "list-edit"),
    (CostumeAdd, Costume, Add, "costume-add"),
    (CostumeDelete, Costume, Delete, "costume-delete"),
    (CostumeEdit, Costume, Edit, "costume-edit"),
    (SoundAdd, Sound, Add, "sound-add"),
    (SoundDelete, Sound, Delete, "sound-delete"),
    (SoundEdit, Sound, Edit, "sound-edit"),
];

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target-scoped location of a diff item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "targetName")]
    pub target_name: String,
}

/// Embedded line-diff summary for a changed script.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDiffSummary {
    pub added: usize,
    pub removed: usize,
    pub text: String,
}

/// One typed unit of change in the output diff.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiffItem {
    #[serde(rename = "type")]
    pub change: ChangeType,
    pub location: Location,
    /// Payload mirroring the native entry shape in the old document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    /// Payload mirroring the native entry shape in the new document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<LineDiffSummary>,
}

impl DiffItem {
    /// A bare item with the given change type and target location.
    pub fn new(change: ChangeType, target_name: impl Into<String>) -> Self {
        Self {
            change,
            location: Location {
                target_name: target_name.into(),
            },
            old: None,
            new: None,
            fingerprint: None,
            diff: None,
        }
    }

    pub fn with_old(mut self, old: Value) -> Self {
        self.old = Some(old);
        self
    }

    pub fn with_new(mut self, new: Value) -> Self {
        self.new = Some(new);
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: Fingerprint) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    pub fn with_line_diff(mut self, diff: LineDiffSummary) -> Self {
        self.diff = Some(diff);
        self
    }

    pub fn kind(&self) -> ChangeKind {
        self.change.kind()
    }

    pub fn op(&self) -> ChangeOp {
        self.change.op()
    }
}

/// Per-type item counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub counts: BTreeMap<ChangeType, usize>,
}

impl DiffSummary {
    /// Tally a list of items.
    pub fn of(items: &[DiffItem]) -> Self {
        let mut counts = BTreeMap::new();
        for item in items {
            *counts.entry(item.change).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// The count for one change type.
    pub fn count(&self, change: ChangeType) -> usize {
        self.counts.get(&change).copied().unwrap_or(0)
    }

    /// Total item count across all change types.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// The durable diff artifact: ordered items plus their count summary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diff {
    pub items: Vec<DiffItem>,
    pub summary: DiffSummary,
    /// Structural warnings surfaced while loading either document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Diff {
    /// Build a diff from its items, computing the summary.
    pub fn from_items(items: Vec<DiffItem>, warnings: Vec<String>) -> Self {
        let summary = DiffSummary::of(&items);
        Self {
            items,
            summary,
            warnings,
        }
    }

    /// Returns `true` if the diff carries no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Serialize to the stable JSON wire shape.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a diff back from its JSON wire shape.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_strings_are_kind_dash_op() {
        assert_eq!(ChangeType::ScriptEdit.as_str(), "script-edit");
        assert_eq!(ChangeType::VariableAdd.as_str(), "variable-add");
        assert_eq!(ChangeType::SoundDelete.as_str(), "sound-delete");
    }

    #[test]
    fn change_type_of_covers_all_pairs() {
        let kinds = [
            ChangeKind::Script,
            ChangeKind::Block,
            ChangeKind::Variable,
            ChangeKind::List,
            ChangeKind::Costume,
            ChangeKind::Sound,
        ];
        let ops = [ChangeOp::Add, ChangeOp::Delete, ChangeOp::Edit];
        let mut seen = std::collections::BTreeSet::new();
        for kind in kinds {
            for op in ops {
                let ct = ChangeType::of(kind, op);
                assert_eq!(ct.kind(), kind);
                assert_eq!(ct.op(), op);
                seen.insert(ct);
            }
        }
        assert_eq!(seen.len(), 18);
    }

    #[test]
    fn reversed_op_swaps_add_and_delete() {
        assert_eq!(ChangeOp::Add.reversed(), ChangeOp::Delete);
        assert_eq!(ChangeOp::Delete.reversed(), ChangeOp::Add);
        assert_eq!(ChangeOp::Edit.reversed(), ChangeOp::Edit);
    }

    #[test]
    fn item_serializes_to_wire_shape() {
        let item = DiffItem::new(ChangeType::VariableEdit, "Sprite1")
            .with_old(json!(["score", 0]))
            .with_new(json!(["score", 5]));

        let wire = serde_json::to_value(&item).unwrap();
        assert_eq!(
            wire,
            json!({
                "type": "variable-edit",
                "location": { "targetName": "Sprite1" },
                "old": ["score", 0],
                "new": ["score", 5]
            })
        );
    }

    #[test]
    fn absent_optionals_are_omitted() {
        let item = DiffItem::new(ChangeType::ScriptDelete, "Stage");
        let wire = serde_json::to_value(&item).unwrap();
        let obj = wire.as_object().unwrap();
        assert!(!obj.contains_key("old"));
        assert!(!obj.contains_key("new"));
        assert!(!obj.contains_key("fingerprint"));
        assert!(!obj.contains_key("diff"));
    }

    #[test]
    fn item_roundtrips_through_json() {
        let item = DiffItem::new(ChangeType::ScriptEdit, "Sprite1")
            .with_fingerprint(Fingerprint::from_hash([9u8; 32]))
            .with_line_diff(LineDiffSummary {
                added: 1,
                removed: 0,
                text: "@@ -3,0 +3,1 @@\n+wait".into(),
            });

        let json = serde_json::to_string(&item).unwrap();
        let parsed: DiffItem = serde_json::from_str(&json).unwrap();
        assert_eq!(item, parsed);
    }

    #[test]
    fn summary_counts_per_type() {
        let items = vec![
            DiffItem::new(ChangeType::ScriptAdd, "A"),
            DiffItem::new(ChangeType::ScriptAdd, "B"),
            DiffItem::new(ChangeType::VariableEdit, "A"),
        ];
        let summary = DiffSummary::of(&items);
        assert_eq!(summary.count(ChangeType::ScriptAdd), 2);
        assert_eq!(summary.count(ChangeType::VariableEdit), 1);
        assert_eq!(summary.count(ChangeType::SoundAdd), 0);
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn diff_roundtrips_through_json() {
        let diff = Diff::from_items(
            vec![DiffItem::new(ChangeType::CostumeAdd, "Stage").with_new(json!({"name": "b"}))],
            vec!["truncated script at block x".into()],
        );
        let parsed = Diff::from_json(&diff.to_json().unwrap()).unwrap();
        assert_eq!(diff, parsed);
    }

    #[test]
    fn empty_diff_is_empty() {
        let diff = Diff::from_items(Vec::new(), Vec::new());
        assert!(diff.is_empty());
        assert_eq!(diff.len(), 0);
        assert_eq!(diff.summary.total(), 0);
    }
}

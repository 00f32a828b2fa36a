//! Flat block map to owned scripts.
//!
//! For every id flagged top-level and not shadow, the loader walks the
//! `next` chain and materializes structural children and expression
//! sub-trees, producing one owned [`Script`] per root. Every walk carries
//! a visited-id set: a reference that re-enters a visited id, or points at
//! a missing id, truncates the affected script with a warning instead of
//! looping or failing.

use std::collections::{BTreeMap, HashSet};

use bgd_types::{RawBlock, RawBlockEntry};
use serde_json::Value;
use tracing::warn;

use crate::block::{Block, ChildSlot, InputValue, Script, STRUCTURAL_SLOTS};
use crate::canonical::{
    canonical_field, canonical_mutation, decode_input, primitive_block, InputDescriptor,
};
use crate::error::StructuralWarning;

/// The scripts materialized from one target's block map, plus any
/// structural warnings raised along the way.
///
/// Script order is arbitrary here; consumers sort by fingerprint for
/// determinism.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadedScripts {
    pub scripts: Vec<Script>,
    pub warnings: Vec<StructuralWarning>,
}

/// Materialize one tree per top-level, non-shadow block.
///
/// Free-floating array-form reporters (variable/list primitives stored
/// with coordinates) load as single-leaf scripts.
pub fn load_scripts(blocks: &BTreeMap<String, RawBlockEntry>) -> LoadedScripts {
    let mut loaded = LoadedScripts::default();
    for (id, entry) in blocks {
        match entry {
            RawBlockEntry::Block(record) if record.top_level && !record.shadow => {
                let mut walk = Walk {
                    blocks,
                    visited: HashSet::new(),
                    warnings: &mut loaded.warnings,
                };
                if let Some(root) = walk.chain(id) {
                    loaded.scripts.push(Script { root });
                }
            }
            RawBlockEntry::Primitive(parts) if is_floating_primitive(parts) => {
                match primitive_block(parts) {
                    Some(root) => loaded.scripts.push(Script { root }),
                    None => {
                        warn!(id = %id, "skipping unsupported top-level primitive");
                        loaded
                            .warnings
                            .push(StructuralWarning::UnsupportedPrimitive { id: id.clone() });
                    }
                }
            }
            _ => {}
        }
    }
    loaded
}

// Array-form entries carry x/y coordinates when they float at top level.
fn is_floating_primitive(parts: &[Value]) -> bool {
    parts.len() >= 5
}

struct Walk<'a> {
    blocks: &'a BTreeMap<String, RawBlockEntry>,
    visited: HashSet<String>,
    warnings: &'a mut Vec<StructuralWarning>,
}

impl Walk<'_> {
    /// Materialize the chain starting at `start`, following `next` links.
    /// Returns `None` when the very first id is unusable.
    fn chain(&mut self, start: &str) -> Option<Block> {
        let mut nodes: Vec<Block> = Vec::new();
        let mut cursor = Some(start.to_string());
        while let Some(id) = cursor.take() {
            if !self.visited.insert(id.clone()) {
                warn!(id = %id, "cycle detected; truncating script");
                self.warnings.push(StructuralWarning::Cycle { id });
                break;
            }
            let Some(entry) = self.blocks.get(&id) else {
                warn!(id = %id, "missing block reference; truncating script");
                self.warnings.push(StructuralWarning::MissingBlock { id });
                break;
            };
            match entry {
                RawBlockEntry::Block(record) => {
                    nodes.push(self.node(record));
                    cursor = record.next.clone();
                }
                RawBlockEntry::Primitive(parts) => {
                    // A primitive never has a next link; it ends the chain.
                    match primitive_block(parts) {
                        Some(block) => nodes.push(block),
                        None => self
                            .warnings
                            .push(StructuralWarning::UnsupportedPrimitive { id }),
                    }
                }
            }
        }

        let mut next: Option<Box<Block>> = None;
        for mut node in nodes.into_iter().rev() {
            node.next = next;
            next = Some(Box::new(node));
        }
        next.map(|boxed| *boxed)
    }

    /// Materialize one canonical node from a raw record, without its
    /// `next` link (the chain is linked by the caller).
    fn node(&mut self, record: &RawBlock) -> Block {
        let mut children = Vec::new();
        for slot in STRUCTURAL_SLOTS {
            let Some(raw_input) = record.inputs.get(slot) else {
                continue;
            };
            if let InputDescriptor::BlockId(child_id) = decode_input(raw_input) {
                let child_id = child_id.to_string();
                if let Some(body) = self.chain(&child_id) {
                    children.push(ChildSlot {
                        slot: slot.to_string(),
                        body,
                    });
                }
            }
        }

        let mut inputs = BTreeMap::new();
        for (name, raw_input) in &record.inputs {
            if STRUCTURAL_SLOTS.contains(&name.as_str()) {
                continue;
            }
            let value = match decode_input(raw_input) {
                InputDescriptor::BlockId(target) => {
                    let target = target.to_string();
                    match self.chain(&target) {
                        Some(sub) => InputValue::Subtree(Box::new(sub)),
                        // Truncation already warned; the slot degrades to empty.
                        None => InputValue::Literal(Value::Null),
                    }
                }
                InputDescriptor::Literal(literal) => InputValue::Literal(literal),
                InputDescriptor::Empty => InputValue::Literal(Value::Null),
            };
            inputs.insert(name.clone(), value);
        }

        Block {
            opcode: record.opcode.clone(),
            fields: record
                .fields
                .iter()
                .map(|(name, value)| (name.clone(), canonical_field(value)))
                .collect(),
            inputs,
            mutation: record.mutation.as_ref().map(canonical_mutation),
            children,
            next: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blocks(json: Value) -> BTreeMap<String, RawBlockEntry> {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn builds_a_linear_chain() {
        let map = blocks(json!({
            "a": { "opcode": "event_whenflagclicked", "next": "b", "topLevel": true },
            "b": { "opcode": "motion_movesteps", "next": "c",
                   "inputs": { "STEPS": [1, [4, "10"]] } },
            "c": { "opcode": "control_wait", "inputs": { "DURATION": [1, [5, "1"]] } }
        }));

        let loaded = load_scripts(&map);
        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.scripts.len(), 1);

        let opcodes: Vec<&str> = loaded.scripts[0]
            .root
            .chain()
            .map(|b| b.opcode.as_str())
            .collect();
        assert_eq!(
            opcodes,
            ["event_whenflagclicked", "motion_movesteps", "control_wait"]
        );
        let steps = &loaded.scripts[0].root.next.as_ref().unwrap().inputs["STEPS"];
        assert_eq!(*steps, InputValue::Literal(json!("10")));
    }

    #[test]
    fn shadow_blocks_are_never_roots() {
        let map = blocks(json!({
            "s": { "opcode": "math_number", "topLevel": true, "shadow": true,
                   "fields": { "NUM": ["10"] } }
        }));
        let loaded = load_scripts(&map);
        assert!(loaded.scripts.is_empty());
    }

    #[test]
    fn substacks_become_slot_labeled_children() {
        let map = blocks(json!({
            "if": { "opcode": "control_if_else", "topLevel": true,
                    "inputs": {
                        "CONDITION": [2, "cond"],
                        "SUBSTACK": [2, "then"],
                        "SUBSTACK2": [2, "else"]
                    } },
            "cond": { "opcode": "sensing_keypressed",
                      "inputs": { "KEY_OPTION": [1, [10, "space"]] } },
            "then": { "opcode": "motion_movesteps", "inputs": { "STEPS": [1, [4, "10"]] } },
            "else": { "opcode": "motion_turnright", "inputs": { "DEGREES": [1, [4, "15"]] } }
        }));

        let loaded = load_scripts(&map);
        assert!(loaded.warnings.is_empty());
        let root = &loaded.scripts[0].root;
        let slots: Vec<&str> = root.children.iter().map(|c| c.slot.as_str()).collect();
        assert_eq!(slots, ["CONDITION", "SUBSTACK", "SUBSTACK2"]);
        assert_eq!(root.children[0].body.opcode, "sensing_keypressed");
        // Structural slots never appear in the input map.
        assert!(root.inputs.is_empty());
    }

    #[test]
    fn expression_inputs_become_subtrees() {
        let map = blocks(json!({
            "move": { "opcode": "motion_movesteps", "topLevel": true,
                      "inputs": { "STEPS": [3, "sum", [4, "10"]] } },
            "sum": { "opcode": "operator_add",
                     "inputs": { "NUM1": [1, [4, "1"]], "NUM2": [1, [4, "2"]] } }
        }));

        let loaded = load_scripts(&map);
        let root = &loaded.scripts[0].root;
        match &root.inputs["STEPS"] {
            InputValue::Subtree(sub) => assert_eq!(sub.opcode, "operator_add"),
            other => panic!("expected subtree, got {other:?}"),
        }
    }

    #[test]
    fn cycle_truncates_with_warning() {
        let map = blocks(json!({
            "a": { "opcode": "event_whenflagclicked", "next": "b", "topLevel": true },
            "b": { "opcode": "motion_movesteps", "next": "a" }
        }));

        let loaded = load_scripts(&map);
        assert_eq!(loaded.scripts.len(), 1);
        assert_eq!(loaded.scripts[0].root.chain().count(), 2);
        assert_eq!(
            loaded.warnings,
            vec![StructuralWarning::Cycle { id: "a".into() }]
        );
    }

    #[test]
    fn dangling_next_truncates_with_warning() {
        let map = blocks(json!({
            "a": { "opcode": "event_whenflagclicked", "next": "ghost", "topLevel": true }
        }));

        let loaded = load_scripts(&map);
        assert_eq!(loaded.scripts.len(), 1);
        assert_eq!(loaded.scripts[0].root.chain().count(), 1);
        assert_eq!(
            loaded.warnings,
            vec![StructuralWarning::MissingBlock { id: "ghost".into() }]
        );
    }

    #[test]
    fn missing_input_reference_degrades_to_empty_slot() {
        let map = blocks(json!({
            "move": { "opcode": "motion_movesteps", "topLevel": true,
                      "inputs": { "STEPS": [2, "ghost"] } }
        }));

        let loaded = load_scripts(&map);
        assert_eq!(
            loaded.scripts[0].root.inputs["STEPS"],
            InputValue::Literal(Value::Null)
        );
        assert_eq!(loaded.warnings.len(), 1);
    }

    #[test]
    fn floating_primitive_loads_as_leaf_script() {
        let map = blocks(json!({
            "p": [12, "score", "var-id", 100, 200]
        }));

        let loaded = load_scripts(&map);
        assert_eq!(loaded.scripts.len(), 1);
        let root = &loaded.scripts[0].root;
        assert_eq!(root.opcode, "data_variable");
        assert_eq!(root.fields["VARIABLE"], json!("score"));
    }

    #[test]
    fn referenced_primitive_materializes_without_its_id() {
        let map = blocks(json!({
            "say": { "opcode": "looks_say", "topLevel": true,
                     "inputs": { "MESSAGE": [3, "p", [10, "hi"]] } },
            "p": [13, "inventory", "list-id"]
        }));

        let loaded = load_scripts(&map);
        match &loaded.scripts[0].root.inputs["MESSAGE"] {
            InputValue::Subtree(sub) => {
                assert_eq!(sub.opcode, "data_listcontents");
                assert_eq!(sub.fields["LIST"], json!("inventory"));
            }
            other => panic!("expected subtree, got {other:?}"),
        }
    }

    #[test]
    fn identical_graphs_under_different_ids_load_identically() {
        let alpha = blocks(json!({
            "x1": { "opcode": "event_whenflagclicked", "next": "x2", "topLevel": true, "x": 5, "y": 9 },
            "x2": { "opcode": "data_setvariableto", "parent": "x1",
                    "fields": { "VARIABLE": ["score", "ns-a-var"] },
                    "inputs": { "VALUE": [1, [10, "5"]] } }
        }));
        let beta = blocks(json!({
            "y9": { "opcode": "event_whenflagclicked", "next": "y8", "topLevel": true, "x": 80, "y": -3 },
            "y8": { "opcode": "data_setvariableto", "parent": "y9",
                    "fields": { "VARIABLE": ["score", "ns-b-var"] },
                    "inputs": { "VALUE": [1, [10, "5"]] } }
        }));

        let a = load_scripts(&alpha);
        let b = load_scripts(&beta);
        assert_eq!(a.scripts, b.scripts);
    }
}

//! Owned, canonical script trees.
//!
//! A [`Script`] exclusively owns one tree of [`Block`] nodes rooted at a
//! top-level, non-shadow block. Sibling statements hang off `next`;
//! structural branches (condition, primary branch, alternate branch) are
//! slot-labeled children; expression inputs are nested sub-trees inside
//! the input map. No node is shared between scripts and nothing is mutated
//! after construction.

use std::collections::BTreeMap;

use serde_json::Value;

/// The fixed set of structural input slots, in the order their sub-trees
/// are materialized as children: condition, primary branch, alternate
/// branch. Children order is derived from this list, never from map
/// iteration order.
pub const STRUCTURAL_SLOTS: [&str; 3] = ["CONDITION", "SUBSTACK", "SUBSTACK2"];

/// One node in a script's tree, in canonical form.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub opcode: String,
    /// Canonical fields: literal slot values with opaque ids stripped.
    pub fields: BTreeMap<String, Value>,
    /// Canonical inputs: scalar literals inline, block-valued inputs as
    /// nested sub-trees.
    pub inputs: BTreeMap<String, InputValue>,
    /// Canonical procedure mutation, if any.
    pub mutation: Option<Value>,
    /// Structural children in [`STRUCTURAL_SLOTS`] order.
    pub children: Vec<ChildSlot>,
    /// The following sibling statement, if any.
    pub next: Option<Box<Block>>,
}

impl Block {
    /// A leaf block with the given opcode and nothing else.
    pub fn leaf(opcode: impl Into<String>) -> Self {
        Self {
            opcode: opcode.into(),
            fields: BTreeMap::new(),
            inputs: BTreeMap::new(),
            mutation: None,
            children: Vec::new(),
            next: None,
        }
    }

    /// Iterate this block and its following siblings, in order.
    pub fn chain(&self) -> impl Iterator<Item = &Block> {
        std::iter::successors(Some(self), |block| block.next.as_deref())
    }

    /// Total node count of this sub-tree: the sibling chain, structural
    /// children, and nested expression inputs.
    pub fn node_count(&self) -> usize {
        self.chain()
            .map(|block| {
                let children: usize = block.children.iter().map(|c| c.body.node_count()).sum();
                let inputs: usize = block
                    .inputs
                    .values()
                    .map(|input| match input {
                        InputValue::Subtree(sub) => sub.node_count(),
                        InputValue::Literal(_) => 0,
                    })
                    .sum();
                1 + children + inputs
            })
            .sum()
    }
}

/// A canonical input slot value.
#[derive(Clone, Debug, PartialEq)]
pub enum InputValue {
    /// A scalar literal, inlined.
    Literal(Value),
    /// A block-valued input, materialized as a nested sub-tree.
    Subtree(Box<Block>),
}

/// A structural child sub-tree together with the slot it fills.
///
/// Keeping the slot name prevents differently-slotted but identically
/// shaped children from aliasing under the fingerprint.
#[derive(Clone, Debug, PartialEq)]
pub struct ChildSlot {
    pub slot: String,
    pub body: Block,
}

/// One tree of block nodes rooted at a top-level, non-shadow block.
#[derive(Clone, Debug, PartialEq)]
pub struct Script {
    pub root: Block,
}

impl Script {
    /// Total node count of the script.
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }
}

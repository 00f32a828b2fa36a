//! Graph loading for Block Graph Diff.
//!
//! Turns a target's flat, id-addressed block map into owned, tree-shaped
//! scripts, canonicalizing every record on the way: volatile fields
//! (coordinates, opaque ids, parent back-pointers) are stripped so that
//! downstream fingerprinting and equality never see incidental metadata.
//!
//! Malformed graphs (cycles, dangling references) degrade locally: the
//! affected script is truncated and a [`StructuralWarning`] recorded; a
//! bad script never aborts the comparison.
//!
//! # Key Types
//!
//! - [`Script`] / [`Block`] / [`InputValue`] -- owned canonical trees
//! - [`load_scripts`] / [`LoadedScripts`] -- flat map to trees
//! - [`StructuralWarning`] -- local degradation taxonomy

pub mod block;
pub mod canonical;
pub mod error;
pub mod loader;

pub use block::{Block, ChildSlot, InputValue, Script, STRUCTURAL_SLOTS};
pub use canonical::{
    canonical_field, canonical_mutation, canonical_variable_entry, decode_input, primitive_block,
    InputDescriptor,
};
pub use error::StructuralWarning;
pub use loader::{load_scripts, LoadedScripts};

//! Foundation types for Block Graph Diff (BGD).
//!
//! This crate provides the shared vocabulary of the BGD engine: the
//! document model deserialized from a project's extracted metadata, the
//! id-independent content fingerprint, and the durable diff wire format
//! that every other BGD crate produces or consumes.
//!
//! # Key Types
//!
//! - [`ProjectDocument`] / [`Target`] / [`RawBlock`] -- the flat, id-addressed
//!   block graph plus keyed collections (variables, lists, costumes, sounds)
//! - [`Fingerprint`] -- content-addressed identifier for a script or sub-tree
//! - [`DiffItem`] / [`ChangeType`] / [`Diff`] -- the typed, replayable diff
//!   artifact and its stable JSON shape

pub mod document;
pub mod error;
pub mod fingerprint;
pub mod item;

pub use document::{ProjectDocument, RawBlock, RawBlockEntry, Target};
pub use error::{DocumentError, TypeError};
pub use fingerprint::Fingerprint;
pub use item::{
    ChangeKind, ChangeOp, ChangeType, Diff, DiffItem, DiffSummary, LineDiffSummary, Location,
};

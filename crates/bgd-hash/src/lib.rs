//! Content fingerprinting for Block Graph Diff.
//!
//! Computes a bottom-up, id-independent [`Fingerprint`] for a canonical
//! script or sub-tree: two structurally identical trees built under
//! unrelated id namespaces hash identically, and any content difference
//! (opcode, field value, nesting, sibling order) produces a different
//! hash with overwhelming probability.
//!
//! [`Fingerprint`]: bgd_types::Fingerprint

pub mod fingerprinter;

pub use fingerprinter::{script_fingerprint, TreeHasher};

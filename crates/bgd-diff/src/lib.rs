//! Diff engine for Block Graph Diff.
//!
//! Compares two project documents target by target, producing the typed,
//! replayable [`Diff`] artifact: scripts are paired by fingerprint with a
//! similarity fallback and changed pairs carry a line-level edit summary;
//! keyed collections (variables, lists, costumes, sounds) classify into
//! add/delete/edit per key.
//!
//! # Key Entry Points
//!
//! - [`diff_documents`] -- full document comparison
//! - [`match_scripts`] / [`MatchResult`] -- script pairing on its own
//! - [`diff_lines`] / [`LineDiff`] -- minimal line-level edit scripts
//! - [`render_diff`] -- plain-text rendering of a diff artifact
//!
//! [`Diff`]: bgd_types::Diff

pub mod engine;
pub mod line_diff;
pub mod matcher;
pub mod render;

pub use engine::diff_documents;
pub use line_diff::{diff_lines, LineDiff, LineHunk, LineOp};
pub use matcher::{match_scripts, script_entries, MatchResult, ScriptEntry, SIMILARITY_THRESHOLD};
pub use render::{render_diff, script_lines};

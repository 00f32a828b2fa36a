//! Diff replay for Block Graph Diff.
//!
//! Replays an ordered diff-item list against a deep copy of a base
//! document, forward or in reverse, producing a derived document plus an
//! apply report. Only the keyed collections (variables, lists, costumes,
//! sounds) are reconstructed; script and block items are counted and
//! ignored -- rebuilding block trees from a diff is a deliberate scope
//! boundary, not a gap.
//!
//! Conflicts degrade locally: an item aimed at an absent target or entry
//! is skipped and recorded in the report, never corrupting other entries.
//!
//! # Key Entry Points
//!
//! - [`apply_diff`] / [`ReplayDirection`] -- replay a diff
//! - [`ResourceBundle`] -- asset bytes keyed by content-addressed token
//! - [`ApplyReport`] -- applied/ignored/skipped accounting

pub mod bundle;
pub mod error;
pub mod replay;
pub mod report;

pub use bundle::ResourceBundle;
pub use error::{ApplyError, ApplyResult};
pub use replay::{apply_diff, ReplayDirection};
pub use report::{ApplyReport, SkipReason, SkippedItem};

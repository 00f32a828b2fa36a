//! Apply report types.
//!
//! Accounting for one replay run: what was applied, what was ignored by
//! design, what was skipped because the base document had nothing for the
//! item to act on, and which referenced assets the resource bundle is
//! missing.

use bgd_types::{ChangeType, DiffItem};
use serde::{Deserialize, Serialize};

/// Why an item was skipped during replay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The item's target does not exist in the base document and the
    /// effective operation is not an addition.
    TargetMissing,
    /// The addressed collection entry does not exist in the target.
    EntryMissing,
}

/// One skipped item, by its position in the diff.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedItem {
    pub index: usize,
    pub change: ChangeType,
    pub target_name: String,
    pub reason: SkipReason,
}

/// The outcome of replaying a diff.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Items applied to the derived document.
    pub applied: usize,
    /// Script/block items, which replay does not reconstruct.
    pub ignored: usize,
    /// Items skipped because their target or entry was absent.
    pub skipped: Vec<SkippedItem>,
    /// Filename tokens referenced by applied asset entries but absent
    /// from the resource bundle.
    pub missing_assets: Vec<String>,
}

impl ApplyReport {
    /// Returns `true` if every item applied cleanly.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.missing_assets.is_empty()
    }

    pub(crate) fn skip(&mut self, index: usize, item: &DiffItem, reason: SkipReason) {
        self.skipped.push(SkippedItem {
            index,
            change: item.change,
            target_name: item.location.target_name.clone(),
            reason,
        });
    }

    pub(crate) fn missing_asset(&mut self, token: &str) {
        if !self.missing_assets.iter().any(|t| t == token) {
            self.missing_assets.push(token.to_string());
        }
    }
}

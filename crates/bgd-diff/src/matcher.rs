//! Script pairing across two graph snapshots.
//!
//! Phase 1 pairs scripts whose fingerprints are equal (bijective on the
//! matched subset, duplicate-safe). Phase 2 walks the leftovers in
//! fingerprint-sorted order and greedily accepts the first candidate
//! whose similarity clears a fixed threshold. First-fit is deliberately
//! not a maximum-weight bipartite assignment: an earlier script can claim
//! a candidate that would have suited a later one better. Optimal
//! assignment (Hungarian method) is a known upgrade path, not taken.

use std::collections::{BTreeMap, VecDeque};

use bgd_graph::Script;
use bgd_hash::script_fingerprint;
use bgd_types::Fingerprint;
use tracing::debug;

use crate::render::script_lines;

/// Similarity acceptance threshold for the phase-2 fallback.
pub const SIMILARITY_THRESHOLD: f64 = 0.5;

/// A script prepared for matching: its fingerprint and flattened lines.
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptEntry {
    pub script: Script,
    pub fingerprint: Fingerprint,
    pub lines: Vec<String>,
}

/// Fingerprint and flatten a batch of scripts, sorted by fingerprint for
/// a deterministic matching order.
pub fn script_entries(scripts: Vec<Script>) -> Vec<ScriptEntry> {
    let mut entries: Vec<ScriptEntry> = scripts
        .into_iter()
        .map(|script| {
            let fingerprint = script_fingerprint(&script);
            let lines = script_lines(&script);
            ScriptEntry {
                script,
                fingerprint,
                lines,
            }
        })
        .collect();
    entries.sort_by(|a, b| a.fingerprint.cmp(&b.fingerprint));
    entries
}

/// A partition of old and new scripts into matched pairs, deletions, and
/// additions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchResult {
    pub matched: Vec<(ScriptEntry, ScriptEntry)>,
    pub deleted: Vec<ScriptEntry>,
    pub added: Vec<ScriptEntry>,
}

/// Pair old and new scripts.
pub fn match_scripts(old: Vec<ScriptEntry>, new: Vec<ScriptEntry>) -> MatchResult {
    // Phase 1: exact fingerprint matches. Buckets keep duplicates apart;
    // each candidate is claimed at most once.
    let mut new_by_fingerprint: BTreeMap<Fingerprint, VecDeque<ScriptEntry>> = BTreeMap::new();
    for entry in new {
        new_by_fingerprint
            .entry(entry.fingerprint)
            .or_default()
            .push_back(entry);
    }

    let mut matched = Vec::new();
    let mut leftover_old = Vec::new();
    for entry in old {
        match new_by_fingerprint
            .get_mut(&entry.fingerprint)
            .and_then(VecDeque::pop_front)
        {
            Some(counterpart) => matched.push((entry, counterpart)),
            None => leftover_old.push(entry),
        }
    }
    let exact = matched.len();

    // Fingerprint order survives the BTreeMap traversal.
    let mut leftover_new: Vec<ScriptEntry> = new_by_fingerprint.into_values().flatten().collect();

    // Phase 2: greedy first-fit over the leftovers. Accepted candidates
    // leave the pool immediately so no new script is claimed twice.
    let mut deleted = Vec::new();
    for entry in leftover_old {
        let position = leftover_new
            .iter()
            .position(|candidate| similarity(&entry.lines, &candidate.lines) > SIMILARITY_THRESHOLD);
        match position {
            Some(index) => matched.push((entry, leftover_new.remove(index))),
            None => deleted.push(entry),
        }
    }

    debug!(
        exact,
        fallback = matched.len() - exact,
        deleted = deleted.len(),
        added = leftover_new.len(),
        "script matching complete"
    );

    MatchResult {
        matched,
        deleted,
        added: leftover_new,
    }
}

/// Similarity of two flattened scripts: the mean of normalized common-
/// prefix length and the shorter/longer length ratio.
pub(crate) fn similarity(a: &[String], b: &[String]) -> f64 {
    let longer = a.len().max(b.len());
    if longer == 0 {
        return 1.0;
    }
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let size_ratio = a.len().min(b.len()) as f64 / longer as f64;
    (prefix as f64 / longer as f64 + size_ratio) / 2.0
}

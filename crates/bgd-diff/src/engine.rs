//! Whole-document diffing.
//!
//! Walks the union of target names (old document order first, then
//! new-only targets), pairing scripts per target and classifying the
//! keyed collections. Matched script pairs with equal fingerprints emit
//! nothing; differing pairs emit a script-edit only when the flattened
//! line diff actually shows changed lines.

use std::collections::BTreeMap;

use bgd_graph::{canonical_variable_entry, load_scripts};
use bgd_types::{ChangeKind, ChangeOp, ChangeType, Diff, DiffItem, ProjectDocument, Target};
use serde_json::Value;
use tracing::debug;

use crate::line_diff::diff_lines;
use crate::matcher::{match_scripts, script_entries, ScriptEntry};

/// Compute the full diff between two project documents.
pub fn diff_documents(old: &ProjectDocument, new: &ProjectDocument) -> Diff {
    let mut items = Vec::new();
    let mut warnings = Vec::new();

    let mut names: Vec<&str> = old.targets.iter().map(|t| t.name.as_str()).collect();
    for target in &new.targets {
        if !names.contains(&target.name.as_str()) {
            names.push(target.name.as_str());
        }
    }

    for name in names {
        diff_target(
            name,
            old.target(name),
            new.target(name),
            &mut items,
            &mut warnings,
        );
    }

    let diff = Diff::from_items(items, warnings);
    debug!(
        items = diff.len(),
        warnings = diff.warnings.len(),
        "document diff complete"
    );
    diff
}

fn diff_target(
    name: &str,
    old: Option<&Target>,
    new: Option<&Target>,
    items: &mut Vec<DiffItem>,
    warnings: &mut Vec<String>,
) {
    diff_scripts(name, old, new, items, warnings);

    diff_keyed(
        items,
        name,
        ChangeKind::Variable,
        &keyed(old, Target::variables_by_name),
        &keyed(new, Target::variables_by_name),
        canonical_variable_entry,
    );
    diff_keyed(
        items,
        name,
        ChangeKind::List,
        &keyed(old, Target::lists_by_name),
        &keyed(new, Target::lists_by_name),
        Value::clone,
    );
    diff_keyed(
        items,
        name,
        ChangeKind::Costume,
        &keyed(old, Target::costumes_by_key),
        &keyed(new, Target::costumes_by_key),
        Value::clone,
    );
    diff_keyed(
        items,
        name,
        ChangeKind::Sound,
        &keyed(old, Target::sounds_by_key),
        &keyed(new, Target::sounds_by_key),
        Value::clone,
    );
}

fn keyed(
    target: Option<&Target>,
    view: impl Fn(&Target) -> BTreeMap<String, Value>,
) -> BTreeMap<String, Value> {
    target.map(view).unwrap_or_default()
}

fn diff_scripts(
    name: &str,
    old: Option<&Target>,
    new: Option<&Target>,
    items: &mut Vec<DiffItem>,
    warnings: &mut Vec<String>,
) {
    let old_entries = target_scripts(name, old, warnings);
    let new_entries = target_scripts(name, new, warnings);
    let result = match_scripts(old_entries, new_entries);

    for (old_entry, new_entry) in &result.matched {
        if old_entry.fingerprint == new_entry.fingerprint {
            continue;
        }
        let line_diff = diff_lines(&old_entry.lines, &new_entry.lines);
        if line_diff.is_unchanged() {
            continue;
        }
        items.push(
            DiffItem::new(ChangeType::ScriptEdit, name)
                .with_old(script_text(old_entry))
                .with_new(script_text(new_entry))
                .with_fingerprint(new_entry.fingerprint)
                .with_line_diff(line_diff.summary()),
        );
    }
    for entry in &result.deleted {
        items.push(
            DiffItem::new(ChangeType::ScriptDelete, name)
                .with_old(script_text(entry))
                .with_fingerprint(entry.fingerprint),
        );
    }
    for entry in &result.added {
        items.push(
            DiffItem::new(ChangeType::ScriptAdd, name)
                .with_new(script_text(entry))
                .with_fingerprint(entry.fingerprint),
        );
    }
}

fn target_scripts(
    name: &str,
    target: Option<&Target>,
    warnings: &mut Vec<String>,
) -> Vec<ScriptEntry> {
    let Some(target) = target else {
        return Vec::new();
    };
    let loaded = load_scripts(&target.blocks);
    for warning in &loaded.warnings {
        warnings.push(format!("{name}: {warning}"));
    }
    script_entries(loaded.scripts)
}

fn script_text(entry: &ScriptEntry) -> Value {
    Value::String(entry.lines.join("\n"))
}

fn diff_keyed(
    items: &mut Vec<DiffItem>,
    target: &str,
    kind: ChangeKind,
    old: &BTreeMap<String, Value>,
    new: &BTreeMap<String, Value>,
    canonical: fn(&Value) -> Value,
) {
    for (key, old_entry) in old {
        match new.get(key) {
            Some(new_entry) => {
                if canonical(old_entry) != canonical(new_entry) {
                    items.push(
                        DiffItem::new(ChangeType::of(kind, ChangeOp::Edit), target)
                            .with_old(old_entry.clone())
                            .with_new(new_entry.clone()),
                    );
                }
            }
            None => {
                items.push(
                    DiffItem::new(ChangeType::of(kind, ChangeOp::Delete), target)
                        .with_old(old_entry.clone()),
                );
            }
        }
    }
    for (key, new_entry) in new {
        if !old.contains_key(key) {
            items.push(
                DiffItem::new(ChangeType::of(kind, ChangeOp::Add), target)
                    .with_new(new_entry.clone()),
            );
        }
    }
}

//! Replaying a diff against a base document.

use std::collections::BTreeMap;

use bgd_types::{ChangeKind, ChangeOp, ChangeType, Diff, DiffItem, ProjectDocument, Target};
use serde_json::Value;
use tracing::debug;

use crate::bundle::ResourceBundle;
use crate::error::{ApplyError, ApplyResult};
use crate::report::{ApplyReport, SkipReason};

/// Which way to replay a diff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayDirection {
    /// Apply the diff as recorded: base is the old document.
    Forward,
    /// Undo the diff: base is the new document. Additions become
    /// deletions and vice versa; edits swap their payloads.
    Reverse,
}

impl ReplayDirection {
    fn effective_op(self, op: ChangeOp) -> ChangeOp {
        match self {
            Self::Forward => op,
            Self::Reverse => op.reversed(),
        }
    }

    // Payloads relative to the replay direction: the first element is
    // what the base should currently hold, the second what it gets.
    fn effective_payloads(self, item: &DiffItem) -> (Option<&Value>, Option<&Value>) {
        match self {
            Self::Forward => (item.old.as_ref(), item.new.as_ref()),
            Self::Reverse => (item.new.as_ref(), item.old.as_ref()),
        }
    }
}

/// Replay a diff against a deep copy of `base`, producing the derived
/// document and an apply report.
///
/// Only keyed collections are reconstructed; script and block items are
/// counted as ignored. An item addressing an absent target is skipped
/// unless its effective operation is an addition, in which case an empty
/// target shell is created first. An item addressing an absent collection
/// entry is skipped. Both skips are recorded in the report.
pub fn apply_diff(
    base: &ProjectDocument,
    diff: &Diff,
    resources: &ResourceBundle,
    direction: ReplayDirection,
) -> ApplyResult<(ProjectDocument, ApplyReport)> {
    let mut derived = base.clone();
    let mut report = ApplyReport::default();

    for (index, item) in diff.items.iter().enumerate() {
        let kind = item.kind();
        if matches!(kind, ChangeKind::Script | ChangeKind::Block) {
            report.ignored += 1;
            continue;
        }

        let op = direction.effective_op(item.op());
        let (current, incoming) = direction.effective_payloads(item);
        let target_name = item.location.target_name.clone();

        if derived.target(&target_name).is_none() {
            if op == ChangeOp::Add {
                derived.targets.push(Target::shell(target_name.clone()));
            } else {
                debug!(item = index, target = %target_name, "target missing; skipping item");
                report.skip(index, item, SkipReason::TargetMissing);
                continue;
            }
        }
        let Some(target) = derived.target_mut(&target_name) else {
            continue;
        };

        let outcome = match kind {
            ChangeKind::Variable => {
                apply_named(&mut target.variables, index, item.change, op, current, incoming)?
            }
            ChangeKind::List => {
                apply_named(&mut target.lists, index, item.change, op, current, incoming)?
            }
            ChangeKind::Costume => {
                apply_asset(&mut target.costumes, index, item.change, op, current, incoming)?
            }
            ChangeKind::Sound => {
                apply_asset(&mut target.sounds, index, item.change, op, current, incoming)?
            }
            ChangeKind::Script | ChangeKind::Block => None,
        };

        match outcome {
            None => {
                report.applied += 1;
                if matches!(kind, ChangeKind::Costume | ChangeKind::Sound)
                    && matches!(op, ChangeOp::Add | ChangeOp::Edit)
                {
                    check_asset_presence(incoming, resources, &mut report);
                }
            }
            Some(reason) => {
                debug!(item = index, target = %target_name, ?reason, "skipping item");
                report.skip(index, item, reason);
            }
        }
    }

    Ok((derived, report))
}

/// Apply one item to an id-keyed, name-addressed collection (variables or
/// lists). Additions without an existing entry of the same name insert
/// under a name-derived surrogate id; the keyed (name -> entry) view is
/// what the round-trip law is stated over.
fn apply_named(
    map: &mut BTreeMap<String, Value>,
    index: usize,
    change: ChangeType,
    op: ChangeOp,
    current: Option<&Value>,
    incoming: Option<&Value>,
) -> ApplyResult<Option<SkipReason>> {
    match op {
        ChangeOp::Add => {
            let entry = require(incoming, index, change, "new")?;
            let name = entry_name(entry, index)?;
            let id = find_named_id(map, name).unwrap_or_else(|| name.to_string());
            map.insert(id, entry.clone());
            Ok(None)
        }
        ChangeOp::Delete => {
            let entry = require(current, index, change, "old")?;
            let name = entry_name(entry, index)?;
            match find_named_id(map, name) {
                Some(id) => {
                    map.remove(&id);
                    Ok(None)
                }
                None => Ok(Some(SkipReason::EntryMissing)),
            }
        }
        ChangeOp::Edit => {
            let old_entry = require(current, index, change, "old")?;
            let new_entry = require(incoming, index, change, "new")?;
            let name = entry_name(old_entry, index)?;
            match find_named_id(map, name) {
                Some(id) => {
                    map.insert(id, new_entry.clone());
                    Ok(None)
                }
                None => Ok(Some(SkipReason::EntryMissing)),
            }
        }
    }
}

/// Apply one item to an asset collection (costumes or sounds), addressing
/// entries by stable identity when the payload has one and by whole-entry
/// equality otherwise.
fn apply_asset(
    list: &mut Vec<Value>,
    index: usize,
    change: ChangeType,
    op: ChangeOp,
    current: Option<&Value>,
    incoming: Option<&Value>,
) -> ApplyResult<Option<SkipReason>> {
    match op {
        ChangeOp::Add => {
            let entry = require(incoming, index, change, "new")?;
            match find_asset(list, entry) {
                Some(position) => list[position] = entry.clone(),
                None => list.push(entry.clone()),
            }
            Ok(None)
        }
        ChangeOp::Delete => {
            let entry = require(current, index, change, "old")?;
            match find_asset(list, entry) {
                Some(position) => {
                    list.remove(position);
                    Ok(None)
                }
                None => Ok(Some(SkipReason::EntryMissing)),
            }
        }
        ChangeOp::Edit => {
            let old_entry = require(current, index, change, "old")?;
            let new_entry = require(incoming, index, change, "new")?;
            match find_asset(list, old_entry) {
                Some(position) => {
                    list[position] = new_entry.clone();
                    Ok(None)
                }
                None => Ok(Some(SkipReason::EntryMissing)),
            }
        }
    }
}

fn check_asset_presence(payload: Option<&Value>, resources: &ResourceBundle, report: &mut ApplyReport) {
    let token = payload
        .and_then(|entry| entry.get("md5ext"))
        .and_then(Value::as_str);
    if let Some(token) = token {
        if !resources.contains(token) {
            report.missing_asset(token);
        }
    }
}

fn require<'a>(
    payload: Option<&'a Value>,
    index: usize,
    change: ChangeType,
    side: &'static str,
) -> ApplyResult<&'a Value> {
    payload.ok_or(ApplyError::MissingPayload {
        index,
        change,
        side,
    })
}

fn entry_name(entry: &Value, index: usize) -> ApplyResult<&str> {
    entry
        .get(0)
        .and_then(Value::as_str)
        .ok_or_else(|| ApplyError::MalformedPayload {
            index,
            reason: "entry name slot is not a string".into(),
        })
}

fn find_named_id(map: &BTreeMap<String, Value>, name: &str) -> Option<String> {
    map.iter()
        .find(|(_, entry)| entry.get(0).and_then(Value::as_str) == Some(name))
        .map(|(id, _)| id.clone())
}

fn find_asset(list: &[Value], payload: &Value) -> Option<usize> {
    match identity_key(payload) {
        Some(key) => list
            .iter()
            .enumerate()
            .find(|(position, entry)| Target::asset_key(entry, *position) == key)
            .map(|(position, _)| position),
        // Identity-less assets were keyed positionally when the diff was
        // computed; against the same base, whole-entry equality finds them.
        None => list.iter().position(|entry| entry == payload),
    }
}

fn identity_key(entry: &Value) -> Option<String> {
    if let Some(md5ext) = entry.get("md5ext").and_then(Value::as_str) {
        return Some(md5ext.to_string());
    }
    match (
        entry.get("assetId").and_then(Value::as_str),
        entry.get("dataFormat").and_then(Value::as_str),
    ) {
        (Some(asset_id), Some(format)) => Some(format!("{asset_id}.{format}")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bgd_diff::diff_documents;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> ProjectDocument {
        serde_json::from_value(value).unwrap()
    }

    fn old_doc() -> ProjectDocument {
        doc(json!({
            "targets": [
                {
                    "name": "Stage", "isStage": true,
                    "variables": { "v1": ["score", 0], "v2": ["lives", 3] },
                    "lists": { "l1": ["inventory", ["sword"]] },
                    "costumes": [ { "name": "backdrop1", "md5ext": "aa.svg", "dataFormat": "svg" } ],
                    "sounds": [ { "name": "pop", "md5ext": "pop.wav", "dataFormat": "wav" } ]
                },
                {
                    "name": "Sprite1",
                    "variables": { "s1": ["speed", 10] }
                }
            ]
        }))
    }

    fn new_doc() -> ProjectDocument {
        doc(json!({
            "targets": [
                {
                    "name": "Stage", "isStage": true,
                    // score edited, lives deleted, combo added
                    "variables": { "v1": ["score", 5], "v3": ["combo", 1] },
                    // inventory edited
                    "lists": { "l1": ["inventory", ["sword", "shield"]] },
                    // backdrop renamed (same asset), extra costume added
                    "costumes": [
                        { "name": "backdrop2", "md5ext": "aa.svg", "dataFormat": "svg" },
                        { "name": "stars", "md5ext": "bb.png", "dataFormat": "png" }
                    ],
                    // pop deleted
                    "sounds": []
                },
                {
                    "name": "Sprite1",
                    "variables": { "s1": ["speed", 10] }
                },
                {
                    // brand-new target
                    "name": "Sprite2",
                    "variables": { "n1": ["hp", 100] }
                }
            ]
        }))
    }

    fn keyed_views(doc: &ProjectDocument, name: &str) -> [BTreeMap<String, Value>; 4] {
        let target = doc.target(name).expect(name);
        [
            target.variables_by_name(),
            target.lists_by_name(),
            target.costumes_by_key(),
            target.sounds_by_key(),
        ]
    }

    #[test]
    fn forward_replay_reproduces_new_collections() {
        let old = old_doc();
        let new = new_doc();
        let diff = diff_documents(&old, &new);

        let mut bundle = ResourceBundle::new();
        bundle.insert("aa.svg", vec![1]);
        bundle.insert("bb.png", vec![2]);

        let (derived, report) =
            apply_diff(&old, &diff, &bundle, ReplayDirection::Forward).unwrap();

        assert!(report.is_clean(), "{report:?}");
        assert_eq!(report.ignored, 0);
        for name in ["Stage", "Sprite1", "Sprite2"] {
            assert_eq!(keyed_views(&derived, name), keyed_views(&new, name), "{name}");
        }
    }

    #[test]
    fn reverse_replay_reproduces_old_collections() {
        let old = old_doc();
        let new = new_doc();
        let diff = diff_documents(&old, &new);

        let (derived, report) = apply_diff(
            &new,
            &diff,
            &ResourceBundle::new(),
            ReplayDirection::Reverse,
        )
        .unwrap();

        assert!(report.skipped.is_empty(), "{report:?}");
        for name in ["Stage", "Sprite1"] {
            assert_eq!(keyed_views(&derived, name), keyed_views(&old, name), "{name}");
        }
        // Sprite2's only content was added by the diff, so reverse replay
        // empties it again.
        assert!(derived
            .target("Sprite2")
            .unwrap()
            .variables_by_name()
            .is_empty());
    }

    #[test]
    fn script_items_are_ignored_not_applied() {
        let base = old_doc();
        let diff = Diff::from_items(
            vec![DiffItem::new(ChangeType::ScriptAdd, "Stage").with_new(json!("text"))],
            vec![],
        );
        let (derived, report) =
            apply_diff(&base, &diff, &ResourceBundle::new(), ReplayDirection::Forward).unwrap();
        assert_eq!(report.ignored, 1);
        assert_eq!(report.applied, 0);
        assert_eq!(derived, base);
    }

    #[test]
    fn missing_target_skips_non_additions() {
        let base = old_doc();
        let diff = Diff::from_items(
            vec![DiffItem::new(ChangeType::VariableDelete, "Ghost").with_old(json!(["x", 1]))],
            vec![],
        );
        let (derived, report) =
            apply_diff(&base, &diff, &ResourceBundle::new(), ReplayDirection::Forward).unwrap();
        assert!(derived.target("Ghost").is_none());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::TargetMissing);
        assert_eq!(report.skipped[0].index, 0);
    }

    #[test]
    fn addition_into_missing_target_creates_shell() {
        let base = old_doc();
        let diff = Diff::from_items(
            vec![DiffItem::new(ChangeType::VariableAdd, "Ghost").with_new(json!(["x", 1]))],
            vec![],
        );
        let (derived, report) =
            apply_diff(&base, &diff, &ResourceBundle::new(), ReplayDirection::Forward).unwrap();
        assert!(report.is_clean());
        let ghost = derived.target("Ghost").unwrap();
        assert_eq!(ghost.variables_by_name()["x"], json!(["x", 1]));
        assert!(ghost.blocks.is_empty());
    }

    #[test]
    fn missing_entry_skips_edit() {
        let base = old_doc();
        let diff = Diff::from_items(
            vec![DiffItem::new(ChangeType::VariableEdit, "Stage")
                .with_old(json!(["ghost-var", 1]))
                .with_new(json!(["ghost-var", 2]))],
            vec![],
        );
        let (derived, report) =
            apply_diff(&base, &diff, &ResourceBundle::new(), ReplayDirection::Forward).unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::EntryMissing);
        // Other entries are untouched.
        assert_eq!(
            derived.target("Stage").unwrap().variables_by_name(),
            base.target("Stage").unwrap().variables_by_name()
        );
    }

    #[test]
    fn missing_payload_is_fatal() {
        let base = old_doc();
        let diff = Diff::from_items(vec![DiffItem::new(ChangeType::VariableAdd, "Stage")], vec![]);
        let err = apply_diff(&base, &diff, &ResourceBundle::new(), ReplayDirection::Forward)
            .unwrap_err();
        assert_eq!(
            err,
            ApplyError::MissingPayload {
                index: 0,
                change: ChangeType::VariableAdd,
                side: "new"
            }
        );
    }

    #[test]
    fn malformed_payload_is_fatal() {
        let base = old_doc();
        let diff = Diff::from_items(
            vec![DiffItem::new(ChangeType::VariableAdd, "Stage").with_new(json!({"name": "x"}))],
            vec![],
        );
        let err = apply_diff(&base, &diff, &ResourceBundle::new(), ReplayDirection::Forward)
            .unwrap_err();
        assert!(matches!(err, ApplyError::MalformedPayload { index: 0, .. }));
    }

    #[test]
    fn absent_bundle_assets_are_reported() {
        let base = old_doc();
        let diff = Diff::from_items(
            vec![DiffItem::new(ChangeType::CostumeAdd, "Stage")
                .with_new(json!({ "name": "stars", "md5ext": "bb.png" }))],
            vec![],
        );
        let (_, report) =
            apply_diff(&base, &diff, &ResourceBundle::new(), ReplayDirection::Forward).unwrap();
        assert_eq!(report.missing_assets, ["bb.png"]);
        assert_eq!(report.applied, 1);
    }

    #[test]
    fn variable_edit_keeps_the_original_id() {
        let base = old_doc();
        let diff = Diff::from_items(
            vec![DiffItem::new(ChangeType::VariableEdit, "Stage")
                .with_old(json!(["score", 0]))
                .with_new(json!(["score", 99]))],
            vec![],
        );
        let (derived, _) =
            apply_diff(&base, &diff, &ResourceBundle::new(), ReplayDirection::Forward).unwrap();
        let stage = derived.target("Stage").unwrap();
        // Replaying an edit must not move the entry to a new id.
        assert_eq!(stage.variables["v1"], json!(["score", 99]));
    }

    #[test]
    fn replay_is_idempotent_for_additions() {
        let base = old_doc();
        let diff = Diff::from_items(
            vec![DiffItem::new(ChangeType::VariableAdd, "Stage").with_new(json!(["combo", 1]))],
            vec![],
        );
        let (once, _) =
            apply_diff(&base, &diff, &ResourceBundle::new(), ReplayDirection::Forward).unwrap();
        let (twice, _) =
            apply_diff(&once, &diff, &ResourceBundle::new(), ReplayDirection::Forward).unwrap();
        assert_eq!(once, twice);
    }
}

//! Flattened script rendering and plain-text diff output.
//!
//! Scripts render to one line per node at its nesting depth, in an
//! id-free canonical textual form, so unrelated id renaming can never
//! surface as a change. The same lines feed the similarity fallback, the
//! line-level edit script, and the human-readable output. All output is
//! plain text; terminal styling is someone else's job.

use bgd_graph::{Block, InputValue, Script};
use bgd_types::{ChangeKind, Diff, DiffItem};
use serde_json::Value;

/// Flatten a script to one id-free line per node at its nesting depth.
pub fn script_lines(script: &Script) -> Vec<String> {
    let mut out = Vec::new();
    push_chain(&script.root, 0, &mut out);
    out
}

fn push_chain(head: &Block, depth: usize, out: &mut Vec<String>) {
    for block in head.chain() {
        out.push(format!("{}{}", "  ".repeat(depth), signature(block)));
        for child in &block.children {
            push_chain(&child.body, depth + 1, out);
        }
    }
}

/// One block's canonical textual form, without its children.
fn signature(block: &Block) -> String {
    let mut parts: Vec<String> = Vec::new();
    for (name, value) in &block.fields {
        parts.push(format!("{name}={}", compact(value)));
    }
    for (name, input) in &block.inputs {
        match input {
            InputValue::Literal(value) => parts.push(format!("{name}={}", compact(value))),
            InputValue::Subtree(sub) => parts.push(format!("{name}=({})", inline_signature(sub))),
        }
    }
    if let Some(mutation) = &block.mutation {
        match mutation.get("proccode").and_then(Value::as_str) {
            Some(proccode) => parts.push(format!("proc={proccode:?}")),
            None => parts.push(format!("mutation={}", compact(mutation))),
        }
    }
    if parts.is_empty() {
        block.opcode.clone()
    } else {
        format!("{}({})", block.opcode, parts.join(", "))
    }
}

// Expression sub-trees render inline inside their parent's line;
// structural children of an inline expression (malformed but possible)
// render inline too.
fn inline_signature(head: &Block) -> String {
    head.chain()
        .map(|block| {
            let mut text = signature(block);
            for child in &block.children {
                text.push_str(&format!(
                    " {}=({})",
                    child.slot,
                    inline_signature(&child.body)
                ));
            }
            text
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn compact(value: &Value) -> String {
    value.to_string()
}

/// Render a diff artifact as plain text: per-target sections, one line
/// per item, embedded line-diff hunks indented beneath script edits.
pub fn render_diff(diff: &Diff) -> String {
    let mut out = String::new();
    let mut current_target: Option<&str> = None;

    for item in &diff.items {
        let target = item.location.target_name.as_str();
        if current_target != Some(target) {
            if current_target.is_some() {
                out.push('\n');
            }
            out.push_str(&format!("target {target}:\n"));
            current_target = Some(target);
        }
        out.push_str(&format!("  {} {}\n", item.change, item_label(item)));
        if let Some(line_diff) = &item.diff {
            for line in line_diff.text.lines() {
                out.push_str(&format!("    {line}\n"));
            }
        }
    }

    if !diff.warnings.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("warnings:\n");
        for warning in &diff.warnings {
            out.push_str(&format!("  {warning}\n"));
        }
    }

    if out.is_empty() {
        out.push_str("no differences\n");
    } else {
        out.push_str(&format!("\n{} item(s)\n", diff.summary.total()));
    }
    out
}

fn item_label(item: &DiffItem) -> String {
    let payload = item.new.as_ref().or(item.old.as_ref());
    match item.kind() {
        ChangeKind::Script | ChangeKind::Block => item
            .fingerprint
            .map(|fp| fp.short_hex())
            .unwrap_or_default(),
        ChangeKind::Variable | ChangeKind::List => payload
            .and_then(|entry| entry.get(0))
            .and_then(Value::as_str)
            .unwrap_or("?")
            .to_string(),
        ChangeKind::Costume | ChangeKind::Sound => payload
            .and_then(|entry| entry.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("?")
            .to_string(),
    }
}

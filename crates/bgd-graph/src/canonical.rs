//! Record canonicalization.
//!
//! The native format threads opaque ids and UI-only metadata through block
//! records: field descriptors carry the id of the thing they name, input
//! wrappers carry shadow bookkeeping, named-reference literals carry the
//! referent's id, and procedure mutations carry an id-dependent argument
//! list plus XML serialization boilerplate. All of it is volatile under id
//! renaming and none of it is content. The functions here strip it, so
//! fingerprinting and structural equality only ever see canonical records.

use serde_json::{json, Map, Value};

use crate::block::Block;

/// Literal descriptor codes for scalar values (number, positive number,
/// whole number, integer, angle, color, string).
const SCALAR_CODES: std::ops::RangeInclusive<u64> = 4..=10;
/// Literal descriptor codes for named references (broadcast, variable,
/// list); the trailing id element is volatile.
const BROADCAST_CODE: u64 = 11;
const VARIABLE_CODE: u64 = 12;
const LIST_CODE: u64 = 13;

/// The decoded meaning of a raw input slot.
#[derive(Clone, Debug, PartialEq)]
pub enum InputDescriptor<'a> {
    /// The slot holds another block, by id.
    BlockId(&'a str),
    /// The slot holds a canonical literal value.
    Literal(Value),
    /// The slot is empty (an unfilled branch or obscured shadow).
    Empty,
}

/// Decode a raw input slot into its canonical meaning.
///
/// Native inputs are `[shadow-state, active, obscured?]` wrappers. The
/// active element is either a block id (string), a literal descriptor
/// array, or null for an unfilled slot. Scalar descriptors collapse to
/// their value; named-reference descriptors keep `[code, name]` with the
/// volatile id stripped.
pub fn decode_input(raw: &Value) -> InputDescriptor<'_> {
    let Some(wrapper) = raw.as_array() else {
        // Tolerate unwrapped values; treat them as literals.
        return InputDescriptor::Literal(raw.clone());
    };
    let Some(active) = wrapper.get(1) else {
        return InputDescriptor::Empty;
    };
    match active {
        Value::Null => InputDescriptor::Empty,
        Value::String(id) => InputDescriptor::BlockId(id),
        Value::Array(descriptor) => InputDescriptor::Literal(canonical_descriptor(descriptor)),
        other => InputDescriptor::Literal(other.clone()),
    }
}

fn canonical_descriptor(descriptor: &[Value]) -> Value {
    let code = descriptor.first().and_then(Value::as_u64);
    let value = descriptor.get(1).cloned().unwrap_or(Value::Null);
    match code {
        Some(code) if SCALAR_CODES.contains(&code) => value,
        Some(code @ (BROADCAST_CODE | VARIABLE_CODE | LIST_CODE)) => json!([code, value]),
        _ => Value::Array(descriptor.to_vec()),
    }
}

/// Canonicalize a raw field descriptor.
///
/// Native fields are `[value, id?]` pairs; the id names the referent's
/// slot in some other namespace and is stripped. Bare values pass through.
pub fn canonical_field(raw: &Value) -> Value {
    match raw.as_array() {
        Some(pair) => pair.first().cloned().unwrap_or(Value::Null),
        None => raw.clone(),
    }
}

/// Canonicalize a procedure mutation record.
///
/// Keeps the call signature (`proccode`, `argumentnames`,
/// `argumentdefaults`) and a normalized boolean `warp`; drops the XML
/// serialization boilerplate (`tagName`, `children`) and the id-dependent
/// `argumentids` list.
pub fn canonical_mutation(raw: &Value) -> Value {
    let Some(record) = raw.as_object() else {
        return raw.clone();
    };
    let mut canonical = Map::new();
    for key in ["proccode", "argumentnames", "argumentdefaults"] {
        if let Some(value) = record.get(key) {
            canonical.insert(key.to_string(), value.clone());
        }
    }
    if let Some(warp) = record.get("warp") {
        let normalized = match warp {
            Value::Bool(b) => Value::Bool(*b),
            Value::String(s) => Value::Bool(s == "true"),
            other => other.clone(),
        };
        canonical.insert("warp".to_string(), normalized);
    }
    Value::Object(canonical)
}

/// Canonicalize a variable entry for collection comparison.
///
/// A trailing explicit `false` cloud flag is equivalent to its absence.
pub fn canonical_variable_entry(entry: &Value) -> Value {
    if let Some(parts) = entry.as_array() {
        if parts.len() == 3 && parts[2] == Value::Bool(false) {
            return Value::Array(parts[..2].to_vec());
        }
    }
    entry.clone()
}

/// Materialize an array-form primitive entry as a canonical leaf block.
///
/// Returns `None` for unrecognized codes.
pub fn primitive_block(parts: &[Value]) -> Option<Block> {
    let code = parts.first().and_then(Value::as_u64)?;
    let name = parts.get(1).cloned().unwrap_or(Value::Null);
    let (opcode, field) = match code {
        BROADCAST_CODE => ("event_broadcast_menu", "BROADCAST_OPTION"),
        VARIABLE_CODE => ("data_variable", "VARIABLE"),
        LIST_CODE => ("data_listcontents", "LIST"),
        _ => return None,
    };
    let mut block = Block::leaf(opcode);
    block.fields.insert(field.to_string(), name);
    Some(block)
}

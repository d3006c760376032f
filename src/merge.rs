//! Merge logic for MCF documents
//!
//! Implements the child-wins strategy used when a document inherits from a
//! base document, plus the deduplicating list append used when several
//! sources contribute to the same sequence.

use serde_json::{Map, Value};

/// Merge a base mapping into a child mapping
///
/// - Keys only in the base: copied into the child
/// - Keys in both, both mappings: merged recursively
/// - Keys in both otherwise: the child value wins, the base value is dropped
pub fn merge_base(child: &mut Map<String, Value>, base: Map<String, Value>) {
    for (key, base_value) in base {
        match child.get_mut(&key) {
            Some(Value::Object(child_obj)) => {
                if let Value::Object(base_obj) = base_value {
                    merge_base(child_obj, base_obj);
                }
            }
            Some(_) => {
                // Child wins
            }
            None => {
                child.insert(key, base_value);
            }
        }
    }
}

/// Check if two values are semantically equal
///
/// Sequence items carrying an `identifier` compare on that field alone.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(obj_a), Value::Object(obj_b)) => {
            if let (Some(id_a), Some(id_b)) = (obj_a.get("identifier"), obj_b.get("identifier")) {
                return id_a == id_b;
            }
            obj_a == obj_b
        }
        _ => a == b,
    }
}

/// Check if a sequence contains a value (using semantic equality)
pub fn contains_value(arr: &[Value], value: &Value) -> bool {
    arr.iter().any(|v| values_equal(v, value))
}

/// Append a value to a sequence unless an equal item is already present
///
/// Returns whether the value was added.
pub fn push_unique(arr: &mut Vec<Value>, value: Value) -> bool {
    if contains_value(arr, &value) {
        false
    } else {
        arr.push(value);
        true
    }
}

// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Deep merge of ordered YAML documents.
//!
//! Mappings merge recursively, sequences append the elements of the right
//! operand that are not already present, and any other collision (two
//! scalars, or a type mismatch) is won by the right operand without error.
//! That last rule means a later composefile silently redefines scalar fields
//! of an earlier one.

use serde_yaml::Value;

#[cfg(test)]
#[path = "./merge_test.rs"]
mod merge_test;

/// Merge documents left to right.
///
/// Returns `None` for an empty input. A single document is returned as an
/// equal copy; inputs are never mutated.
pub fn merge(documents: &[Value]) -> Option<Value> {
    let (first, rest) = documents.split_first()?;
    Some(
        rest.iter()
            .fold(first.clone(), |merged, next| merge_pair(&merged, next)),
    )
}

/// Merge `right` on top of a copy of `left`.
pub fn merge_pair(left: &Value, right: &Value) -> Value {
    let mut merged = left.clone();
    merge_into(&mut merged, right);
    merged
}

fn merge_into(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Mapping(target), Value::Mapping(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Value::Sequence(target), Value::Sequence(source)) => {
            for item in source {
                if !target.contains(item) {
                    target.push(item.clone());
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Substitution of `${name}` and `${!name}` references between variables.
//!
//! Every variable is given a depth: variables without references have depth
//! 1, and a variable with references sits one level above its deepest
//! dependency. Variables are then rewritten in ascending depth order (ties
//! keep declaration order), so each reference reads an already resolved
//! value.

use std::collections::HashMap;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_yaml::{Mapping, Number, Value};

use crate::{Error, Result};

#[cfg(test)]
#[path = "./variables_test.rs"]
mod variables_test;

/// Matches `${name}` and the negated form `${!name}`.
static REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{(!?)([^}!]+)\}").expect("reference pattern is valid"));

/// Resolve every reference in `variables` against the other keys of the same mapping.
///
/// The output keeps the declaration order of `variables`.
///
/// # Errors
///
/// [`Error::UnresolvableEnvironment`] when a reference names a key that does
/// not exist, and [`Error::CyclicEnvironment`] when references loop.
pub fn resolve_variables(variables: &Mapping) -> Result<Mapping> {
    let entries: Vec<(String, &Value)> = variables
        .iter()
        .map(|(key, value)| (text(key), value))
        .collect();

    let dependencies: IndexMap<&str, Vec<String>> = entries
        .iter()
        .map(|(key, value)| (key.as_str(), references(value)))
        .collect();

    let mut depths = HashMap::new();
    for (key, _) in &entries {
        depth_of(key, &dependencies, &mut depths, &mut Vec::new())?;
    }

    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by_key(|index| depths[entries[*index].0.as_str()]);

    let mut known: HashMap<String, Value> = HashMap::new();
    for index in order {
        let (key, value) = &entries[index];
        let resolved = substitute(value, &known);
        tracing::trace!(variable = %key, depth = depths[key.as_str()], "resolved");
        known.insert(key.clone(), resolved);
    }

    let mut resolved = Mapping::new();
    for (key, _) in entries {
        let value = known.remove(&key).unwrap_or(Value::Null);
        resolved.insert(Value::String(key), value);
    }
    Ok(resolved)
}

/// List the variable names referenced anywhere in `value`, including mapping keys.
pub fn references(value: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect_references(value, &mut found);
    found
}

fn collect_references(value: &Value, found: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            for captures in REFERENCE.captures_iter(s) {
                let name = captures[2].to_string();
                if !found.contains(&name) {
                    found.push(name);
                }
            }
        }
        Value::Sequence(items) => {
            for item in items {
                collect_references(item, found);
            }
        }
        Value::Mapping(mapping) => {
            for (key, item) in mapping {
                collect_references(key, found);
                collect_references(item, found);
            }
        }
        Value::Tagged(tagged) => collect_references(&tagged.value, found),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn depth_of(
    key: &str,
    dependencies: &IndexMap<&str, Vec<String>>,
    depths: &mut HashMap<String, usize>,
    visiting: &mut Vec<String>,
) -> Result<usize> {
    if let Some(depth) = depths.get(key) {
        return Ok(*depth);
    }
    if let Some(position) = visiting.iter().position(|name| name == key) {
        let mut cycle = visiting[position..].to_vec();
        cycle.push(key.to_string());
        return Err(Error::CyclicEnvironment {
            key: key.to_string(),
            cycle,
        });
    }

    visiting.push(key.to_string());
    let mut depth = 1;
    for dependency in &dependencies[key] {
        if !dependencies.contains_key(dependency.as_str()) {
            return Err(Error::UnresolvableEnvironment {
                key: key.to_string(),
                dependency: dependency.clone(),
            });
        }
        depth = depth.max(1 + depth_of(dependency, dependencies, depths, visiting)?);
    }
    visiting.pop();

    depths.insert(key.to_string(), depth);
    Ok(depth)
}

fn substitute(value: &Value, known: &HashMap<String, Value>) -> Value {
    match value {
        Value::String(s) => substitute_str(s, known),
        Value::Sequence(items) => {
            Value::Sequence(items.iter().map(|item| substitute(item, known)).collect())
        }
        Value::Mapping(mapping) => Value::Mapping(
            mapping
                .iter()
                .map(|(key, item)| (substitute(key, known), substitute(item, known)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn substitute_str(s: &str, known: &HashMap<String, Value>) -> Value {
    let mut tokens = REFERENCE.captures_iter(s);
    let Some(first) = tokens.next() else {
        return coerce(s);
    };

    // A lone reference keeps the referenced value's type.
    let whole = first.get(0).is_some_and(|m| m.start() == 0 && m.end() == s.len());
    if whole && tokens.next().is_none() {
        if let Some(value) = lookup(&first, known) {
            return value;
        }
    }

    let replaced = REFERENCE.replace_all(s, |captures: &Captures| {
        lookup(captures, known)
            .map(|value| text(&value))
            .unwrap_or_else(|| captures[0].to_string())
    });
    Value::String(replaced.into_owned())
}

fn lookup(captures: &Captures, known: &HashMap<String, Value>) -> Option<Value> {
    let value = known.get(&captures[2])?;
    if captures[1].is_empty() {
        Some(value.clone())
    } else {
        Some(negate(value))
    }
}

/// Apply the `!` operator.
///
/// Booleans invert, integers map `0` to `1` and anything else to `0`, and
/// strings that read as either are treated the same way. Other values pass
/// through untouched.
pub fn negate(value: &Value) -> Value {
    match value {
        Value::Bool(b) => Value::Bool(!b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Number(Number::from(i64::from(i == 0))),
            None => value.clone(),
        },
        Value::String(s) => match coerce(s) {
            coerced @ (Value::Bool(_) | Value::Number(_)) => negate(&coerced),
            _ => value.clone(),
        },
        other => other.clone(),
    }
}

/// Turn strings that read as an integer or boolean into that native type.
pub fn coerce(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        Value::Bool(true)
    } else if s.eq_ignore_ascii_case("false") {
        Value::Bool(false)
    } else if let Ok(i) = s.parse::<i64>() {
        Value::Number(Number::from(i))
    } else {
        Value::String(s.to_string())
    }
}

/// Render a value as the text that replaces a reference.
///
/// Scalars render plainly, null renders empty, and collections render as JSON.
pub fn text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Tagged(tagged) => text(&tagged.value),
        collection => serde_json::to_string(collection).unwrap_or_else(|_| {
            serde_yaml::to_string(collection)
                .map(|yaml| yaml.trim_end().to_string())
                .unwrap_or_default()
        }),
    }
}

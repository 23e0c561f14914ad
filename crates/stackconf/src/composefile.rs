// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Composefile loading and selection filtering.

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::error::read_file;
use crate::schema::{Selection, SelectionSet};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./composefile_test.rs"]
mod composefile_test;

/// Top-level section holding service definitions.
pub const SERVICES: &str = "services";

/// Top-level section holding named volume definitions.
pub const VOLUMES: &str = "volumes";

/// Top-level section holding network definitions.
pub const NETWORKS: &str = "networks";

/// Load one composefile fragment.
pub fn load_composefile<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::MissingComposefile(path.to_path_buf()));
    }
    let yaml = read_file(path)?;
    if yaml.trim().is_empty() {
        return Ok(Value::Mapping(Mapping::new()));
    }
    let document: Value = serde_yaml::from_str(&yaml).map_err(|error| Error::InvalidYaml {
        path: path.to_path_buf(),
        error,
        yaml_content: yaml.clone(),
    })?;
    match document {
        Value::Null => Ok(Value::Mapping(Mapping::new())),
        Value::Mapping(_) => Ok(document),
        _ => Err(Error::ValidationFailed(format!(
            "composefile {path:?} is not a mapping"
        ))),
    }
}

/// Load composefile fragments in order.
pub fn load_composefiles(paths: &[PathBuf]) -> Result<Vec<Value>> {
    paths.iter().map(load_composefile).collect()
}

/// Keep only the selected entries of a document.
pub fn apply_selection(document: &Value, selection: &Selection) -> Value {
    match selection {
        Selection::All => document.clone(),
        Selection::Only(set) => filter(document, set),
    }
}

/// Copy `document`, dropping every service, volume and network not in `selection`.
///
/// Sections absent from `document` stay absent. Remaining services lose
/// their `depends_on` entries on services that were dropped.
pub fn filter(document: &Value, selection: &SelectionSet) -> Value {
    let mut filtered = document.clone();
    for (section, keep) in [
        (SERVICES, &selection.services),
        (VOLUMES, &selection.volumes),
        (NETWORKS, &selection.networks),
    ] {
        if let Some(entries) = section_mut(&mut filtered, section) {
            let before = entries.len();
            *entries = std::mem::take(entries)
                .into_iter()
                .filter(|(name, _)| name.as_str().is_some_and(|n| keep.iter().any(|k| k == n)))
                .collect();
            tracing::debug!("{section}: kept {} of {before}", entries.len());
        }
    }
    if let Some(services) = section_mut(&mut filtered, SERVICES) {
        for service in services.values_mut().filter_map(Value::as_mapping_mut) {
            prune_depends_on(service, &selection.services);
        }
    }
    filtered
}

/// Drop `depends_on` references to services that were filtered out.
fn prune_depends_on(service: &mut Mapping, keep: &[String]) {
    let kept = |name: &Value| name.as_str().is_some_and(|n| keep.iter().any(|k| k == n));
    let empty = match service.get_mut("depends_on") {
        Some(Value::Sequence(names)) => {
            names.retain(kept);
            names.is_empty()
        }
        Some(Value::Mapping(conditions)) => {
            conditions.retain(|name, _| kept(name));
            conditions.is_empty()
        }
        _ => false,
    };
    if empty {
        service.remove("depends_on");
    }
}

/// The named top-level section, if it is a mapping.
pub fn section<'a>(document: &'a Value, name: &str) -> Option<&'a Mapping> {
    document.get(name).and_then(Value::as_mapping)
}

/// Mutable access to the named top-level section, if it is a mapping.
pub fn section_mut<'a>(document: &'a mut Value, name: &str) -> Option<&'a mut Mapping> {
    document.get_mut(name).and_then(Value::as_mapping_mut)
}

/// Names of the entries of a top-level section, in document order.
pub fn section_keys(document: &Value, name: &str) -> Vec<String> {
    section(document, name)
        .map(|entries| {
            entries
                .keys()
                .filter_map(|key| key.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

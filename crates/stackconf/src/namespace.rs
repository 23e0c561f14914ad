// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Namespace rewriting of service and volume identifiers.

use std::collections::HashSet;

use serde_yaml::{Mapping, Value};

use crate::composefile::{SERVICES, VOLUMES};
use crate::volume::VolumeMount;

#[cfg(test)]
#[path = "./namespace_test.rs"]
mod namespace_test;

/// Flag marking a top-level volume as exempt from namespacing.
pub const SHARED_FLAG: &str = "shared";

/// `{namespace}_{environment}_{volume}`
pub fn volume_name(namespace: &str, environment: &str, volume: &str) -> String {
    format!("{namespace}_{environment}_{volume}")
}

/// `{namespace}_{service}`
pub fn service_name(namespace: &str, service: &str) -> String {
    format!("{namespace}_{service}")
}

/// Rewrite `document` so it can coexist with other namespaces.
///
/// Shared volumes always lose their `shared` flag, since it is not part of
/// the compose format. Nothing else changes without a namespace.
pub fn apply_namespace(document: &Value, namespace: Option<&str>, environment: &str) -> Value {
    let mut document = document.clone();
    let eligible = strip_shared(&mut document);
    let Some(namespace) = namespace else {
        return document;
    };
    tracing::debug!("namespacing as {namespace} ({} volumes eligible)", eligible.len());

    if let Some(volumes) = document.get_mut(VOLUMES).and_then(Value::as_mapping_mut) {
        *volumes = std::mem::take(volumes)
            .into_iter()
            .map(|(key, value)| match key.as_str() {
                Some(name) if eligible.contains(name) => {
                    (volume_name(namespace, environment, name).into(), value)
                }
                _ => (key, value),
            })
            .collect();
    }

    let Some(services) = document.get_mut(SERVICES).and_then(Value::as_mapping_mut) else {
        return document;
    };
    let service_keys: HashSet<String> = services
        .keys()
        .filter_map(|key| key.as_str().map(str::to_string))
        .collect();

    for service in services.values_mut() {
        let Some(service) = service.as_mapping_mut() else {
            continue;
        };
        if let Some(mounts) = service.get_mut("volumes").and_then(Value::as_sequence_mut) {
            for mount in mounts.iter_mut() {
                rewrite_mount(mount, &eligible, |name| volume_name(namespace, environment, name));
            }
        }
        if let Some(depends_on) = service.get_mut("depends_on") {
            rewrite_depends_on(depends_on, &service_keys, namespace);
        }
    }

    *services = std::mem::take(services)
        .into_iter()
        .map(|(key, value)| match key.as_str() {
            Some(name) => (service_name(namespace, name).into(), value),
            None => (key, value),
        })
        .collect();
    document
}

/// Remove the shared flag from every top-level volume and return the names
/// of those that did not carry it.
fn strip_shared(document: &mut Value) -> HashSet<String> {
    let mut eligible = HashSet::new();
    let Some(volumes) = document.get_mut(VOLUMES).and_then(Value::as_mapping_mut) else {
        return eligible;
    };
    for (key, definition) in volumes.iter_mut() {
        let shared = definition
            .as_mapping_mut()
            .and_then(|definition| definition.remove(SHARED_FLAG))
            .is_some_and(|flag| flag.as_bool().unwrap_or(false));
        if let (false, Some(name)) = (shared, key.as_str()) {
            eligible.insert(name.to_string());
        }
    }
    eligible
}

fn rewrite_mount<F>(mount: &mut Value, eligible: &HashSet<String>, rename: F)
where
    F: Fn(&str) -> String,
{
    match mount {
        Value::String(entry) => {
            let parsed = match VolumeMount::parse(entry) {
                Ok(parsed) => parsed,
                // Anonymous volume.
                Err(_) if !entry.contains(':') => return,
                Err(error) => {
                    tracing::warn!("mount left as is: {error}");
                    return;
                }
            };
            if parsed.is_named() && eligible.contains(parsed.host()) {
                let rest = &entry[parsed.host().len()..];
                *entry = format!("{}{rest}", rename(parsed.host()));
            }
        }
        Value::Mapping(long) => {
            let is_volume = long
                .get("type")
                .and_then(Value::as_str)
                .is_none_or(|kind| kind == "volume");
            let source = long.get("source").and_then(Value::as_str);
            if let (true, Some(source)) = (is_volume, source) {
                if eligible.contains(source) {
                    let renamed = rename(source);
                    long.insert("source".into(), renamed.into());
                }
            }
        }
        _ => {}
    }
}

fn rewrite_depends_on(depends_on: &mut Value, services: &HashSet<String>, namespace: &str) {
    let rename = |name: &str| {
        if services.contains(name) {
            service_name(namespace, name)
        } else {
            name.to_string()
        }
    };
    match depends_on {
        Value::Sequence(names) => {
            for name in names.iter_mut() {
                if let Some(renamed) = name.as_str().map(rename) {
                    *name = renamed.into();
                }
            }
        }
        Value::Mapping(conditions) => {
            let renamed: Mapping = std::mem::take(conditions)
                .into_iter()
                .map(|(key, value)| match key.as_str() {
                    Some(name) => (rename(name).into(), value),
                    None => (key, value),
                })
                .collect();
            *conditions = renamed;
        }
        _ => {}
    }
}

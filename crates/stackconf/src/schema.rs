// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Schemas: named selections of services, volumes and networks.
//!
//! ```yaml
//! # schemas.yaml
//! standard:
//!   services: [portainer]
//!   volumes: [portainer]
//!   networks: [net]
//! standard2:
//!   includes: [standard]
//!   services: [pouet]
//!   networks: [net]
//! ```
//!
//! Schemas are resolved in declaration order, so a schema may only include
//! schemas declared above it.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::load_yaml;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./schema_test.rs"]
mod schema_test;

/// Schema name that selects everything without filtering.
pub const ALL_SCHEMA: &str = "all";

/// A schema as declared in the schema file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Schema {
    /// Schemas whose selections are unioned into this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,

    #[serde(flatten)]
    pub selection: SelectionSet,
}

/// Names of the services, volumes and networks to keep.
///
/// The lists behave as sets: [`SelectionSet::union`] never adds a name twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SelectionSet {
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub volumes: Vec<String>,
    #[serde(default)]
    pub networks: Vec<String>,
}

impl SelectionSet {
    /// Add every name of `other` not already selected.
    pub fn union(&mut self, other: &SelectionSet) {
        extend_unique(&mut self.services, &other.services);
        extend_unique(&mut self.volumes, &other.volumes);
        extend_unique(&mut self.networks, &other.networks);
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty() && self.volumes.is_empty() && self.networks.is_empty()
    }
}

fn extend_unique(target: &mut Vec<String>, names: &[String]) {
    for name in names {
        if !target.contains(name) {
            target.push(name.clone());
        }
    }
}

/// What a configuration keeps from the merged composefiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Keep everything.
    All,
    /// Keep only the named entries.
    Only(SelectionSet),
}

impl Selection {
    /// Build the selection for a list of schema names plus explicit extras.
    ///
    /// Naming [`ALL_SCHEMA`] anywhere selects everything.
    pub fn from_schemas(
        schemas: &SchemaSet,
        names: &[String],
        existing: &SelectionSet,
    ) -> Result<Self> {
        if names.iter().any(|name| name == ALL_SCHEMA) {
            return Ok(Self::All);
        }
        resolve_selection(schemas, names, existing).map(Self::Only)
    }
}

/// All schemas of a project, with includes already resolved.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    resolved: IndexMap<String, SelectionSet>,
}

impl SchemaSet {
    /// Load a schema file. A missing file is an empty set.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            tracing::debug!("no schema file at {path:?}");
            return Ok(Self::default());
        }
        let schemas: IndexMap<String, Schema> = load_yaml(path)?;
        Self::build(schemas)
    }

    /// Parse schemas from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let schemas: IndexMap<String, Schema> =
            serde_yaml::from_str(yaml).map_err(|error| Error::InvalidYaml {
                path: "<string>".into(),
                error,
                yaml_content: yaml.to_string(),
            })?;
        Self::build(schemas)
    }

    /// Resolve includes in a single pass over `schemas` in declaration order.
    pub fn build(schemas: IndexMap<String, Schema>) -> Result<Self> {
        let mut resolved: IndexMap<String, SelectionSet> = IndexMap::new();
        for (name, schema) in schemas {
            let mut selection = SelectionSet::default();
            for include in &schema.includes {
                let included = resolved.get(include).ok_or_else(|| Error::MalformedSchema {
                    schema: name.clone(),
                    include: include.clone(),
                })?;
                selection.union(included);
            }
            selection.union(&schema.selection);
            resolved.insert(name, selection);
        }
        Ok(Self { resolved })
    }

    /// The resolved selection of one schema.
    pub fn resolve(&self, name: &str) -> Result<&SelectionSet> {
        self.resolved
            .get(name)
            .ok_or_else(|| Error::MissingSchema(name.to_string()))
    }

    /// Schema names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resolved.keys().map(String::as_str)
    }
}

/// Union the selections of `names` with an already existing selection.
pub fn resolve_selection(
    schemas: &SchemaSet,
    names: &[String],
    existing: &SelectionSet,
) -> Result<SelectionSet> {
    let mut selection = SelectionSet::default();
    selection.union(existing);
    for name in names {
        selection.union(schemas.resolve(name)?);
    }
    Ok(selection)
}

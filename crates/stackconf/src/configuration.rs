// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Saved configurations and the per-project store that keeps them.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{load_yaml, write_file};
use crate::schema::{Selection, SchemaSet, SelectionSet};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./configuration_test.rs"]
mod configuration_test;

/// A named, runnable variant of the project.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Configuration {
    /// Key of the record in the store.
    #[serde(skip)]
    pub name: String,

    /// User that created the configuration and may change it.
    pub user: String,

    pub environment: String,

    /// Schemas the selection was built from.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemas: Vec<String>,

    /// Services, volumes and networks selected by the schemas and by hand.
    #[serde(flatten)]
    pub selection: SelectionSet,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Configuration {
    pub fn new<N, U, E>(name: N, user: U, environment: E) -> Self
    where
        N: Into<String>,
        U: Into<String>,
        E: Into<String>,
    {
        let now = Utc::now();
        Self {
            name: name.into(),
            user: user.into(),
            environment: environment.into(),
            schemas: Vec::new(),
            selection: SelectionSet::default(),
            namespace: None,
            created: now,
            updated: now,
        }
    }

    /// What the configuration keeps from the merged composefiles.
    pub fn resolve_selection(&self, schemas: &SchemaSet) -> Result<Selection> {
        Selection::from_schemas(schemas, &self.schemas, &self.selection)
    }

    /// Fail unless `user` owns this configuration.
    pub fn check_owner(&self, user: &str) -> Result<()> {
        if self.user != user {
            return Err(Error::NotOwner {
                name: self.name.clone(),
                owner: self.user.clone(),
            });
        }
        Ok(())
    }
}

/// Name of the user running this process.
pub fn current_user() -> String {
    whoami::username()
}

/// YAML file keyed by configuration name.
#[derive(Debug, Clone)]
pub struct ConfigurationStore {
    path: PathBuf,
}

impl ConfigurationStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<IndexMap<String, Configuration>> {
        if !self.path.is_file() {
            return Ok(IndexMap::new());
        }
        let records: Option<IndexMap<String, Configuration>> = load_yaml(&self.path)?;
        let mut records = records.unwrap_or_default();
        for (name, record) in records.iter_mut() {
            record.name.clone_from(name);
        }
        Ok(records)
    }

    fn write(&self, records: &IndexMap<String, Configuration>) -> Result<()> {
        let yaml = serde_yaml::to_string(records)
            .map_err(|e| Error::ValidationFailed(format!("cannot serialize configurations: {e}")))?;
        write_file(&self.path, yaml)
    }

    /// All configurations in creation order.
    pub fn list(&self) -> Result<Vec<Configuration>> {
        Ok(self.read()?.into_values().collect())
    }

    pub fn get(&self, name: &str) -> Result<Configuration> {
        self.read()?
            .swap_remove(name)
            .ok_or_else(|| Error::MissingConfiguration(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.read()?.contains_key(name))
    }

    pub fn create(&self, configuration: &Configuration) -> Result<()> {
        let mut records = self.read()?;
        if records.contains_key(&configuration.name) {
            return Err(Error::ExistingConfiguration(configuration.name.clone()));
        }
        records.insert(configuration.name.clone(), configuration.clone());
        self.write(&records)
    }

    /// Replace a configuration owned by `user`, refreshing its update time.
    pub fn update(&self, configuration: &Configuration, user: &str) -> Result<Configuration> {
        let mut records = self.read()?;
        let existing = records
            .get(&configuration.name)
            .ok_or_else(|| Error::MissingConfiguration(configuration.name.clone()))?;
        existing.check_owner(user)?;

        let mut updated = configuration.clone();
        updated.user.clone_from(&existing.user);
        updated.created = existing.created;
        updated.updated = Utc::now();
        records.insert(updated.name.clone(), updated.clone());
        self.write(&records)?;
        Ok(updated)
    }

    /// Remove a configuration owned by `user` and return it.
    pub fn remove(&self, name: &str, user: &str) -> Result<Configuration> {
        let mut records = self.read()?;
        let existing = records
            .get(name)
            .ok_or_else(|| Error::MissingConfiguration(name.to_string()))?;
        existing.check_owner(user)?;
        let removed = records
            .shift_remove(name)
            .ok_or_else(|| Error::MissingConfiguration(name.to_string()))?;
        self.write(&records)?;
        Ok(removed)
    }
}

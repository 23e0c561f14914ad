// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Named environments: importable variable sets stored as YAML files.
//!
//! ```yaml
//! # environments/dev.yaml
//! imports:
//!   - default
//! environment:
//!   DEBUG: true
//!   API_URL: "http://${API_HOST}:8000"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{load_yaml, write_file};
use crate::merge::merge;
use crate::variables::{resolve_variables, text};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./environment_test.rs"]
mod environment_test;

/// File extensions recognized for environment files, in lookup order.
const ENVIRONMENT_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Contents of a single environment file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EnvironmentFile {
    /// Other environments whose variables are merged in before this file's own.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,

    /// Variables declared by this file.
    #[serde(default)]
    pub environment: Mapping,
}

/// A loaded environment with its imports merged in.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Name of the environment that was requested.
    pub name: String,

    /// Variables, substituted unless `resolved` is false.
    pub variables: Mapping,

    /// Whether reference substitution succeeded.
    pub resolved: bool,

    /// Every environment file that contributed, in load order.
    pub source_files: Vec<PathBuf>,
}

impl Environment {
    /// Look up a single variable.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    /// Render the variables as an env-file for the compose tool.
    pub fn to_export(&self) -> String {
        render_export(&self.variables)
    }
}

/// The directory of environment files for a project.
#[derive(Debug, Clone)]
pub struct EnvironmentSet {
    dir: PathBuf,
}

impl EnvironmentSet {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path to an existing environment file, if any.
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        ENVIRONMENT_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{name}.{ext}")))
            .find(|path| path.is_file())
    }

    /// Names of all environments, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_env = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ENVIRONMENT_EXTENSIONS.contains(&ext));
            if let (true, Some(stem)) = (is_env, path.file_stem().and_then(|s| s.to_str())) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Read one environment file without following its imports.
    pub fn load_file(&self, name: &str) -> Result<(PathBuf, EnvironmentFile)> {
        let path = self.find(name).ok_or_else(|| Error::MissingEnvironment {
            name: name.to_string(),
            dir: self.dir.clone(),
        })?;
        let file = load_yaml(&path)?;
        Ok((path, file))
    }

    /// Create a new environment file.
    pub fn create(&self, name: &str, file: &EnvironmentFile) -> Result<PathBuf> {
        if self.find(name).is_some() {
            return Err(Error::ExistingEnvironment(name.to_string()));
        }
        let path = self.dir.join(format!("{name}.{}", ENVIRONMENT_EXTENSIONS[0]));
        let yaml = serde_yaml::to_string(file)
            .map_err(|e| Error::ValidationFailed(format!("cannot serialize environment: {e}")))?;
        write_file(&path, yaml)?;
        Ok(path)
    }

    /// Load an environment, merge its imports and substitute references.
    ///
    /// `builtins` are merged underneath everything else. A reference that
    /// cannot be resolved is logged and the raw, unsubstituted variables are
    /// returned instead.
    pub fn load(&self, name: &str, builtins: &Mapping) -> Result<Environment> {
        let mut seen = Vec::new();
        let mut source_files = Vec::new();
        let declared = self.collect(name, &mut seen, &mut source_files)?;

        let raw = merge(&[Value::Mapping(builtins.clone()), declared])
            .and_then(|merged| match merged {
                Value::Mapping(mapping) => Some(mapping),
                _ => None,
            })
            .unwrap_or_default();

        let (variables, resolved) = match resolve_variables(&raw) {
            Ok(variables) => (variables, true),
            Err(err @ (Error::UnresolvableEnvironment { .. } | Error::CyclicEnvironment { .. })) => {
                tracing::warn!("environment '{name}' left unresolved: {err}");
                (raw, false)
            }
            Err(err) => return Err(err),
        };

        Ok(Environment {
            name: name.to_string(),
            variables,
            resolved,
            source_files,
        })
    }

    fn collect(
        &self,
        name: &str,
        seen: &mut Vec<String>,
        source_files: &mut Vec<PathBuf>,
    ) -> Result<Value> {
        seen.push(name.to_string());
        let (path, file) = self.load_file(name)?;
        tracing::debug!("loading environment {name} from {path:?}");
        source_files.push(path);

        let mut layers = Vec::with_capacity(file.imports.len() + 1);
        for import in &file.imports {
            if seen.contains(import) {
                tracing::debug!("environment {name}: skipping repeated import {import}");
                continue;
            }
            layers.push(self.collect(import, seen, source_files)?);
        }
        layers.push(Value::Mapping(file.environment));

        Ok(merge(&layers).unwrap_or(Value::Mapping(Mapping::new())))
    }
}

/// Flatten variables into `KEY=value` lines.
///
/// Collections are written as JSON and newlines are escaped so every
/// variable stays on one line.
pub fn render_export(variables: &Mapping) -> String {
    let mut out = String::new();
    for (key, value) in variables {
        let value = text(value).replace('\r', "\\r").replace('\n', "\\n");
        out.push_str(&text(key));
        out.push('=');
        out.push_str(&value);
        out.push('\n');
    }
    out
}

/// Write the env-file export for `variables` to `path`.
pub fn write_export(path: &Path, variables: &Mapping) -> Result<()> {
    write_file(path, render_export(variables))
}

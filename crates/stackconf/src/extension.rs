// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Project-defined subcommands.
//!
//! Extensions are external programs declared in the project's extension
//! manifest:
//!
//! ```yaml
//! # extensions.yaml
//! - name: psql
//!   about: Open a psql shell on the database
//!   command: [./scripts/psql.sh, --user, admin]
//! ```
//!
//! `stackconf psql mydb` then runs `./scripts/psql.sh --user admin mydb` from
//! the project root.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::command::check_status;
use crate::error::load_yaml;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./extension_test.rs"]
mod extension_test;

/// A subcommand offered by an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcommandInfo {
    pub name: String,
    pub about: String,
}

/// What an extension is told about the invocation.
#[derive(Debug, Clone, Default)]
pub struct ExtensionContext {
    pub project_root: PathBuf,
    pub configuration: Option<String>,
    /// Generated composefile of the configuration in use.
    pub composefile: Option<PathBuf>,
}

/// Provider of additional CLI subcommands.
pub trait Extension {
    /// The subcommands this extension handles.
    fn describe(&self) -> Vec<SubcommandInfo>;

    /// Run `subcommand` with its remaining arguments and return its exit code.
    fn handle(&self, subcommand: &str, args: &[String], context: &ExtensionContext) -> Result<i32>;
}

/// One entry of the extension manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionEntry {
    pub name: String,
    #[serde(default)]
    pub about: String,
    /// Program and leading arguments.
    pub command: Vec<String>,
}

/// Extensions declared in a manifest file.
#[derive(Debug, Clone, Default)]
pub struct ManifestExtensions {
    entries: Vec<ExtensionEntry>,
}

impl ManifestExtensions {
    /// Load a manifest. A missing file declares no extensions.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Ok(Self::default());
        }
        let entries: Option<Vec<ExtensionEntry>> = load_yaml(path)?;
        Self::new(entries.unwrap_or_default())
    }

    pub fn new(entries: Vec<ExtensionEntry>) -> Result<Self> {
        for (index, entry) in entries.iter().enumerate() {
            if entry.command.is_empty() {
                return Err(Error::ValidationFailed(format!(
                    "extension '{}' has an empty command",
                    entry.name
                )));
            }
            if entries[..index].iter().any(|other| other.name == entry.name) {
                return Err(Error::ValidationFailed(format!(
                    "extension '{}' is declared twice",
                    entry.name
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<&ExtensionEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}

impl Extension for ManifestExtensions {
    fn describe(&self) -> Vec<SubcommandInfo> {
        self.entries
            .iter()
            .map(|entry| SubcommandInfo {
                name: entry.name.clone(),
                about: entry.about.clone(),
            })
            .collect()
    }

    fn handle(&self, subcommand: &str, args: &[String], context: &ExtensionContext) -> Result<i32> {
        let entry = self
            .get(subcommand)
            .ok_or_else(|| Error::UnknownExtension(subcommand.to_string()))?;
        let (program, leading) = entry
            .command
            .split_first()
            .ok_or_else(|| Error::UnknownExtension(subcommand.to_string()))?;

        let program = if program.contains('/') && Path::new(program).is_relative() {
            context.project_root.join(program).display().to_string()
        } else {
            program.clone()
        };

        let mut command = Command::new(&program);
        command
            .args(leading)
            .args(args)
            .current_dir(&context.project_root)
            .env("STACKCONF_PROJECT_ROOT", &context.project_root);
        if let Some(configuration) = &context.configuration {
            command.env("STACKCONF_CONFIGURATION", configuration);
        }
        if let Some(composefile) = &context.composefile {
            command.env("STACKCONF_COMPOSEFILE", composefile);
        }

        tracing::debug!("running extension {subcommand}: {program}");
        let status = command.status()?;
        check_status(subcommand, status)
    }
}

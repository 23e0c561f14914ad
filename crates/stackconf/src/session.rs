// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! The per-user "current configuration" pointer of a project.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{load_yaml, write_file};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./session_test.rs"]
mod session_test;

/// Session state of one user in one project.
///
/// Callers load it at the start of an operation and save it at the end,
/// while holding the project lock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Session {
    /// Configuration that commands without an explicit name act on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,

    #[serde(skip)]
    path: PathBuf,
}

impl Session {
    /// Load the session stored at `path`, or an empty one.
    pub fn load<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        let mut session = if path.is_file() {
            load_yaml::<Option<Session>>(&path)?.unwrap_or_default()
        } else {
            Session::default()
        };
        session.path = path;
        Ok(session)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| Error::ValidationFailed(format!("cannot serialize session: {e}")))?;
        write_file(&self.path, yaml)
    }

    /// The configuration to act on: `explicit` if given, else the current one.
    pub fn select(&self, explicit: Option<&str>) -> Result<String> {
        explicit
            .map(str::to_string)
            .or_else(|| self.current.clone())
            .ok_or_else(|| {
                Error::ValidationFailed(
                    "no configuration given and none is in use; run 'stackconf use <name>'"
                        .to_string(),
                )
            })
    }

    /// Forget the current configuration if it is `name`.
    pub fn forget(&mut self, name: &str) {
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
    }
}

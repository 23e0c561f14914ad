// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Advisory lock serializing mutating operations on a project.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[cfg(test)]
#[path = "./lock_test.rs"]
mod lock_test;

/// Time between two acquisition attempts while waiting.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How long an unbounded wait stays quiet before telling the user.
const WAIT_NOTICE_AFTER: Duration = Duration::from_secs(3);

/// What to do when the lock is already held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockMode {
    /// Fail right away.
    #[default]
    Immediate,
    /// Retry until the timeout elapses, then fail.
    Bounded(Duration),
    /// Retry forever.
    Unbounded,
}

/// Who holds a lock, as recorded in the lock file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LockHolder {
    pub user: String,
    pub hostname: String,
    pub pid: u32,
    pub acquired: DateTime<Utc>,
}

impl LockHolder {
    fn current() -> Self {
        Self {
            user: whoami::username(),
            hostname: hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            acquired: Utc::now(),
        }
    }
}

impl fmt::Display for LockHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} (pid {}) since {}",
            self.user,
            self.hostname,
            self.pid,
            self.acquired.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

/// A held project lock. The lock file is removed when this is dropped.
#[derive(Debug)]
pub struct ProjectLock {
    path: PathBuf,
    holder: LockHolder,
}

impl ProjectLock {
    /// Take the lock at `path`, waiting according to `mode`.
    pub fn acquire<P: Into<PathBuf>>(path: P, mode: LockMode) -> Result<Self> {
        let path = path.into();
        let started = Instant::now();
        let mut noticed = false;
        loop {
            if let Some(lock) = Self::try_acquire(&path)? {
                return Ok(lock);
            }

            let elapsed = started.elapsed();
            let wait = match mode {
                LockMode::Immediate => return Err(Self::locked(&path)),
                LockMode::Bounded(timeout) if elapsed >= timeout => {
                    return Err(Self::locked(&path));
                }
                LockMode::Bounded(timeout) => POLL_INTERVAL.min(timeout - elapsed),
                LockMode::Unbounded => {
                    if !noticed && elapsed >= WAIT_NOTICE_AFTER {
                        noticed = true;
                        tracing::warn!("waiting for project lock held by {}", Self::describe_holder(&path));
                    }
                    POLL_INTERVAL
                }
            };
            tracing::debug!("project lock busy, retrying in {wait:?}");
            std::thread::sleep(wait);
        }
    }

    /// Take the lock if it is free.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| Error::WriteFailed {
                path: parent.to_path_buf(),
                error,
            })?;
        }
        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(file) => file,
            Err(error) if error.kind() == std::io::ErrorKind::AlreadyExists => return Ok(None),
            Err(error) => {
                return Err(Error::WriteFailed {
                    path: path.to_path_buf(),
                    error,
                });
            }
        };

        let lock = Self {
            path: path.to_path_buf(),
            holder: LockHolder::current(),
        };
        let yaml = serde_yaml::to_string(&lock.holder)
            .map_err(|e| Error::ValidationFailed(format!("cannot serialize lock holder: {e}")))?;
        file.write_all(yaml.as_bytes()).map_err(|error| Error::WriteFailed {
            path: path.to_path_buf(),
            error,
        })?;
        tracing::debug!("acquired project lock {path:?}");
        Ok(Some(lock))
    }

    /// The holder recorded in the lock file at `path`, if the lock is held.
    pub fn read_holder(path: &Path) -> Option<LockHolder> {
        let yaml = std::fs::read_to_string(path).ok()?;
        serde_yaml::from_str(&yaml).ok()
    }

    pub fn holder(&self) -> &LockHolder {
        &self.holder
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn describe_holder(path: &Path) -> String {
        Self::read_holder(path)
            .map(|holder| holder.to_string())
            .unwrap_or_else(|| "another process".to_string())
    }

    fn locked(path: &Path) -> Error {
        Error::ProjectLocked {
            holder: Self::describe_holder(path),
            path: path.to_path_buf(),
        }
    }
}

impl Drop for ProjectLock {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            tracing::warn!("failed to release project lock {:?}: {err}", self.path);
        } else {
            tracing::debug!("released project lock {:?}", self.path);
        }
    }
}

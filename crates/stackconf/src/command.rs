// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Running the compose tool against a generated composefile.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::{Error, Result};

#[cfg(test)]
#[path = "./command_test.rs"]
mod command_test;

/// Exit code shells report for a process ended by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Runs a command line against a composefile.
pub trait CommandRunner {
    /// Run with `args` and return the exit code of a successful run.
    fn run(&self, composefile: &Path, args: &[String]) -> Result<i32>;
}

/// The project's compose tool, such as `docker compose`.
#[derive(Debug, Clone)]
pub struct ComposeCommand {
    program: String,
    leading_args: Vec<String>,
    project_name: Option<String>,
    working_dir: Option<PathBuf>,
    env: Vec<(String, String)>,
}

impl ComposeCommand {
    /// `command` is the program followed by its leading arguments.
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, leading_args) = command
            .split_first()
            .ok_or_else(|| Error::ValidationFailed("compose command is empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            leading_args: leading_args.to_vec(),
            project_name: None,
            working_dir: None,
            env: Vec::new(),
        })
    }

    /// Pass `-p <name>` so generated configurations do not share a compose project.
    pub fn with_project_name<S: Into<String>>(mut self, name: S) -> Self {
        self.project_name = Some(name.into());
        self
    }

    pub fn with_working_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_env<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// The full command line, for display.
    pub fn command_line(&self, composefile: &Path, args: &[String]) -> Vec<String> {
        let mut line = vec![self.program.clone()];
        line.extend(self.leading_args.iter().cloned());
        line.push("-f".to_string());
        line.push(composefile.display().to_string());
        if let Some(name) = &self.project_name {
            line.push("-p".to_string());
            line.push(name.clone());
        }
        line.extend(args.iter().cloned());
        line
    }

    fn build(&self, composefile: &Path, args: &[String]) -> Command {
        let line = self.command_line(composefile, args);
        let mut command = Command::new(&line[0]);
        command.args(&line[1..]);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        command.envs(self.env.iter().map(|(k, v)| (k, v)));
        command
    }
}

impl CommandRunner for ComposeCommand {
    fn run(&self, composefile: &Path, args: &[String]) -> Result<i32> {
        let line = self.command_line(composefile, args).join(" ");
        tracing::info!("running {line}");
        let status = self
            .build(composefile, args)
            .status()
            .map_err(|error| {
                tracing::error!("failed to start {}: {error}", self.program);
                Error::Io(error)
            })?;
        check_status(&line, status)
    }
}

/// Turn an exit status into the exit code of a successful run or an error.
pub fn check_status(command: &str, status: ExitStatus) -> Result<i32> {
    if status.success() {
        return Ok(0);
    }
    match status.code() {
        Some(INTERRUPTED_EXIT_CODE) => Err(Error::StoppedCommandExecution(command.to_string())),
        Some(code) => Err(Error::FailedCommandExecution {
            command: command.to_string(),
            code,
        }),
        None => signal_error(command, status),
    }
}

#[cfg(unix)]
fn signal_error(command: &str, status: ExitStatus) -> Result<i32> {
    use std::os::unix::process::ExitStatusExt;

    const SIGINT: i32 = 2;
    match status.signal() {
        Some(SIGINT) => Err(Error::StoppedCommandExecution(command.to_string())),
        signal => Err(Error::FailedCommandExecution {
            command: command.to_string(),
            code: 128 + signal.unwrap_or(0),
        }),
    }
}

#[cfg(not(unix))]
fn signal_error(command: &str, _status: ExitStatus) -> Result<i32> {
    Err(Error::FailedCommandExecution {
        command: command.to_string(),
        code: -1,
    })
}

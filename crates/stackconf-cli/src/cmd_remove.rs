// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `stackconf remove` command.

use clap::Args;
use colored::Colorize;
use miette::Result;

/// Remove configurations and their generated files
#[derive(Debug, Args)]
pub struct CmdRemove {
    /// Configurations to remove
    #[clap(required = true)]
    names: Vec<String>,

    #[clap(flatten)]
    project: crate::ProjectFlags,
}

impl CmdRemove {
    pub fn run(&mut self) -> Result<i32> {
        let project = self.project.open()?;
        let _lock = self.project.lock(&project)?;
        let store = project.store();
        let user = stackconf::current_user();
        let mut session = stackconf::Session::load(project.session_file(&user))?;

        for name in &self.names {
            store.remove(name, &user)?;
            project.artifacts(name).clear()?;
            session.forget(name);
            println!("{} configuration {}", "Removed".red().bold(), name.cyan());
        }
        session.save()?;
        Ok(0)
    }
}

// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `stackconf use` command.

use clap::Args;
use miette::Result;

/// Select the configuration other commands act on
#[derive(Debug, Args)]
pub struct CmdUse {
    /// Configuration to use
    name: String,

    #[clap(flatten)]
    project: crate::ProjectFlags,
}

impl CmdUse {
    pub fn run(&mut self) -> Result<i32> {
        let project = self.project.open()?;
        if !project.store().contains(&self.name)? {
            return Err(stackconf::Error::MissingConfiguration(self.name.clone()).into());
        }

        let user = stackconf::current_user();
        let mut session = stackconf::Session::load(project.session_file(&user))?;
        session.current = Some(self.name.clone());
        session.save()?;
        println!("Using configuration {}", self.name);
        Ok(0)
    }
}

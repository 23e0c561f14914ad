// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `stackconf list` command.

use clap::Args;
use colored::Colorize;
use miette::Result;

/// List configurations
#[derive(Debug, Args)]
pub struct CmdList {
    /// Only list configurations of the current user
    #[clap(long)]
    mine: bool,

    #[clap(flatten)]
    project: crate::ProjectFlags,
}

impl CmdList {
    pub fn run(&mut self) -> Result<i32> {
        let project = self.project.open()?;
        let user = stackconf::current_user();
        let session = stackconf::Session::load(project.session_file(&user))?;

        let configurations: Vec<_> = project
            .store()
            .list()?
            .into_iter()
            .filter(|c| !self.mine || c.user == user)
            .collect();

        if configurations.is_empty() {
            println!("  {}", "(no configurations)".dimmed());
            return Ok(0);
        }

        for configuration in &configurations {
            let marker = if session.current.as_deref() == Some(configuration.name.as_str()) {
                "*".green().bold()
            } else {
                " ".normal()
            };
            let namespace = configuration
                .namespace
                .as_deref()
                .map(|ns| format!(" [namespace: {ns}]"))
                .unwrap_or_default();
            println!(
                "{} {} {} ({}){}",
                marker,
                configuration.name.cyan(),
                configuration.environment.green(),
                configuration.user,
                namespace.blue()
            );
        }
        Ok(0)
    }
}

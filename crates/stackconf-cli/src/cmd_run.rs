// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `stackconf run` command.

use clap::Args;
use miette::Result;
use stackconf::CommandRunner;

/// Run the compose tool on a configuration
#[derive(Debug, Args)]
pub struct CmdRun {
    /// Configuration to run (default: the current one)
    #[clap(short, long)]
    configuration: Option<String>,

    #[clap(flatten)]
    project: crate::ProjectFlags,

    /// Arguments for the compose tool, such as 'up -d'
    #[clap(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    args: Vec<String>,
}

impl CmdRun {
    pub fn run(&mut self) -> Result<i32> {
        let project = self.project.open()?;
        let user = stackconf::current_user();
        let session = stackconf::Session::load(project.session_file(&user))?;
        let name = session.select(self.configuration.as_deref())?;
        // Fails early for unknown configurations.
        project.store().get(&name)?;

        let layout = project.artifacts(&name);
        let composefile = layout.composefile();
        if !composefile.is_file() {
            return Err(miette::miette!(
                help = format!("Run 'stackconf update {name}' first"),
                "Configuration '{name}' has not been generated"
            ));
        }

        let compose = stackconf::ComposeCommand::new(&project.config().compose_command)?
            .with_project_name(crate::compose_project_name(&project, &name))
            .with_working_dir(project.root());
        Ok(compose.run(&composefile, &self.args)?)
    }
}

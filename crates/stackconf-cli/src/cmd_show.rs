// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `stackconf show` command.

use clap::Args;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};

/// Display a configuration or its generated composefile
#[derive(Debug, Args)]
pub struct CmdShow {
    /// Configuration to show (default: the current one)
    name: Option<String>,

    /// Print the generated composefile
    #[clap(long)]
    composefile: bool,

    /// Print the resolved environment variables
    #[clap(long)]
    variables: bool,

    /// Output format: table, yaml
    #[clap(long, default_value = "table")]
    format: String,

    #[clap(flatten)]
    project: crate::ProjectFlags,
}

impl CmdShow {
    pub fn run(&mut self) -> Result<i32> {
        let project = self.project.open()?;
        let user = stackconf::current_user();
        let session = stackconf::Session::load(project.session_file(&user))?;
        let name = session.select(self.name.as_deref())?;
        let configuration = project.store().get(&name)?;

        if self.composefile {
            let path = project.artifacts(&name).composefile();
            let yaml = std::fs::read_to_string(&path)
                .map_err(|e| miette::miette!("Failed to read generated composefile {path:?}: {e}"))?;
            print!("{yaml}");
            return Ok(0);
        }

        if self.variables {
            let environment = stackconf::pipeline::load_environment(&project, &configuration)?;
            print!("{}", environment.to_export());
            return Ok(0);
        }

        if self.format == "yaml" {
            let yaml = serde_yaml::to_string(&configuration).into_diagnostic()?;
            print!("{yaml}");
            return Ok(0);
        }

        self.show_table(&project, &configuration);
        Ok(0)
    }

    fn show_table(&self, project: &stackconf::Project, configuration: &stackconf::Configuration) {
        println!("{} {}", "Configuration:".bold(), configuration.name.cyan());
        println!();
        println!("  {:<12} {}", "user", configuration.user);
        println!("  {:<12} {}", "environment", configuration.environment.green());
        println!(
            "  {:<12} {}",
            "namespace",
            configuration.namespace.as_deref().unwrap_or("(none)")
        );
        println!("  {:<12} {}", "schemas", list(&configuration.schemas));
        println!("  {:<12} {}", "services", list(&configuration.selection.services));
        println!("  {:<12} {}", "volumes", list(&configuration.selection.volumes));
        println!("  {:<12} {}", "networks", list(&configuration.selection.networks));
        println!(
            "  {:<12} {}",
            "updated",
            configuration.updated.format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!();

        let composefile = project.artifacts(&configuration.name).composefile();
        if composefile.is_file() {
            println!("{} {}", "Composefile:".bold(), composefile.display().to_string().cyan());
        } else {
            println!("{} {}", "Composefile:".bold(), "(not generated)".dimmed());
        }
    }
}

fn list(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `stackconf env` commands.

use clap::{Args, Subcommand};
use colored::Colorize;
use miette::Result;

/// Manage environments
#[derive(Debug, Args)]
pub struct CmdEnv {
    #[clap(subcommand)]
    cmd: EnvCommand,

    #[clap(flatten)]
    project: crate::ProjectFlags,
}

#[derive(Debug, Subcommand)]
enum EnvCommand {
    /// List environments
    List,

    /// Create an environment file
    Create {
        /// Name of the new environment
        name: String,

        /// Environment to import (repeatable)
        #[clap(short, long = "import")]
        imports: Vec<String>,
    },

    /// Print the resolved variables of an environment
    Show {
        /// Environment to show
        name: String,
    },
}

impl CmdEnv {
    pub fn run(&mut self) -> Result<i32> {
        let project = self.project.open()?;
        let environments = project.environments();

        match &self.cmd {
            EnvCommand::List => {
                let names = environments.list()?;
                if names.is_empty() {
                    println!("  {}", "(no environments)".dimmed());
                }
                for name in names {
                    if name == project.config().default_environment {
                        println!("{} {}", name.cyan(), "(default)".dimmed());
                    } else {
                        println!("{}", name.cyan());
                    }
                }
            }
            EnvCommand::Create { name, imports } => {
                for import in imports {
                    environments.load_file(import)?;
                }
                let file = stackconf::EnvironmentFile {
                    imports: imports.clone(),
                    ..Default::default()
                };
                let path = environments.create(name, &file)?;
                println!("{} environment {}", "Created".green().bold(), name.cyan());
                println!("  {}", path.display().to_string().dimmed());
            }
            EnvCommand::Show { name } => {
                let builtins = project.builtins("", name, None);
                let environment = environments.load(name, &builtins)?;
                print!("{}", environment.to_export());
                if !environment.resolved {
                    eprintln!(
                        "{} references could not be resolved",
                        "warning:".yellow().bold()
                    );
                }
            }
        }
        Ok(0)
    }
}

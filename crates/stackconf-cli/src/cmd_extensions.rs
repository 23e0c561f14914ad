// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Listing and running project extensions.

use clap::Args;
use colored::Colorize;
use miette::Result;
use stackconf::Extension;

/// List project extensions
#[derive(Debug, Args)]
pub struct CmdExtensions {
    #[clap(flatten)]
    project: crate::ProjectFlags,
}

impl CmdExtensions {
    pub fn run(&mut self) -> Result<i32> {
        let project = self.project.open()?;
        let extensions = stackconf::ManifestExtensions::load(project.extensions_file())?;
        let subcommands = extensions.describe();

        if subcommands.is_empty() {
            println!("  {}", "(no extensions)".dimmed());
            return Ok(0);
        }
        let width = subcommands.iter().map(|s| s.name.len()).max().unwrap_or(0);
        for subcommand in subcommands {
            let name = format!("{:<width$}", subcommand.name);
            println!("  {}  {}", name.cyan(), subcommand.about);
        }
        Ok(0)
    }
}

/// Dispatch an unknown subcommand to the project's extensions.
pub fn run_external(args: &[String]) -> Result<i32> {
    let Some((subcommand, rest)) = args.split_first() else {
        return Err(miette::miette!("No subcommand given"));
    };
    let flags = crate::ProjectFlags::from_env();
    let project = flags.open()?;
    let extensions = stackconf::ManifestExtensions::load(project.extensions_file())?;

    let user = stackconf::current_user();
    let session = stackconf::Session::load(project.session_file(&user))?;
    let composefile = session
        .current
        .as_deref()
        .map(|name| project.artifacts(name).composefile())
        .filter(|path| path.is_file());
    let context = stackconf::ExtensionContext {
        project_root: project.root().to_path_buf(),
        configuration: session.current.clone(),
        composefile,
    };
    Ok(extensions.handle(subcommand, rest, &context)?)
}

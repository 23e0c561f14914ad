// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `stackconf create` command.

use clap::Args;
use colored::Colorize;
use miette::Result;

/// Create and generate a new configuration
#[derive(Debug, Args)]
pub struct CmdCreate {
    /// Name of the new configuration
    name: String,

    /// Environment to generate with (default: the project's default environment)
    #[clap(short, long)]
    environment: Option<String>,

    /// Schema to select from, 'all' for everything (repeatable)
    #[clap(short, long = "schema")]
    schemas: Vec<String>,

    /// Additional service to select (repeatable)
    #[clap(long = "service")]
    services: Vec<String>,

    /// Additional volume to select (repeatable)
    #[clap(long = "volume")]
    volumes: Vec<String>,

    /// Additional network to select (repeatable)
    #[clap(long = "network")]
    networks: Vec<String>,

    /// Prefix service and volume names with NAMESPACE
    #[clap(short, long)]
    namespace: Option<String>,

    /// Do not make the new configuration the current one
    #[clap(long)]
    no_use: bool,

    #[clap(flatten)]
    project: crate::ProjectFlags,
}

impl CmdCreate {
    pub fn run(&mut self) -> Result<i32> {
        let project = self.project.open()?;
        let _lock = self.project.lock(&project)?;
        let store = project.store();
        let user = stackconf::current_user();

        if store.contains(&self.name)? {
            return Err(stackconf::Error::ExistingConfiguration(self.name.clone()).into());
        }

        let environment = self
            .environment
            .clone()
            .unwrap_or_else(|| project.config().default_environment.clone());
        let mut configuration = stackconf::Configuration::new(&self.name, user.as_str(), environment);
        configuration.schemas = if self.schemas.is_empty() {
            vec![stackconf::ALL_SCHEMA.to_string()]
        } else {
            self.schemas.clone()
        };
        configuration.selection = stackconf::SelectionSet {
            services: self.services.clone(),
            volumes: self.volumes.clone(),
            networks: self.networks.clone(),
        };
        configuration.namespace = self.namespace.clone();

        let generated = stackconf::generate(&project, &configuration)?;
        store.create(&configuration)?;

        let mut session = stackconf::Session::load(project.session_file(&user))?;
        if !self.no_use || session.current.is_none() {
            session.current = Some(self.name.clone());
            session.save()?;
        }

        println!(
            "{} configuration {}",
            "Created".green().bold(),
            self.name.cyan()
        );
        println!("  {}", generated.layout.composefile().display().to_string().dimmed());
        if !generated.environment.resolved {
            println!(
                "  {} environment '{}' has unresolved references",
                "warning:".yellow().bold(),
                generated.environment.name
            );
        }
        Ok(0)
    }
}

// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `stackconf update` command.

use clap::Args;
use colored::Colorize;
use miette::Result;

/// Change a configuration and regenerate it
#[derive(Debug, Args)]
pub struct CmdUpdate {
    /// Configuration to update (default: the current one)
    name: Option<String>,

    /// Switch to another environment
    #[clap(short, long)]
    environment: Option<String>,

    /// Add a schema (repeatable)
    #[clap(short, long = "schema")]
    schemas: Vec<String>,

    /// Add a service (repeatable)
    #[clap(long = "service")]
    services: Vec<String>,

    /// Add a volume (repeatable)
    #[clap(long = "volume")]
    volumes: Vec<String>,

    /// Add a network (repeatable)
    #[clap(long = "network")]
    networks: Vec<String>,

    /// Change the namespace
    #[clap(short, long, conflicts_with = "no_namespace")]
    namespace: Option<String>,

    /// Stop namespacing
    #[clap(long)]
    no_namespace: bool,

    #[clap(flatten)]
    project: crate::ProjectFlags,
}

impl CmdUpdate {
    pub fn run(&mut self) -> Result<i32> {
        let project = self.project.open()?;
        let _lock = self.project.lock(&project)?;
        let store = project.store();
        let user = stackconf::current_user();
        let session = stackconf::Session::load(project.session_file(&user))?;
        let name = session.select(self.name.as_deref())?;

        let mut configuration = store.get(&name)?;
        configuration.check_owner(&user)?;

        if let Some(environment) = &self.environment {
            configuration.environment.clone_from(environment);
        }
        for schema in &self.schemas {
            if !configuration.schemas.contains(schema) {
                configuration.schemas.push(schema.clone());
            }
        }
        configuration.selection.union(&stackconf::SelectionSet {
            services: self.services.clone(),
            volumes: self.volumes.clone(),
            networks: self.networks.clone(),
        });
        if self.no_namespace {
            configuration.namespace = None;
        } else if let Some(namespace) = &self.namespace {
            configuration.namespace = Some(namespace.clone());
        }

        let generated = stackconf::generate(&project, &configuration)?;
        store.update(&configuration, &user)?;

        println!("{} configuration {}", "Updated".green().bold(), name.cyan());
        println!("  {}", generated.layout.composefile().display().to_string().dimmed());
        Ok(0)
    }
}

// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Verify that a generated configuration matches its current inputs.

use clap::Args;
use miette::Result;

/// Verify that a generated configuration is up to date
#[derive(Debug, Args)]
pub struct CmdCheck {
    /// Configuration to check (default: the current one)
    name: Option<String>,

    /// Exit with error on mismatch
    #[clap(long)]
    strict: bool,

    #[clap(flatten)]
    project: crate::ProjectFlags,
}

impl CmdCheck {
    pub fn run(&mut self) -> Result<i32> {
        let project = self.project.open()?;
        let user = stackconf::current_user();
        let session = stackconf::Session::load(project.session_file(&user))?;
        let name = session.select(self.name.as_deref())?;
        let configuration = project.store().get(&name)?;

        let manifest_path = project.artifacts(&name).manifest();
        if !manifest_path.exists() {
            if self.strict {
                return Err(miette::miette!("No manifest found at {:?}", manifest_path));
            } else {
                println!("Warning: Configuration '{name}' has not been generated");
                return Ok(2);
            }
        }
        let manifest = stackconf::GenerationManifest::load(&manifest_path)?;

        let environment = stackconf::pipeline::load_environment(&project, &configuration)?;
        let sources = stackconf::pipeline::input_files(&project, &environment);
        let changes = stackconf::verify_manifest(&manifest, &sources)?;

        if changes.is_empty() {
            println!("✓ Configuration '{name}' is up to date");
            return Ok(0);
        }

        // Report changes
        if self.strict {
            eprintln!("Error: Configuration '{name}' is out of date:");
        } else {
            println!("Warning: Configuration '{name}' is out of date:");
        }

        for change in &changes {
            let path = change.path.display();
            match change.kind {
                stackconf::ManifestChangeKind::SourceFileChanged => {
                    println!("  - Source file '{path}' was modified");
                }
                stackconf::ManifestChangeKind::SourceFileAdded => {
                    println!("  - Source file '{path}' is new");
                }
                stackconf::ManifestChangeKind::SourceFileRemoved => {
                    println!("  - Source file '{path}' was removed");
                }
            }
        }

        if self.strict {
            return Ok(1);
        }

        println!("\nRun 'stackconf update {name}' to regenerate it");
        Ok(0)
    }
}

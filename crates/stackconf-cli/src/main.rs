// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! stackconf - Namespaced Compose Configuration Generator CLI

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use miette::Result;

mod cmd_check;
mod cmd_create;
mod cmd_env;
mod cmd_extensions;
mod cmd_list;
mod cmd_remove;
mod cmd_run;
mod cmd_show;
mod cmd_update;
mod cmd_use;

use cmd_check::CmdCheck;
use cmd_create::CmdCreate;
use cmd_env::CmdEnv;
use cmd_extensions::CmdExtensions;
use cmd_list::CmdList;
use cmd_remove::CmdRemove;
use cmd_run::CmdRun;
use cmd_show::CmdShow;
use cmd_update::CmdUpdate;
use cmd_use::CmdUse;

#[derive(Parser)]
#[clap(
    name = "stackconf",
    about = "Namespaced Compose Configuration Generator",
    version,
    long_about = "Generate isolated, independently runnable variants of a multi-container application"
)]
struct Opt {
    #[clap(flatten)]
    logging: Logging,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
struct Logging {
    /// Increase verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[clap(short, long, global = true)]
    quiet: bool,
}

#[derive(Parser, Clone, Debug, Default)]
pub struct ProjectFlags {
    /// Project directory (default: nearest parent holding stackconf.yaml)
    #[clap(long, env = "STACKCONF_PROJECT")]
    pub project: Option<PathBuf>,

    /// Wait for the project lock: forever, or at most SECONDS
    #[clap(long, value_name = "SECONDS", num_args = 0..=1, default_missing_value = "0")]
    pub wait: Option<u64>,
}

impl ProjectFlags {
    /// Flags for invocations clap does not parse, such as extensions.
    pub fn from_env() -> Self {
        Self {
            project: std::env::var_os("STACKCONF_PROJECT").map(PathBuf::from),
            wait: None,
        }
    }

    pub fn open(&self) -> Result<stackconf::Project> {
        let project = match &self.project {
            Some(root) => stackconf::Project::open(root)?,
            None => stackconf::Project::discover(".")?,
        };
        Ok(project)
    }

    pub fn lock_mode(&self) -> stackconf::LockMode {
        match self.wait {
            None => stackconf::LockMode::Immediate,
            Some(0) => stackconf::LockMode::Unbounded,
            Some(seconds) => stackconf::LockMode::Bounded(Duration::from_secs(seconds)),
        }
    }

    pub fn lock(&self, project: &stackconf::Project) -> Result<stackconf::ProjectLock> {
        Ok(stackconf::ProjectLock::acquire(
            project.lock_file(),
            self.lock_mode(),
        )?)
    }
}

/// Name under which the compose tool groups the containers of a configuration.
pub fn compose_project_name(project: &stackconf::Project, configuration: &str) -> String {
    stackconf::volume::slugify(&format!("{}-{configuration}", project.name()))
}

#[derive(Subcommand)]
enum Command {
    /// Create and generate a new configuration
    Create(CmdCreate),

    /// Change a configuration and regenerate it
    Update(CmdUpdate),

    /// Remove configurations and their generated files
    Remove(CmdRemove),

    /// List configurations
    List(CmdList),

    /// Select the configuration other commands act on
    Use(CmdUse),

    /// Display a configuration or its generated composefile
    Show(CmdShow),

    /// Verify that a generated configuration is up to date
    Check(CmdCheck),

    /// Run the compose tool on a configuration
    Run(CmdRun),

    /// Manage environments
    Env(CmdEnv),

    /// List project extensions
    Extensions(CmdExtensions),

    #[clap(external_subcommand)]
    External(Vec<String>),
}

impl Opt {
    fn run(self) -> Result<i32> {
        // Setup logging
        let log_level = match (self.logging.quiet, self.logging.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .init();

        // Dispatch to command
        match self.cmd {
            Command::Create(mut cmd) => cmd.run(),
            Command::Update(mut cmd) => cmd.run(),
            Command::Remove(mut cmd) => cmd.run(),
            Command::List(mut cmd) => cmd.run(),
            Command::Use(mut cmd) => cmd.run(),
            Command::Show(mut cmd) => cmd.run(),
            Command::Check(mut cmd) => cmd.run(),
            Command::Run(mut cmd) => cmd.run(),
            Command::Env(mut cmd) => cmd.run(),
            Command::Extensions(mut cmd) => cmd.run(),
            Command::External(args) => cmd_extensions::run_external(&args),
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    let code = opt.run()?;
    std::process::exit(code);
}

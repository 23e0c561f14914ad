// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for stackconf operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience Result type with stackconf Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating configurations.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// No stackconf.yaml found in directory tree
    #[error("No stackconf.yaml found in {0:?} or any parent directory")]
    #[diagnostic(
        code(stackconf::project_not_found),
        help("Run from inside a project or point at one with --project")
    )]
    ProjectNotFound(PathBuf),

    /// A variable references a key that is not part of the environment
    #[error("Variable '{key}' references unknown variable '{dependency}'")]
    #[diagnostic(
        code(stackconf::unresolvable_environment),
        help("Define '{dependency}' in this environment or one of its imports")
    )]
    UnresolvableEnvironment { key: String, dependency: String },

    /// Variables reference each other in a loop
    #[error("Variable '{key}' is part of a reference cycle: {}", .cycle.join(" -> "))]
    #[diagnostic(code(stackconf::cyclic_environment))]
    CyclicEnvironment { key: String, cycle: Vec<String> },

    /// Environment file not found
    #[error("Environment '{name}' not found in {dir:?}")]
    #[diagnostic(code(stackconf::missing_environment))]
    MissingEnvironment { name: String, dir: PathBuf },

    /// Environment file already exists
    #[error("Environment '{0}' already exists")]
    #[diagnostic(code(stackconf::existing_environment))]
    ExistingEnvironment(String),

    /// Schema name not defined
    #[error("Schema '{0}' is not defined")]
    #[diagnostic(
        code(stackconf::missing_schema),
        help("Use 'all' to select every service, volume and network")
    )]
    MissingSchema(String),

    /// Schema includes a name that was not declared before it
    #[error("Schema '{schema}' includes '{include}' which is not defined before it")]
    #[diagnostic(
        code(stackconf::malformed_schema),
        help("Schemas may only include schemas declared earlier in the file")
    )]
    MalformedSchema { schema: String, include: String },

    /// Composefile listed in the project does not exist
    #[error("Composefile not found: {0:?}")]
    #[diagnostic(code(stackconf::missing_composefile))]
    MissingComposefile(PathBuf),

    /// Template file does not exist
    #[error("Template not found: {0:?}")]
    #[diagnostic(code(stackconf::missing_template))]
    MissingTemplate(PathBuf),

    /// Template file lacks a template suffix
    #[error("Not a template file: {0:?}")]
    #[diagnostic(
        code(stackconf::malformed_template),
        help("Template files must end with one of: {}", crate::template::TEMPLATE_SUFFIXES.join(", "))
    )]
    MalformedTemplate(PathBuf),

    /// Template rendering failed
    #[error("Failed to render {name}")]
    #[diagnostic(code(stackconf::template))]
    Template {
        name: String,
        #[source]
        error: tera::Error,
    },

    /// Volume entry is not host:container[:mode]
    #[error("Malformed volume entry: '{0}'")]
    #[diagnostic(
        code(stackconf::malformed_volume),
        help("Volume entries take the form host_path:container_path[:mode]")
    )]
    MalformedVolume(String),

    /// Static volume source does not exist
    #[error("Static content not found: {0:?}")]
    #[diagnostic(code(stackconf::missing_static_content))]
    MissingStaticContent(PathBuf),

    /// Project lock held by someone else
    #[error("Project is locked by {holder}")]
    #[diagnostic(
        code(stackconf::project_locked),
        help("Wait for the other operation to finish, or pass --wait")
    )]
    ProjectLocked { holder: String, path: PathBuf },

    /// Named configuration does not exist
    #[error("Configuration '{0}' does not exist")]
    #[diagnostic(code(stackconf::missing_configuration))]
    MissingConfiguration(String),

    /// Named configuration already exists
    #[error("Configuration '{0}' already exists")]
    #[diagnostic(
        code(stackconf::existing_configuration),
        help("Use 'stackconf update' to change an existing configuration")
    )]
    ExistingConfiguration(String),

    /// Configuration is owned by another user
    #[error("Configuration '{name}' belongs to {owner}")]
    #[diagnostic(code(stackconf::not_owner))]
    NotOwner { name: String, owner: String },

    /// External command exited with a failure status
    #[error("Command '{command}' failed with exit code {code}")]
    #[diagnostic(code(stackconf::failed_command_execution))]
    FailedCommandExecution { command: String, code: i32 },

    /// External command was interrupted
    #[error("Command '{0}' was interrupted")]
    #[diagnostic(code(stackconf::stopped_command_execution))]
    StoppedCommandExecution(String),

    /// No extension provides the requested subcommand
    #[error("Unknown subcommand: {0}")]
    #[diagnostic(
        code(stackconf::unknown_extension),
        help("Run 'stackconf extensions' to list project extensions")
    )]
    UnknownExtension(String),

    /// Invalid YAML in a project file
    #[error("Invalid YAML in {path:?}: {error}")]
    #[diagnostic(code(stackconf::invalid_yaml))]
    InvalidYaml {
        path: PathBuf,
        #[source]
        error: serde_yaml::Error,
        yaml_content: String,
    },

    /// Substituted composefile text no longer parses
    #[error("Rendered composefile is not valid YAML: {error}")]
    #[diagnostic(code(stackconf::invalid_rendered_composefile))]
    InvalidRenderedComposefile {
        #[source]
        error: serde_yaml::Error,
        #[help]
        help: Option<String>,
        yaml_content: String,
    },

    /// Failed to read file
    #[error("Failed to read file: {path:?}")]
    #[diagnostic(code(stackconf::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to write file
    #[error("Failed to write file: {path:?}")]
    #[diagnostic(code(stackconf::write_failed))]
    WriteFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Validation error
    #[error("Validation failed: {0}")]
    #[diagnostic(code(stackconf::validation_failed))]
    ValidationFailed(String),

    /// IO error passthrough
    #[error(transparent)]
    #[diagnostic(code(stackconf::io_error))]
    Io(#[from] std::io::Error),
}

/// Read a file to a string, reporting the path on failure.
pub(crate) fn read_file(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|error| Error::ReadFailed {
        path: path.to_path_buf(),
        error,
    })
}

/// Write a file, creating its parent directories first.
pub(crate) fn write_file(path: &std::path::Path, contents: impl AsRef<[u8]>) -> Result<()> {
    let wrap = |error: std::io::Error| Error::WriteFailed {
        path: path.to_path_buf(),
        error,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(wrap)?;
    }
    std::fs::write(path, contents).map_err(wrap)
}

/// Parse a YAML file into `T`, keeping the source text for diagnostics.
pub(crate) fn load_yaml<T>(path: &std::path::Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let yaml = read_file(path)?;
    serde_yaml::from_str(&yaml).map_err(|error| Error::InvalidYaml {
        path: path.to_path_buf(),
        error,
        yaml_content: yaml,
    })
}

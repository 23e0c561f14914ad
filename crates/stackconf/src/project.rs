// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Project discovery and the `stackconf.yaml` project file.
//!
//! ```yaml
//! # stackconf.yaml
//! api: stackconf/v0
//! name: myapp
//! composefiles:
//!   - docker-compose.yml
//!   - docker-compose.dev.yml
//! schemas: schemas.yaml
//! default_environment: default
//! alias_rule: prefix
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::configuration::ConfigurationStore;
use crate::environment::EnvironmentSet;
use crate::error::read_file;
use crate::schema::SchemaSet;
use crate::volume::AliasRule;
use crate::{Error, Result, PROJECT_FILENAME};

#[cfg(test)]
#[path = "./project_test.rs"]
mod project_test;

/// API version for project files.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ApiVersion {
    #[default]
    #[serde(rename = "stackconf/v0")]
    V0,
}

/// Contents of a `stackconf.yaml` file.
///
/// Relative paths are resolved against the directory holding the file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectConfig {
    pub api: ApiVersion,

    /// Project name. Defaults to the project directory name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Composefile fragments, merged in order.
    pub composefiles: Vec<PathBuf>,

    /// Schema file.
    pub schemas: PathBuf,

    /// Directory of `<name>.yaml` environment files.
    pub environments: PathBuf,

    /// Source root of `static` volume entries.
    pub files: PathBuf,

    /// Root of `shared` volume entries.
    pub shared: PathBuf,

    /// Configuration store, sessions, lock and generated artifacts.
    pub data: PathBuf,

    /// Environment used when a configuration does not name one.
    pub default_environment: String,

    pub alias_rule: AliasRule,

    /// Program and leading arguments of the compose tool.
    pub compose_command: Vec<String>,

    /// Extension manifest.
    pub extensions: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            api: ApiVersion::V0,
            name: None,
            composefiles: vec![PathBuf::from("docker-compose.yml")],
            schemas: PathBuf::from("schemas.yaml"),
            environments: PathBuf::from("environments"),
            files: PathBuf::from("files"),
            shared: PathBuf::from("shared"),
            data: PathBuf::from(".stackconf"),
            default_environment: "default".to_string(),
            alias_rule: AliasRule::default(),
            compose_command: vec!["docker".to_string(), "compose".to_string()],
            extensions: PathBuf::from("extensions.yaml"),
        }
    }
}

impl ProjectConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|error| Error::InvalidYaml {
            path: "<string>".into(),
            error,
            yaml_content: yaml.to_string(),
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = read_file(path)?;
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&yaml).map_err(|error| Error::InvalidYaml {
            path: path.to_path_buf(),
            error,
            yaml_content: yaml.clone(),
        })
    }

    /// Check the fields that have no usable fallback.
    pub fn validate(&self) -> Result<()> {
        if self.composefiles.is_empty() {
            return Err(Error::ValidationFailed(
                "project must list at least one composefile".to_string(),
            ));
        }
        if self.compose_command.is_empty() {
            return Err(Error::ValidationFailed(
                "compose_command must name a program".to_string(),
            ));
        }
        Ok(())
    }
}

/// A discovered project.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    name: String,
    config: ProjectConfig,
}

impl Project {
    /// Find the nearest project at or above `start_path`.
    pub fn discover<P: AsRef<Path>>(start_path: P) -> Result<Self> {
        let start = resolve_start_path(start_path.as_ref());
        let mut current = start.clone();
        loop {
            if current.join(PROJECT_FILENAME).is_file() {
                return Self::open(&current);
            }
            if !current.pop() {
                return Err(Error::ProjectNotFound(start));
            }
        }
    }

    /// Open the project rooted exactly at `root`.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let path = root.join(PROJECT_FILENAME);
        if !path.is_file() {
            return Err(Error::ProjectNotFound(root.to_path_buf()));
        }
        let root = dunce::canonicalize(root).map_err(|error| Error::ReadFailed {
            path: root.to_path_buf(),
            error,
        })?;
        let config = ProjectConfig::load(&path)?;
        config.validate()?;
        tracing::debug!("using project at {root:?}");
        Ok(Self::with_config(root, config))
    }

    /// Build a project from an already loaded config.
    pub fn with_config<P: Into<PathBuf>>(root: P, config: ProjectConfig) -> Self {
        let root = root.into();
        let name = config
            .name
            .clone()
            .or_else(|| {
                root.file_name()
                    .and_then(|name| name.to_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "stackconf".to_string());
        Self { root, name, config }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Resolve a project path: `~` is the home directory and relative paths
    /// are relative to the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if let Ok(rest) = path.strip_prefix("~") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn composefiles(&self) -> Vec<PathBuf> {
        self.config
            .composefiles
            .iter()
            .map(|path| self.resolve_path(path))
            .collect()
    }

    pub fn schema_file(&self) -> PathBuf {
        self.resolve_path(&self.config.schemas)
    }

    pub fn schemas(&self) -> Result<SchemaSet> {
        SchemaSet::load(self.schema_file())
    }

    pub fn environments(&self) -> EnvironmentSet {
        EnvironmentSet::new(self.resolve_path(&self.config.environments))
    }

    pub fn files_root(&self) -> PathBuf {
        self.resolve_path(&self.config.files)
    }

    pub fn shared_root(&self) -> PathBuf {
        self.resolve_path(&self.config.shared)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.data)
    }

    pub fn extensions_file(&self) -> PathBuf {
        self.resolve_path(&self.config.extensions)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.data_dir().join("lock")
    }

    pub fn session_file(&self, user: &str) -> PathBuf {
        self.data_dir().join(format!("session.{user}.yaml"))
    }

    pub fn store(&self) -> ConfigurationStore {
        ConfigurationStore::new(self.data_dir().join("configurations.yaml"))
    }

    /// Where the artifacts of one configuration are generated.
    pub fn artifacts(&self, configuration: &str) -> ArtifactLayout {
        ArtifactLayout::new(self.data_dir().join("generated").join(configuration))
    }

    /// Variables every environment can reference.
    pub fn builtins(
        &self,
        configuration: &str,
        environment: &str,
        namespace: Option<&str>,
    ) -> Mapping {
        let mut builtins = Mapping::new();
        let mut set = |key: &str, value: String| {
            builtins.insert(Value::from(key), Value::from(value));
        };
        set("STACKCONF_PROJECT", self.name.clone());
        set("STACKCONF_PROJECT_ROOT", self.root.display().to_string());
        set("STACKCONF_CONFIGURATION", configuration.to_string());
        set("STACKCONF_ENVIRONMENT", environment.to_string());
        set("STACKCONF_NAMESPACE", namespace.unwrap_or_default().to_string());
        builtins
    }
}

/// Resolve starting path, preferring $PWD to preserve symlinks.
fn resolve_start_path(start_path: &Path) -> PathBuf {
    if start_path.is_absolute() {
        start_path.to_owned()
    } else {
        match std::env::var("PWD").ok() {
            Some(pwd) => PathBuf::from(pwd).join(start_path),
            None => std::env::current_dir()
                .unwrap_or_default()
                .join(start_path),
        }
    }
}

/// Paths of the generated artifacts of one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn composefile(&self) -> PathBuf {
        self.root.join("docker-compose.yml")
    }

    pub fn env_file(&self) -> PathBuf {
        self.root.join(".env")
    }

    pub fn manifest(&self) -> PathBuf {
        self.root.join("manifest.yaml")
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join("templates")
    }

    pub fn static_dir(&self) -> PathBuf {
        self.root.join("static")
    }

    /// Remove every generated artifact.
    pub fn clear(&self) -> Result<()> {
        if self.root.exists() {
            std::fs::remove_dir_all(&self.root).map_err(|error| Error::WriteFailed {
                path: self.root.clone(),
                error,
            })?;
        }
        Ok(())
    }
}

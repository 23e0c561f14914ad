// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! stackconf - Namespaced Compose Configuration Generator
//!
//! This crate provides the core library for generating many independently
//! runnable variants of one multi-container application from a single
//! project directory.
//!
//! # Overview
//!
//! A project layers composefile fragments, selects parts of them through
//! schemas, parameterizes them with named environments and finally rewrites
//! service and volume names under a namespace, so several configurations of
//! the same application can run side by side.
//!
//! # Example
//!
//! ```yaml
//! # stackconf.yaml
//! api: stackconf/v0
//! name: shop
//!
//! # Merged in order
//! composefiles:
//!   - docker-compose.yml
//!   - docker-compose.dev.yml
//!
//! schemas: schemas.yaml
//! environments: environments
//! default_environment: default
//! ```

pub mod command;
pub mod composefile;
pub mod configuration;
pub mod environment;
pub mod error;
pub mod extension;
pub mod lock;
pub mod manifest;
pub mod merge;
pub mod namespace;
pub mod pipeline;
pub mod project;
pub mod schema;
pub mod session;
pub mod template;
pub mod variables;
pub mod volume;

pub use command::{CommandRunner, ComposeCommand};
pub use configuration::{current_user, Configuration, ConfigurationStore};
pub use environment::{Environment, EnvironmentFile, EnvironmentSet};
pub use error::{Error, Result};
pub use extension::{Extension, ExtensionContext, ManifestExtensions, SubcommandInfo};
pub use lock::{LockMode, ProjectLock};
pub use manifest::{
    generate_manifest, verify_manifest, GenerationManifest, ManifestChange, ManifestChangeKind,
};
pub use merge::{merge, merge_pair};
pub use namespace::apply_namespace;
pub use pipeline::{apply, generate, GeneratedConfiguration};
pub use project::{ArtifactLayout, Project, ProjectConfig};
pub use schema::{Schema, SchemaSet, Selection, SelectionSet, ALL_SCHEMA};
pub use session::Session;
pub use variables::resolve_variables;
pub use volume::{AliasRule, VolumeKind, VolumeMount};

/// Well-known filename for project files.
pub const PROJECT_FILENAME: &str = "stackconf.yaml";

// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! The configuration pipeline.
//!
//! Composefiles are merged, filtered by the configuration's selection,
//! rendered with its environment, have their volumes resolved and are
//! finally namespaced. Every stage returns a new document.

use std::path::PathBuf;

use serde_yaml::{Mapping, Value};

use crate::composefile::{apply_selection, load_composefiles, section_keys, SERVICES};
use crate::configuration::Configuration;
use crate::environment::{write_export, Environment};
use crate::error::write_file;
use crate::manifest::generate_manifest;
use crate::merge::merge;
use crate::namespace::apply_namespace;
use crate::project::{ArtifactLayout, Project};
use crate::schema::Selection;
use crate::template::{render_document, TemplateRenderer};
use crate::volume::VolumeResolver;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./pipeline_test.rs"]
mod pipeline_test;

/// Run every stage over already loaded composefiles.
pub fn apply(
    composefiles: &[Value],
    selection: &Selection,
    environment: &Environment,
    namespace: Option<&str>,
    volumes: &VolumeResolver,
) -> Result<Value> {
    let merged = merge(composefiles).unwrap_or_else(|| Value::Mapping(Mapping::new()));
    tracing::debug!("merged {} composefiles", composefiles.len());

    let filtered = apply_selection(&merged, selection);
    tracing::debug!("selected services: {:?}", section_keys(&filtered, SERVICES));

    let rendered = render_document(&filtered, &environment.variables)?;
    let resolved = volumes.resolve(&rendered, &environment.variables)?;
    Ok(apply_namespace(&resolved, namespace, &environment.name))
}

/// Load the environment of `configuration`, with the project builtins.
pub fn load_environment(project: &Project, configuration: &Configuration) -> Result<Environment> {
    let builtins = project.builtins(
        &configuration.name,
        &configuration.environment,
        configuration.namespace.as_deref(),
    );
    project
        .environments()
        .load(&configuration.environment, &builtins)
}

/// Every file a configuration is generated from.
pub fn input_files(project: &Project, environment: &Environment) -> Vec<PathBuf> {
    let mut files = project.composefiles();
    files.push(project.schema_file());
    files.extend(environment.source_files.iter().cloned());
    files
}

/// The outcome of [`generate`].
#[derive(Debug, Clone)]
pub struct GeneratedConfiguration {
    pub layout: ArtifactLayout,
    pub document: Value,
    pub environment: Environment,
}

/// Run the pipeline for `configuration` and write its artifacts.
pub fn generate(project: &Project, configuration: &Configuration) -> Result<GeneratedConfiguration> {
    let layout = project.artifacts(&configuration.name);
    let environment = load_environment(project, configuration)?;
    let selection = configuration.resolve_selection(&project.schemas()?)?;
    let documents = load_composefiles(&project.composefiles())?;

    let volumes = VolumeResolver {
        templates: TemplateRenderer::new(project.root(), layout.templates_dir()),
        files_root: project.files_root(),
        static_root: layout.static_dir(),
        shared_root: project.shared_root(),
        env_file: layout.env_file(),
        namespace: configuration.namespace.clone(),
        alias_rule: project.config().alias_rule,
    };
    let document = apply(
        &documents,
        &selection,
        &environment,
        configuration.namespace.as_deref(),
        &volumes,
    )?;

    write_export(&layout.env_file(), &environment.variables)?;
    let yaml = serde_yaml::to_string(&document)
        .map_err(|e| Error::ValidationFailed(format!("cannot serialize composefile: {e}")))?;
    write_file(&layout.composefile(), yaml)?;

    let manifest = generate_manifest(&configuration.name, &input_files(project, &environment))?;
    manifest.save(layout.manifest())?;

    tracing::info!(
        "generated configuration {} at {:?}",
        configuration.name,
        layout.composefile()
    );
    Ok(GeneratedConfiguration {
        layout,
        document,
        environment,
    })
}

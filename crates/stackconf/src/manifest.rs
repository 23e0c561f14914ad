// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Record of the inputs a configuration was generated from.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{load_yaml, write_file};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./manifest_test.rs"]
mod manifest_test;

/// Manifest API version.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ManifestApiVersion {
    #[default]
    #[serde(rename = "stackconf/v0/manifest")]
    V0,
}

/// Written next to every generated composefile.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct GenerationManifest {
    pub api: ManifestApiVersion,
    pub configuration: String,
    pub generated: GenerationMetadata,
    pub sources: Vec<SourceFile>,
}

/// Metadata about when and where the configuration was generated.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct GenerationMetadata {
    pub timestamp: DateTime<Utc>,
    pub stackconf_version: String,
    pub hostname: String,
    pub user: String,
}

/// Input file tracked by the manifest.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub sha256: String,
    pub mtime: DateTime<Utc>,
}

impl SourceFile {
    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read(path).map_err(|error| Error::ReadFailed {
            path: path.to_path_buf(),
            error,
        })?;
        let mtime = std::fs::metadata(path)
            .ok()
            .and_then(|metadata| metadata.modified().ok())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(Utc::now);
        Ok(Self {
            path: path.to_path_buf(),
            sha256: digest(&content),
            mtime,
        })
    }
}

fn digest(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

impl GenerationManifest {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_yaml(path.as_ref())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| Error::ValidationFailed(format!("cannot serialize manifest: {e}")))?;
        write_file(path.as_ref(), yaml)
    }
}

/// Hash the existing `sources` of a configuration. Missing files are skipped.
pub fn generate_manifest(configuration: &str, sources: &[PathBuf]) -> Result<GenerationManifest> {
    let mut files = Vec::new();
    for path in sources {
        if path.is_file() {
            files.push(SourceFile::read(path)?);
        }
    }

    Ok(GenerationManifest {
        api: ManifestApiVersion::V0,
        configuration: configuration.to_string(),
        generated: GenerationMetadata {
            timestamp: Utc::now(),
            stackconf_version: env!("CARGO_PKG_VERSION").to_string(),
            hostname: hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "unknown".to_string()),
            user: whoami::username(),
        },
        sources: files,
    })
}

/// Compare a manifest against the current inputs of its configuration.
pub fn verify_manifest(
    manifest: &GenerationManifest,
    sources: &[PathBuf],
) -> Result<Vec<ManifestChange>> {
    let mut changes = Vec::new();

    for source in &manifest.sources {
        if !source.path.is_file() {
            changes.push(ManifestChange {
                kind: ManifestChangeKind::SourceFileRemoved,
                path: source.path.clone(),
                expected: Some(source.sha256.clone()),
                actual: None,
            });
            continue;
        }
        let current = SourceFile::read(&source.path)?;
        if current.sha256 != source.sha256 {
            changes.push(ManifestChange {
                kind: ManifestChangeKind::SourceFileChanged,
                path: source.path.clone(),
                expected: Some(source.sha256.clone()),
                actual: Some(current.sha256),
            });
        }
    }

    for path in sources {
        let tracked = manifest.sources.iter().any(|source| &source.path == path);
        if !tracked && path.is_file() {
            changes.push(ManifestChange {
                kind: ManifestChangeKind::SourceFileAdded,
                path: path.clone(),
                expected: None,
                actual: Some(SourceFile::read(path)?.sha256),
            });
        }
    }

    Ok(changes)
}

/// A single difference between a manifest and the current inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestChange {
    pub kind: ManifestChangeKind,
    pub path: PathBuf,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

/// Types of manifest mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestChangeKind {
    SourceFileChanged,
    SourceFileAdded,
    SourceFileRemoved,
}

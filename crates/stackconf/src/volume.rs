// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Volume mount parsing and resolution of structured volume declarations.
//!
//! A service may declare its volumes either as a plain list of
//! `host:container[:mode]` entries, or grouped by how the host side is
//! produced:
//!
//! ```yaml
//! services:
//!   web:
//!     volumes:
//!       templates: ["./conf/nginx.conf.j2:/etc/nginx/nginx.conf:ro"]
//!       static: ["html:/usr/share/nginx/html"]
//!       shared: ["certs:/etc/certs:ro"]
//!       standard: ["webdata:/data"]
//! ```
//!
//! Resolution replaces the grouped form with a single flat list.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::composefile::SERVICES;
use crate::template::TemplateRenderer;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./volume_test.rs"]
mod volume_test;

/// Mode applied when an entry does not name one.
pub const DEFAULT_MODE: &str = "rw";

/// How the host side of a mount is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeKind {
    /// A volume-store name such as `pgdata`.
    Named,
    /// A path relative to the project, such as `./conf`.
    Relative,
    /// A filesystem-absolute path such as `/srv/data` or `C:\data`.
    Absolute,
}

/// Classify the host side of a mount.
pub fn classify(host: &str) -> VolumeKind {
    if host.starts_with('/') || drive_prefix(host).is_some() {
        VolumeKind::Absolute
    } else if host.contains('/') || host.contains('\\') || host.starts_with('.') || host.starts_with('~') {
        VolumeKind::Relative
    } else {
        VolumeKind::Named
    }
}

/// Length of a Windows drive prefix like `C:\` or `d:/`, without the separator.
fn drive_prefix(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    match bytes {
        [letter, b':', b'\\' | b'/', ..] if letter.is_ascii_alphabetic() => Some(2),
        _ => None,
    }
}

/// Split into two or three non-empty segments, defaulting the mode.
fn split_segments(s: &str) -> Option<(&str, &str, &str)> {
    let parts: Vec<&str> = s.split(':').collect();
    let segments = match parts.as_slice() {
        [host, container] => (*host, *container, DEFAULT_MODE),
        [host, container, mode] => (*host, *container, *mode),
        _ => return None,
    };
    let (host, container, mode) = segments;
    (!host.is_empty() && !container.is_empty() && !mode.is_empty()).then_some(segments)
}

/// One `host:container:mode` mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    host: String,
    container: String,
    mode: String,
    kind: VolumeKind,
}

impl VolumeMount {
    pub fn new<H, C, M>(host: H, container: C, mode: M) -> Self
    where
        H: Into<String>,
        C: Into<String>,
        M: Into<String>,
    {
        let host = host.into();
        Self {
            kind: classify(&host),
            host,
            container: container.into(),
            mode: mode.into(),
        }
    }

    /// Parse `host:container` or `host:container:mode`.
    ///
    /// A leading drive such as `C:\` belongs to the host path when the rest
    /// still splits into a mount with an absolute container path, so `a:/data`
    /// stays the named volume `a`.
    pub fn parse(entry: &str) -> Result<Self> {
        let on_drive = drive_prefix(entry).and_then(|drive| {
            let (host, container, mode) = split_segments(&entry[drive..])?;
            container
                .starts_with('/')
                .then(|| (&entry[..drive + host.len()], container, mode))
        });
        let (host, container, mode) = on_drive
            .or_else(|| split_segments(entry))
            .ok_or_else(|| Error::MalformedVolume(entry.to_string()))?;
        Ok(Self::new(host, container, mode))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn kind(&self) -> VolumeKind {
        self.kind
    }

    pub fn is_named(&self) -> bool {
        self.kind == VolumeKind::Named
    }

    /// Point the mount at a new host side, reclassifying it.
    pub fn set_host<H: Into<String>>(&mut self, host: H) {
        self.host = host.into();
        self.kind = classify(&self.host);
    }
}

impl fmt::Display for VolumeMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.host, self.container, self.mode)
    }
}

impl FromStr for VolumeMount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// The grouped volume form of a service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VolumeBuckets {
    /// Host side is a template file, rendered per configuration.
    #[serde(default)]
    pub templates: Vec<String>,
    /// Host side is copied from the project's files root per configuration.
    #[serde(default, rename = "static")]
    pub static_files: Vec<String>,
    /// Host side is mounted straight from the project's shared root.
    #[serde(default)]
    pub shared: Vec<String>,
    /// Complete entries passed through as written.
    #[serde(default)]
    pub standard: Vec<String>,
}

/// A service's `volumes` value.
#[derive(Debug, Clone, PartialEq)]
pub enum VolumeDeclaration {
    /// Already a flat list; entries may be strings or long-syntax mappings.
    Standard(Vec<Value>),
    /// The grouped form.
    Structured(VolumeBuckets),
}

impl VolumeDeclaration {
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Sequence(entries) => Ok(Self::Standard(entries.clone())),
            Value::Mapping(_) => serde_yaml::from_value(value.clone())
                .map(Self::Structured)
                .map_err(|e| Error::ValidationFailed(format!("invalid grouped volumes: {e}"))),
            Value::Null => Ok(Self::Standard(Vec::new())),
            other => Err(Error::MalformedVolume(crate::variables::text(other))),
        }
    }
}

/// How network aliases are rewritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasRule {
    /// `{namespace}_{alias}`; aliases are kept as they are without a namespace.
    #[default]
    Prefix,
    /// Slug of `{namespace}-{alias}`, or of the alias alone without a namespace.
    Slugify,
}

impl AliasRule {
    pub fn apply(self, namespace: Option<&str>, alias: &str) -> String {
        match (self, namespace) {
            (Self::Prefix, Some(namespace)) => format!("{namespace}_{alias}"),
            (Self::Prefix, None) => alias.to_string(),
            (Self::Slugify, Some(namespace)) => slugify(&format!("{namespace}-{alias}")),
            (Self::Slugify, None) => slugify(alias),
        }
    }
}

/// Lowercase, with every run of other characters collapsed to one `-`.
pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Resolves grouped volumes and per-service defaults for one configuration.
#[derive(Debug, Clone)]
pub struct VolumeResolver {
    /// Renders `templates` entries.
    pub templates: TemplateRenderer,
    /// Source root of `static` entries.
    pub files_root: PathBuf,
    /// Per-configuration copy destination of `static` entries.
    pub static_root: PathBuf,
    /// Root of `shared` entries.
    pub shared_root: PathBuf,
    /// Generated env-file injected into services without one.
    pub env_file: PathBuf,
    pub namespace: Option<String>,
    pub alias_rule: AliasRule,
}

impl VolumeResolver {
    /// Resolve every service of `document`.
    ///
    /// The static destination root is cleared before any service is processed.
    pub fn resolve(&self, document: &Value, variables: &Mapping) -> Result<Value> {
        reset_dir(&self.static_root)?;

        let mut resolved = document.clone();
        let Some(services) = resolved.get_mut(SERVICES).and_then(Value::as_mapping_mut) else {
            return Ok(resolved);
        };
        for (name, service) in services.iter_mut() {
            let Some(service) = service.as_mapping_mut() else {
                continue;
            };
            tracing::debug!("resolving volumes of service {}", crate::variables::text(name));
            self.resolve_service(service, variables)?;
        }
        Ok(resolved)
    }

    fn resolve_service(&self, service: &mut Mapping, variables: &Mapping) -> Result<()> {
        if let Some(value) = service.get("volumes") {
            if let VolumeDeclaration::Structured(buckets) = VolumeDeclaration::from_value(value)? {
                let flat = self.flatten(&buckets, variables)?;
                service.insert("volumes".into(), Value::Sequence(flat));
            }
        }

        if !service.contains_key("env_file") {
            service.insert(
                "env_file".into(),
                Value::Sequence(vec![self.env_file.display().to_string().into()]),
            );
        }

        self.rewrite_aliases(service);

        if let Some(tag) = service.remove("tag") {
            if !service.contains_key("image") {
                service.insert("image".into(), tag);
            }
        }

        let empty_ports = service
            .get("ports")
            .and_then(Value::as_sequence)
            .is_some_and(Vec::is_empty);
        if empty_ports {
            service.remove("ports");
        }
        Ok(())
    }

    fn flatten(&self, buckets: &VolumeBuckets, variables: &Mapping) -> Result<Vec<Value>> {
        let mut flat = Vec::new();

        for entry in &buckets.templates {
            let mut mount = VolumeMount::parse(entry)?;
            let rendered = self.templates.render_file(Path::new(mount.host()), variables)?;
            mount.set_host(rendered.display().to_string());
            flat.push(mount.to_string().into());
        }

        for entry in &buckets.static_files {
            let mut mount = VolumeMount::parse(entry)?;
            let relative = relative_components(Path::new(mount.host()));
            let source = self.files_root.join(&relative);
            if !source.exists() {
                return Err(Error::MissingStaticContent(source));
            }
            let destination = self.static_root.join(&relative);
            copy_tree(&source, &destination)?;
            mount.set_host(destination.display().to_string());
            flat.push(mount.to_string().into());
        }

        for entry in &buckets.shared {
            let mut mount = VolumeMount::parse(entry)?;
            let host = self.shared_root.join(relative_components(Path::new(mount.host())));
            mount.set_host(host.display().to_string());
            flat.push(mount.to_string().into());
        }

        for entry in &buckets.standard {
            VolumeMount::parse(entry)?;
            flat.push(entry.as_str().into());
        }

        Ok(flat)
    }

    fn rewrite_aliases(&self, service: &mut Mapping) {
        let Some(networks) = service.get_mut("networks").and_then(Value::as_mapping_mut) else {
            return;
        };
        for network in networks.values_mut() {
            let aliases = network
                .get_mut("aliases")
                .and_then(Value::as_sequence_mut);
            for alias in aliases.into_iter().flatten() {
                if let Some(name) = alias.as_str() {
                    *alias = self.alias_rule.apply(self.namespace.as_deref(), name).into();
                }
            }
        }
    }
}

/// The normal components of `path`, dropping `.`, `..` and roots.
pub(crate) fn relative_components(path: &Path) -> PathBuf {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

/// Remove and recreate a directory.
fn reset_dir(dir: &Path) -> Result<()> {
    let wrap = |error: std::io::Error| Error::WriteFailed {
        path: dir.to_path_buf(),
        error,
    };
    if dir.exists() {
        std::fs::remove_dir_all(dir).map_err(wrap)?;
    }
    std::fs::create_dir_all(dir).map_err(wrap)
}

/// Copy a file, or a directory tree, to `destination`.
pub fn copy_tree(source: &Path, destination: &Path) -> Result<()> {
    for entry in walkdir::WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry.path().strip_prefix(source).unwrap_or(Path::new(""));
        let target = if relative.as_os_str().is_empty() {
            destination.to_path_buf()
        } else {
            destination.join(relative)
        };
        let wrap = |error: std::io::Error| Error::WriteFailed {
            path: target.clone(),
            error,
        };

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(wrap)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(wrap)?;
        }
        std::fs::copy(entry.path(), &target).map_err(wrap)?;
    }
    Ok(())
}

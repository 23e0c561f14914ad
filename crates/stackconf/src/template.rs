// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

//! Template rendering of composefiles and template volume files.
//!
//! Templates use tera syntax (`{{ NAME }}`, `{% if DEBUG %}`) over the flat
//! variables of the resolved environment. Names that the environment does
//! not define render as empty strings, unless they go through a `default`
//! filter or an `is defined` test, which then see them as undefined.
//!
//! Composefiles are rendered as YAML text. A value that turns into YAML syntax
//! once substituted, such as `a: b` inside an unquoted scalar, makes the
//! rendered document unparseable; the error names the variables involved.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use tera::{Context, Tera};

use crate::error::{read_file, write_file};
use crate::volume::relative_components;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./template_test.rs"]
mod template_test;

/// Suffixes that mark a file as a template. The suffix is dropped on output.
pub const TEMPLATE_SUFFIXES: &[&str] = &[".jinja", ".j2", ".tera"];

static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{\{(.*?)\}\}|\{%(.*?)%\}").expect("tag pattern is valid"));

static IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("identifier pattern is valid"));

/// A name piped into `default` or tested with `is [not] defined`/`undefined`.
static GUARDED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([A-Za-z_][A-Za-z0-9_]*)\s*(?:\|\s*default\b|is\s+(?:not\s+)?(?:un)?defined\b)",
    )
    .expect("guarded pattern is valid")
});

/// Characters that cannot start a plain YAML scalar.
const YAML_INDICATORS: [char; 16] = [
    '-', '?', '[', ']', '{', '}', '&', '*', '!', '|', '>', '%', '@', '`', '\'', '"',
];

/// Words with a meaning of their own inside tags.
const RESERVED: &[&str] = &[
    "and", "as", "block", "break", "continue", "default", "defined", "elif", "else", "endblock",
    "endfilter", "endfor",
    "endif", "endmacro", "endraw", "extends", "false", "False", "filter", "for", "if", "import",
    "in", "include", "is", "loop", "macro", "not", "or", "raw", "self", "set", "set_global",
    "super", "true", "True", "undefined",
];

/// Render template text with `variables`.
pub fn render_str(name: &str, source: &str, variables: &Mapping) -> Result<String> {
    let wrap = |error: tera::Error| Error::Template {
        name: name.to_string(),
        error,
    };
    let context = build_context(source, variables).map_err(wrap)?;
    Tera::one_off(source, &context, false).map_err(wrap)
}

/// Render a document through its YAML text and parse the result.
pub fn render_document(document: &Value, variables: &Mapping) -> Result<Value> {
    let yaml = serde_yaml::to_string(document)
        .map_err(|e| Error::ValidationFailed(format!("cannot serialize composefile: {e}")))?;
    let rendered = render_str("composefile", &yaml, variables)?;
    serde_yaml::from_str(&rendered).map_err(|error| {
        let suspects = yaml_breaking_names(&yaml, variables);
        let help = (!suspects.is_empty()).then(|| {
            format!(
                "These variables hold YAML syntax once substituted: {}",
                suspects.join(", ")
            )
        });
        Error::InvalidRenderedComposefile {
            error,
            help,
            yaml_content: rendered.clone(),
        }
    })
}

/// Referenced names whose values read as YAML structure inside a plain scalar.
fn yaml_breaking_names(source: &str, variables: &Mapping) -> Vec<String> {
    let mut names = Vec::new();
    for name in referenced_names(source) {
        if names.iter().any(|n| n == name) {
            continue;
        }
        let Some(value) = variables.get(name) else { continue };
        let text = crate::variables::text(value);
        let breaks = text.contains(": ")
            || text.contains(" #")
            || text.contains('\n')
            || text.ends_with(':')
            || text.starts_with(YAML_INDICATORS);
        if breaks {
            names.push(name.to_string());
        }
    }
    names
}

/// Renders template files into a destination tree.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    /// Relative template paths are resolved against this directory.
    base_dir: PathBuf,
    /// Rendered files land under this directory.
    destination_root: PathBuf,
}

impl TemplateRenderer {
    pub fn new<B: Into<PathBuf>, D: Into<PathBuf>>(base_dir: B, destination_root: D) -> Self {
        Self {
            base_dir: base_dir.into(),
            destination_root: destination_root.into(),
        }
    }

    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    /// Render one template file and return the path of the rendered output.
    ///
    /// The output keeps the template's path relative to the base directory,
    /// minus the template suffix.
    pub fn render_file(&self, source: &Path, variables: &Mapping) -> Result<PathBuf> {
        let relative = self.relative_output(source)?;
        let absolute = if source.is_absolute() {
            source.to_path_buf()
        } else {
            self.base_dir.join(source)
        };
        if !absolute.is_file() {
            return Err(Error::MissingTemplate(absolute));
        }

        let text = read_file(&absolute)?;
        let rendered = render_str(&source.display().to_string(), &text, variables)?;

        let output = self.destination_root.join(relative);
        write_file(&output, rendered)?;
        tracing::debug!("rendered template {absolute:?} to {output:?}");
        Ok(output)
    }

    fn relative_output(&self, source: &Path) -> Result<PathBuf> {
        let file_name = source
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::MalformedTemplate(source.to_path_buf()))?;
        let stem = TEMPLATE_SUFFIXES
            .iter()
            .find_map(|suffix| file_name.strip_suffix(suffix))
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| Error::MalformedTemplate(source.to_path_buf()))?;

        let parent = source.parent().unwrap_or(Path::new(""));
        let parent = parent.strip_prefix(&self.base_dir).unwrap_or(parent);
        let mut relative = relative_components(parent);
        relative.push(stem);
        Ok(relative)
    }
}

fn build_context(source: &str, variables: &Mapping) -> tera::Result<Context> {
    let mut context = Context::new();
    let mut defined = HashSet::new();
    for (key, value) in variables {
        if let Some(key) = key.as_str() {
            context.try_insert(key, value)?;
            defined.insert(key.to_string());
        }
    }

    let guarded: HashSet<&str> = TAG
        .captures_iter(source)
        .filter_map(|captures| captures.get(1).or_else(|| captures.get(2)))
        .flat_map(|body| GUARDED.captures_iter(body.as_str()))
        .filter_map(|captures| captures.get(1).map(|m| m.as_str()))
        .collect();
    for name in referenced_names(source) {
        if !guarded.contains(name) && defined.insert(name.to_string()) {
            context.insert(name, "");
        }
    }
    Ok(context)
}

/// Identifiers used inside the tags of `source`, in order of appearance.
fn referenced_names(source: &str) -> Vec<&str> {
    TAG.captures_iter(source)
        .filter_map(|captures| captures.get(1).or_else(|| captures.get(2)))
        .flat_map(|body| IDENT.find_iter(body.as_str()).map(|m| m.as_str()))
        .filter(|name| !RESERVED.contains(name))
        .collect()
}

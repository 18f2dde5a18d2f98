//! Template loader: maps identifiers like `pages/tickets` to files under the
//! template root and parses them.
//!
//! Sources are read from disk on every call; nothing is cached.

use crate::error::{Result, TemplateError};
use std::fs;
use std::path::{Path, PathBuf};
use ticketflow_syntax::Template;

/// Extension used when none is configured.
pub const DEFAULT_EXTENSION: &str = "twig";

/// Template loader rooted at one directory with a fixed file extension
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    root: PathBuf,
    extension: String,
}

impl TemplateLoader {
    /// Create a loader for `root` using [`DEFAULT_EXTENSION`]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_extension(root, DEFAULT_EXTENSION)
    }

    pub fn with_extension(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// File path for a template identifier, or `None` if the identifier
    /// would leave the template root.
    ///
    /// The extension is appended unless the identifier already carries it, so
    /// `layouts/base` and `layouts/base.twig` name the same file.
    pub fn resolve_path(&self, name: &str) -> Option<PathBuf> {
        let segments: Vec<&str> = name.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() || !segments.iter().all(|s| is_valid_segment(s)) {
            return None;
        }

        let mut path = self.root.clone();
        for segment in &segments {
            path.push(segment);
        }

        let suffix = format!(".{}", self.extension);
        if !name.ends_with(&suffix) {
            let mut file_name = path.file_name()?.to_os_string();
            file_name.push(&suffix);
            path.set_file_name(file_name);
        }
        Some(path)
    }

    /// Read the raw source of a template. Invalid UTF-8 is replaced rather
    /// than rejected.
    pub fn load_source(&self, name: &str) -> Result<String> {
        let path = self.resolve_path(name);
        match path {
            Some(path) if path.is_file() => {
                tracing::debug!(template = name, path = %path.display(), "loading template");
                let bytes = fs::read(&path)?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            path => Err(TemplateError::TemplateNotFound {
                name: name.to_string(),
                path: path.unwrap_or_else(|| self.root.join(name)),
            }),
        }
    }

    /// Load and parse a template.
    pub fn load(&self, name: &str) -> Result<Template> {
        let source = self.load_source(name)?;
        Ok(ticketflow_syntax::parse(&source))
    }

    /// Load a parent template for inheritance. A missing or unreadable
    /// parent yields `None`.
    pub fn load_parent(&self, name: &str) -> Option<Template> {
        match self.load(name) {
            Ok(template) => Some(template),
            Err(TemplateError::TemplateNotFound { path, .. }) => {
                tracing::debug!(
                    parent = name,
                    path = %path.display(),
                    "parent template not found, rendering child as-is"
                );
                None
            }
            Err(err) => {
                tracing::warn!(parent = name, error = %err, "failed to read parent template");
                None
            }
        }
    }
}

/// Reject segments that could step outside the root.
fn is_valid_segment(segment: &str) -> bool {
    segment != "."
        && segment != ".."
        && !segment.contains('\\')
        && !segment.contains(':')
        && !segment.contains('\0')
}

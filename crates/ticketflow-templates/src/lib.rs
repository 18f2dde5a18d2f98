//! TicketFlow page templates.
//!
//! A small block-based template engine for server-rendered pages:
//! - `{{ name }}`, `{{ ticket.title }}`, `{{ body|raw }}` interpolation with
//!   HTML escaping by default
//! - filters: `lower`, `upper`, `length`, `slice(start, length)`,
//!   `json_encode`, `raw`
//! - `{% if %}` / `{% elseif %}` / `{% else %}` conditionals
//! - `{% for item in collection %}` loops
//! - `{% extends "layout" %}` with `{% block name %}` substitution
//!
//! Rendering fails open. Only a missing top-level template is an error.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use ticketflow_templates::TemplateEngine;
//!
//! let mut engine = TemplateEngine::new("templates");
//! engine.add_global("app_name", "TicketFlow");
//!
//! let html = engine.render_source(
//!     "<h1>{{ app_name }}</h1>{% for t in tickets %}<li>{{ t.title }}</li>{% endfor %}",
//!     json!({"tickets": [{"title": "Printer <offline>"}]}),
//! );
//! assert_eq!(html, "<h1>TicketFlow</h1><li>Printer &lt;offline&gt;</li>");
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod filters;
pub mod html_escape;
pub mod inheritance;
pub mod renderer;
pub mod template_loader;
pub mod value;

pub use config::Config;
pub use context::Globals;
pub use error::{ConfigError, Result, TemplateError};
pub use renderer::Renderer;
pub use template_loader::TemplateLoader;
pub use ticketflow_syntax::{Location, Template};
pub use value::Value;

use chrono::Datelike;
use std::path::PathBuf;

/// Renders page templates from a template root, merging engine-wide globals
/// into every render.
///
/// Globals change only through `&mut self`, so an engine shared behind `&`
/// (or an `Arc`) across request handlers is read-only.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    loader: TemplateLoader,
    globals: Globals,
}

impl TemplateEngine {
    /// Create an engine for `root` with the default `twig` extension and no
    /// globals.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_loader(TemplateLoader::new(root))
    }

    pub fn with_loader(loader: TemplateLoader) -> Self {
        Self {
            loader,
            globals: Globals::new(),
        }
    }

    /// Build an engine from configuration, with the current UTC year.
    pub fn from_config(config: &Config) -> Self {
        let loader = TemplateLoader::with_extension(
            config.templates.root.clone(),
            config.templates.extension.clone(),
        );
        let year = chrono::Utc::now().year();
        Self {
            loader,
            globals: config.globals(year),
        }
    }

    /// Set a global visible to every render unless the call data shadows it.
    pub fn add_global(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.globals.insert(key.into(), value.into());
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    pub fn loader(&self) -> &TemplateLoader {
        &self.loader
    }

    /// Render the template identified by `name` (e.g. `pages/dashboard`).
    ///
    /// # Errors
    ///
    /// [`TemplateError::TemplateNotFound`] when no file exists for `name`.
    pub fn render(&self, name: &str, data: serde_json::Value) -> Result<String> {
        let template = self.loader.load(name)?;
        Ok(self.render_template(template, data))
    }

    /// Render template source directly. `extends` still loads parents from
    /// the template root.
    pub fn render_source(&self, source: &str, data: serde_json::Value) -> String {
        self.render_template(ticketflow_syntax::parse(source), data)
    }

    fn render_template(&self, template: Template, data: serde_json::Value) -> String {
        let template = inheritance::resolve(template, &self.loader);
        Renderer::new(&self.globals).render(&template, Value::from_json(data))
    }
}

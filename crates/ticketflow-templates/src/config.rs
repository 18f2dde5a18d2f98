//! Application configuration loaded once at startup.
//!
//! ```yaml
//! app:
//!   name: TicketFlow
//!   url: http://localhost:8000
//! templates:
//!   root: templates
//!   extension: twig
//! globals:
//!   support_email: help@example.com
//! ```

use crate::context::Globals;
use crate::error::ConfigError;
use crate::template_loader::DEFAULT_EXTENSION;
use crate::value::Value;
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub app: AppConfig,
    pub templates: TemplatesConfig,
    /// Extra globals merged into every render.
    pub globals: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub url: String,
    /// Exposed to templates as the `debug` global.
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "TicketFlow".to_string(),
            url: "http://localhost:8000".to_string(),
            debug: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    pub root: PathBuf,
    pub extension: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("templates"),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl Config {
    /// Load and validate a YAML config file. A relative template root is
    /// taken relative to the config file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&content)?;
        if config.templates.root.is_relative() {
            if let Some(dir) = path.parent() {
                config.templates.root = dir.join(&config.templates.root);
            }
        }
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let extension = &self.templates.extension;
        if extension.is_empty() || extension.contains('.') || extension.contains('/') {
            return Err(ConfigError::Invalid {
                message: format!("template extension must be a bare suffix, got '{extension}'"),
            });
        }
        Ok(())
    }

    /// The globals every page sees: app name, base URL, current year, debug
    /// flag and the signed-out auth flag, then any configured extras.
    pub fn globals(&self, current_year: i32) -> Globals {
        let mut globals = Globals::new();
        globals.insert("app_name".to_string(), Value::from(self.app.name.as_str()));
        globals.insert("base_url".to_string(), Value::from(self.app.url.as_str()));
        globals.insert("current_year".to_string(), Value::from(current_year));
        globals.insert("debug".to_string(), Value::Bool(self.app.debug));
        globals.insert("isAuthenticated".to_string(), Value::Bool(false));
        for (key, value) in &self.globals {
            globals.insert(key.clone(), Value::from_json(value.clone()));
        }
        globals
    }
}

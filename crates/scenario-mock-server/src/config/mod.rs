//! Configuration for the mock server binary.
//!
//! A config file holds optional server options and the scenario table:
//!
//! ```yaml
//! options:
//!   port: 3000
//!   cookieMode: false
//! scenarios:
//!   default:
//!     - url: /api/user
//!       method: GET
//!       response:
//!         data: { name: Alice }
//!   test:
//!     extend: default
//!     context: { age: 30 }
//!     mocks: []
//! ```

mod options;
mod scenarios;

pub use options::{ServerOptions, DEFAULT_COOKIE_NAME};

use crate::error::ConfigError;
use crate::scenario::ScenarioMap;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    options: ServerOptions,
    scenarios: IndexMap<String, scenarios::ScenarioEntry>,
}

/// Format of a config file, picked from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    /// `.json` is JSON, anything else is read as YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Yaml,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub options: ServerOptions,
    pub scenarios: ScenarioMap,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: origin.clone(),
            source,
        })?;
        let config = Self::parse(&contents, ConfigFormat::from_path(path), &origin)?;
        info!(
            "Loaded {} scenarios from {}",
            config.scenarios.len(),
            origin
        );
        Ok(config)
    }

    /// Parse config text; `origin` names the source in error messages
    pub fn parse(contents: &str, format: ConfigFormat, origin: &str) -> Result<Self, ConfigError> {
        let parse_error = |message: String| ConfigError::Parse {
            path: origin.to_string(),
            message,
        };

        let file: ConfigFile = match format {
            ConfigFormat::Yaml => {
                serde_yaml::from_str(contents).map_err(|e| parse_error(e.to_string()))?
            }
            ConfigFormat::Json => {
                serde_json::from_str(contents).map_err(|e| parse_error(e.to_string()))?
            }
        };

        Ok(Self {
            options: file.options,
            scenarios: scenarios::into_scenario_map(file.scenarios).map_err(parse_error)?,
        })
    }
}

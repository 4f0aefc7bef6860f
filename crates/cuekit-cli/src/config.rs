//! Configuration file
//!
//! Settings are loaded from `cuekit.toml` in the working directory:
//!
//! ```toml
//! [load]
//! entry_points = ["config/", "env/prod.cue"]
//!
//! [tags]
//! env = "prod"
//! replicas = 3
//!
//! [export]
//! format = "yaml"
//!
//! [output]
//! json_errors = true
//! ```
//!
//! Command-line flags override the file.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level settings structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub load: LoadSettings,
    /// Values for `@tag` placeholders
    pub tags: BTreeMap<String, toml::Value>,
    pub export: ExportSettings,
    pub output: OutputSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Configured tags as `key=value` strings
    pub fn tag_args(&self) -> Vec<String> {
        self.tags
            .iter()
            .map(|(key, value)| match value {
                toml::Value::String(s) => format!("{}={}", key, s),
                other => format!("{}={}", key, other),
            })
            .collect()
    }
}

/// Which documents `unify` reads when none are given
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoadSettings {
    /// Files or directories, relative to the working directory
    pub entry_points: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Default export format
    pub format: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputSettings {
    /// Print engine errors as JSON instead of `file:line:column: message`
    pub json_errors: bool,
}

/// Load settings from an explicit file, or from `cuekit.toml` if present
pub fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            Settings::from_toml_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))
        }
        None => {
            let candidates = ["cuekit.toml", ".cuekit.toml"];
            for candidate in candidates {
                let path = Path::new(candidate);
                if path.exists() {
                    let content = fs::read_to_string(path)
                        .with_context(|| format!("Failed to read config: {}", candidate))?;
                    return Settings::from_toml_str(&content)
                        .with_context(|| format!("Failed to parse config: {}", candidate));
                }
            }
            Ok(Settings::default())
        }
    }
}

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_classification")]
    pub classification: String,
    #[serde(default = "default_complexity")]
    pub complexity: String,
    #[serde(default = "default_frequency_band")]
    pub frequency_band: String,
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default)]
    pub rest_url: String,
    #[serde(default)]
    pub rest_api_key: String,
}

fn default_theme() -> String {
    "terminal-default".to_string()
}
fn default_mode() -> String {
    "recall".to_string()
}
fn default_classification() -> String {
    "all".to_string()
}
fn default_complexity() -> String {
    "all".to_string()
}
fn default_frequency_band() -> String {
    "all".to_string()
}
fn default_backend() -> String {
    "local".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            mode: default_mode(),
            classification: default_classification(),
            complexity: default_complexity(),
            frequency_band: default_frequency_band(),
            backend: default_backend(),
            rest_url: String::new(),
            rest_api_key: String::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.normalize();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    #[allow(dead_code)]
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hantype")
            .join("config.toml")
    }

    /// Reset unrecognized enum-like keys from stale config files.
    pub fn normalize(&mut self) {
        if !matches!(self.mode.as_str(), "recall" | "copy") {
            self.mode = default_mode();
        }
        if !matches!(self.complexity.as_str(), "all" | "A" | "B" | "C") {
            self.complexity = default_complexity();
        }
        if self.frequency_band != "all" && self.frequency_band.parse::<usize>().is_err() {
            self.frequency_band = default_frequency_band();
        }
        if !matches!(self.backend.as_str(), "local" | "rest") {
            self.backend = default_backend();
        }
    }
}

//! TOML configuration loading for the CLI entry point. The pipeline's own
//! nested config types already derive `Serialize`/`Deserialize`; this module
//! only adds the provider connection settings the library crates never need
//! to know about.

use anyhow::{Context, Result};
use phisdebate_core::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key, never the key
    /// itself — this file is expected to live in version control.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "PHISDEBATE_API_KEY".to_string(),
            timeout_secs: 45,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
}

pub fn load(path: &Path) -> Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading configuration file at {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing configuration file at {}", path.display()))
}

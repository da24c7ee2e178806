use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::aggregate::PAGE_SIZE;

pub const DEFAULT_ENDPOINT: &str = "https://www.clinicaltrials.gov/api/query/full_studies";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
fn default_page_size() -> u64 {
    PAGE_SIZE
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct QueryConfig {
    /// Append `AREA[StudyFirstPostDate]RANGE[begin, end]` to the expression.
    #[serde(default)]
    pub filter_by_post_date: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub full_path_columns: bool,
}

/// Load the config at `path`, falling back to defaults when the file is
/// absent and `required` is false.
pub fn load_config_or_default(path: &Path, required: bool) -> Result<Config> {
    if !required && !path.exists() {
        return Ok(Config::default());
    }
    load_config(path)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.api.page_size == 0 || config.api.page_size > PAGE_SIZE {
        anyhow::bail!("api.page_size must be in [1, {}]", PAGE_SIZE);
    }

    if config.api.timeout_secs == 0 {
        anyhow::bail!("api.timeout_secs must be > 0");
    }

    if !config.api.endpoint.starts_with("http://") && !config.api.endpoint.starts_with("https://") {
        anyhow::bail!(
            "api.endpoint must be an http(s) URL, got '{}'",
            config.api.endpoint
        );
    }

    Ok(config)
}

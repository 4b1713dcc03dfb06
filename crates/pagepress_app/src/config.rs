use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pagepress_core::PolicyConfig;
use pagepress_engine::ServiceConfig;
use press_logging::press_info;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "pagepress.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub policy: PolicyConfig,
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            policy: PolicyConfig::default(),
            output_dir: PathBuf::from("output"),
        }
    }
}

/// Loads the config from `path`, or from `./pagepress.ron` when no path is
/// given. Only an explicitly named file must exist.
pub fn load(path: Option<&Path>) -> Result<AppConfig> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    if !required && !path.exists() {
        press_info!("No config at {:?}, using defaults", path);
        return Ok(AppConfig::default());
    }

    let content =
        fs::read_to_string(&path).with_context(|| format!("failed to read config {path:?}"))?;
    let config = parse(&content).with_context(|| format!("invalid config {path:?}"))?;
    press_info!("Loaded config from {:?}", path);
    Ok(config)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let config: AppConfig = ron::from_str(content)?;
    config.policy.validate()?;
    Ok(config)
}

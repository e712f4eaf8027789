use inkboard_editor::Props;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "inkboard.config.json";

/// Inkboard configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Log filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Pretty-print JSON output and saved documents
    #[serde(default = "default_true")]
    pub pretty: bool,

    /// Style defaults seeded into every session
    #[serde(default)]
    pub styles_for_next_shape: Props,

    /// Check parent chains and children lists when loading documents
    #[serde(default = "default_true")]
    pub validate_on_load: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            pretty: true,
            styles_for_next_shape: Props::new(),
            validate_on_load: true,
        }
    }
}

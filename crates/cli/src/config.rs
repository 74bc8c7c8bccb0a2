//! Configuration file and environment loading.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use github::ApiConfig;
use projects::Settings;
use serde::Deserialize;

/// Used when `--config` is not given and the file exists.
pub const DEFAULT_CONFIG_PATH: &str = ".ghprojects/config.toml";

const TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];
const OTLP_ENDPOINT_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// The contents of the configuration file. Every table is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub settings: Settings,
    pub api: ApiConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Emit log lines as JSON instead of human-readable text.
    pub json_logs: bool,
    /// OTLP collector endpoint; spans are exported only when set.
    pub otlp_endpoint: Option<String>,
}

impl CliConfig {
    /// Loads `explicit` if given (it must exist), otherwise the default path if
    /// present, otherwise the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_PATH)).filter(|p| p.is_file()),
        };
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                Self::parse(&text)
                    .with_context(|| format!("invalid config file {}", path.display()))?
            }
            None => Self::default(),
        };

        if config.telemetry.otlp_endpoint.is_none() {
            config.telemetry.otlp_endpoint = std::env::var(OTLP_ENDPOINT_VAR)
                .ok()
                .filter(|v| !v.is_empty());
        }
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.settings.validate()?;
        Ok(config)
    }
}

/// Reads the API token from the environment. The file never holds it.
pub fn token_from_env() -> Result<String> {
    for var in TOKEN_VARS {
        if let Ok(token) = std::env::var(var) {
            if !token.trim().is_empty() {
                return Ok(token);
            }
        }
    }
    bail!("no API token: set {} or {}", TOKEN_VARS[0], TOKEN_VARS[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = CliConfig::parse("").unwrap();

        assert_eq!(config, CliConfig::default());
        assert_eq!(config.settings.max_page_size, 50);
        assert_eq!(config.settings.item_scan.max_pages, 5);
    }

    #[test]
    fn tables_override_defaults() {
        let config = CliConfig::parse(
            r#"
            [settings]
            field_lookup_page_size = 60

            [settings.item_scan]
            max_pages = 8

            [api]
            rest_base_url = "https://ghe.example.com/api/v3"

            [telemetry]
            json_logs = true
            "#,
        )
        .unwrap();

        assert_eq!(config.settings.field_lookup_page_size, 60);
        assert_eq!(config.settings.item_scan.max_pages, 8);
        assert_eq!(config.settings.item_scan.page_size, 50);
        assert_eq!(config.api.rest_base_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.api.graphql_url, ApiConfig::default().graphql_url);
        assert!(config.telemetry.json_logs);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let err = CliConfig::parse("[settings.item_scan]\npage_size = 80\n").unwrap_err();

        assert!(err.to_string().contains("exceeds max_page_size"));
    }

    #[test]
    fn tokens_in_the_file_are_not_accepted() {
        assert!(CliConfig::parse("token = \"ghp_x\"\n").is_err());
    }
}

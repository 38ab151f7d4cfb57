use std::path::Path;

use serde::Deserialize;

use crate::client::API_ROOT;
use crate::error::{Error, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub groupme: GroupMeConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GroupMeConfig {
    pub access_token: String,
    #[serde(default = "default_api_root")]
    pub api_root: String,
}

fn default_api_root() -> String {
    API_ROOT.to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            Error::Config(format!("failed to read {}: {}", path.display(), err))
        })?;
        toml::from_str(&content)
            .map_err(|err| Error::Config(format!("failed to parse {}: {}", path.display(), err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [groupme]
            access_token = "token-123"
            "#,
        )
        .unwrap();

        assert_eq!(config.groupme.access_token, "token-123");
        assert_eq!(config.groupme.api_root, API_ROOT);
    }

    #[test]
    fn test_api_root_override() {
        let config: Config = toml::from_str(
            r#"
            [groupme]
            access_token = "token-123"
            api_root = "http://localhost:8080/v3"
            "#,
        )
        .unwrap();

        assert_eq!(config.groupme.api_root, "http://localhost:8080/v3");
    }

    #[test]
    fn test_missing_token_is_a_config_error() {
        let parsed: std::result::Result<Config, _> = toml::from_str("[groupme]\n");
        assert!(parsed.is_err());
    }
}

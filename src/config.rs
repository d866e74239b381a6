// Sync configuration
//
// Configuration is loaded from:
// 1. Default values
// 2. Config file (~/.config/themesync/config.toml, or THEMESYNC_CONFIG)
// 3. Environment variables (THEMESYNC_* prefix)
// 4. Command-line flags, applied by the binary
//
// Later sources take precedence. Nothing is validated until
// `Config::validate`, which runs before the engine touches the network.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::api::Credentials;
use crate::error::ConfigError;

/// Environment variable prefix
const ENV_PREFIX: &str = "THEMESYNC";

/// Theme id value that asks for an interactive theme selection
pub const INTERACTIVE_KEYWORD: &str = "ttyl";

/// Raw, unvalidated configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Shop host, e.g. `example.myshopify.com`
    #[serde(default)]
    pub host: Option<String>,

    /// Numeric theme id, or `ttyl` for an interactive choice
    #[serde(default)]
    pub theme_id: Option<String>,

    /// Root directory for asset keys (defaults to the current directory)
    #[serde(default)]
    pub base_path: Option<String>,

    /// Without a theme id, write to the legacy unscoped asset store
    /// instead of passing events through
    #[serde(default)]
    pub legacy_assets: bool,
}

/// Which remote theme the engine writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeTarget {
    /// No theme id configured
    Unscoped,
    /// Pick one from the shop's theme list at startup
    Interactive,
    Id(u64),
}

impl ThemeTarget {
    pub fn parse(raw: Option<&str>) -> Result<Self, ConfigError> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(ThemeTarget::Unscoped),
            Some(raw) => raw,
        };
        if raw == INTERACTIVE_KEYWORD {
            return Ok(ThemeTarget::Interactive);
        }
        if raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = raw.parse() {
                return Ok(ThemeTarget::Id(id));
            }
        }
        Err(ConfigError::InvalidThemeId(raw.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub base_path: Option<String>,
    pub legacy_assets: bool,
}

/// Validated configuration the engine is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub credentials: Credentials,
    pub theme: ThemeTarget,
    pub options: EngineOptions,
}

impl Config {
    /// Load configuration from the default location and environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path. A missing file yields
    /// the defaults; environment overrides still apply.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            Self::parse_toml(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn parse_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Config file location: THEMESYNC_CONFIG, or the platform config dir
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("themesync")
            .join("config.toml")
    }

    fn apply_env_overrides(&mut self) {
        let var = |name: &str| {
            std::env::var(format!("{}_{}", ENV_PREFIX, name))
                .ok()
                .filter(|v| !v.is_empty())
        };

        if let Some(val) = var("API_KEY") {
            self.api_key = Some(val);
        }
        if let Some(val) = var("PASSWORD") {
            self.password = Some(val);
        }
        if let Some(val) = var("HOST") {
            self.host = Some(val);
        }
        if let Some(val) = var("THEME_ID") {
            self.theme_id = Some(val);
        }
        if let Some(val) = var("BASE_PATH") {
            self.base_path = Some(val);
        }
        if let Some(val) = var("LEGACY_ASSETS") {
            self.legacy_assets = val.eq_ignore_ascii_case("true") || val == "1";
        }
    }

    /// Overlay the set values of `other` on top of this config
    pub fn merge(mut self, other: Config) -> Self {
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.password.is_some() {
            self.password = other.password;
        }
        if other.host.is_some() {
            self.host = other.host;
        }
        if other.theme_id.is_some() {
            self.theme_id = other.theme_id;
        }
        if other.base_path.is_some() {
            self.base_path = other.base_path;
        }
        self.legacy_assets |= other.legacy_assets;
        self
    }

    /// Check credentials and the theme id. Fails on the first problem,
    /// in the order api key, password, host, theme id.
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        let present = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from);

        let api_key = present(&self.api_key).ok_or(ConfigError::MissingApiKey)?;
        let password = present(&self.password).ok_or(ConfigError::MissingPassword)?;
        let host = present(&self.host).ok_or(ConfigError::MissingHost)?;
        let theme = ThemeTarget::parse(self.theme_id.as_deref())?;

        Ok(Settings {
            credentials: Credentials {
                api_key,
                password,
                host,
            },
            theme,
            options: EngineOptions {
                base_path: self.base_path.clone(),
                legacy_assets: self.legacy_assets,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn complete() -> Config {
        Config {
            api_key: Some("key".to_string()),
            password: Some("secret".to_string()),
            host: Some("example.myshopify.com".to_string()),
            theme_id: Some("123456".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_theme_target_parse() {
        assert_eq!(ThemeTarget::parse(None).unwrap(), ThemeTarget::Unscoped);
        assert_eq!(ThemeTarget::parse(Some("  ")).unwrap(), ThemeTarget::Unscoped);
        assert_eq!(ThemeTarget::parse(Some("ttyl")).unwrap(), ThemeTarget::Interactive);
        assert_eq!(ThemeTarget::parse(Some("123456")).unwrap(), ThemeTarget::Id(123456));
    }

    #[test]
    fn test_theme_target_rejects_non_numeric() {
        assert_eq!(
            ThemeTarget::parse(Some("abc")),
            Err(ConfigError::InvalidThemeId("abc".to_string()))
        );
        assert!(ThemeTarget::parse(Some("-1")).is_err());
        assert!(ThemeTarget::parse(Some("12.5")).is_err());
    }

    #[test]
    fn test_validate_complete_config() {
        let settings = complete().validate().unwrap();
        assert_eq!(settings.credentials.auth(), "key:secret");
        assert_eq!(settings.theme, ThemeTarget::Id(123456));
        assert_eq!(settings.options, EngineOptions::default());
    }

    #[test]
    fn test_validate_missing_fields() {
        let config = Config {
            api_key: None,
            ..complete()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingApiKey));

        let config = Config {
            password: Some(String::new()),
            ..complete()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingPassword));

        let config = Config {
            host: None,
            ..complete()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingHost));
    }

    #[test]
    fn test_validate_invalid_theme_id() {
        let config = Config {
            theme_id: Some("abc".to_string()),
            ..complete()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidThemeId("abc".to_string()))
        );
    }

    #[test]
    fn test_parse_toml() {
        let config = Config::parse_toml(
            r#"
api_key = "key"
password = "secret"
host = "example.myshopify.com"
theme_id = "ttyl"
legacy_assets = true
"#,
        )
        .unwrap();
        assert_eq!(config.host.as_deref(), Some("example.myshopify.com"));
        assert_eq!(config.theme_id.as_deref(), Some("ttyl"));
        assert!(config.legacy_assets);
        assert!(config.base_path.is_none());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_path(&dir.path().join("absent.toml")).unwrap();
        // Environment may set values; the file itself contributes nothing
        assert!(!config.legacy_assets || std::env::var("THEMESYNC_LEGACY_ASSETS").is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "base_path = \"theme\"").unwrap();
        let config = Config::load_from_path(file.path()).unwrap();
        if std::env::var("THEMESYNC_BASE_PATH").is_err() {
            assert_eq!(config.base_path.as_deref(), Some("theme"));
        }
    }

    #[test]
    fn test_merge_prefers_set_values() {
        let flags = Config {
            theme_id: Some("42".to_string()),
            ..Config::default()
        };
        let merged = complete().merge(flags);
        assert_eq!(merged.theme_id.as_deref(), Some("42"));
        assert_eq!(merged.api_key.as_deref(), Some("key"));
    }
}

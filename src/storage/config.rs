use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::encoding::DEFAULT_CHARSET;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub encoding: EncodingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// General configuration settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Open the web share URL when the app is not installed
    #[serde(default)]
    pub allow_fallback: bool,
}

/// The receiving application and its URI prefixes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Identifier looked up in the installed-application registry
    #[serde(default = "default_app_id")]
    pub app_id: String,

    /// Deep-link prefix used when the app is present
    #[serde(default = "default_app_prefix")]
    pub app_prefix: String,

    /// Web prefix used when the app is absent and fallback is on
    #[serde(default = "default_web_prefix")]
    pub web_prefix: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        TargetConfig {
            app_id: default_app_id(),
            app_prefix: default_app_prefix(),
            web_prefix: default_web_prefix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingConfig {
    /// Charset payloads are re-encoded through
    #[serde(default = "default_charset")]
    pub charset: String,

    /// Percent-encode reserved and non-ASCII characters
    #[serde(default)]
    pub percent_encode: bool,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        EncodingConfig {
            charset: default_charset(),
            percent_encode: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding bundled assets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets_dir: Option<PathBuf>,

    /// Writable directory staged assets are copied into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Command used to open share URIs
    #[serde(default = "default_open_command")]
    pub open_command: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        PlatformConfig {
            open_command: default_open_command(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write logs to a rolling file instead of stderr
    #[serde(default)]
    pub file: bool,

    #[serde(default = "default_file_level")]
    pub file_level: String,

    /// Minimum level also echoed to stderr when file logging is on
    #[serde(default = "default_echo_level")]
    pub echo_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            file: false,
            file_level: default_file_level(),
            echo_level: default_echo_level(),
        }
    }
}

// Default value functions for serde
fn default_app_id() -> String {
    "jp.naver.line.android".to_string()
}

fn default_app_prefix() -> String {
    "line://msg".to_string()
}

fn default_web_prefix() -> String {
    "https://line.naver.jp/msg".to_string()
}

fn default_charset() -> String {
    DEFAULT_CHARSET.to_string()
}

fn default_open_command() -> String {
    "xdg-open".to_string()
}

fn default_file_level() -> String {
    "info".to_string()
}

fn default_echo_level() -> String {
    "warn".to_string()
}

/// Trait for configuration storage
pub trait ConfigStorage {
    /// Load configuration from file
    fn load(&self) -> Result<Config>;

    /// Get the config file path
    fn path(&self) -> &PathBuf;

    /// Create default configuration file if it doesn't exist
    fn create_default(&self) -> Result<()>;
}

/// TOML-based implementation of ConfigStorage
pub struct TomlConfigStorage {
    path: PathBuf,
}

impl TomlConfigStorage {
    pub fn new(path: PathBuf) -> Self {
        TomlConfigStorage { path }
    }
}

impl ConfigStorage for TomlConfigStorage {
    fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            log::info!(
                "Config file not found at {:?}, creating default configuration",
                self.path
            );
            self.create_default()?;
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config from {:?}", self.path))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", self.path))?;

        log::info!("Loaded configuration from {:?}", self.path);
        log::debug!(
            "Config: app_id={}, allow_fallback={}, percent_encode={}",
            config.target.app_id,
            config.general.allow_fallback,
            config.encoding.percent_encode
        );

        Ok(config)
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }

    fn create_default(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        // Use the example config compiled into the binary
        let example_config = include_str!("../../lineposter.toml.example");

        fs::write(&self.path, example_config)
            .with_context(|| format!("Failed to create default config at {:?}", self.path))?;

        log::info!("Created default configuration at {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert!(!config.general.allow_fallback);
        assert_eq!(config.target.app_id, "jp.naver.line.android");
        assert_eq!(config.target.app_prefix, "line://msg");
        assert_eq!(config.target.web_prefix, "https://line.naver.jp/msg");
        assert_eq!(config.encoding.charset, "UTF-8");
        assert!(!config.encoding.percent_encode);
        assert_eq!(config.platform.open_command, "xdg-open");
        assert!(!config.logging.file);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let toml_str = r#"
        [general]
        allow_fallback = true

        [storage]
        assets_dir = "/usr/share/myapp/assets"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.general.allow_fallback);
        assert_eq!(
            config.storage.assets_dir,
            Some(PathBuf::from("/usr/share/myapp/assets"))
        );
        assert_eq!(config.storage.files_dir, None);
        assert_eq!(config.target, TargetConfig::default());
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let example: Config =
            toml::from_str(include_str!("../../lineposter.toml.example")).unwrap();
        assert_eq!(example, Config::default());
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = TomlConfigStorage::new(dir.path().join("lineposter.toml"));

        let config = storage.load().unwrap();
        assert_eq!(config, Config::default());
        assert!(storage.path().exists());
    }

    #[test]
    fn test_load_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lineposter.toml");
        fs::write(
            &path,
            "[general]\nallow_fallback = true\n\n[encoding]\npercent_encode = true\n\n[storage]\nfiles_dir = \"/tmp/lineposter-files\"\n",
        )
        .unwrap();

        let config = TomlConfigStorage::new(path).load().unwrap();
        assert!(config.general.allow_fallback);
        assert!(config.encoding.percent_encode);
        assert_eq!(
            config.storage.files_dir,
            Some(PathBuf::from("/tmp/lineposter-files"))
        );
        assert_eq!(config.target, TargetConfig::default());
    }

    #[test]
    fn test_invalid_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lineposter.toml");
        fs::write(&path, "[general]\nallow_fallback = \"maybe\"\n").unwrap();

        assert!(TomlConfigStorage::new(path).load().is_err());
    }
}

pub mod assets;
pub mod config;

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub use assets::{
    AssetCopyFailed, AssetHandle, AssetSource, AssetStager, DirAssetSource, MemoryAssetSource,
    destination_name,
};
pub use config::{
    Config, ConfigStorage, EncodingConfig, GeneralConfig, LoggingConfig, PlatformConfig,
    StorageConfig, TargetConfig, TomlConfigStorage,
};

/// Per-user directories used by the CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    /// $XDG_DATA_HOME/lineposter (default: ~/.local/share/lineposter)
    pub data: PathBuf,
    /// $XDG_CONFIG_HOME/lineposter (default: ~/.config/lineposter)
    pub config: PathBuf,
}

impl AppDirs {
    /// Resolve directories from a home directory and optional XDG overrides
    /// Empty overrides are ignored, as the XDG base directory rules require
    pub fn resolve(home: &Path, xdg_data: Option<&str>, xdg_config: Option<&str>) -> Self {
        let base = |var: Option<&str>, fallback: &str| match var.filter(|v| !v.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => home.join(fallback),
        };
        AppDirs {
            data: base(xdg_data, ".local/share").join("lineposter"),
            config: base(xdg_config, ".config").join("lineposter"),
        }
    }

    /// Resolve from the environment and create both directories
    pub fn ensure() -> Result<Self> {
        let home = env::var("HOME").context("HOME environment variable not set")?;
        let dirs = AppDirs::resolve(
            Path::new(&home),
            env::var("XDG_DATA_HOME").ok().as_deref(),
            env::var("XDG_CONFIG_HOME").ok().as_deref(),
        );

        for dir in [&dirs.data, &dirs.config] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {:?}", dir))?;
        }
        log::debug!("Data directory: {:?}, config directory: {:?}", dirs.data, dirs.config);

        Ok(dirs)
    }

    /// Default location of the config file
    pub fn config_file(&self) -> PathBuf {
        self.config.join("lineposter.toml")
    }

    /// Default writable directory for staged assets
    pub fn files(&self) -> PathBuf {
        self.data.join("files")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_under_home() {
        let dirs = AppDirs::resolve(Path::new("/home/me"), None, None);
        assert_eq!(dirs.data, PathBuf::from("/home/me/.local/share/lineposter"));
        assert_eq!(dirs.config, PathBuf::from("/home/me/.config/lineposter"));
        assert_eq!(
            dirs.config_file(),
            PathBuf::from("/home/me/.config/lineposter/lineposter.toml")
        );
        assert_eq!(
            dirs.files(),
            PathBuf::from("/home/me/.local/share/lineposter/files")
        );
    }

    #[test]
    fn test_resolve_xdg_overrides() {
        let dirs = AppDirs::resolve(Path::new("/home/me"), Some("/xdg/data"), Some(""));
        assert_eq!(dirs.data, PathBuf::from("/xdg/data/lineposter"));
        assert_eq!(dirs.config, PathBuf::from("/home/me/.config/lineposter"));
    }
}

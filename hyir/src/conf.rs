use std::path::{Path, PathBuf};

use hyaux::conf::RegistryOptions;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    error::{IrError, IrResult},
    magic::{DEFAULT_ZSTD_LEVEL, ENV_IR_CONFIG_PATH},
};

/// Options of the IR file writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoOptions {
    /// Compress the payload with zstd. Ignored (always off) with the
    /// `legacy_nozstd` feature.
    pub compress: bool,
    /// zstd compression level.
    pub level: i32,
}

impl Default for IoOptions {
    fn default() -> Self {
        Self {
            compress: true,
            level: DEFAULT_ZSTD_LEVEL,
        }
    }
}

/// Content of `hyir.toml`.
///
/// ```toml
/// [registry]
/// strict_type_tags = true
/// lock_on_serialize = true
///
/// [io]
/// compress = true
/// level = 3
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrConfig {
    pub registry: RegistryOptions,
    pub io: IoOptions,
}

impl IrConfig {
    /// Get the default path to the IR configuration file.
    pub fn default_path() -> PathBuf {
        if let Ok(config_path) = std::env::var(ENV_IR_CONFIG_PATH) {
            return config_path.into();
        }

        let mut path = PathBuf::new();

        #[cfg(target_os = "windows")]
        {
            if let Ok(appdata) = std::env::var("APPDATA") {
                path.push(appdata);
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
                path.push(xdg_config_home);
            } else if let Ok(home) = std::env::var("HOME") {
                path.push(home);
                path.push(".config");
            }
        }

        path.push("hyperion");
        path.push("hyir.toml");
        path
    }

    /// Parse a configuration from TOML text. `origin` only names the source in errors.
    pub fn from_toml_str(toml_str: &str, origin: &str) -> IrResult<Self> {
        toml::from_str(toml_str).map_err(|source| IrError::ConfigParse {
            source,
            file: origin.to_string(),
        })
    }

    /// Load a configuration from a TOML file.
    pub fn load_from_toml(path: &Path) -> IrResult<Self> {
        let toml_str = std::fs::read_to_string(path)?;
        Self::from_toml_str(&toml_str, &path.display().to_string())
    }

    /// Load the file at [`Self::default_path`], or the defaults if there is none.
    pub fn load_or_default() -> IrResult<Self> {
        let path = Self::default_path();
        if path.is_file() {
            debug!("Loading IR configuration from {}", path.display());
            Self::load_from_toml(&path)
        } else {
            debug!(
                "No IR configuration at {}, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save_to_toml(&self, path: &Path) -> IrResult<()> {
        let toml_str = toml::to_string(self).map_err(|source| IrError::ConfigWrite {
            source,
            file: path.display().to_string(),
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// Whether saved files are compressed, once build features are accounted for.
    pub fn compression_enabled(&self) -> bool {
        !cfg!(feature = "legacy_nozstd") && self.io.compress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_tables_fall_back_to_defaults() {
        let config = IrConfig::from_toml_str(
            "[registry]\nstrict_type_tags = false\n\n[io]\nlevel = 9\n",
            "inline",
        )
        .unwrap();

        assert!(!config.registry.strict_type_tags);
        assert!(config.registry.lock_on_serialize);
        assert!(config.io.compress);
        assert_eq!(config.io.level, 9);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(IrConfig::from_toml_str("", "inline").unwrap(), IrConfig::default());
    }

    #[test]
    fn malformed_document_names_its_origin() {
        let err = IrConfig::from_toml_str("[io]\ncompress = \"yes\"\n", "broken.toml").unwrap_err();
        match err {
            IrError::ConfigParse { file, .. } => assert_eq!(file, "broken.toml"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn save_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("hyir.toml");

        let mut config = IrConfig::default();
        config.io.compress = false;
        config.registry.lock_on_serialize = false;
        config.save_to_toml(&path).unwrap();

        assert_eq!(IrConfig::load_from_toml(&path).unwrap(), config);
    }
}

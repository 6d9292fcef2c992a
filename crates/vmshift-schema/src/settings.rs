use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Conventional firmware descriptor directory on Linux hosts.
pub const DEFAULT_FIRMWARE_DIR: &str = "/usr/share/qemu/firmware";

/// User settings, read from `~/.config/vmshift/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub firmware: FirmwareSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FirmwareSettings {
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: PathBuf,
}

impl Default for FirmwareSettings {
    fn default() -> Self {
        Self {
            catalog_dir: default_catalog_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PipelineSettings {
    /// Names of transformations registered as disabled.
    #[serde(default)]
    pub disabled: Vec<String>,
    #[serde(default)]
    pub preferred_domain_type: Option<String>,
}

fn default_catalog_dir() -> PathBuf {
    PathBuf::from(DEFAULT_FIRMWARE_DIR)
}

impl Settings {
    pub fn parse_str(input: &str) -> Result<Self, SchemaError> {
        Ok(toml::from_str(input)?)
    }

    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::parse_str(&content)
    }

    /// Load the default settings file, falling back to defaults if it does not exist.
    pub fn load_default() -> Result<Self, SchemaError> {
        match default_settings_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn is_disabled(&self, transformation: &str) -> bool {
        self.pipeline.disabled.iter().any(|d| d == transformation)
    }
}

pub fn default_settings_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".config/vmshift/config.toml"))
}

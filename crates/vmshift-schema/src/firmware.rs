use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One firmware build as described by a QEMU firmware descriptor file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct FirmwareDescriptor {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub interface_types: Vec<String>,
    pub mapping: FirmwareMapping,
    #[serde(default)]
    pub targets: Vec<FirmwareTarget>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// How the firmware is loaded into the guest.
///
/// Flash-mapped builds carry an executable and an NVRAM template; `kernel`
/// and `memory` devices carry a single `filename` instead.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct FirmwareMapping {
    pub device: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<FirmwareFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nvram_template: Option<FirmwareFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FirmwareFile {
    pub filename: PathBuf,
    #[serde(default = "default_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FirmwareTarget {
    pub architecture: String,
    #[serde(default)]
    pub machines: Vec<String>,
}

fn default_format() -> String {
    "raw".to_owned()
}

impl FirmwareDescriptor {
    pub fn supports_interface(&self, interface: &str) -> bool {
        self.interface_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(interface))
    }

    /// True if some target declares `arch` and a machine pattern covering `machine`.
    pub fn supports_target(&self, arch: &str, machine: &str) -> bool {
        self.targets
            .iter()
            .filter(|t| t.architecture == arch)
            .any(|t| t.matches_machine(machine))
    }

    pub fn executable_path(&self) -> Option<&Path> {
        self.mapping.executable.as_ref().map(|f| f.filename.as_path())
    }

    pub fn nvram_template_path(&self) -> Option<&Path> {
        self.mapping
            .nvram_template
            .as_ref()
            .map(|f| f.filename.as_path())
    }
}

impl FirmwareTarget {
    /// A pattern ending in `*` matches by prefix; otherwise the machine must
    /// start with the pattern as written.
    pub fn matches_machine(&self, machine: &str) -> bool {
        self.machines.iter().any(|pattern| {
            let prefix = pattern.strip_suffix('*').unwrap_or(pattern);
            machine.starts_with(prefix)
        })
    }
}

pub fn parse_descriptor_str(input: &str) -> Result<FirmwareDescriptor, SchemaError> {
    Ok(serde_json::from_str(input)?)
}

pub fn parse_descriptor_file(path: impl AsRef<Path>) -> Result<FirmwareDescriptor, SchemaError> {
    let content = fs::read_to_string(path)?;
    parse_descriptor_str(&content)
}

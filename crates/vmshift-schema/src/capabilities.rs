//! Host virtualization capabilities as seen by the conversion pipeline.

use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Read-only query surface over the target host's virtualizer.
pub trait HostCapabilities {
    fn host_cpu(&self) -> &HostCpu;

    /// CPU models the virtualizer can expose to a guest.
    fn cpu_models(&self) -> &[String];

    fn guests(&self) -> &[GuestCapabilities];

    fn find_guest(&self, os_type: &str, arch: &str) -> Option<&GuestCapabilities> {
        self.guests()
            .iter()
            .find(|g| g.os_type == os_type && g.arch == arch)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostCpu {
    #[serde(default)]
    pub arch: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuestCapabilities {
    pub os_type: String,
    pub arch: String,
    #[serde(default)]
    pub word_size: u32,
    pub emulator: PathBuf,
    #[serde(default)]
    pub machines: Vec<MachineInfo>,
    #[serde(default)]
    pub domain_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MachineInfo {
    pub name: String,
    #[serde(default)]
    pub max_cpus: u32,
    /// Versioned machine this name is an alias for, e.g. `q35` -> `pc-q35-8.2`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
}

impl MachineInfo {
    pub fn canonical_name(&self) -> &str {
        self.canonical.as_deref().unwrap_or(&self.name)
    }
}

impl GuestCapabilities {
    /// Find a machine by its own name or by its canonical name.
    pub fn find_machine(&self, name: &str) -> Option<&MachineInfo> {
        self.machines
            .iter()
            .find(|m| m.name == name)
            .or_else(|| {
                self.machines
                    .iter()
                    .find(|m| m.canonical.as_deref() == Some(name))
            })
    }

    pub fn supports_domain_type(&self, domain_type: &str) -> bool {
        self.domain_types.iter().any(|t| t == domain_type)
    }
}

/// Capabilities document loaded from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapabilitiesDocument {
    #[serde(default)]
    pub host: HostCpu,
    #[serde(default)]
    pub cpu_models: Vec<String>,
    #[serde(default)]
    pub guests: Vec<GuestCapabilities>,
}

impl HostCapabilities for CapabilitiesDocument {
    fn host_cpu(&self) -> &HostCpu {
        &self.host
    }

    fn cpu_models(&self) -> &[String] {
        &self.cpu_models
    }

    fn guests(&self) -> &[GuestCapabilities] {
        &self.guests
    }
}

impl CapabilitiesDocument {
    pub fn parse_str(input: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::parse_str(&content)
    }
}

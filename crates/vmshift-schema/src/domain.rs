use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Virtual machine configuration being converted between platforms.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DomainConfig {
    pub name: String,
    #[serde(default = "default_domain_type")]
    pub domain_type: String,
    #[serde(default)]
    pub memory_mib: u64,
    #[serde(default = "default_vcpus")]
    pub vcpus: u32,
    pub os: OsSection,
    #[serde(default)]
    pub cpu: CpuSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emulator: Option<PathBuf>,
    #[serde(default)]
    pub disks: Vec<DiskSection>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct OsSection {
    #[serde(default = "default_os_type")]
    pub os_type: String,
    pub arch: String,
    pub machine: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loader: Option<LoaderSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nvram: Option<NvramSection>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoaderSection {
    pub path: PathBuf,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default = "default_loader_type")]
    pub loader_type: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NvramSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CpuSection {
    #[serde(default = "default_cpu_mode")]
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

impl Default for CpuSection {
    fn default() -> Self {
        Self {
            mode: default_cpu_mode(),
            model: None,
            features: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DiskSection {
    pub source: PathBuf,
    pub target: String,
    #[serde(default = "default_bus")]
    pub bus: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

pub const CPU_MODE_CUSTOM: &str = "custom";
pub const CPU_MODE_HOST_MODEL: &str = "host-model";

fn default_domain_type() -> String {
    "kvm".to_owned()
}

fn default_vcpus() -> u32 {
    1
}

fn default_os_type() -> String {
    "hvm".to_owned()
}

fn default_loader_type() -> String {
    "pflash".to_owned()
}

fn default_cpu_mode() -> String {
    CPU_MODE_HOST_MODEL.to_owned()
}

fn default_bus() -> String {
    "virtio".to_owned()
}

impl DomainConfig {
    pub fn to_pretty_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn parse_domain_str(input: &str) -> Result<DomainConfig, SchemaError> {
    Ok(serde_json::from_str(input)?)
}

pub fn parse_domain_file(path: impl AsRef<Path>) -> Result<DomainConfig, SchemaError> {
    let content = fs::read_to_string(path)?;
    parse_domain_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_domain() {
        let input = r#"{
    "name": "fedora-server",
    "domain_type": "kvm",
    "memory_mib": 4096,
    "vcpus": 4,
    "os": {
        "os_type": "hvm",
        "arch": "x86_64",
        "machine": "pc-q35-5.0",
        "loader": { "path": "/usr/share/OVMF/OVMF_CODE.fd", "readonly": true, "loader_type": "pflash" },
        "nvram": { "path": "/var/lib/libvirt/qemu/nvram/fedora-server_VARS.fd" }
    },
    "cpu": { "mode": "custom", "model": "Skylake-Client", "features": ["vmx"] },
    "emulator": "/usr/bin/qemu-system-x86_64",
    "disks": [
        { "source": "/var/lib/images/fedora.qcow2", "target": "vda", "bus": "virtio", "format": "qcow2" }
    ]
}"#;
        let domain = parse_domain_str(input).expect("should parse");
        assert_eq!(domain.vcpus, 4);
        assert_eq!(domain.os.machine, "pc-q35-5.0");
        assert!(domain.os.loader.as_ref().unwrap().readonly);
        assert_eq!(domain.cpu.model.as_deref(), Some("Skylake-Client"));
        assert_eq!(domain.disks[0].format.as_deref(), Some("qcow2"));
    }

    #[test]
    fn parses_minimal_domain() {
        let input = r#"{ "name": "tiny", "os": { "arch": "aarch64", "machine": "virt" } }"#;
        let domain = parse_domain_str(input).expect("should parse");
        assert_eq!(domain.domain_type, "kvm");
        assert_eq!(domain.vcpus, 1);
        assert_eq!(domain.os.os_type, "hvm");
        assert_eq!(domain.cpu.mode, CPU_MODE_HOST_MODEL);
        assert!(domain.os.loader.is_none());
        assert!(domain.disks.is_empty());
    }

    #[test]
    fn rejects_unknown_fields() {
        let input = r#"{ "name": "x", "os": { "arch": "x86_64", "machine": "pc" }, "graphics": "spice" }"#;
        assert!(parse_domain_str(input).is_err());
    }

    #[test]
    fn rejects_missing_os() {
        assert!(parse_domain_str(r#"{ "name": "x" }"#).is_err());
    }
}

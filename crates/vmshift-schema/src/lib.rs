//! Data model for vmshift virtual machine conversion.
//!
//! This crate defines the schema layer: the VM configuration being converted
//! (`DomainConfig`), QEMU firmware descriptors (`FirmwareDescriptor`), disk
//! image metadata (`ImageMetadata`), the host capabilities query surface
//! (`HostCapabilities`), two-component `Version`s, and user `Settings`.

pub mod capabilities;
pub mod domain;
pub mod firmware;
pub mod image;
pub mod settings;
pub mod version;

pub use capabilities::{
    CapabilitiesDocument, GuestCapabilities, HostCapabilities, HostCpu, MachineInfo,
};
pub use domain::{
    parse_domain_file, parse_domain_str, CpuSection, DiskSection, DomainConfig, LoaderSection,
    NvramSection, OsSection, CPU_MODE_CUSTOM, CPU_MODE_HOST_MODEL,
};
pub use firmware::{
    parse_descriptor_file, parse_descriptor_str, FirmwareDescriptor, FirmwareFile,
    FirmwareMapping, FirmwareTarget,
};
pub use image::{
    load_disk_images, DiskFormat, DiskImageInfo, ImageMetadata, QCOW2_SUPPORTED_VERSIONS,
};
pub use settings::{default_settings_path, Settings, DEFAULT_FIRMWARE_DIR};
pub use version::Version;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse JSON: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("failed to parse settings: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("invalid version string: '{0}', expected major[.minor[.patch]]")]
    InvalidVersion(String),
}

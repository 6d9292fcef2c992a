//! Disk image metadata consumed by the pipeline.
//!
//! Format detection happens elsewhere; this module only models the already
//! extracted facts about an image.

use crate::version::Version;
use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DiskFormat {
    Raw,
    Qcow2,
    Vmdk,
    Vdi,
    Vhdx,
}

impl std::fmt::Display for DiskFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiskFormat::Raw => write!(f, "raw"),
            DiskFormat::Qcow2 => write!(f, "qcow2"),
            DiskFormat::Vmdk => write!(f, "vmdk"),
            DiskFormat::Vdi => write!(f, "vdi"),
            DiskFormat::Vhdx => write!(f, "vhdx"),
        }
    }
}

/// qcow2 compatibility levels the target platform can open.
pub const QCOW2_SUPPORTED_VERSIONS: &[Version] = &[Version::new(0, 10), Version::new(1, 1)];

/// Read-only view of a disk image's extracted metadata.
pub trait ImageMetadata {
    fn format(&self) -> DiskFormat;

    /// True if the image has no backing file.
    fn is_standalone(&self) -> bool;

    fn is_snapshot(&self) -> bool;

    fn is_compressed(&self) -> bool;

    fn version(&self) -> &Version;

    fn description(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiskImageInfo {
    pub path: PathBuf,
    pub format: DiskFormat,
    #[serde(default = "default_true")]
    pub standalone: bool,
    #[serde(default)]
    pub snapshot: bool,
    #[serde(default)]
    pub compressed: bool,
    pub version: Version,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_true() -> bool {
    true
}

impl ImageMetadata for DiskImageInfo {
    fn format(&self) -> DiskFormat {
        self.format
    }

    fn is_standalone(&self) -> bool {
        self.standalone
    }

    fn is_snapshot(&self) -> bool {
        self.snapshot
    }

    fn is_compressed(&self) -> bool {
        self.compressed
    }

    fn version(&self) -> &Version {
        &self.version
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

pub fn load_disk_images(path: impl AsRef<Path>) -> Result<Vec<DiskImageInfo>, SchemaError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

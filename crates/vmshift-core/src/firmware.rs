//! Firmware catalog loading and boot loader resolution.
//!
//! A catalog is a directory of QEMU firmware descriptor files. Resolution
//! picks the UEFI build whose executable filename most resembles the
//! source VM's loader, restricted to the VM's architecture and machine type.

use crate::distance::EditDistance;
use crate::CoreError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use vmshift_schema::{parse_descriptor_file, FirmwareDescriptor};

const DESCRIPTOR_EXTENSION: &str = "json";
const UEFI_INTERFACE: &str = "uefi";

pub struct FirmwareCatalog;

impl FirmwareCatalog {
    /// Parse every descriptor file directly inside `dir`.
    ///
    /// Entries come back in directory listing order. Any unparsable file
    /// fails the whole load.
    pub fn load(dir: &Path) -> Result<Vec<FirmwareDescriptor>, CoreError> {
        let mut descriptors = Vec::new();
        for path in descriptor_paths(dir)? {
            let descriptor =
                parse_descriptor_file(&path).map_err(|e| CoreError::UnparsableDescriptor {
                    file: path.clone(),
                    reason: e.to_string(),
                })?;
            trace!("loaded firmware descriptor {}", path.display());
            descriptors.push(descriptor);
        }

        debug!(
            "loaded {} firmware descriptors from {}",
            descriptors.len(),
            dir.display()
        );
        Ok(descriptors)
    }
}

/// `.json` regular files directly inside `dir`, in listing order.
fn descriptor_paths(dir: &Path) -> Result<Vec<PathBuf>, CoreError> {
    let invalid = || CoreError::InvalidCatalogDirectory(dir.to_path_buf());
    if !dir.is_dir() {
        return Err(invalid());
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|_| invalid())? {
        let path = entry.map_err(|_| invalid())?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(DESCRIPTOR_EXTENSION)
        {
            paths.push(path);
        }
    }
    Ok(paths)
}

/// Answers "which local firmware replaces this source loader" queries.
pub struct FirmwareResolver {
    catalog_dir: PathBuf,
    metric: EditDistance,
}

impl FirmwareResolver {
    pub fn new(catalog_dir: impl Into<PathBuf>) -> Self {
        Self {
            catalog_dir: catalog_dir.into(),
            metric: EditDistance::default(),
        }
    }

    #[inline]
    pub fn catalog_dir(&self) -> &Path {
        &self.catalog_dir
    }

    /// Return the executable path of the best-matching UEFI firmware.
    pub fn resolve_loader(
        &self,
        source_loader: &Path,
        arch: &str,
        machine: &str,
    ) -> Result<PathBuf, CoreError> {
        let descriptor = self.resolve_descriptor(source_loader, arch, machine)?;
        descriptor
            .executable_path()
            .map(Path::to_path_buf)
            .ok_or_else(|| CoreError::NoSuitableFirmware {
                arch: arch.to_owned(),
                machine: machine.to_owned(),
            })
    }

    /// Return the whole descriptor of the best-matching UEFI firmware.
    ///
    /// Ties on distance go to the descriptor listed first by the directory,
    /// which is not guaranteed stable across filesystems.
    pub fn resolve_descriptor(
        &self,
        source_loader: &Path,
        arch: &str,
        machine: &str,
    ) -> Result<FirmwareDescriptor, CoreError> {
        let descriptors = FirmwareCatalog::load(&self.catalog_dir)?;
        let wanted = base_name_lowercase(source_loader);

        let mut best: Option<(usize, FirmwareDescriptor)> = None;
        for descriptor in descriptors {
            if !descriptor.supports_interface(UEFI_INTERFACE)
                || !descriptor.supports_target(arch, machine)
            {
                continue;
            }
            let Some(executable) = descriptor.executable_path() else {
                continue;
            };
            let score = self
                .metric
                .distance(&base_name_lowercase(executable), &wanted);
            trace!("candidate {} scored {score}", executable.display());
            if best.as_ref().map_or(true, |(s, _)| score < *s) {
                best = Some((score, descriptor));
            }
        }

        let (score, descriptor) = best.ok_or_else(|| CoreError::NoSuitableFirmware {
            arch: arch.to_owned(),
            machine: machine.to_owned(),
        })?;
        debug!(
            "resolved loader {} to {:?} (distance {score})",
            source_loader.display(),
            descriptor.executable_path()
        );
        Ok(descriptor)
    }
}

/// Convenience wrapper around [`FirmwareResolver::resolve_loader`].
pub fn resolve_loader(
    catalog_dir: &Path,
    source_loader: &Path,
    arch: &str,
    machine: &str,
) -> Result<PathBuf, CoreError> {
    FirmwareResolver::new(catalog_dir).resolve_loader(source_loader, arch, machine)
}

fn base_name_lowercase(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

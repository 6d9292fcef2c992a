//! Configuration transformation pipeline for vmshift.
//!
//! This crate holds the `TransformationManager`, which applies an ordered list
//! of enable-able `Transformation`s to one VM configuration with fail-fast
//! semantics, the firmware catalog and resolver that retarget UEFI loaders to
//! locally installed builds, the weighted `EditDistance` used to rank them,
//! and the built-in transformations that adapt a `DomainConfig` to a host.

pub mod builtin;
pub mod distance;
pub mod firmware;
pub mod transform;

pub use builtin::{register_builtin, ConversionArgs, DomainTransformation, BUILTIN_TRANSFORMATIONS};
pub use distance::EditDistance;
pub use firmware::{resolve_loader, FirmwareCatalog, FirmwareResolver};
pub use transform::{Transformation, TransformationManager, TransformationSummary};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("firmware catalog is not a directory: {}", .0.display())]
    InvalidCatalogDirectory(PathBuf),
    #[error("unparsable firmware descriptor {}: {reason}", file.display())]
    UnparsableDescriptor { file: PathBuf, reason: String },
    #[error("no UEFI firmware for architecture {arch} and machine {machine}")]
    NoSuitableFirmware { arch: String, machine: String },
    #[error("transformation '{name}' failed: {source}")]
    TransformationFailed {
        name: String,
        #[source]
        source: Box<CoreError>,
    },
    #[error("unsupported on this host: {0}")]
    Unsupported(String),
    #[error("unsupported disk image {}: {reason}", path.display())]
    UnsupportedImage { path: PathBuf, reason: String },
    #[error("schema error: {0}")]
    Schema(#[from] vmshift_schema::SchemaError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transformation_failure_names_the_step() {
        let e = CoreError::TransformationFailed {
            name: "firmware".to_owned(),
            source: Box::new(CoreError::NoSuitableFirmware {
                arch: "x87".to_owned(),
                machine: "pc-q35-6.0".to_owned(),
            }),
        };
        let msg = e.to_string();
        assert!(msg.contains("firmware"));
        assert!(msg.contains("x87"));
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn catalog_errors_show_paths() {
        let e = CoreError::InvalidCatalogDirectory(PathBuf::from("/missing/dir"));
        assert!(e.to_string().contains("/missing/dir"));
        let e = CoreError::UnparsableDescriptor {
            file: PathBuf::from("/fw/50-bad.json"),
            reason: "expected value".to_owned(),
        };
        let msg = e.to_string();
        assert!(msg.contains("50-bad.json"));
        assert!(msg.contains("expected value"));
    }
}

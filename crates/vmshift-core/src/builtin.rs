//! Transformations that retarget a [`DomainConfig`] to the local host.

use crate::firmware::FirmwareResolver;
use crate::transform::{Transformation, TransformationManager};
use crate::CoreError;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use vmshift_schema::{
    DiskFormat, DiskImageInfo, DomainConfig, GuestCapabilities, HostCapabilities, ImageMetadata,
    NvramSection, Settings, Version, CPU_MODE_CUSTOM, CPU_MODE_HOST_MODEL, DEFAULT_FIRMWARE_DIR,
    QCOW2_SUPPORTED_VERSIONS,
};

pub const DOMAIN_TYPE: &str = "domain-type";
pub const EMULATOR: &str = "emulator";
pub const MACHINE_TYPE: &str = "machine-type";
pub const VCPU_LIMIT: &str = "vcpu-limit";
pub const CPU_MODEL: &str = "cpu-model";
pub const FIRMWARE: &str = "firmware";
pub const DISK_FORMAT: &str = "disk-format";

/// Built-in transformation names in registration order.
pub const BUILTIN_TRANSFORMATIONS: &[&str] = &[
    DOMAIN_TYPE,
    EMULATOR,
    MACHINE_TYPE,
    VCPU_LIMIT,
    CPU_MODEL,
    FIRMWARE,
    DISK_FORMAT,
];

/// Arguments shared by every built-in transformation.
#[derive(Debug, Clone)]
pub struct ConversionArgs {
    pub firmware_dir: PathBuf,
    pub disks: Vec<DiskImageInfo>,
    pub preferred_domain_type: Option<String>,
}

impl Default for ConversionArgs {
    fn default() -> Self {
        Self {
            firmware_dir: PathBuf::from(DEFAULT_FIRMWARE_DIR),
            disks: Vec::new(),
            preferred_domain_type: None,
        }
    }
}

impl ConversionArgs {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            firmware_dir: settings.firmware.catalog_dir.clone(),
            disks: Vec::new(),
            preferred_domain_type: settings.pipeline.preferred_domain_type.clone(),
        }
    }
}

pub type DomainTransformation<'h> = Transformation<'h, DomainConfig, ConversionArgs>;

/// Register every built-in transformation, disabling the ones named in `settings`.
pub fn register_builtin<'h>(
    manager: &mut TransformationManager<'_, 'h, DomainConfig, ConversionArgs>,
    caps: &'h dyn HostCapabilities,
    settings: &Settings,
) {
    let transformations = [
        domain_type(caps),
        emulator(caps),
        machine_type(caps),
        vcpu_limit(caps),
        cpu_model(caps),
        firmware(),
        disk_format(),
    ];
    for t in transformations {
        let enabled = !settings.is_disabled(t.name());
        manager.register_with(t, enabled);
    }
}

fn guest_for<'c>(
    caps: &'c dyn HostCapabilities,
    config: &DomainConfig,
) -> Result<&'c GuestCapabilities, CoreError> {
    caps.find_guest(&config.os.os_type, &config.os.arch)
        .ok_or_else(|| {
            CoreError::Unsupported(format!(
                "host has no {} guest for architecture {}",
                config.os.os_type, config.os.arch
            ))
        })
}

pub fn domain_type(caps: &dyn HostCapabilities) -> DomainTransformation<'_> {
    DomainTransformation::specific(DOMAIN_TYPE, caps, |caps, config, args| {
        let guest = guest_for(caps, config)?;
        if guest.supports_domain_type(&config.domain_type) {
            return Ok(());
        }
        let replacement = args
            .preferred_domain_type
            .as_deref()
            .filter(|t| guest.supports_domain_type(t))
            .or_else(|| guest.domain_types.first().map(String::as_str))
            .ok_or_else(|| {
                CoreError::Unsupported(format!("host {} guest has no domain types", guest.arch))
            })?;
        info!(
            "domain type {} unavailable, using {replacement}",
            config.domain_type
        );
        config.domain_type = replacement.to_owned();
        Ok(())
    })
}

pub fn emulator(caps: &dyn HostCapabilities) -> DomainTransformation<'_> {
    DomainTransformation::specific(EMULATOR, caps, |caps, config, _args| {
        let guest = guest_for(caps, config)?;
        debug!("emulator set to {}", guest.emulator.display());
        config.emulator = Some(guest.emulator.clone());
        Ok(())
    })
}

pub fn machine_type(caps: &dyn HostCapabilities) -> DomainTransformation<'_> {
    DomainTransformation::specific(MACHINE_TYPE, caps, |caps, config, _args| {
        let guest = guest_for(caps, config)?;
        let current = config.os.machine.clone();

        let selected = if let Some(machine) = guest.find_machine(&current) {
            machine.canonical_name().to_owned()
        } else {
            newest_in_family(guest, &current).ok_or_else(|| {
                CoreError::Unsupported(format!(
                    "machine type {current} has no equivalent on this host"
                ))
            })?
        };

        if selected != current {
            info!("machine type {current} retargeted to {selected}");
            config.os.machine = selected;
        }
        Ok(())
    })
}

/// Pick the highest versioned machine sharing `machine`'s family,
/// e.g. `pc-q35-5.0` -> `pc-q35-8.2`. Unversioned names rank below versioned ones.
fn newest_in_family(guest: &GuestCapabilities, machine: &str) -> Option<String> {
    let (family, _) = machine.rsplit_once('-')?;
    let prefix = format!("{family}-");
    guest
        .machines
        .iter()
        .map(|m| m.canonical_name())
        .filter(|name| name.starts_with(&prefix))
        .max_by_key(|name| (name[prefix.len()..].parse::<Version>().ok(), *name))
        .map(str::to_owned)
}

pub fn vcpu_limit(caps: &dyn HostCapabilities) -> DomainTransformation<'_> {
    DomainTransformation::specific(VCPU_LIMIT, caps, |caps, config, _args| {
        let guest = guest_for(caps, config)?;
        let Some(machine) = guest.find_machine(&config.os.machine) else {
            return Err(CoreError::Unsupported(format!(
                "machine type {} is not offered by this host",
                config.os.machine
            )));
        };
        if machine.max_cpus > 0 && config.vcpus > machine.max_cpus {
            warn!(
                "{} vcpus exceed the {} limit of {}, clamping",
                config.vcpus, machine.name, machine.max_cpus
            );
            config.vcpus = machine.max_cpus;
        }
        Ok(())
    })
}

pub fn cpu_model(caps: &dyn HostCapabilities) -> DomainTransformation<'_> {
    DomainTransformation::specific(CPU_MODEL, caps, |caps, config, _args| {
        if config.cpu.mode != CPU_MODE_CUSTOM {
            return Ok(());
        }
        if let Some(model) = config.cpu.model.as_deref() {
            if !caps.cpu_models().iter().any(|m| m == model) {
                info!("cpu model {model} unavailable, falling back to {CPU_MODE_HOST_MODEL}");
                config.cpu.mode = CPU_MODE_HOST_MODEL.to_owned();
                config.cpu.model = None;
            }
        }
        let host = caps.host_cpu();
        config.cpu.features.retain(|f| {
            let present = host.features.contains(f);
            if !present {
                debug!("dropping cpu feature {f} missing on host");
            }
            present
        });
        Ok(())
    })
}

pub fn firmware() -> DomainTransformation<'static> {
    DomainTransformation::generic(FIRMWARE, |config, args| {
        let Some(loader) = config.os.loader.as_mut() else {
            return Ok(());
        };
        let resolver = FirmwareResolver::new(&args.firmware_dir);
        let descriptor =
            resolver.resolve_descriptor(&loader.path, &config.os.arch, &config.os.machine)?;
        if let Some(executable) = descriptor.executable_path() {
            info!(
                "loader {} replaced by {}",
                loader.path.display(),
                executable.display()
            );
            loader.path = executable.to_path_buf();
        }
        if let Some(template) = descriptor.nvram_template_path() {
            config
                .os
                .nvram
                .get_or_insert_with(NvramSection::default)
                .template = Some(template.to_path_buf());
        }
        Ok(())
    })
}

pub fn disk_format() -> DomainTransformation<'static> {
    DomainTransformation::generic(DISK_FORMAT, |config, args| {
        for disk in &mut config.disks {
            let Some(image) = args.disks.iter().find(|i| i.path == disk.source) else {
                continue;
            };
            if image.format() == DiskFormat::Qcow2
                && !image.version().is_supported(QCOW2_SUPPORTED_VERSIONS)
            {
                return Err(CoreError::UnsupportedImage {
                    path: disk.source.clone(),
                    reason: format!("qcow2 version {} cannot be opened", image.version()),
                });
            }
            if !image.is_standalone() || image.is_snapshot() {
                warn!(
                    "{} depends on a backing image that must be copied alongside it",
                    disk.source.display()
                );
            }
            disk.format = Some(image.format().to_string());
        }
        Ok(())
    })
}

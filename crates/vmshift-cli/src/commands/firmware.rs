use super::{describe_core_error, json_pretty, EXIT_SUCCESS};
use std::path::Path;
use vmshift_core::FirmwareResolver;
use vmshift_schema::Settings;

pub fn run(
    settings: &Settings,
    loader: &Path,
    arch: &str,
    machine: &str,
    firmware_dir: Option<&Path>,
    json: bool,
) -> Result<u8, String> {
    let catalog_dir = firmware_dir.unwrap_or(&settings.firmware.catalog_dir);
    let resolver = FirmwareResolver::new(catalog_dir);
    let descriptor = resolver
        .resolve_descriptor(loader, arch, machine)
        .map_err(|e| describe_core_error(&e))?;
    let executable = descriptor
        .executable_path()
        .ok_or_else(|| format!("firmware error: {} has no executable", descriptor.description))?;

    if json {
        let payload = serde_json::json!({
            "loader": executable,
            "nvram_template": descriptor.nvram_template_path(),
            "description": descriptor.description,
            "features": descriptor.features,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{}", executable.display());
    }
    Ok(EXIT_SUCCESS)
}

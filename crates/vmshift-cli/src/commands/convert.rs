use super::{describe_core_error, json_pretty, print_summary, write_atomic, EXIT_SUCCESS};
use std::path::PathBuf;
use tracing::info;
use vmshift_core::{register_builtin, ConversionArgs, TransformationManager};
use vmshift_schema::{load_disk_images, parse_domain_file, CapabilitiesDocument, Settings};

pub struct ConvertOptions {
    pub domain: PathBuf,
    pub capabilities: PathBuf,
    pub disks: Option<PathBuf>,
    pub firmware_dir: Option<PathBuf>,
    pub disabled: Vec<String>,
    pub output: Option<PathBuf>,
    pub dry_run: bool,
}

pub fn run(settings: &Settings, opts: &ConvertOptions, json: bool) -> Result<u8, String> {
    let mut config = parse_domain_file(&opts.domain)
        .map_err(|e| format!("input error: {}: {e}", opts.domain.display()))?;
    let caps = CapabilitiesDocument::load(&opts.capabilities)
        .map_err(|e| format!("input error: {}: {e}", opts.capabilities.display()))?;

    let mut args = ConversionArgs::from_settings(settings);
    if let Some(dir) = &opts.firmware_dir {
        args.firmware_dir.clone_from(dir);
    }
    if let Some(path) = &opts.disks {
        args.disks = load_disk_images(path)
            .map_err(|e| format!("input error: {}: {e}", path.display()))?;
    }

    let mut manager = TransformationManager::new(&mut config, &args);
    register_builtin(&mut manager, &caps, settings);
    for name in &opts.disabled {
        if manager.set_enabled(name, false) == 0 {
            return Err(format!("unknown transformation '{name}'"));
        }
    }

    if opts.dry_run {
        let rows = manager.summary();
        if json {
            println!("{}", json_pretty(&rows)?);
        } else {
            print_summary(&rows);
        }
        return Ok(EXIT_SUCCESS);
    }

    manager.apply().map_err(|e| describe_core_error(&e))?;
    info!("converted {}", config.name);

    let rendered = json_pretty(&config)?;
    match &opts.output {
        Some(path) => {
            write_atomic(path, &rendered)?;
            if json {
                let payload = serde_json::json!({
                    "status": "converted",
                    "name": config.name,
                    "output": path,
                });
                println!("{}", json_pretty(&payload)?);
            } else {
                println!("converted '{}' -> {}", config.name, path.display());
            }
        }
        None => println!("{rendered}"),
    }
    Ok(EXIT_SUCCESS)
}

pub mod completions;
pub mod convert;
pub mod firmware;
pub mod man_pages;
pub mod transformations;

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use vmshift_core::{CoreError, TransformationSummary};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_INPUT_ERROR: u8 = 2;
pub const EXIT_FIRMWARE_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

/// Prefix firmware lookup failures so `main` can map them to their exit code.
pub fn describe_core_error(err: &CoreError) -> String {
    let firmware_failure = match err {
        CoreError::InvalidCatalogDirectory(_)
        | CoreError::UnparsableDescriptor { .. }
        | CoreError::NoSuitableFirmware { .. } => true,
        CoreError::TransformationFailed { source, .. } => matches!(
            **source,
            CoreError::InvalidCatalogDirectory(_)
                | CoreError::UnparsableDescriptor { .. }
                | CoreError::NoSuitableFirmware { .. }
        ),
        _ => false,
    };
    if firmware_failure {
        format!("firmware error: {err}")
    } else {
        err.to_string()
    }
}

pub fn colorize_marker(active: bool) -> String {
    use console::Style;
    if active {
        Style::new().green().apply_to("enabled").to_string()
    } else {
        Style::new().dim().apply_to("disabled").to_string()
    }
}

pub fn print_summary(rows: &[TransformationSummary]) {
    println!("{:<4} {:<16} STATE", "#", "NAME");
    for row in rows {
        println!(
            "{:<4} {:<16} {}",
            row.ordinal,
            row.name,
            colorize_marker(row.active)
        );
    }
}

pub fn write_atomic(dest: &Path, content: &str) -> Result<(), String> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| format!("write temp file: {e}"))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| format!("write temp file: {e}"))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| format!("fsync temp file: {e}"))?;
    tmp.persist(dest)
        .map_err(|e| format!("persist {}: {}", dest.display(), e.error))?;
    Ok(())
}

//! CLI subprocess integration tests.
//!
//! These tests invoke the `vmshift` binary as a subprocess and verify
//! exit codes, stdout content, and JSON output stability.

use std::path::{Path, PathBuf};
use std::process::Command;

fn vmshift_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vmshift"));
    // Keep a developer's ~/.config/vmshift/config.toml out of the tests.
    cmd.env("HOME", "/nonexistent/vmshift-test-home");
    cmd.env_remove("VMSHIFT_LOG");
    cmd
}

fn write_catalog(dir: &Path) -> PathBuf {
    let catalog = dir.join("firmware");
    std::fs::create_dir(&catalog).unwrap();
    std::fs::write(
        catalog.join("60-edk2-x86_64.json"),
        r#"{
    "description": "UEFI firmware for x86_64",
    "interface-types": ["uefi"],
    "mapping": {
        "device": "flash",
        "executable": { "filename": "/usr/share/qemu/edk2-x86_64-code.fd", "format": "raw" },
        "nvram-template": { "filename": "/usr/share/qemu/edk2-i386-vars.fd", "format": "raw" }
    },
    "targets": [{ "architecture": "x86_64", "machines": ["pc-i440fx-*", "pc-q35-*"] }],
    "features": ["acpi-s3"],
    "tags": []
}"#,
    )
    .unwrap();
    catalog
}

fn write_inputs(dir: &Path) -> (PathBuf, PathBuf) {
    let domain = dir.join("domain.json");
    std::fs::write(
        &domain,
        r#"{
    "name": "legacy-vm",
    "domain_type": "kvm",
    "vcpus": 4,
    "os": {
        "arch": "x86_64",
        "machine": "pc-q35-5.0",
        "loader": { "path": "/usr/share/OVMF/OVMF_CODE.fd", "readonly": true }
    }
}"#,
    )
    .unwrap();
    let caps = dir.join("caps.json");
    std::fs::write(
        &caps,
        r#"{
    "guests": [{
        "os_type": "hvm",
        "arch": "x86_64",
        "emulator": "/usr/bin/qemu-system-x86_64",
        "machines": [{ "name": "pc-q35-8.2", "max_cpus": 288 }],
        "domain_types": ["kvm"]
    }]
}"#,
    )
    .unwrap();
    (domain, caps)
}

#[test]
fn cli_version_exits_zero() {
    let output = vmshift_bin().arg("--version").output().unwrap();
    assert!(output.status.success(), "vmshift --version must exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("vmshift"), "version output: {stdout}");
}

#[test]
fn cli_help_lists_commands() {
    let output = vmshift_bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("convert"));
    assert!(stdout.contains("firmware"));
    assert!(stdout.contains("transformations"));
}

#[test]
fn cli_firmware_prints_resolved_loader() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(dir.path());
    let output = vmshift_bin()
        .args(["firmware", "--loader", "/usr/share/OVMF/OVMF_CODE_4M.fd"])
        .args(["--arch", "x86_64", "--machine", "pc-q35-5.0"])
        .arg("--firmware-dir")
        .arg(&catalog)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "/usr/share/qemu/edk2-x86_64-code.fd"
    );
}

#[test]
fn cli_firmware_json_includes_nvram_template() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(dir.path());
    let output = vmshift_bin()
        .args(["--json", "firmware", "--loader", "OVMF_CODE.fd"])
        .args(["--arch", "x86_64", "--machine", "pc-i440fx-7.2"])
        .arg("--firmware-dir")
        .arg(&catalog)
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["loader"], "/usr/share/qemu/edk2-x86_64-code.fd");
    assert_eq!(json["nvram_template"], "/usr/share/qemu/edk2-i386-vars.fd");
}

#[test]
fn cli_firmware_unknown_arch_exits_three() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(dir.path());
    let output = vmshift_bin()
        .args(["firmware", "--loader", "/usr/share/OVMF/OVMF_CODE.fd"])
        .args(["--arch", "x87", "--machine", "pc-q35-6.0"])
        .arg("--firmware-dir")
        .arg(&catalog)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no UEFI firmware"), "stderr: {stderr}");
}

#[test]
fn cli_firmware_missing_catalog_exits_three() {
    let output = vmshift_bin()
        .args(["firmware", "--loader", "OVMF_CODE.fd"])
        .args(["--arch", "x86_64", "--machine", "pc-q35-6.0"])
        .args(["--firmware-dir", "/nonexistent/vmshift-firmware"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn cli_convert_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(dir.path());
    let (domain, caps) = write_inputs(dir.path());
    let out = dir.path().join("converted.json");

    let output = vmshift_bin()
        .arg("convert")
        .arg(&domain)
        .arg("--capabilities")
        .arg(&caps)
        .arg("--firmware-dir")
        .arg(&catalog)
        .arg("--output")
        .arg(&out)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let converted: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(converted["os"]["machine"], "pc-q35-8.2");
    assert_eq!(
        converted["os"]["loader"]["path"],
        "/usr/share/qemu/edk2-x86_64-code.fd"
    );
    assert_eq!(converted["emulator"], "/usr/bin/qemu-system-x86_64");
}

#[test]
fn cli_convert_to_stdout_with_disabled_firmware() {
    let dir = tempfile::tempdir().unwrap();
    let (domain, caps) = write_inputs(dir.path());

    let output = vmshift_bin()
        .arg("convert")
        .arg(&domain)
        .arg("--capabilities")
        .arg(&caps)
        .args(["--firmware-dir", "/nonexistent/vmshift-firmware"])
        .args(["--disable", "firmware"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let converted: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        converted["os"]["loader"]["path"],
        "/usr/share/OVMF/OVMF_CODE.fd"
    );
}

#[test]
fn cli_convert_unknown_disable_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (domain, caps) = write_inputs(dir.path());
    let output = vmshift_bin()
        .arg("convert")
        .arg(&domain)
        .arg("--capabilities")
        .arg(&caps)
        .args(["--disable", "no-such-step", "--dry-run"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn cli_convert_dry_run_lists_steps() {
    let dir = tempfile::tempdir().unwrap();
    let (domain, caps) = write_inputs(dir.path());
    let output = vmshift_bin()
        .args(["--json", "convert"])
        .arg(&domain)
        .arg("--capabilities")
        .arg(&caps)
        .args(["--disable", "cpu-model", "--dry-run"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 7);
    let cpu = rows.iter().find(|r| r["name"] == "cpu-model").unwrap();
    assert_eq!(cpu["active"], false);
}

#[test]
fn cli_convert_bad_domain_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let (_, caps) = write_inputs(dir.path());
    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, "{ \"name\": ").unwrap();
    let output = vmshift_bin()
        .arg("convert")
        .arg(&bad)
        .arg("--capabilities")
        .arg(&caps)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn cli_transformations_respects_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[pipeline]\ndisabled = [\"vcpu-limit\"]\n").unwrap();
    let output = vmshift_bin()
        .arg("--config")
        .arg(&config)
        .args(["--json", "transformations"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        [
            "domain-type",
            "emulator",
            "machine-type",
            "vcpu-limit",
            "cpu-model",
            "firmware",
            "disk-format"
        ]
    );
    assert_eq!(rows[3]["active"], false);
    assert_eq!(rows[0]["active"], true);
}

#[test]
fn cli_bad_settings_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[pipeline\n").unwrap();
    let output = vmshift_bin()
        .arg("--config")
        .arg(&config)
        .arg("transformations")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn cli_completions_bash() {
    let output = vmshift_bin().args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("vmshift"));
}

mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_FIRMWARE_ERROR, EXIT_INPUT_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;
use vmshift_schema::Settings;

#[derive(Debug, Parser)]
#[command(
    name = "vmshift",
    version,
    about = "Convert virtual machine configurations between virtualization hosts"
)]
struct Cli {
    /// Path to the settings file (defaults to ~/.config/vmshift/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert a domain configuration for this host.
    Convert {
        /// Path to the source domain configuration (JSON).
        domain: PathBuf,
        /// Host capabilities document (JSON).
        #[arg(long)]
        capabilities: PathBuf,
        /// Disk image metadata list (JSON).
        #[arg(long)]
        disks: Option<PathBuf>,
        /// Firmware descriptor directory (overrides settings).
        #[arg(long)]
        firmware_dir: Option<PathBuf>,
        /// Disable a transformation by name (repeatable).
        #[arg(long = "disable")]
        disabled: Vec<String>,
        /// Write the converted configuration here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Show the transformations that would run without applying them.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Resolve a source UEFI loader to locally installed firmware.
    Firmware {
        /// Loader path from the source configuration.
        #[arg(long)]
        loader: PathBuf,
        /// Guest architecture, e.g. x86_64.
        #[arg(long)]
        arch: String,
        /// Guest machine type, e.g. pc-q35-8.2.
        #[arg(long)]
        machine: String,
        /// Firmware descriptor directory (overrides settings).
        #[arg(long)]
        firmware_dir: Option<PathBuf>,
    },
    /// List the built-in transformations and whether they are enabled.
    Transformations,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("VMSHIFT_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("error: {msg}");
            return ExitCode::from(EXIT_INPUT_ERROR);
        }
    };
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Convert {
            domain,
            capabilities,
            disks,
            firmware_dir,
            disabled,
            output,
            dry_run,
        } => commands::convert::run(
            &settings,
            &commands::convert::ConvertOptions {
                domain,
                capabilities,
                disks,
                firmware_dir,
                disabled,
                output,
                dry_run,
            },
            json_output,
        ),
        Commands::Firmware {
            loader,
            arch,
            machine,
            firmware_dir,
        } => commands::firmware::run(
            &settings,
            &loader,
            &arch,
            &machine,
            firmware_dir.as_deref(),
            json_output,
        ),
        Commands::Transformations => commands::transformations::run(&settings, json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("input error:") || msg.starts_with("settings error:") {
                EXIT_INPUT_ERROR
            } else if msg.starts_with("firmware error:") {
                EXIT_FIRMWARE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

fn load_settings(path: Option<&std::path::Path>) -> Result<Settings, String> {
    let settings = match path {
        Some(p) => Settings::load(p),
        None => Settings::load_default(),
    };
    settings.map_err(|e| format!("settings error: {e}"))
}

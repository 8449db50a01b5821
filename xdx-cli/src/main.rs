use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use xdx_core::Config;

mod commands;

#[derive(Parser)]
#[command(name = "xdx")]
#[command(about = "Inspect XDXCT GPUs and vGPU (mdev) devices", long_about = None)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// PCI device root (default: /sys/bus/pci/devices)
    #[arg(long, global = true)]
    pci_root: Option<PathBuf>,

    /// mdev parent registry (default: /sys/class/mdev_bus)
    #[arg(long, global = true)]
    mdev_bus_root: Option<PathBuf>,

    /// mdev instance root (default: /sys/bus/mdev/devices)
    #[arg(long, global = true)]
    mdev_device_root: Option<PathBuf>,

    /// pci.ids database used to name devices
    #[arg(long, global = true)]
    pci_ids: Option<PathBuf>,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List XDXCT GPUs
    Gpus,

    /// Show one GPU
    Gpu {
        /// Position in the `gpus` listing
        #[arg(short, long, conflicts_with = "address", required_unless_present = "address")]
        index: Option<usize>,

        /// PCI address (e.g., 0000:01:00.0)
        #[arg(short, long)]
        address: Option<String>,
    },

    /// List vGPU (mdev) instances
    Mdevs,

    /// List GPUs that can host vGPUs
    Parents {
        /// Read the kernel's mdev bus registry instead of scanning the PCI bus
        #[arg(long)]
        mdev_bus: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    xdx_core::observability::init(level)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Gpus => commands::gpu::list(&config, cli.json),
        Commands::Gpu { index, address } => {
            commands::gpu::show(&config, index, address.as_deref(), cli.json)
        }
        Commands::Mdevs => commands::mdev::list(&config, cli.json),
        Commands::Parents { mdev_bus } => commands::mdev::parents(&config, mdev_bus, cli.json),
    }
}

/// Defaults, then the config file, then environment, then flags.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    }
    .with_env_overrides();

    if let Some(root) = &cli.pci_root {
        config.pci_devices_root = root.clone();
    }
    if let Some(root) = &cli.mdev_bus_root {
        config.mdev_bus_root = root.clone();
    }
    if let Some(root) = &cli.mdev_device_root {
        config.mdev_device_root = root.clone();
    }
    if let Some(path) = &cli.pci_ids {
        config.pci_ids_path = Some(path.clone());
    }

    Ok(config)
}

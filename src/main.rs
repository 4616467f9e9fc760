//! netcfg - menu-driven configuration for Cisco-style routers and switches
//!
//! netcfg opens an SSH shell on a device from the inventory, enters
//! configuration mode, and sends command blocks built from the answers the
//! operator gives in the menus.
//!
//! # Features
//!
//! - **Routers**: HSRP, DHCP server, RIPv2
//! - **Switches**: VLANs, port security, Rapid PVST+ root bridges
//! - **Multilayer switches**: HSRP as well
//!
//! # Quick Start
//!
//! ```text
//! netcfg                          # Inventory from config.toml or ./deviceDetails.json
//! netcfg -i lab/devices.json      # Explicit inventory
//! RUST_LOG=debug netcfg           # Verbose log file
//! ```
//!
//! # Limitations
//!
//! Output is read after fixed delays (see `[settle]` in the config file), so
//! a slow device may show partial output. Device output is printed as-is and
//! not checked for errors.

mod commands;
mod config;
mod core;
mod device;
mod inventory;
mod ui;

use std::env;
use std::io;
use std::path::PathBuf;

use anyhow::Context;
use crossterm::tty::IsTty;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::core::session::Backend;
use crate::inventory::Inventory;
use crate::ui::{App, Prompter};

/// Command line options
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    /// Explicit config file
    config: Option<PathBuf>,
    /// Inventory override
    inventory: Option<PathBuf>,
    /// Debug logging
    verbose: bool,
    help: bool,
    version: bool,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    eprintln!("netcfg {}", VERSION);
}

fn print_help() {
    eprintln!("netcfg {} - Configure Cisco-style routers and switches over SSH", VERSION);
    eprintln!();
    eprintln!("Usage: netcfg [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -i, --inventory <PATH>  Device inventory (JSON)");
    eprintln!("  -c, --config <PATH>     Config file (default: ~/.netcfg/config.toml)");
    eprintln!("      --verbose           Debug logging");
    eprintln!("  -v, --version           Show version");
    eprintln!("  -h, --help              Show this help");
    eprintln!();
    eprintln!("Inventory format:");
    eprintln!("  [{{\"name\": \"R1\", \"ip\": \"192.168.1.1\", \"username\": \"admin\",");
    eprintln!("    \"password\": \"...\", \"privileged_password\": \"...\", \"type\": \"router\"}}]");
    eprintln!();
    eprintln!("Logs: ~/.netcfg/netcfg.log (level from RUST_LOG, default info)");
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => parsed.help = true,
            "-v" | "--version" => parsed.version = true,
            "--verbose" => parsed.verbose = true,
            "-i" | "--inventory" => {
                i += 1;
                let path = args.get(i).ok_or("Missing inventory path")?;
                parsed.inventory = Some(PathBuf::from(path));
            }
            "-c" | "--config" => {
                i += 1;
                let path = args.get(i).ok_or("Missing config path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(parsed)
}

/// Install the process-wide subscriber; call once before any session exists
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let log_path = config::app_dir()
        .map(|dir| dir.join("netcfg.log"))
        .unwrap_or_else(|| PathBuf::from("netcfg.log"));

    // Open log file (append mode)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false);

    // Menus own stdout; fall back to stderr only without a log file
    let _ = match log_file {
        Some(file) => builder.with_writer(std::sync::Mutex::new(file)).try_init(),
        None => builder.with_writer(io::stderr).try_init(),
    };
}

fn main() -> anyhow::Result<()> {
    let raw: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    if args.help {
        print_help();
        return Ok(());
    }
    if args.version {
        print_version();
        return Ok(());
    }

    init_logging(args.verbose);
    info!("netcfg {} starting...", VERSION);

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    if let Some(inventory) = args.inventory {
        config.inventory = inventory;
    }

    let inventory = Inventory::load(&config.inventory).context("Error loading device data")?;
    if inventory.is_empty() {
        warn!("Inventory {} contains no devices", config.inventory.display());
    }
    info!("{} devices available", inventory.len());

    let backend = Backend::ssh(config.ssh.port, config.settle_delays());

    let stdout = io::stdout();
    let color = config.ui.color && stdout.is_tty();
    let prompter = Prompter::new(io::stdin().lock(), stdout, color);

    let mut app = App::new(inventory, config, backend, prompter);
    app.run().context("terminal I/O failed")?;

    info!("netcfg exiting");
    Ok(())
}

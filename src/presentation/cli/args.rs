//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// seadac - minimal demo for the SeaDAC/SeaMAX host access library
///
/// Opens a session against a connection string and performs a single
/// read or write. Not a diagnostic tool — see the crate docs for the
/// full Session API.
#[derive(Parser, Debug)]
#[command(name = "seadac")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Optional TOML config file providing defaults for connection/delay
    #[arg(long, default_value = "seadac.toml")]
    pub config: PathBuf,

    /// Connection string, e.g. sealevel_rtu:///dev/ttyUSB0
    #[arg(long)]
    pub connection: Option<String>,

    /// Inter-message throttle delay in milliseconds (must be >= 1)
    #[arg(long)]
    pub delay_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read holding registers from a slave
    Read {
        #[arg(long)]
        slave: u8,
        #[arg(long)]
        start: u16,
        #[arg(long, default_value = "1")]
        qty: u16,
    },
    /// Write a single holding register on a slave
    Write {
        #[arg(long)]
        slave: u8,
        #[arg(long)]
        start: u16,
        #[arg(long)]
        value: u16,
    },
}

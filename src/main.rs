//! seadac - minimal demo entry point for the SeaDAC/SeaMAX host library.

use clap::Parser;
use log::info;

use seadac_rs::presentation::cli::{self, args::Args};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    info!("seadac-rs v{}", env!("CARGO_PKG_VERSION"));

    cli::execute(args)?;
    Ok(())
}

//! CLI presentation layer — entry point for the demo binary.

pub mod args;
pub mod config;

use colored::Colorize;
use log::info;

use crate::application::Session;
use crate::domain::{ReadKind, SlaveId, StartAddress, WriteKind};
use crate::error::{Error, Result};
use args::{Args, Command};
use config::Config;

/// Execute the command specified by CLI arguments, merging them over the
/// optional config file (CLI flags win).
pub fn execute(args: Args) -> Result<()> {
    let config = Config::load(&args.config)?;

    let connection = args
        .connection
        .or(config.connection)
        .ok_or_else(|| Error::InvalidArgument("no connection string given (--connection or config)".into()))?;
    let delay_ms = args.delay_ms.or(config.delay_ms).unwrap_or(1);

    let session = Session::create();
    session.open(&connection)?;
    session.set_intermessage_delay(delay_ms)?;
    info!("opened {connection}");

    match args.command {
        Command::Read { slave, start, qty } => {
            let mut out = vec![0u8; qty as usize * 2];
            let n = session.read(
                SlaveId::new(slave)?,
                ReadKind::HoldingRegisters,
                StartAddress(start),
                qty,
                &mut out,
            )?;
            println!("read {n} bytes: {}", hex::encode_upper(&out[..n]));
        }
        Command::Write { slave, start, value } => {
            let n = session.write(
                SlaveId::new(slave)?,
                WriteKind::HoldingRegisters,
                StartAddress(start),
                1,
                &value.to_be_bytes(),
            )?;
            println!("wrote {n} bytes");
        }
    }

    session.close()?;
    println!("{}", "done".green().bold());
    Ok(())
}

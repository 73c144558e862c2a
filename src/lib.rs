//! seadac-rs
//!
//! Host-side access library for the SeaDAC/SeaMAX family of industrial
//! digital/analog I/O modules, reachable over a serial RTU line, a TCP
//! fieldbus stream, or a USB-attached synchronous-serial bridge chip.
//!
//! # Architecture
//!
//! - [`domain`]: protocol value types and the function-code/ioctl dispatch
//!   tables.
//! - [`infrastructure`]: the frame codec, the three transports, and the USB
//!   bridge command assembler.
//! - [`application`]: the public [`Session`](application::Session) object
//!   and the extended A/D probe built on top of it.
//! - [`presentation`]: the connection-string dispatcher and the demo CLI.
//!
//! # Example
//!
//! ```no_run
//! use seadac_rs::application::Session;
//! use seadac_rs::domain::{ReadKind, SlaveId, StartAddress};
//!
//! let session = Session::create();
//! session.open("sealevel_tcp://192.168.1.50")?;
//! let mut out = [0u8; 2];
//! session.read(SlaveId::new(1)?, ReadKind::HoldingRegisters, StartAddress(1), 1, &mut out)?;
//! # Ok::<(), seadac_rs::Error>(())
//! ```

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;

pub use error::{Error, Result};

//! USB bridge infrastructure: opcode assembly, raw device access, and
//! transaction execution for the synchronous-serial (I2C-emulation) bridge
//! products (§4.2, §6).

pub mod assembler;
pub mod driver;
pub mod executor;

pub use assembler::{ChipState, CommandBuffer};
pub use driver::{NusbBridgeDriver, UsbBridgeDriver};
pub use executor::execute;

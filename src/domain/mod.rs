//! Domain Layer - Core Protocol Types
//!
//! This layer contains the pure value types and dispatch tables for the
//! fieldbus protocol. It has NO dependencies on infrastructure or
//! presentation layers.

pub mod function_code;
pub mod ioctl;
pub mod types;

pub use function_code::{FunctionCode, ReadKind, WriteKind, READ_FUNCTIONS, WRITE_FUNCTIONS};
pub use ioctl::{IoctlKind, IOCTL_FUNCTIONS};
pub use types::*;

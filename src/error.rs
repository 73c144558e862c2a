//! Error types for seadac-rs
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for seadac-rs
#[derive(Error, Debug)]
pub enum Error {
    /// A transport is already open on this session, or the bus is in use
    #[error("session is busy: {0}")]
    Busy(String),

    /// Malformed connection string, bad function selector, out-of-range delay, ...
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Quantity/payload would overflow a frame or a fixed-size buffer
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Hostname resolution failed, or the serial device could not be opened
    #[error("not found: {0}")]
    NotFound(String),

    /// Product id not recognised, or the operation does not apply to this transport
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Underlying OS read/write failed or returned short
    #[error("transport I/O error: {0}")]
    TransportIo(String),

    /// std::io::Error from the serial or TCP transport
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// nusb device/open error from the USB bridge transport
    #[error("USB error: {0}")]
    Usb(#[from] nusb::Error),

    /// nusb transfer error from the USB bridge transport
    #[error("USB transfer error: {0}")]
    UsbTransfer(#[from] nusb::transfer::TransferError),

    /// Response shorter than required, CRC mismatch, or an unflagged fcode mismatch
    #[error("framing error: {0}")]
    FramingError(String),

    /// Response echoed the function code with the high bit set
    #[error("protocol exception: 0x{0:02X}")]
    ProtocolException(u8),

    /// Allocation/accumulation limit exceeded (see the 220-byte serial response cap)
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// Extended A/D probe received a value outside every classification band
    #[error("not ready: {0}")]
    NotReady(String),
}

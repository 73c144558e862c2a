//! Transport — the tagged variant carrying exactly one concrete I/O carrier
//! per session lifetime between open and close (§4.3).

pub mod serial;
pub mod tcp;
pub mod usb;

use crate::domain::UsbProductId;
use crate::error::{Error, Result};
use crate::infrastructure::usb_bridge::{ChipState, CommandBuffer, UsbBridgeDriver};

/// One opened carrier. `None` before `open()`/after `close()`.
pub enum Transport {
    None,
    Serial(serial::SerialTransport),
    Tcp(tcp::TcpTransport),
    Usb {
        driver: Box<dyn UsbBridgeDriver + Send>,
        product: UsbProductId,
        chip: ChipState,
        buffer: CommandBuffer,
    },
    /// Test-only carrier (see [`fake::FakeTransport`]).
    Fake(fake::FakeTransport),
}

impl Transport {
    pub fn is_open(&self) -> bool {
        !matches!(self, Transport::None)
    }

    /// Send a byte buffer over the Serial or TCP carrier. Not meaningful for
    /// `Usb`, which is driven through the command-assembler path instead.
    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            Transport::Serial(t) => t.send(bytes),
            Transport::Tcp(t) => t.send(bytes),
            Transport::None => Err(Error::NotReady("session is not open".into())),
            Transport::Usb { .. } => Err(Error::Unsupported(
                "raw send/recv is not available on the USB bridge transport".into(),
            )),
            Transport::Fake(t) => t.send(bytes),
        }
    }

    /// Receive exactly `expected_len` bytes, accumulating across reads.
    pub fn recv(&mut self, expected_len: usize) -> Result<Vec<u8>> {
        match self {
            Transport::Serial(t) => t.recv(expected_len),
            Transport::Tcp(t) => t.recv(expected_len),
            Transport::None => Err(Error::NotReady("session is not open".into())),
            Transport::Usb { .. } => Err(Error::Unsupported(
                "raw send/recv is not available on the USB bridge transport".into(),
            )),
            Transport::Fake(t) => t.recv(expected_len),
        }
    }

    pub fn close(&mut self) -> Result<()> {
        let old = std::mem::replace(self, Transport::None);
        match old {
            Transport::Serial(mut t) => t.close(),
            Transport::Tcp(_) | Transport::None => Ok(()),
            Transport::Usb { .. } => Ok(()),
            Transport::Fake(_) => Ok(()),
        }
    }
}

/// Exercises `Session` dispatch logic without real OS handles, modeled
/// on the flash programmer's `MockProgrammer`. Not `#[cfg(test)]`-gated so
/// integration tests under `tests/` can construct one too.
pub mod fake {
    use super::*;
    use std::collections::VecDeque;

    /// Exercises `Session` dispatch logic without real OS handles, modeled
    /// on the flash programmer's `MockProgrammer`.
    #[derive(Debug, Default)]
    pub struct FakeTransport {
        pub sent: Vec<Vec<u8>>,
        pub pending: VecDeque<u8>,
        pub queued_responses: VecDeque<Vec<u8>>,
        /// `Some` makes this fake behave like a TCP carrier for transaction-id
        /// purposes; `None` behaves like a Serial carrier.
        pub next_txid: Option<u16>,
    }

    impl FakeTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn tcp() -> Self {
            Self {
                next_txid: Some(0),
                ..Self::default()
            }
        }

        pub fn queue_response(&mut self, bytes: Vec<u8>) {
            self.queued_responses.push_back(bytes);
        }

        pub(super) fn send(&mut self, bytes: &[u8]) -> Result<()> {
            self.sent.push(bytes.to_vec());
            if let Some(next) = self.queued_responses.pop_front() {
                self.pending.extend(next);
            }
            Ok(())
        }

        pub(super) fn recv(&mut self, expected_len: usize) -> Result<Vec<u8>> {
            if self.pending.len() < expected_len {
                return Err(Error::TransportIo(format!(
                    "fake transport starved: wanted {expected_len}, have {}",
                    self.pending.len()
                )));
            }
            Ok(self.pending.drain(..expected_len).collect())
        }

        pub fn next_txid(&mut self) -> Option<u16> {
            let id = self.next_txid?;
            self.next_txid = Some(id.wrapping_add(1));
            Some(id)
        }
    }
}

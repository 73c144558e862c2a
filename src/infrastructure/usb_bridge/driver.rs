//! USB bridge device access
//!
//! Abstract interface over a raw USB bulk endpoint pair, plus the real
//! `nusb`-backed implementation and a test double. Mirrors the host-side
//! bulk transfer pattern of the CH341A driver, generalized to the
//! synchronous-serial bridge's bulk-out/bulk-in endpoints.

use std::time::Duration;

use futures_lite::future::{block_on, or};
use log::trace;
use nusb::transfer::RequestBuffer;

use crate::error::{Error, Result};

/// Bulk endpoints on the synchronous-serial bridge chip.
const EP_OUT: u8 = 0x02;
const EP_IN: u8 = 0x82;

/// How long to wait for the bridge's reply before giving up.
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// The bridge is an FTDI MPSSE part; FIFO purge is the vendor SIO_RESET
/// request libftdi's `ftdi_usb_purge_buffers` issues, not a bulk-transfer
/// operation. `bRequest` is always 0; `wValue` selects which FIFO.
const SIO_RESET_REQUEST: u8 = 0x00;
const SIO_RESET_PURGE_RX: u16 = 0x01;
const SIO_RESET_PURGE_TX: u16 = 0x02;

/// Abstract interface for a USB bridge device: write the assembled opcode
/// stream, read back exactly the expected reply-byte count.
pub trait UsbBridgeDriver {
    /// Human-readable identity, for logging.
    fn name(&self) -> &str;

    /// Write the full opcode stream in one bulk transfer.
    fn write(&mut self, opcodes: &[u8]) -> Result<()>;

    /// Read exactly `len` reply bytes.
    fn read(&mut self, len: usize) -> Result<Vec<u8>>;

    /// Discard any stale bytes sitting in the device's FIFOs before a new
    /// transaction begins.
    fn purge(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Real bridge device, reached over a claimed `nusb` interface.
pub struct NusbBridgeDriver {
    _device: nusb::Device,
    interface: nusb::Interface,
}

impl NusbBridgeDriver {
    /// Open the first device matching `vid`/`pid` and claim interface 0.
    pub fn open(vid: u16, pid: u16) -> Result<Self> {
        let info = nusb::list_devices()?
            .find(|d| d.vendor_id() == vid && d.product_id() == pid)
            .ok_or_else(|| {
                Error::NotFound(format!("no USB device matching {vid:04x}:{pid:04x}"))
            })?;
        let device = info.open()?;
        let interface = device.claim_interface(0)?;
        Ok(Self {
            _device: device,
            interface,
        })
    }
}

impl UsbBridgeDriver for NusbBridgeDriver {
    fn name(&self) -> &str {
        "synchronous-serial USB bridge"
    }

    fn write(&mut self, opcodes: &[u8]) -> Result<()> {
        trace!("USB OUT: {:02X?}", opcodes);
        let result = block_on(async { self.interface.bulk_out(EP_OUT, opcodes.to_vec()).await });
        result.status?;
        Ok(())
    }

    fn read(&mut self, len: usize) -> Result<Vec<u8>> {
        let transfer = self.interface.bulk_in(EP_IN, RequestBuffer::new(len));
        let timeout = async {
            async_io::Timer::after(READ_TIMEOUT).await;
        };

        let result = block_on(or(
            async {
                let r = transfer.await;
                Some(r)
            },
            async {
                timeout.await;
                None
            },
        ));

        let data = match result {
            Some(transfer_result) => transfer_result.into_result()?,
            None => {
                return Err(Error::TransportIo(format!(
                    "USB bridge read timed out after {READ_TIMEOUT:?}"
                )))
            }
        };

        trace!("USB IN: {:02X?}", data);
        if data.len() < len {
            return Err(Error::TransportIo(format!(
                "short USB read: expected {len} bytes, got {}",
                data.len()
            )));
        }
        Ok(data)
    }

    fn purge(&mut self) -> Result<()> {
        self.sio_reset(SIO_RESET_PURGE_RX)?;
        self.sio_reset(SIO_RESET_PURGE_TX)
    }
}

impl NusbBridgeDriver {
    /// Issue the FTDI vendor SIO_RESET control request, purging the chip's
    /// RX or TX FIFO. The real device-side equivalent of `purge()`'s
    /// default no-op.
    fn sio_reset(&self, which_fifo: u16) -> Result<()> {
        let result = block_on(async {
            self.interface
                .control_out(nusb::transfer::ControlOut {
                    control_type: nusb::transfer::ControlType::Vendor,
                    recipient: nusb::transfer::Recipient::Device,
                    request: SIO_RESET_REQUEST,
                    value: which_fifo,
                    index: 0,
                    data: &[],
                })
                .await
        });
        result.status?;
        Ok(())
    }
}

pub use fake::FakeUsbBridgeDriver;

/// Test double for [`UsbBridgeDriver`]. Kept as an ordinary public module
/// (not `#[cfg(test)]`-gated) so integration tests under `tests/` can reach
/// it too, the same way the flash programmer's `MockProgrammer` is exposed.
pub mod fake {
    use super::*;
    use std::collections::VecDeque;

    /// Records every write and serves queued reply chunks in FIFO order,
    /// modeled on the flash programmer's mock.
    #[derive(Debug, Default)]
    pub struct FakeUsbBridgeDriver {
        pub writes: Vec<Vec<u8>>,
        pub replies: VecDeque<Vec<u8>>,
        pub purge_count: usize,
    }

    impl FakeUsbBridgeDriver {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn queue_reply(&mut self, bytes: Vec<u8>) {
            self.replies.push_back(bytes);
        }
    }

    impl UsbBridgeDriver for FakeUsbBridgeDriver {
        fn name(&self) -> &str {
            "fake bridge"
        }

        fn write(&mut self, opcodes: &[u8]) -> Result<()> {
            self.writes.push(opcodes.to_vec());
            Ok(())
        }

        fn read(&mut self, len: usize) -> Result<Vec<u8>> {
            let chunk = self.replies.pop_front().unwrap_or_default();
            if chunk.len() < len {
                return Err(Error::TransportIo(format!(
                    "short USB read: expected {len} bytes, got {}",
                    chunk.len()
                )));
            }
            Ok(chunk)
        }

        fn purge(&mut self) -> Result<()> {
            self.purge_count += 1;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_serves_queued_replies_in_order() {
        let mut fake = FakeUsbBridgeDriver::new();
        fake.queue_reply(vec![0xAA, 0xBB]);
        fake.write(&[0x01, 0x02]).unwrap();
        let reply = fake.read(2).unwrap();
        assert_eq!(reply, vec![0xAA, 0xBB]);
        assert_eq!(fake.writes, vec![vec![0x01, 0x02]]);
    }

    #[test]
    fn fake_reports_short_read() {
        let mut fake = FakeUsbBridgeDriver::new();
        fake.queue_reply(vec![0xAA]);
        assert!(fake.read(2).is_err());
    }
}

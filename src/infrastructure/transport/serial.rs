//! Serial (RTU) transport: a real serial line at 9600 8N1 with a 100 ms
//! per-byte timeout, accessed through the `serialport` crate.

use std::io::{Read, Write};
use std::time::Duration;

use crate::error::{Error, Result};

/// Accumulating a response past this many bytes returns `OutOfMemory`,
/// preserving a documented limitation of the original implementation even
/// though the wire protocol permits payloads up to roughly 253 bytes.
const MAX_RESPONSE_BYTES: usize = 220;

const BAUD_RATE: u32 = 9600;
const BYTE_TIMEOUT: Duration = Duration::from_millis(100);

pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTransport {
    /// Open `path` at 9600 8N1 with a 100 ms per-byte timeout.
    pub fn open(path: &str) -> Result<Self> {
        let port = serialport::new(path, BAUD_RATE)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(BYTE_TIMEOUT)
            .open()
            .map_err(|e| Error::TransportIo(format!("failed to open serial port {path}: {e}")))?;
        Ok(Self { port })
    }

    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.port
            .write_all(bytes)
            .map_err(|e| Error::TransportIo(format!("serial write failed: {e}")))
    }

    /// Accumulate bytes until `expected_len` is reached, subject to the
    /// 220-byte cap.
    pub fn recv(&mut self, expected_len: usize) -> Result<Vec<u8>> {
        if expected_len > MAX_RESPONSE_BYTES {
            return Err(Error::OutOfMemory(format!(
                "response of {expected_len} bytes exceeds the {MAX_RESPONSE_BYTES}-byte accumulation cap"
            )));
        }

        let mut buf = vec![0u8; expected_len];
        let mut filled = 0;
        while filled < expected_len {
            match self.port.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(Error::TransportIo(
                        "serial port closed before response completed".into(),
                    ))
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) => return Err(Error::TransportIo(format!("serial read failed: {e}"))),
            }
        }
        Ok(buf)
    }

    pub fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

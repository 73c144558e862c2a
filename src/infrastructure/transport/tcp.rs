//! TCP transport: the fieldbus framing carried over a plain `TcpStream`.

use std::io::{Read, Write};
use std::net::TcpStream;

use crate::error::{Error, Result};

const DEFAULT_PORT: u16 = 502;

pub struct TcpTransport {
    stream: TcpStream,
    next_txid: u16,
}

impl TcpTransport {
    /// Connect to `host`, or `host:port` if a port is present.
    pub fn connect(host: &str) -> Result<Self> {
        let addr = if host.contains(':') {
            host.to_string()
        } else {
            format!("{host}:{DEFAULT_PORT}")
        };
        let stream = TcpStream::connect(&addr)
            .map_err(|e| Error::TransportIo(format!("failed to connect to {addr}: {e}")))?;
        Ok(Self { stream, next_txid: 0 })
    }

    /// The transaction id to echo-check the next response against, advancing
    /// the counter modulo 2^16.
    pub fn next_txid(&mut self) -> u16 {
        let id = self.next_txid;
        self.next_txid = self.next_txid.wrapping_add(1);
        id
    }

    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream
            .write_all(bytes)
            .map_err(|e| Error::TransportIo(format!("TCP write failed: {e}")))
    }

    pub fn recv(&mut self, expected_len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; expected_len];
        self.stream
            .read_exact(&mut buf)
            .map_err(|e| Error::TransportIo(format!("TCP read failed: {e}")))?;
        Ok(buf)
    }
}

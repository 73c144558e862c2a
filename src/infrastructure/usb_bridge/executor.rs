//! Execution of an assembled [`CommandBuffer`] against a [`UsbBridgeDriver`].
//!
//! Purges stale FIFO contents, writes the opcode stream in one transfer,
//! reads exactly the expected reply length, and redistributes reply bytes
//! to their registered slot offsets.

use crate::error::{Error, Result};
use crate::infrastructure::usb_bridge::assembler::CommandBuffer;
use crate::infrastructure::usb_bridge::driver::UsbBridgeDriver;

/// Run `buf` against `driver`, returning the data byte for each registered
/// slot, in registration order.
pub fn execute(driver: &mut dyn UsbBridgeDriver, buf: &CommandBuffer) -> Result<Vec<u8>> {
    driver.purge()?;
    driver.write(buf.opcodes())?;

    let expected = buf.expected_reply_bytes();
    let reply = driver.read(expected)?;
    if reply.len() < expected {
        return Err(Error::TransportIo(format!(
            "bridge returned {} reply bytes, expected {expected}",
            reply.len()
        )));
    }

    buf.reply_offsets()
        .iter()
        .map(|&offset| {
            reply.get(offset).copied().ok_or_else(|| {
                Error::TransportIo(format!("reply offset {offset} out of bounds"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::usb_bridge::assembler::ChipState;
    use crate::infrastructure::usb_bridge::driver::FakeUsbBridgeDriver;

    #[test]
    fn execute_purges_writes_and_dispatches_slots() {
        let mut buf = CommandBuffer::new();
        let mut chip = ChipState::default();
        buf.read_register(&mut chip, 0xE8, 6).unwrap();
        buf.read_register(&mut chip, 0xE8, 7).unwrap();

        let mut driver = FakeUsbBridgeDriver::new();
        driver.queue_reply(vec![0, 0, 0, 0x42, 0, 0, 0, 0x43]);

        let values = execute(&mut driver, &buf).unwrap();
        assert_eq!(values, vec![0x42, 0x43]);
        assert_eq!(driver.purge_count, 1);
        assert_eq!(driver.writes.len(), 1);
        assert_eq!(driver.writes[0], buf.opcodes());
    }

    #[test]
    fn execute_errors_on_short_reply() {
        let mut buf = CommandBuffer::new();
        let mut chip = ChipState::default();
        buf.read_register(&mut chip, 0xE8, 6).unwrap();

        let mut driver = FakeUsbBridgeDriver::new();
        driver.queue_reply(vec![0, 0]);

        assert!(execute(&mut driver, &buf).is_err());
    }
}

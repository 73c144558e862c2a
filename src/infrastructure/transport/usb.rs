//! USB bridge transport bring-up: open-by-VID/PID, read back the pin
//! snapshot, and set the chip into the product's fixed operating mode (§6).

use crate::domain::UsbProductId;
use crate::error::Result;
use crate::infrastructure::usb_bridge::assembler::{build_enter_bitmode, ChipState, CommandBuffer};
use crate::infrastructure::usb_bridge::driver::UsbBridgeDriver;
use crate::infrastructure::usb_bridge::execute;

/// Sealevel Systems vendor id used by every `sealevel_d2x://` product.
pub const VENDOR_ID: u16 = 0x0C52;

/// Bring a freshly opened bridge device into its fixed operating mode for
/// `product`, returning the resulting chip state.
pub fn enter_bitmode(driver: &mut dyn UsbBridgeDriver, product: UsbProductId) -> Result<ChipState> {
    let mut chip = ChipState {
        value: 0,
        direction: product.direction_mask(),
    };

    let mut buf = CommandBuffer::new();
    let snapshot_slot = build_enter_bitmode(&mut buf, &mut chip)?;
    let replies = execute(driver, &buf)?;
    let snapshot = replies[snapshot_slot];

    if product.is_synchronous_serial() {
        chip.value = (snapshot & 0xF0) | 0x03;
        chip.direction = 0xF3;

        let mut reconfigure = CommandBuffer::new();
        reconfigure.push_set_bank1(&chip)?;
        execute(driver, &reconfigure)?;
    }

    Ok(chip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::usb_bridge::driver::FakeUsbBridgeDriver;

    #[test]
    fn plain_bitbang_product_keeps_direction_mask() {
        let mut driver = FakeUsbBridgeDriver::new();
        driver.queue_reply(vec![0x00]);
        let chip = enter_bitmode(&mut driver, UsbProductId::P8111).unwrap();
        assert_eq!(chip.direction, 0xF0);
    }

    #[test]
    fn synchronous_serial_product_reconfigures_from_snapshot() {
        let mut driver = FakeUsbBridgeDriver::new();
        driver.queue_reply(vec![0x50]);
        driver.queue_reply(vec![]);
        let chip = enter_bitmode(&mut driver, UsbProductId::P8126).unwrap();
        assert_eq!(chip.direction, 0xF3);
        assert_eq!(chip.value, 0x53);
    }
}

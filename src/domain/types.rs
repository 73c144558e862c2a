//! Domain value types shared across the protocol core.

use crate::error::{Error, Result};

/// Fieldbus slave id, 1..=247.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlaveId(u8);

impl SlaveId {
    pub fn new(id: u8) -> Result<Self> {
        if (1..=247).contains(&id) {
            Ok(Self(id))
        } else {
            Err(Error::InvalidArgument(format!(
                "slave id {id} out of range 1..=247"
            )))
        }
    }

    pub const fn as_u8(self) -> u8 {
        self.0
    }
}

/// A 1-based starting address as accepted by the public API. The wire always
/// carries `addr - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartAddress(pub u16);

impl StartAddress {
    /// The 0-based value placed on the wire.
    pub fn wire_value(self) -> Result<u16> {
        self.0
            .checked_sub(1)
            .ok_or_else(|| Error::InvalidArgument("starting address must be >= 1".into()))
    }
}

/// PIO line direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PioDirection {
    Input,
    Output,
}

/// Serial comm parameters as exchanged via `ReadCommParams`/`SetCommParams`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommParams {
    pub baud_code: u8,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

/// A/D configuration as exchanged via `GetAdConfig`/`SetAdConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdConfig {
    pub channel: u8,
    pub mode: AdMode,
    pub range: AdRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdMode {
    SingleEnded,
    Differential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdRange {
    Range0To5V,
    Range0To10V,
}

/// Accepted `sealevel_d2x://` USB bridge product ids and their fixed
/// bit-bang direction mask / operating mode, per §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsbProductId {
    P8111,
    P8112,
    P8113,
    P8114,
    P8115,
    P8126,
}

impl UsbProductId {
    pub fn from_hex(id: u16) -> Option<Self> {
        Some(match id {
            0x8111 => UsbProductId::P8111,
            0x8112 => UsbProductId::P8112,
            0x8113 => UsbProductId::P8113,
            0x8114 => UsbProductId::P8114,
            0x8115 => UsbProductId::P8115,
            0x8126 => UsbProductId::P8126,
            _ => return None,
        })
    }

    /// The product id's wire value, as parsed from a `sealevel_d2x://` URL.
    pub const fn wire_id(self) -> u16 {
        match self {
            UsbProductId::P8111 => 0x8111,
            UsbProductId::P8112 => 0x8112,
            UsbProductId::P8113 => 0x8113,
            UsbProductId::P8114 => 0x8114,
            UsbProductId::P8115 => 0x8115,
            UsbProductId::P8126 => 0x8126,
        }
    }

    /// Fixed bit-bang direction mask for this product (§6).
    pub const fn direction_mask(self) -> u8 {
        match self {
            UsbProductId::P8111 | UsbProductId::P8112 => 0xF0,
            UsbProductId::P8113 => 0x00,
            UsbProductId::P8114 | UsbProductId::P8115 => 0xFF,
            UsbProductId::P8126 => 0xF0,
        }
    }

    /// `true` for the 8126, which runs in synchronous-serial (I2C-emulation)
    /// mode instead of plain bit-bang.
    pub const fn is_synchronous_serial(self) -> bool {
        matches!(self, UsbProductId::P8126)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slave_id_accepts_valid_range() {
        assert!(SlaveId::new(1).is_ok());
        assert!(SlaveId::new(247).is_ok());
        assert!(SlaveId::new(0).is_err());
        assert!(SlaveId::new(248).is_err());
    }

    #[test]
    fn start_address_subtracts_one() {
        assert_eq!(StartAddress(1).wire_value().unwrap(), 0);
        assert_eq!(StartAddress(4).wire_value().unwrap(), 3);
        assert!(StartAddress(0).wire_value().is_err());
    }

    #[test]
    fn product_ids_map_to_direction_masks() {
        assert_eq!(UsbProductId::from_hex(0x8111).unwrap().direction_mask(), 0xF0);
        assert_eq!(UsbProductId::from_hex(0x8113).unwrap().direction_mask(), 0x00);
        assert_eq!(UsbProductId::from_hex(0x8115).unwrap().direction_mask(), 0xFF);
        assert!(UsbProductId::from_hex(0x9999).is_none());
    }
}

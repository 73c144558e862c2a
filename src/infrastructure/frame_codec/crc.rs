//! Fieldbus CRC-16 (poly 0xA001, init 0xFFFF, reflected, no final xor — the
//! same parameters as the standard CRC-16/MODBUS catalog entry).

use crc::{Crc, CRC_16_MODBUS};

static FIELDBUS_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// Compute the fieldbus CRC-16 over `data`.
pub fn fieldbus_crc16(data: &[u8]) -> u16 {
    FIELDBUS_CRC.checksum(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        // CRC-16/MODBUS of the single byte 0x01 is a well-known vector.
        assert_eq!(fieldbus_crc16(&[0x01]), 0xF807);
    }

    #[test]
    fn empty_input_is_init_value() {
        assert_eq!(fieldbus_crc16(&[]), 0xFFFF);
    }
}

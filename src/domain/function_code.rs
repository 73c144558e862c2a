//! Fieldbus function codes and the selector-to-opcode translation tables.
//!
//! Per the design notes, this mapping is kept as data, not control flow: the
//! two tables below (`READ_FUNCTIONS`, `WRITE_FUNCTIONS`) and `IOCTL_FUNCTIONS`
//! in [`super::ioctl`] are the contract, callers never hand-encode a function
//! code.

/// A single fieldbus function code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionCode {
    ReadCoils,
    ReadDiscreteInputs,
    ReadHoldingRegisters,
    ReadInputRegisters,
    WriteSingleHoldingRegister,
    WriteMultipleCoils,
    WriteMultipleHoldingRegisters,
    GetDeviceParams,
    SetPioDirection,
    GetPioDirection,
    SetPioValue,
    ReadCommParams,
    SetSlaveAddress,
    SetCommParams,
    SetAdConfig,
    GetAdConfig,
    GetExtendedConfig,
}

impl FunctionCode {
    /// The one-byte wire value of this function code.
    pub const fn wire_value(self) -> u8 {
        match self {
            FunctionCode::ReadCoils => 0x01,
            FunctionCode::ReadDiscreteInputs => 0x02,
            FunctionCode::ReadHoldingRegisters => 0x03,
            FunctionCode::ReadInputRegisters => 0x04,
            FunctionCode::WriteSingleHoldingRegister => 0x06,
            FunctionCode::WriteMultipleCoils => 0x0F,
            FunctionCode::WriteMultipleHoldingRegisters => 0x10,
            FunctionCode::GetDeviceParams => 0x41,
            FunctionCode::SetPioDirection => 0x42,
            FunctionCode::GetPioDirection => 0x43,
            FunctionCode::SetPioValue => 0x44,
            FunctionCode::ReadCommParams => 0x45,
            FunctionCode::SetSlaveAddress => 0x46,
            FunctionCode::SetCommParams => 0x47,
            FunctionCode::SetAdConfig => 0x64,
            FunctionCode::GetAdConfig => 0x65,
            FunctionCode::GetExtendedConfig => 0x66,
        }
    }

    /// Recover a `FunctionCode` from its wire value (the low 7 bits of the
    /// echoed response byte — callers strip the exception high bit first).
    pub fn from_wire_value(value: u8) -> Option<Self> {
        Some(match value {
            0x01 => FunctionCode::ReadCoils,
            0x02 => FunctionCode::ReadDiscreteInputs,
            0x03 => FunctionCode::ReadHoldingRegisters,
            0x04 => FunctionCode::ReadInputRegisters,
            0x06 => FunctionCode::WriteSingleHoldingRegister,
            0x0F => FunctionCode::WriteMultipleCoils,
            0x10 => FunctionCode::WriteMultipleHoldingRegisters,
            0x41 => FunctionCode::GetDeviceParams,
            0x42 => FunctionCode::SetPioDirection,
            0x43 => FunctionCode::GetPioDirection,
            0x44 => FunctionCode::SetPioValue,
            0x45 => FunctionCode::ReadCommParams,
            0x46 => FunctionCode::SetSlaveAddress,
            0x47 => FunctionCode::SetCommParams,
            0x64 => FunctionCode::SetAdConfig,
            0x65 => FunctionCode::GetAdConfig,
            0x66 => FunctionCode::GetExtendedConfig,
            _ => return None,
        })
    }

    /// `true` for functions whose response carries a leading byte-count byte
    /// ahead of the payload (the coil/register read family).
    pub const fn is_counted_read(self) -> bool {
        matches!(
            self,
            FunctionCode::ReadCoils
                | FunctionCode::ReadDiscreteInputs
                | FunctionCode::ReadHoldingRegisters
                | FunctionCode::ReadInputRegisters
        )
    }

    /// `true` for the write family, whose decoded payload is discarded in
    /// favour of a bare success marker.
    pub const fn is_write(self) -> bool {
        matches!(
            self,
            FunctionCode::WriteSingleHoldingRegister
                | FunctionCode::WriteMultipleCoils
                | FunctionCode::WriteMultipleHoldingRegisters
                | FunctionCode::SetPioDirection
                | FunctionCode::SetPioValue
                | FunctionCode::SetSlaveAddress
                | FunctionCode::SetCommParams
                | FunctionCode::SetAdConfig
        )
    }
}

/// `read(... type ...)` selector, 1-based as the public API receives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReadKind {
    Coils = 1,
    DiscreteInputs = 2,
    HoldingRegisters = 3,
    InputRegisters = 4,
    /// Accepted overload: ignores start/range, maps to `ReadCommParams` (0x45).
    /// See the open question in the design notes — this is not a distinct
    /// protocol operation, just a second selector for the same function.
    CommParams = 5,
    DeviceParams = 6,
}

/// Translation table for `read(slave, type, ...)`: index with `type - 1`.
pub const READ_FUNCTIONS: [FunctionCode; 6] = [
    FunctionCode::ReadCoils,
    FunctionCode::ReadDiscreteInputs,
    FunctionCode::ReadHoldingRegisters,
    FunctionCode::ReadInputRegisters,
    FunctionCode::ReadCommParams,
    FunctionCode::GetDeviceParams,
];

impl ReadKind {
    pub fn from_selector(selector: u8) -> Option<Self> {
        Some(match selector {
            1 => ReadKind::Coils,
            2 => ReadKind::DiscreteInputs,
            3 => ReadKind::HoldingRegisters,
            4 => ReadKind::InputRegisters,
            5 => ReadKind::CommParams,
            6 => ReadKind::DeviceParams,
            _ => return None,
        })
    }

    pub fn function_code(self) -> FunctionCode {
        READ_FUNCTIONS[self as usize - 1]
    }
}

/// `write(... type ...)` selector. Only 1, 3 and 6 carry a write function;
/// the rest are illegal on the write path (they are read-only functions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WriteKind {
    Coils = 1,
    HoldingRegisters = 3,
    PioDirection = 6,
}

/// Translation table for `write(slave, type, ...)`: index with `type - 1`.
/// `None` marks a selector that has no write function (illegal on this path).
pub const WRITE_FUNCTIONS: [Option<FunctionCode>; 6] = [
    Some(FunctionCode::WriteMultipleCoils),
    None,
    Some(FunctionCode::WriteSingleHoldingRegister),
    None,
    None,
    Some(FunctionCode::SetPioDirection),
];

impl WriteKind {
    pub fn from_selector(selector: u8) -> Option<Self> {
        Some(match selector {
            1 => WriteKind::Coils,
            3 => WriteKind::HoldingRegisters,
            6 => WriteKind::PioDirection,
            _ => return None,
        })
    }

    /// The function code to send, upgrading 0x06 to 0x10 when writing more
    /// than one holding register.
    pub fn function_code(self, range: u16) -> FunctionCode {
        match self {
            WriteKind::Coils => FunctionCode::WriteMultipleCoils,
            WriteKind::HoldingRegisters if range > 1 => {
                FunctionCode::WriteMultipleHoldingRegisters
            }
            WriteKind::HoldingRegisters => FunctionCode::WriteSingleHoldingRegister,
            WriteKind::PioDirection => FunctionCode::SetPioDirection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_value_round_trips() {
        for fc in [
            FunctionCode::ReadCoils,
            FunctionCode::ReadDiscreteInputs,
            FunctionCode::ReadHoldingRegisters,
            FunctionCode::ReadInputRegisters,
            FunctionCode::WriteSingleHoldingRegister,
            FunctionCode::WriteMultipleCoils,
            FunctionCode::WriteMultipleHoldingRegisters,
            FunctionCode::GetDeviceParams,
            FunctionCode::SetPioDirection,
            FunctionCode::GetPioDirection,
            FunctionCode::SetPioValue,
            FunctionCode::ReadCommParams,
            FunctionCode::SetSlaveAddress,
            FunctionCode::SetCommParams,
            FunctionCode::SetAdConfig,
            FunctionCode::GetAdConfig,
            FunctionCode::GetExtendedConfig,
        ] {
            assert_eq!(FunctionCode::from_wire_value(fc.wire_value()), Some(fc));
        }
    }

    #[test]
    fn read_dispatch_matches_selector_table() {
        let expected = [0x01, 0x02, 0x03, 0x04, 0x45, 0x41];
        for (i, &wire) in expected.iter().enumerate() {
            let kind = ReadKind::from_selector((i + 1) as u8).unwrap();
            assert_eq!(kind.function_code().wire_value(), wire);
        }
    }

    #[test]
    fn write_dispatch_upgrades_to_multi_register() {
        let single = WriteKind::HoldingRegisters.function_code(1);
        let multi = WriteKind::HoldingRegisters.function_code(2);
        assert_eq!(single.wire_value(), 0x06);
        assert_eq!(multi.wire_value(), 0x10);
    }
}

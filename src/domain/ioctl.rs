//! `ioctl()` selector table and the per-selector argument layout.

use super::function_code::FunctionCode;

/// `ioctl(slave, which, ...)` selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IoctlKind {
    ReadCommParams = 1,
    SetSlaveAddress = 2,
    SetCommParams = 3,
    GetPioDirection = 4,
    SetPioValue = 5,
    GetAdConfig = 6,
    SetAdConfig = 7,
    GetExtendedConfig = 8,
    /// Not a wire function: triggers the composed extended A/D probe.
    ExtendedAdProbe = 9,
}

/// Translation table for `ioctl(slave, which, ...)` with `which` in 1..=8.
/// `which == 9` is intercepted by the session before this table is consulted
/// (see [`IoctlKind::ExtendedAdProbe`]).
pub const IOCTL_FUNCTIONS: [FunctionCode; 8] = [
    FunctionCode::ReadCommParams,
    FunctionCode::SetSlaveAddress,
    FunctionCode::SetCommParams,
    FunctionCode::GetPioDirection,
    FunctionCode::SetPioValue,
    FunctionCode::GetAdConfig,
    FunctionCode::SetAdConfig,
    FunctionCode::GetExtendedConfig,
];

impl IoctlKind {
    pub fn from_selector(selector: u8) -> Option<Self> {
        Some(match selector {
            1 => IoctlKind::ReadCommParams,
            2 => IoctlKind::SetSlaveAddress,
            3 => IoctlKind::SetCommParams,
            4 => IoctlKind::GetPioDirection,
            5 => IoctlKind::SetPioValue,
            6 => IoctlKind::GetAdConfig,
            7 => IoctlKind::SetAdConfig,
            8 => IoctlKind::GetExtendedConfig,
            9 => IoctlKind::ExtendedAdProbe,
            _ => return None,
        })
    }

    /// The function code this selector maps to, or `None` for the composed
    /// extended-probe pseudo-selector which has no wire function of its own.
    pub fn function_code(self) -> Option<FunctionCode> {
        if self == IoctlKind::ExtendedAdProbe {
            return None;
        }
        Some(IOCTL_FUNCTIONS[self as usize - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_table_matches_spec_order() {
        let expected = [0x45u8, 0x46, 0x47, 0x43, 0x44, 0x65, 0x64, 0x66];
        for (i, &wire) in expected.iter().enumerate() {
            let kind = IoctlKind::from_selector((i + 1) as u8).unwrap();
            assert_eq!(kind.function_code().unwrap().wire_value(), wire);
        }
    }

    #[test]
    fn selector_nine_has_no_wire_function() {
        assert_eq!(IoctlKind::ExtendedAdProbe.function_code(), None);
    }
}

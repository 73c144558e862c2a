//! Connection-string dispatcher: inspects a `sealevel_*://` prefix and picks
//! one of the three open paths (§4.4, §6).

use crate::domain::UsbProductId;
use crate::error::{Error, Result};

const RTU_PREFIX: &str = "sealevel_rtu://";
const TCP_PREFIX: &str = "sealevel_tcp://";
const USB_PREFIX: &str = "sealevel_d2x://";

/// A connection string resolved to its transport-specific payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedConnection {
    Rtu { path: String },
    Tcp { host: String },
    Usb { product: UsbProductId },
}

/// Parse a connection string, dispatching on its (case-sensitive, exact)
/// 15-character prefix.
pub fn parse(connection_string: &str) -> Result<ParsedConnection> {
    if let Some(path) = connection_string.strip_prefix(RTU_PREFIX) {
        if path.is_empty() {
            return Err(Error::InvalidArgument("empty serial device path".into()));
        }
        return Ok(ParsedConnection::Rtu { path: path.to_string() });
    }
    if let Some(host) = connection_string.strip_prefix(TCP_PREFIX) {
        if host.is_empty() {
            return Err(Error::InvalidArgument("empty TCP host".into()));
        }
        return Ok(ParsedConnection::Tcp { host: host.to_string() });
    }
    if let Some(hex) = connection_string.strip_prefix(USB_PREFIX) {
        let id = u16::from_str_radix(hex, 16)
            .map_err(|_| Error::InvalidArgument(format!("not a hex product id: {hex}")))?;
        let product = UsbProductId::from_hex(id)
            .ok_or_else(|| Error::Unsupported(format!("unrecognised USB product id 0x{id:04X}")))?;
        return Ok(ParsedConnection::Usb { product });
    }
    Err(Error::InvalidArgument(format!(
        "unrecognised connection string prefix: {connection_string}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_prefix() {
        assert_eq!(
            parse("sealevel_rtu:///dev/ttyUSB0").unwrap(),
            ParsedConnection::Rtu { path: "/dev/ttyUSB0".into() }
        );
        assert_eq!(
            parse("sealevel_tcp://host.example:1502").unwrap(),
            ParsedConnection::Tcp { host: "host.example:1502".into() }
        );
        assert_eq!(
            parse("sealevel_d2x://8111").unwrap(),
            ParsedConnection::Usb { product: UsbProductId::P8111 }
        );
    }

    #[test]
    fn rejects_unknown_product_id() {
        assert!(matches!(parse("sealevel_d2x://9999"), Err(Error::Unsupported(_))));
    }

    #[test]
    fn rejects_unknown_prefix() {
        assert!(matches!(parse("ftp://nope"), Err(Error::InvalidArgument(_))));
    }
}

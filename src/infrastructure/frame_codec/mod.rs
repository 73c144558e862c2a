//! Frame codec (fieldbus)
//!
//! Pure functions that encode a protocol request into a byte buffer and
//! decode a response buffer back into a typed reply, including CRC for the
//! serial framing and the transaction-id / length header for the TCP
//! framing. Nothing in this module touches an OS handle.

use crate::domain::{FunctionCode, SlaveId};
use crate::error::{Error, Result};

mod crc;
pub use crc::fieldbus_crc16;

/// Which wire framing to build, carrying the bits each framing needs that
/// the other doesn't (the TCP transaction id).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeTransport {
    Serial,
    Tcp { txid: u16 },
}

/// Mirrors [`EncodeTransport`] for decoding: TCP additionally carries the
/// transaction id the request was sent with, so the echo can be verified
/// (see the design note on unverified TCP echo in the source).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeTransport {
    Serial,
    Tcp { expected_txid: u16 },
}

/// The shape of a request body, one variant per row of the function table.
#[derive(Debug, Clone, Copy)]
pub enum RequestBody<'a> {
    /// 0x01/0x02/0x03/0x04 — start(2), qty(2)
    StartQty { start: u16, qty: u16 },
    /// 0x06 — start(2), value(2)
    StartValue { start: u16, value: u16 },
    /// 0x0F — start(2), qty(2), bytecount(1)=ceil(qty/8), coil bits
    WriteCoils { start: u16, qty: u16, coil_bytes: &'a [u8] },
    /// 0x10 — start(2), qty(2), bytecount(1)=qty*2, register bytes
    WriteRegisters { start: u16, qty: u16, reg_bytes: &'a [u8] },
    /// Fixed-size data blob: 0x42 (12), 0x44 (2), 0x46 (3), 0x47 (3), 0x64 (5)
    Raw(&'a [u8]),
    /// 0x41, 0x43, 0x45, 0x65, 0x66 — no body at all
    Empty,
}

/// Encode a complete request frame, including CRC (serial) or the 6-byte
/// header (TCP).
pub fn encode(
    slave: SlaveId,
    fcode: FunctionCode,
    body: RequestBody<'_>,
    transport: EncodeTransport,
) -> Result<Vec<u8>> {
    let body_bytes = encode_body(fcode, body)?;

    let mut frame = Vec::with_capacity(2 + body_bytes.len() + 8);
    match transport {
        EncodeTransport::Tcp { txid } => {
            let len = (2 + body_bytes.len()) as u16;
            frame.extend_from_slice(&txid.to_be_bytes());
            frame.extend_from_slice(&[0x00, 0x00]);
            frame.extend_from_slice(&len.to_be_bytes());
        }
        EncodeTransport::Serial => {}
    }

    frame.push(slave.as_u8());
    frame.push(fcode.wire_value());
    frame.extend_from_slice(&body_bytes);

    if matches!(transport, EncodeTransport::Serial) {
        let crc = fieldbus_crc16(&frame);
        frame.extend_from_slice(&crc.to_le_bytes());
    }

    Ok(frame)
}

fn encode_body(fcode: FunctionCode, body: RequestBody<'_>) -> Result<Vec<u8>> {
    use FunctionCode::*;
    let mut out = Vec::new();
    match (fcode, body) {
        (
            ReadCoils | ReadDiscreteInputs | ReadHoldingRegisters | ReadInputRegisters,
            RequestBody::StartQty { start, qty },
        ) => {
            out.extend_from_slice(&start.to_be_bytes());
            out.extend_from_slice(&qty.to_be_bytes());
        }
        (WriteSingleHoldingRegister, RequestBody::StartValue { start, value }) => {
            out.extend_from_slice(&start.to_be_bytes());
            out.extend_from_slice(&value.to_be_bytes());
        }
        (WriteMultipleCoils, RequestBody::WriteCoils { start, qty, coil_bytes }) => {
            let bytecount = coil_bytes.len();
            if bytecount != ((qty as usize) + 7) / 8 {
                return Err(Error::InvalidArgument(
                    "coil byte count does not match quantity".into(),
                ));
            }
            out.extend_from_slice(&start.to_be_bytes());
            out.extend_from_slice(&qty.to_be_bytes());
            out.push(bytecount as u8);
            out.extend_from_slice(coil_bytes);
        }
        (
            WriteMultipleHoldingRegisters,
            RequestBody::WriteRegisters { start, qty, reg_bytes },
        ) => {
            let bytecount = reg_bytes.len();
            if bytecount != (qty as usize) * 2 {
                return Err(Error::InvalidArgument(
                    "register byte count does not match quantity".into(),
                ));
            }
            out.extend_from_slice(&start.to_be_bytes());
            out.extend_from_slice(&qty.to_be_bytes());
            out.push(bytecount as u8);
            out.extend_from_slice(reg_bytes);
        }
        (SetPioDirection, RequestBody::Raw(data)) if data.len() == 12 => out.extend_from_slice(data),
        (SetPioValue, RequestBody::Raw(data)) if data.len() == 2 => out.extend_from_slice(data),
        (SetSlaveAddress, RequestBody::Raw(data)) if data.len() == 3 => out.extend_from_slice(data),
        (SetCommParams, RequestBody::Raw(data)) if data.len() == 3 => out.extend_from_slice(data),
        (SetAdConfig, RequestBody::Raw(data)) if data.len() == 5 => out.extend_from_slice(data),
        (
            GetDeviceParams | GetPioDirection | ReadCommParams | GetAdConfig | GetExtendedConfig,
            RequestBody::Empty,
        ) => {}
        _ => {
            return Err(Error::InvalidArgument(format!(
                "request body does not match function code {:?}",
                fcode
            )))
        }
    }
    Ok(out)
}

/// The function-specific payload length, i.e. the number of bytes following
/// `[slave, fcode]` on a successful (non-exception) response.
pub fn expected_len(fcode: FunctionCode, qty: Option<u16>) -> Result<usize> {
    use FunctionCode::*;
    Ok(match fcode {
        ReadCoils | ReadDiscreteInputs => {
            let qty = qty.ok_or_else(|| Error::InvalidArgument("qty required".into()))? as usize;
            1 + (qty + 7) / 8
        }
        ReadHoldingRegisters | ReadInputRegisters => {
            let qty = qty.ok_or_else(|| Error::InvalidArgument("qty required".into()))? as usize;
            1 + 2 * qty
        }
        WriteSingleHoldingRegister | WriteMultipleCoils | WriteMultipleHoldingRegisters => 4,
        GetDeviceParams => 15,
        SetPioDirection => 12,
        GetPioDirection => 3,
        SetPioValue => 1,
        ReadCommParams => 5,
        SetSlaveAddress | SetCommParams => 3,
        SetAdConfig => 1,
        GetAdConfig => 5,
        GetExtendedConfig => 16,
    })
}

/// Decode a response frame. Returns the decoded payload: for counted reads
/// the byte-count byte is stripped, for `GetDeviceParams` three metadata
/// bytes are stripped in addition, and write-type functions return an empty
/// vector as a bare success marker.
pub fn decode(
    request_fcode: FunctionCode,
    qty: Option<u16>,
    transport: DecodeTransport,
    raw: &[u8],
) -> Result<Vec<u8>> {
    let header_len = match transport {
        DecodeTransport::Serial => 2,
        DecodeTransport::Tcp { .. } => 8,
    };
    if raw.len() < header_len + 1 {
        return Err(Error::FramingError("response shorter than header".into()));
    }

    if let DecodeTransport::Tcp { expected_txid } = transport {
        let got_txid = u16::from_be_bytes([raw[0], raw[1]]);
        if got_txid != expected_txid {
            return Err(Error::FramingError(format!(
                "TCP transaction id mismatch: expected {expected_txid}, got {got_txid}"
            )));
        }
    }

    let response_fcode_raw = raw[header_len - 1];
    if response_fcode_raw & 0x80 != 0 {
        let exc_offset = header_len;
        let exc_code = *raw
            .get(exc_offset)
            .ok_or_else(|| Error::FramingError("truncated exception frame".into()))?;
        return Err(Error::ProtocolException(exc_code));
    }

    if response_fcode_raw != request_fcode.wire_value() {
        return Err(Error::FramingError(format!(
            "function code echo mismatch: expected 0x{:02X}, got 0x{:02X}",
            request_fcode.wire_value(),
            response_fcode_raw
        )));
    }

    let len = expected_len(request_fcode, qty)?;
    let trailer = match transport {
        DecodeTransport::Serial => 2,
        DecodeTransport::Tcp { .. } => 0,
    };
    if raw.len() < header_len + len + trailer {
        return Err(Error::FramingError(
            "response shorter than the function's expected length".into(),
        ));
    }

    if let DecodeTransport::Serial = transport {
        let body_end = header_len + len;
        let computed = fieldbus_crc16(&raw[..body_end]);
        let got = u16::from_le_bytes([raw[body_end], raw[body_end + 1]]);
        if computed != got {
            return Err(Error::FramingError(format!(
                "CRC mismatch: computed 0x{computed:04X}, got 0x{got:04X}"
            )));
        }
    }

    let payload = &raw[header_len..header_len + len];

    if request_fcode.is_write() {
        return Ok(Vec::new());
    }
    if request_fcode.is_counted_read() {
        return Ok(payload[1..].to_vec());
    }
    if request_fcode == FunctionCode::GetDeviceParams {
        return Ok(payload[3..].to_vec());
    }
    Ok(payload.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crc::fieldbus_crc16;

    #[test]
    fn crc_round_trip_for_all_lengths() {
        for len in 1..=253usize {
            let data: Vec<u8> = (0..len).map(|i| (i * 37 + 11) as u8).collect();
            let crc = fieldbus_crc16(&data);
            let mut framed = data.clone();
            framed.extend_from_slice(&crc.to_le_bytes());
            assert_eq!(&framed[..len], &data[..]);
            let recomputed = fieldbus_crc16(&framed[..len]);
            assert_eq!(recomputed, crc);
        }
    }

    #[test]
    fn tcp_framing_header_shape() {
        let frame = encode(
            SlaveId::new(1).unwrap(),
            FunctionCode::WriteSingleHoldingRegister,
            RequestBody::StartValue { start: 2, value: 0x1234 },
            EncodeTransport::Tcp { txid: 0 },
        )
        .unwrap();
        assert_eq!(
            frame,
            vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x06, 0x01, 0x06, 0x00, 0x02, 0x12, 0x34]
        );
    }

    #[test]
    fn scenario_a_read_coils_rtu() {
        let frame = encode(
            SlaveId::new(5).unwrap(),
            FunctionCode::ReadCoils,
            RequestBody::StartQty { start: 0, qty: 4 },
            EncodeTransport::Serial,
        )
        .unwrap();
        assert_eq!(&frame[..6], &[0x05, 0x01, 0x00, 0x00, 0x00, 0x04]);

        let crc = fieldbus_crc16(&[0x05, 0x01, 0x01, 0x0A]);
        let mut response = vec![0x05, 0x01, 0x01, 0x0A];
        response.extend_from_slice(&crc.to_le_bytes());

        let payload = decode(
            FunctionCode::ReadCoils,
            Some(4),
            DecodeTransport::Serial,
            &response,
        )
        .unwrap();
        assert_eq!(payload, vec![0x0A]);
    }

    #[test]
    fn scenario_b_write_single_register_tcp() {
        let request = encode(
            SlaveId::new(1).unwrap(),
            FunctionCode::WriteSingleHoldingRegister,
            RequestBody::StartValue { start: 2, value: 0x1234 },
            EncodeTransport::Tcp { txid: 0 },
        )
        .unwrap();
        // device echoes the request body verbatim
        let payload = decode(
            FunctionCode::WriteSingleHoldingRegister,
            None,
            DecodeTransport::Tcp { expected_txid: 0 },
            &request,
        )
        .unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn scenario_6_exception_path() {
        let crc_bytes = |d: &[u8]| fieldbus_crc16(d).to_le_bytes();
        let mut response = vec![0x05u8, 0x01 | 0x80, 0x02];
        let crc = crc_bytes(&response);
        response.extend_from_slice(&crc);

        let err = decode(FunctionCode::ReadCoils, Some(4), DecodeTransport::Serial, &response)
            .unwrap_err();
        match err {
            Error::ProtocolException(code) => assert_eq!(code, 0x02),
            other => panic!("expected ProtocolException, got {other:?}"),
        }
    }

    #[test]
    fn crc_mismatch_is_framing_error() {
        let mut response = vec![0x05u8, 0x01, 0x01, 0x0A, 0x00, 0x00];
        response[4] ^= 0xFF;
        let err = decode(FunctionCode::ReadCoils, Some(4), DecodeTransport::Serial, &response)
            .unwrap_err();
        assert!(matches!(err, Error::FramingError(_)));
    }

    #[test]
    fn tcp_txid_echo_mismatch_is_framing_error() {
        let request = encode(
            SlaveId::new(1).unwrap(),
            FunctionCode::WriteSingleHoldingRegister,
            RequestBody::StartValue { start: 2, value: 0x1234 },
            EncodeTransport::Tcp { txid: 7 },
        )
        .unwrap();
        let err = decode(
            FunctionCode::WriteSingleHoldingRegister,
            None,
            DecodeTransport::Tcp { expected_txid: 8 },
            &request,
        )
        .unwrap_err();
        assert!(matches!(err, Error::FramingError(_)));
    }

    #[test]
    fn get_device_params_strips_metadata() {
        let mut payload = vec![0u8; 15];
        payload[0..3].copy_from_slice(&[0xAA, 0xBB, 0xCC]);
        for (i, b) in payload[3..].iter_mut().enumerate() {
            *b = i as u8;
        }
        let mut response = vec![0x01u8, 0x41];
        response.extend_from_slice(&payload);
        let crc = fieldbus_crc16(&response);
        response.extend_from_slice(&crc.to_le_bytes());

        let out = decode(
            FunctionCode::GetDeviceParams,
            None,
            DecodeTransport::Serial,
            &response,
        )
        .unwrap();
        assert_eq!(out.len(), 12);
        assert_eq!(out[0], 0);
    }
}

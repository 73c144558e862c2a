//! Session — the public object: holds exactly one open transport, serialises
//! concurrent callers, and exposes the fieldbus Read/Write/Ioctl surface plus
//! the USB bridge's pin-level operations (§4.3).

use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::domain::{
    FunctionCode, IoctlKind, ReadKind, SlaveId, StartAddress, UsbProductId, WriteKind,
};
use crate::error::{Error, Result};
use crate::infrastructure::frame_codec::{self, DecodeTransport, EncodeTransport, RequestBody};
use crate::infrastructure::transport::{serial::SerialTransport, tcp::TcpTransport, usb, Transport};
use crate::infrastructure::usb_bridge::driver::NusbBridgeDriver;
use crate::infrastructure::usb_bridge::{execute, CommandBuffer};
use crate::presentation::url::{self, ParsedConnection};

const MIN_THROTTLE: Duration = Duration::from_millis(1);
const USB_VENDOR_ID: u16 = usb::VENDOR_ID;

/// I2C expander addresses and registers used by the 8126's PIO surface.
const EXPANDER_LOW: u8 = 0xE8;
const EXPANDER_HIGH: u8 = 0xEA;
const REG_INPUT: u8 = 0;
const REG_OUTPUT: u8 = 2;
const REG_DIRECTION: u8 = 6;

struct Inner {
    transport: Transport,
    throttle: Duration,
}

/// The unified host-side session over a fieldbus (RTU/TCP) or USB bridge
/// connection. At most one transaction is ever in flight; concurrent callers
/// block on an internal mutex rather than racing the underlying handle.
pub struct Session {
    inner: Mutex<Inner>,
}

impl Session {
    /// Allocate a session with no open transport.
    pub fn create() -> Self {
        Self {
            inner: Mutex::new(Inner {
                transport: Transport::None,
                throttle: MIN_THROTTLE,
            }),
        }
    }

    /// Build a session around an already-open transport, bypassing `open()`'s
    /// connection-string dispatch. Exists so integration tests can drive the
    /// public Read/Write/Ioctl surface against a [`Transport::Fake`] the same
    /// way the flash programmer's tests drive use cases against a
    /// `SimulatedProgrammer`.
    pub fn from_transport(transport: Transport) -> Self {
        Self {
            inner: Mutex::new(Inner {
                transport,
                throttle: MIN_THROTTLE,
            }),
        }
    }

    /// Parse `connection_string` and open the matching transport, closing
    /// any transport already open on this session first.
    pub fn open(&self, connection_string: &str) -> Result<()> {
        let parsed = url::parse(connection_string)?;
        let mut guard = self.inner.lock().unwrap();
        guard.transport.close()?;

        guard.transport = match parsed {
            ParsedConnection::Rtu { path } => Transport::Serial(SerialTransport::open(&path)?),
            ParsedConnection::Tcp { host } => Transport::Tcp(TcpTransport::connect(&host)?),
            ParsedConnection::Usb { product } => {
                let mut driver = NusbBridgeDriver::open(USB_VENDOR_ID, product.wire_id())?;
                let chip = usb::enter_bitmode(&mut driver, product)?;
                Transport::Usb {
                    driver: Box::new(driver),
                    product,
                    chip,
                    buffer: CommandBuffer::new(),
                }
            }
        };
        Ok(())
    }

    /// Close the open transport, if any. Idempotent.
    pub fn close(&self) -> Result<()> {
        self.inner.lock().unwrap().transport.close()
    }

    /// Set the inter-message throttle delay, in milliseconds. Must be >= 1.
    pub fn set_intermessage_delay(&self, ms: u64) -> Result<()> {
        if ms < 1 {
            return Err(Error::InvalidArgument(
                "intermessage delay must be >= 1ms".into(),
            ));
        }
        self.inner.lock().unwrap().throttle = Duration::from_millis(ms);
        Ok(())
    }

    /// Read `qty` items of `kind` starting at the 1-based address `start`
    /// from `slave`, over a Serial or TCP transport. Returns the number of
    /// bytes placed in `out`.
    pub fn read(
        &self,
        slave: SlaveId,
        kind: ReadKind,
        start: StartAddress,
        qty: u16,
        out: &mut [u8],
    ) -> Result<usize> {
        let fcode = kind.function_code();
        let body = match kind {
            ReadKind::Coils | ReadKind::DiscreteInputs | ReadKind::HoldingRegisters | ReadKind::InputRegisters => {
                RequestBody::StartQty {
                    start: start.wire_value()?,
                    qty,
                }
            }
            ReadKind::CommParams | ReadKind::DeviceParams => RequestBody::Empty,
        };
        let mut guard = self.inner.lock().unwrap();
        let payload = match transact(&mut guard.transport, slave, fcode, body, Some(qty)) {
            Ok(payload) => payload,
            Err(Error::ProtocolException(exc)) => {
                if let Some(slot) = out.first_mut() {
                    *slot = exc;
                }
                return Err(Error::ProtocolException(exc));
            }
            Err(e) => return Err(e),
        };
        thread::sleep(guard.throttle);

        let n = payload.len().min(out.len());
        out[..n].copy_from_slice(&payload[..n]);
        Ok(n)
    }

    /// Write `in_buf` as `qty` items of `kind` starting at the 1-based
    /// address `start` on `slave`. Upgrades a single-register write to the
    /// multi-register function when `qty > 1`. Returns the number of bytes
    /// written.
    pub fn write(
        &self,
        slave: SlaveId,
        kind: WriteKind,
        start: StartAddress,
        qty: u16,
        in_buf: &[u8],
    ) -> Result<usize> {
        let fcode = kind.function_code(qty);
        let wire_start = start.wire_value()?;

        let body = match (kind, fcode) {
            (WriteKind::HoldingRegisters, FunctionCode::WriteSingleHoldingRegister) => {
                if in_buf.len() < 2 {
                    return Err(Error::InvalidArgument(
                        "single register write needs 2 bytes".into(),
                    ));
                }
                RequestBody::StartValue {
                    start: wire_start,
                    value: u16::from_be_bytes([in_buf[0], in_buf[1]]),
                }
            }
            (WriteKind::HoldingRegisters, FunctionCode::WriteMultipleHoldingRegisters) => {
                RequestBody::WriteRegisters {
                    start: wire_start,
                    qty,
                    reg_bytes: in_buf,
                }
            }
            (WriteKind::Coils, _) => RequestBody::WriteCoils {
                start: wire_start,
                qty,
                coil_bytes: in_buf,
            },
            (WriteKind::PioDirection, _) => RequestBody::Raw(in_buf),
            _ => unreachable!("WriteKind::function_code only returns the codes matched above"),
        };

        let mut guard = self.inner.lock().unwrap();
        transact(&mut guard.transport, slave, fcode, body, None)?;
        thread::sleep(guard.throttle);
        Ok(in_buf.len())
    }

    /// Dispatch an ioctl selector. `which == 9` runs the composed extended
    /// A/D probe instead of a single wire function (see
    /// [`crate::application::ad_probe`]).
    pub fn ioctl_raw(
        &self,
        slave: SlaveId,
        which: IoctlKind,
        in_out: &[u8],
    ) -> Result<Vec<u8>> {
        let fcode = which
            .function_code()
            .ok_or_else(|| Error::InvalidArgument("ioctl 9 is the composed probe, not a wire function".into()))?;
        let body = if in_out.is_empty() {
            RequestBody::Empty
        } else {
            RequestBody::Raw(in_out)
        };
        let mut guard = self.inner.lock().unwrap();
        let payload = transact(&mut guard.transport, slave, fcode, body, None)?;
        thread::sleep(guard.throttle);
        Ok(payload)
    }

    // ---------------------------------------------------------------
    // USB bridge: plain bit-bang Lite modules (everything but the 8126)
    // ---------------------------------------------------------------

    /// Read the state of the bridge's first 8 pins into `out[0]`.
    pub fn read_usb_pins(&self, out: &mut [u8]) -> Result<usize> {
        if out.len() > 2 {
            return Err(Error::OutOfRange(
                "USB Lite read is limited to 2 bytes".into(),
            ));
        }
        let mut guard = self.inner.lock().unwrap();
        let (driver, product, _chip) = as_usb_mut(&mut guard.transport)?;
        reject_synchronous_serial(product)?;

        let mut buf = CommandBuffer::new();
        let slot = buf.read_bank1_pins()?;
        let replies = execute(driver.as_mut(), &buf)?;
        out[0] = replies[slot];
        Ok(1)
    }

    /// Emit up to 2 raw output bytes to the bridge's banks.
    pub fn write_usb_pins(&self, data: &[u8]) -> Result<usize> {
        if data.is_empty() || data.len() > 2 {
            return Err(Error::OutOfRange(
                "USB Lite write is limited to 1-2 bytes".into(),
            ));
        }
        let mut guard = self.inner.lock().unwrap();
        let (driver, product, chip) = as_usb_mut(&mut guard.transport)?;
        reject_synchronous_serial(product)?;

        let mut buf = CommandBuffer::new();
        buf.write_raw_outputs(chip, data[0], data.get(1).copied())?;
        execute(driver.as_mut(), &buf)?;
        Ok(data.len())
    }

    // ---------------------------------------------------------------
    // USB bridge: synchronous-serial PIO surface (8126 only)
    // ---------------------------------------------------------------

    /// Effective PIO: for each bank byte, input bits where the direction
    /// register marks a pin as input, output-latch bits where it marks a pin
    /// as output — `(input & direction) | (output & !direction)`, per
    /// `SeaDacGetPIO`. Reads all three register groups (direction, input,
    /// output; 12 registers total) to compute it.
    pub fn get_pio(&self, out: &mut [u8; 4]) -> Result<()> {
        let mut guard = self.inner.lock().unwrap();
        let (driver, product, chip) = as_usb_mut(&mut guard.transport)?;
        require_synchronous_serial(product)?;

        let mut buf = CommandBuffer::new();
        let direction_slots = [
            buf.read_register(chip, EXPANDER_LOW, REG_DIRECTION)?,
            buf.read_register(chip, EXPANDER_LOW, REG_DIRECTION + 1)?,
            buf.read_register(chip, EXPANDER_HIGH, REG_DIRECTION)?,
            buf.read_register(chip, EXPANDER_HIGH, REG_DIRECTION + 1)?,
        ];
        let input_slots = [
            buf.read_register(chip, EXPANDER_LOW, REG_INPUT)?,
            buf.read_register(chip, EXPANDER_LOW, REG_INPUT + 1)?,
            buf.read_register(chip, EXPANDER_HIGH, REG_INPUT)?,
            buf.read_register(chip, EXPANDER_HIGH, REG_INPUT + 1)?,
        ];
        let output_slots = [
            buf.read_register(chip, EXPANDER_LOW, REG_OUTPUT)?,
            buf.read_register(chip, EXPANDER_LOW, REG_OUTPUT + 1)?,
            buf.read_register(chip, EXPANDER_HIGH, REG_OUTPUT)?,
            buf.read_register(chip, EXPANDER_HIGH, REG_OUTPUT + 1)?,
        ];
        let replies = execute(driver.as_mut(), &buf)?;

        for i in 0..4 {
            let direction = replies[direction_slots[i]];
            let input = replies[input_slots[i]];
            let output = replies[output_slots[i]];
            out[i] = (input & direction) | (output & !direction);
        }
        Ok(())
    }

    pub fn get_pio_direction(&self, out: &mut [u8; 4]) -> Result<()> {
        self.pio_registers(REG_DIRECTION, out)
    }

    fn pio_registers(&self, register: u8, out: &mut [u8; 4]) -> Result<()> {
        let mut guard = self.inner.lock().unwrap();
        let (driver, product, chip) = as_usb_mut(&mut guard.transport)?;
        require_synchronous_serial(product)?;

        let mut buf = CommandBuffer::new();
        let slots = [
            buf.read_register(chip, EXPANDER_LOW, register)?,
            buf.read_register(chip, EXPANDER_LOW, register + 1)?,
            buf.read_register(chip, EXPANDER_HIGH, register)?,
            buf.read_register(chip, EXPANDER_HIGH, register + 1)?,
        ];
        let replies = execute(driver.as_mut(), &buf)?;
        for (i, slot) in slots.into_iter().enumerate() {
            out[i] = replies[slot];
        }
        Ok(())
    }

    pub fn set_pio(&self, values: &[u8; 4]) -> Result<()> {
        self.set_pio_registers(REG_OUTPUT, values)
    }

    /// Each byte is a whole-bank input/output toggle, not a per-pin mask:
    /// `0` writes the bank's direction register as all-outputs (`0x00`),
    /// anything else as all-inputs (`0xFF`), per `SeaDacSetPIODirection`.
    pub fn set_pio_direction(&self, values: &[u8; 4]) -> Result<()> {
        let banks = values.map(|v| if v == 0 { 0x00 } else { 0xFF });
        self.set_pio_registers(REG_DIRECTION, &banks)
    }

    fn set_pio_registers(&self, register: u8, values: &[u8; 4]) -> Result<()> {
        let mut guard = self.inner.lock().unwrap();
        let (driver, product, chip) = as_usb_mut(&mut guard.transport)?;
        require_synchronous_serial(product)?;

        let mut buf = CommandBuffer::new();
        buf.write_register(chip, EXPANDER_LOW, register, values[0])?;
        buf.write_register(chip, EXPANDER_LOW, register + 1, values[1])?;
        buf.write_register(chip, EXPANDER_HIGH, register, values[2])?;
        buf.write_register(chip, EXPANDER_HIGH, register + 1, values[3])?;
        execute(driver.as_mut(), &buf)?;
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::create()
    }
}

fn as_usb_mut(
    transport: &mut Transport,
) -> Result<(
    &mut Box<dyn crate::infrastructure::usb_bridge::UsbBridgeDriver + Send>,
    UsbProductId,
    &mut crate::infrastructure::usb_bridge::ChipState,
)> {
    match transport {
        Transport::Usb { driver, product, chip, .. } => Ok((driver, *product, chip)),
        Transport::None => Err(Error::NotReady("session is not open".into())),
        _ => Err(Error::Unsupported(
            "this operation requires a USB bridge transport".into(),
        )),
    }
}

fn require_synchronous_serial(product: UsbProductId) -> Result<()> {
    if product.is_synchronous_serial() {
        Ok(())
    } else {
        Err(Error::Unsupported(
            "PIO register access requires the synchronous-serial (8126) product".into(),
        ))
    }
}

fn reject_synchronous_serial(product: UsbProductId) -> Result<()> {
    if product.is_synchronous_serial() {
        Err(Error::Unsupported(
            "the 8126 speaks PIO registers, not raw pin read/write — use get_pio/set_pio".into(),
        ))
    } else {
        Ok(())
    }
}

/// Encode, send, and decode one fieldbus request/response pair against
/// whichever Serial/TCP carrier is open, verifying the TCP transaction-id
/// echo (a correctness fix relative to the behaviour this design was drawn
/// from, which sends but never checks it).
fn transact(
    transport: &mut Transport,
    slave: SlaveId,
    fcode: FunctionCode,
    body: RequestBody<'_>,
    qty: Option<u16>,
) -> Result<Vec<u8>> {
    let (enc, dec) = encode_decode_kinds(transport)?;
    let frame = frame_codec::encode(slave, fcode, body, enc)?;
    transport.send(&frame)?;
    read_response(transport, fcode, qty, dec)
}

fn encode_decode_kinds(transport: &mut Transport) -> Result<(EncodeTransport, DecodeTransport)> {
    match transport {
        Transport::Serial(_) => Ok((EncodeTransport::Serial, DecodeTransport::Serial)),
        Transport::Tcp(t) => {
            let txid = t.next_txid();
            Ok((
                EncodeTransport::Tcp { txid },
                DecodeTransport::Tcp { expected_txid: txid },
            ))
        }
        Transport::None => Err(Error::NotReady("session is not open".into())),
        Transport::Fake(f) => match f.next_txid() {
            Some(txid) => Ok((
                EncodeTransport::Tcp { txid },
                DecodeTransport::Tcp { expected_txid: txid },
            )),
            None => Ok((EncodeTransport::Serial, DecodeTransport::Serial)),
        },
        _ => Err(Error::Unsupported(
            "fieldbus read/write/ioctl requires a Serial or TCP transport".into(),
        )),
    }
}

/// Read exactly the bytes the response needs: the header first (to inspect
/// the echoed function code's exception bit), then either the short
/// exception tail or the full function-specific payload.
fn read_response(
    transport: &mut Transport,
    fcode: FunctionCode,
    qty: Option<u16>,
    dec: DecodeTransport,
) -> Result<Vec<u8>> {
    let header_len = match dec {
        DecodeTransport::Serial => 2,
        DecodeTransport::Tcp { .. } => 8,
    };
    let trailer = match dec {
        DecodeTransport::Serial => 2,
        DecodeTransport::Tcp { .. } => 0,
    };

    let mut buf = transport.recv(header_len)?;
    let resp_fcode = buf[header_len - 1];

    if resp_fcode & 0x80 != 0 {
        buf.extend_from_slice(&transport.recv(1 + trailer)?);
    } else {
        let len = frame_codec::expected_len(fcode, qty)?;
        buf.extend_from_slice(&transport.recv(len + trailer)?);
    }

    frame_codec::decode(fcode, qty, dec, &buf)
}

//! End-to-end tests driving the public `Session` surface against the fake
//! transports, mirroring the flash programmer's `tests/e2e_nand.rs` pattern
//! of exercising the public API against a stand-in device rather than real
//! hardware.

use seadac_rs::application::Session;
use seadac_rs::domain::{IoctlKind, ReadKind, SlaveId, StartAddress, WriteKind};
use seadac_rs::error::Error;
use seadac_rs::infrastructure::frame_codec::fieldbus_crc16;
use seadac_rs::infrastructure::transport::fake::FakeTransport;
use seadac_rs::infrastructure::transport::Transport;
use seadac_rs::infrastructure::usb_bridge::driver::FakeUsbBridgeDriver;
use seadac_rs::infrastructure::usb_bridge::{ChipState, CommandBuffer};

fn serial_response(body: &[u8]) -> Vec<u8> {
    let mut response = body.to_vec();
    let crc = fieldbus_crc16(&response);
    response.extend_from_slice(&crc.to_le_bytes());
    response
}

#[test]
fn scenario_a_read_coils_over_serial_end_to_end() {
    let mut fake = FakeTransport::new();
    fake.queue_response(serial_response(&[0x05, 0x01, 0x01, 0x0A]));
    let session = Session::from_transport(Transport::Fake(fake));

    let mut out = [0u8; 8];
    let n = session
        .read(
            SlaveId::new(5).unwrap(),
            ReadKind::Coils,
            StartAddress(1),
            4,
            &mut out,
        )
        .expect("read should succeed");

    assert_eq!(n, 1);
    assert_eq!(out[0], 0x0A);
}

#[test]
fn scenario_b_write_single_register_over_tcp_end_to_end() {
    let mut fake = FakeTransport::tcp();
    fake.queue_response(vec![
        0x00, 0x00, 0x00, 0x00, 0x00, 0x06, 0x01, 0x06, 0x00, 0x02, 0x12, 0x34,
    ]);
    let session = Session::from_transport(Transport::Fake(fake));

    let n = session
        .write(
            SlaveId::new(1).unwrap(),
            WriteKind::HoldingRegisters,
            StartAddress(3),
            1,
            &[0x12, 0x34],
        )
        .expect("write should succeed");

    assert_eq!(n, 2);
}

#[test]
fn scenario_d_write_multiple_registers_over_serial_end_to_end() {
    let mut fake = FakeTransport::new();
    fake.queue_response(serial_response(&[0x01, 0x10, 0x00, 0x02, 0x00, 0x02]));
    let session = Session::from_transport(Transport::Fake(fake));

    let n = session
        .write(
            SlaveId::new(1).unwrap(),
            WriteKind::HoldingRegisters,
            StartAddress(3),
            2,
            &[0x00, 0x0A, 0x00, 0x0B],
        )
        .expect("multi-register write should succeed");

    assert_eq!(n, 4);
}

#[test]
fn read_device_params_strips_metadata_over_serial() {
    let mut payload = vec![0xAA, 0xBB, 0xCC];
    payload.extend((0u8..12).collect::<Vec<u8>>());
    let mut body = vec![0x01, 0x41];
    body.extend_from_slice(&payload);
    let mut fake = FakeTransport::new();
    fake.queue_response(serial_response(&body));
    let session = Session::from_transport(Transport::Fake(fake));

    let mut out = [0u8; 12];
    let n = session
        .read(
            SlaveId::new(1).unwrap(),
            ReadKind::DeviceParams,
            StartAddress(1),
            0,
            &mut out,
        )
        .expect("read should succeed");

    assert_eq!(n, 12);
}

#[test]
fn ioctl_get_ad_config_round_trips_over_serial() {
    let mut fake = FakeTransport::new();
    fake.queue_response(serial_response(&[0x01, 0x65, 0x02, 0x00, 0x01, 0x00, 0x00]));
    let session = Session::from_transport(Transport::Fake(fake));

    let out = session
        .ioctl_raw(SlaveId::new(1).unwrap(), IoctlKind::GetAdConfig, &[])
        .expect("ioctl should succeed");

    assert_eq!(out, vec![0x02, 0x00, 0x01, 0x00, 0x00]);
}

#[test]
fn exception_response_surfaces_as_protocol_exception() {
    let mut fake = FakeTransport::new();
    fake.queue_response(serial_response(&[0x05, 0x01 | 0x80, 0x02]));
    let session = Session::from_transport(Transport::Fake(fake));

    let mut out = [0u8; 8];
    let err = session
        .read(
            SlaveId::new(5).unwrap(),
            ReadKind::Coils,
            StartAddress(1),
            4,
            &mut out,
        )
        .unwrap_err();

    assert!(matches!(err, Error::ProtocolException(0x02)));
}

#[test]
fn usb_bridge_pin_read_end_to_end() {
    let mut driver = FakeUsbBridgeDriver::new();
    driver.queue_reply(vec![0x3C]);

    let session = Session::from_transport(Transport::Usb {
        driver: Box::new(driver),
        product: seadac_rs::domain::UsbProductId::P8111,
        chip: ChipState::default(),
        buffer: CommandBuffer::new(),
    });

    let mut out = [0u8; 1];
    let n = session
        .read_usb_pins(&mut out)
        .expect("USB pin read should succeed");

    assert_eq!(n, 1);
    assert_eq!(out[0], 0x3C);
}

#[test]
fn usb_bridge_pio_round_trip_on_synchronous_serial_product() {
    let mut driver = FakeUsbBridgeDriver::new();
    // get_pio issues twelve read_register calls (direction, input, output
    // across EXPANDER_LOW/HIGH), each costing 4 reply bytes.
    driver.queue_reply(vec![0; 48]);

    let session = Session::from_transport(Transport::Usb {
        driver: Box::new(driver),
        product: seadac_rs::domain::UsbProductId::P8126,
        chip: ChipState::default(),
        buffer: CommandBuffer::new(),
    });

    let mut out = [0u8; 4];
    session.get_pio(&mut out).expect("get_pio should succeed");
    assert_eq!(out, [0, 0, 0, 0]);

    // Raw pin access is not meaningful on the 8126; it speaks PIO registers.
    let mut raw_out = [0u8; 1];
    let err = session.read_usb_pins(&mut raw_out).unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)));
}

#[test]
fn session_rejects_fieldbus_calls_before_open() {
    let session = Session::create();
    let mut out = [0u8; 4];
    let err = session
        .read(SlaveId::new(1).unwrap(), ReadKind::Coils, StartAddress(1), 4, &mut out)
        .unwrap_err();
    assert!(matches!(err, Error::NotReady(_)));
}

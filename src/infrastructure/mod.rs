//! Infrastructure layer — frame codec, transports, and the USB bridge
//! command assembler/executor. Depends on the domain layer only.

pub mod frame_codec;
pub mod transport;
pub mod usb_bridge;

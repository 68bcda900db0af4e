//! USB CDC-ACM virtual serial port transport.
//!
//! The board support package implements [`UsbDeviceController`] and
//! [`Board`] for the USB interrupt, and [`UsbBulkPort`] and [`Clock`] for
//! the application. [`CdcState::split`] turns one [`CdcState`] into a
//! [`CdcInterrupt`] handle and a [`CdcSerial`] handle.
//!
//! # Echo firmware
//!
//! The host harness in `integration_tests/` expects a device that writes
//! back every byte it reads. The firmware side of that is:
//!
//! ```ignore
//! static STATE: StaticCell<CdcState> = StaticCell::new();
//!
//! let state = STATE.init(CdcState::new());
//! let (irq, mut serial) = state.split(usb_irq, board, usb_app, clock);
//! // Move `irq` into the USB interrupt handler:
//! //   bulk OUT data ready   -> irq.accept()
//! //   class setup request   -> irq.handle_setup(&SetupPacket::parse(setup)?)
//! //   descriptor request    -> usb::interface_descriptor(with_iad)
//!
//! loop {
//!     while let Some(byte) = serial.read() {
//!         serial.write_byte(byte);
//!     }
//!     serial.flush();
//! }
//! ```
//!
//! A 1200 baud open-then-close from the host (`integration-tests --touch`)
//! arms the bootloader reset through [`Board::schedule_reset`].

#![cfg_attr(not(test), no_std)]

pub mod board;
pub mod config;
pub mod serial;
pub mod usb;

pub use board::{Board, Clock};
pub use serial::{CdcError, CdcInterrupt, CdcSerial, CdcState, ControlOutcome, SetupPacket};
pub use usb::{EndpointError, UsbBulkPort, UsbDeviceController};

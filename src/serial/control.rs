//! CDC class control request handling
//!
//! # Requests
//!
//! | bmRequestType | bRequest | Request                 | Data stage        |
//! |---------------|----------|-------------------------|-------------------|
//! | 0xA1          | 0x21     | GET_LINE_CODING         | 7 bytes to host   |
//! | 0x21          | 0x20     | SET_LINE_CODING         | 7 bytes from host |
//! | 0x21          | 0x22     | SET_CONTROL_LINE_STATE  | none              |
//!
//! # Bootloader Reset
//!
//! Closing the port while it is set to 1200 baud (DTR dropped) arms a
//! delayed device reset so the board re-enters its bootloader. Raising DTR
//! again before the reset fires disarms it. At any other baud rate line
//! state changes never touch the reset.

use crate::board::Board;
use crate::config::{endpoints, timing};
use crate::serial::line_info::{LineCoding, LineState, SharedLineInfo, LINE_CODING_LEN};
use crate::serial::CdcError;
use crate::usb::UsbDeviceController;

/// bmRequestType: device-to-host, class, interface
pub const REQUEST_DEVICE_TO_HOST_CLASS_INTERFACE: u8 = 0xA1;

/// bmRequestType: host-to-device, class, interface
pub const REQUEST_HOST_TO_DEVICE_CLASS_INTERFACE: u8 = 0x21;

/// Setup packet length
pub const SETUP_PACKET_LEN: usize = 8;

/// CDC class request codes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdcRequest {
    /// Host sends line coding (0x20)
    SetLineCoding = 0x20,
    /// Host reads line coding (0x21)
    GetLineCoding = 0x21,
    /// Host sets DTR/RTS (0x22)
    SetControlLineState = 0x22,
}

impl CdcRequest {
    /// Try to convert a byte to a CdcRequest
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x20 => Some(Self::SetLineCoding),
            0x21 => Some(Self::GetLineCoding),
            0x22 => Some(Self::SetControlLineState),
            _ => None,
        }
    }
}

/// USB setup packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupPacket {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub length: u16,
}

impl SetupPacket {
    /// Parse the 8-byte setup stage
    pub fn parse(data: &[u8]) -> Result<Self, CdcError> {
        if data.len() < SETUP_PACKET_LEN {
            return Err(CdcError::InvalidLength);
        }

        Ok(Self {
            request_type: data[0],
            request: data[1],
            value: u16::from_le_bytes([data[2], data[3]]),
            index: u16::from_le_bytes([data[4], data[5]]),
            length: u16::from_le_bytes([data[6], data[7]]),
        })
    }

    /// Low byte of wValue
    pub fn value_low(&self) -> u8 {
        self.value.to_le_bytes()[0]
    }
}

/// Result of handling a setup request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    /// Data stage was sent to the host
    Responded,
    /// Host-to-device request consumed; the core completes the status stage
    Accepted,
    /// Not a request this class handles; no state changed
    Declined,
}

/// Handle a class-specific control request.
///
/// SET_LINE_CODING reads its data stage from the control endpoint once
/// [`UsbDeviceController::fifo_byte_count`] reports all 7 bytes.
pub fn handle_request<U: UsbDeviceController, B: Board>(
    setup: &SetupPacket,
    line: &SharedLineInfo,
    usb: &mut U,
    board: &mut B,
) -> Result<ControlOutcome, CdcError> {
    let request = match CdcRequest::from_byte(setup.request) {
        Some(request) => request,
        None => return Ok(ControlOutcome::Declined),
    };

    match (setup.request_type, request) {
        (REQUEST_DEVICE_TO_HOST_CLASS_INTERFACE, CdcRequest::GetLineCoding) => {
            let coding = line.coding();
            log::debug!("GET_LINE_CODING -> {:?}", coding);
            usb.send_control(endpoints::CONTROL, &coding.encode())?;
            Ok(ControlOutcome::Responded)
        }
        (REQUEST_HOST_TO_DEVICE_CLASS_INTERFACE, CdcRequest::SetLineCoding) => {
            wait_for_data_stage(usb, board)?;

            let mut data = [0u8; LINE_CODING_LEN];
            let count = usb.read_control(endpoints::CONTROL, &mut data);
            let coding = LineCoding::decode(&data[..count])?;

            line.set_coding(coding);
            log::debug!("SET_LINE_CODING {:?}", coding);
            Ok(ControlOutcome::Accepted)
        }
        (REQUEST_HOST_TO_DEVICE_CLASS_INTERFACE, CdcRequest::SetControlLineState) => {
            let state = LineState(setup.value_low());
            line.set_state(state);
            log::debug!("SET_CONTROL_LINE_STATE {:#04x}", state.0);
            apply_bootloader_reset(line, board);
            Ok(ControlOutcome::Accepted)
        }
        _ => Ok(ControlOutcome::Declined),
    }
}

/// Poll the control FIFO until the line coding data stage has arrived.
fn wait_for_data_stage<U: UsbDeviceController, B: Board>(
    usb: &mut U,
    board: &mut B,
) -> Result<(), CdcError> {
    let start = board.millis();

    while usb.fifo_byte_count(endpoints::CONTROL) < LINE_CODING_LEN {
        if board.millis().wrapping_sub(start) >= timing::LINE_CODING_TIMEOUT_MS {
            log::warn!("SET_LINE_CODING data stage timed out");
            return Err(CdcError::Timeout);
        }
        board.delay_ms(timing::POLL_INTERVAL_MS);
    }

    Ok(())
}

/// Arm or disarm the bootloader reset after a line state change.
fn apply_bootloader_reset<B: Board>(line: &SharedLineInfo, board: &mut B) {
    if line.baud_rate() != timing::BOOTLOADER_BAUD_RATE {
        return;
    }

    if line.state().dtr() {
        log::info!("DTR raised at 1200 baud, bootloader reset cancelled");
        board.cancel_reset();
    } else {
        log::info!(
            "port closed at 1200 baud, reset in {} ms",
            timing::BOOTLOADER_RESET_DELAY_MS
        );
        board.schedule_reset(timing::BOOTLOADER_RESET_DELAY_MS);
    }
}

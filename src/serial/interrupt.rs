//! Interrupt-side handle of the transport
//!
//! The firmware's USB interrupt routes two kinds of events into it:
//!
//! - bulk OUT data ready: [`CdcInterrupt::accept`]
//! - class setup request: [`CdcInterrupt::handle_setup`]
//!
//! It is the only writer of the receive queue and of the line info.

use core::sync::atomic::Ordering;

use heapless::spsc::Producer;

use crate::board::Board;
use crate::config::endpoints;
use crate::serial::control::{self, ControlOutcome, SetupPacket};
use crate::serial::line_info::LineInfo;
use crate::serial::pump::pump;
use crate::serial::state::Shared;
use crate::serial::CdcError;
use crate::usb::UsbDeviceController;

/// USB interrupt side of one CDC serial port
pub struct CdcInterrupt<'a, U, B, const N: usize> {
    usb: U,
    board: B,
    rx: Producer<'a, u8, N>,
    shared: &'a Shared,
}

impl<'a, U: UsbDeviceController, B: Board, const N: usize> CdcInterrupt<'a, U, B, N> {
    pub(crate) fn new(usb: U, board: B, rx: Producer<'a, u8, N>, shared: &'a Shared) -> Self {
        Self {
            usb,
            board,
            rx,
            shared,
        }
    }

    /// Receive pump entry point, called when the OUT endpoint has data.
    ///
    /// Returns the number of bytes moved into the queue.
    pub fn accept(&mut self) -> usize {
        let moved = pump(&mut self.rx, &mut self.usb, endpoints::OUT);

        // A full queue leaves the packet unreleased until the reader makes room
        self.shared.rx_held.store(!self.rx.ready(), Ordering::Release);
        moved
    }

    /// Class setup request entry point.
    ///
    /// SET_LINE_CODING may wait up to `LINE_CODING_TIMEOUT_MS` for its data
    /// stage.
    pub fn handle_setup(&mut self, setup: &SetupPacket) -> Result<ControlOutcome, CdcError> {
        control::handle_request(setup, &self.shared.line, &mut self.usb, &mut self.board)
    }

    pub fn line_info(&self) -> LineInfo {
        self.shared.line.load()
    }

    pub fn usb(&self) -> &U {
        &self.usb
    }

    pub fn board(&self) -> &B {
        &self.board
    }
}

#[cfg(test)]
mod tests {
    use crate::board::mock::MockBoard;
    use crate::config::timing;
    use crate::serial::control::{CdcRequest, REQUEST_HOST_TO_DEVICE_CLASS_INTERFACE};
    use crate::serial::{CdcState, SetupPacket};
    use crate::usb::mock::MockUsbController;

    fn line_coding_setup() -> SetupPacket {
        SetupPacket {
            request_type: REQUEST_HOST_TO_DEVICE_CLASS_INTERFACE,
            request: CdcRequest::SetLineCoding as u8,
            value: 0,
            index: 0,
            length: 7,
        }
    }

    #[test]
    fn test_accept_marks_held_packet() {
        let usb = MockUsbController::new();
        let board = MockBoard::booted_for(1000);
        let mut state: CdcState<4> = CdcState::new();
        let (mut irq, _serial) = state.split(&usb, &board, &usb, &board);
        usb.queue_host_data(&[1, 2, 3, 4]);

        assert_eq!(irq.accept(), 3);
        assert!(irq.shared.rx_held.load(core::sync::atomic::Ordering::Acquire));
    }

    #[test]
    fn test_accept_drained_packet_not_held() {
        let usb = MockUsbController::new();
        let board = MockBoard::booted_for(1000);
        let mut state: CdcState<16> = CdcState::new();
        let (mut irq, _serial) = state.split(&usb, &board, &usb, &board);
        usb.queue_host_data(&[1, 2]);

        assert_eq!(irq.accept(), 2);
        assert!(!irq.shared.rx_held.load(core::sync::atomic::Ordering::Acquire));
        assert_eq!(usb.release_count(), 1);
    }

    #[test]
    fn test_line_coding_visible_to_application() {
        let usb = MockUsbController::new();
        let board = MockBoard::booted_for(1000);
        let mut state: CdcState<16> = CdcState::new();
        let (mut irq, serial) = state.split(&usb, &board, &usb, &board);
        usb.queue_control_data(&[0x00, 0x96, 0x00, 0x00, 0x00, 0x00, 0x08], 2);

        irq.handle_setup(&line_coding_setup()).unwrap();

        assert_eq!(irq.line_info().coding.baud_rate, 38400);
        assert_eq!(serial.baud_rate(), 38400);
        assert_eq!(board.delayed_ms(), 2 * timing::POLL_INTERVAL_MS);
    }
}

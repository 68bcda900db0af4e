//! Transport state shared by the interrupt side and the application side
//!
//! [`CdcState`] owns the receive queue and the live line info. Splitting it
//! hands out the two halves of the transport:
//!
//! - [`CdcInterrupt`]: owns the queue [`Producer`](heapless::spsc::Producer),
//!   runs the receive pump and the control requests
//! - [`CdcSerial`]: owns the queue [`Consumer`](heapless::spsc::Consumer),
//!   provides the byte-stream API
//!
//! The halves only communicate through the queue and a few atomics, so
//! neither side takes a lock.

use core::sync::atomic::AtomicBool;

use heapless::spsc::Queue;

use crate::board::{Board, Clock};
use crate::config::cdc;
use crate::serial::interrupt::CdcInterrupt;
use crate::serial::line_info::SharedLineInfo;
use crate::serial::port::CdcSerial;
use crate::usb::{UsbBulkPort, UsbDeviceController};

/// State read and written by both halves
pub(crate) struct Shared {
    pub(crate) line: SharedLineInfo,
    /// Set by the pump when it stopped on a full queue with the OUT packet
    /// unreleased; cleared by the reader before it asks for a new pass
    pub(crate) rx_held: AtomicBool,
}

/// Backing storage for one CDC serial port.
///
/// `new` is `const`, so the state can live in a `static` (for example behind
/// a `StaticCell`) and the split halves get a `'static` lifetime.
///
/// The queue stores at most `N - 1` bytes.
pub struct CdcState<const N: usize = { cdc::RX_BUFFER_SIZE }> {
    rx: Queue<u8, N>,
    shared: Shared,
}

impl<const N: usize> CdcState<N> {
    /// Empty queue, default line coding, control lines low
    pub const fn new() -> Self {
        Self {
            rx: Queue::new(),
            shared: Shared {
                line: SharedLineInfo::new(),
                rx_held: AtomicBool::new(false),
            },
        }
    }

    /// Split into the interrupt-side and application-side handles.
    ///
    /// `usb` and `board` are used from the USB interrupt; `port` and
    /// `clock` from the application.
    pub fn split<U, B, P, C>(
        &mut self,
        usb: U,
        board: B,
        port: P,
        clock: C,
    ) -> (CdcInterrupt<'_, U, B, N>, CdcSerial<'_, P, C, N>)
    where
        U: UsbDeviceController,
        B: Board,
        P: UsbBulkPort,
        C: Clock,
    {
        let (producer, consumer) = self.rx.split();
        let shared = &self.shared;

        (
            CdcInterrupt::new(usb, board, producer, shared),
            CdcSerial::new(port, clock, consumer, shared),
        )
    }
}

impl<const N: usize> Default for CdcState<N> {
    fn default() -> Self {
        Self::new()
    }
}

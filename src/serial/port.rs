//! Application-side serial port over the CDC-ACM transport
//!
//! Owns the consumer half of the receive queue and the bulk IN side of the
//! device controller. Line info is read from atomics written by the
//! interrupt side, so nothing here takes a lock or blocks USB interrupts.

use core::sync::atomic::Ordering;

use heapless::spsc::Consumer;

use crate::board::Clock;
use crate::config::{cdc, endpoints, timing};
use crate::serial::line_info::{LineInfo, LineState};
use crate::serial::state::Shared;
use crate::usb::UsbBulkPort;

/// USB virtual serial port
pub struct CdcSerial<'a, P, C, const N: usize = { cdc::RX_BUFFER_SIZE }> {
    port: P,
    clock: C,
    rx: Consumer<'a, u8, N>,
    shared: &'a Shared,
    write_error: bool,
}

impl<'a, P: UsbBulkPort, C: Clock, const N: usize> CdcSerial<'a, P, C, N> {
    pub(crate) fn new(port: P, clock: C, rx: Consumer<'a, u8, N>, shared: &'a Shared) -> Self {
        Self {
            port,
            clock,
            rx,
            shared,
            write_error: false,
        }
    }

    /// Accepted for API compatibility; the USB transport ignores baud rate
    pub fn open(&mut self, baud_rate: u32) {
        log::trace!("open({}) ignored, transport always active", baud_rate);
    }

    /// Accepted for API compatibility; the USB transport ignores framing
    pub fn open_with_config(&mut self, baud_rate: u32, config: u8) {
        log::trace!(
            "open({}, {:#04x}) ignored, transport always active",
            baud_rate,
            config
        );
    }

    pub fn close(&mut self) {}

    /// Number of buffered bytes ready to read
    pub fn available(&self) -> usize {
        self.rx.len()
    }

    /// Next byte without consuming it
    pub fn peek(&self) -> Option<u8> {
        self.rx.peek().copied()
    }

    /// Consume one byte.
    ///
    /// If the pump stopped on a full queue, the first read after it asks the
    /// driver for a new data-ready event so the held packet is pulled in
    /// without waiting for more host traffic.
    pub fn read(&mut self) -> Option<u8> {
        let byte = self.rx.dequeue()?;

        if self.shared.rx_held.load(Ordering::Acquire) {
            self.shared.rx_held.store(false, Ordering::Release);
            self.port.request_rx(endpoints::OUT);
        }

        Some(byte)
    }

    /// Send bytes on the bulk IN endpoint.
    ///
    /// Returns the number of bytes the controller accepted. On failure the
    /// sticky write-error flag is set, the payload is dropped and 0 is
    /// returned.
    pub fn write(&mut self, data: &[u8]) -> usize {
        match self.port.send(endpoints::IN, data) {
            Ok(count) if count > 0 => count,
            Ok(_) => {
                log::warn!("bulk IN accepted 0 of {} bytes", data.len());
                self.write_error = true;
                0
            }
            Err(e) => {
                log::warn!("bulk IN send failed: {:?}", e);
                self.write_error = true;
                0
            }
        }
    }

    pub fn write_byte(&mut self, byte: u8) -> usize {
        self.write(&[byte])
    }

    /// Push any partially filled IN packet to the host now
    pub fn flush(&mut self) {
        self.port.flush(endpoints::IN);
    }

    /// True if a write has failed since the flag was last cleared
    pub fn write_error(&self) -> bool {
        self.write_error
    }

    pub fn clear_write_error(&mut self) {
        self.write_error = false;
    }

    /// Returns true once the host has opened the port.
    ///
    /// Always false during the first `OPEN_GUARD_MS` after boot. Each check
    /// that gets past the guard waits `OPEN_SETTLE_MS` before returning.
    pub fn is_open(&mut self) -> bool {
        if self.clock.millis() < timing::OPEN_GUARD_MS {
            return false;
        }

        let open = self.shared.line.state().is_active();
        self.clock.delay_ms(timing::OPEN_SETTLE_MS);
        open
    }

    pub fn line_info(&self) -> LineInfo {
        self.shared.line.load()
    }

    pub fn line_state(&self) -> LineState {
        self.shared.line.state()
    }

    pub fn baud_rate(&self) -> u32 {
        self.shared.line.baud_rate()
    }

    pub fn dtr(&self) -> bool {
        self.line_state().dtr()
    }

    pub fn rts(&self) -> bool {
        self.line_state().rts()
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub(crate) fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}

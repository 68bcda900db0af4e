//! Line coding and control line state
//!
//! # Wire Format
//!
//! GET_LINE_CODING / SET_LINE_CODING carry 7 bytes:
//! ```text
//! [dwDTERate: u32 LE][bCharFormat: u8][bParityType: u8][bDataBits: u8]
//! ```
//!
//! The raw field values are stored as received; the host may send values
//! outside the ranges defined by the CDC specification and gets them back
//! unchanged from GET_LINE_CODING.
//!
//! [`SharedLineInfo`] holds the live values. The control handler writes it
//! from the USB interrupt and the application reads it without a lock.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::config::line_defaults;
use crate::serial::CdcError;

/// Encoded line coding length
pub const LINE_CODING_LEN: usize = 7;

/// Stop bit setting (bCharFormat)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One = 0,
    OnePointFive = 1,
    Two = 2,
}

impl StopBits {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::One),
            1 => Some(Self::OnePointFive),
            2 => Some(Self::Two),
            _ => None,
        }
    }
}

/// Parity setting (bParityType)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None = 0,
    Odd = 1,
    Even = 2,
    Mark = 3,
    Space = 4,
}

impl Parity {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::None),
            1 => Some(Self::Odd),
            2 => Some(Self::Even),
            3 => Some(Self::Mark),
            4 => Some(Self::Space),
            _ => None,
        }
    }
}

/// Serial framing requested by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCoding {
    /// Baud rate (dwDTERate)
    pub baud_rate: u32,
    /// Raw bCharFormat
    pub char_format: u8,
    /// Raw bParityType
    pub parity_type: u8,
    /// Raw bDataBits
    pub data_bits: u8,
}

impl LineCoding {
    /// Encode into the 7-byte wire layout
    pub fn encode(&self) -> [u8; LINE_CODING_LEN] {
        let [b0, b1, b2, b3] = self.baud_rate.to_le_bytes();
        [b0, b1, b2, b3, self.char_format, self.parity_type, self.data_bits]
    }

    /// Decode from the 7-byte wire layout.
    ///
    /// Extra trailing bytes are ignored.
    pub fn decode(data: &[u8]) -> Result<Self, CdcError> {
        if data.len() < LINE_CODING_LEN {
            return Err(CdcError::InvalidLength);
        }

        Ok(Self {
            baud_rate: u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
            char_format: data[4],
            parity_type: data[5],
            data_bits: data[6],
        })
    }

    /// Decoded stop bits, None for values outside the CDC range
    pub fn stop_bits(&self) -> Option<StopBits> {
        StopBits::from_byte(self.char_format)
    }

    /// Decoded parity, None for values outside the CDC range
    pub fn parity(&self) -> Option<Parity> {
        Parity::from_byte(self.parity_type)
    }
}

impl Default for LineCoding {
    fn default() -> Self {
        Self {
            baud_rate: line_defaults::BAUD_RATE,
            char_format: line_defaults::CHAR_FORMAT,
            parity_type: line_defaults::PARITY_TYPE,
            data_bits: line_defaults::DATA_BITS,
        }
    }
}

/// Control line bitmap from SET_CONTROL_LINE_STATE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineState(pub u8);

impl LineState {
    /// Data Terminal Ready
    pub const DTR: u8 = 0x01;
    /// Request To Send
    pub const RTS: u8 = 0x02;

    pub fn dtr(&self) -> bool {
        self.0 & Self::DTR != 0
    }

    pub fn rts(&self) -> bool {
        self.0 & Self::RTS != 0
    }

    /// True if any line is asserted
    pub fn is_active(&self) -> bool {
        self.0 > 0
    }
}

/// Snapshot of line coding plus control line state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineInfo {
    pub coding: LineCoding,
    pub state: LineState,
}

/// Line info written by the interrupt side and read by the application.
///
/// Every field is a separate atomic with plain loads and stores, so it
/// works on cores without compare-and-swap. A reader racing a
/// SET_LINE_CODING may see a mix of old and new coding fields; the line
/// state byte is always read whole.
pub struct SharedLineInfo {
    baud_rate: AtomicU32,
    char_format: AtomicU8,
    parity_type: AtomicU8,
    data_bits: AtomicU8,
    state: AtomicU8,
}

impl SharedLineInfo {
    /// Default line coding (115200 8N1), all control lines low
    pub const fn new() -> Self {
        Self {
            baud_rate: AtomicU32::new(line_defaults::BAUD_RATE),
            char_format: AtomicU8::new(line_defaults::CHAR_FORMAT),
            parity_type: AtomicU8::new(line_defaults::PARITY_TYPE),
            data_bits: AtomicU8::new(line_defaults::DATA_BITS),
            state: AtomicU8::new(0),
        }
    }

    pub fn load(&self) -> LineInfo {
        LineInfo {
            coding: self.coding(),
            state: self.state(),
        }
    }

    pub fn coding(&self) -> LineCoding {
        LineCoding {
            baud_rate: self.baud_rate(),
            char_format: self.char_format.load(Ordering::Acquire),
            parity_type: self.parity_type.load(Ordering::Acquire),
            data_bits: self.data_bits.load(Ordering::Acquire),
        }
    }

    pub fn set_coding(&self, coding: LineCoding) {
        self.char_format.store(coding.char_format, Ordering::Release);
        self.parity_type.store(coding.parity_type, Ordering::Release);
        self.data_bits.store(coding.data_bits, Ordering::Release);
        self.baud_rate.store(coding.baud_rate, Ordering::Release);
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate.load(Ordering::Acquire)
    }

    pub fn state(&self) -> LineState {
        LineState(self.state.load(Ordering::Acquire))
    }

    pub fn set_state(&self, state: LineState) {
        self.state.store(state.0, Ordering::Release);
    }
}

impl Default for SharedLineInfo {
    fn default() -> Self {
        Self::new()
    }
}

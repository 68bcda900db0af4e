//! Transport configuration constants for the CDC-ACM serial port

/// Receive buffer configuration
pub mod cdc {
    /// Ring buffer capacity in bytes. One slot is always left unused,
    /// so at most `RX_BUFFER_SIZE - 1` bytes can be pending.
    pub const RX_BUFFER_SIZE: usize = 1024;
}

/// Endpoint numbers and packet sizes
pub mod endpoints {
    /// Control endpoint (EP0)
    pub const CONTROL: u8 = 0;
    /// Interrupt IN endpoint for ACM notifications
    pub const ACM: u8 = 1;
    /// Bulk OUT endpoint (host to device)
    pub const OUT: u8 = 2;
    /// Bulk IN endpoint (device to host)
    pub const IN: u8 = 3;

    /// Bulk endpoint max packet size (full speed)
    pub const BULK_PACKET_SIZE: u16 = 64;
    pub const ACM_PACKET_SIZE: u16 = 0x10;
    /// Notification endpoint polling interval in frames
    pub const ACM_INTERVAL: u8 = 0x10;
}

/// Interface numbers
pub mod interfaces {
    pub const ACM: u8 = 0;
    pub const DATA: u8 = 1;
}

/// Line coding reported before the host sets one (115200 8N1)
pub mod line_defaults {
    pub const BAUD_RATE: u32 = 115200;
    /// 1 stop bit
    pub const CHAR_FORMAT: u8 = 0x00;
    /// No parity
    pub const PARITY_TYPE: u8 = 0x00;
    pub const DATA_BITS: u8 = 0x08;
}

/// Timing constants
pub mod timing {
    /// `is_open()` reports false until this much time has elapsed since boot
    /// (suppresses spurious opens right after an upload).
    pub const OPEN_GUARD_MS: u32 = 500;

    /// Settle delay applied on every `is_open()` check
    pub const OPEN_SETTLE_MS: u32 = 10;

    /// Baud rate that arms the bootloader reset ("1200 baud touch")
    pub const BOOTLOADER_BAUD_RATE: u32 = 1200;

    /// Delay between DTR drop at 1200 baud and the device reset
    pub const BOOTLOADER_RESET_DELAY_MS: u32 = 250;

    /// Upper bound on waiting for the SET_LINE_CODING data stage
    pub const LINE_CODING_TIMEOUT_MS: u32 = 50;

    /// Upper bound on a blocking read through `embedded_io::Read`
    pub const READ_TIMEOUT_MS: u32 = 1000;

    /// Delay between polls in bounded wait loops
    pub const POLL_INTERVAL_MS: u32 = 1;
}

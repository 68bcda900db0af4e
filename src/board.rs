//! Board timing and reset traits for abstraction and testability
//!
//! These traits define the timing and reset primitives the transport needs
//! from the board support package, allowing them to be swapped with a mock
//! for testing.
//!
//! The application side of the transport only needs a [`Clock`]. The
//! interrupt side also arms and disarms the bootloader reset, so it takes a
//! [`Board`].

/// Millisecond time base
pub trait Clock {
    /// Milliseconds elapsed since boot (wraps at `u32::MAX`)
    fn millis(&self) -> u32;

    /// Busy-wait for the given number of milliseconds
    fn delay_ms(&mut self, ms: u32);
}

/// Board timing and reset services
pub trait Board: Clock {
    /// Arm a device reset that fires after `delay_ms` milliseconds
    ///
    /// Arming again replaces any reset that is already pending.
    fn schedule_reset(&mut self, delay_ms: u32);

    /// Disarm a pending reset. No effect if none is pending.
    fn cancel_reset(&mut self);
}

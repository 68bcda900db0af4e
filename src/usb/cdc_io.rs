//! embedded_io wrapper for the application-side serial port.
//!
//! Provides blocking Read/Write implementations on top of the byte-level
//! API. Reads wait for the interrupt side to fill the queue with bounded
//! polling and fail with [`CdcError::Timeout`] instead of blocking forever.

use embedded_io::{ErrorType, Read, ReadReady, Write, WriteReady};

use crate::board::Clock;
use crate::config::timing;
use crate::serial::{CdcError, CdcSerial};
use crate::usb::UsbBulkPort;

impl embedded_io::Error for CdcError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            CdcError::Timeout => embedded_io::ErrorKind::TimedOut,
            CdcError::InvalidLength => embedded_io::ErrorKind::InvalidData,
            CdcError::WriteFailed | CdcError::Endpoint(_) => embedded_io::ErrorKind::Other,
        }
    }
}

impl<P: UsbBulkPort, C: Clock, const N: usize> ErrorType for CdcSerial<'_, P, C, N> {
    type Error = CdcError;
}

impl<P: UsbBulkPort, C: Clock, const N: usize> Read for CdcSerial<'_, P, C, N> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }

        let start = self.clock().millis();
        while self.available() == 0 {
            if self.clock().millis().wrapping_sub(start) >= timing::READ_TIMEOUT_MS {
                return Err(CdcError::Timeout);
            }
            self.clock_mut().delay_ms(timing::POLL_INTERVAL_MS);
        }

        let mut count = 0;
        for slot in buf.iter_mut() {
            match CdcSerial::read(self) {
                Some(byte) => {
                    *slot = byte;
                    count += 1;
                }
                None => break,
            }
        }

        Ok(count)
    }
}

impl<P: UsbBulkPort, C: Clock, const N: usize> ReadReady for CdcSerial<'_, P, C, N> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.available() > 0)
    }
}

impl<P: UsbBulkPort, C: Clock, const N: usize> Write for CdcSerial<'_, P, C, N> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }

        match CdcSerial::write(self, buf) {
            0 => Err(CdcError::WriteFailed),
            n => Ok(n),
        }
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        CdcSerial::flush(self);
        Ok(())
    }
}

impl<P: UsbBulkPort, C: Clock, const N: usize> WriteReady for CdcSerial<'_, P, C, N> {
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        // Writes go straight to the endpoint; nothing is queued locally
        Ok(true)
    }
}

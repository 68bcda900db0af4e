//! Errors surfaced by the CDC serial transport

use crate::usb::EndpointError;

/// Errors that can occur during CDC transport operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdcError {
    /// Bounded wait expired (control data stage or blocking read)
    Timeout,
    /// Control data stage shorter than the request requires
    InvalidLength,
    /// The IN endpoint accepted no data
    WriteFailed,
    /// Device controller error
    Endpoint(EndpointError),
}

impl From<EndpointError> for CdcError {
    fn from(error: EndpointError) -> Self {
        CdcError::Endpoint(error)
    }
}

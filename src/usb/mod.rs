//! USB device side of the CDC-ACM transport.
//!
//! - `traits`: device-controller operations the transport consumes, split by
//!   calling context
//! - `descriptor`: interface descriptor block handed to enumeration
//! - `cdc_io`: embedded_io Read/Write over the application-side port

pub mod cdc_io;
pub mod descriptor;
pub mod traits;

pub use descriptor::{interface_descriptor, interface_descriptor_len};
pub use traits::{EndpointError, UsbBulkPort, UsbDeviceController};

#[cfg(test)]
pub use traits::mock;

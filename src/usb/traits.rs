//! USB device-controller traits for abstraction and testability
//!
//! These traits define the endpoint-level operations the CDC transport needs
//! from the device-controller driver, allowing the actual hardware driver to
//! be swapped with a mock for testing.
//!
//! The operations are split by the context that calls them:
//!
//! - [`UsbDeviceController`]: the USB interrupt (bulk OUT and control endpoint)
//! - [`UsbBulkPort`]: the application (bulk IN, receive re-arm)
//!
//! A driver usually hands out one cheap handle per trait over the same
//! peripheral.

/// Errors reported by the device controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointError {
    /// Endpoint is not configured (device not enumerated or bus reset)
    Disabled,
    /// Data does not fit into the endpoint buffer
    BufferOverflow,
}

/// Device-controller operations used from the USB interrupt
///
/// Endpoints are identified by number; direction is implied by the
/// operation.
pub trait UsbDeviceController {
    /// Returns true if the OUT endpoint holds unread data
    fn is_data_available(&mut self, endpoint: u8) -> bool;

    /// Pull one byte from the OUT endpoint
    ///
    /// Only valid after `is_data_available()` returned true.
    fn receive_byte(&mut self, endpoint: u8) -> u8;

    /// Hand the current OUT packet buffer back to the hardware so the next
    /// packet can be accepted
    fn release_rx(&mut self, endpoint: u8);

    /// Number of bytes received in the control endpoint FIFO for the
    /// current data stage
    fn fifo_byte_count(&mut self, endpoint: u8) -> usize;

    /// Copy the received control data stage into `buf`
    ///
    /// Returns the number of bytes copied.
    fn read_control(&mut self, endpoint: u8, buf: &mut [u8]) -> usize;

    /// Send the data stage of a device-to-host control transfer
    fn send_control(&mut self, endpoint: u8, data: &[u8]) -> Result<(), EndpointError>;
}

/// Device-controller operations used from the application
pub trait UsbBulkPort {
    /// Queue data on an IN endpoint
    ///
    /// Returns the number of bytes accepted by the controller.
    fn send(&mut self, endpoint: u8, data: &[u8]) -> Result<usize, EndpointError>;

    /// Transmit any partially filled IN packet now
    fn flush(&mut self, endpoint: u8);

    /// Ask the driver to deliver the OUT data-ready event again, usually by
    /// pending the USB interrupt
    ///
    /// Called when the receive buffer has room for a packet that was held
    /// back while the buffer was full.
    fn request_rx(&mut self, endpoint: u8);
}

#[cfg(test)]
pub mod mock {
    //! Mock USB device controller for testing
    //!
    //! Both traits are implemented on `&MockUsbController`, so one mock
    //! records what the interrupt side and the application side do.

    use super::*;
    use core::cell::{Cell, RefCell};
    use heapless::{Deque, Vec};

    /// Maximum bytes the mock host can have in flight
    pub const MOCK_HOST_BUFFER: usize = 4096;

    /// Control data stage capacity
    pub const MOCK_CONTROL_BUFFER: usize = 64;

    /// Mock device controller for unit testing
    pub struct MockUsbController {
        /// Bytes sent by the host, not yet pulled from the OUT endpoint
        host_rx: RefCell<Deque<u8, MOCK_HOST_BUFFER>>,
        /// Data sent on IN endpoints
        tx_buffer: RefCell<Vec<u8, MOCK_HOST_BUFFER>>,
        /// Control data stage sent by the host
        control_rx: RefCell<Vec<u8, MOCK_CONTROL_BUFFER>>,
        /// FIFO polls left before the control data stage shows up
        control_delay: Cell<u32>,
        /// Maximum bytes a single read_control() copies
        control_read_limit: Cell<Option<usize>>,
        /// Last control data stage sent
        control_response: RefCell<Vec<u8, MOCK_CONTROL_BUFFER>>,
        /// Number of release_rx() calls
        release_count: Cell<u32>,
        /// Number of flush() calls
        flush_count: Cell<u32>,
        /// Number of request_rx() calls
        rx_request_count: Cell<u32>,
        /// Maximum bytes accepted per send() call
        send_limit: Cell<Option<usize>>,
        /// Error to return on next send
        next_send_error: Cell<Option<EndpointError>>,
    }

    impl MockUsbController {
        /// Create a new mock controller with no pending data
        pub fn new() -> Self {
            Self {
                host_rx: RefCell::new(Deque::new()),
                tx_buffer: RefCell::new(Vec::new()),
                control_rx: RefCell::new(Vec::new()),
                control_delay: Cell::new(0),
                control_read_limit: Cell::new(None),
                control_response: RefCell::new(Vec::new()),
                release_count: Cell::new(0),
                flush_count: Cell::new(0),
                rx_request_count: Cell::new(0),
                send_limit: Cell::new(None),
                next_send_error: Cell::new(None),
            }
        }

        /// Queue bytes as if sent by the host on the OUT endpoint
        pub fn queue_host_data(&self, data: &[u8]) {
            let mut rx = self.host_rx.borrow_mut();
            for &byte in data {
                let _ = rx.push_back(byte);
            }
        }

        /// Number of host bytes not yet pulled from the endpoint
        pub fn pending_host_bytes(&self) -> usize {
            self.host_rx.borrow().len()
        }

        /// Queue a control data stage that lands in the FIFO after
        /// `after_polls` calls to fifo_byte_count()
        pub fn queue_control_data(&self, data: &[u8], after_polls: u32) {
            let mut rx = self.control_rx.borrow_mut();
            rx.clear();
            let _ = rx.extend_from_slice(data);
            self.control_delay.set(after_polls);
        }

        /// Limit how many bytes a single read_control() copies
        pub fn set_control_read_limit(&self, limit: usize) {
            self.control_read_limit.set(Some(limit));
        }

        /// Get all data written to IN endpoints
        pub fn get_tx_data(&self) -> Vec<u8, MOCK_HOST_BUFFER> {
            self.tx_buffer.borrow().clone()
        }

        /// Get the last control data stage
        pub fn get_control_response(&self) -> Vec<u8, MOCK_CONTROL_BUFFER> {
            self.control_response.borrow().clone()
        }

        /// Limit how many bytes a single send() accepts
        pub fn set_send_limit(&self, limit: usize) {
            self.send_limit.set(Some(limit));
        }

        /// Set an error to be returned by the next send() call
        pub fn set_next_send_error(&self, error: EndpointError) {
            self.next_send_error.set(Some(error));
        }

        pub fn release_count(&self) -> u32 {
            self.release_count.get()
        }

        pub fn flush_count(&self) -> u32 {
            self.flush_count.get()
        }

        pub fn rx_request_count(&self) -> u32 {
            self.rx_request_count.get()
        }
    }

    impl Default for MockUsbController {
        fn default() -> Self {
            Self::new()
        }
    }

    impl UsbDeviceController for &MockUsbController {
        fn is_data_available(&mut self, _endpoint: u8) -> bool {
            !self.host_rx.borrow().is_empty()
        }

        fn receive_byte(&mut self, _endpoint: u8) -> u8 {
            self.host_rx.borrow_mut().pop_front().unwrap_or(0)
        }

        fn release_rx(&mut self, _endpoint: u8) {
            self.release_count.set(self.release_count.get() + 1);
        }

        fn fifo_byte_count(&mut self, _endpoint: u8) -> usize {
            let delay = self.control_delay.get();
            if delay > 0 {
                self.control_delay.set(delay - 1);
                return 0;
            }
            self.control_rx.borrow().len()
        }

        fn read_control(&mut self, _endpoint: u8, buf: &mut [u8]) -> usize {
            if self.control_delay.get() > 0 {
                return 0;
            }

            let mut rx = self.control_rx.borrow_mut();
            let mut count = core::cmp::min(buf.len(), rx.len());
            if let Some(limit) = self.control_read_limit.get() {
                count = core::cmp::min(count, limit);
            }
            buf[..count].copy_from_slice(&rx[..count]);
            rx.clear();
            count
        }

        fn send_control(&mut self, _endpoint: u8, data: &[u8]) -> Result<(), EndpointError> {
            let mut response = self.control_response.borrow_mut();
            response.clear();
            response
                .extend_from_slice(data)
                .map_err(|_| EndpointError::BufferOverflow)
        }
    }

    impl UsbBulkPort for &MockUsbController {
        fn send(&mut self, _endpoint: u8, data: &[u8]) -> Result<usize, EndpointError> {
            if let Some(error) = self.next_send_error.take() {
                return Err(error);
            }

            let count = match self.send_limit.get() {
                Some(limit) => core::cmp::min(limit, data.len()),
                None => data.len(),
            };

            self.tx_buffer
                .borrow_mut()
                .extend_from_slice(&data[..count])
                .map_err(|_| EndpointError::BufferOverflow)?;

            Ok(count)
        }

        fn flush(&mut self, _endpoint: u8) {
            self.flush_count.set(self.flush_count.get() + 1);
        }

        fn request_rx(&mut self, _endpoint: u8) {
            self.rx_request_count.set(self.rx_request_count.get() + 1);
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_mock_receive_in_order() {
            let mock = MockUsbController::new();
            let mut usb = &mock;
            mock.queue_host_data(&[0x01, 0x02]);

            assert!(usb.is_data_available(2));
            assert_eq!(usb.receive_byte(2), 0x01);
            assert_eq!(usb.receive_byte(2), 0x02);
            assert!(!usb.is_data_available(2));
        }

        #[test]
        fn test_mock_send_error_cleared() {
            let mock = MockUsbController::new();
            let mut usb = &mock;

            mock.set_next_send_error(EndpointError::Disabled);
            assert_eq!(usb.send(3, &[0x01]), Err(EndpointError::Disabled));

            // Error should be cleared
            assert_eq!(usb.send(3, &[0x02]), Ok(1));
            assert_eq!(mock.get_tx_data().as_slice(), &[0x02]);
        }

        #[test]
        fn test_mock_send_limit() {
            let mock = MockUsbController::new();
            let mut usb = &mock;
            mock.set_send_limit(2);

            assert_eq!(usb.send(3, &[1, 2, 3, 4]), Ok(2));
            assert_eq!(mock.get_tx_data().as_slice(), &[1, 2]);
        }

        #[test]
        fn test_mock_control_data_arrives_late() {
            let mock = MockUsbController::new();
            let mut usb = &mock;
            mock.queue_control_data(&[1, 2, 3], 2);

            let mut buf = [0u8; 8];
            assert_eq!(usb.fifo_byte_count(0), 0);
            assert_eq!(usb.read_control(0, &mut buf), 0);
            assert_eq!(usb.fifo_byte_count(0), 0);
            assert_eq!(usb.fifo_byte_count(0), 3);

            assert_eq!(usb.read_control(0, &mut buf), 3);
            assert_eq!(&buf[..3], &[1, 2, 3]);
            // The data stage is consumed by the read
            assert_eq!(usb.fifo_byte_count(0), 0);
        }
    }
}

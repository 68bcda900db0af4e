//! Receive pump
//!
//! Moves bytes from the bulk OUT endpoint into the receive queue. The pump
//! never blocks: a pass ends when the queue is full or the endpoint runs
//! dry. When the queue fills first the endpoint packet is left unreleased,
//! so the hardware NAKs the host until the application drains the queue.

use heapless::spsc::Producer;

use crate::usb::UsbDeviceController;

/// Run one pump pass and return the number of bytes moved.
pub fn pump<U: UsbDeviceController, const N: usize>(
    producer: &mut Producer<'_, u8, N>,
    usb: &mut U,
    endpoint: u8,
) -> usize {
    let mut moved = 0;

    while producer.ready() {
        if !usb.is_data_available(endpoint) {
            // Packet fully drained, let the hardware accept the next one
            usb.release_rx(endpoint);
            break;
        }

        let byte = usb.receive_byte(endpoint);
        if producer.enqueue(byte).is_err() {
            // ready() was checked above and only this producer fills the queue
            break;
        }
        moved += 1;
    }

    log::trace!("rx pump moved {} bytes, {} buffered", moved, producer.len());
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::endpoints;
    use crate::usb::mock::MockUsbController;
    use heapless::spsc::Queue;

    #[test]
    fn test_pump_drains_endpoint() {
        let mut queue: Queue<u8, 16> = Queue::new();
        let (mut producer, mut consumer) = queue.split();
        let usb = MockUsbController::new();
        usb.queue_host_data(&[0x10, 0x20, 0x30]);

        let moved = pump(&mut producer, &mut &usb, endpoints::OUT);

        assert_eq!(moved, 3);
        assert_eq!(usb.release_count(), 1);
        assert_eq!(consumer.dequeue(), Some(0x10));
        assert_eq!(consumer.dequeue(), Some(0x20));
        assert_eq!(consumer.dequeue(), Some(0x30));
    }

    #[test]
    fn test_pump_stops_when_full() {
        let mut queue: Queue<u8, 8> = Queue::new();
        let (mut producer, consumer) = queue.split();
        let usb = MockUsbController::new();
        usb.queue_host_data(&[0xAB; 10]);

        let moved = pump(&mut producer, &mut &usb, endpoints::OUT);

        // One slot stays unused
        assert_eq!(moved, 7);
        assert_eq!(consumer.len(), 7);
        // Remaining bytes stay in the endpoint, packet not released
        assert_eq!(usb.pending_host_bytes(), 3);
        assert_eq!(usb.release_count(), 0);
    }

    #[test]
    fn test_pump_empty_endpoint_releases() {
        let mut queue: Queue<u8, 8> = Queue::new();
        let (mut producer, _) = queue.split();
        let usb = MockUsbController::new();

        assert_eq!(pump(&mut producer, &mut &usb, endpoints::OUT), 0);
        assert_eq!(usb.release_count(), 1);
    }

    #[test]
    fn test_pump_full_buffer_moves_nothing() {
        let mut queue: Queue<u8, 4> = Queue::new();
        let (mut producer, _) = queue.split();
        let usb = MockUsbController::new();
        usb.queue_host_data(&[1, 2, 3, 4]);

        assert_eq!(pump(&mut producer, &mut &usb, endpoints::OUT), 3);
        assert_eq!(pump(&mut producer, &mut &usb, endpoints::OUT), 0);
        assert_eq!(producer.len(), 3);
        assert_eq!(usb.pending_host_bytes(), 1);
    }

    #[test]
    fn test_pump_resumes_after_consumer_drains() {
        let mut queue: Queue<u8, 4> = Queue::new();
        let (mut producer, mut consumer) = queue.split();
        let usb = MockUsbController::new();
        usb.queue_host_data(&[1, 2, 3, 4, 5]);

        assert_eq!(pump(&mut producer, &mut &usb, endpoints::OUT), 3);
        assert_eq!(consumer.dequeue(), Some(1));
        assert_eq!(consumer.dequeue(), Some(2));

        // Indices wrap past the end of the storage
        assert_eq!(pump(&mut producer, &mut &usb, endpoints::OUT), 2);
        assert_eq!(usb.release_count(), 0);
        assert_eq!(consumer.dequeue(), Some(3));
        assert_eq!(consumer.dequeue(), Some(4));
        assert_eq!(consumer.dequeue(), Some(5));
        assert_eq!(consumer.dequeue(), None);
    }
}

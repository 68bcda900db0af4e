//! CDC-ACM interface descriptor block
//!
//! Two interfaces, laid out the way host CDC-ACM drivers expect:
//!
//! ```text
//! [IAD]                               (composite devices only)
//! Interface 0: communication, ACM
//!   Header functional       (CDC 1.10)
//!   ACM functional          (line coding + line state + break)
//!   Union functional        (0 = master, 1 = slave)
//!   Call management         (device handles call management, data on 1)
//!   Endpoint 1 IN, interrupt (notifications)
//! Interface 1: data
//!   Endpoint 2 OUT, bulk
//!   Endpoint 3 IN, bulk
//! ```

use crate::config::{endpoints, interfaces};
use heapless::Vec;

/// Descriptor type codes
pub mod descriptor_type {
    pub const INTERFACE: u8 = 0x04;
    pub const ENDPOINT: u8 = 0x05;
    pub const INTERFACE_ASSOCIATION: u8 = 0x0B;
    pub const CS_INTERFACE: u8 = 0x24;
}

/// Class codes
pub mod class {
    pub const COMMUNICATION: u8 = 0x02;
    pub const DATA: u8 = 0x0A;
    /// Communication subclass: Abstract Control Model
    pub const ABSTRACT_CONTROL_MODEL: u8 = 0x02;
}

/// CDC functional descriptor subtypes
pub mod functional {
    pub const HEADER: u8 = 0x00;
    pub const CALL_MANAGEMENT: u8 = 0x01;
    pub const ABSTRACT_CONTROL_MANAGEMENT: u8 = 0x02;
    pub const UNION: u8 = 0x06;

    /// bcdCDC 1.10
    pub const CDC_VERSION: u16 = 0x0110;

    /// SET/GET_LINE_CODING, SET_CONTROL_LINE_STATE and SEND_BREAK supported
    pub const ACM_CAPABILITIES: u8 = 0x06;
}

/// Endpoint attribute transfer types
pub mod transfer {
    pub const BULK: u8 = 0x02;
    pub const INTERRUPT: u8 = 0x03;
}

/// Direction bit for IN endpoint addresses
pub const ENDPOINT_DIR_IN: u8 = 0x80;

/// Length of the descriptor block without the IAD
pub const INTERFACE_DESCRIPTOR_LEN: usize = 58;

/// Length of the Interface Association Descriptor
pub const IAD_LEN: usize = 8;

/// Upper bound on the descriptor block size
pub const MAX_DESCRIPTOR_LEN: usize = INTERFACE_DESCRIPTOR_LEN + IAD_LEN;

/// Descriptor block storage
pub type DescriptorBlock = Vec<u8, MAX_DESCRIPTOR_LEN>;

/// Length of the descriptor block, with or without the IAD prefix
pub const fn interface_descriptor_len(with_iad: bool) -> usize {
    if with_iad {
        INTERFACE_DESCRIPTOR_LEN + IAD_LEN
    } else {
        INTERFACE_DESCRIPTOR_LEN
    }
}

/// Build the CDC-ACM interface descriptor block.
///
/// `with_iad` prepends an Interface Association Descriptor, needed when the
/// CDC function shares the device with other classes.
pub fn interface_descriptor(with_iad: bool) -> DescriptorBlock {
    let mut block = DescriptorBlock::new();

    if with_iad {
        push(&mut block, &[
            IAD_LEN as u8,
            descriptor_type::INTERFACE_ASSOCIATION,
            interfaces::ACM,
            2,
            class::COMMUNICATION,
            class::ABSTRACT_CONTROL_MODEL,
            0,
            0,
        ]);
    }

    push_interface(
        &mut block,
        interfaces::ACM,
        1,
        class::COMMUNICATION,
        class::ABSTRACT_CONTROL_MODEL,
    );
    let [version_lo, version_hi] = functional::CDC_VERSION.to_le_bytes();
    push_functional(&mut block, functional::HEADER, &[version_lo, version_hi]);
    push_functional(
        &mut block,
        functional::ABSTRACT_CONTROL_MANAGEMENT,
        &[functional::ACM_CAPABILITIES],
    );
    push_functional(&mut block, functional::UNION, &[interfaces::ACM, interfaces::DATA]);
    push_functional(&mut block, functional::CALL_MANAGEMENT, &[1, 1]);
    push_endpoint(
        &mut block,
        ENDPOINT_DIR_IN | endpoints::ACM,
        transfer::INTERRUPT,
        endpoints::ACM_PACKET_SIZE,
        endpoints::ACM_INTERVAL,
    );

    push_interface(&mut block, interfaces::DATA, 2, class::DATA, 0);
    push_endpoint(&mut block, endpoints::OUT, transfer::BULK, endpoints::BULK_PACKET_SIZE, 0);
    push_endpoint(
        &mut block,
        ENDPOINT_DIR_IN | endpoints::IN,
        transfer::BULK,
        endpoints::BULK_PACKET_SIZE,
        0,
    );

    block
}

fn push(block: &mut DescriptorBlock, bytes: &[u8]) {
    let pushed = block.extend_from_slice(bytes);
    debug_assert!(pushed.is_ok(), "MAX_DESCRIPTOR_LEN too small for descriptor block");
}

fn push_interface(
    block: &mut DescriptorBlock,
    number: u8,
    num_endpoints: u8,
    class: u8,
    subclass: u8,
) {
    push(block, &[
        9,
        descriptor_type::INTERFACE,
        number,
        0, // alternate setting
        num_endpoints,
        class,
        subclass,
        0, // protocol
        0, // iInterface
    ]);
}

fn push_functional(block: &mut DescriptorBlock, subtype: u8, data: &[u8]) {
    push(block, &[3 + data.len() as u8, descriptor_type::CS_INTERFACE, subtype]);
    push(block, data);
}

fn push_endpoint(
    block: &mut DescriptorBlock,
    address: u8,
    attributes: u8,
    packet_size: u16,
    interval: u8,
) {
    let [size_lo, size_hi] = packet_size.to_le_bytes();
    push(block, &[
        7,
        descriptor_type::ENDPOINT,
        address,
        attributes,
        size_lo,
        size_hi,
        interval,
    ]);
}

use super::*;

/// Direction encoded in bit 7 of the endpoint address.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// Transfer type bits of the endpoint attributes byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum EndpointAttributes {
    Control = 0,
    Isochronous,
    Bulk,
    Interrupt,
}

/// An opened USB endpoint, as supplied by the backend that claimed the
/// MTP interface.
#[derive(Clone, Copy, Debug, Default)]
pub struct UsbEndpoint {
    pub address: u8,
    pub attributes: u8,
    pub max_packet_size: u16,
    pub interval: u8,
}

impl UsbEndpoint {
    /// A bulk endpoint descriptor.
    pub fn bulk(address: u8, max_packet_size: u16) -> Self {
        Self {
            address,
            attributes: EndpointAttributes::Bulk as u8,
            max_packet_size,
            interval: 0,
        }
    }

    /// An interrupt endpoint descriptor.
    pub fn interrupt(address: u8, max_packet_size: u16, interval: u8) -> Self {
        Self {
            address,
            attributes: EndpointAttributes::Interrupt as u8,
            max_packet_size,
            interval,
        }
    }

    pub fn direction(&self) -> Direction {
        if self.address & 0x80 != 0 {
            Direction::In
        } else {
            Direction::Out
        }
    }
}

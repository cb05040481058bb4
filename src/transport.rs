use super::*;

/// Identifier of a submitted URB, assigned by [`BulkPipe`](crate::BulkPipe).
///
/// The pipe keys its pending-URB map with this id; completions returned by
/// [`UsbTransport::reap`] must echo it.
pub type UrbId = u64;

/// URB transfer types, mirroring the kernel usbdevfs values.
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum UrbType {
    Control = 0,
    Isochronous,
    Bulk,
    Interrupt,
}

/// This URB continues the previous one on the same endpoint; the kernel
/// must not synthesize a short packet at the submit boundary.
pub const URB_BULK_CONTINUATION: u32 = 0x04;

/// Bulk URB buffers hold up to this many packets; other types hold one.
pub const BULK_PACKETS_PER_URB: usize = 1024;

/// A USB Request Block as handed to the transport.
///
/// For OUT endpoints `buffer` carries the payload and `buffer_length`
/// equals its length; for IN endpoints `buffer` is empty and
/// `buffer_length` is the requested capacity.
#[derive(Clone, Debug)]
pub struct Urb {
    pub endpoint: u8,
    pub urb_type: UrbType,
    pub flags: u32,
    pub buffer: Vec<u8>,
    pub buffer_length: usize,
}

impl Urb {
    fn packets_per_buffer(urb_type: UrbType) -> usize {
        if urb_type == UrbType::Bulk {
            BULK_PACKETS_PER_URB
        } else {
            1
        }
    }

    /// An IN URB sized to the endpoint's full buffer capacity.
    pub fn receive(urb_type: UrbType, ep: &UsbEndpoint) -> Self {
        Self {
            endpoint: ep.address,
            urb_type,
            flags: 0,
            buffer: Vec::new(),
            buffer_length: Self::packets_per_buffer(urb_type) * ep.max_packet_size as usize,
        }
    }

    /// An OUT URB carrying `payload`.
    pub fn send(urb_type: UrbType, ep: &UsbEndpoint, payload: Vec<u8>) -> Self {
        let buffer_length = payload.len();
        Self {
            endpoint: ep.address,
            urb_type,
            flags: 0,
            buffer: payload,
            buffer_length,
        }
    }

    pub fn set_continuation(&mut self, continuation: bool) {
        if continuation {
            self.flags |= URB_BULK_CONTINUATION;
        } else {
            self.flags &= !URB_BULK_CONTINUATION;
        }
    }
}

/// A reaped URB: `data` holds the received bytes for IN endpoints and is
/// empty for OUT endpoints, where `actual_length` is the byte count the
/// device accepted.
#[derive(Clone, Debug)]
pub struct UrbCompletion {
    pub id: UrbId,
    pub actual_length: usize,
    pub data: Vec<u8>,
}

/// A control-OUT transfer on the device's default control endpoint.
#[derive(Clone, Debug, Default)]
pub struct ControlRequest {
    /// bmRequestType
    pub request_type: u8,
    /// bRequest
    pub request: u8,
    /// wValue
    pub value: u16,
    /// wIndex
    pub index: u16,
    /// payload (wLength is its size)
    pub data: Vec<u8>,
}

/// The low-level transport supplied by a USB backend.
///
/// Implementations queue work on [`submit`](Self::submit) and deliver
/// completions from [`reap`](Self::reap) in device order. A fused backend
/// (such as [`RusbTransport`](crate::RusbTransport)) may defer the actual
/// transfer to reap time; the split exists so the pipe can interleave
/// control transfers between completions and discard timed-out URBs.
///
/// Timeouts are milliseconds: `0` polls once, negative waits forever.
pub trait UsbTransport: Send + Sync {
    /// Queue a URB under the pipe-assigned `id`.
    fn submit(&self, id: UrbId, urb: &Urb) -> Result<()>;

    /// Block until a queued URB completes.
    fn reap(&self, timeout_ms: i32) -> Result<UrbCompletion>;

    /// Drop a queued URB that will never be reaped.
    fn discard(&self, id: UrbId) -> Result<()>;

    /// Synchronous control transfer on the default control endpoint.
    /// Returns the number of bytes transferred.
    fn control(&self, request: &ControlRequest, timeout_ms: i32) -> Result<usize>;

    /// Clear the halt/data-toggle state of `endpoint`.
    fn clear_halt(&self, endpoint: u8) -> Result<()>;
}

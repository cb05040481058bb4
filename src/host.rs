//! Host USB transport backed by rusb (libusb).
use super::*;
use std::time::Duration;

fn map_rusb(err: rusb::Error) -> Error {
    match err {
        rusb::Error::Timeout => Error::Timeout,
        rusb::Error::Busy => Error::Busy,
        rusb::Error::NoDevice | rusb::Error::NotFound => Error::Disconnected,
        rusb::Error::NotSupported => Error::NotSupported,
        other => Error::Io(std::io::Error::other(other)),
    }
}

/// libusb expresses an infinite timeout as zero; poll-once has no direct
/// equivalent and becomes the shortest wait it accepts.
fn to_duration(timeout_ms: i32) -> Duration {
    match timeout_ms {
        t if t < 0 => Duration::ZERO,
        0 => Duration::from_millis(1),
        t => Duration::from_millis(t as u64),
    }
}

/// [`UsbTransport`] over an opened rusb device handle.
///
/// libusb has no split submit/reap interface, so submitted URBs queue up
/// and execute as blocking transfers at reap time; `URB_BULK_CONTINUATION`
/// needs no translation because libusb manages packet boundaries of a
/// transfer internally. Claiming the interface is part of construction and
/// the claim is released on drop.
pub struct RusbTransport<C: rusb::UsbContext> {
    handle: Mutex<rusb::DeviceHandle<C>>,
    interface_number: u8,
    queue: Mutex<VecDeque<(UrbId, Urb)>>,
}

impl<C: rusb::UsbContext> RusbTransport<C> {
    /// Claim `interface_number` on `handle`. Fails with [`Error::Busy`]
    /// when another driver holds the interface.
    pub fn claim(mut handle: rusb::DeviceHandle<C>, interface_number: u8) -> Result<Self> {
        handle.set_auto_detach_kernel_driver(true).ok();
        handle
            .claim_interface(interface_number)
            .map_err(map_rusb)?;
        Ok(Self {
            handle: Mutex::new(handle),
            interface_number,
            queue: Mutex::new(VecDeque::new()),
        })
    }

    pub fn interface_number(&self) -> u8 {
        self.interface_number
    }

    /// The device's active configuration, queried from the kernel.
    pub fn active_configuration(&self) -> Result<u8> {
        self.handle
            .lock()
            .unwrap()
            .active_configuration()
            .map_err(map_rusb)
    }
}

impl<C: rusb::UsbContext> Drop for RusbTransport<C> {
    fn drop(&mut self) {
        let handle = self.handle.get_mut().unwrap();
        if let Err(err) = handle.release_interface(self.interface_number) {
            debug!("releasing interface {}: {err}", self.interface_number);
        }
    }
}

impl<C: rusb::UsbContext> UsbTransport for RusbTransport<C> {
    fn submit(&self, id: UrbId, urb: &Urb) -> Result<()> {
        self.queue.lock().unwrap().push_back((id, urb.clone()));
        Ok(())
    }

    fn reap(&self, timeout_ms: i32) -> Result<UrbCompletion> {
        let (id, urb) = match self.queue.lock().unwrap().pop_front() {
            Some(entry) => entry,
            // nothing queued, so nothing will ever complete
            None => return Err(Error::Timeout),
        };
        let duration = to_duration(timeout_ms);
        let handle = self.handle.lock().unwrap();
        let transfer_in = urb.endpoint & 0x80 != 0;
        match (urb.urb_type, transfer_in) {
            (UrbType::Bulk, true) => {
                let mut buffer = vec![0u8; urb.buffer_length];
                let n = handle
                    .read_bulk(urb.endpoint, &mut buffer, duration)
                    .map_err(map_rusb)?;
                buffer.truncate(n);
                Ok(UrbCompletion {
                    id,
                    actual_length: n,
                    data: buffer,
                })
            }
            (UrbType::Bulk, false) => {
                let n = handle
                    .write_bulk(urb.endpoint, &urb.buffer, duration)
                    .map_err(map_rusb)?;
                if n < urb.buffer.len() {
                    warn!("bulk write accepted {n} of {} bytes", urb.buffer.len());
                }
                Ok(UrbCompletion {
                    id,
                    actual_length: n,
                    data: vec![],
                })
            }
            (UrbType::Interrupt, true) => {
                let mut buffer = vec![0u8; urb.buffer_length];
                let n = handle
                    .read_interrupt(urb.endpoint, &mut buffer, duration)
                    .map_err(map_rusb)?;
                buffer.truncate(n);
                Ok(UrbCompletion {
                    id,
                    actual_length: n,
                    data: buffer,
                })
            }
            (UrbType::Interrupt, false) => {
                let n = handle
                    .write_interrupt(urb.endpoint, &urb.buffer, duration)
                    .map_err(map_rusb)?;
                Ok(UrbCompletion {
                    id,
                    actual_length: n,
                    data: vec![],
                })
            }
            _ => Err(Error::NotSupported),
        }
    }

    fn discard(&self, id: UrbId) -> Result<()> {
        self.queue.lock().unwrap().retain(|(queued, _)| *queued != id);
        Ok(())
    }

    fn control(&self, request: &ControlRequest, timeout_ms: i32) -> Result<usize> {
        self.handle
            .lock()
            .unwrap()
            .write_control(
                request.request_type,
                request.request,
                request.value,
                request.index,
                &request.data,
                to_duration(timeout_ms),
            )
            .map_err(map_rusb)
    }

    fn clear_halt(&self, endpoint: u8) -> Result<()> {
        self.handle
            .lock()
            .unwrap()
            .clear_halt(endpoint)
            .map_err(map_rusb)
    }
}

use super::*;

struct ControlEntry {
    request: ControlRequest,
    interrupt_current: bool,
    timeout_ms: i32,
}

/// One IN and one OUT bulk endpoint of a claimed MTP interface, plus the
/// default control endpoint and an optional interrupt-IN event endpoint.
///
/// The pipe frames byte streams into URBs, reaps completions, and drains a
/// FIFO of queued control transfers between reaps. All state is behind
/// interior mutability; methods take `&self` so an abort can be issued
/// from a second thread while a transfer is in flight.
pub struct BulkPipe {
    transport: Arc<dyn UsbTransport>,
    bulk_in: UsbEndpoint,
    bulk_out: UsbEndpoint,
    interrupt_in: Option<UsbEndpoint>,
    interface_number: u16,
    next_urb_id: AtomicU64,
    /// URBs owned by the kernel queue, keyed by the id echoed at reap time.
    pending: Mutex<HashMap<UrbId, Urb>>,
    controls: Mutex<VecDeque<ControlEntry>>,
    reaping: AtomicBool,
    aborted: AtomicBool,
    discarded: AtomicU64,
}

impl BulkPipe {
    pub fn new(
        transport: Arc<dyn UsbTransport>,
        bulk_in: UsbEndpoint,
        bulk_out: UsbEndpoint,
        interrupt_in: Option<UsbEndpoint>,
        interface_number: u16,
    ) -> Self {
        Self {
            transport,
            bulk_in,
            bulk_out,
            interrupt_in,
            interface_number,
            next_urb_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
            controls: Mutex::new(VecDeque::new()),
            reaping: AtomicBool::new(false),
            aborted: AtomicBool::new(false),
            discarded: AtomicU64::new(0),
        }
    }

    /// The interface number the pipe was claimed on; wIndex of
    /// class-specific control requests.
    pub fn interface_number(&self) -> u16 {
        self.interface_number
    }

    /// URBs discarded after a timeout or error since the pipe was created.
    pub fn discarded_urbs(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    /// Number of URBs currently owned by the kernel queue.
    pub fn outstanding_urbs(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    fn check_aborted(&self) -> Result<()> {
        if self.aborted.load(Ordering::SeqCst) {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    pub(crate) fn clear_abort(&self) {
        self.aborted.store(false, Ordering::SeqCst);
    }

    /// Submit one URB and reap until its completion comes back.
    ///
    /// Completions for ids this pipe does not know are logged and skipped.
    /// On timeout or error the URB is discarded before the error is
    /// propagated, so nothing is left on the kernel queue.
    fn submit_and_reap(&self, urb: Urb, timeout_ms: i32) -> Result<UrbCompletion> {
        let id = self.next_urb_id.fetch_add(1, Ordering::Relaxed);
        self.transport.submit(id, &urb)?;
        self.pending.lock().unwrap().insert(id, urb);

        self.reaping.store(true, Ordering::SeqCst);
        let reaped = loop {
            match self.transport.reap(timeout_ms) {
                Ok(completion) => {
                    let known = self.pending.lock().unwrap().remove(&completion.id).is_some();
                    if !known {
                        warn!("reaped unknown urb {}", completion.id);
                        continue;
                    }
                    if completion.id != id {
                        warn!("reaped urb {} while waiting for {id}", completion.id);
                        continue;
                    }
                    break Ok(completion);
                }
                Err(err) => break Err(err),
            }
        };
        self.reaping.store(false, Ordering::SeqCst);

        reaped.map_err(|err| {
            self.discard_pending(id);
            err
        })
    }

    fn discard_pending(&self, id: UrbId) {
        if self.pending.lock().unwrap().remove(&id).is_some() {
            if let Err(err) = self.transport.discard(id) {
                warn!("discarding urb {id}: {err}");
            }
            self.discarded.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Execute queued control transfers in FIFO order. A transfer marked
    /// `interrupt_current` concludes the current transaction: the abort
    /// flag is raised and the caller unwinds with [`Error::Cancelled`].
    fn process_controls(&self) -> Result<()> {
        let mut controls = self.controls.lock().unwrap();
        while let Some(entry) = controls.pop_front() {
            self.transport.control(&entry.request, entry.timeout_ms)?;
            if entry.interrupt_current {
                self.aborted.store(true, Ordering::SeqCst);
                return Err(Error::Cancelled);
            }
        }
        Ok(())
    }

    /// Queue a control transfer to be interleaved between URB reaps.
    ///
    /// With `interrupt_current` the transfer doubles as an abort: whichever
    /// thread executes it raises the abort flag, and the thread driving
    /// the bulk transfer fails with [`Error::Cancelled`]. When no reap is
    /// in flight the queue is drained immediately from this thread.
    pub fn submit_control(
        &self,
        request: ControlRequest,
        interrupt_current: bool,
        timeout_ms: i32,
    ) -> Result<()> {
        self.controls.lock().unwrap().push_back(ControlEntry {
            request,
            interrupt_current,
            timeout_ms,
        });
        if !self.reaping.load(Ordering::SeqCst) {
            match self.process_controls() {
                // the interrupting transfer went out; the cancellation it
                // signals is not this caller's error
                Ok(()) | Err(Error::Cancelled) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Execute any control transfers still queued. Called by the abort
    /// path once no reap is in flight, so a cancel enqueued in the last
    /// instants of a dying transaction cannot leak into the next one.
    pub(crate) fn flush_controls(&self) {
        match self.process_controls() {
            Ok(()) | Err(Error::Cancelled) => {}
            Err(err) => warn!("flushing control queue: {err}"),
        }
    }

    /// Write one complete bulk transfer from `source`.
    ///
    /// URB buffers are filled up to capacity; every URB after the first
    /// carries `URB_BULK_CONTINUATION` so the kernel does not synthesize
    /// short packets at submit boundaries. The transfer ends when the
    /// source runs short of a full buffer. If it ends on a packet boundary
    /// and `declared_length` says the container does too, one zero-length
    /// URB terminates the container.
    pub fn write(
        &self,
        source: &mut dyn Read,
        declared_length: Option<u64>,
        timeout_ms: i32,
    ) -> Result<u64> {
        let capacity = BULK_PACKETS_PER_URB * self.bulk_out.max_packet_size as usize;
        let packet_size = self.bulk_out.max_packet_size as u64;
        let mut continuation = false;
        let mut total = 0u64;
        loop {
            self.check_aborted()?;
            let mut buffer = vec![0u8; capacity];
            let n = read_fill(source, &mut buffer)?;
            buffer.truncate(n);
            let mut urb = Urb::send(UrbType::Bulk, &self.bulk_out, buffer);
            urb.set_continuation(continuation);
            continuation = true;
            self.submit_and_reap(urb, timeout_ms)?;
            self.process_controls()?;
            total += n as u64;
            if n == capacity {
                continue;
            }
            // short of a full buffer: the transfer is over, but a container
            // ending exactly on a packet boundary still needs a ZLP
            if n > 0 && total % packet_size == 0 && declared_length == Some(total) {
                let mut zlp = Urb::send(UrbType::Bulk, &self.bulk_out, Vec::new());
                zlp.set_continuation(true);
                self.submit_and_reap(zlp, timeout_ms)?;
                self.process_controls()?;
            }
            return Ok(total);
        }
    }

    /// Read one complete bulk transfer (up to the first short packet) into
    /// `sink`. Returns the number of bytes transferred.
    pub fn read(&self, sink: &mut dyn Write, timeout_ms: i32) -> Result<u64> {
        let capacity = BULK_PACKETS_PER_URB * self.bulk_in.max_packet_size as usize;
        let mut continuation = false;
        let mut total = 0u64;
        loop {
            self.check_aborted()?;
            let mut urb = Urb::receive(UrbType::Bulk, &self.bulk_in);
            urb.set_continuation(continuation);
            continuation = true;
            let completion = self.submit_and_reap(urb, timeout_ms)?;
            self.process_controls()?;
            sink.write_all(&completion.data)?;
            total += completion.data.len() as u64;
            if completion.data.len() < capacity {
                return Ok(total);
            }
        }
    }

    /// Poll the interrupt endpoint for one event packet.
    pub fn read_interrupt(&self, timeout_ms: i32) -> Result<Vec<u8>> {
        let ep = self.interrupt_in.ok_or(Error::NotSupported)?;
        let urb = Urb::receive(UrbType::Interrupt, &ep);
        let completion = self.submit_and_reap(urb, timeout_ms)?;
        Ok(completion.data)
    }

    /// Clear the halt/toggle state of the bulk IN endpoint. Called after
    /// an aborted transaction, before the next one starts.
    pub fn clear_in_halt(&self) -> Result<()> {
        self.transport.clear_halt(self.bulk_in.address)
    }
}

/// Read from `source` until `buffer` is full or the stream ends.
fn read_fill(source: &mut dyn Read, buffer: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        let n = source.read(&mut buffer[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

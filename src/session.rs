use super::*;
use std::io::Cursor;
use std::time::{Duration, Instant};

/// Default timeout for metadata operations, overridable per session with
/// [`Session::set_timeout`].
pub const DEFAULT_TIMEOUT_MS: i32 = 10_000;

/// A single operation request: the opcode plus up to five parameters of a
/// Command container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationRequest {
    pub opcode: OperationCode,
    pub transaction_id: u32,
    pub params: Vec<u32>,
}

/// The decoded Response container of an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationResponse {
    pub response_code: u16,
    pub transaction_id: u32,
    pub params: Vec<u32>,
}

impl OperationResponse {
    fn decode(header: &ContainerHeader, payload: &[u8]) -> Result<Self> {
        if payload.len() % 4 != 0 || payload.len() > 20 {
            return Err(Error::InvalidResponse("malformed response parameters"));
        }
        let params = payload
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        Ok(Self {
            response_code: header.code,
            transaction_id: header.transaction_id,
            params,
        })
    }

    pub fn param(&self, index: usize) -> Result<u32> {
        self.params
            .get(index)
            .copied()
            .ok_or(Error::InvalidResponse("missing response parameter"))
    }
}

/// The data phase of an operation, from the caller's point of view.
enum DataPhase<'a> {
    None,
    Out(&'a mut dyn Read, Option<u64>),
    In(&'a mut dyn Write),
}

/// Guard for the one live transaction a session may have. Holds the
/// transaction mutex for the whole operation and clears the
/// current-transaction slot on every exit path.
struct Transaction<'a> {
    session: &'a Session,
    id: u32,
    _serial: std::sync::MutexGuard<'a, u32>,
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        self.session
            .current_transaction
            .store(RESERVED_TRANSACTION_ID, Ordering::SeqCst);
    }
}

/// An open MTP session on one device.
///
/// Operations take `&self` and are serialized by the transaction mutex; a
/// second caller blocks until the first operation completes. The only
/// call safe to make concurrently with a running operation is
/// [`abort_current_transaction`](Self::abort_current_transaction).
pub struct Session {
    packeter: Packetizer,
    session_id: u32,
    /// Transaction mutex; the guarded value is the next transaction id.
    next_transaction_id: Mutex<u32>,
    current_transaction: AtomicU32,
    timeout_ms: AtomicI32,
    closed: AtomicBool,
    device_info: DeviceInfo,
    get_partial_object64_supported: bool,
    edit_object_supported: bool,
}

impl Session {
    /// Open session `session_id` on the device behind `pipe`.
    ///
    /// GetDeviceInfo is the one operation permitted before OpenSession; it
    /// travels under the reserved transaction id 0. Counted transactions
    /// start at 1 with the OpenSession command itself.
    pub fn open(pipe: Arc<BulkPipe>, session_id: u32) -> Result<Session> {
        let mut session = Session {
            packeter: Packetizer::new(pipe),
            session_id,
            next_transaction_id: Mutex::new(1),
            current_transaction: AtomicU32::new(RESERVED_TRANSACTION_ID),
            timeout_ms: AtomicI32::new(DEFAULT_TIMEOUT_MS),
            closed: AtomicBool::new(false),
            device_info: DeviceInfo::default(),
            get_partial_object64_supported: false,
            edit_object_supported: false,
        };
        let mut payload = Vec::new();
        session.run_transaction(
            RESERVED_TRANSACTION_ID,
            OperationCode::GetDeviceInfo,
            &[],
            DataPhase::In(&mut payload),
            DEFAULT_TIMEOUT_MS,
        )?;
        session.device_info = DeviceInfo::decode(&payload)?;
        session.get_partial_object64_supported = session
            .device_info
            .supports_operation(OperationCode::GetPartialObject64);
        session.edit_object_supported = EDIT_OBJECT_OPERATIONS
            .iter()
            .all(|&op| session.device_info.supports_operation(op));

        match session.transact(
            OperationCode::OpenSession,
            &[session_id],
            DataPhase::None,
            DEFAULT_TIMEOUT_MS,
        ) {
            Ok(_) => {}
            Err(Error::Protocol(code))
                if code == ResponseCode::SessionAlreadyOpen as u16 =>
            {
                warn!("device reports session already open, reusing it");
            }
            Err(err) => return Err(err),
        }
        info!(
            "opened session {} with {} {}",
            session_id, session.device_info.manufacturer, session.device_info.model
        );
        Ok(session)
    }

    /// The DeviceInfo captured while opening the session.
    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    pub fn session_id(&self) -> u32 {
        self.session_id
    }

    /// Whether the device implements GetPartialObject64 (64-bit offsets).
    pub fn get_partial_object64_supported(&self) -> bool {
        self.get_partial_object64_supported
    }

    /// Whether the device implements the in-place edit extension cluster.
    pub fn edit_object_supported(&self) -> bool {
        self.edit_object_supported
    }

    /// Timeout applied to metadata operations, in milliseconds.
    pub fn set_timeout(&self, timeout_ms: i32) {
        self.timeout_ms.store(timeout_ms, Ordering::Relaxed);
    }

    fn timeout(&self) -> i32 {
        self.timeout_ms.load(Ordering::Relaxed)
    }

    fn begin_transaction(&self) -> Result<Transaction<'_>> {
        let mut next = self.next_transaction_id.lock().unwrap();
        if self.current_transaction.load(Ordering::SeqCst) != RESERVED_TRANSACTION_ID {
            return Err(Error::BusyTransaction);
        }
        let id = *next;
        *next = if *next == u32::MAX { 1 } else { *next + 1 };
        self.current_transaction.store(id, Ordering::SeqCst);
        Ok(Transaction {
            session: self,
            id,
            _serial: next,
        })
    }

    fn transact(
        &self,
        opcode: OperationCode,
        params: &[u32],
        data: DataPhase,
        timeout_ms: i32,
    ) -> Result<OperationResponse> {
        let transaction = self.begin_transaction()?;
        self.run_transaction(transaction.id, opcode, params, data, timeout_ms)
    }

    fn transact_in_buffer(
        &self,
        opcode: OperationCode,
        params: &[u32],
        timeout_ms: i32,
    ) -> Result<(OperationResponse, Vec<u8>)> {
        let mut payload = Vec::new();
        let response = self.transact(opcode, params, DataPhase::In(&mut payload), timeout_ms)?;
        Ok((response, payload))
    }

    /// Command, optional data phase, response; strictly in that order on
    /// the calling thread.
    fn run_transaction(
        &self,
        transaction_id: u32,
        opcode: OperationCode,
        params: &[u32],
        mut data: DataPhase,
        timeout_ms: i32,
    ) -> Result<OperationResponse> {
        let request = OperationRequest {
            opcode,
            transaction_id,
            params: params.to_vec(),
        };
        self.packeter.write_command(&request, timeout_ms)?;

        if let DataPhase::Out(source, size) = &mut data {
            self.packeter
                .write_data(opcode as u16, transaction_id, &mut **source, *size, timeout_ms)?;
        }

        let mut discard = std::io::sink();
        loop {
            let sink: &mut dyn Write = match &mut data {
                DataPhase::In(sink) => &mut **sink,
                _ => &mut discard,
            };
            let message = self.packeter.read_message(sink, timeout_ms)?;
            match message.header.container_type {
                ContainerType::Data => {
                    if message.header.transaction_id != transaction_id {
                        return Err(Error::InvalidResponse("mismatched transaction id"));
                    }
                }
                ContainerType::Response => {
                    if message.header.transaction_id != transaction_id {
                        return Err(Error::InvalidResponse("mismatched transaction id"));
                    }
                    let response = OperationResponse::decode(&message.header, &message.payload)?;
                    debug!("< {:?}", response);
                    return match ResponseCode::from_u16(response.response_code) {
                        Some(ResponseCode::Ok) => Ok(response),
                        Some(ResponseCode::TransactionCancelled) => Err(Error::Cancelled),
                        _ => Err(Error::Protocol(response.response_code)),
                    };
                }
                ContainerType::Event => {
                    debug!(
                        "ignoring event {:#06x} interleaved on the bulk endpoint",
                        message.header.code
                    );
                }
                ContainerType::Command => {
                    return Err(Error::InvalidResponse("unexpected command container"));
                }
            }
        }
    }

    /// Re-query DeviceInfo under a fresh transaction.
    pub fn get_device_info(&self) -> Result<DeviceInfo> {
        let (_, payload) =
            self.transact_in_buffer(OperationCode::GetDeviceInfo, &[], self.timeout())?;
        DeviceInfo::decode(&payload)
    }

    pub fn get_storage_ids(&self) -> Result<Vec<u32>> {
        let (_, payload) =
            self.transact_in_buffer(OperationCode::GetStorageIds, &[], self.timeout())?;
        Reader::new(&payload).read_array_u32()
    }

    pub fn get_storage_info(&self, storage_id: u32) -> Result<StorageInfo> {
        let (_, payload) = self.transact_in_buffer(
            OperationCode::GetStorageInfo,
            &[storage_id],
            self.timeout(),
        )?;
        StorageInfo::decode(&payload)
    }

    pub fn get_object_handles(
        &self,
        storage_id: u32,
        format: u32,
        parent: u32,
    ) -> Result<Vec<u32>> {
        let (_, payload) = self.transact_in_buffer(
            OperationCode::GetObjectHandles,
            &[storage_id, format, parent],
            self.timeout(),
        )?;
        Reader::new(&payload).read_array_u32()
    }

    pub fn get_object_info(&self, handle: u32) -> Result<ObjectInfo> {
        let (_, payload) =
            self.transact_in_buffer(OperationCode::GetObjectInfo, &[handle], self.timeout())?;
        ObjectInfo::decode(&payload)
    }

    /// Stream an object's bytes into `sink`. Returns the byte count.
    pub fn get_object(&self, handle: u32, sink: &mut dyn Write, timeout_ms: i32) -> Result<u64> {
        let mut counter = CountingWriter::new(sink);
        self.transact(
            OperationCode::GetObject,
            &[handle],
            DataPhase::In(&mut counter),
            timeout_ms,
        )?;
        Ok(counter.count)
    }

    /// Read `size` bytes at `offset`, dispatching to GetPartialObject64
    /// when the device supports it. 32-bit devices cannot reach offsets
    /// past 4 GiB.
    pub fn get_partial_object(&self, handle: u32, offset: u64, size: u32) -> Result<Vec<u8>> {
        let (response, payload) = if self.get_partial_object64_supported {
            self.transact_in_buffer(
                OperationCode::GetPartialObject64,
                &[handle, offset as u32, (offset >> 32) as u32, size],
                self.timeout(),
            )?
        } else if offset <= u32::MAX as u64 {
            self.transact_in_buffer(
                OperationCode::GetPartialObject,
                &[handle, offset as u32, size],
                self.timeout(),
            )?
        } else {
            return Err(Error::NotSupported);
        };
        if let Ok(reported) = response.param(0) {
            if reported as u64 != payload.len() as u64 {
                warn!(
                    "partial read reported {reported} bytes, delivered {}",
                    payload.len()
                );
            }
        }
        Ok(payload)
    }

    /// Announce an object; the device assigns identifiers for the
    /// SendObject that must follow.
    pub fn send_object_info(
        &self,
        info: &ObjectInfo,
        storage_id: u32,
        parent: u32,
    ) -> Result<NewObjectInfo> {
        let payload = info.encode()?;
        let size = payload.len() as u64;
        let response = self.transact(
            OperationCode::SendObjectInfo,
            &[storage_id, parent],
            DataPhase::Out(&mut Cursor::new(payload), Some(size)),
            self.timeout(),
        )?;
        Ok(NewObjectInfo {
            storage_id: response.param(0)?,
            parent_object_id: response.param(1)?,
            object_id: response.param(2)?,
        })
    }

    /// Stream an object's bytes to the device. `size` is the exact byte
    /// count; 4 GiB and up is sent as a streamed container.
    pub fn send_object(&self, source: &mut dyn Read, size: u64, timeout_ms: i32) -> Result<()> {
        self.transact(
            OperationCode::SendObject,
            &[],
            DataPhase::Out(source, Some(size)),
            timeout_ms,
        )?;
        Ok(())
    }

    pub fn delete_object(&self, handle: u32) -> Result<()> {
        self.transact(
            OperationCode::DeleteObject,
            &[handle, 0],
            DataPhase::None,
            self.timeout(),
        )?;
        Ok(())
    }

    /// Create a folder via SendObjectInfo with an Association dataset.
    pub fn create_directory(
        &self,
        name: &str,
        parent: u32,
        storage_id: u32,
    ) -> Result<NewObjectInfo> {
        self.send_object_info(&ObjectInfo::directory(name), storage_id, parent)
    }

    pub fn get_object_props_supported(&self, format: u32) -> Result<Vec<u16>> {
        let (_, payload) = self.transact_in_buffer(
            OperationCode::GetObjectPropsSupported,
            &[format],
            self.timeout(),
        )?;
        Reader::new(&payload).read_array_u16()
    }

    pub fn get_object_prop_desc(
        &self,
        property: ObjectProperty,
        format: u32,
    ) -> Result<ObjectPropDesc> {
        let (_, payload) = self.transact_in_buffer(
            OperationCode::GetObjectPropDesc,
            &[property as u32, format],
            self.timeout(),
        )?;
        ObjectPropDesc::decode(&payload)
    }

    /// Raw value of an object property.
    pub fn get_object_property(&self, handle: u32, property: ObjectProperty) -> Result<Vec<u8>> {
        let (_, payload) = self.transact_in_buffer(
            OperationCode::GetObjectPropValue,
            &[handle, property as u32],
            self.timeout(),
        )?;
        Ok(payload)
    }

    /// An integer object property, widened from its wire width.
    pub fn get_object_integer_property(
        &self,
        handle: u32,
        property: ObjectProperty,
    ) -> Result<u64> {
        let payload = self.get_object_property(handle, property)?;
        let mut reader = Reader::new(&payload);
        match payload.len() {
            1 => Ok(reader.read_u8()?.into()),
            2 => Ok(reader.read_u16()?.into()),
            4 => Ok(reader.read_u32()?.into()),
            8 => reader.read_u64(),
            _ => Err(Error::InvalidResponse("unexpected integer property size")),
        }
    }

    pub fn get_object_string_property(
        &self,
        handle: u32,
        property: ObjectProperty,
    ) -> Result<String> {
        let payload = self.get_object_property(handle, property)?;
        Reader::new(&payload).read_string()
    }

    pub fn set_object_property(
        &self,
        handle: u32,
        property: ObjectProperty,
        value: &[u8],
    ) -> Result<()> {
        self.transact(
            OperationCode::SetObjectPropValue,
            &[handle, property as u32],
            DataPhase::Out(&mut Cursor::new(value), Some(value.len() as u64)),
            self.timeout(),
        )?;
        Ok(())
    }

    pub fn set_object_string_property(
        &self,
        handle: u32,
        property: ObjectProperty,
        value: &str,
    ) -> Result<()> {
        let mut writer = Writer::new();
        writer.write_string(value)?;
        self.set_object_property(handle, property, &writer.finish())
    }

    /// Raw value of a device property.
    pub fn get_device_property(&self, property: DeviceProperty) -> Result<Vec<u8>> {
        let (_, payload) = self.transact_in_buffer(
            OperationCode::GetDevicePropValue,
            &[property as u32],
            self.timeout(),
        )?;
        Ok(payload)
    }

    /// True object size. `ObjectInfo.object_compressed_size` is 32-bit on
    /// the wire; this reads the 64-bit ObjectSize property and falls back
    /// to the dataset field for devices without property support.
    pub fn object_size(&self, handle: u32) -> Result<u64> {
        match self.get_object_integer_property(handle, ObjectProperty::ObjectSize) {
            Ok(size) => Ok(size),
            Err(Error::Protocol(_)) | Err(Error::NotSupported) => {
                Ok(self.get_object_info(handle)?.object_compressed_size as u64)
            }
            Err(err) => Err(err),
        }
    }

    /// Begin an in-place edit of `handle`. Fails with
    /// [`Error::NotSupported`] unless the device advertises the whole edit
    /// extension cluster.
    pub fn edit_object(&self, handle: u32) -> Result<EditObjectSession<'_>> {
        EditObjectSession::begin(self, handle)
    }

    pub(crate) fn begin_edit_object(&self, handle: u32) -> Result<()> {
        self.transact(
            OperationCode::BeginEditObject,
            &[handle],
            DataPhase::None,
            self.timeout(),
        )?;
        Ok(())
    }

    pub(crate) fn truncate_object(&self, handle: u32, size: u64) -> Result<()> {
        self.transact(
            OperationCode::TruncateObject,
            &[handle, size as u32, (size >> 32) as u32],
            DataPhase::None,
            self.timeout(),
        )?;
        Ok(())
    }

    pub(crate) fn send_partial_object(&self, handle: u32, offset: u64, data: &[u8]) -> Result<u32> {
        let response = self.transact(
            OperationCode::SendPartialObject,
            &[
                handle,
                offset as u32,
                (offset >> 32) as u32,
                data.len() as u32,
            ],
            DataPhase::Out(&mut Cursor::new(data), Some(data.len() as u64)),
            self.timeout(),
        )?;
        response.param(0)
    }

    pub(crate) fn end_edit_object(&self, handle: u32) -> Result<()> {
        self.transact(
            OperationCode::EndEditObject,
            &[handle],
            DataPhase::None,
            self.timeout(),
        )?;
        Ok(())
    }

    /// Abort the transaction currently in flight, from any thread.
    ///
    /// Issues the class-specific Cancel request with `interrupt_current`
    /// set, so the thread driving the transfer unwinds with
    /// [`Error::Cancelled`]; then waits for it, drains stale containers to
    /// a clean boundary, and clears the bulk IN halt state.
    pub fn abort_current_transaction(&self, timeout_ms: i32) -> Result<()> {
        let transaction_id = self.current_transaction.load(Ordering::SeqCst);
        if transaction_id == RESERVED_TRANSACTION_ID {
            debug!("abort requested with no transaction in flight");
            return Ok(());
        }
        info!("aborting transaction {transaction_id}");
        let pipe = self.packeter.pipe();
        let mut writer = Writer::new();
        writer.write_u16(EventCode::CancelTransaction as u16);
        writer.write_u32(transaction_id);
        pipe.submit_control(
            ControlRequest {
                request_type: CLASS_REQUEST_TYPE_OUT,
                request: CLASS_REQUEST_CANCEL,
                value: 0,
                index: pipe.interface_number(),
                data: writer.finish(),
            },
            true,
            timeout_ms,
        )?;

        // wait for the interrupted caller to unwind, then clean the pipe
        // while holding the transaction mutex
        let _serial = self.next_transaction_id.lock().unwrap();
        pipe.flush_controls();
        pipe.clear_abort();
        let deadline = Instant::now() + Duration::from_millis(timeout_ms.max(0) as u64);
        let mut discard = std::io::sink();
        loop {
            let remaining = if timeout_ms < 0 {
                timeout_ms
            } else {
                match deadline
                    .saturating_duration_since(Instant::now())
                    .as_millis() as i32
                {
                    0 => break,
                    left => left,
                }
            };
            match self.packeter.read_message(&mut discard, remaining) {
                Ok(message) => {
                    debug!(
                        "discarded stale {:?} container",
                        message.header.container_type
                    );
                    if message.header.container_type == ContainerType::Response {
                        break;
                    }
                }
                Err(Error::Timeout) => break,
                // the interrupting control fired during our own drain read
                Err(Error::Cancelled) => pipe.clear_abort(),
                Err(Error::Disconnected) => return Err(Error::Disconnected),
                Err(err) => {
                    debug!("drain after abort: {err}");
                    break;
                }
            }
        }
        if let Err(err) = pipe.clear_in_halt() {
            debug!("clear halt after abort: {err}");
        }
        match pipe.read_interrupt(0) {
            Ok(event) => trace!("consumed {} byte event after abort", event.len()),
            Err(Error::Timeout) | Err(Error::NotSupported) => {}
            Err(err) => debug!("event poll after abort: {err}"),
        }
        Ok(())
    }

    /// Close the session on the device. Also runs on drop, where failures
    /// are logged and swallowed.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.transact(
            OperationCode::CloseSession,
            &[],
            DataPhase::None,
            self.timeout(),
        )?;
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.closed.load(Ordering::SeqCst) {
            if let Err(err) = self.close() {
                warn!("closing session {}: {err}", self.session_id);
            }
        }
    }
}

struct CountingWriter<'a> {
    inner: &'a mut dyn Write,
    count: u64,
}

impl<'a> CountingWriter<'a> {
    fn new(inner: &'a mut dyn Write) -> Self {
        Self { inner, count: 0 }
    }
}

impl Write for CountingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::*;
    use std::collections::{BTreeMap, HashSet};
    use std::sync::{Condvar, Mutex};
    use std::time::{Duration, Instant};

    pub(crate) fn setup_test_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// PTP baseline operations, without the Android extension cluster.
    pub(crate) const BASELINE_OPERATIONS: [u16; 22] = [
        0x1001, 0x1002, 0x1003, 0x1004, 0x1005, 0x1006, 0x1007, 0x1008, 0x1009, 0x100A, 0x100B,
        0x100C, 0x100D, 0x1014, 0x1015, 0x1016, 0x101B, 0x9801, 0x9802, 0x9803, 0x9804, 0x9805,
    ];

    fn full_operations() -> Vec<u16> {
        let mut ops = BASELINE_OPERATIONS.to_vec();
        ops.extend([0x95C1, 0x95C2, 0x95C3, 0x95C4, 0x95C5]);
        ops
    }

    /// In-memory [`UsbTransport`]: raw mode serves scripted transfers,
    /// device mode runs a small scripted MTP responder.
    pub(crate) struct MockTransport {
        state: Mutex<MockState>,
        cond: Condvar,
    }

    struct MockState {
        max_packet_size: u16,
        device: Option<FakeDevice>,
        submitted: VecDeque<(UrbId, Urb)>,
        in_transfers: VecDeque<Vec<u8>>,
        zlp_pending: bool,
        interrupt_transfers: VecDeque<Vec<u8>>,
        out_urbs: Vec<Urb>,
        in_urb_flags: Vec<u32>,
        controls: Vec<ControlRequest>,
        clear_halts: Vec<u8>,
        unresponsive: bool,
        reap_delay_ms: u64,
    }

    impl MockTransport {
        fn with_device(max_packet_size: u16, device: Option<FakeDevice>) -> Self {
            Self {
                state: Mutex::new(MockState {
                    max_packet_size,
                    device,
                    submitted: VecDeque::new(),
                    in_transfers: VecDeque::new(),
                    zlp_pending: false,
                    interrupt_transfers: VecDeque::new(),
                    out_urbs: Vec::new(),
                    in_urb_flags: Vec::new(),
                    controls: Vec::new(),
                    clear_halts: Vec::new(),
                    unresponsive: false,
                    reap_delay_ms: 0,
                }),
                cond: Condvar::new(),
            }
        }

        pub(crate) fn raw(max_packet_size: u16) -> Self {
            Self::with_device(max_packet_size, None)
        }

        pub(crate) fn device(max_packet_size: u16) -> Self {
            Self::with_device(max_packet_size, Some(FakeDevice::new()))
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
            self.state.lock().unwrap()
        }

        fn with_fake<R>(&self, f: impl FnOnce(&mut FakeDevice) -> R) -> R {
            f(self.lock().device.as_mut().expect("device-mode transport"))
        }

        pub(crate) fn queue_in_transfer(&self, bytes: Vec<u8>) {
            self.lock().in_transfers.push_back(bytes);
            self.cond.notify_all();
        }

        pub(crate) fn queue_in_container(
            &self,
            container_type: ContainerType,
            code: u16,
            transaction_id: u32,
            payload: &[u8],
        ) {
            let header = ContainerHeader::new(
                container_type,
                code,
                transaction_id,
                Some(payload.len() as u64),
            );
            let mut transfer = header.to_bytes().to_vec();
            transfer.extend_from_slice(payload);
            self.queue_in_transfer(transfer);
        }

        pub(crate) fn queue_interrupt(&self, bytes: Vec<u8>) {
            self.lock().interrupt_transfers.push_back(bytes);
            self.cond.notify_all();
        }

        pub(crate) fn clear_in_transfers(&self) {
            let mut state = self.lock();
            state.in_transfers.clear();
            state.zlp_pending = false;
        }

        pub(crate) fn clear_out_log(&self) {
            self.lock().out_urbs.clear();
        }

        pub(crate) fn out_urbs(&self) -> Vec<Urb> {
            self.lock().out_urbs.clone()
        }

        pub(crate) fn out_bytes(&self) -> Vec<u8> {
            self.lock()
                .out_urbs
                .iter()
                .flat_map(|urb| urb.buffer.iter().copied())
                .collect()
        }

        pub(crate) fn in_urb_flags(&self) -> Vec<u32> {
            self.lock().in_urb_flags.clone()
        }

        pub(crate) fn control_values(&self) -> Vec<u16> {
            self.lock().controls.iter().map(|c| c.value).collect()
        }

        pub(crate) fn control_log_is_empty(&self) -> bool {
            self.lock().controls.is_empty()
        }

        pub(crate) fn clear_halt_log(&self) -> Vec<u8> {
            self.lock().clear_halts.clone()
        }

        pub(crate) fn queue_is_empty(&self) -> bool {
            self.lock().submitted.is_empty()
        }

        pub(crate) fn set_unresponsive(&self, unresponsive: bool) {
            self.lock().unresponsive = unresponsive;
            self.cond.notify_all();
        }

        pub(crate) fn set_reap_delay_ms(&self, delay: u64) {
            self.lock().reap_delay_ms = delay;
        }

        pub(crate) fn add_storage(&self, id: u32, info: StorageInfo) {
            self.with_fake(|device| device.storages.push((id, info)));
        }

        pub(crate) fn add_object(&self, handle: u32, info: ObjectInfo, data: Vec<u8>) {
            self.with_fake(|device| {
                device.next_handle = device.next_handle.max(handle + 1);
                device.objects.insert(handle, FakeObject { info, data });
            });
        }

        pub(crate) fn set_operations(&self, operations: Vec<u16>) {
            self.with_fake(|device| device.operations = operations);
        }

        pub(crate) fn force_response(&self, code: u16) {
            self.with_fake(|device| device.forced_response = Some(code));
        }

        pub(crate) fn command_log(&self) -> Vec<(u16, u32)> {
            self.with_fake(|device| device.command_log.clone())
        }
    }

    fn complete_front(state: &mut MockState) -> Option<UrbCompletion> {
        let (id, urb) = state.submitted.front()?.clone();
        let completion = if urb.urb_type == UrbType::Interrupt {
            let transfer = state.interrupt_transfers.pop_front()?;
            UrbCompletion {
                id,
                actual_length: transfer.len(),
                data: transfer,
            }
        } else if urb.endpoint & 0x80 == 0 {
            // bulk OUT: the device swallows the buffer
            state.out_urbs.push(urb.clone());
            let short = urb.buffer.is_empty()
                || urb.buffer.len() % state.max_packet_size as usize != 0;
            if !state.unresponsive {
                if let Some(mut device) = state.device.take() {
                    let produced = device.receive_out(&urb.buffer, short);
                    state.in_transfers.extend(produced);
                    state.device = Some(device);
                }
            }
            UrbCompletion {
                id,
                actual_length: urb.buffer.len(),
                data: vec![],
            }
        } else {
            // bulk IN
            if state.unresponsive {
                return None;
            }
            if state.zlp_pending {
                state.zlp_pending = false;
                state.in_urb_flags.push(urb.flags);
                UrbCompletion {
                    id,
                    actual_length: 0,
                    data: vec![],
                }
            } else {
                let transfer = state.in_transfers.front_mut()?;
                let n = transfer.len().min(urb.buffer_length);
                let data: Vec<u8> = transfer.drain(..n).collect();
                if transfer.is_empty() {
                    state.in_transfers.pop_front();
                    // a transfer ending on the URB boundary needs a ZLP
                    if n == urb.buffer_length && n > 0 {
                        state.zlp_pending = true;
                    }
                }
                state.in_urb_flags.push(urb.flags);
                UrbCompletion {
                    id,
                    actual_length: n,
                    data,
                }
            }
        };
        state.submitted.pop_front();
        Some(completion)
    }

    impl UsbTransport for MockTransport {
        fn submit(&self, id: UrbId, urb: &Urb) -> Result<()> {
            self.lock().submitted.push_back((id, urb.clone()));
            self.cond.notify_all();
            Ok(())
        }

        fn reap(&self, timeout_ms: i32) -> Result<UrbCompletion> {
            let deadline =
                (timeout_ms >= 0).then(|| Instant::now() + Duration::from_millis(timeout_ms as u64));
            let mut state = self.lock();
            loop {
                if let Some(completion) = complete_front(&mut state) {
                    let delay = state.reap_delay_ms;
                    drop(state);
                    if delay > 0 {
                        std::thread::sleep(Duration::from_millis(delay));
                    }
                    self.cond.notify_all();
                    return Ok(completion);
                }
                match deadline {
                    Some(deadline) => {
                        let now = Instant::now();
                        if now >= deadline {
                            return Err(Error::Timeout);
                        }
                        let (guard, _) = self.cond.wait_timeout(state, deadline - now).unwrap();
                        state = guard;
                    }
                    None => state = self.cond.wait(state).unwrap(),
                }
            }
        }

        fn discard(&self, id: UrbId) -> Result<()> {
            self.lock().submitted.retain(|(queued, _)| *queued != id);
            self.cond.notify_all();
            Ok(())
        }

        fn control(&self, request: &ControlRequest, _timeout_ms: i32) -> Result<usize> {
            let mut state = self.lock();
            state.controls.push(request.clone());
            if request.request == CLASS_REQUEST_CANCEL && request.data.len() >= 6 {
                if let Some(mut device) = state.device.take() {
                    let transaction_id =
                        u32::from_le_bytes(request.data[2..6].try_into().unwrap());
                    state.in_transfers.clear();
                    state.zlp_pending = false;
                    let produced = device.cancel(transaction_id);
                    state.in_transfers.extend(produced);
                    state.device = Some(device);
                }
            }
            self.cond.notify_all();
            Ok(request.data.len())
        }

        fn clear_halt(&self, endpoint: u8) -> Result<()> {
            self.lock().clear_halts.push(endpoint);
            Ok(())
        }
    }

    struct FakeObject {
        info: ObjectInfo,
        data: Vec<u8>,
    }

    /// A scripted MTP responder living behind the mock transport.
    struct FakeDevice {
        operations: Vec<u16>,
        storages: Vec<(u32, StorageInfo)>,
        objects: BTreeMap<u32, FakeObject>,
        next_handle: u32,
        session: Option<u32>,
        rx: Vec<u8>,
        pending_command: Option<(u16, u32, Vec<u32>)>,
        send_target: Option<u32>,
        edits: HashSet<u32>,
        forced_response: Option<u16>,
        command_log: Vec<(u16, u32)>,
    }

    fn param(params: &[u32], index: usize) -> u32 {
        params.get(index).copied().unwrap_or(0)
    }

    fn has_data_out_phase(code: u16) -> bool {
        matches!(
            OperationCode::from_u16(code),
            Some(
                OperationCode::SendObjectInfo
                    | OperationCode::SendObject
                    | OperationCode::SetDevicePropValue
                    | OperationCode::SetObjectPropValue
                    | OperationCode::SendPartialObject
            )
        )
    }

    impl FakeDevice {
        fn new() -> Self {
            Self {
                operations: full_operations(),
                storages: Vec::new(),
                objects: BTreeMap::new(),
                next_handle: 0x100,
                session: None,
                rx: Vec::new(),
                pending_command: None,
                send_target: None,
                edits: HashSet::new(),
                forced_response: None,
                command_log: Vec::new(),
            }
        }

        fn device_info(&self) -> DeviceInfo {
            DeviceInfo {
                standard_version: 100,
                vendor_extension_id: 0x0000_0006,
                vendor_extension_version: 100,
                vendor_extension_desc: "microsoft.com: 1.0; android.com: 1.0;".into(),
                functional_mode: 0,
                operations_supported: self.operations.clone(),
                events_supported: vec![0x4002, 0x4003, 0x4004, 0x4005],
                device_properties_supported: vec![0x5001, 0xD402],
                capture_formats: vec![],
                playback_formats: vec![0x3001, 0x3004],
                manufacturer: "Mock".into(),
                model: "Fake Device".into(),
                device_version: "1.0".into(),
                serial_number: "F4K3000000000001".into(),
            }
        }

        /// Consume OUT bytes; returns fully-formed IN transfers to queue.
        fn receive_out(&mut self, bytes: &[u8], short_urb: bool) -> Vec<Vec<u8>> {
            self.rx.extend_from_slice(bytes);
            let mut produced = Vec::new();
            loop {
                if self.rx.len() < CONTAINER_HEADER_SIZE {
                    break;
                }
                let header_bytes: [u8; CONTAINER_HEADER_SIZE] =
                    self.rx[..CONTAINER_HEADER_SIZE].try_into().unwrap();
                let header = match ContainerHeader::from_bytes(&header_bytes) {
                    Ok(header) => header,
                    Err(_) => {
                        self.rx.clear();
                        break;
                    }
                };
                match header.payload_length() {
                    Some(length) => {
                        let total = length as usize + CONTAINER_HEADER_SIZE;
                        if self.rx.len() < total {
                            break;
                        }
                        let container: Vec<u8> = self.rx.drain(..total).collect();
                        produced.extend(
                            self.handle_container(&header, &container[CONTAINER_HEADER_SIZE..]),
                        );
                    }
                    None => {
                        // streamed container: complete on the short packet
                        if short_urb {
                            let payload = self.rx[CONTAINER_HEADER_SIZE..].to_vec();
                            self.rx.clear();
                            produced.extend(self.handle_container(&header, &payload));
                        }
                        break;
                    }
                }
            }
            produced
        }

        fn handle_container(
            &mut self,
            header: &ContainerHeader,
            payload: &[u8],
        ) -> Vec<Vec<u8>> {
            match header.container_type {
                ContainerType::Command => {
                    self.command_log.push((header.code, header.transaction_id));
                    let params: Vec<u32> = payload
                        .chunks_exact(4)
                        .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
                        .collect();
                    if has_data_out_phase(header.code) {
                        self.pending_command =
                            Some((header.code, header.transaction_id, params));
                        Vec::new()
                    } else {
                        self.respond(header.code, header.transaction_id, &params, None)
                    }
                }
                ContainerType::Data => match self.pending_command.take() {
                    Some((code, transaction_id, params)) => {
                        self.respond(code, transaction_id, &params, Some(payload))
                    }
                    None => Vec::new(),
                },
                _ => Vec::new(),
            }
        }

        fn respond(
            &mut self,
            code: u16,
            transaction_id: u32,
            params: &[u32],
            data: Option<&[u8]>,
        ) -> Vec<Vec<u8>> {
            let (data_out, response_code, response_params) =
                self.handle_command(code, params, data);
            let mut transfers = Vec::new();
            if let Some(payload) = data_out {
                let header = ContainerHeader::new(
                    ContainerType::Data,
                    code,
                    transaction_id,
                    Some(payload.len() as u64),
                );
                let mut transfer = header.to_bytes().to_vec();
                transfer.extend_from_slice(&payload);
                transfers.push(transfer);
            }
            let header = ContainerHeader::new(
                ContainerType::Response,
                response_code,
                transaction_id,
                Some(4 * response_params.len() as u64),
            );
            let mut transfer = header.to_bytes().to_vec();
            for value in response_params {
                transfer.extend_from_slice(&value.to_le_bytes());
            }
            transfers.push(transfer);
            transfers
        }

        fn cancel(&mut self, transaction_id: u32) -> Vec<Vec<u8>> {
            self.pending_command = None;
            self.rx.clear();
            let header = ContainerHeader::new(
                ContainerType::Response,
                ResponseCode::TransactionCancelled as u16,
                transaction_id,
                Some(0),
            );
            vec![header.to_bytes().to_vec()]
        }

        fn handle_command(
            &mut self,
            code: u16,
            params: &[u32],
            data: Option<&[u8]>,
        ) -> (Option<Vec<u8>>, u16, Vec<u32>) {
            const OK: u16 = ResponseCode::Ok as u16;
            if let Some(forced) = self.forced_response.take() {
                return (None, forced, vec![]);
            }
            let fail = |code: ResponseCode| (None, code as u16, vec![]);
            match OperationCode::from_u16(code) {
                Some(OperationCode::GetDeviceInfo) => {
                    (Some(self.device_info().encode().unwrap()), OK, vec![])
                }
                Some(OperationCode::OpenSession) => {
                    if self.session.is_some() {
                        fail(ResponseCode::SessionAlreadyOpen)
                    } else {
                        self.session = Some(param(params, 0));
                        (None, OK, vec![])
                    }
                }
                Some(OperationCode::CloseSession) => {
                    self.session = None;
                    (None, OK, vec![])
                }
                Some(OperationCode::GetStorageIds) => {
                    let ids: Vec<u32> = self.storages.iter().map(|(id, _)| *id).collect();
                    let mut w = Writer::new();
                    w.write_array_u32(&ids);
                    (Some(w.finish()), OK, vec![])
                }
                Some(OperationCode::GetStorageInfo) => {
                    match self
                        .storages
                        .iter()
                        .find(|(id, _)| *id == param(params, 0))
                    {
                        Some((_, info)) => (Some(info.encode().unwrap()), OK, vec![]),
                        None => fail(ResponseCode::InvalidStorageId),
                    }
                }
                Some(OperationCode::GetObjectHandles) => {
                    let storage = param(params, 0);
                    let format = param(params, 1);
                    let parent = param(params, 2);
                    let handles: Vec<u32> = self
                        .objects
                        .iter()
                        .filter(|(_, object)| {
                            (storage == ALL_STORAGES || object.info.storage_id == storage)
                                && (format == ALL_FORMATS
                                    || object.info.object_format as u32 == format)
                                && match parent {
                                    0 => true,
                                    ROOT_PARENT => object.info.parent_object == 0,
                                    p => object.info.parent_object == p,
                                }
                        })
                        .map(|(handle, _)| *handle)
                        .collect();
                    let mut w = Writer::new();
                    w.write_array_u32(&handles);
                    (Some(w.finish()), OK, vec![])
                }
                Some(OperationCode::GetObjectInfo) => {
                    match self.objects.get(&param(params, 0)) {
                        Some(object) => (Some(object.info.encode().unwrap()), OK, vec![]),
                        None => fail(ResponseCode::InvalidObjectHandle),
                    }
                }
                Some(OperationCode::GetObject) => match self.objects.get(&param(params, 0)) {
                    Some(object) => (Some(object.data.clone()), OK, vec![]),
                    None => fail(ResponseCode::InvalidObjectHandle),
                },
                Some(OperationCode::GetPartialObject) => {
                    self.partial_read(param(params, 0), param(params, 1) as u64, param(params, 2))
                }
                Some(OperationCode::GetPartialObject64) => {
                    let offset =
                        param(params, 1) as u64 | (param(params, 2) as u64) << 32;
                    self.partial_read(param(params, 0), offset, param(params, 3))
                }
                Some(OperationCode::DeleteObject) => {
                    if self.objects.remove(&param(params, 0)).is_some() {
                        (None, OK, vec![])
                    } else {
                        fail(ResponseCode::InvalidObjectHandle)
                    }
                }
                Some(OperationCode::SendObjectInfo) => {
                    let info = match data.map(ObjectInfo::decode) {
                        Some(Ok(info)) => info,
                        _ => return fail(ResponseCode::InvalidDataset),
                    };
                    let storage = match param(params, 0) {
                        0 => self.storages.first().map(|(id, _)| *id).unwrap_or(0),
                        id => id,
                    };
                    let parent = param(params, 1);
                    let handle = self.next_handle;
                    self.next_handle += 1;
                    let stored = ObjectInfo {
                        storage_id: storage,
                        parent_object: if parent == ROOT_PARENT { 0 } else { parent },
                        ..info
                    };
                    self.objects.insert(
                        handle,
                        FakeObject {
                            info: stored,
                            data: Vec::new(),
                        },
                    );
                    self.send_target = Some(handle);
                    (None, OK, vec![storage, parent, handle])
                }
                Some(OperationCode::SendObject) => match self.send_target.take() {
                    Some(handle) => {
                        let object = self.objects.get_mut(&handle).unwrap();
                        object.data = data.unwrap_or_default().to_vec();
                        (None, OK, vec![])
                    }
                    None => fail(ResponseCode::NoValidObjectInfo),
                },
                Some(OperationCode::GetObjectPropsSupported) => {
                    let mut w = Writer::new();
                    w.write_array_u16(&[
                        ObjectProperty::ObjectSize as u16,
                        ObjectProperty::ObjectFileName as u16,
                        ObjectProperty::ParentObject as u16,
                    ]);
                    (Some(w.finish()), OK, vec![])
                }
                Some(OperationCode::GetObjectPropDesc) => {
                    if param(params, 0) == ObjectProperty::ObjectSize as u32 {
                        let mut w = Writer::new();
                        w.write_u16(ObjectProperty::ObjectSize as u16);
                        w.write_u16(DataType::Uint64 as u16);
                        w.write_u8(0);
                        w.write_u64(0);
                        w.write_u32(0);
                        w.write_u8(0);
                        (Some(w.finish()), OK, vec![])
                    } else {
                        fail(ResponseCode::InvalidObjectPropCode)
                    }
                }
                Some(OperationCode::GetObjectPropValue) => {
                    let object = match self.objects.get(&param(params, 0)) {
                        Some(object) => object,
                        None => return fail(ResponseCode::InvalidObjectHandle),
                    };
                    let mut w = Writer::new();
                    match ObjectProperty::from_u32(param(params, 1)) {
                        Some(ObjectProperty::ObjectSize) => w.write_u64(object.data.len() as u64),
                        Some(ObjectProperty::ObjectFileName) => {
                            w.write_string(&object.info.filename).unwrap()
                        }
                        Some(ObjectProperty::ParentObject) => {
                            w.write_u32(object.info.parent_object)
                        }
                        _ => return fail(ResponseCode::InvalidObjectPropCode),
                    }
                    (Some(w.finish()), OK, vec![])
                }
                Some(OperationCode::SetObjectPropValue) => {
                    let handle = param(params, 0);
                    if ObjectProperty::from_u32(param(params, 1))
                        != Some(ObjectProperty::ObjectFileName)
                    {
                        return fail(ResponseCode::InvalidObjectPropCode);
                    }
                    let name = data
                        .and_then(|d| Reader::new(d).read_string().ok())
                        .unwrap_or_default();
                    match self.objects.get_mut(&handle) {
                        Some(object) => {
                            object.info.filename = name;
                            (None, OK, vec![])
                        }
                        None => fail(ResponseCode::InvalidObjectHandle),
                    }
                }
                Some(OperationCode::GetDevicePropValue) => {
                    let mut w = Writer::new();
                    match DeviceProperty::from_u32(param(params, 0)) {
                        Some(DeviceProperty::DeviceFriendlyName) => {
                            w.write_string("Fake Device").unwrap()
                        }
                        Some(DeviceProperty::BatteryLevel) => w.write_u8(88),
                        _ => return fail(ResponseCode::DevicePropNotSupported),
                    }
                    (Some(w.finish()), OK, vec![])
                }
                Some(OperationCode::BeginEditObject) => {
                    let handle = param(params, 0);
                    if self.objects.contains_key(&handle) {
                        self.edits.insert(handle);
                        (None, OK, vec![])
                    } else {
                        fail(ResponseCode::InvalidObjectHandle)
                    }
                }
                Some(OperationCode::TruncateObject) => {
                    let handle = param(params, 0);
                    let size = param(params, 1) as u64 | (param(params, 2) as u64) << 32;
                    if !self.edits.contains(&handle) {
                        return fail(ResponseCode::AccessDenied);
                    }
                    let object = self.objects.get_mut(&handle).unwrap();
                    object.data.resize(size as usize, 0);
                    object.info.object_compressed_size = object.data.len() as u32;
                    (None, OK, vec![])
                }
                Some(OperationCode::SendPartialObject) => {
                    let handle = param(params, 0);
                    let offset =
                        (param(params, 1) as u64 | (param(params, 2) as u64) << 32) as usize;
                    if !self.edits.contains(&handle) {
                        return fail(ResponseCode::AccessDenied);
                    }
                    let payload = data.unwrap_or_default();
                    let object = self.objects.get_mut(&handle).unwrap();
                    if object.data.len() < offset + payload.len() {
                        object.data.resize(offset + payload.len(), 0);
                    }
                    object.data[offset..offset + payload.len()].copy_from_slice(payload);
                    object.info.object_compressed_size = object.data.len() as u32;
                    (None, OK, vec![payload.len() as u32])
                }
                Some(OperationCode::EndEditObject) => {
                    self.edits.remove(&param(params, 0));
                    (None, OK, vec![])
                }
                _ => fail(ResponseCode::OperationNotSupported),
            }
        }

        fn partial_read(
            &mut self,
            handle: u32,
            offset: u64,
            size: u32,
        ) -> (Option<Vec<u8>>, u16, Vec<u32>) {
            match self.objects.get(&handle) {
                Some(object) => {
                    let start = (offset as usize).min(object.data.len());
                    let end = (start + size as usize).min(object.data.len());
                    let slice = object.data[start..end].to_vec();
                    let returned = slice.len() as u32;
                    (Some(slice), ResponseCode::Ok as u16, vec![returned])
                }
                None => (
                    None,
                    ResponseCode::InvalidObjectHandle as u16,
                    vec![],
                ),
            }
        }
    }
}

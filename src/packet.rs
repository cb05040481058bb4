use super::*;
use std::io::Cursor;

/// Size of the container header: length, type, code, transaction id.
pub const CONTAINER_HEADER_SIZE: usize = 12;

/// Length field value denoting a streamed container of unknown size,
/// terminated by a short packet.
pub const CONTAINER_STREAMING_LENGTH: u32 = 0xFFFF_FFFF;

/// Payload collected from a non-Data container is tiny (five parameters at
/// most); anything bigger is a framing error.
const MAX_CONTROL_PAYLOAD: usize = 64;

/// The 12-byte header at the start of every MTP container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerHeader {
    pub length: u32,
    pub container_type: ContainerType,
    pub code: u16,
    pub transaction_id: u32,
}

impl ContainerHeader {
    pub fn new(
        container_type: ContainerType,
        code: u16,
        transaction_id: u32,
        payload_length: Option<u64>,
    ) -> Self {
        let length = match payload_length {
            Some(n) if n < (CONTAINER_STREAMING_LENGTH as u64 - CONTAINER_HEADER_SIZE as u64) => {
                n as u32 + CONTAINER_HEADER_SIZE as u32
            }
            _ => CONTAINER_STREAMING_LENGTH,
        };
        Self {
            length,
            container_type,
            code,
            transaction_id,
        }
    }

    pub fn to_bytes(&self) -> [u8; CONTAINER_HEADER_SIZE] {
        let mut bytes = [0u8; CONTAINER_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.length.to_le_bytes());
        bytes[4..6].copy_from_slice(&(self.container_type as u16).to_le_bytes());
        bytes[6..8].copy_from_slice(&self.code.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.transaction_id.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8; CONTAINER_HEADER_SIZE]) -> Result<Self> {
        let length = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        if length < CONTAINER_HEADER_SIZE as u32 {
            return Err(Error::InvalidResponse("container length below header size"));
        }
        let type_code = u16::from_le_bytes(bytes[4..6].try_into().unwrap());
        let container_type = ContainerType::from_u16(type_code)
            .ok_or(Error::InvalidResponse("unknown container type"))?;
        Ok(Self {
            length,
            container_type,
            code: u16::from_le_bytes(bytes[6..8].try_into().unwrap()),
            transaction_id: u32::from_le_bytes(bytes[8..12].try_into().unwrap()),
        })
    }

    /// Declared payload size; `None` for streamed containers.
    pub fn payload_length(&self) -> Option<u64> {
        if self.length == CONTAINER_STREAMING_LENGTH {
            None
        } else {
            Some(self.length as u64 - CONTAINER_HEADER_SIZE as u64)
        }
    }
}

/// One container received from the device. Data payload has already been
/// streamed to the caller's sink; `payload` holds the body of Response and
/// Event containers.
#[derive(Debug)]
pub struct Message {
    pub header: ContainerHeader,
    pub payload: Vec<u8>,
}

/// Serializes and reassembles MTP containers over the bulk pipe.
///
/// The container header travels at the start of the first URB of a
/// transfer; payloads span as many URBs as needed.
pub struct Packetizer {
    pipe: Arc<BulkPipe>,
}

impl Packetizer {
    pub fn new(pipe: Arc<BulkPipe>) -> Self {
        Self { pipe }
    }

    pub fn pipe(&self) -> &Arc<BulkPipe> {
        &self.pipe
    }

    /// Send a Command container.
    pub fn write_command(&self, request: &OperationRequest, timeout_ms: i32) -> Result<()> {
        let header = ContainerHeader::new(
            ContainerType::Command,
            request.opcode as u16,
            request.transaction_id,
            Some(4 * request.params.len() as u64),
        );
        let mut w = Writer::new();
        for &param in &request.params {
            w.write_u32(param);
        }
        let mut bytes = header.to_bytes().to_vec();
        bytes.extend_from_slice(&w.finish());
        trace!("> {:?}", request);
        self.pipe
            .write(&mut Cursor::new(bytes), Some(header.length as u64), timeout_ms)?;
        Ok(())
    }

    /// Send a Data container whose payload is streamed from `source`.
    /// `payload_size` of `None` (or 4 GiB and up) produces a streamed
    /// container terminated by a short packet.
    pub fn write_data(
        &self,
        code: u16,
        transaction_id: u32,
        source: &mut dyn Read,
        payload_size: Option<u64>,
        timeout_ms: i32,
    ) -> Result<u64> {
        let header = ContainerHeader::new(ContainerType::Data, code, transaction_id, payload_size);
        let declared = if header.length == CONTAINER_STREAMING_LENGTH {
            None
        } else {
            Some(header.length as u64)
        };
        trace!(
            "> data container code {code:#06x} tid {transaction_id} length {:#x}",
            header.length
        );
        let mut stream = Cursor::new(header.to_bytes()).chain(source);
        let written = self.pipe.write(&mut stream, declared, timeout_ms)?;
        Ok(written.saturating_sub(CONTAINER_HEADER_SIZE as u64))
    }

    /// Receive one container. Data payload is streamed into `data_sink`;
    /// other containers are returned in [`Message::payload`].
    pub fn read_message(&self, data_sink: &mut dyn Write, timeout_ms: i32) -> Result<Message> {
        let mut sink = ContainerSink::new(data_sink);
        self.pipe.read(&mut sink, timeout_ms)?;
        let message = sink.finish()?;
        trace!(
            "< {:?} container code {:#06x} tid {} length {:#x}",
            message.header.container_type,
            message.header.code,
            message.header.transaction_id,
            message.header.length
        );
        Ok(message)
    }
}

/// Write adapter that peels the container header off the byte stream and
/// routes the payload by container type.
struct ContainerSink<'a> {
    data_sink: &'a mut dyn Write,
    header_bytes: [u8; CONTAINER_HEADER_SIZE],
    header_filled: usize,
    header: Option<ContainerHeader>,
    parse_error: Option<Error>,
    payload: Vec<u8>,
    total: u64,
}

impl<'a> ContainerSink<'a> {
    fn new(data_sink: &'a mut dyn Write) -> Self {
        Self {
            data_sink,
            header_bytes: [0; CONTAINER_HEADER_SIZE],
            header_filled: 0,
            header: None,
            parse_error: None,
            payload: Vec::new(),
            total: 0,
        }
    }

    fn finish(self) -> Result<Message> {
        if let Some(err) = self.parse_error {
            return Err(err);
        }
        let header = self
            .header
            .ok_or(Error::InvalidResponse("container shorter than its header"))?;
        if let Some(expected) = header.payload_length() {
            let received = self.total - CONTAINER_HEADER_SIZE as u64;
            if received != expected {
                // some devices pad or truncate; the session validates what
                // it actually decodes
                warn!(
                    "container declared {expected} payload bytes, received {received}"
                );
            }
        }
        Ok(Message {
            header,
            payload: self.payload,
        })
    }
}

impl Write for ContainerSink<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut rest = buf;
        self.total += buf.len() as u64;
        if self.header_filled < CONTAINER_HEADER_SIZE {
            let n = rest.len().min(CONTAINER_HEADER_SIZE - self.header_filled);
            self.header_bytes[self.header_filled..self.header_filled + n]
                .copy_from_slice(&rest[..n]);
            self.header_filled += n;
            rest = &rest[n..];
            if self.header_filled == CONTAINER_HEADER_SIZE {
                match ContainerHeader::from_bytes(&self.header_bytes) {
                    Ok(header) => self.header = Some(header),
                    Err(err) => self.parse_error = Some(err),
                }
            }
        }
        if !rest.is_empty() && self.parse_error.is_none() {
            match self.header.map(|h| h.container_type) {
                Some(ContainerType::Data) => self.data_sink.write_all(rest)?,
                Some(_) => {
                    if self.payload.len() + rest.len() > MAX_CONTROL_PAYLOAD {
                        self.parse_error =
                            Some(Error::InvalidResponse("oversized non-data container"));
                    } else {
                        self.payload.extend_from_slice(rest);
                    }
                }
                None => {}
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.data_sink.flush()
    }
}

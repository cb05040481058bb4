use super::*;

/// MTP data type codes, as used by device/object property descriptions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum DataType {
    Undefined = 0x0000,
    Int8 = 0x0001,
    Uint8 = 0x0002,
    Int16 = 0x0003,
    Uint16 = 0x0004,
    Int32 = 0x0005,
    Uint32 = 0x0006,
    Int64 = 0x0007,
    Uint64 = 0x0008,
    Int128 = 0x0009,
    Uint128 = 0x000A,
    ArrayInt8 = 0x4001,
    ArrayUint8 = 0x4002,
    ArrayInt16 = 0x4003,
    ArrayUint16 = 0x4004,
    ArrayInt32 = 0x4005,
    ArrayUint32 = 0x4006,
    ArrayInt64 = 0x4007,
    ArrayUint64 = 0x4008,
    ArrayInt128 = 0x4009,
    ArrayUint128 = 0x400A,
    String = 0xFFFF,
}

impl DataType {
    /// The element type of an array type.
    pub fn element(&self) -> Option<DataType> {
        let code = *self as u32;
        if (0x4001..=0x400A).contains(&code) {
            DataType::from_u32(code - 0x4000)
        } else {
            None
        }
    }
}

/// A decoded property value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int8(i8),
    Uint8(u8),
    Int16(i16),
    Uint16(u16),
    Int32(i32),
    Uint32(u32),
    Int64(i64),
    Uint64(u64),
    Int128(i128),
    Uint128(u128),
    Array(Vec<Value>),
    String(String),
}

impl Value {
    /// The value widened to `u64`, when it is a non-negative integer that
    /// fits.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Uint8(v) => Some(v.into()),
            Value::Uint16(v) => Some(v.into()),
            Value::Uint32(v) => Some(v.into()),
            Value::Uint64(v) => Some(v),
            Value::Int8(v) => u64::try_from(v).ok(),
            Value::Int16(v) => u64::try_from(v).ok(),
            Value::Int32(v) => u64::try_from(v).ok(),
            Value::Int64(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Little-endian reader over a wire payload.
pub struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

macro_rules! read_le {
    ($name:ident, $ty:ty) => {
        pub fn $name(&mut self) -> Result<$ty> {
            let bytes = self.take(std::mem::size_of::<$ty>())?;
            Ok(<$ty>::from_le_bytes(bytes.try_into().unwrap()))
        }
    };
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::InvalidResponse("truncated payload"));
        }
        let bytes = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(bytes)
    }

    read_le!(read_u8, u8);
    read_le!(read_u16, u16);
    read_le!(read_u32, u32);
    read_le!(read_u64, u64);
    read_le!(read_u128, u128);
    read_le!(read_i8, i8);
    read_le!(read_i16, i16);
    read_le!(read_i32, i32);
    read_le!(read_i64, i64);
    read_le!(read_i128, i128);

    /// An MTP string: one byte of character count (terminating NUL
    /// included), then that many UTF-16LE code units. Count 0 is the
    /// empty string.
    pub fn read_string(&mut self) -> Result<String> {
        let count = self.read_u8()? as usize;
        let mut units = Vec::with_capacity(count);
        for _ in 0..count {
            units.push(self.read_u16()?);
        }
        if units.last() == Some(&0) {
            units.pop();
        }
        String::from_utf16(&units).map_err(|_| Error::InvalidResponse("invalid UTF-16 string"))
    }

    /// A `u32`-count-prefixed array of `u16`.
    pub fn read_array_u16(&mut self) -> Result<Vec<u16>> {
        let count = self.read_u32()? as usize;
        let mut values = Vec::with_capacity(count.min(self.remaining() / 2));
        for _ in 0..count {
            values.push(self.read_u16()?);
        }
        Ok(values)
    }

    /// A `u32`-count-prefixed array of `u32`.
    pub fn read_array_u32(&mut self) -> Result<Vec<u32>> {
        let count = self.read_u32()? as usize;
        let mut values = Vec::with_capacity(count.min(self.remaining() / 4));
        for _ in 0..count {
            values.push(self.read_u32()?);
        }
        Ok(values)
    }

    /// A value of the given wire type.
    pub fn read_value(&mut self, data_type: DataType) -> Result<Value> {
        let value = match data_type {
            DataType::Int8 => Value::Int8(self.read_i8()?),
            DataType::Uint8 => Value::Uint8(self.read_u8()?),
            DataType::Int16 => Value::Int16(self.read_i16()?),
            DataType::Uint16 => Value::Uint16(self.read_u16()?),
            DataType::Int32 => Value::Int32(self.read_i32()?),
            DataType::Uint32 => Value::Uint32(self.read_u32()?),
            DataType::Int64 => Value::Int64(self.read_i64()?),
            DataType::Uint64 => Value::Uint64(self.read_u64()?),
            DataType::Int128 => Value::Int128(self.read_i128()?),
            DataType::Uint128 => Value::Uint128(self.read_u128()?),
            DataType::String => Value::String(self.read_string()?),
            DataType::Undefined => {
                return Err(Error::InvalidResponse("undefined data type"));
            }
            array => {
                let element = array.element().unwrap();
                let count = self.read_u32()? as usize;
                let mut values = Vec::with_capacity(count.min(self.remaining()));
                for _ in 0..count {
                    values.push(self.read_value(element)?);
                }
                Value::Array(values)
            }
        };
        Ok(value)
    }
}

/// Little-endian writer assembling a wire payload.
#[derive(Default)]
pub struct Writer {
    data: Vec<u8>,
}

macro_rules! write_le {
    ($name:ident, $ty:ty) => {
        pub fn $name(&mut self, value: $ty) {
            self.data.extend_from_slice(&value.to_le_bytes());
        }
    };
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Vec<u8> {
        self.data
    }

    write_le!(write_u8, u8);
    write_le!(write_u16, u16);
    write_le!(write_u32, u32);
    write_le!(write_u64, u64);
    write_le!(write_u128, u128);
    write_le!(write_i8, i8);
    write_le!(write_i16, i16);
    write_le!(write_i32, i32);
    write_le!(write_i64, i64);
    write_le!(write_i128, i128);

    /// Encode an MTP string. Fails when the string needs more than 254
    /// UTF-16 code units (the count byte includes the terminating NUL).
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        if s.is_empty() {
            self.write_u8(0);
            return Ok(());
        }
        let units: Vec<u16> = s.encode_utf16().collect();
        if units.len() > 254 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "MTP string exceeds 254 UTF-16 code units",
            )
            .into());
        }
        self.write_u8(units.len() as u8 + 1);
        for unit in units {
            self.write_u16(unit);
        }
        self.write_u16(0);
        Ok(())
    }

    pub fn write_array_u16(&mut self, values: &[u16]) {
        self.write_u32(values.len() as u32);
        for &value in values {
            self.write_u16(value);
        }
    }

    pub fn write_array_u32(&mut self, values: &[u32]) {
        self.write_u32(values.len() as u32);
        for &value in values {
            self.write_u32(value);
        }
    }

    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Int8(v) => self.write_i8(*v),
            Value::Uint8(v) => self.write_u8(*v),
            Value::Int16(v) => self.write_i16(*v),
            Value::Uint16(v) => self.write_u16(*v),
            Value::Int32(v) => self.write_i32(*v),
            Value::Uint32(v) => self.write_u32(*v),
            Value::Int64(v) => self.write_i64(*v),
            Value::Uint64(v) => self.write_u64(*v),
            Value::Int128(v) => self.write_i128(*v),
            Value::Uint128(v) => self.write_u128(*v),
            Value::String(s) => self.write_string(s)?,
            Value::Array(values) => {
                self.write_u32(values.len() as u32);
                for element in values {
                    self.write_value(element)?;
                }
            }
        }
        Ok(())
    }
}

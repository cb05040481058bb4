use super::*;

/// The DeviceInfo dataset returned by GetDeviceInfo.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeviceInfo {
    pub standard_version: u16,
    pub vendor_extension_id: u32,
    pub vendor_extension_version: u16,
    pub vendor_extension_desc: String,
    pub functional_mode: u16,
    pub operations_supported: Vec<u16>,
    pub events_supported: Vec<u16>,
    pub device_properties_supported: Vec<u16>,
    pub capture_formats: Vec<u16>,
    pub playback_formats: Vec<u16>,
    pub manufacturer: String,
    pub model: String,
    pub device_version: String,
    pub serial_number: String,
}

impl DeviceInfo {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = Reader::new(payload);
        Ok(Self {
            standard_version: r.read_u16()?,
            vendor_extension_id: r.read_u32()?,
            vendor_extension_version: r.read_u16()?,
            vendor_extension_desc: r.read_string()?,
            functional_mode: r.read_u16()?,
            operations_supported: r.read_array_u16()?,
            events_supported: r.read_array_u16()?,
            device_properties_supported: r.read_array_u16()?,
            capture_formats: r.read_array_u16()?,
            playback_formats: r.read_array_u16()?,
            manufacturer: r.read_string()?,
            model: r.read_string()?,
            device_version: r.read_string()?,
            serial_number: r.read_string()?,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut w = Writer::new();
        w.write_u16(self.standard_version);
        w.write_u32(self.vendor_extension_id);
        w.write_u16(self.vendor_extension_version);
        w.write_string(&self.vendor_extension_desc)?;
        w.write_u16(self.functional_mode);
        w.write_array_u16(&self.operations_supported);
        w.write_array_u16(&self.events_supported);
        w.write_array_u16(&self.device_properties_supported);
        w.write_array_u16(&self.capture_formats);
        w.write_array_u16(&self.playback_formats);
        w.write_string(&self.manufacturer)?;
        w.write_string(&self.model)?;
        w.write_string(&self.device_version)?;
        w.write_string(&self.serial_number)?;
        Ok(w.finish())
    }

    pub fn supports_operation(&self, op: OperationCode) -> bool {
        self.operations_supported.contains(&(op as u16))
    }
}

/// The StorageInfo dataset returned by GetStorageInfo.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StorageInfo {
    pub storage_type: u16,
    pub filesystem_type: u16,
    pub access_capability: u16,
    pub max_capacity: u64,
    pub free_space_in_bytes: u64,
    pub free_space_in_objects: u32,
    pub storage_description: String,
    pub volume_label: String,
}

impl StorageInfo {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = Reader::new(payload);
        Ok(Self {
            storage_type: r.read_u16()?,
            filesystem_type: r.read_u16()?,
            access_capability: r.read_u16()?,
            max_capacity: r.read_u64()?,
            free_space_in_bytes: r.read_u64()?,
            free_space_in_objects: r.read_u32()?,
            storage_description: r.read_string()?,
            volume_label: r.read_string()?,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut w = Writer::new();
        w.write_u16(self.storage_type);
        w.write_u16(self.filesystem_type);
        w.write_u16(self.access_capability);
        w.write_u64(self.max_capacity);
        w.write_u64(self.free_space_in_bytes);
        w.write_u32(self.free_space_in_objects);
        w.write_string(&self.storage_description)?;
        w.write_string(&self.volume_label)?;
        Ok(w.finish())
    }
}

/// The ObjectInfo dataset.
///
/// `object_compressed_size` is 32-bit on the wire; sizes of 4 GiB and up
/// must be read through the `ObjectSize` object property
/// ([`Session::object_size`](crate::Session::object_size)).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectInfo {
    pub storage_id: u32,
    pub object_format: u16,
    pub protection_status: u16,
    pub object_compressed_size: u32,
    pub thumb_format: u16,
    pub thumb_compressed_size: u32,
    pub thumb_pix_width: u32,
    pub thumb_pix_height: u32,
    pub image_pix_width: u32,
    pub image_pix_height: u32,
    pub image_bit_depth: u32,
    pub parent_object: u32,
    pub association_type: u16,
    pub association_desc: u32,
    pub sequence_number: u32,
    pub filename: String,
    pub capture_date: String,
    pub modification_date: String,
    pub keywords: String,
}

impl ObjectInfo {
    /// A minimal dataset describing a file to be sent with SendObjectInfo.
    pub fn file(filename: &str, format: ObjectFormat, size: u32) -> Self {
        Self {
            object_format: format as u16,
            object_compressed_size: size,
            filename: filename.to_string(),
            ..Self::default()
        }
    }

    /// A dataset describing a folder.
    pub fn directory(name: &str) -> Self {
        Self {
            object_format: ObjectFormat::Association as u16,
            association_type: AssociationType::GenericFolder as u16,
            filename: name.to_string(),
            ..Self::default()
        }
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = Reader::new(payload);
        Ok(Self {
            storage_id: r.read_u32()?,
            object_format: r.read_u16()?,
            protection_status: r.read_u16()?,
            object_compressed_size: r.read_u32()?,
            thumb_format: r.read_u16()?,
            thumb_compressed_size: r.read_u32()?,
            thumb_pix_width: r.read_u32()?,
            thumb_pix_height: r.read_u32()?,
            image_pix_width: r.read_u32()?,
            image_pix_height: r.read_u32()?,
            image_bit_depth: r.read_u32()?,
            parent_object: r.read_u32()?,
            association_type: r.read_u16()?,
            association_desc: r.read_u32()?,
            sequence_number: r.read_u32()?,
            filename: r.read_string()?,
            capture_date: r.read_string()?,
            modification_date: r.read_string()?,
            keywords: r.read_string()?,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut w = Writer::new();
        w.write_u32(self.storage_id);
        w.write_u16(self.object_format);
        w.write_u16(self.protection_status);
        w.write_u32(self.object_compressed_size);
        w.write_u16(self.thumb_format);
        w.write_u32(self.thumb_compressed_size);
        w.write_u32(self.thumb_pix_width);
        w.write_u32(self.thumb_pix_height);
        w.write_u32(self.image_pix_width);
        w.write_u32(self.image_pix_height);
        w.write_u32(self.image_bit_depth);
        w.write_u32(self.parent_object);
        w.write_u16(self.association_type);
        w.write_u32(self.association_desc);
        w.write_u32(self.sequence_number);
        w.write_string(&self.filename)?;
        w.write_string(&self.capture_date)?;
        w.write_string(&self.modification_date)?;
        w.write_string(&self.keywords)?;
        Ok(w.finish())
    }
}

/// Allowed value range or enumeration in an [`ObjectPropDesc`].
#[derive(Clone, Debug, PartialEq)]
pub enum PropDescForm {
    None,
    Range {
        minimum: Value,
        maximum: Value,
        step: Value,
    },
    Enumeration(Vec<Value>),
    /// An unrecognized form flag; the form dataset is kept raw.
    Other(u8, Vec<u8>),
}

/// The ObjectPropDesc dataset returned by GetObjectPropDesc.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectPropDesc {
    pub property_code: u16,
    pub data_type: DataType,
    pub writable: bool,
    pub default_value: Value,
    pub group_code: u32,
    pub form: PropDescForm,
}

impl ObjectPropDesc {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = Reader::new(payload);
        let property_code = r.read_u16()?;
        let data_type = DataType::from_u16(r.read_u16()?)
            .ok_or(Error::InvalidResponse("unknown data type"))?;
        let writable = r.read_u8()? != 0;
        let default_value = r.read_value(data_type)?;
        let group_code = r.read_u32()?;
        let form_flag = r.read_u8()?;
        let form = match form_flag {
            0 => PropDescForm::None,
            1 => PropDescForm::Range {
                minimum: r.read_value(data_type)?,
                maximum: r.read_value(data_type)?,
                step: r.read_value(data_type)?,
            },
            2 => {
                let count = r.read_u16()? as usize;
                let mut values = Vec::with_capacity(count.min(r.remaining()));
                for _ in 0..count {
                    values.push(r.read_value(data_type)?);
                }
                PropDescForm::Enumeration(values)
            }
            flag => {
                let rest = r.remaining();
                let mut raw = Vec::with_capacity(rest);
                for _ in 0..rest {
                    raw.push(r.read_u8()?);
                }
                PropDescForm::Other(flag, raw)
            }
        };
        Ok(Self {
            property_code,
            data_type,
            writable,
            default_value,
            group_code,
            form,
        })
    }
}

/// The identifiers assigned by the device after SendObjectInfo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NewObjectInfo {
    pub storage_id: u32,
    pub parent_object_id: u32,
    pub object_id: u32,
}

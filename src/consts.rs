use super::*;

/// All storages, as a `storage_id` argument.
pub const ALL_STORAGES: u32 = 0xFFFF_FFFF;
/// The storage root, as a `parent` argument.
pub const ROOT_PARENT: u32 = 0xFFFF_FFFF;
/// The device itself, as an object handle.
pub const DEVICE_OBJECT: u32 = 0;
/// Any object format, as a `format` argument.
pub const ALL_FORMATS: u32 = 0;

/// Transaction id 0 is reserved; real transactions start at 1.
pub const RESERVED_TRANSACTION_ID: u32 = 0;

/// bmRequestType of class-specific requests to the MTP interface.
pub const CLASS_REQUEST_TYPE_OUT: u8 = 0x21;
/// Class-specific Cancel Transaction request (PIMA 15740 annex D).
pub const CLASS_REQUEST_CANCEL: u8 = 0x64;

/// MTP container types (first header field after the length).
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum ContainerType {
    Command = 1,
    Data = 2,
    Response = 3,
    Event = 4,
}

/// PTP operation codes, including the MTP (0x98xx) and Android (0x95xx)
/// extensions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum OperationCode {
    GetDeviceInfo = 0x1001,
    OpenSession = 0x1002,
    CloseSession = 0x1003,
    GetStorageIds = 0x1004,
    GetStorageInfo = 0x1005,
    GetNumObjects = 0x1006,
    GetObjectHandles = 0x1007,
    GetObjectInfo = 0x1008,
    GetObject = 0x1009,
    GetThumb = 0x100A,
    DeleteObject = 0x100B,
    SendObjectInfo = 0x100C,
    SendObject = 0x100D,
    GetDevicePropDesc = 0x1014,
    GetDevicePropValue = 0x1015,
    SetDevicePropValue = 0x1016,
    GetPartialObject = 0x101B,
    GetObjectPropsSupported = 0x9801,
    GetObjectPropDesc = 0x9802,
    GetObjectPropValue = 0x9803,
    SetObjectPropValue = 0x9804,
    GetObjectPropList = 0x9805,
    GetPartialObject64 = 0x95C1,
    SendPartialObject = 0x95C2,
    TruncateObject = 0x95C3,
    BeginEditObject = 0x95C4,
    EndEditObject = 0x95C5,
}

/// The Android in-place edit extension: all four ops must be advertised.
pub const EDIT_OBJECT_OPERATIONS: [OperationCode; 4] = [
    OperationCode::SendPartialObject,
    OperationCode::TruncateObject,
    OperationCode::BeginEditObject,
    OperationCode::EndEditObject,
];

/// PTP/MTP response codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum ResponseCode {
    Undefined = 0x2000,
    Ok = 0x2001,
    GeneralError = 0x2002,
    SessionNotOpen = 0x2003,
    InvalidTransactionId = 0x2004,
    OperationNotSupported = 0x2005,
    ParameterNotSupported = 0x2006,
    IncompleteTransfer = 0x2007,
    InvalidStorageId = 0x2008,
    InvalidObjectHandle = 0x2009,
    DevicePropNotSupported = 0x200A,
    InvalidObjectFormatCode = 0x200B,
    StoreFull = 0x200C,
    ObjectWriteProtected = 0x200D,
    StoreReadOnly = 0x200E,
    AccessDenied = 0x200F,
    NoThumbnailPresent = 0x2010,
    SelfTestFailed = 0x2011,
    PartialDeletion = 0x2012,
    StoreNotAvailable = 0x2013,
    SpecificationByFormatUnsupported = 0x2014,
    NoValidObjectInfo = 0x2015,
    InvalidCodeFormat = 0x2016,
    UnknownVendorCode = 0x2017,
    CaptureAlreadyTerminated = 0x2018,
    DeviceBusy = 0x2019,
    InvalidParentObject = 0x201A,
    InvalidDevicePropFormat = 0x201B,
    InvalidDevicePropValue = 0x201C,
    InvalidParameter = 0x201D,
    SessionAlreadyOpen = 0x201E,
    TransactionCancelled = 0x201F,
    SpecificationOfDestinationUnsupported = 0x2020,
    InvalidObjectPropCode = 0xA801,
    InvalidObjectPropFormat = 0xA802,
    InvalidObjectPropValue = 0xA803,
    InvalidObjectReference = 0xA804,
    GroupNotSupported = 0xA805,
    InvalidDataset = 0xA806,
    ObjectTooLarge = 0xA809,
}

/// PTP event codes. Only `CancelTransaction` is produced by this library
/// (as the payload of the cancel control transfer).
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum EventCode {
    Undefined = 0x4000,
    CancelTransaction = 0x4001,
    ObjectAdded = 0x4002,
    ObjectRemoved = 0x4003,
    StoreAdded = 0x4004,
    StoreRemoved = 0x4005,
    DevicePropChanged = 0x4006,
    ObjectInfoChanged = 0x4007,
    DeviceInfoChanged = 0x4008,
    RequestObjectTransfer = 0x4009,
    StoreFull = 0x400A,
    DeviceReset = 0x400B,
    StorageInfoChanged = 0x400C,
    CaptureComplete = 0x400D,
    UnreportedStatus = 0x400E,
}

/// Object format codes (a small useful subset).
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum ObjectFormat {
    Undefined = 0x3000,
    Association = 0x3001,
    Text = 0x3004,
    Html = 0x3005,
    Wav = 0x3008,
    Mp3 = 0x3009,
    Avi = 0x300A,
    Mpeg = 0x300B,
    ExifJpeg = 0x3801,
    Bmp = 0x3804,
    Gif = 0x3807,
    Png = 0x380B,
}

/// Association (folder) subtypes used in `ObjectInfo`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum AssociationType {
    Undefined = 0x0000,
    GenericFolder = 0x0001,
}

/// MTP object property codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum ObjectProperty {
    StorageId = 0xDC01,
    ObjectFormat = 0xDC02,
    ProtectionStatus = 0xDC03,
    ObjectSize = 0xDC04,
    ObjectFileName = 0xDC07,
    DateCreated = 0xDC08,
    DateModified = 0xDC09,
    ParentObject = 0xDC0B,
    PersistentUniqueObjectIdentifier = 0xDC41,
    Name = 0xDC44,
}

/// MTP device property codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum DeviceProperty {
    BatteryLevel = 0x5001,
    SynchronizationPartner = 0xD401,
    DeviceFriendlyName = 0xD402,
}

/// Storage types reported in `StorageInfo`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum StorageType {
    Undefined = 0x0000,
    FixedRom = 0x0001,
    RemovableRom = 0x0002,
    FixedRam = 0x0003,
    RemovableRam = 0x0004,
}

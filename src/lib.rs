//! A library for talking MTP (Media Transfer Protocol) to Android-style
//! devices over USB.
//!
//! The crate implements the PTP session layer and its bulk transport pipe:
//! container framing over URBs, transaction sequencing, streamed object
//! transfers, cancellation via the class control channel, and the Android
//! in-place edit extension. A USB backend supplies the endpoints through
//! the [`UsbTransport`] trait; [`RusbTransport`] is the shipped libusb
//! implementation, and device discovery stays with the caller.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! # fn main() -> mtp::Result<()> {
//! let handle = rusb::open_device_with_vid_pid(0x18d1, 0x4ee1)
//!     .ok_or(mtp::Error::Disconnected)?;
//! let transport = mtp::RusbTransport::claim(handle, 0)?;
//! let pipe = mtp::BulkPipe::new(
//!     Arc::new(transport),
//!     mtp::UsbEndpoint::bulk(0x81, 512),
//!     mtp::UsbEndpoint::bulk(0x01, 512),
//!     Some(mtp::UsbEndpoint::interrupt(0x82, 28, 6)),
//!     0,
//! );
//! let session = mtp::Session::open(Arc::new(pipe), 1)?;
//! for storage_id in session.get_storage_ids()? {
//!     for handle in session.get_object_handles(storage_id, mtp::ALL_FORMATS, mtp::ROOT_PARENT)? {
//!         println!("{}", session.get_object_info(handle)?.filename);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use log::*;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::collections::{HashMap, VecDeque};
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

mod codec;
mod consts;
mod edit;
mod endpoint;
mod error;
mod host;
mod messages;
mod packet;
mod pipe;
mod session;
mod transport;
mod util;

pub use codec::*;
pub use consts::*;
pub use edit::*;
pub use endpoint::*;
pub use error::*;
pub use host::*;
pub use messages::*;
pub use packet::*;
pub use pipe::*;
pub use session::*;
pub use transport::*;

//! Error types for MTP operations.

/// Alias for `Result<T, mtp::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by session operations and the transport pipe.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// No URB completed within the requested timeout. Recoverable; the
    /// timed-out URB has already been discarded.
    #[error("operation timed out")]
    Timeout,

    /// The transaction was aborted via [`Session::abort_current_transaction`].
    ///
    /// [`Session::abort_current_transaction`]: crate::Session::abort_current_transaction
    #[error("transaction cancelled")]
    Cancelled,

    /// The interface cannot be claimed or the kernel reported the device busy.
    #[error("device busy")]
    Busy,

    /// An operation was started while another transaction is in flight on
    /// the same session.
    #[error("another transaction is already in progress")]
    BusyTransaction,

    /// The device answered with a non-OK response code.
    #[error("device returned response code {0:#06x}")]
    Protocol(u16),

    /// A container failed validation (length below header size, unknown
    /// container type, mismatched transaction id).
    #[error("invalid response: {0}")]
    InvalidResponse(&'static str),

    /// URB submission or reaping indicates the device is gone. Terminal.
    #[error("device disconnected")]
    Disconnected,

    /// The device does not advertise the requested feature.
    #[error("not supported by this device")]
    NotSupported,

    /// An I/O error from a caller-supplied stream or the USB backend.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

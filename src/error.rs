//! Unified error types for the FieldCam firmware.
//!
//! Follows embedded best practice: a single `Error` enum that every
//! subsystem can convert into, keeping the dispatch layer's error handling
//! uniform. All variants are `Copy` so they can be cheaply threaded through
//! the mode and update machines without allocation.
//!
//! Propagation policy: `Config` and `Protocol` are local - the request is
//! rejected with no state change. `Attach` leaves the controller in the
//! fallback state decided by the mode controller. `Storage` forces the
//! update session into its failed state and is surfaced verbatim to the
//! requester before the restart. Nothing is retried by the core.

use core::fmt;

use crate::app::ports::{AttachError, StorageError, TransportError};
use crate::update::ProtocolError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A required configuration value is missing or invalid.
    Config(&'static str),
    /// Joining the target network failed or timed out.
    Attach(AttachError),
    /// The update sink could not be opened, written or finalized.
    Storage(StorageError),
    /// An upload event arrived out of the expected order.
    Protocol(ProtocolError),
    /// Writing a response body to the requester failed.
    Transport(TransportError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Attach(e) => write!(f, "attach: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl From<AttachError> for Error {
    fn from(e: AttachError) -> Self {
        Self::Attach(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

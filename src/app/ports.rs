//! Port traits - the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (radio, camera, flash, response transport) implement
//! these traits. The [`AppService`](super::service::AppService) consumes
//! them via generics, so the domain core never touches hardware directly.
//!
//! ## Resource notes
//!
//! - **FrameSource** buffers are a scarce reservation: every `acquire`
//!   MUST be paired with exactly one `release`, on every exit path.
//! - **UpdateSink** implementations MUST NOT retry a short write; the
//!   session layer abandons the upload instead.
//! - All port errors are typed - callers must handle every variant
//!   explicitly.

use crate::stream::Frame;

// ───────────────────────────────────────────────────────────────
// Network port (driven adapter: domain → radio)
// ───────────────────────────────────────────────────────────────

/// Controls the device's network identity: either advertising its own
/// hub network or attached to an external one as a client.
pub trait NetworkPort {
    /// Begin broadcasting the device's own network under `name`.
    fn start_hub(&mut self, name: &str, secret: &str) -> Result<(), NetworkError>;

    /// Stop broadcasting the device's own network.
    fn stop_hub(&mut self);

    /// Attach to the external network `name` using `secret`, blocking at
    /// most `timeout_ms` milliseconds. Implementations MUST return within
    /// the bound - a driver that cannot confirm in time reports
    /// [`AttachError::TimedOut`].
    fn attach(&mut self, name: &str, secret: &str, timeout_ms: u32)
    -> Result<(), AttachError>;
}

// ───────────────────────────────────────────────────────────────
// Frame source port (driven adapter: camera → domain)
// ───────────────────────────────────────────────────────────────

/// Produces one captured frame per request.
///
/// `acquire` returning `None` means no frame is available - a
/// distinguished empty result, never an error. An acquired frame holds a
/// buffer reservation in the source until `release` returns it.
pub trait FrameSource {
    fn acquire(&mut self) -> Option<Frame>;
    fn release(&mut self, frame: Frame);
}

// ───────────────────────────────────────────────────────────────
// Update sink port (driven adapter: domain → non-volatile staging)
// ───────────────────────────────────────────────────────────────

/// Append-only staging area for a firmware image.
///
/// Lifecycle: `begin` → N × `write` → `commit` or `abort`. A committed
/// image takes effect on the next restart; an aborted one leaves the
/// running firmware untouched.
pub trait UpdateSink {
    /// Open the staging area. Fails when storage cannot hold an image.
    fn begin(&mut self) -> Result<(), StorageError>;

    /// Append `data`. Returns the number of bytes actually written; a
    /// count short of `data.len()` is reported as-is, never retried here.
    fn write(&mut self, data: &[u8]) -> Result<usize, StorageError>;

    /// Seal the staged image, with `total` as the authoritative size.
    fn commit(&mut self, total: u64) -> Result<(), StorageError>;

    /// Discard everything staged so far. Idempotent.
    fn abort(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Body sink port (driven adapter: domain → response transport)
// ───────────────────────────────────────────────────────────────

/// Write side of one in-flight response, for bodies too large to buffer.
pub trait BodySink {
    /// Declare the body length and media type before any payload bytes.
    fn begin_body(&mut self, len: usize, media_type: &str) -> Result<(), TransportError>;

    /// Write the whole of `data`, or fail.
    fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log, a
/// status characteristic, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`NetworkPort::start_hub`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// The radio refused to bring the hub up.
    HubStartFailed,
}

/// Errors from [`NetworkPort::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachError {
    /// No confirmation within the caller's bound.
    TimedOut,
    /// The target network rejected the secret.
    AuthRejected,
}

/// Errors from [`UpdateSink`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Storage cannot hold an image of the permitted size.
    InsufficientSpace,
    /// The staging area could not be opened.
    OpenFailed,
    /// An append failed outright.
    WriteFailed,
    /// The staged image could not be sealed.
    FinalizeFailed,
}

/// Errors from [`BodySink`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The requester went away mid-body.
    ConnectionClosed,
    /// The transport failed to accept payload bytes.
    WriteFailed,
}

impl core::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::HubStartFailed => write!(f, "hub start failed"),
        }
    }
}

impl core::fmt::Display for AttachError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TimedOut => write!(f, "no confirmation within the attach timeout"),
            Self::AuthRejected => write!(f, "network rejected the secret"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InsufficientSpace => write!(f, "insufficient storage for image"),
            Self::OpenFailed => write!(f, "staging area open failed"),
            Self::WriteFailed => write!(f, "staging write failed"),
            Self::FinalizeFailed => write!(f, "staged image finalize failed"),
        }
    }
}

impl core::fmt::Display for TransportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ConnectionClosed => write!(f, "connection closed"),
            Self::WriteFailed => write!(f, "body write failed"),
        }
    }
}

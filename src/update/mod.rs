//! Firmware upload session - state machine over the update sink.
//!
//! ```text
//!  IDLE ──Start──▶ RECEIVING ──End──▶ FINISHED
//!    │                 │                  │
//!    │ [open failed]   │ [short write /   │
//!    ▼                 ▼  write failed]   ▼
//!  FAILED ◀────────────┘            report "OK", restart
//!    │
//!    └──End──▶ report "FAIL", restart
//! ```
//!
//! At most one session exists; the only re-arm is a device restart, so a
//! half-applied image can never be resumed into. No chunk is retried -
//! a short write abandons the whole session and the caller re-uploads.
//! Protocol violations (events out of order, events after the outcome
//! was reported) are rejected with no state change.

use log::{info, warn};

use crate::app::ports::{StorageError, UpdateSink};
use crate::router::UploadEvent;
use crate::{Error, Result};

// ── Errors ────────────────────────────────────────────────────

/// An upload event arrived outside the expected order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// `Chunk` or `End` with no session open.
    NoSession,
    /// `Start` while a session is already receiving.
    SessionOpen,
    /// Any event after the session outcome was reported.
    SessionConcluded,
}

impl core::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoSession => write!(f, "upload event with no session open"),
            Self::SessionOpen => write!(f, "upload already in progress"),
            Self::SessionConcluded => write!(f, "upload session already concluded"),
        }
    }
}

/// Why a session failed. Recorded once; later chunks are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateFailure {
    /// The sink refused an open, write or finalize.
    Storage(StorageError),
    /// A write accepted fewer bytes than submitted.
    ShortWrite { submitted: usize, written: usize },
}

impl core::fmt::Display for UpdateFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "{e}"),
            Self::ShortWrite { submitted, written } => {
                write!(f, "short write ({written} of {submitted} bytes)")
            }
        }
    }
}

// ── Session state ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Receiving { bytes_written: u64 },
    Finished { total: u64 },
    Failed { reason: UpdateFailure },
}

/// What one upload event produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    /// The event was applied; `bytes_written` is the running total.
    Accepted { bytes_written: u64 },
    /// The event was absorbed by a failed session (nothing written).
    Discarded,
    /// `End` was processed; this is the session outcome. The device must
    /// report `"OK"`/`"FAIL"` and then restart unconditionally.
    Complete {
        ok: bool,
        bytes: u64,
        digest: [u8; 32],
    },
}

// ── Handler ───────────────────────────────────────────────────

/// Drives an [`UpdateSink`] through one upload session.
pub struct UpdateHandler {
    phase: UploadPhase,
    /// Set once the outcome has been reported; every later event is a
    /// protocol error until the restart re-arms the device.
    concluded: bool,
    discarded_chunks: u32,
    digest: Option<hmac_sha256::Hash>,
    max_image_size: u32,
}

impl UpdateHandler {
    pub fn new(max_image_size: u32) -> Self {
        Self {
            phase: UploadPhase::Idle,
            concluded: false,
            discarded_chunks: 0,
            digest: None,
            max_image_size,
        }
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    /// The recorded failure, if the session has failed.
    pub fn failure(&self) -> Option<UpdateFailure> {
        match self.phase {
            UploadPhase::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    /// Feed one upload event through the state machine.
    pub fn handle_event(
        &mut self,
        event: UploadEvent,
        sink: &mut impl UpdateSink,
    ) -> Result<UploadStatus> {
        if self.concluded {
            return Err(Error::Protocol(ProtocolError::SessionConcluded));
        }

        match event {
            UploadEvent::Start => self.on_start(sink),
            UploadEvent::Chunk(data) => self.on_chunk(&data, sink),
            UploadEvent::End => self.on_end(sink),
        }
    }

    // ── Transitions ───────────────────────────────────────────

    fn on_start(&mut self, sink: &mut impl UpdateSink) -> Result<UploadStatus> {
        match self.phase {
            UploadPhase::Idle => {}
            UploadPhase::Receiving { .. } => {
                return Err(Error::Protocol(ProtocolError::SessionOpen));
            }
            // Unreachable before conclusion only via an open-failure;
            // a second Start on a failed session is out of order.
            UploadPhase::Finished { .. } | UploadPhase::Failed { .. } => {
                return Err(Error::Protocol(ProtocolError::SessionOpen));
            }
        }

        match sink.begin() {
            Ok(()) => {
                self.phase = UploadPhase::Receiving { bytes_written: 0 };
                self.digest = Some(hmac_sha256::Hash::new());
                info!("Update: session opened");
                Ok(UploadStatus::Accepted { bytes_written: 0 })
            }
            Err(e) => {
                warn!("Update: sink open failed - {}", e);
                self.fail(UpdateFailure::Storage(e), sink);
                Ok(UploadStatus::Discarded)
            }
        }
    }

    fn on_chunk(&mut self, data: &[u8], sink: &mut impl UpdateSink) -> Result<UploadStatus> {
        let bytes_written = match self.phase {
            UploadPhase::Receiving { bytes_written } => bytes_written,
            UploadPhase::Failed { .. } => {
                // Abandoned session: absorb without touching the sink.
                self.discarded_chunks += 1;
                return Ok(UploadStatus::Discarded);
            }
            UploadPhase::Idle | UploadPhase::Finished { .. } => {
                return Err(Error::Protocol(ProtocolError::NoSession));
            }
        };

        if bytes_written + data.len() as u64 > u64::from(self.max_image_size) {
            warn!(
                "Update: image exceeds {} byte limit at offset {}",
                self.max_image_size, bytes_written
            );
            self.fail(UpdateFailure::Storage(StorageError::InsufficientSpace), sink);
            return Ok(UploadStatus::Discarded);
        }

        match sink.write(data) {
            Ok(written) if written == data.len() => {
                if let Some(digest) = self.digest.as_mut() {
                    digest.update(data);
                }
                let total = bytes_written + written as u64;
                self.phase = UploadPhase::Receiving {
                    bytes_written: total,
                };
                Ok(UploadStatus::Accepted {
                    bytes_written: total,
                })
            }
            Ok(written) => {
                // A short write is never retried within the chunk; the
                // session is abandoned and the caller re-uploads.
                warn!(
                    "Update: short write ({} of {} bytes) - abandoning session",
                    written,
                    data.len()
                );
                self.fail(
                    UpdateFailure::ShortWrite {
                        submitted: data.len(),
                        written,
                    },
                    sink,
                );
                Ok(UploadStatus::Discarded)
            }
            Err(e) => {
                warn!("Update: write failed - {}", e);
                self.fail(UpdateFailure::Storage(e), sink);
                Ok(UploadStatus::Discarded)
            }
        }
    }

    fn on_end(&mut self, sink: &mut impl UpdateSink) -> Result<UploadStatus> {
        match self.phase {
            UploadPhase::Receiving { bytes_written } => {
                // The byte count we accumulated is the authoritative
                // image size for the sink's seal.
                match sink.commit(bytes_written) {
                    Ok(()) => {
                        self.phase = UploadPhase::Finished {
                            total: bytes_written,
                        };
                        info!("Update: finished, {} bytes staged", bytes_written);
                        Ok(self.conclude(true, bytes_written))
                    }
                    Err(e) => {
                        warn!("Update: finalize failed - {}", e);
                        self.fail(UpdateFailure::Storage(e), sink);
                        Ok(self.conclude(false, bytes_written))
                    }
                }
            }
            UploadPhase::Failed { reason } => {
                warn!(
                    "Update: session ended after failure ({}), {} chunk(s) discarded",
                    reason, self.discarded_chunks
                );
                Ok(self.conclude(false, 0))
            }
            UploadPhase::Idle | UploadPhase::Finished { .. } => {
                Err(Error::Protocol(ProtocolError::NoSession))
            }
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn fail(&mut self, reason: UpdateFailure, sink: &mut impl UpdateSink) {
        sink.abort();
        self.phase = UploadPhase::Failed { reason };
    }

    fn conclude(&mut self, ok: bool, bytes: u64) -> UploadStatus {
        self.concluded = true;
        let digest = self
            .digest
            .take()
            .map(hmac_sha256::Hash::finalize)
            .unwrap_or([0u8; 32]);
        UploadStatus::Complete { ok, bytes, digest }
    }
}

// ── Tests ─────────────────────────────────────────────────────

//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them - log to serial, surface on a status
//! endpoint, etc. Events never carry the network secret.

use crate::app::ports::AttachError;
use crate::mode::DeviceMode;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The service has started (carries the initial mode).
    Started(DeviceMode),

    /// The credential store was written by a portal submission.
    CredentialsUpdated {
        name_changed: bool,
        secret_changed: bool,
    },

    /// The device moved between hub and client mode.
    ModeChanged { from: DeviceMode, to: DeviceMode },

    /// An attach attempt failed; `hub_resumed` reports whether the
    /// fallback brought the hub back up.
    AttachFailed {
        reason: AttachError,
        hub_resumed: bool,
    },

    /// One frame was streamed to a requester.
    CaptureServed { len: usize },

    /// A capture request found no frame available.
    CaptureEmpty,

    /// An upload session reached its outcome. `digest` is the SHA-256 of
    /// the bytes staged before the outcome was decided.
    UpdateConcluded {
        ok: bool,
        bytes: u64,
        digest: [u8; 32],
    },

    /// The composition root has been asked to restart the device.
    RestartRequested,
}

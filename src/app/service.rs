//! Application service - the hexagonal core.
//!
//! [`AppService`] owns the provisioning handler (and its credential
//! store), the mode controller, the streaming handler and the update
//! handler. It exposes a single `dispatch` entry point: one typed
//! request in, one response plus an optional device action out. All I/O
//! flows through port traits injected at call sites, making the entire
//! service testable with mock adapters.
//!
//! ```text
//!  Request ──▶ ┌──────────────────────────────┐ ──▶ Response
//!              │          AppService           │
//!  NetworkPort │  Provisioning · Mode · Stream │ EventSink
//!  FrameSource │          · Update             │
//!  UpdateSink  └──────────────────────────────┘
//! ```
//!
//! Requests are serviced one at a time to completion; the mutual
//! exclusion on the store, the mode and the upload session is
//! structural, not lock-based.

use log::warn;

use crate::app::events::AppEvent;
use crate::app::ports::{AttachError, BodySink, EventSink, FrameSource, NetworkPort, UpdateSink};
use crate::config::SystemConfig;
use crate::mode::{AttachOutcome, DeviceMode, ModeController};
use crate::provision::{render_portal, ProvisioningHandler};
use crate::router::{DeviceAction, Request, Response};
use crate::stream::{CaptureOutcome, StreamingHandler, FRAME_MEDIA_TYPE};
use crate::update::{UpdateHandler, UploadStatus};
use crate::{Error, Result};

// ───────────────────────────────────────────────────────────────
// Dispatch outcome
// ───────────────────────────────────────────────────────────────

/// Response for the requester plus the follow-up the composition root
/// must execute once the response has been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub response: Response,
    pub action: Option<DeviceAction>,
}

impl Outcome {
    fn reply(response: Response) -> Self {
        Self {
            response,
            action: None,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: SystemConfig,
    provisioning: ProvisioningHandler,
    mode: ModeController,
    streaming: StreamingHandler,
    update: UpdateHandler,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** bring the hub up - call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let update = UpdateHandler::new(config.max_image_size);
        Self {
            config,
            provisioning: ProvisioningHandler::new(),
            mode: ModeController::new(),
            streaming: StreamingHandler::new(),
            update,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring the device's own hub network up so an operator can reach
    /// the portal. The device boots unprovisioned and discoverable.
    pub fn start(
        &mut self,
        net: &mut impl NetworkPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let hub_name = self.config.hub_name.clone();
        let hub_secret = self.config.hub_secret.clone();
        self.mode
            .start_hub(hub_name.as_str(), hub_secret.as_str(), net)?;
        sink.emit(&AppEvent::Started(self.mode.mode()));
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> DeviceMode {
        self.mode.mode()
    }

    pub fn hub_active(&self) -> bool {
        self.mode.hub_active()
    }

    // ── Dispatch ──────────────────────────────────────────────

    /// Service one request to completion.
    ///
    /// The `hw` parameter satisfies all three device-facing ports -
    /// this keeps a single mutable borrow while the port boundary stays
    /// explicit. `body` is the write side of the in-flight response,
    /// used only by the capture route.
    pub fn dispatch(
        &mut self,
        req: Request,
        hw: &mut (impl NetworkPort + FrameSource + UpdateSink),
        body: &mut impl BodySink,
        sink: &mut impl EventSink,
    ) -> Outcome {
        match req {
            Request::PortalPage => {
                Outcome::reply(Response::Page(render_portal(
                    &self.provisioning.portal_view(None),
                )))
            }

            Request::SubmitCredentials(fields) => {
                let submitted = self.provisioning.submit(&fields);
                if submitted.name_changed || submitted.secret_changed {
                    sink.emit(&AppEvent::CredentialsUpdated {
                        name_changed: submitted.name_changed,
                        secret_changed: submitted.secret_changed,
                    });
                }
                Outcome::reply(Response::Page(render_portal(
                    &self.provisioning.portal_view(submitted.notice),
                )))
            }

            Request::Connect => self.handle_connect(hw, sink),

            Request::Capture => match self.streaming.handle_capture(hw, body) {
                Ok(CaptureOutcome::Served { len }) => {
                    sink.emit(&AppEvent::CaptureServed { len });
                    Outcome::reply(Response::Binary {
                        media_type: FRAME_MEDIA_TYPE,
                        len,
                    })
                }
                Ok(CaptureOutcome::Empty) => {
                    sink.emit(&AppEvent::CaptureEmpty);
                    Outcome::reply(Response::Empty)
                }
                // Intentionally silent: the requester already saw the
                // body break off; there is nothing left to say to it.
                Err(_) => Outcome::reply(Response::Empty),
            },

            Request::Upload(event) => self.handle_upload(event, hw, sink),
        }
    }

    // ── Route handlers ────────────────────────────────────────

    fn handle_connect(
        &mut self,
        hw: &mut impl NetworkPort,
        sink: &mut impl EventSink,
    ) -> Outcome {
        let credentials = self.provisioning.store().snapshot();
        let from = self.mode.mode();

        match self
            .mode
            .connect(credentials, self.config.attach_timeout_ms, hw)
        {
            Ok(AttachOutcome::Connected) => {
                sink.emit(&AppEvent::ModeChanged {
                    from,
                    to: self.mode.mode(),
                });
                Outcome::reply(Response::Status("OK"))
            }
            Ok(outcome) => {
                let reason = match outcome {
                    AttachOutcome::TimedOut => AttachError::TimedOut,
                    AttachOutcome::AuthRejected | AttachOutcome::Connected => {
                        AttachError::AuthRejected
                    }
                };
                sink.emit(&AppEvent::AttachFailed {
                    reason,
                    hub_resumed: self.mode.hub_active(),
                });
                Outcome::reply(Response::Status("FAIL"))
            }
            Err(Error::Config(msg)) => {
                // Local rejection, nothing torn down: back to the form
                // with the problem inline.
                Outcome::reply(Response::Page(render_portal(
                    &self.provisioning.portal_view(Some(msg)),
                )))
            }
            Err(e) => {
                warn!("Connect: {}", e);
                Outcome::reply(Response::Status("FAIL"))
            }
        }
    }

    fn handle_upload(
        &mut self,
        event: crate::router::UploadEvent,
        hw: &mut impl UpdateSink,
        sink: &mut impl EventSink,
    ) -> Outcome {
        // Updates are only accepted once the device holds an established
        // network identity - client mode in this configuration.
        if self.mode.mode() != DeviceMode::Client {
            warn!("Update: rejected while still in hub mode");
            return Outcome::reply(Response::Status("FAIL"));
        }

        match self.update.handle_event(event, hw) {
            // Mid-stream events produce no response; the outcome is
            // decided at End.
            Ok(UploadStatus::Accepted { .. } | UploadStatus::Discarded) => {
                Outcome::reply(Response::Empty)
            }
            Ok(UploadStatus::Complete { ok, bytes, digest }) => {
                sink.emit(&AppEvent::UpdateConcluded { ok, bytes, digest });
                sink.emit(&AppEvent::RestartRequested);
                Outcome {
                    response: Response::Status(if ok { "OK" } else { "FAIL" }),
                    // Unconditional: a concluded session - either way -
                    // is only re-armed by a restart.
                    action: Some(DeviceAction::Restart),
                }
            }
            Err(e) => {
                warn!("Update: {}", e);
                Outcome::reply(Response::Status("FAIL"))
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

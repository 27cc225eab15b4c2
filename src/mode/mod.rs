//! Device mode controller.
//!
//! Owns the mutually exclusive hub/client state:
//!
//! ```text
//!  HUB ──[connect: attach confirmed]──▶ CLIENT
//!   ▲ │
//!   └─┘ [connect: attach failed → hub resumed]
//! ```
//!
//! The transition is two-phase: the hub is torn down before the attach
//! attempt, because the radio cannot hold both identities while honoring
//! the one-mode invariant. On a failed or timed-out attach the controller
//! resumes the hub with its retained identity and stays in `Hub` - the
//! device is never left advertising nothing. The reverse transition
//! (client back to hub) is never triggered at runtime; a restart is the
//! way back.

use log::{error, info, warn};

use crate::app::ports::{AttachError, NetworkPort};
use crate::provision::Credentials;
use crate::{Error, Result};

// ── Mode and outcome ──────────────────────────────────────────

/// Which network identity the device currently holds. Exactly one value
/// is live at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMode {
    /// Advertising the device's own network for provisioning.
    Hub,
    /// Attached to an external network as an ordinary member.
    Client,
}

/// Result of one attach attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    Connected,
    TimedOut,
    AuthRejected,
}

// ── Controller ────────────────────────────────────────────────

/// Drives the hub/client transition through a [`NetworkPort`].
pub struct ModeController {
    mode: DeviceMode,
    hub_up: bool,
    hub_name: heapless::String<32>,
    hub_secret: heapless::String<64>,
}

impl ModeController {
    pub fn new() -> Self {
        Self {
            mode: DeviceMode::Hub,
            hub_up: false,
            hub_name: heapless::String::new(),
            hub_secret: heapless::String::new(),
        }
    }

    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    /// Whether the device's own network is currently advertised.
    pub fn hub_active(&self) -> bool {
        self.hub_up
    }

    /// Begin broadcasting the device's own network identity.
    ///
    /// Idempotent while in `Hub`: a second call with the hub already up
    /// changes nothing observable. Calling this in `Client` mode is a
    /// logged no-op - the one-mode invariant cannot be violated by a
    /// stray call.
    pub fn start_hub(
        &mut self,
        name: &str,
        secret: &str,
        net: &mut impl NetworkPort,
    ) -> Result<()> {
        if self.mode == DeviceMode::Client {
            warn!("Mode: start_hub ignored while attached as client");
            return Ok(());
        }
        if self.hub_up {
            return Ok(());
        }

        self.hub_name.clear();
        self.hub_name
            .push_str(name)
            .map_err(|()| Error::Config("hub name too long"))?;
        self.hub_secret.clear();
        self.hub_secret
            .push_str(secret)
            .map_err(|()| Error::Config("hub secret too long"))?;

        net.start_hub(name, secret)
            .map_err(|_| Error::Init("hub start failed"))?;
        self.hub_up = true;
        info!("Mode: hub '{}' up, awaiting provisioning", name);
        Ok(())
    }

    /// Drop the hub and attach to the provisioned network.
    ///
    /// Consumes the credentials: they are used for exactly this one
    /// attempt. The attach is bounded by `timeout_ms`. On failure the hub
    /// is resumed automatically and the mode stays `Hub`; the outcome is
    /// still reported to the caller.
    pub fn connect(
        &mut self,
        credentials: Credentials,
        timeout_ms: u32,
        net: &mut impl NetworkPort,
    ) -> Result<AttachOutcome> {
        if credentials.network_name.is_empty() {
            return Err(Error::Config("network name required"));
        }
        if self.mode == DeviceMode::Client {
            return Err(Error::Config("already attached to a network"));
        }

        info!(
            "Mode: leaving hub, attaching to '{}' (timeout {} ms)",
            credentials.network_name, timeout_ms
        );
        net.stop_hub();
        self.hub_up = false;

        match net.attach(
            credentials.network_name.as_str(),
            credentials.secret.as_str(),
            timeout_ms,
        ) {
            Ok(()) => {
                self.mode = DeviceMode::Client;
                info!("Mode: attached to '{}'", credentials.network_name);
                Ok(AttachOutcome::Connected)
            }
            Err(e) => {
                warn!("Mode: attach failed - {}", e);
                self.resume_hub(net);
                Ok(match e {
                    AttachError::TimedOut => AttachOutcome::TimedOut,
                    AttachError::AuthRejected => AttachOutcome::AuthRejected,
                })
            }
        }
    }

    // ── Internal ──────────────────────────────────────────────

    /// Bring the hub back with its retained identity after a failed
    /// attach. The mode value stays `Hub` either way; a resume failure
    /// leaves the device reachable only after a restart and is the one
    /// degraded state this controller can end in.
    fn resume_hub(&mut self, net: &mut impl NetworkPort) {
        match net.start_hub(self.hub_name.as_str(), self.hub_secret.as_str()) {
            Ok(()) => {
                self.hub_up = true;
                info!("Mode: hub '{}' resumed after failed attach", self.hub_name);
            }
            Err(e) => {
                error!("Mode: hub resume failed - {}", e);
            }
        }
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────

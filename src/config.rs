//! System configuration parameters
//!
//! All tunable parameters for the FieldCam device. The hub identity is the
//! network the device advertises before it has been provisioned; the attach
//! timeout bounds the only blocking operation in the system.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Hub identity ---
    /// Network name the device advertises while unprovisioned.
    pub hub_name: heapless::String<32>,
    /// Secret for the device's own hub network (empty = open network).
    pub hub_secret: heapless::String<64>,

    // --- Mode transition ---
    /// Upper bound on a single network-attach attempt (milliseconds).
    pub attach_timeout_ms: u32,

    // --- Update ---
    /// Maximum accepted firmware image size (bytes).
    pub max_image_size: u32,

    // --- Capture ---
    /// Frame width reported by the simulated capture source.
    pub sim_frame_width: u16,
    /// Frame height reported by the simulated capture source.
    pub sim_frame_height: u16,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut hub_name = heapless::String::new();
        hub_name.push_str("fieldcam-setup").ok();
        let mut hub_secret = heapless::String::new();
        hub_secret.push_str("123456789").ok();

        Self {
            hub_name,
            hub_secret,

            // Long enough for WPA2 association + DHCP on a congested
            // 2.4 GHz channel, short enough that a failed attach is
            // observed as a bounded TimedOut, never a hang.
            attach_timeout_ms: 15_000,

            max_image_size: 4 * 1024 * 1024, // inactive app partition size

            sim_frame_width: 640,
            sim_frame_height: 480,
        }
    }
}

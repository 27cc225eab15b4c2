//! Device identity derived from the ESP32 factory MAC address.
//!
//! Produces a stable, human-readable device ID in the form `FC-XXYYZZ`
//! (last 3 bytes of the 6-byte MAC in uppercase hex). This ID is:
//! - Deterministic across reboots (factory-burned eFuse MAC)
//! - Used as the hub SSID suffix (`fieldcam-XXYYZZ`)
//! - Shown on the portal page next to the firmware version

/// Fixed-size device ID string: "FC-XXYYZZ".
pub type DeviceIdString = heapless::String<16>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Derive the short device ID from the last 3 MAC bytes.
/// Format: `FC-XXYYZZ` (e.g., `FC-EFCAFE`).
pub fn device_id(mac: &MacAddress) -> DeviceIdString {
    let mut id = DeviceIdString::new();
    use core::fmt::Write;
    let _ = write!(id, "FC-{:02X}{:02X}{:02X}", mac[3], mac[4], mac[5]);
    id
}

/// Derive the hub SSID from the last 3 MAC bytes.
/// Format: `fieldcam-xxyyzz` (lowercase, fits the 32-byte SSID bound).
pub fn hub_ssid(mac: &MacAddress) -> heapless::String<32> {
    let mut name = heapless::String::<32>::new();
    use core::fmt::Write;
    let _ = write!(name, "fieldcam-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    name
}

//! Fuzz target: form body parsing and credential merge.
//!
//! Drives arbitrary bytes through the urlencoded parser and the
//! provisioning handler and verifies:
//! - No panics under arbitrary inputs
//! - Parsed fields keep unique keys
//! - The store only ever holds values within its declared bounds
//!
//! cargo fuzz run fuzz_form_fields

#![no_main]

use fieldcam::provision::ProvisioningHandler;
use fieldcam::router::FormFields;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(body) = core::str::from_utf8(data) else {
        return;
    };

    let fields = FormFields::parse_urlencoded(body);

    // Unique keys: re-inserting every parsed pair must not grow the map.
    let mut reinserted = FormFields::new();
    for _ in 0..2 {
        if let Some(v) = fields.get("ssid") {
            reinserted.insert("ssid", v);
        }
        if let Some(v) = fields.get("psk") {
            reinserted.insert("psk", v);
        }
    }
    assert!(reinserted.len() <= 2);

    let mut handler = ProvisioningHandler::new();
    handler.submit(&fields);

    let creds = handler.store().snapshot();
    assert!(creds.network_name.len() <= 32);
    assert!(creds.secret.len() <= 64);
});

//! Provisioning - the credential store and the portal handler.
//!
//! The store holds the two strings the operator supplies for the target
//! network. Merge semantics on submission: a field present in the form is
//! written (present-but-empty clears it), a field absent from the form is
//! left untouched. The secret is never echoed back in plaintext once set;
//! reads go through the fixed mask.

use log::{info, warn};

use crate::router::FormFields;

pub mod page;
pub use page::render_portal;

/// Form field carrying the target network name.
pub const FIELD_NETWORK_NAME: &str = "ssid";
/// Form field carrying the target network secret.
pub const FIELD_SECRET: &str = "psk";

/// What a set secret renders as, everywhere.
pub const SECRET_MASK: &str = "********";

// ── Credentials ───────────────────────────────────────────────

/// The target network's name and secret. Bounds follow the radio's
/// limits: 32-byte network name, 64-byte WPA2 passphrase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub network_name: heapless::String<32>,
    pub secret: heapless::String<64>,
}

// ── Credential store ──────────────────────────────────────────

/// In-memory store for the provisioned credentials. Created empty at
/// boot; nothing here survives a power cycle.
#[derive(Debug, Default)]
pub struct CredentialStore {
    creds: Credentials,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn network_name(&self) -> &str {
        self.creds.network_name.as_str()
    }

    /// Whether a non-empty secret is currently held.
    pub fn secret_set(&self) -> bool {
        !self.creds.secret.is_empty()
    }

    /// Clone of the current credentials, for the one attach attempt that
    /// consumes them.
    pub fn snapshot(&self) -> Credentials {
        self.creds.clone()
    }
}

// ── Portal view model ─────────────────────────────────────────

/// Everything the portal page needs, already masked. Rendering is the
/// pure function [`page::render_portal`]; no template state is mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalView {
    pub network_name: heapless::String<32>,
    /// Empty when no secret is set, [`SECRET_MASK`] otherwise.
    pub masked_secret: &'static str,
    pub version_label: &'static str,
    /// Inline notice from a rejected submission, if any.
    pub notice: Option<&'static str>,
}

/// Result of one form submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub name_changed: bool,
    pub secret_changed: bool,
    /// Inline rejection notice; the offending field was left unchanged.
    pub notice: Option<&'static str>,
}

// ── Handler ───────────────────────────────────────────────────

/// Owns the credential store and interprets portal requests against it.
pub struct ProvisioningHandler {
    store: CredentialStore,
}

impl ProvisioningHandler {
    pub fn new() -> Self {
        Self {
            store: CredentialStore::new(),
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Build the masked view of the current form state.
    pub fn portal_view(&self, notice: Option<&'static str>) -> PortalView {
        PortalView {
            network_name: self.store.creds.network_name.clone(),
            masked_secret: if self.store.secret_set() {
                SECRET_MASK
            } else {
                ""
            },
            version_label: env!("CARGO_PKG_VERSION"),
            notice,
        }
    }

    /// Apply one form submission to the store.
    ///
    /// Only the recognized fields are considered; unknown fields are
    /// ignored. Each recognized field present in `fields` is validated
    /// and written independently - a rejected value leaves that field
    /// unchanged and surfaces as an inline notice, it does not block the
    /// other field. No mode transition happens here.
    pub fn submit(&mut self, fields: &FormFields) -> SubmitOutcome {
        let mut outcome = SubmitOutcome::default();

        if let Some(name) = fields.get(FIELD_NETWORK_NAME) {
            match validate_network_name(name) {
                Ok(()) => {
                    self.store.creds.network_name.clear();
                    // Capacity checked by the validator.
                    self.store.creds.network_name.push_str(name).ok();
                    outcome.name_changed = true;
                }
                Err(notice) => {
                    warn!("Provisioning: network name rejected - {}", notice);
                    outcome.notice = Some(notice);
                }
            }
        }

        if let Some(secret) = fields.get(FIELD_SECRET) {
            match validate_secret(secret) {
                Ok(()) => {
                    self.store.creds.secret.clear();
                    self.store.creds.secret.push_str(secret).ok();
                    outcome.secret_changed = true;
                }
                Err(notice) => {
                    warn!("Provisioning: secret rejected - {}", notice);
                    outcome.notice = Some(notice);
                }
            }
        }

        if outcome.name_changed || outcome.secret_changed {
            info!(
                "Provisioning: store updated (name: '{}', secret {})",
                self.store.network_name(),
                if self.store.secret_set() { "set" } else { "unset" },
            );
        }
        outcome
    }
}

impl Default for ProvisioningHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ── Validation ────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_network_name(name: &str) -> core::result::Result<(), &'static str> {
    if name.len() > 32 {
        return Err("network name exceeds 32 bytes");
    }
    if !is_printable_ascii(name) {
        return Err("network name must be printable ASCII");
    }
    Ok(())
}

fn validate_secret(secret: &str) -> core::result::Result<(), &'static str> {
    // Length policy (e.g. WPA2's 8-byte minimum) is the target network's
    // to enforce; a too-short secret surfaces later as AuthRejected.
    if secret.len() > 64 {
        return Err("secret exceeds 64 bytes");
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────

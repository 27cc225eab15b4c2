//! Flash staging adapter - the inactive app partition as an update sink.
//!
//! Implements [`UpdateSink`] over the `esp-ota` crate on device builds:
//! `begin` opens the inactive OTA partition, `write` appends, `commit`
//! finalizes the image and marks it bootable, `abort` drops the handle
//! (esp-ota discards the partial image on drop). The staged image takes
//! effect on the next restart; the running firmware is untouched until
//! then.
//!
//! On host targets the sink stages into memory with a capacity bound, so
//! the session layer's full/short-write paths are exercisable in tests.

use log::{info, warn};

use crate::app::ports::{StorageError, UpdateSink};

pub struct FlashSink {
    #[cfg(target_os = "espidf")]
    ota_update: Option<esp_ota::OtaUpdate>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimFlash,
}

#[cfg(not(target_os = "espidf"))]
struct SimFlash {
    capacity: usize,
    staged: Vec<u8>,
    open: bool,
    committed: Option<u64>,
}

impl FlashSink {
    /// `capacity` bounds the simulated partition; the real partition's
    /// size is fixed by the partition table.
    #[cfg(target_os = "espidf")]
    pub fn new(_capacity: usize) -> Self {
        Self { ota_update: None }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(capacity: usize) -> Self {
        Self {
            sim: SimFlash {
                capacity,
                staged: Vec::new(),
                open: false,
                committed: None,
            },
        }
    }

    /// Simulation: the sealed image, if a commit happened.
    #[cfg(not(target_os = "espidf"))]
    pub fn committed_image(&self) -> Option<&[u8]> {
        self.sim.committed.map(|_| self.sim.staged.as_slice())
    }
}

impl UpdateSink for FlashSink {
    #[cfg(target_os = "espidf")]
    fn begin(&mut self) -> Result<(), StorageError> {
        if self.ota_update.is_some() {
            return Err(StorageError::OpenFailed);
        }
        let update = esp_ota::OtaUpdate::begin().map_err(|e| {
            warn!("esp-ota begin failed: {:?}", e);
            StorageError::OpenFailed
        })?;
        self.ota_update = Some(update);
        info!("Flash: inactive partition opened for staging");
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn begin(&mut self) -> Result<(), StorageError> {
        if self.sim.capacity == 0 {
            return Err(StorageError::InsufficientSpace);
        }
        self.sim.open = true;
        self.sim.staged.clear();
        self.sim.committed = None;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn write(&mut self, data: &[u8]) -> Result<usize, StorageError> {
        let Some(update) = self.ota_update.as_mut() else {
            return Err(StorageError::WriteFailed);
        };
        update.write(data).map_err(|e| {
            warn!("esp-ota write failed: {:?}", e);
            StorageError::WriteFailed
        })?;
        Ok(data.len())
    }

    #[cfg(not(target_os = "espidf"))]
    fn write(&mut self, data: &[u8]) -> Result<usize, StorageError> {
        if !self.sim.open {
            return Err(StorageError::WriteFailed);
        }
        // A full partition accepts what fits and reports the short
        // count; the session layer decides what that means.
        let room = self.sim.capacity - self.sim.staged.len();
        let n = data.len().min(room);
        self.sim.staged.extend_from_slice(&data[..n]);
        Ok(n)
    }

    #[cfg(target_os = "espidf")]
    fn commit(&mut self, total: u64) -> Result<(), StorageError> {
        let Some(update) = self.ota_update.take() else {
            return Err(StorageError::FinalizeFailed);
        };
        let mut completed = update.finalize().map_err(|e| {
            warn!("esp-ota finalize failed: {:?}", e);
            StorageError::FinalizeFailed
        })?;
        completed.set_as_boot_partition().map_err(|e| {
            warn!("esp-ota set_as_boot_partition failed: {:?}", e);
            StorageError::FinalizeFailed
        })?;
        info!("Flash: {} byte image staged and marked bootable", total);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn commit(&mut self, total: u64) -> Result<(), StorageError> {
        if !self.sim.open || total != self.sim.staged.len() as u64 {
            return Err(StorageError::FinalizeFailed);
        }
        self.sim.open = false;
        self.sim.committed = Some(total);
        info!("Flash(sim): {} byte image sealed", total);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn abort(&mut self) {
        // esp-ota aborts automatically when OtaUpdate is dropped.
        self.ota_update.take();
        warn!("Flash: staging aborted");
    }

    #[cfg(not(target_os = "espidf"))]
    fn abort(&mut self) {
        if self.sim.open {
            warn!("Flash(sim): staging aborted");
        }
        self.sim.open = false;
        self.sim.staged.clear();
        self.sim.committed = None;
    }
}

// ── Restart and boot validation ───────────────────────────────

/// Soft-reset into whatever partition is marked bootable.
#[cfg(target_os = "espidf")]
pub fn restart() -> ! {
    info!("Restarting");
    esp_ota::restart();
}

#[cfg(not(target_os = "espidf"))]
pub fn restart() -> ! {
    panic!("device restart (simulation - no real hardware reset)");
}

/// Check the image state on startup and mark this firmware as valid.
///
/// Without this, the rollback watchdog reverts to the previous firmware
/// after three consecutive failed boots.
#[cfg(target_os = "espidf")]
pub fn check_rollback() {
    match esp_ota::mark_app_valid() {
        Ok(()) => info!("Boot: firmware marked valid (rollback cancelled)"),
        Err(e) => warn!("Boot: mark_app_valid failed: {:?}", e),
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn check_rollback() {
    log::info!("Boot: rollback check (simulation): skipped");
}

// ── Tests ─────────────────────────────────────────────────────

//! Composite device adapter - bridges the real peripherals to the three
//! device-facing port traits.
//!
//! Owns the WiFi, camera and flash adapters and exposes them through
//! [`NetworkPort`], [`FrameSource`] and [`UpdateSink`] so the dispatch
//! loop can hand the service one mutable borrow. This is the only
//! module the composition root needs to construct for hardware access.

use crate::adapters::camera::CameraAdapter;
use crate::adapters::flash::FlashSink;
use crate::adapters::wifi::WifiAdapter;
use crate::app::ports::{
    AttachError, FrameSource, NetworkError, NetworkPort, StorageError, UpdateSink,
};
use crate::config::SystemConfig;
use crate::stream::Frame;

/// Concrete adapter that combines all peripherals behind port traits.
pub struct DeviceAdapter {
    wifi: WifiAdapter,
    camera: CameraAdapter,
    flash: FlashSink,
}

impl DeviceAdapter {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            wifi: WifiAdapter::new(),
            camera: CameraAdapter::new(config.sim_frame_width, config.sim_frame_height),
            flash: FlashSink::new(config.max_image_size as usize),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn wifi_mut(&mut self) -> &mut WifiAdapter {
        &mut self.wifi
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn camera_mut(&mut self) -> &mut CameraAdapter {
        &mut self.camera
    }
}

// ── NetworkPort ───────────────────────────────────────────────

impl NetworkPort for DeviceAdapter {
    fn start_hub(&mut self, name: &str, secret: &str) -> Result<(), NetworkError> {
        self.wifi.start_hub(name, secret)
    }

    fn stop_hub(&mut self) {
        self.wifi.stop_hub();
    }

    fn attach(&mut self, name: &str, secret: &str, timeout_ms: u32) -> Result<(), AttachError> {
        self.wifi.attach(name, secret, timeout_ms)
    }
}

// ── FrameSource ───────────────────────────────────────────────

impl FrameSource for DeviceAdapter {
    fn acquire(&mut self) -> Option<Frame> {
        self.camera.acquire()
    }

    fn release(&mut self, frame: Frame) {
        self.camera.release(frame);
    }
}

// ── UpdateSink ────────────────────────────────────────────────

impl UpdateSink for DeviceAdapter {
    fn begin(&mut self) -> Result<(), StorageError> {
        self.flash.begin()
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, StorageError> {
        self.flash.write(data)
    }

    fn commit(&mut self, total: u64) -> Result<(), StorageError> {
        self.flash.commit(total)
    }

    fn abort(&mut self) {
        self.flash.abort();
    }
}

//! Application core - pure domain logic, zero I/O.
//!
//! This module contains the business rules for the FieldCam device:
//! mode transition, provisioning, capture streaming and firmware upload.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real
//! peripherals.

pub mod events;
pub mod ports;
pub mod service;

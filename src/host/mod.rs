//! Host integration interface
//!
//! The automator never holds device handles. Every call names the device
//! and the host resolves it at that moment, so a renamed or removed device
//! shows up as `HostError::DeviceNotFound` rather than a stale reference.

mod memory;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HostError;

pub use memory::{DeviceSpec, HostCall, Inventory, MemoryHost};

/// Capability filter for device enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCapability {
    /// Devices producing audio (microphones)
    Audio,
    /// Devices producing video (indicator candidates)
    Video,
}

/// Operations the automator needs from the host application
pub trait Host {
    /// Scene names in display order; empty until the host has loaded them
    fn enumerate_scenes(&self) -> Vec<String>;

    /// Device names with the given capability, for populating the settings UI
    fn enumerate_devices(&self, capability: DeviceCapability) -> Vec<String>;

    /// Name of the active scene
    fn current_scene(&self) -> Result<String, HostError>;

    /// Start delivering mute notifications for `device`
    fn subscribe_mute(&mut self, device: &str) -> Result<(), HostError>;

    /// Stop delivering mute notifications for `device`
    fn unsubscribe_mute(&mut self, device: &str) -> Result<(), HostError>;

    fn mute_state(&self, device: &str) -> Result<bool, HostError>;

    /// Show or hide a device
    fn set_device_enabled(&mut self, device: &str, enabled: bool) -> Result<(), HostError>;

    fn set_push_to_talk(&mut self, device: &str, enabled: bool) -> Result<(), HostError>;

    fn register_scene_change_handler(&mut self);

    fn unregister_scene_change_handler(&mut self);

    /// Request periodic timer ticks
    fn register_timer(&mut self, interval: Duration);

    fn unregister_timer(&mut self);
}

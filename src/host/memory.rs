//! In-memory host
//!
//! Holds a scene list and a device inventory, and journals every device
//! operation that went through. Used by the daemon as its host and by tests
//! as the host double.

use std::cell::Cell;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DeviceCapability, Host};
use crate::error::HostError;
use crate::events::HostEvent;

fn enabled_by_default() -> bool {
    true
}

/// A device known to the in-memory host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSpec {
    pub name: String,
    pub capability: DeviceCapability,
    #[serde(default)]
    pub muted: bool,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub push_to_talk: bool,
}

impl DeviceSpec {
    pub fn audio(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capability: DeviceCapability::Audio,
            muted: false,
            enabled: true,
            push_to_talk: false,
        }
    }

    pub fn video(name: impl Into<String>) -> Self {
        Self {
            capability: DeviceCapability::Video,
            ..Self::audio(name)
        }
    }
}

/// Initial contents of an in-memory host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub scenes: Vec<String>,
    #[serde(default)]
    pub current_scene: Option<String>,
    #[serde(default)]
    pub devices: Vec<DeviceSpec>,
}

impl Inventory {
    /// Load an inventory from JSON, or an empty one if the file is missing
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read inventory from {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse inventory in {}", path.display()))
    }
}

/// Host operations that took effect, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    SubscribeMute(String),
    UnsubscribeMute(String),
    SetDeviceEnabled(String, bool),
    SetPushToTalk(String, bool),
    RegisterSceneHandler,
    UnregisterSceneHandler,
    RegisterTimer(Duration),
    UnregisterTimer,
}

#[derive(Debug, Default)]
pub struct MemoryHost {
    scenes: Vec<String>,
    current_scene: Option<String>,
    devices: Vec<DeviceSpec>,
    /// One entry per live subscription, duplicates included
    mute_subscriptions: Vec<String>,
    scene_handler: bool,
    timer: Option<Duration>,
    journal: Vec<HostCall>,
    scene_enumerations: Cell<usize>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_inventory(inventory: Inventory) -> Self {
        Self {
            scenes: inventory.scenes,
            current_scene: inventory.current_scene,
            devices: inventory.devices,
            ..Self::default()
        }
    }

    pub fn add_device(&mut self, device: DeviceSpec) {
        self.devices.retain(|existing| existing.name != device.name);
        self.devices.push(device);
    }

    /// Rename a device; live subscriptions follow it
    pub fn rename_device(&mut self, from: &str, to: &str) -> Result<(), HostError> {
        let device = self.device_mut(from)?;
        device.name = to.to_string();

        for subscription in self.mute_subscriptions.iter_mut() {
            if subscription == from {
                *subscription = to.to_string();
            }
        }
        Ok(())
    }

    /// Remove a device along with its subscriptions
    pub fn remove_device(&mut self, name: &str) -> bool {
        let before = self.devices.len();
        self.devices.retain(|device| device.name != name);
        self.mute_subscriptions.retain(|subscription| subscription != name);
        self.devices.len() != before
    }

    /// Replace the scene list
    pub fn set_scenes<S: Into<String>>(&mut self, scenes: impl IntoIterator<Item = S>) {
        self.scenes = scenes.into_iter().map(Into::into).collect();
    }

    /// Make `name` the active scene; returns the notification if a scene
    /// change handler is registered
    pub fn switch_scene(&mut self, name: &str) -> Option<HostEvent> {
        self.current_scene = Some(name.to_string());
        debug!(scene = name, "host scene switched");
        self.scene_handler.then_some(HostEvent::SceneChanged)
    }

    /// Mute or unmute a device; returns one notification per live subscription
    pub fn set_mute(&mut self, name: &str, muted: bool) -> Result<Vec<HostEvent>, HostError> {
        self.device_mut(name)?.muted = muted;

        let events = self
            .mute_subscriptions
            .iter()
            .filter(|subscription| subscription.as_str() == name)
            .map(|_| HostEvent::MuteChanged {
                device: name.to_string(),
                muted,
            })
            .collect();
        Ok(events)
    }

    pub fn device(&self, name: &str) -> Option<&DeviceSpec> {
        self.devices.iter().find(|device| device.name == name)
    }

    fn device_mut(&mut self, name: &str) -> Result<&mut DeviceSpec, HostError> {
        self.devices
            .iter_mut()
            .find(|device| device.name == name)
            .ok_or_else(|| HostError::device_not_found(name))
    }

    /// Live mute subscriptions, one entry each
    pub fn subscriptions(&self) -> &[String] {
        &self.mute_subscriptions
    }

    pub fn journal(&self) -> &[HostCall] {
        &self.journal
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Number of push-to-talk writes that reached `device`
    pub fn push_to_talk_writes(&self, device: &str) -> usize {
        self.journal
            .iter()
            .filter(|call| matches!(call, HostCall::SetPushToTalk(name, _) if name == device))
            .count()
    }

    pub fn timer(&self) -> Option<Duration> {
        self.timer
    }

    pub fn scene_handler_registered(&self) -> bool {
        self.scene_handler
    }

    /// How many times the scene list has been enumerated
    pub fn scene_enumerations(&self) -> usize {
        self.scene_enumerations.get()
    }
}

impl Host for MemoryHost {
    fn enumerate_scenes(&self) -> Vec<String> {
        self.scene_enumerations.set(self.scene_enumerations.get() + 1);
        self.scenes.clone()
    }

    fn enumerate_devices(&self, capability: DeviceCapability) -> Vec<String> {
        self.devices
            .iter()
            .filter(|device| device.capability == capability)
            .map(|device| device.name.clone())
            .collect()
    }

    fn current_scene(&self) -> Result<String, HostError> {
        self.current_scene.clone().ok_or(HostError::NoCurrentScene)
    }

    fn subscribe_mute(&mut self, device: &str) -> Result<(), HostError> {
        self.device_mut(device)?;
        self.mute_subscriptions.push(device.to_string());
        self.journal.push(HostCall::SubscribeMute(device.to_string()));
        Ok(())
    }

    fn unsubscribe_mute(&mut self, device: &str) -> Result<(), HostError> {
        self.device_mut(device)?;
        if let Some(index) = self.mute_subscriptions.iter().position(|s| s == device) {
            self.mute_subscriptions.remove(index);
        }
        self.journal.push(HostCall::UnsubscribeMute(device.to_string()));
        Ok(())
    }

    fn mute_state(&self, device: &str) -> Result<bool, HostError> {
        self.device(device)
            .map(|device| device.muted)
            .ok_or_else(|| HostError::device_not_found(device))
    }

    fn set_device_enabled(&mut self, device: &str, enabled: bool) -> Result<(), HostError> {
        self.device_mut(device)?.enabled = enabled;
        self.journal
            .push(HostCall::SetDeviceEnabled(device.to_string(), enabled));
        Ok(())
    }

    fn set_push_to_talk(&mut self, device: &str, enabled: bool) -> Result<(), HostError> {
        self.device_mut(device)?.push_to_talk = enabled;
        self.journal
            .push(HostCall::SetPushToTalk(device.to_string(), enabled));
        Ok(())
    }

    fn register_scene_change_handler(&mut self) {
        self.scene_handler = true;
        self.journal.push(HostCall::RegisterSceneHandler);
    }

    fn unregister_scene_change_handler(&mut self) {
        self.scene_handler = false;
        self.journal.push(HostCall::UnregisterSceneHandler);
    }

    fn register_timer(&mut self, interval: Duration) {
        self.timer = Some(interval);
        self.journal.push(HostCall::RegisterTimer(interval));
    }

    fn unregister_timer(&mut self) {
        self.timer = None;
        self.journal.push(HostCall::UnregisterTimer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> MemoryHost {
        let mut host = MemoryHost::new();
        host.add_device(DeviceSpec::audio("Mic"));
        host.add_device(DeviceSpec::video("Banner"));
        host
    }

    #[test]
    fn test_enumerate_devices_by_capability() {
        let host = host();
        assert_eq!(host.enumerate_devices(DeviceCapability::Audio), vec!["Mic"]);
        assert_eq!(host.enumerate_devices(DeviceCapability::Video), vec!["Banner"]);
    }

    #[test]
    fn test_mute_events_only_for_subscribers() {
        let mut host = host();
        assert!(host.set_mute("Mic", true).unwrap().is_empty());

        host.subscribe_mute("Mic").unwrap();
        let events = host.set_mute("Mic", false).unwrap();
        assert_eq!(
            events,
            vec![HostEvent::MuteChanged {
                device: "Mic".to_string(),
                muted: false
            }]
        );
    }

    #[test]
    fn test_unknown_device() {
        let mut host = host();
        assert_eq!(
            host.subscribe_mute("Ghost"),
            Err(HostError::device_not_found("Ghost"))
        );
        assert!(host.journal().is_empty());
    }

    #[test]
    fn test_rename_moves_subscription() {
        let mut host = host();
        host.subscribe_mute("Mic").unwrap();
        host.rename_device("Mic", "Mic 2").unwrap();

        assert_eq!(host.subscriptions(), &["Mic 2".to_string()]);
        assert!(host.mute_state("Mic").is_err());
        assert_eq!(host.set_mute("Mic 2", true).unwrap().len(), 1);
    }

    #[test]
    fn test_switch_scene_requires_handler() {
        let mut host = host();
        assert_eq!(host.switch_scene("Main"), None);
        host.register_scene_change_handler();
        assert_eq!(host.switch_scene("Main"), Some(HostEvent::SceneChanged));
        assert_eq!(host.current_scene().unwrap(), "Main");
    }

    #[test]
    fn test_inventory_parse() {
        let json = r#"{
            "scenes": ["-- Title Scenes --", "Intro"],
            "current_scene": "Intro",
            "devices": [{"name": "Mic", "capability": "audio", "muted": true}]
        }"#;
        let inventory: Inventory = serde_json::from_str(json).unwrap();
        let host = MemoryHost::from_inventory(inventory);

        assert_eq!(host.enumerate_scenes().len(), 2);
        assert!(host.mute_state("Mic").unwrap());
        assert!(host.device("Mic").unwrap().enabled);
    }
}

//! Settings UI description
//!
//! Describes the fields a host settings dialog should show. Keys match the
//! persisted setting names.

use serde::{Deserialize, Serialize};

use crate::host::{DeviceCapability, Host};

/// Key of the manual reload button
pub const RELOAD_SCENES: &str = "reload-scenes";

/// One field of the settings UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Property {
    /// Pick one of `options`
    List {
        key: String,
        label: String,
        options: Vec<String>,
    },
    Text { key: String, label: String },
    Button { key: String, label: String },
    Bool { key: String, label: String },
}

impl Property {
    pub fn key(&self) -> &str {
        match self {
            Property::List { key, .. }
            | Property::Text { key, .. }
            | Property::Button { key, .. }
            | Property::Bool { key, .. } => key,
        }
    }
}

/// The full settings UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySheet {
    pub properties: Vec<Property>,
}

impl PropertySheet {
    /// Build the sheet, listing audio devices as microphones and video
    /// devices as indicators
    pub fn from_host<H: Host>(host: &H) -> Self {
        let text = |key: &str, label: &str| Property::Text {
            key: key.to_string(),
            label: label.to_string(),
        };

        let properties = vec![
            Property::List {
                key: "main-microphone".to_string(),
                label: "Main microphone".to_string(),
                options: host.enumerate_devices(DeviceCapability::Audio),
            },
            Property::List {
                key: "mute-indicator".to_string(),
                label: "Mute indicator".to_string(),
                options: host.enumerate_devices(DeviceCapability::Video),
            },
            text("header-decorator", "Header decorator"),
            text("header-pattern", "List of characters used in the decorator"),
            text("push-to-talk-key", "Header key to enable Push-to-talk"),
            Property::Button {
                key: RELOAD_SCENES.to_string(),
                label: "Reload scenes".to_string(),
            },
            Property::Bool {
                key: "debug".to_string(),
                label: "Print debug messages".to_string(),
            },
        ];

        Self { properties }
    }

    pub fn get(&self, key: &str) -> Option<&Property> {
        self.properties.iter().find(|property| property.key() == key)
    }
}

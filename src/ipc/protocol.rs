//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::events::AutomatorEvent;
use crate::properties::PropertySheet;
use crate::state::AutomatorStatus;

/// Requests from UI to daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Ping to check connectivity
    Ping,

    /// Request current automator status
    GetStatus,

    /// Request the settings UI description
    GetProperties,

    GetDescription,

    /// Persist and apply new settings
    ApplySettings { settings: Settings },

    /// Rebuild the scene catalog now
    ReloadScenes,

    /// Make a scene active on the in-memory host
    SwitchScene { name: String },

    /// Mute or unmute a device on the in-memory host
    SetMute { device: String, muted: bool },

    /// Subscribe to automator event notifications
    Subscribe,
}

/// Responses from daemon to UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Pong response to ping
    Pong,

    /// Current automator status
    Status(AutomatorStatus),

    /// Settings UI description
    Properties(PropertySheet),

    Description { text: String },

    /// Request carried out
    Done,

    /// Subscription confirmed
    Subscribed,

    /// Error response
    Error { code: String, message: String },
}

impl Response {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Push notification from daemon to UI (for subscribed clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Automator event occurred
    Event { event: AutomatorEvent },

    /// Notifications were dropped because the client fell behind
    Lagged { skipped: u64 },
}

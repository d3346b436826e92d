//! Events module
//!
//! `HostEvent` is what the host delivers into the automator; `AutomatorEvent`
//! is what the automator reports after acting on it.

use serde::{Deserialize, Serialize};

use crate::state::Lifecycle;

/// Notifications delivered by the host, one at a time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// The registered timer fired
    TimerTick,

    /// A subscribed device was muted or unmuted
    MuteChanged { device: String, muted: bool },

    /// The active scene changed
    SceneChanged,
}

/// Events emitted by the automator as it changes device state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AutomatorEvent {
    /// Lifecycle transition
    LifecycleChanged { from: Lifecycle, to: Lifecycle },

    /// The scene catalog was rebuilt
    CatalogRebuilt {
        scenes: usize,
        categories: usize,
        unassigned: usize,
    },

    /// The indicator was shown or hidden
    IndicatorUpdated { device: String, enabled: bool },

    /// Push-to-talk was written to the microphone
    PushToTalkChanged { device: String, enabled: bool },

    /// A mute subscription was added or removed
    MuteSubscriptionChanged { device: String, subscribed: bool },
}

impl std::fmt::Display for AutomatorEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutomatorEvent::LifecycleChanged { from, to } => {
                write!(f, "LIFECYCLE_CHANGED ({} -> {})", from, to)
            }
            AutomatorEvent::CatalogRebuilt { scenes, categories, .. } => {
                write!(f, "CATALOG_REBUILT ({} scenes, {} categories)", scenes, categories)
            }
            AutomatorEvent::IndicatorUpdated { device, enabled } => {
                write!(f, "INDICATOR_UPDATED ({}: {})", device, enabled)
            }
            AutomatorEvent::PushToTalkChanged { device, enabled } => {
                write!(f, "PUSH_TO_TALK_CHANGED ({}: {})", device, enabled)
            }
            AutomatorEvent::MuteSubscriptionChanged { device, subscribed } => {
                write!(f, "MUTE_SUBSCRIPTION_CHANGED ({}: {})", device, subscribed)
            }
        }
    }
}

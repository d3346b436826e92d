//! mute-automator: scene-aware microphone automation for a live-production host
//!
//! - Mirrors the main microphone's mute status onto an indicator source
//! - Enables push-to-talk while the active scene belongs to a configured
//!   category, where categories come from header scenes in the scene list
//! - Rewires devices on configuration change without leaking subscriptions
//!
//! The host application is reached only through the [`host::Host`] trait.

/// Status diagnostic, emitted only when the diagnostics setting is on
macro_rules! diag {
    ($enabled:expr, $($arg:tt)+) => {
        if $enabled {
            ::tracing::info!($($arg)+);
        }
    };
}

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod host;
pub mod ipc;
pub mod lifecycle;
pub mod properties;
pub mod state;
pub mod sync;

#[cfg(test)]
mod test_support;

pub use config::{DaemonConfig, Settings};
pub use error::HostError;
pub use events::{AutomatorEvent, HostEvent};
pub use host::{Host, MemoryHost};
pub use state::{Automator, Lifecycle};

/// Short description shown by the host next to the settings
pub const DESCRIPTION: &str = "Mute Automator: enables push-to-talk when switching into the \
configured scene category, and toggles a target source's visibility to mirror the main \
microphone's mute status.";

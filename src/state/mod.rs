//! State machine module for the automator lifecycle
//!
//! Provides an explicit lifecycle with four states:
//! - Unloaded: nothing registered with the host
//! - Polling: waiting for the host's scene list, synchronizers inert
//! - Active: mute monitoring and push-to-talk gating live
//! - Teardown: restoring devices and removing host hooks

mod machine;
mod poller;
mod reconfigure;

pub use machine::{Automator, AutomatorStatus, Lifecycle};
pub use poller::ReadinessPoller;

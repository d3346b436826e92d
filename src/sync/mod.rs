//! State synchronizers
//!
//! Mirror microphone mute onto the indicator, and gate push-to-talk from the
//! category of the active scene. Each operation resolves its devices by name
//! through the host and degrades to a no-op when a lookup fails.

mod mute;
mod push_to_talk;
mod scene;

pub use mute::MuteSynchronizer;
pub use push_to_talk::PushToTalkController;
pub use scene::{decide, handle_scene_change, GateDecision};

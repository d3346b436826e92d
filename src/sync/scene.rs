//! Scene transition handling

use tracing::{debug, warn};

use super::PushToTalkController;
use crate::catalog::{CategoryKey, SceneCatalog, SceneResolution};
use crate::error::HostError;
use crate::host::Host;

/// What a scene means for the push-to-talk gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Set the gate to this value
    Apply(bool),
    /// Leave the gate as it is
    Keep,
}

/// Decide the gate value for a scene.
///
/// Only scenes under a header change the gate. Header scenes, unassigned
/// scenes and scenes missing from the catalog keep it unchanged.
pub fn decide(catalog: &SceneCatalog, scene_name: &str) -> GateDecision {
    match catalog.resolve(scene_name) {
        SceneResolution::Assigned { scene, category } => {
            debug!(
                scene = %scene,
                category = ?catalog.category(category).map(CategoryKey::as_str),
                "scene resolved"
            );
            GateDecision::Apply(catalog.is_target(category))
        }
        SceneResolution::Header(category) => {
            warn!(category = %category, "switched to header scene");
            GateDecision::Keep
        }
        SceneResolution::Unassigned(scene) => {
            warn!(scene = %scene, "switched to a scene with no header");
            GateDecision::Keep
        }
        SceneResolution::Unknown(scene) => {
            warn!(scene = %scene, "switched to a scene missing from the catalog");
            GateDecision::Keep
        }
    }
}

/// Evaluate the host's current scene and apply the gate.
///
/// Returns the new gate value when the device was written.
pub fn handle_scene_change<H: Host>(
    host: &mut H,
    catalog: &SceneCatalog,
    gate: &mut PushToTalkController,
    microphone: &str,
) -> Option<bool> {
    let scene = match host.current_scene() {
        Ok(scene) => scene,
        Err(HostError::NoCurrentScene) => {
            debug!("no current scene to evaluate");
            return None;
        }
        Err(e) => {
            warn!(error = %e, "could not read current scene");
            return None;
        }
    };

    match decide(catalog, &scene) {
        GateDecision::Apply(enabled) => gate
            .set_gate(host, microphone, enabled)
            .then_some(enabled),
        GateDecision::Keep => None,
    }
}

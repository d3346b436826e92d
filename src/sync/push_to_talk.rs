//! Push-to-talk gate with write suppression

use tracing::warn;

use crate::host::Host;

/// Push-to-talk gate of the monitored microphone.
///
/// `shadow` is the last value successfully written to the device. Writes
/// that would not change it are skipped.
#[derive(Debug, Default)]
pub struct PushToTalkController {
    shadow: bool,
}

impl PushToTalkController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shadow(&self) -> bool {
        self.shadow
    }

    /// Set the gate if it differs from the shadow. Returns whether the device
    /// was written.
    pub fn set_gate<H: Host>(&mut self, host: &mut H, microphone: &str, enabled: bool) -> bool {
        if enabled == self.shadow || microphone.is_empty() {
            return false;
        }

        match host.set_push_to_talk(microphone, enabled) {
            Ok(()) => {
                self.shadow = enabled;
                true
            }
            Err(e) => {
                warn!(device = microphone, enabled, error = %e, "could not set push-to-talk");
                false
            }
        }
    }

    /// Write the gate disabled regardless of the shadow, then reset the
    /// shadow to disabled.
    pub fn force_disable<H: Host>(&mut self, host: &mut H, microphone: &str) -> bool {
        self.shadow = false;
        if microphone.is_empty() {
            return false;
        }

        match host.set_push_to_talk(microphone, false) {
            Ok(()) => true,
            Err(e) => {
                warn!(device = microphone, error = %e, "could not disable push-to-talk");
                false
            }
        }
    }
}

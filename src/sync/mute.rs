//! Mute -> indicator synchronization

use tracing::{debug, warn};

use crate::host::Host;

/// Tracks the single live mute subscription
#[derive(Debug, Default)]
pub struct MuteSynchronizer {
    subscribed: Option<String>,
}

impl MuteSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Device currently subscribed for mute notifications
    pub fn subscribed(&self) -> Option<&str> {
        self.subscribed.as_deref()
    }

    pub fn is_subscribed_to(&self, device: &str) -> bool {
        self.subscribed.as_deref() == Some(device)
    }

    /// Subscribe to mute notifications of `device`.
    ///
    /// Any other live subscription is detached first. An empty name is a
    /// no-op. Returns whether `device` is subscribed afterwards.
    pub fn attach<H: Host>(&mut self, host: &mut H, device: &str) -> bool {
        if device.is_empty() {
            return false;
        }
        if self.is_subscribed_to(device) {
            return true;
        }
        self.detach(host);

        match host.subscribe_mute(device) {
            Ok(()) => {
                debug!(device, "mute monitoring attached");
                self.subscribed = Some(device.to_string());
                true
            }
            Err(e) => {
                warn!(device, error = %e, "could not attach mute monitoring");
                false
            }
        }
    }

    /// Drop the live subscription, if any. Returns the detached device.
    ///
    /// The subscription is forgotten even when the host no longer knows the
    /// device; mute events are only honored for the recorded device.
    ///
    /// Subscriptions are released by name. If the host renamed the device
    /// since it was attached, the host side stays subscribed under the new
    /// name, and attaching that name again leaves two live subscriptions.
    /// Both deliver the same mute value, so the indicator stays correct. A
    /// later detach releases only one of them; the other lasts until the
    /// device is removed.
    pub fn detach<H: Host>(&mut self, host: &mut H) -> Option<String> {
        let device = self.subscribed.take()?;

        match host.unsubscribe_mute(&device) {
            Ok(()) => debug!(device = %device, "mute monitoring detached"),
            Err(e) => warn!(device = %device, error = %e, "could not detach mute monitoring"),
        }
        Some(device)
    }

    /// Mirror a mute notification onto the indicator
    pub fn on_mute_event<H: Host>(&self, host: &mut H, indicator: &str, muted: bool) -> bool {
        set_indicator(host, indicator, muted)
    }

    /// Read the microphone's mute state and push it to the indicator.
    ///
    /// Returns the mirrored state when the indicator was written.
    pub fn refresh_indicator<H: Host>(
        &self,
        host: &mut H,
        microphone: &str,
        indicator: &str,
    ) -> Option<bool> {
        if microphone.is_empty() {
            return None;
        }

        match host.mute_state(microphone) {
            Ok(muted) => set_indicator(host, indicator, muted).then_some(muted),
            Err(e) => {
                warn!(device = microphone, error = %e, "could not read mute state");
                None
            }
        }
    }

    /// Leave the indicator visible, as it was before it was managed
    pub fn restore_indicator<H: Host>(&self, host: &mut H, indicator: &str) -> bool {
        set_indicator(host, indicator, true)
    }
}

fn set_indicator<H: Host>(host: &mut H, indicator: &str, enabled: bool) -> bool {
    if indicator.is_empty() {
        return false;
    }

    match host.set_device_enabled(indicator, enabled) {
        Ok(()) => true,
        Err(e) => {
            warn!(device = indicator, error = %e, "could not update indicator");
            false
        }
    }
}

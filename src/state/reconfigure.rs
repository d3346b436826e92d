//! Reconfiguration of a running automator
//!
//! Only the device references that changed are rewired. Every old wiring is
//! torn down before any new one is made: the old indicator is left visible,
//! the old microphone loses its subscription and its gate, and only then are
//! the new devices attached.

use tracing::{debug, info};

use super::machine::{Automator, Lifecycle};
use crate::config::Settings;
use crate::host::Host;

impl<H: Host> Automator<H> {
    /// Replace the configuration.
    ///
    /// While Active the changed devices are rewired, the catalog is rebuilt
    /// and the current scene is evaluated again. In any other lifecycle the
    /// settings are only recorded and take effect on activation.
    pub fn on_configuration_applied(&mut self, settings: Settings) {
        self.settings = settings;

        match self.lifecycle() {
            Lifecycle::Active => self.reconfigure(),
            other => debug!(lifecycle = %other, "configuration recorded, wiring deferred"),
        }
    }

    fn reconfigure(&mut self) {
        let microphone_changed = self.settings.microphone != self.wiring.microphone;
        let indicator_changed = self.settings.indicator != self.wiring.indicator;

        // Tear down everything that changed before wiring anything new
        if microphone_changed {
            self.unwire_microphone();
        } else if indicator_changed {
            let old = std::mem::take(&mut self.wiring.indicator);
            info!(from = %old, to = %self.settings.indicator, "switching mute indicator");
            self.restore_indicator(&old);
        }
        self.wiring.indicator = self.settings.indicator.clone();

        if microphone_changed {
            self.wiring.microphone = self.settings.microphone.clone();
            self.wire_microphone();
        } else if indicator_changed {
            self.refresh_indicator();
        }

        self.rebuild_catalog();
        self.evaluate_current_scene();
    }

    /// Release the old microphone and the indicator it was driving
    fn unwire_microphone(&mut self) {
        let old = std::mem::take(&mut self.wiring.microphone);
        info!(from = %old, to = %self.settings.microphone, "switching monitored microphone");

        let indicator = std::mem::take(&mut self.wiring.indicator);
        self.restore_indicator(&indicator);
        self.detach_mute();
        self.disable_gate(&old);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::broadcast;

    use crate::config::Settings;
    use crate::events::HostEvent;
    use crate::host::{DeviceSpec, HostCall, MemoryHost};
    use crate::state::{Automator, Lifecycle};

    const SCENES: [&str; 5] = [
        "-------- Title Scenes --------",
        "Intro",
        "Outro",
        "-------- Gameplay --------",
        "Main",
    ];

    fn settings(microphone: &str, indicator: &str) -> Settings {
        Settings {
            microphone: microphone.to_string(),
            indicator: indicator.to_string(),
            ..Settings::default()
        }
    }

    fn active_automator(current_scene: &str) -> Automator<MemoryHost> {
        let mut host = MemoryHost::new();
        host.add_device(DeviceSpec::audio("Mic A"));
        host.add_device(DeviceSpec::audio("Mic B"));
        host.add_device(DeviceSpec::video("Banner A"));
        host.add_device(DeviceSpec::video("Banner B"));
        host.set_scenes(SCENES);
        host.switch_scene(current_scene);

        let (tx, _) = broadcast::channel(64);
        let mut automator = Automator::new(
            host,
            settings("Mic A", "Banner A"),
            Duration::from_millis(500),
            tx,
        );
        automator.load();
        automator.dispatch(HostEvent::TimerTick);
        assert_eq!(automator.lifecycle(), Lifecycle::Active);
        automator
    }

    fn set_mute(automator: &mut Automator<MemoryHost>, device: &str, muted: bool) {
        for event in automator.host_mut().set_mute(device, muted).unwrap() {
            automator.dispatch(event);
        }
    }

    #[test]
    fn test_switch_microphone_detaches_first() {
        let mut automator = active_automator("Intro");
        automator.host_mut().clear_journal();

        automator.on_configuration_applied(settings("Mic B", "Banner A"));

        let journal = automator.host().journal();
        let unsubscribe = journal
            .iter()
            .position(|call| *call == HostCall::UnsubscribeMute("Mic A".to_string()))
            .unwrap();
        let subscribe = journal
            .iter()
            .position(|call| *call == HostCall::SubscribeMute("Mic B".to_string()))
            .unwrap();
        assert!(unsubscribe < subscribe);
        assert_eq!(automator.host().subscriptions(), &["Mic B".to_string()]);
    }

    #[test]
    fn test_old_microphone_no_longer_drives_indicator() {
        let mut automator = active_automator("Main");
        automator.on_configuration_applied(settings("Mic B", "Banner A"));
        assert!(!automator.host().device("Banner A").unwrap().enabled);

        set_mute(&mut automator, "Mic A", true);
        assert!(!automator.host().device("Banner A").unwrap().enabled);

        set_mute(&mut automator, "Mic B", true);
        assert!(automator.host().device("Banner A").unwrap().enabled);
    }

    #[test]
    fn test_switch_microphone_moves_gate() {
        let mut automator = active_automator("Intro");
        assert!(automator.host().device("Mic A").unwrap().push_to_talk);

        automator.on_configuration_applied(settings("Mic B", "Banner A"));

        assert!(!automator.host().device("Mic A").unwrap().push_to_talk);
        assert!(automator.host().device("Mic B").unwrap().push_to_talk);
        assert!(automator.push_to_talk_shadow());
    }

    #[test]
    fn test_switch_indicator_restores_old() {
        let mut automator = active_automator("Main");
        set_mute(&mut automator, "Mic A", false);
        assert!(!automator.host().device("Banner A").unwrap().enabled);

        automator.on_configuration_applied(settings("Mic A", "Banner B"));

        assert!(automator.host().device("Banner A").unwrap().enabled);
        assert!(!automator.host().device("Banner B").unwrap().enabled);

        set_mute(&mut automator, "Mic A", true);
        assert!(automator.host().device("Banner B").unwrap().enabled);
        assert_eq!(automator.host().subscriptions(), &["Mic A".to_string()]);
    }

    #[test]
    fn test_unchanged_devices_are_not_rewired() {
        let mut automator = active_automator("Intro");
        automator.host_mut().clear_journal();

        automator.on_configuration_applied(settings("Mic A", "Banner A"));

        let rewired = automator.host().journal().iter().any(|call| {
            matches!(
                call,
                HostCall::SubscribeMute(_) | HostCall::UnsubscribeMute(_) | HostCall::SetPushToTalk(..)
            )
        });
        assert!(!rewired);
    }

    #[test]
    fn test_header_change_rebuilds_catalog() {
        let mut automator = active_automator("Intro");
        assert!(automator.push_to_talk_shadow());

        // Only "Gameplay" scenes now enable push-to-talk
        let settings = Settings {
            target_category: "gameplay".to_string(),
            ..settings("Mic A", "Banner A")
        };
        automator.on_configuration_applied(settings);
        assert!(!automator.push_to_talk_shadow());

        let decorated = Settings {
            header_decorator: "####".to_string(),
            ..automator.settings().clone()
        };
        automator.on_configuration_applied(decorated);
        assert!(automator.catalog().is_empty());
        assert!(!automator.push_to_talk_shadow());
    }

    #[test]
    fn test_clearing_microphone_tears_down() {
        let mut automator = active_automator("Intro");
        automator.on_configuration_applied(settings("", "Banner A"));

        assert!(automator.host().subscriptions().is_empty());
        assert!(!automator.host().device("Mic A").unwrap().push_to_talk);
        assert_eq!(automator.status().microphone, None);
    }

    #[test]
    fn test_clearing_microphone_restores_indicator() {
        let mut automator = active_automator("Main");
        set_mute(&mut automator, "Mic A", false);
        assert!(!automator.host().device("Banner A").unwrap().enabled);

        automator.on_configuration_applied(settings("", "Banner A"));

        assert!(automator.host().device("Banner A").unwrap().enabled);
    }

    #[test]
    fn test_missing_microphone_restores_indicator() {
        let mut automator = active_automator("Main");
        set_mute(&mut automator, "Mic A", false);

        automator.on_configuration_applied(settings("Ghost", "Banner A"));

        assert!(automator.host().subscriptions().is_empty());
        assert!(automator.host().device("Banner A").unwrap().enabled);

        // The dropped microphone no longer hides it
        set_mute(&mut automator, "Mic A", true);
        set_mute(&mut automator, "Mic A", false);
        assert!(automator.host().device("Banner A").unwrap().enabled);
    }

    #[test]
    fn test_switch_both_devices_restores_old_indicator_only() {
        let mut automator = active_automator("Main");
        set_mute(&mut automator, "Mic A", false);
        automator.host_mut().set_mute("Mic B", false).unwrap();
        automator.host_mut().clear_journal();

        automator.on_configuration_applied(settings("Mic B", "Banner B"));

        let journal = automator.host().journal();
        let old_indicator: Vec<_> = journal
            .iter()
            .enumerate()
            .filter(|(_, call)| {
                matches!(call, HostCall::SetDeviceEnabled(device, _) if device == "Banner A")
            })
            .collect();
        assert_eq!(old_indicator.len(), 1);
        assert_eq!(
            *old_indicator[0].1,
            HostCall::SetDeviceEnabled("Banner A".to_string(), true)
        );

        let subscribe = journal
            .iter()
            .position(|call| *call == HostCall::SubscribeMute("Mic B".to_string()))
            .unwrap();
        assert!(old_indicator[0].0 < subscribe);

        assert!(automator.host().device("Banner A").unwrap().enabled);
        assert!(!automator.host().device("Banner B").unwrap().enabled);
    }

    #[test]
    fn test_renamed_microphone_duplicate_subscription_is_harmless() {
        let mut automator = active_automator("Main");
        automator.host_mut().rename_device("Mic A", "Mic C").unwrap();

        automator.on_configuration_applied(settings("Mic C", "Banner A"));

        // The rename hid the old subscription from release by name
        assert_eq!(
            automator.host().subscriptions(),
            &["Mic C".to_string(), "Mic C".to_string()]
        );

        set_mute(&mut automator, "Mic C", false);
        assert!(!automator.host().device("Banner A").unwrap().enabled);
        set_mute(&mut automator, "Mic C", true);
        assert!(automator.host().device("Banner A").unwrap().enabled);
    }

    #[test]
    fn test_rapid_reconfiguration() {
        let mut automator = active_automator("Intro");

        for round in 0..10 {
            let (microphone, indicator) = if round % 2 == 0 {
                ("Mic B", "Banner B")
            } else {
                ("Mic A", "Banner A")
            };
            automator.on_configuration_applied(settings(microphone, indicator));
            assert_eq!(automator.host().subscriptions(), &[microphone.to_string()]);
        }

        let host = automator.host();
        assert!(host.device("Mic A").unwrap().push_to_talk);
        assert!(!host.device("Mic B").unwrap().push_to_talk);
        assert!(host.device("Banner B").unwrap().enabled);
    }

    #[test]
    fn test_configuration_while_polling_is_deferred() {
        let mut host = MemoryHost::new();
        host.add_device(DeviceSpec::audio("Mic A"));
        host.add_device(DeviceSpec::audio("Mic B"));
        let (tx, _) = broadcast::channel(64);
        let mut automator = Automator::new(host, settings("Mic A", ""), Duration::from_millis(500), tx);
        automator.load();
        automator.host_mut().clear_journal();

        automator.on_configuration_applied(settings("Mic B", ""));
        assert!(automator.host().journal().is_empty());

        automator.host_mut().set_scenes(SCENES);
        automator.dispatch(HostEvent::TimerTick);
        assert_eq!(automator.host().subscriptions(), &["Mic B".to_string()]);
    }
}

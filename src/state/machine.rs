//! Core automator state machine
//!
//! `Automator` is the single context object owning the configuration, the
//! scene catalog, the synchronizers and the host. Every host event is
//! handled to completion before the next one, so no handler observes a
//! half-applied reconfiguration.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::poller::ReadinessPoller;
use crate::catalog::{CatalogRules, SceneCatalog};
use crate::config::Settings;
use crate::events::{AutomatorEvent, HostEvent};
use crate::host::Host;
use crate::properties::PropertySheet;
use crate::sync::{handle_scene_change, MuteSynchronizer, PushToTalkController};

/// Lifecycle of the automator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Nothing registered with the host
    #[default]
    Unloaded,
    /// Waiting for the host's scene list
    Polling,
    /// Full wiring live
    Active,
    /// Restoring devices and removing hooks
    Teardown,
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lifecycle::Unloaded => write!(f, "Unloaded"),
            Lifecycle::Polling => write!(f, "Polling"),
            Lifecycle::Active => write!(f, "Active"),
            Lifecycle::Teardown => write!(f, "Teardown"),
        }
    }
}

/// Status snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatorStatus {
    pub version: String,
    pub lifecycle: Lifecycle,
    /// Microphone currently wired
    pub microphone: Option<String>,
    /// Indicator currently wired
    pub indicator: Option<String>,
    /// Device with a live mute subscription
    pub subscribed: Option<String>,
    /// Last push-to-talk value written
    pub push_to_talk: bool,
    pub scenes: usize,
    pub categories: usize,
    pub unassigned: usize,
    pub poll_attempts: u32,
}

/// Devices wired while Active
#[derive(Debug, Default)]
pub(super) struct Wiring {
    pub(super) microphone: String,
    pub(super) indicator: String,
}

/// Automates the mute indicator and push-to-talk gate against a host
pub struct Automator<H: Host> {
    pub(super) host: H,
    pub(super) settings: Settings,
    lifecycle: Lifecycle,
    lifecycle_entered_at: Instant,
    pub(super) catalog: SceneCatalog,
    poller: ReadinessPoller,
    pub(super) mute: MuteSynchronizer,
    pub(super) gate: PushToTalkController,
    pub(super) wiring: Wiring,
    event_tx: broadcast::Sender<AutomatorEvent>,
}

impl<H: Host> Automator<H> {
    /// Create an unloaded automator
    pub fn new(
        host: H,
        settings: Settings,
        poll_interval: Duration,
        event_tx: broadcast::Sender<AutomatorEvent>,
    ) -> Self {
        let catalog = SceneCatalog::empty(CatalogRules::from(&settings));
        Self {
            host,
            settings,
            lifecycle: Lifecycle::Unloaded,
            lifecycle_entered_at: Instant::now(),
            catalog,
            poller: ReadinessPoller::new(poll_interval),
            mute: MuteSynchronizer::new(),
            gate: PushToTalkController::new(),
            wiring: Wiring::default(),
            event_tx,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn catalog(&self) -> &SceneCatalog {
        &self.catalog
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host, for delivering simulated host changes
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Last push-to-talk value written by the automator
    pub fn push_to_talk_shadow(&self) -> bool {
        self.gate.shadow()
    }

    pub fn description(&self) -> &'static str {
        crate::DESCRIPTION
    }

    /// Settings UI description, populated from the host's devices
    pub fn properties(&self) -> PropertySheet {
        PropertySheet::from_host(&self.host)
    }

    pub fn status(&self) -> AutomatorStatus {
        let wired = |name: &str| (!name.is_empty()).then(|| name.to_string());
        AutomatorStatus {
            version: env!("CARGO_PKG_VERSION").to_string(),
            lifecycle: self.lifecycle,
            microphone: wired(&self.wiring.microphone),
            indicator: wired(&self.wiring.indicator),
            subscribed: self.mute.subscribed().map(str::to_string),
            push_to_talk: self.gate.shadow(),
            scenes: self.catalog.len(),
            categories: self.catalog.categories().len(),
            unassigned: self.catalog.unassigned().len(),
            poll_attempts: self.poller.attempts(),
        }
    }

    /// Register with the host and start waiting for scenes
    pub fn load(&mut self) {
        if self.lifecycle != Lifecycle::Unloaded {
            warn!(lifecycle = %self.lifecycle, "load ignored, already loaded");
            return;
        }

        self.host.register_scene_change_handler();
        self.poller.start(&mut self.host);
        self.transition_to(Lifecycle::Polling);
    }

    /// Restore every managed device and remove all host hooks
    pub fn unload(&mut self) {
        if matches!(self.lifecycle, Lifecycle::Unloaded | Lifecycle::Teardown) {
            return;
        }
        self.transition_to(Lifecycle::Teardown);

        let indicator = std::mem::take(&mut self.wiring.indicator);
        self.restore_indicator(&indicator);
        self.detach_mute();
        let microphone = std::mem::take(&mut self.wiring.microphone);
        self.disable_gate(&microphone);

        self.poller.cancel(&mut self.host);
        self.host.unregister_scene_change_handler();
        self.catalog = SceneCatalog::empty(CatalogRules::from(&self.settings));

        self.transition_to(Lifecycle::Unloaded);
    }

    /// Handle one host notification
    pub fn dispatch(&mut self, event: HostEvent) {
        match event {
            HostEvent::TimerTick => self.on_timer(),
            HostEvent::MuteChanged { device, muted } => self.on_mute_changed(&device, muted),
            HostEvent::SceneChanged => self.on_scene_changed(),
        }
    }

    /// Rebuild the catalog from the host's current scene list and re-apply
    /// the gate
    pub fn reload_scenes(&mut self) {
        match self.lifecycle {
            Lifecycle::Active => {
                self.rebuild_catalog();
                self.evaluate_current_scene();
            }
            Lifecycle::Polling => self.on_timer(),
            other => debug!(lifecycle = %other, "reload ignored"),
        }
    }

    fn on_timer(&mut self) {
        if self.lifecycle != Lifecycle::Polling {
            debug!(lifecycle = %self.lifecycle, "timer tick ignored");
            return;
        }

        let rules = CatalogRules::from(&self.settings);
        if let Some(catalog) = self.poller.poll(&mut self.host, &rules) {
            self.activate(catalog);
        }
    }

    /// Startup wiring after the first successful poll
    fn activate(&mut self, catalog: SceneCatalog) {
        self.set_catalog(catalog);
        self.transition_to(Lifecycle::Active);

        self.wiring.microphone = self.settings.microphone.clone();
        self.wiring.indicator = self.settings.indicator.clone();
        self.wire_microphone();
        self.evaluate_current_scene();
    }

    fn on_mute_changed(&mut self, device: &str, muted: bool) {
        if self.lifecycle != Lifecycle::Active {
            debug!(device, lifecycle = %self.lifecycle, "mute event ignored");
            return;
        }
        if !self.mute.is_subscribed_to(device) {
            debug!(device, "mute event from unmonitored device ignored");
            return;
        }

        diag!(self.settings.diagnostics, device, muted, "main microphone mute changed");
        if self.mute.on_mute_event(&mut self.host, &self.wiring.indicator, muted) {
            self.emit(AutomatorEvent::IndicatorUpdated {
                device: self.wiring.indicator.clone(),
                enabled: muted,
            });
        }
    }

    fn on_scene_changed(&mut self) {
        if self.lifecycle != Lifecycle::Active {
            debug!(lifecycle = %self.lifecycle, "scene change ignored");
            return;
        }
        self.evaluate_current_scene();
    }

    pub(super) fn rebuild_catalog(&mut self) {
        let names = self.host.enumerate_scenes();
        let catalog = SceneCatalog::build(&names, &CatalogRules::from(&self.settings));
        self.set_catalog(catalog);
    }

    fn set_catalog(&mut self, catalog: SceneCatalog) {
        diag!(
            self.settings.diagnostics,
            scenes = catalog.len(),
            categories = catalog.categories().len(),
            "scene catalog built"
        );
        self.emit(AutomatorEvent::CatalogRebuilt {
            scenes: catalog.len(),
            categories: catalog.categories().len(),
            unassigned: catalog.unassigned().len(),
        });
        self.catalog = catalog;
    }

    pub(super) fn evaluate_current_scene(&mut self) {
        let written = handle_scene_change(
            &mut self.host,
            &self.catalog,
            &mut self.gate,
            &self.wiring.microphone,
        );

        if let Some(enabled) = written {
            diag!(
                self.settings.diagnostics,
                device = %self.wiring.microphone,
                enabled,
                "push-to-talk updated"
            );
            self.emit(AutomatorEvent::PushToTalkChanged {
                device: self.wiring.microphone.clone(),
                enabled,
            });
        }
    }

    /// Subscribe to the wired microphone and catch the indicator up
    pub(super) fn wire_microphone(&mut self) {
        if self.mute.attach(&mut self.host, &self.wiring.microphone) {
            self.emit(AutomatorEvent::MuteSubscriptionChanged {
                device: self.wiring.microphone.clone(),
                subscribed: true,
            });
        }
        self.refresh_indicator();
    }

    pub(super) fn refresh_indicator(&mut self) {
        let mirrored = self.mute.refresh_indicator(
            &mut self.host,
            &self.wiring.microphone,
            &self.wiring.indicator,
        );

        if let Some(muted) = mirrored {
            diag!(self.settings.diagnostics, muted, "indicator refreshed");
            self.emit(AutomatorEvent::IndicatorUpdated {
                device: self.wiring.indicator.clone(),
                enabled: muted,
            });
        }
    }

    pub(super) fn detach_mute(&mut self) {
        if let Some(device) = self.mute.detach(&mut self.host) {
            self.emit(AutomatorEvent::MuteSubscriptionChanged {
                device,
                subscribed: false,
            });
        }
    }

    pub(super) fn disable_gate(&mut self, microphone: &str) {
        if self.gate.force_disable(&mut self.host, microphone) {
            self.emit(AutomatorEvent::PushToTalkChanged {
                device: microphone.to_string(),
                enabled: false,
            });
        }
    }

    pub(super) fn restore_indicator(&mut self, indicator: &str) {
        if self.mute.restore_indicator(&mut self.host, indicator) {
            self.emit(AutomatorEvent::IndicatorUpdated {
                device: indicator.to_string(),
                enabled: true,
            });
        }
    }

    fn transition_to(&mut self, new_lifecycle: Lifecycle) {
        let old_lifecycle = self.lifecycle;
        let duration_ms = self.lifecycle_entered_at.elapsed().as_millis() as u64;

        info!(
            from = %old_lifecycle,
            to = %new_lifecycle,
            duration_ms = duration_ms,
            "lifecycle transition"
        );

        self.lifecycle = new_lifecycle;
        self.lifecycle_entered_at = Instant::now();
        self.emit(AutomatorEvent::LifecycleChanged {
            from: old_lifecycle,
            to: new_lifecycle,
        });
    }

    pub(super) fn emit(&self, event: AutomatorEvent) {
        debug!(%event, "emitting event");
        let _ = self.event_tx.send(event);
    }
}

//! Readiness polling for the host's scene list

use std::time::Duration;

use tracing::{debug, info};

use crate::catalog::{CatalogRules, SceneCatalog};
use crate::host::Host;

/// Retries catalog construction on a host timer until the scene list is
/// populated, then cancels its own timer.
#[derive(Debug)]
pub struct ReadinessPoller {
    interval: Duration,
    armed: bool,
    attempts: u32,
}

impl ReadinessPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            armed: false,
            attempts: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the timer is registered with the host
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Polls made since the poller was last started
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Register the poll timer
    pub fn start<H: Host>(&mut self, host: &mut H) {
        if self.armed {
            return;
        }
        host.register_timer(self.interval);
        self.armed = true;
        self.attempts = 0;
        debug!(interval_ms = self.interval.as_millis() as u64, "readiness polling started");
    }

    /// Unregister the poll timer, if registered
    pub fn cancel<H: Host>(&mut self, host: &mut H) {
        if self.armed {
            host.unregister_timer();
            self.armed = false;
        }
    }

    /// Try once to build the catalog.
    ///
    /// Returns the catalog on the first poll that sees a non-empty scene
    /// list and disarms; every later call returns `None` until restarted.
    pub fn poll<H: Host>(&mut self, host: &mut H, rules: &CatalogRules) -> Option<SceneCatalog> {
        if !self.armed {
            return None;
        }
        self.attempts += 1;

        let names = host.enumerate_scenes();
        let catalog = SceneCatalog::build(&names, rules);
        if !catalog.source_had_data() {
            debug!(attempt = self.attempts, "scene list empty, retrying");
            return None;
        }

        self.cancel(host);
        info!(attempts = self.attempts, scenes = names.len(), "scene list available");
        Some(catalog)
    }
}

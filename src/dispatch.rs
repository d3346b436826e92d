//! Single-owner dispatch task
//!
//! The dispatcher owns the automator. IPC requests, simulated host changes
//! and poll timer ticks all reach it through one queue and run to
//! completion one at a time.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::events::HostEvent;
use crate::host::MemoryHost;
use crate::ipc::{Request, Response};
use crate::state::Automator;

/// A request waiting for the dispatcher, with its reply channel
#[derive(Debug)]
pub struct Command {
    pub request: Request,
    pub reply: oneshot::Sender<Response>,
}

pub struct Dispatcher {
    automator: Automator<MemoryHost>,
    settings_path: Option<PathBuf>,
}

impl Dispatcher {
    pub fn new(automator: Automator<MemoryHost>) -> Self {
        Self {
            automator,
            settings_path: None,
        }
    }

    /// Persist applied settings to this file
    pub fn with_settings_store(mut self, path: PathBuf) -> Self {
        self.settings_path = Some(path);
        self
    }

    pub fn automator(&self) -> &Automator<MemoryHost> {
        &self.automator
    }

    /// Load the automator and process commands until the queue closes
    pub async fn run(&mut self, mut command_rx: mpsc::Receiver<Command>) {
        self.automator.load();
        info!("dispatcher started");

        let mut ticker: Option<Interval> = None;

        loop {
            self.sync_timer(&mut ticker);

            tokio::select! {
                command = command_rx.recv() => {
                    let Some(Command { request, reply }) = command else {
                        break;
                    };
                    let response = self.handle(request);
                    if reply.send(response).is_err() {
                        debug!("requester went away before the reply");
                    }
                }
                _ = next_tick(&mut ticker) => {
                    self.automator.dispatch(HostEvent::TimerTick);
                }
            }
        }

        info!("dispatcher stopped");
    }

    /// Unload the automator, restoring every device it manages
    pub fn shutdown(&mut self) {
        self.automator.unload();
    }

    /// Follow the host's timer registration
    fn sync_timer(&self, ticker: &mut Option<Interval>) {
        match (self.automator.host().timer(), ticker.as_ref()) {
            (Some(period), Some(current)) if current.period() == period => {}
            (Some(period), _) => *ticker = Some(interval(period)),
            (None, Some(_)) => *ticker = None,
            (None, None) => {}
        }
    }

    /// Carry out one request
    pub fn handle(&mut self, request: Request) -> Response {
        debug!(?request, "handling request");

        match request {
            Request::Ping => Response::Pong,

            Request::GetStatus => Response::Status(self.automator.status()),

            Request::GetProperties => Response::Properties(self.automator.properties()),

            Request::GetDescription => Response::Description {
                text: self.automator.description().to_string(),
            },

            Request::ApplySettings { settings } => {
                self.automator.on_configuration_applied(settings);

                match &self.settings_path {
                    Some(path) => match self.automator.settings().save(path) {
                        Ok(()) => Response::Done,
                        Err(e) => {
                            warn!(error = %e, "failed to persist settings");
                            Response::error("persist_failed", format!("{e:#}"))
                        }
                    },
                    None => Response::Done,
                }
            }

            Request::ReloadScenes => {
                self.automator.reload_scenes();
                Response::Done
            }

            Request::SwitchScene { name } => {
                if let Some(event) = self.automator.host_mut().switch_scene(&name) {
                    self.automator.dispatch(event);
                }
                Response::Done
            }

            Request::SetMute { device, muted } => {
                match self.automator.host_mut().set_mute(&device, muted) {
                    Ok(events) => {
                        for event in events {
                            self.automator.dispatch(event);
                        }
                        Response::Done
                    }
                    Err(e) => Response::error("device_not_found", e.to_string()),
                }
            }

            Request::Subscribe => {
                Response::error("unsupported", "subscriptions are handled by the server")
            }
        }
    }
}

fn interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::host::{DeviceSpec, Inventory};
    use crate::state::Lifecycle;
    use tokio::sync::broadcast;

    fn dispatcher(scenes: &[&str]) -> Dispatcher {
        let inventory = Inventory {
            scenes: scenes.iter().map(|s| s.to_string()).collect(),
            current_scene: Some("Main".to_string()),
            devices: vec![DeviceSpec::audio("Mic"), DeviceSpec::video("Banner")],
        };
        let settings = Settings {
            microphone: "Mic".to_string(),
            indicator: "Banner".to_string(),
            ..Settings::default()
        };
        let (tx, _) = broadcast::channel(64);
        let automator = Automator::new(
            MemoryHost::from_inventory(inventory),
            settings,
            Duration::from_millis(10),
            tx,
        );
        Dispatcher::new(automator)
    }

    const SCENES: [&str; 4] = [
        "-------- Title Scenes --------",
        "Intro",
        "-------- Gameplay --------",
        "Main",
    ];

    async fn request(tx: &mpsc::Sender<Command>, request: Request) -> Response {
        let (reply, rx) = oneshot::channel();
        tx.send(Command { request, reply }).await.unwrap();
        rx.await.unwrap()
    }

    #[test]
    fn test_handle_ping_and_description() {
        let mut dispatcher = dispatcher(&SCENES);
        assert!(matches!(dispatcher.handle(Request::Ping), Response::Pong));
        match dispatcher.handle(Request::GetDescription) {
            Response::Description { text } => assert!(text.contains("push-to-talk")),
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_set_mute_unknown_device() {
        let mut dispatcher = dispatcher(&SCENES);
        match dispatcher.handle(Request::SetMute {
            device: "Ghost".to_string(),
            muted: true,
        }) {
            Response::Error { code, .. } => assert_eq!(code, "device_not_found"),
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_apply_settings_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut dispatcher = dispatcher(&SCENES).with_settings_store(path.clone());

        let settings = Settings {
            target_category: "gameplay".to_string(),
            ..Settings::default()
        };
        assert!(matches!(
            dispatcher.handle(Request::ApplySettings {
                settings: settings.clone()
            }),
            Response::Done
        ));
        assert_eq!(Settings::load_or_default(&path).unwrap(), settings);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_polls_until_active() {
        let mut dispatcher = dispatcher(&SCENES);
        let (tx, rx) = mpsc::channel(8);

        let client = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let status = request(&tx, Request::GetStatus).await;

            request(&tx, Request::SwitchScene { name: "Intro".to_string() }).await;
            let after = request(&tx, Request::GetStatus).await;
            drop(tx);
            (status, after)
        };

        let ((status, after), ()) = tokio::join!(client, dispatcher.run(rx));

        match (status, after) {
            (Response::Status(status), Response::Status(after)) => {
                assert_eq!(status.lifecycle, Lifecycle::Active);
                assert!(!status.push_to_talk);
                assert!(after.push_to_talk);
            }
            other => panic!("unexpected responses: {:?}", other),
        }

        dispatcher.shutdown();
        assert_eq!(dispatcher.automator().lifecycle(), Lifecycle::Unloaded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_keeps_polling_without_scenes() {
        let mut dispatcher = dispatcher(&[]);
        let (tx, rx) = mpsc::channel(8);

        let client = async {
            tokio::time::sleep(Duration::from_millis(55)).await;
            let status = request(&tx, Request::GetStatus).await;
            drop(tx);
            status
        };

        let (status, ()) = tokio::join!(client, dispatcher.run(rx));
        match status {
            Response::Status(status) => {
                assert_eq!(status.lifecycle, Lifecycle::Polling);
                assert!(status.poll_attempts >= 4);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }
}

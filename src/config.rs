//! Configuration loading and management
//!
//! `Settings` is the user-facing configuration, persisted as named scalar
//! values. `DaemonConfig` holds the runtime paths of the daemon.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default interval between readiness polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// User configuration, replaced as a whole on every apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Microphone whose mute status is mirrored and whose push-to-talk is gated
    #[serde(rename = "main-microphone")]
    pub microphone: String,

    /// Source shown while the microphone is muted
    #[serde(rename = "mute-indicator")]
    pub indicator: String,

    /// Prefix marking header scenes
    #[serde(rename = "header-decorator")]
    pub header_decorator: String,

    /// Characters stripped from both ends of a header name
    #[serde(rename = "header-pattern")]
    pub header_trim_chars: String,

    /// Category key whose scenes enable push-to-talk
    #[serde(rename = "push-to-talk-key")]
    pub target_category: String,

    /// Emit status diagnostics
    #[serde(rename = "debug")]
    pub diagnostics: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            microphone: String::new(),
            indicator: String::new(),
            header_decorator: "--------".to_string(),
            header_trim_chars: "- ".to_string(),
            target_category: "title-scenes".to_string(),
            diagnostics: true,
        }
    }
}

impl Settings {
    /// Load settings from a JSON document, falling back to defaults if the
    /// file does not exist yet
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        let settings = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse settings in {}", path.display()))?;
        Ok(settings)
    }

    /// Persist settings as a JSON document
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("failed to create settings directory")?;
        }

        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)
            .with_context(|| format!("failed to write settings to {}", path.display()))?;
        Ok(())
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Settings store
    pub settings_path: PathBuf,

    /// Scene and device inventory of the in-memory host
    pub inventory_path: PathBuf,

    /// Interval between readiness polls
    pub poll_interval: Duration,
}

impl DaemonConfig {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        let data_dir = match std::env::var_os("MUTE_AUTOMATOR_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = std::env::var("HOME").context("HOME is not set")?;
                PathBuf::from(&home)
                    .join(".local")
                    .join("share")
                    .join("mute-automator")
            }
        };

        let socket_path = std::env::var_os("MUTE_AUTOMATOR_SOCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("daemon.sock"));

        let poll_interval = match std::env::var("MUTE_AUTOMATOR_POLL_MS") {
            Ok(raw) => {
                let ms: u64 = raw
                    .parse()
                    .with_context(|| format!("invalid MUTE_AUTOMATOR_POLL_MS: {raw}"))?;
                Duration::from_millis(ms.max(1))
            }
            Err(_) => DEFAULT_POLL_INTERVAL,
        };

        Ok(Self {
            socket_path,
            settings_path: data_dir.join("settings.json"),
            inventory_path: data_dir.join("inventory.json"),
            data_dir,
            poll_interval,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

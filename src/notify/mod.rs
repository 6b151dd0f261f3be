//! Notification delivery: desktop, console, and file channels.
//!
//! The engine talks to a [`NotificationSink`]; the [`NotificationManager`]
//! dispatches each notification to every configured channel. Delivery is
//! fire-and-forget and best-effort — a channel that fails degrades to an
//! alternative visible channel (stderr) rather than failing silently, and
//! no delivery problem ever propagates into the scan path.

#![allow(missing_docs)]

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use serde::{Deserialize, Serialize};

// ──────────────────── notification value ────────────────────

/// A single user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Short headline, e.g. "Size Threshold Exceeded".
    pub title: String,
    /// Multi-line body with per-folder details.
    pub body: String,
    /// Stable identifier for the notification kind (OS-level coalescing).
    pub identifier: String,
}

impl Notification {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            identifier: identifier.into(),
        }
    }
}

/// Anything that can deliver a notification to the user.
pub trait NotificationSink: Send + Sync {
    /// Deliver best-effort; implementations never return errors.
    fn send(&self, notification: &Notification);
}

// ──────────────────── configuration ────────────────────

/// Top-level notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationConfig {
    /// Master switch for all notifications.
    pub enabled: bool,
    /// Which channel names to activate.
    pub channels: Vec<String>,
    pub desktop: DesktopConfig,
    pub file: FileConfig,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channels: vec!["desktop".to_string(), "console".to_string()],
            desktop: DesktopConfig::default(),
            file: FileConfig::default(),
        }
    }
}

/// Desktop notification settings (notify-send on Linux, osascript on macOS).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DesktopConfig {
    pub enabled: bool,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// File notification settings (append-only JSONL).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    pub path: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("/tmp"), PathBuf::from);
        Self {
            path: home
                .join(".local")
                .join("share")
                .join("fsn")
                .join("notifications.jsonl"),
        }
    }
}

// ──────────────────── channels ────────────────────

/// Desktop channel: spawns the platform notifier; falls back to stderr when
/// the notifier cannot be spawned so the user still gets feedback.
pub struct DesktopChannel;

impl NotificationSink for DesktopChannel {
    fn send(&self, notification: &Notification) {
        if !spawn_platform_notifier(notification) {
            eprintln!(
                "[FSN-NOTIFY] {}: {}",
                notification.title,
                notification.body.replace('\n', " | ")
            );
        }
    }
}

#[cfg(target_os = "linux")]
fn spawn_platform_notifier(notification: &Notification) -> bool {
    Command::new("notify-send")
        .arg("--app-name=fsn")
        .arg(&notification.title)
        .arg(&notification.body)
        .spawn()
        .is_ok()
}

#[cfg(target_os = "macos")]
fn spawn_platform_notifier(notification: &Notification) -> bool {
    let script = format!(
        "display notification \"{}\" with title \"{}\"",
        notification.body.replace('"', "\\\""),
        notification.title.replace('"', "\\\"")
    );
    Command::new("osascript").arg("-e").arg(&script).spawn().is_ok()
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn spawn_platform_notifier(_notification: &Notification) -> bool {
    false
}

/// Console channel: writes to stderr. Always available.
pub struct ConsoleChannel;

impl NotificationSink for ConsoleChannel {
    fn send(&self, notification: &Notification) {
        eprintln!("[FSN-NOTIFY] {}", notification.title);
        for line in notification.body.lines() {
            eprintln!("[FSN-NOTIFY]   {line}");
        }
    }
}

/// File channel: appends one JSON record per notification.
pub struct FileChannel {
    path: PathBuf,
}

impl FileChannel {
    #[must_use]
    pub fn new(config: &FileConfig) -> Self {
        Self {
            path: config.path.clone(),
        }
    }
}

/// A single notification record written to the JSONL file.
#[derive(Debug, Serialize)]
struct NotificationRecord<'a> {
    ts: String,
    #[serde(flatten)]
    notification: &'a Notification,
}

impl NotificationSink for FileChannel {
    fn send(&self, notification: &Notification) {
        let record = NotificationRecord {
            ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            notification,
        };

        let Ok(json) = serde_json::to_string(&record) else {
            return;
        };

        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }

        match OpenOptions::new().create(true).append(true).open(&self.path) {
            Ok(mut file) => {
                let _ = writeln!(file, "{json}");
            }
            Err(e) => {
                // Degrade to stderr rather than dropping the notification.
                eprintln!(
                    "[FSN-NOTIFY] file channel unavailable ({e}): {}",
                    notification.title
                );
            }
        }
    }
}

// ──────────────────── manager ────────────────────

/// Dispatches notifications to all enabled channels.
pub struct NotificationManager {
    channels: Vec<Box<dyn NotificationSink>>,
    enabled: bool,
}

impl NotificationManager {
    /// Build a manager from configuration. When notifications are enabled
    /// but no configured channel is usable, the console channel is added so
    /// alerts are never dropped without feedback.
    #[must_use]
    pub fn from_config(config: &NotificationConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }

        let mut channels: Vec<Box<dyn NotificationSink>> = Vec::new();

        for channel_name in &config.channels {
            match channel_name.as_str() {
                "desktop" if config.desktop.enabled => {
                    channels.push(Box::new(DesktopChannel));
                }
                "console" => {
                    channels.push(Box::new(ConsoleChannel));
                }
                "file" => {
                    channels.push(Box::new(FileChannel::new(&config.file)));
                }
                _ => {
                    // Unknown or disabled channel name — skip.
                }
            }
        }

        if channels.is_empty() {
            channels.push(Box::new(ConsoleChannel));
        }

        Self {
            channels,
            enabled: true,
        }
    }

    /// Create a disabled (no-op) manager.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            channels: Vec::new(),
            enabled: false,
        }
    }

    /// Number of active channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Whether the manager is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl NotificationSink for NotificationManager {
    fn send(&self, notification: &Notification) {
        if !self.enabled {
            return;
        }
        for channel in &self.channels {
            channel.send(notification);
        }
    }
}

// ──────────────────── test sink ────────────────────

/// Recording sink for tests: collects every notification it receives.
#[derive(Default)]
pub struct RecordingSink {
    sent: parking_lot::Mutex<Vec<Notification>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn send(&self, notification: &Notification) {
        self.sent.lock().push(notification.clone());
    }
}

// ──────────────────── tests ────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_desktop_and_console() {
        let config = NotificationConfig::default();
        assert!(config.enabled);
        assert!(config.channels.contains(&"desktop".to_string()));
        assert!(config.channels.contains(&"console".to_string()));
    }

    #[test]
    fn disabled_manager_has_no_channels() {
        let manager = NotificationManager::disabled();
        assert!(!manager.is_enabled());
        assert_eq!(manager.channel_count(), 0);
    }

    #[test]
    fn manager_from_disabled_config() {
        let config = NotificationConfig {
            enabled: false,
            ..Default::default()
        };
        let manager = NotificationManager::from_config(&config);
        assert!(!manager.is_enabled());
    }

    #[test]
    fn unknown_channels_fall_back_to_console() {
        let config = NotificationConfig {
            channels: vec!["carrier-pigeon".to_string()],
            ..Default::default()
        };
        let manager = NotificationManager::from_config(&config);
        // Never silently without feedback: console gets added.
        assert_eq!(manager.channel_count(), 1);
    }

    #[test]
    fn disabled_desktop_is_skipped() {
        let config = NotificationConfig {
            channels: vec!["desktop".to_string(), "console".to_string()],
            desktop: DesktopConfig { enabled: false },
            ..Default::default()
        };
        let manager = NotificationManager::from_config(&config);
        assert_eq!(manager.channel_count(), 1);
    }

    #[test]
    fn file_channel_appends_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notifications.jsonl");
        let channel = FileChannel {
            path: path.clone(),
        };

        let notification = Notification::new("Folder Size", "cache is 1.5 GB", "size-cache");
        channel.send(&notification);
        channel.send(&notification);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in &lines {
            let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(parsed["title"], "Folder Size");
            assert_eq!(parsed["identifier"], "size-cache");
            assert!(parsed.get("ts").is_some());
        }
    }

    #[test]
    fn file_channel_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("notifications.jsonl");
        let channel = FileChannel { path: path.clone() };

        channel.send(&Notification::new("t", "b", "id"));
        assert!(path.exists());
    }

    #[test]
    fn recording_sink_collects_in_order() {
        let sink = RecordingSink::new();
        sink.send(&Notification::new("first", "", "1"));
        sink.send(&Notification::new("second", "", "2"));

        let sent = sink.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].title, "first");
        assert_eq!(sent[1].title, "second");
    }

    #[test]
    fn manager_dispatches_to_file_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notifications.jsonl");
        let config = NotificationConfig {
            enabled: true,
            channels: vec!["file".to_string()],
            file: FileConfig { path: path.clone() },
            ..Default::default()
        };

        let manager = NotificationManager::from_config(&config);
        manager.send(&Notification::new("Alert", "body", "alert-1"));

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn disabled_manager_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notifications.jsonl");
        let config = NotificationConfig {
            enabled: false,
            channels: vec!["file".to_string()],
            file: FileConfig { path: path.clone() },
            ..Default::default()
        };

        let manager = NotificationManager::from_config(&config);
        manager.send(&Notification::new("Alert", "body", "alert-1"));
        assert!(!path.exists());
    }

    #[test]
    fn notification_config_roundtrip_toml() {
        let config = NotificationConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: NotificationConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(config, parsed);
    }
}

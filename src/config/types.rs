//! Configuration types for crab-party
//!
//! This module contains configuration structures and related types
//! used throughout the application.

use log::LevelFilter;
use std::time::Duration;

use super::constants::*;

/// Configuration for a watch-party session
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the room server, e.g. `http://localhost:3310`
    pub server_url: String,
    /// Room identifier
    pub room_id: String,
    /// Display name announced on join
    pub username: Option<String>,
    /// Avatar announced on join
    pub avatar: String,
    /// Whether requests may be routed through the server's proxy
    pub proxy_enabled: bool,
    /// Language code of attached subtitle tracks
    pub subtitle_lang: String,
    /// Label of attached subtitle tracks
    pub subtitle_label: String,
    /// Log level
    pub log_level: LevelFilter,
    /// Number of reconnection attempts before giving up
    pub max_reconnect_attempts: u32,
    /// Delay between reconnection attempts
    pub reconnect_delay_ms: u64,
    /// Heartbeat interval
    pub heartbeat_interval_ms: u64,
    /// Age after which pending pings are dropped
    pub ping_expiry_ms: u64,
    /// Drift threshold for peer sync events
    pub drift_threshold_secs: f64,
    /// Interval of state polling while waiting for interaction
    pub interaction_poll_interval_ms: u64,
    /// In-place retries for fatal network errors
    pub max_network_retries: u32,
    /// Timeout for progressive sources to become playable
    pub progressive_ready_timeout_ms: u64,
    /// Timeout for adaptive manifests
    pub manifest_timeout_ms: u64,
    /// Timeout for the content-type probe
    pub probe_timeout_ms: u64,
    /// Timeout for a single play attempt
    pub play_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3310".to_string(),
            room_id: String::new(),
            username: None,
            avatar: DEFAULT_AVATAR.to_string(),
            proxy_enabled: true,
            subtitle_lang: DEFAULT_SUBTITLE_LANG.to_string(),
            subtitle_label: DEFAULT_SUBTITLE_LABEL.to_string(),
            log_level: LevelFilter::Info,
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            reconnect_delay_ms: RECONNECT_DELAY_MS,
            heartbeat_interval_ms: HEARTBEAT_INTERVAL_MS,
            ping_expiry_ms: PING_EXPIRY_MS,
            drift_threshold_secs: DRIFT_THRESHOLD_SECS,
            interaction_poll_interval_ms: INTERACTION_POLL_INTERVAL_MS,
            max_network_retries: MAX_NETWORK_RETRIES,
            progressive_ready_timeout_ms: PROGRESSIVE_READY_TIMEOUT_MS,
            manifest_timeout_ms: MANIFEST_TIMEOUT_MS,
            probe_timeout_ms: PROBE_TIMEOUT_MS,
            play_timeout_ms: PLAY_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the room server base URL
    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the room identifier
    pub fn with_room_id(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = room_id.into();
        self
    }

    /// Sets the display name
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    /// Sets the avatar
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = avatar.into();
        self
    }

    /// Enables or disables proxying through the room server
    pub fn with_proxy_enabled(mut self, enabled: bool) -> Self {
        self.proxy_enabled = enabled;
        self
    }

    /// Sets the subtitle language code and label
    pub fn with_subtitle_language(mut self, lang: impl Into<String>, label: impl Into<String>) -> Self {
        self.subtitle_lang = lang.into();
        self.subtitle_label = label.into();
        self
    }

    /// Sets the log level
    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    /// Sets the reconnection budget
    pub fn with_reconnect(mut self, max_attempts: u32, delay_ms: u64) -> Self {
        self.max_reconnect_attempts = max_attempts;
        self.reconnect_delay_ms = delay_ms;
        self
    }

    /// Sets the heartbeat interval
    pub fn with_heartbeat_interval(mut self, interval_ms: u64) -> Self {
        self.heartbeat_interval_ms = interval_ms;
        self
    }

    /// WebSocket endpoint of the configured room
    pub fn room_endpoint(&self) -> String {
        let ws_base = if let Some(rest) = self.server_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.server_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.server_url.clone()
        };
        format!("{ws_base}{}", ROOM_WS_PATH.replace("{room}", &self.room_id))
    }

    /// Display name to join with, derived from the room id when not configured
    pub fn effective_username(&self) -> String {
        match &self.username {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => {
                let tag: String = self.room_id.chars().take(4).collect();
                format!("{GUEST_NAME_PREFIX}-{tag}")
            }
        }
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn ping_expiry(&self) -> Duration {
        Duration::from_millis(self.ping_expiry_ms)
    }

    pub fn interaction_poll_interval(&self) -> Duration {
        Duration::from_millis(self.interaction_poll_interval_ms)
    }

    pub fn progressive_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.progressive_ready_timeout_ms)
    }

    pub fn manifest_timeout(&self) -> Duration {
        Duration::from_millis(self.manifest_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn play_timeout(&self) -> Duration {
        Duration::from_millis(self.play_timeout_ms)
    }
}

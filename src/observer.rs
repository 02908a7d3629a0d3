//! Collaborator-facing notifications
//!
//! The session never renders anything itself. Everything a user interface would
//! show (connection indicator, toasts, drift log, interaction prompt, roster)
//! is handed to a [`SessionObserver`].

use crate::{
    engine::PlaybackState,
    protocol::{ChatMessage, Participant},
    transport::ConnectionState,
};
use log::{debug, error, info, warn};
use std::time::Duration;

/// Result of a report a collaborator is allowed to fail
pub type ReportResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Severity of a user-visible notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Receives everything the session wants a user to know about.
///
/// All methods have empty default bodies so implementors only pick what they display.
pub trait SessionObserver: Send + Sync {
    /// The transport changed its connection state
    fn connection_status(&self, _status: ConnectionState) {}

    /// The connection dropped and reconnection attempt `attempt` of `max` is pending
    fn connection_lost(&self, _attempt: u32, _max: u32) {}

    /// The connection is up again, hide any "connection lost" indicator
    fn connection_restored(&self) {}

    /// Reconnection gave up, the session is over
    fn connection_failed(&self) {}

    /// Round-trip time of the last heartbeat, `None` when no ping matched
    fn rtt_updated(&self, _rtt: Option<Duration>) -> ReportResult {
        Ok(())
    }

    /// A short user-visible notification
    fn toast(&self, _level: ToastLevel, _message: &str) {}

    /// Local playback was moved to catch up with the room
    fn drift_adjusted(&self, _drift_secs: f64) {}

    /// Title and duration of the loaded source became available
    fn metadata_available(&self, _title: Option<&str>, _duration: Option<f64>) {}

    /// Show (`true`) or hide (`false`) the "click to join playback" prompt
    fn interaction_prompt(&self, _visible: bool) {}

    /// Who changed the room's playback and how
    fn sync_info(&self, _triggered_by: &str, _action: &str) {}

    /// The engine moved to another playback state
    fn playback_state_changed(&self, _state: PlaybackState) {}

    /// The room roster changed
    fn roster_changed(&self, _users: &[Participant]) {}

    /// A chat line arrived
    fn chat_received(&self, _message: &ChatMessage) {}

    /// The room's chat history arrived with the snapshot
    fn chat_history(&self, _messages: &[ChatMessage]) {}
}

/// Observer that writes everything to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl SessionObserver for LogObserver {
    fn connection_status(&self, status: ConnectionState) {
        info!("Connection: {status}");
    }

    fn connection_lost(&self, attempt: u32, max: u32) {
        warn!("Connection lost, reconnecting ({attempt}/{max})...");
    }

    fn connection_failed(&self) {
        error!("Connection could not be re-established");
    }

    fn rtt_updated(&self, rtt: Option<Duration>) -> ReportResult {
        match rtt {
            Some(rtt) => debug!("Ping: {} ms", rtt.as_millis()),
            None => debug!("Ping: -- ms"),
        }
        Ok(())
    }

    fn toast(&self, level: ToastLevel, message: &str) {
        match level {
            ToastLevel::Error => error!("{message}"),
            ToastLevel::Warning => warn!("{message}"),
            ToastLevel::Info | ToastLevel::Success => info!("{message}"),
        }
    }

    fn drift_adjusted(&self, drift_secs: f64) {
        info!("Sync adjustment: {drift_secs:.2}s");
    }

    fn metadata_available(&self, title: Option<&str>, duration: Option<f64>) {
        let duration = duration
            .map(crate::utils::format_duration)
            .unwrap_or_else(|| "--:--".to_string());
        info!("Now playing: {} [{duration}]", title.unwrap_or("Video"));
    }

    fn interaction_prompt(&self, visible: bool) {
        if visible {
            info!("Playback is blocked until you interact, press ENTER to join");
        }
    }

    fn sync_info(&self, triggered_by: &str, action: &str) {
        info!("{triggered_by} {action}");
    }

    fn playback_state_changed(&self, state: PlaybackState) {
        debug!("Playback state: {state}");
    }

    fn roster_changed(&self, users: &[Participant]) {
        let names: Vec<&str> = users.iter().map(|user| user.username.as_str()).collect();
        info!("{} in room: {}", users.len(), names.join(", "));
    }

    fn chat_received(&self, message: &ChatMessage) {
        info!("{} {}: {}", message.avatar, message.username, message.message);
    }

    fn chat_history(&self, messages: &[ChatMessage]) {
        debug!("Loaded {} chat messages", messages.len());
    }
}

//! Inbound room messages
//!
//! Every server message is a JSON object discriminated by its `type` field.
//! The transport hands over the raw object per type; [`Inbound::decode`] turns
//! it into the typed form the session works with.

use super::source::{ActiveSource, StreamHeaders, non_empty};
use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// A room participant as listed by the server
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Participant {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// A chat line, either live or from the room history
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ChatMessage {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<Value>,
}

/// Authoritative position and play state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSnapshot {
    pub current_time: f64,
    pub is_playing: bool,
}

/// `room_state`: full snapshot sent on join and on `get_state`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomState {
    #[serde(default)]
    pub users: Vec<Participant>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub video_format: Option<String>,
    #[serde(default)]
    pub video_title: Option<String>,
    #[serde(default)]
    pub video_duration: Option<f64>,
    #[serde(default)]
    pub subtitle_url: Option<String>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub referer: Option<String>,
    #[serde(default)]
    pub current_time: f64,
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub chat_messages: Option<Vec<ChatMessage>>,
}

impl RoomState {
    /// The source described by this snapshot, if the room has one
    pub fn source(&self) -> Option<ActiveSource> {
        let url = non_empty(self.video_url.as_deref())?;
        Some(ActiveSource {
            url,
            format: non_empty(self.video_format.as_deref()),
            headers: StreamHeaders::normalize(
                self.user_agent.as_deref(),
                self.referer.as_deref(),
                self.headers.as_ref(),
            ),
            subtitle_url: non_empty(self.subtitle_url.as_deref()),
            title: non_empty(self.video_title.as_deref()),
            duration: self.video_duration.filter(|d| *d > 0.0),
        })
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            current_time: self.current_time,
            is_playing: self.is_playing,
        }
    }
}

/// `sync`: a peer's play/pause with its position
#[derive(Debug, Clone, Deserialize)]
pub struct SyncMessage {
    #[serde(default)]
    pub current_time: f64,
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub triggered_by: Option<String>,
}

/// `seek`: a peer's deliberate seek
#[derive(Debug, Clone, Deserialize)]
pub struct SeekMessage {
    #[serde(default)]
    pub current_time: f64,
    #[serde(default)]
    pub is_playing: Option<bool>,
    #[serde(default)]
    pub triggered_by: Option<String>,
}

/// `sync_correction`: a heartbeat-derived drift directive
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SyncCorrection {
    /// Nudge the playback rate without moving the position
    Rate {
        #[serde(default)]
        rate: Option<f64>,
        #[serde(default)]
        drift: f64,
    },
    /// Pause, jump to the target and resume
    Buffer { target_time: f64 },
}

/// `video_changed`: the room switched to another source
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoChanged {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub referer: Option<String>,
    #[serde(default)]
    pub subtitle_url: Option<String>,
    #[serde(default)]
    pub changed_by: Option<String>,
}

impl VideoChanged {
    pub fn source(&self) -> Option<ActiveSource> {
        let url = non_empty(Some(&self.url))?;
        Some(ActiveSource {
            url,
            format: non_empty(self.format.as_deref()),
            headers: StreamHeaders::normalize(
                self.user_agent.as_deref(),
                self.referer.as_deref(),
                self.headers.as_ref(),
            ),
            subtitle_url: non_empty(self.subtitle_url.as_deref()),
            title: non_empty(self.title.as_deref()),
            duration: self.duration.filter(|d| *d > 0.0),
        })
    }
}

/// `user_joined` / `user_left`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RosterChange {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub users: Vec<Participant>,
}

/// `error`: a server-side rejection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerError {
    #[serde(default)]
    pub message: String,
}

/// Every inbound message the client understands
#[derive(Debug, Clone)]
pub enum Inbound {
    RoomState(RoomState),
    Sync(SyncMessage),
    SyncCorrection(SyncCorrection),
    Seek(SeekMessage),
    VideoChanged(VideoChanged),
    UserJoined(RosterChange),
    UserLeft(RosterChange),
    Chat(ChatMessage),
    Error(ServerError),
}

impl Inbound {
    /// Message types handled by [`Inbound::decode`]
    pub const TYPES: &'static [&'static str] = &[
        "room_state",
        "sync",
        "sync_correction",
        "seek",
        "video_changed",
        "user_joined",
        "user_left",
        "chat",
        "error",
    ];

    /// Decodes the raw object of a message of the given type.
    ///
    /// Returns `Ok(None)` for types this client does not handle.
    pub fn decode(message_type: &str, value: Value) -> Result<Option<Self>> {
        fn parse<T: serde::de::DeserializeOwned>(message_type: &str, value: Value) -> Result<T> {
            serde_json::from_value(value).map_err(|source| Error::MessageDecodeFailed {
                message_type: message_type.to_string(),
                source,
            })
        }

        let inbound = match message_type {
            "room_state" => Inbound::RoomState(parse(message_type, value)?),
            "sync" => Inbound::Sync(parse(message_type, value)?),
            "sync_correction" => Inbound::SyncCorrection(parse(message_type, value)?),
            "seek" => Inbound::Seek(parse(message_type, value)?),
            "video_changed" => Inbound::VideoChanged(parse(message_type, value)?),
            "user_joined" => Inbound::UserJoined(parse(message_type, value)?),
            "user_left" => Inbound::UserLeft(parse(message_type, value)?),
            "chat" => Inbound::Chat(parse(message_type, value)?),
            "error" => Inbound::Error(parse(message_type, value)?),
            _ => return Ok(None),
        };
        Ok(Some(inbound))
    }

    /// URL of the source this message asks to load, if any
    pub fn source_url(&self) -> Option<&str> {
        let url = match self {
            Inbound::RoomState(state) => state.video_url.as_deref().map(str::trim),
            Inbound::VideoChanged(changed) => Some(changed.url.trim()),
            _ => None,
        };
        url.filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_room_state_with_nested_headers() {
        let value = json!({
            "type": "room_state",
            "users": [{"username": "alice", "avatar": "🦀", "user_id": "u1"}],
            "video_url": "https://cdn.example.com/a.m3u8",
            "video_format": "hls",
            "video_title": "Trailer",
            "headers": {"user-agent": "Agent/1.0"},
            "referer": "https://example.com/",
            "current_time": 42.0,
            "is_playing": true
        });

        let Some(Inbound::RoomState(state)) = Inbound::decode("room_state", value).unwrap() else {
            panic!("expected room_state");
        };
        let source = state.source().unwrap();
        assert_eq!(source.url, "https://cdn.example.com/a.m3u8");
        assert_eq!(source.headers.user_agent.as_deref(), Some("Agent/1.0"));
        assert_eq!(source.headers.referer.as_deref(), Some("https://example.com/"));
        assert_eq!(
            state.snapshot(),
            PlaybackSnapshot {
                current_time: 42.0,
                is_playing: true
            }
        );
        assert_eq!(state.users.len(), 1);
    }

    #[test]
    fn test_room_state_without_source() {
        let value = json!({"type": "room_state", "video_url": "", "users": []});
        let Some(Inbound::RoomState(state)) = Inbound::decode("room_state", value).unwrap() else {
            panic!("expected room_state");
        };
        assert!(state.source().is_none());
    }

    #[test]
    fn test_decode_sync_correction_actions() {
        let rate = json!({"type": "sync_correction", "action": "rate", "rate": 1.05, "drift": 0.8});
        let buffer = json!({"type": "sync_correction", "action": "buffer", "target_time": 12.5});

        assert!(matches!(
            Inbound::decode("sync_correction", rate).unwrap(),
            Some(Inbound::SyncCorrection(SyncCorrection::Rate { rate: Some(r), .. })) if r == 1.05
        ));
        assert!(matches!(
            Inbound::decode("sync_correction", buffer).unwrap(),
            Some(Inbound::SyncCorrection(SyncCorrection::Buffer { target_time })) if target_time == 12.5
        ));
    }

    #[test]
    fn test_unknown_type_is_not_an_error() {
        assert!(Inbound::decode("typing", json!({})).unwrap().is_none());
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        let value = json!({"type": "sync_correction", "action": "teleport"});
        assert!(matches!(
            Inbound::decode("sync_correction", value),
            Err(Error::MessageDecodeFailed { .. })
        ));
    }

    #[test]
    fn test_source_url_of_video_changed() {
        let changed = Inbound::VideoChanged(VideoChanged {
            url: " https://x/b.mp4 ".to_string(),
            ..Default::default()
        });
        assert_eq!(changed.source_url(), Some("https://x/b.mp4"));
        assert_eq!(
            Inbound::Error(ServerError::default()).source_url(),
            None
        );
    }
}

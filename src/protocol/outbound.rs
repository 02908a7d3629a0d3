//! Outbound room messages

use crate::error::{Error, Result};
use serde::Serialize;

/// Every message this client sends, except `ping` which the transport builds itself
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    /// Announce ourselves to the room
    Join { username: String, avatar: String },
    /// Local user started playback
    Play { time: f64 },
    /// Local user paused playback
    Pause { time: f64 },
    /// Local user seeked
    Seek { time: f64 },
    /// Local playback stalled
    BufferStart,
    /// Local playback recovered from a stall
    BufferEnd,
    /// Ask for a fresh `room_state`
    GetState,
    /// Ask the room to switch source
    VideoChange {
        url: String,
        title: String,
        user_agent: String,
        referer: String,
        subtitle_url: String,
    },
}

impl Outbound {
    /// Wire name of the message type
    pub fn message_type(&self) -> &'static str {
        match self {
            Outbound::Join { .. } => "join",
            Outbound::Play { .. } => "play",
            Outbound::Pause { .. } => "pause",
            Outbound::Seek { .. } => "seek",
            Outbound::BufferStart => "buffer_start",
            Outbound::BufferEnd => "buffer_end",
            Outbound::GetState => "get_state",
            Outbound::VideoChange { .. } => "video_change",
        }
    }

    /// Serializes the message as `{type, ...payload}`
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|source| Error::MessageEncodeFailed {
            message_type: self.message_type().to_string(),
            source,
        })
    }
}

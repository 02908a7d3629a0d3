//! Wire protocol of the watch-party room
//!
//! This module provides:
//! - Typed inbound messages and their decoding
//! - Outbound messages and their encoding
//! - Source descriptors with upstream header normalization

pub mod inbound;
pub mod outbound;
pub mod source;

pub use inbound::{
    ChatMessage, Inbound, Participant, PlaybackSnapshot, RoomState, RosterChange, SeekMessage,
    ServerError, SyncCorrection, SyncMessage, VideoChanged,
};
pub use outbound::Outbound;
pub use source::{ActiveSource, StreamHeaders};

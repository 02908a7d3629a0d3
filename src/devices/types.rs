//! Device-related types for crab-party
//!
//! This module contains type definitions for DLNA renderers: how one is
//! selected and what its AVTransport service reports.

use crate::utils::parse_dlna_time;
use std::collections::HashMap;

/// An specification of a DLNA render device.
#[derive(Debug, Clone)]
pub enum RenderSpec {
    /// Render specified by a location URL
    Location(String),
    /// Render specified by a query string
    Query(u64, String),
    /// The first render found
    First(u64),
}

/// Playback position reported by GetPositionInfo
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionInfo {
    /// URI of current track
    pub track_uri: String,
    /// Relative position in seconds, when the renderer reports one
    pub rel_time: Option<f64>,
    /// Duration of the current track in seconds, when known
    pub track_duration: Option<f64>,
}

impl PositionInfo {
    /// Parses PositionInfo from an action response
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, String> {
        let rel_time = map
            .get("RelTime")
            .ok_or_else(|| "Missing RelTime".to_string())?;
        Ok(PositionInfo {
            track_uri: map.get("TrackURI").cloned().unwrap_or_default(),
            rel_time: parse_dlna_time(rel_time),
            track_duration: map
                .get("TrackDuration")
                .and_then(|duration| parse_dlna_time(duration))
                .filter(|duration| *duration > 0.0),
        })
    }
}

/// Transport state of a renderer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransportState {
    Playing,
    Paused,
    #[default]
    Stopped,
    Transitioning,
    NoMediaPresent,
    Other(String),
}

impl From<&str> for TransportState {
    fn from(state: &str) -> Self {
        match state {
            "PLAYING" => TransportState::Playing,
            "PAUSED_PLAYBACK" => TransportState::Paused,
            "STOPPED" => TransportState::Stopped,
            "TRANSITIONING" => TransportState::Transitioning,
            "NO_MEDIA_PRESENT" => TransportState::NoMediaPresent,
            other => TransportState::Other(other.to_string()),
        }
    }
}

/// Transport information
///
/// Contains information returned by the GetTransportInfo operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportInfo {
    pub transport_state: TransportState,
    /// Detailed transport status information
    pub transport_status: String,
}

impl TransportInfo {
    /// Parses TransportInfo from an action response
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, String> {
        let state = map
            .get("CurrentTransportState")
            .ok_or_else(|| "Missing CurrentTransportState".to_string())?;
        Ok(TransportInfo {
            transport_state: TransportState::from(state.as_str()),
            transport_status: map
                .get("CurrentTransportStatus")
                .cloned()
                .unwrap_or_default(),
        })
    }
}

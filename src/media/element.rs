//! The media surface port
//!
//! Whatever actually renders the stream (an in-process clock, a DLNA renderer)
//! implements [`MediaElement`]. Surfaces report what happened to them through a
//! [`MediaEventSink`], which stamps every event with the suppression flag as it
//! was at emission time.

use crate::engine::SuppressionFlag;
use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc;

/// Why a play attempt did not start playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayError {
    /// The platform refuses unprompted playback
    NotAllowed,
    /// A newer load or pause interrupted the attempt
    Aborted,
    /// Playback did not start in time
    Timeout,
    Other(String),
}

impl fmt::Display for PlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayError::NotAllowed => write!(f, "playback requires user interaction"),
            PlayError::Aborted => write!(f, "play request was interrupted"),
            PlayError::Timeout => write!(f, "play timeout"),
            PlayError::Other(reason) => write!(f, "{reason}"),
        }
    }
}

/// How much of the source the surface has buffered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

/// A subtitle track attached to the surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTrack {
    pub src: String,
    pub lang: String,
    pub label: String,
    pub default: bool,
}

/// Native signals of a media surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    Play,
    Pause,
    Seeked,
    /// Playback stalled waiting for data
    Waiting,
    /// Playback (re)started after a play or a stall
    Playing,
}

/// A media event together with the context it was emitted in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservedMediaEvent {
    pub event: MediaEvent,
    /// Emitted during an engine-driven mutation
    pub suppressed: bool,
    pub current_time: f64,
    /// The surface had reached the end of the media
    pub ended: bool,
}

/// Where surfaces publish their events
#[derive(Debug, Clone)]
pub struct MediaEventSink {
    tx: mpsc::UnboundedSender<ObservedMediaEvent>,
    suppression: SuppressionFlag,
}

impl MediaEventSink {
    /// Creates a sink and the receiving end the session listens on
    pub fn channel(
        suppression: SuppressionFlag,
    ) -> (Self, mpsc::UnboundedReceiver<ObservedMediaEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, suppression }, rx)
    }

    pub fn emit(&self, event: MediaEvent, current_time: f64, ended: bool) {
        // The receiver is gone only while the session shuts down
        let _ = self.tx.send(ObservedMediaEvent {
            event,
            suppressed: self.suppression.is_suppressed(),
            current_time,
            ended,
        });
    }
}

/// A surface that can render a stream
#[async_trait]
pub trait MediaElement: Send {
    /// Current position in seconds
    async fn current_time(&mut self) -> f64;

    /// Starts a seek; completion is signalled by [`MediaElement::seeked`]
    async fn set_current_time(&mut self, time: f64);

    /// Resolves once the last seek completed
    async fn seeked(&mut self);

    async fn paused(&mut self) -> bool;

    async fn ended(&mut self) -> bool;

    fn playback_rate(&self) -> f64;

    async fn set_playback_rate(&mut self, rate: f64);

    /// Attempts to start playback
    async fn play(&mut self) -> Result<(), PlayError>;

    async fn pause(&mut self);

    async fn ready_state(&mut self) -> ReadyState;

    /// Duration of the loaded source, when known
    async fn duration(&mut self) -> Option<f64>;

    /// Points the surface at a new source
    async fn set_source(&mut self, url: &str);

    /// Resolves once the source is playable, or with the reason it never will be
    async fn can_play(&mut self) -> Result<(), String>;

    fn add_text_track(&mut self, track: TextTrack);

    fn clear_text_tracks(&mut self);

    /// Display title of the source about to be loaded
    fn set_title(&mut self, _title: Option<&str>) {}

    /// The user performed a gesture that lifts autoplay restrictions
    fn grant_user_activation(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_stamps_suppression_at_emission() {
        let flag = SuppressionFlag::new();
        let (sink, mut rx) = MediaEventSink::channel(flag.clone());

        {
            let _guard = flag.acquire();
            sink.emit(MediaEvent::Seeked, 12.0, false);
        }
        sink.emit(MediaEvent::Pause, 12.5, true);

        let first = rx.try_recv().unwrap();
        assert!(first.suppressed);
        assert_eq!(first.current_time, 12.0);

        let second = rx.try_recv().unwrap();
        assert!(!second.suppressed);
        assert!(second.ended);
    }

    #[test]
    fn test_ready_state_ordering() {
        assert!(ReadyState::HaveEnoughData >= ReadyState::HaveCurrentData);
        assert!(ReadyState::HaveMetadata < ReadyState::HaveCurrentData);
    }
}

//! In-process media surface driven by a clock
//!
//! Nothing is decoded; the player only keeps a position that advances while
//! playing. It backs the headless `join` mode and lets the whole session run
//! without a renderer. Its autoplay policy, load outcomes and seek behavior can
//! be scripted.

use super::element::{
    MediaElement, MediaEvent, MediaEventSink, PlayError, ReadyState, TextTrack,
};
use async_trait::async_trait;
use log::debug;
use std::collections::VecDeque;
use tokio::time::Instant;

/// Seek targets and sources kept for inspection
const HISTORY_LIMIT: usize = 64;

/// What happens when the player is pointed at a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadBehavior {
    /// Becomes playable right away
    Ready,
    /// Hard load error
    Fail(String),
    /// Never signals readiness; `partial` leaves some data buffered
    Stall { partial: bool },
}

/// Clock-driven media surface
#[derive(Debug)]
pub struct VirtualPlayer {
    sink: MediaEventSink,
    position: f64,
    anchored_at: Instant,
    rate: f64,
    playing: bool,
    duration: Option<f64>,
    source: Option<String>,
    ready_state: ReadyState,
    load_outcome: LoadBehavior,
    text_tracks: Vec<TextTrack>,
    autoplay_blocked: bool,
    activated: bool,
    load_script: VecDeque<LoadBehavior>,
    stall_seeks: bool,
    hang_play: bool,
    seeks: Vec<f64>,
    sources: Vec<String>,
}

impl VirtualPlayer {
    pub fn new(sink: MediaEventSink) -> Self {
        Self {
            sink,
            position: 0.0,
            anchored_at: Instant::now(),
            rate: 1.0,
            playing: false,
            duration: None,
            source: None,
            ready_state: ReadyState::HaveNothing,
            load_outcome: LoadBehavior::Ready,
            text_tracks: Vec::new(),
            autoplay_blocked: false,
            activated: false,
            load_script: VecDeque::new(),
            stall_seeks: false,
            hang_play: false,
            seeks: Vec::new(),
            sources: Vec::new(),
        }
    }

    /// Refuse playback until the user interacted once
    pub fn with_autoplay_blocked(mut self, blocked: bool) -> Self {
        self.autoplay_blocked = blocked;
        self
    }

    /// Reports `duration` for every loaded source
    pub fn with_duration(mut self, duration: Option<f64>) -> Self {
        self.duration = duration;
        self
    }

    /// Queues the outcome of the next source assignment; unscripted loads succeed
    pub fn script_load(&mut self, behavior: LoadBehavior) {
        self.load_script.push_back(behavior);
    }

    /// When set, seeks move the position but never signal completion
    pub fn set_stall_seeks(&mut self, stall: bool) {
        self.stall_seeks = stall;
    }

    /// When set, play attempts never settle
    pub fn set_hang_play(&mut self, hang: bool) {
        self.hang_play = hang;
    }

    /// Simulates running out of buffered data
    pub fn stall(&mut self) {
        let position = self.position_now();
        self.sink.emit(MediaEvent::Waiting, position, false);
    }

    /// Simulates recovering from a stall
    pub fn resume(&mut self) {
        if self.playing {
            let position = self.position_now();
            self.sink.emit(MediaEvent::Playing, position, false);
        }
    }

    /// The latest seek targets, oldest first
    pub fn seeks(&self) -> &[f64] {
        &self.seeks
    }

    /// The latest assigned sources, oldest first
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn text_tracks(&self) -> &[TextTrack] {
        &self.text_tracks
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    fn position_now(&self) -> f64 {
        let mut position = self.position;
        if self.playing {
            position += self.anchored_at.elapsed().as_secs_f64() * self.rate;
        }
        match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    fn reanchor(&mut self) {
        self.position = self.position_now();
        self.anchored_at = Instant::now();
    }

    fn is_ended(&self) -> bool {
        self.duration
            .is_some_and(|duration| self.position_now() >= duration)
    }
}

#[async_trait]
impl MediaElement for VirtualPlayer {
    async fn current_time(&mut self) -> f64 {
        self.position_now()
    }

    async fn set_current_time(&mut self, time: f64) {
        self.position = time.max(0.0);
        self.anchored_at = Instant::now();
        remember(&mut self.seeks, self.position);
        if !self.stall_seeks {
            let ended = self.is_ended();
            self.sink.emit(MediaEvent::Seeked, self.position, ended);
        }
    }

    async fn seeked(&mut self) {
        if self.stall_seeks {
            std::future::pending::<()>().await;
        }
    }

    async fn paused(&mut self) -> bool {
        !self.playing
    }

    async fn ended(&mut self) -> bool {
        self.is_ended()
    }

    fn playback_rate(&self) -> f64 {
        self.rate
    }

    async fn set_playback_rate(&mut self, rate: f64) {
        self.reanchor();
        self.rate = rate;
    }

    async fn play(&mut self) -> Result<(), PlayError> {
        if self.hang_play {
            std::future::pending::<()>().await;
        }
        if self.source.is_none() {
            return Err(PlayError::Other("no source loaded".to_string()));
        }
        if self.autoplay_blocked && !self.activated {
            return Err(PlayError::NotAllowed);
        }
        if !self.playing {
            self.anchored_at = Instant::now();
            self.playing = true;
            self.sink.emit(MediaEvent::Play, self.position, false);
            self.sink.emit(MediaEvent::Playing, self.position, false);
        }
        Ok(())
    }

    async fn pause(&mut self) {
        if self.playing {
            self.reanchor();
            self.playing = false;
            let ended = self.is_ended();
            self.sink.emit(MediaEvent::Pause, self.position, ended);
        }
    }

    async fn ready_state(&mut self) -> ReadyState {
        self.ready_state
    }

    async fn duration(&mut self) -> Option<f64> {
        self.duration
    }

    async fn set_source(&mut self, url: &str) {
        debug!("Virtual player source: {url}");
        self.source = Some(url.to_string());
        remember(&mut self.sources, url.to_string());
        self.position = 0.0;
        self.anchored_at = Instant::now();
        self.playing = false;

        self.load_outcome = self.load_script.pop_front().unwrap_or(LoadBehavior::Ready);
        self.ready_state = match self.load_outcome {
            LoadBehavior::Ready => ReadyState::HaveEnoughData,
            LoadBehavior::Stall { partial: true } => ReadyState::HaveCurrentData,
            LoadBehavior::Fail(_) | LoadBehavior::Stall { partial: false } => {
                ReadyState::HaveNothing
            }
        };
    }

    async fn can_play(&mut self) -> Result<(), String> {
        match &self.load_outcome {
            LoadBehavior::Ready => Ok(()),
            LoadBehavior::Fail(reason) => Err(reason.clone()),
            LoadBehavior::Stall { .. } => std::future::pending().await,
        }
    }

    fn add_text_track(&mut self, track: TextTrack) {
        self.text_tracks.push(track);
    }

    fn clear_text_tracks(&mut self) {
        self.text_tracks.clear();
    }

    fn grant_user_activation(&mut self) {
        self.activated = true;
    }
}

fn remember<T>(history: &mut Vec<T>, entry: T) {
    if history.len() >= HISTORY_LIMIT {
        history.remove(0);
    }
    history.push(entry);
}

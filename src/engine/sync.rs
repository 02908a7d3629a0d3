//! The playback synchronization engine
//!
//! Reconciles the local media surface with the room's timeline. Every mutation
//! the engine performs for the room is wrapped in a suppression guard so the
//! surface's own signals are not reported back as user intent.

use super::{
    clock::{self, PlaybackClock},
    ports::IntentPort,
    state::{PeerSyncDisposition, PlaybackState},
    suppression::SuppressionFlag,
};
use crate::{
    config::{
        BUFFER_SEEK_SETTLE_TIMEOUT_MS, Config, NORMAL_PLAYBACK_RATE, PLAYBACK_FAILED_MSG,
        RATE_TOLERANCE, SEEK_SETTLE_TIMEOUT_MS, SYNCHRONIZING_MSG, VIDEO_LOAD_FAILED_MSG,
    },
    media::{MediaElement, MediaEvent, ObservedMediaEvent, PlayError},
    observer::{SessionObserver, ToastLevel},
    protocol::{ActiveSource, PlaybackSnapshot, SeekMessage, SyncCorrection, SyncMessage},
    resolver::StreamResolver,
    utils::format_duration,
};
use log::{debug, info, trace, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, timeout};

/// Thresholds and timeouts of the engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub drift_threshold_secs: f64,
    pub seek_settle_timeout: Duration,
    pub buffer_seek_settle_timeout: Duration,
    pub rate_tolerance: f64,
    pub play_timeout: Duration,
}

impl From<&Config> for EngineConfig {
    fn from(config: &Config) -> Self {
        Self {
            drift_threshold_secs: config.drift_threshold_secs,
            seek_settle_timeout: Duration::from_millis(SEEK_SETTLE_TIMEOUT_MS),
            buffer_seek_settle_timeout: Duration::from_millis(BUFFER_SEEK_SETTLE_TIMEOUT_MS),
            rate_tolerance: RATE_TOLERANCE,
            play_timeout: config.play_timeout(),
        }
    }
}

/// Owns the media surface and keeps it converged with the room
pub struct SyncEngine<M> {
    state: PlaybackState,
    media: M,
    resolver: StreamResolver,
    intents: Arc<dyn IntentPort>,
    suppression: SuppressionFlag,
    observer: Arc<dyn SessionObserver>,
    config: EngineConfig,
    active_source: Option<ActiveSource>,
    pending_seek: Option<f64>,
    clock: watch::Sender<PlaybackClock>,
}

impl<M: MediaElement> SyncEngine<M> {
    /// `suppression` must be the flag the media surface's event sink stamps with
    pub fn new(
        media: M,
        resolver: StreamResolver,
        intents: Arc<dyn IntentPort>,
        suppression: SuppressionFlag,
        observer: Arc<dyn SessionObserver>,
        config: EngineConfig,
    ) -> Self {
        let (clock, _) = clock::channel();
        Self {
            state: PlaybackState::Idle,
            media,
            resolver,
            intents,
            suppression,
            observer,
            config,
            active_source: None,
            pending_seek: None,
            clock,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    pub fn active_source(&self) -> Option<&ActiveSource> {
        self.active_source.as_ref()
    }

    /// Seek target applied once the user interacts
    pub fn pending_seek(&self) -> Option<f64> {
        self.pending_seek
    }

    pub fn last_loaded_url(&self) -> Option<&str> {
        self.resolver.last_loaded_url()
    }

    /// Reader of the published playback clock
    pub fn clock(&self) -> watch::Receiver<PlaybackClock> {
        self.clock.subscribe()
    }

    /// Whether `source` differs from what was last loaded
    pub fn needs_load(&self, source: &ActiveSource) -> bool {
        self.resolver.last_loaded_url() != Some(source.url.as_str())
    }

    /// Takes ownership of a new source and enters `Loading`
    pub async fn begin_load(&mut self, source: ActiveSource) {
        info!("Loading source {}", source.url);
        self.pending_seek = None;
        self.active_source = Some(source);
        self.transition(PlaybackState::Loading).await;
    }

    /// Loads the active source; ends in `Ready` on success, `Idle` otherwise
    pub async fn run_load(&mut self) -> bool {
        let Some(source) = self.active_source.clone() else {
            return false;
        };
        let success = self.resolver.load_source(&mut self.media, &source).await;
        let next = if success {
            PlaybackState::Ready
        } else {
            PlaybackState::Idle
        };
        self.transition(next).await;
        success
    }

    /// Loads `source` from start to end
    pub async fn load(&mut self, source: ActiveSource) -> bool {
        self.begin_load(source).await;
        self.run_load().await
    }

    /// Settles an interrupted load so a fresh one can start
    pub async fn abandon_load(&mut self) {
        self.resolver.teardown();
        if self.state == PlaybackState::Loading {
            self.transition(PlaybackState::Idle).await;
        }
    }

    /// Releases the streaming client
    pub fn shutdown(&mut self) {
        self.resolver.teardown();
    }

    /// Applies an authoritative snapshot (join or reconnect)
    pub async fn apply_snapshot(&mut self, snapshot: PlaybackSnapshot) {
        if self.state == PlaybackState::WaitingInteraction {
            debug!("Pending seek target {:.1}s", snapshot.current_time);
            self.pending_seek = Some(snapshot.current_time);
            return;
        }
        if !self.state.accepts_snapshot() {
            debug!("Ignoring snapshot while {}", self.state);
            return;
        }

        info!(
            "State: {:.1}s, playing={}",
            snapshot.current_time, snapshot.is_playing
        );
        self.suppressed_seek(snapshot.current_time, self.config.seek_settle_timeout)
            .await;

        if snapshot.is_playing {
            self.start_playback(snapshot.current_time).await;
        } else {
            self.suppressed_pause().await;
            self.transition(PlaybackState::Ready).await;
        }
    }

    /// Reconciles a peer's periodic or event-driven timeline broadcast
    pub async fn handle_sync(&mut self, message: &SyncMessage) {
        if !self.accept_peer_event(message.current_time) {
            return;
        }

        let local = self.media.current_time().await;
        let drift = (local - message.current_time).abs();
        if drift > self.config.drift_threshold_secs {
            info!("Adjustment: {drift:.2}s");
            self.suppressed_seek(message.current_time, self.config.seek_settle_timeout)
                .await;
            self.observer.drift_adjusted(drift);
        }

        self.reconcile_play_state(message.is_playing, message.current_time)
            .await;

        if let Some(triggered_by) = &message.triggered_by {
            let action = if message.is_playing { "is playing" } else { "paused" };
            self.observer.sync_info(triggered_by, action);
        }
    }

    /// Applies a peer's deliberate seek regardless of drift
    pub async fn handle_seek(&mut self, message: &SeekMessage) {
        if !self.accept_peer_event(message.current_time) {
            return;
        }

        self.suppressed_seek(message.current_time, self.config.seek_settle_timeout)
            .await;
        if let Some(is_playing) = message.is_playing {
            self.reconcile_play_state(is_playing, message.current_time)
                .await;
        } else {
            self.publish_clock().await;
        }

        if let Some(triggered_by) = &message.triggered_by {
            let action = format!("jumped to {}", format_duration(message.current_time));
            self.observer.sync_info(triggered_by, &action);
        }
    }

    /// Applies a heartbeat-derived drift directive
    pub async fn handle_sync_correction(&mut self, correction: &SyncCorrection) {
        if !self.state.accepts_correction() {
            trace!("Ignoring correction while {}", self.state);
            return;
        }

        match *correction {
            SyncCorrection::Rate { rate, drift } => {
                let rate = rate.filter(|rate| *rate > 0.0).unwrap_or(NORMAL_PLAYBACK_RATE);
                if (self.media.playback_rate() - rate).abs() > self.config.rate_tolerance {
                    info!("Rate: {rate}x (drift: {drift:.2}s)");
                    {
                        let _guard = self.suppression.acquire();
                        self.media.set_playback_rate(rate).await;
                    }
                    self.observer.drift_adjusted(drift);
                }
                self.publish_clock().await;
            }
            SyncCorrection::Buffer { target_time } => {
                info!("Buffer sync: {target_time:.1}s");
                let result = {
                    let _guard = self.suppression.acquire();
                    self.media.pause().await;
                    self.observer.toast(ToastLevel::Warning, SYNCHRONIZING_MSG);
                    self.media.set_current_time(target_time).await;
                    self.wait_for_seek(self.config.buffer_seek_settle_timeout)
                        .await;
                    let result = self.safe_play().await;
                    self.media.set_playback_rate(NORMAL_PLAYBACK_RATE).await;
                    result
                };
                self.settle_play_result(result, target_time).await;
            }
        }
    }

    /// Turns a native media signal into outbound intent where the state allows it
    pub async fn on_media_event(&mut self, observed: ObservedMediaEvent) {
        if observed.suppressed {
            trace!("Suppressed {:?}", observed.event);
            return;
        }
        if !self.state.emits_intents() {
            trace!("{:?} while {}", observed.event, self.state);
            return;
        }

        let time = observed.current_time;
        match observed.event {
            MediaEvent::Play if self.state.accepts_local_play() => {
                self.intents.play(time);
                self.transition(PlaybackState::Playing).await;
            }
            MediaEvent::Pause if self.state.accepts_local_pause() && !observed.ended => {
                self.intents.pause(time);
                self.transition(PlaybackState::Ready).await;
            }
            MediaEvent::Seeked if self.state.accepts_local_seek() => {
                self.intents.seek(time);
                self.publish_clock().await;
            }
            MediaEvent::Waiting if self.state.reports_buffering() => self.intents.buffer_start(),
            MediaEvent::Playing if self.state.reports_buffering() => self.intents.buffer_end(),
            _ => {}
        }
    }

    /// The one-time gesture that unblocks playback
    pub async fn user_interact(&mut self) {
        if self.state != PlaybackState::WaitingInteraction {
            return;
        }
        self.media.grant_user_activation();

        let target = self.pending_seek.take();
        let result = {
            let _guard = self.suppression.acquire();
            if let Some(target) = target {
                self.media.set_current_time(target).await;
                self.wait_for_seek(self.config.seek_settle_timeout).await;
            }
            self.safe_play().await
        };

        match result {
            Ok(()) => self.transition(PlaybackState::Playing).await,
            Err(err) => {
                self.transition(PlaybackState::Ready).await;
                match err {
                    PlayError::Timeout => {
                        self.observer.toast(ToastLevel::Warning, VIDEO_LOAD_FAILED_MSG)
                    }
                    PlayError::Aborted => {}
                    err => {
                        warn!("Playback failed: {err}");
                        self.observer.toast(ToastLevel::Error, PLAYBACK_FAILED_MSG);
                    }
                }
            }
        }
    }

    /// Local play/pause toggle; the surface's signals carry the intent
    pub async fn user_toggle_play(&mut self) {
        self.media.grant_user_activation();
        match self.state {
            PlaybackState::WaitingInteraction => self.user_interact().await,
            PlaybackState::Ready | PlaybackState::Playing => {
                if self.media.paused().await {
                    if let Err(err) = self.safe_play().await {
                        warn!("Playback failed: {err}");
                    }
                } else {
                    self.media.pause().await;
                }
            }
            PlaybackState::Idle | PlaybackState::Loading => {
                debug!("Nothing to toggle while {}", self.state);
            }
        }
    }

    /// Local relative seek; the surface's `seeked` signal carries the intent
    pub async fn user_seek(&mut self, delta_secs: f64) {
        if !self.state.accepts_local_seek() {
            return;
        }
        let mut target = (self.media.current_time().await + delta_secs).max(0.0);
        if let Some(duration) = self.media.duration().await {
            target = target.min(duration);
        }
        self.media.set_current_time(target).await;
        self.wait_for_seek(self.config.seek_settle_timeout).await;
    }

    /// Common gate of peer `sync`/`seek` events
    fn accept_peer_event(&mut self, current_time: f64) -> bool {
        match self.state.peer_sync_disposition() {
            PeerSyncDisposition::Apply => true,
            PeerSyncDisposition::DeferTarget => {
                debug!("Pending seek target {current_time:.1}s");
                self.pending_seek = Some(current_time);
                false
            }
            PeerSyncDisposition::Ignore => {
                debug!("Ignoring peer event while {}", self.state);
                false
            }
        }
    }

    async fn reconcile_play_state(&mut self, is_playing: bool, target: f64) {
        let paused = self.media.paused().await;
        if is_playing {
            if paused {
                self.start_playback(target).await;
            } else {
                self.transition(PlaybackState::Playing).await;
            }
        } else {
            if !paused {
                self.suppressed_pause().await;
            }
            self.transition(PlaybackState::Ready).await;
        }
    }

    async fn start_playback(&mut self, target: f64) {
        let result = {
            let _guard = self.suppression.acquire();
            self.safe_play().await
        };
        self.settle_play_result(result, target).await;
    }

    async fn settle_play_result(&mut self, result: Result<(), PlayError>, target: f64) {
        match result {
            Ok(()) => self.transition(PlaybackState::Playing).await,
            Err(PlayError::NotAllowed) => self.enter_waiting(target).await,
            Err(PlayError::Aborted) => debug!("Play aborted"),
            Err(err) => {
                warn!("Playback failed: {err}");
                if self.media.paused().await {
                    self.transition(PlaybackState::Ready).await;
                }
            }
        }
    }

    async fn enter_waiting(&mut self, target: f64) {
        self.pending_seek = Some(target);
        if self.state != PlaybackState::WaitingInteraction {
            self.transition(PlaybackState::WaitingInteraction).await;
            self.observer.interaction_prompt(true);
        }
    }

    async fn suppressed_seek(&mut self, time: f64, settle: Duration) {
        let _guard = self.suppression.acquire();
        self.media.set_current_time(time).await;
        self.wait_for_seek(settle).await;
    }

    async fn suppressed_pause(&mut self) {
        let _guard = self.suppression.acquire();
        self.media.pause().await;
    }

    async fn wait_for_seek(&mut self, settle: Duration) {
        if timeout(settle, self.media.seeked()).await.is_err() {
            debug!("Seek completion not signalled within {settle:?}");
        }
    }

    async fn safe_play(&mut self) -> Result<(), PlayError> {
        match timeout(self.config.play_timeout, self.media.play()).await {
            Ok(result) => result,
            Err(_) => Err(PlayError::Timeout),
        }
    }

    async fn transition(&mut self, next: PlaybackState) {
        let previous = self.state;
        if previous != next {
            debug!("Playback state: {previous} -> {next}");
            self.state = next;
            if previous == PlaybackState::WaitingInteraction {
                self.observer.interaction_prompt(false);
            }
            self.observer.playback_state_changed(next);
        }
        self.publish_clock().await;
    }

    async fn publish_clock(&mut self) {
        let position = self.media.current_time().await;
        self.clock.send_replace(PlaybackClock {
            state: self.state,
            position,
            anchored_at: Instant::now(),
            rate: self.media.playback_rate(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ports::tests::RecordingIntents;
    use crate::media::{MediaEventSink, VirtualPlayer};
    use crate::observer::LogObserver;
    use crate::protocol::Outbound;
    use crate::resolver::loader::tests::{FixedProbe, ScriptedFactory, test_resolver_config};
    use crate::resolver::ProxyEndpoint;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Harness {
        engine: SyncEngine<VirtualPlayer>,
        intents: Arc<RecordingIntents>,
        events: UnboundedReceiver<ObservedMediaEvent>,
    }

    impl Harness {
        async fn new(autoplay_blocked: bool) -> Self {
            let suppression = SuppressionFlag::new();
            let (sink, events) = MediaEventSink::channel(suppression.clone());
            let media = VirtualPlayer::new(sink).with_autoplay_blocked(autoplay_blocked);
            let resolver = StreamResolver::new(
                test_resolver_config(false),
                ProxyEndpoint::new("http://party.local:3310").unwrap(),
                Arc::new(FixedProbe(None)),
                Arc::new(ScriptedFactory::default()),
                Arc::new(LogObserver),
            );
            let intents = Arc::new(RecordingIntents::default());
            let engine = SyncEngine::new(
                media,
                resolver,
                intents.clone(),
                suppression,
                Arc::new(LogObserver),
                EngineConfig::from(&Config::default()),
            );
            Self {
                engine,
                intents,
                events,
            }
        }

        async fn loaded(autoplay_blocked: bool) -> Self {
            let mut harness = Self::new(autoplay_blocked).await;
            assert!(harness.engine.load(source("https://x/movie.mp4")).await);
            harness.pump().await;
            harness
        }

        /// Feeds every emitted media event back into the engine
        async fn pump(&mut self) {
            while let Ok(event) = self.events.try_recv() {
                self.engine.on_media_event(event).await;
            }
        }
    }

    fn source(url: &str) -> ActiveSource {
        ActiveSource {
            url: url.to_string(),
            ..Default::default()
        }
    }

    fn snapshot(current_time: f64, is_playing: bool) -> PlaybackSnapshot {
        PlaybackSnapshot {
            current_time,
            is_playing,
        }
    }

    fn sync(current_time: f64, is_playing: bool) -> SyncMessage {
        SyncMessage {
            current_time,
            is_playing,
            triggered_by: Some("alice".to_string()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_moves_idle_to_ready() {
        let mut harness = Harness::new(false).await;
        assert_eq!(harness.engine.state(), PlaybackState::Idle);

        let source = source("https://x/movie.mp4");
        assert!(harness.engine.needs_load(&source));
        assert!(harness.engine.load(source.clone()).await);

        assert_eq!(harness.engine.state(), PlaybackState::Ready);
        assert_eq!(harness.engine.last_loaded_url(), Some("https://x/movie.mp4"));
        assert!(!harness.engine.needs_load(&source));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_autoplay_defers_to_interaction() {
        let mut harness = Harness::loaded(true).await;

        harness.engine.apply_snapshot(snapshot(42.0, true)).await;
        assert_eq!(harness.engine.state(), PlaybackState::WaitingInteraction);
        assert_eq!(harness.engine.pending_seek(), Some(42.0));

        harness.engine.handle_sync(&sync(50.0, true)).await;
        assert_eq!(harness.engine.pending_seek(), Some(50.0));
        assert_eq!(harness.engine.media().seeks().to_vec(), vec![42.0]);

        harness.engine.user_interact().await;
        assert_eq!(harness.engine.state(), PlaybackState::Playing);
        assert_eq!(harness.engine.media().seeks().to_vec(), vec![42.0, 50.0]);
        assert_eq!(harness.engine.pending_seek(), None);

        harness.pump().await;
        assert!(harness.intents.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_suppressed_mutations_never_report_intent() {
        let mut harness = Harness::loaded(false).await;

        harness.engine.apply_snapshot(snapshot(12.0, true)).await;
        harness.engine.handle_sync(&sync(40.0, false)).await;
        harness
            .engine
            .handle_seek(&SeekMessage {
                current_time: 5.0,
                is_playing: Some(true),
                triggered_by: None,
            })
            .await;
        harness
            .engine
            .handle_sync_correction(&SyncCorrection::Buffer { target_time: 9.0 })
            .await;
        harness.pump().await;

        assert_eq!(harness.engine.state(), PlaybackState::Playing);
        assert!(harness.intents.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_small_drift_does_not_seek() {
        let mut harness = Harness::loaded(false).await;
        harness.engine.apply_snapshot(snapshot(10.0, false)).await;

        harness.engine.handle_sync(&sync(10.2, true)).await;
        assert_eq!(harness.engine.media().seeks().to_vec(), vec![10.0]);
        assert_eq!(harness.engine.state(), PlaybackState::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_sync_seeks_once() {
        let mut harness = Harness::loaded(false).await;
        harness.engine.apply_snapshot(snapshot(0.0, false)).await;

        harness.engine.handle_sync(&sync(30.0, false)).await;
        harness.engine.handle_sync(&sync(30.0, false)).await;
        assert_eq!(harness.engine.media().seeks().to_vec(), vec![0.0, 30.0]);
        assert_eq!(harness.engine.state(), PlaybackState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_seek_is_bounded() {
        let mut harness = Harness::loaded(false).await;
        harness.engine.media_mut().set_stall_seeks(true);

        harness.engine.handle_sync(&sync(120.0, false)).await;
        assert_eq!(harness.engine.media().seeks().last().copied(), Some(120.0));
        assert_eq!(harness.engine.state(), PlaybackState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_peer_events_ignored_while_loading_or_idle() {
        let mut harness = Harness::new(false).await;
        harness.engine.handle_sync(&sync(30.0, true)).await;
        assert_eq!(harness.engine.state(), PlaybackState::Idle);

        harness.engine.begin_load(source("https://x/movie.mp4")).await;
        harness.engine.handle_sync(&sync(30.0, true)).await;
        harness
            .engine
            .handle_seek(&SeekMessage {
                current_time: 8.0,
                is_playing: None,
                triggered_by: None,
            })
            .await;
        assert!(harness.engine.media().seeks().is_empty());
        assert_eq!(harness.engine.state(), PlaybackState::Loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_play_pause_and_seek_report_intent() {
        let mut harness = Harness::loaded(false).await;

        harness.engine.user_toggle_play().await;
        harness.pump().await;
        assert_eq!(harness.engine.state(), PlaybackState::Playing);
        assert_eq!(
            harness.intents.sent(),
            vec![Outbound::Play { time: 0.0 }, Outbound::BufferEnd]
        );
        harness.intents.clear();

        harness.engine.user_seek(10.0).await;
        harness.pump().await;
        assert_eq!(harness.intents.sent(), vec![Outbound::Seek { time: 10.0 }]);
        harness.intents.clear();

        harness.engine.user_toggle_play().await;
        harness.pump().await;
        assert_eq!(harness.engine.state(), PlaybackState::Ready);
        assert_eq!(harness.intents.sent(), vec![Outbound::Pause { time: 10.0 }]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_at_end_of_media_is_not_reported() {
        let mut harness = Harness::loaded(false).await;
        harness.engine.apply_snapshot(snapshot(0.0, true)).await;
        harness.pump().await;

        harness
            .engine
            .on_media_event(ObservedMediaEvent {
                event: MediaEvent::Pause,
                suppressed: false,
                current_time: 600.0,
                ended: true,
            })
            .await;
        assert!(harness.intents.sent().is_empty());
        assert_eq!(harness.engine.state(), PlaybackState::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_buffering_reported_only_while_playing() {
        let mut harness = Harness::loaded(false).await;
        harness.engine.media_mut().stall();
        harness.pump().await;
        assert!(harness.intents.sent().is_empty());

        harness.engine.apply_snapshot(snapshot(0.0, true)).await;
        harness.pump().await;
        harness.engine.media_mut().stall();
        harness.engine.media_mut().resume();
        harness.pump().await;
        assert_eq!(
            harness.intents.sent(),
            vec![Outbound::BufferStart, Outbound::BufferEnd]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_signal_while_loading_is_not_reported() {
        let mut harness = Harness::new(false).await;
        harness.engine.begin_load(source("https://x/movie.mp4")).await;

        harness
            .engine
            .on_media_event(ObservedMediaEvent {
                event: MediaEvent::Seeked,
                suppressed: false,
                current_time: 3.0,
                ended: false,
            })
            .await;
        assert!(harness.intents.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_correction_respects_state_and_tolerance() {
        let mut harness = Harness::loaded(false).await;

        let nudge = SyncCorrection::Rate {
            rate: Some(1.05),
            drift: 0.8,
        };
        harness.engine.handle_sync_correction(&nudge).await;
        assert_eq!(harness.engine.media().playback_rate(), 1.0);

        harness.engine.apply_snapshot(snapshot(0.0, true)).await;
        harness
            .engine
            .handle_sync_correction(&SyncCorrection::Rate {
                rate: Some(1.005),
                drift: 0.1,
            })
            .await;
        assert_eq!(harness.engine.media().playback_rate(), 1.0);

        harness.engine.handle_sync_correction(&nudge).await;
        assert_eq!(harness.engine.media().playback_rate(), 1.05);
    }

    #[tokio::test(start_paused = true)]
    async fn test_buffer_correction_jumps_and_resets_rate() {
        let mut harness = Harness::loaded(false).await;
        harness.engine.apply_snapshot(snapshot(0.0, true)).await;
        harness
            .engine
            .handle_sync_correction(&SyncCorrection::Rate {
                rate: Some(0.95),
                drift: 0.7,
            })
            .await;

        harness
            .engine
            .handle_sync_correction(&SyncCorrection::Buffer { target_time: 77.0 })
            .await;
        assert_eq!(harness.engine.media().seeks().last().copied(), Some(77.0));
        assert_eq!(harness.engine.media().playback_rate(), 1.0);
        assert!(harness.engine.media().is_playing());
        assert_eq!(harness.engine.state(), PlaybackState::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interaction_play_timeout_falls_back_to_ready() {
        let mut harness = Harness::loaded(true).await;
        harness.engine.apply_snapshot(snapshot(5.0, true)).await;
        assert_eq!(harness.engine.state(), PlaybackState::WaitingInteraction);

        harness.engine.media_mut().set_hang_play(true);
        harness.engine.user_interact().await;
        assert_eq!(harness.engine.state(), PlaybackState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_reports_position_only_while_playing() {
        let mut harness = Harness::loaded(false).await;
        let clock = harness.engine.clock();

        harness.engine.apply_snapshot(snapshot(20.0, false)).await;
        assert!(clock.borrow().heartbeat_payload().is_empty());

        harness.engine.apply_snapshot(snapshot(20.0, true)).await;
        let position = clock.borrow().position_at(Instant::now());
        assert_eq!(position, Some(20.0));
    }
}

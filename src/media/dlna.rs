//! DLNA renderer as a media surface
//!
//! The renderer fetches the stream itself; this surface only drives its
//! AVTransport service and mirrors the renderer's position locally between
//! GetPositionInfo polls. Renderers play at normal speed only.

use super::element::{
    MediaElement, MediaEvent, MediaEventSink, PlayError, ReadyState, TextTrack,
};
use crate::{
    devices::Render,
    dlna::{self, MediaItem, build_setavtransporturi_payload},
    error::Result,
};
use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::time::Instant;

/// Media surface backed by a DLNA renderer
pub struct DlnaSurface {
    render: Render,
    sink: MediaEventSink,
    title: Option<String>,
    source: Option<String>,
    subtitle: Option<TextTrack>,
    /// Subtitle the renderer was last told about
    announced_subtitle: Option<String>,
    load_error: Option<String>,
    ready_state: ReadyState,
    position: f64,
    anchored_at: Instant,
    playing: bool,
    duration: Option<f64>,
}

impl DlnaSurface {
    pub fn new(render: Render, sink: MediaEventSink) -> Self {
        Self {
            render,
            sink,
            title: None,
            source: None,
            subtitle: None,
            announced_subtitle: None,
            load_error: None,
            ready_state: ReadyState::HaveNothing,
            position: 0.0,
            anchored_at: Instant::now(),
            playing: false,
            duration: None,
        }
    }

    pub fn render(&self) -> &Render {
        &self.render
    }

    fn position_now(&self) -> f64 {
        if self.playing {
            self.position + self.anchored_at.elapsed().as_secs_f64()
        } else {
            self.position
        }
    }

    fn anchor(&mut self, position: f64) {
        self.position = position;
        self.anchored_at = Instant::now();
    }

    fn is_ended(&self) -> bool {
        self.duration
            .is_some_and(|duration| self.position_now() >= duration)
    }

    async fn announce(&mut self, url: &str) -> Result<()> {
        let item = MediaItem {
            title: self.title.clone(),
            video_uri: url.to_string(),
            subtitle_uri: self.subtitle.as_ref().map(|track| track.src.clone()),
        };
        let payload = build_setavtransporturi_payload(&item)?;
        dlna::set_transport_uri(&self.render, &payload).await?;
        self.announced_subtitle = item.subtitle_uri;
        Ok(())
    }

    /// Re-announces the source when its subtitle changed since the last announcement
    async fn sync_subtitle(&mut self) {
        let wanted = self.subtitle.as_ref().map(|track| track.src.as_str());
        if wanted == self.announced_subtitle.as_deref() {
            return;
        }
        let Some(url) = self.source.clone() else {
            return;
        };
        info!("Announcing subtitle to {}", self.render.device.friendly_name());
        if let Err(err) = self.announce(&url).await {
            warn!("Could not attach subtitle: {err}");
        }
    }

    async fn refresh_position(&mut self) {
        match self.render.get_position_info().await {
            Ok(info) => {
                if let Some(position) = info.rel_time {
                    self.anchor(position);
                }
                if info.track_duration.is_some() {
                    self.duration = info.track_duration;
                }
            }
            Err(err) => debug!("Position poll failed, extrapolating: {err}"),
        }
    }
}

#[async_trait]
impl MediaElement for DlnaSurface {
    async fn current_time(&mut self) -> f64 {
        self.refresh_position().await;
        self.position_now()
    }

    async fn set_current_time(&mut self, time: f64) {
        self.sync_subtitle().await;
        let time = time.max(0.0);
        match dlna::seek(&self.render, time).await {
            Ok(()) => {
                self.anchor(time);
                let ended = self.is_ended();
                self.sink.emit(MediaEvent::Seeked, time, ended);
            }
            Err(err) => warn!("Seek to {time:.1}s failed: {err}"),
        }
    }

    async fn seeked(&mut self) {}

    async fn paused(&mut self) -> bool {
        !self.playing
    }

    async fn ended(&mut self) -> bool {
        self.is_ended()
    }

    fn playback_rate(&self) -> f64 {
        1.0
    }

    async fn set_playback_rate(&mut self, rate: f64) {
        debug!("Renderer keeps normal speed, ignoring rate {rate}");
    }

    async fn play(&mut self) -> std::result::Result<(), PlayError> {
        if self.source.is_none() {
            return Err(PlayError::Other("no source loaded".to_string()));
        }
        self.sync_subtitle().await;
        if self.playing {
            return Ok(());
        }
        dlna::play(&self.render)
            .await
            .map_err(|err| PlayError::Other(err.to_string()))?;
        let position = self.position;
        self.anchor(position);
        self.playing = true;
        self.sink.emit(MediaEvent::Play, position, false);
        self.sink.emit(MediaEvent::Playing, position, false);
        Ok(())
    }

    async fn pause(&mut self) {
        if !self.playing {
            return;
        }
        match dlna::pause(&self.render).await {
            Ok(()) => {
                let position = self.position_now();
                self.anchor(position);
                self.playing = false;
                let ended = self.is_ended();
                self.sink.emit(MediaEvent::Pause, position, ended);
            }
            Err(err) => warn!("Pause failed: {err}"),
        }
    }

    async fn ready_state(&mut self) -> ReadyState {
        self.ready_state
    }

    async fn duration(&mut self) -> Option<f64> {
        if self.duration.is_none() && self.load_error.is_none() && self.source.is_some() {
            self.refresh_position().await;
        }
        self.duration
    }

    async fn set_source(&mut self, url: &str) {
        self.source = Some(url.to_string());
        self.playing = false;
        self.duration = None;
        self.anchor(0.0);

        self.load_error = self.announce(url).await.err().map(|err| err.to_string());
        self.ready_state = match &self.load_error {
            None => ReadyState::HaveEnoughData,
            Some(reason) => {
                warn!("Renderer refused {url}: {reason}");
                ReadyState::HaveNothing
            }
        };
    }

    async fn can_play(&mut self) -> std::result::Result<(), String> {
        match &self.load_error {
            None => Ok(()),
            Some(reason) => Err(reason.clone()),
        }
    }

    fn add_text_track(&mut self, track: TextTrack) {
        self.subtitle = Some(track);
    }

    fn clear_text_tracks(&mut self) {
        self.subtitle = None;
    }

    fn set_title(&mut self, title: Option<&str>) {
        self.title = title.map(str::to_string);
    }
}

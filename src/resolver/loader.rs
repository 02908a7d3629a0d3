//! Loads a source into the media surface
//!
//! Format resolution, then one of two paths:
//! - adaptive: a [`StreamClient`] parses the manifest, with in-place retries on
//!   network faults and a single escalation to a fully proxied load
//! - progressive: the surface fetches the file itself, with one proxied retry
//!
//! Every wait is bounded, so a load always settles as success or failure.

use super::{
    format::{StreamFormat, classify_content_type, detect_format},
    hls::{Manifest, StreamClient, StreamClientFactory, StreamErrorKind, StreamEvent},
    probe::SourceProbe,
    proxy::{ProxyEndpoint, ProxyKind, SegmentRewriter},
};
use crate::{
    config::{Config, VIDEO_LOAD_FAILED_MSG},
    media::{MediaElement, ReadyState, TextTrack},
    observer::{SessionObserver, ToastLevel},
    protocol::ActiveSource,
};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

/// Knobs of the stream resolver
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub proxy_enabled: bool,
    pub max_network_retries: u32,
    pub progressive_ready_timeout: Duration,
    pub manifest_timeout: Duration,
    pub probe_timeout: Duration,
    pub subtitle_lang: String,
    pub subtitle_label: String,
}

impl From<&Config> for ResolverConfig {
    fn from(config: &Config) -> Self {
        Self {
            proxy_enabled: config.proxy_enabled,
            max_network_retries: config.max_network_retries,
            progressive_ready_timeout: config.progressive_ready_timeout(),
            manifest_timeout: config.manifest_timeout(),
            probe_timeout: config.probe_timeout(),
            subtitle_lang: config.subtitle_lang.clone(),
            subtitle_label: config.subtitle_label.clone(),
        }
    }
}

/// Decides how a source is fetched and loads it
pub struct StreamResolver {
    config: ResolverConfig,
    proxy: ProxyEndpoint,
    probe: Arc<dyn SourceProbe>,
    factory: Arc<dyn StreamClientFactory>,
    observer: Arc<dyn SessionObserver>,
    client: Option<Box<dyn StreamClient>>,
    manifest: Option<Manifest>,
    last_loaded_url: Option<String>,
}

impl StreamResolver {
    pub fn new(
        config: ResolverConfig,
        proxy: ProxyEndpoint,
        probe: Arc<dyn SourceProbe>,
        factory: Arc<dyn StreamClientFactory>,
        observer: Arc<dyn SessionObserver>,
    ) -> Self {
        Self {
            config,
            proxy,
            probe,
            factory,
            observer,
            client: None,
            manifest: None,
            last_loaded_url: None,
        }
    }

    /// URL of the last source that loaded successfully
    pub fn last_loaded_url(&self) -> Option<&str> {
        self.last_loaded_url.as_deref()
    }

    /// Manifest of the current adaptive source, with rewritten URIs
    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    /// Releases the streaming client of the current source, if any
    pub fn teardown(&mut self) {
        self.manifest = None;
        if let Some(mut client) = self.client.take() {
            debug!("Destroying stream client");
            client.destroy();
        }
    }

    /// Loads `source` into `media`, returning whether it became playable
    pub async fn load_source<M>(&mut self, media: &mut M, source: &ActiveSource) -> bool
    where
        M: MediaElement + ?Sized,
    {
        self.teardown();
        media.clear_text_tracks();
        media.set_title(source.title.as_deref());

        let format = self.resolve_format(source).await;
        info!("Loading {} as {format}", source.url);

        let success = if format.is_adaptive() {
            self.load_adaptive(media, source).await
        } else {
            self.load_progressive(media, source).await
        };

        if let Some(subtitle_url) = &source.subtitle_url {
            media.add_text_track(self.subtitle_track(subtitle_url, source));
        }

        if success {
            self.last_loaded_url = Some(source.url.clone());
            let duration = match source.duration {
                Some(duration) => Some(duration),
                None => match self.manifest.as_ref().and_then(Manifest::total_duration) {
                    Some(duration) => Some(duration),
                    None => media.duration().await,
                },
            };
            self.observer
                .metadata_available(source.title.as_deref(), duration);
        }
        success
    }

    /// Probe first, then URL heuristics, then the caller's hint
    pub async fn resolve_format(&self, source: &ActiveSource) -> StreamFormat {
        let heuristic = || detect_format(&source.url, source.format.as_deref());
        if !self.config.proxy_enabled {
            return heuristic();
        }

        let probe_url = self
            .proxy
            .build_proxy_url(&source.url, &source.headers, ProxyKind::Video);
        match timeout(self.config.probe_timeout, self.probe.content_type(&probe_url)).await {
            Ok(Ok(content_type)) => {
                let content_type = content_type.unwrap_or_default();
                let format = classify_content_type(&content_type).unwrap_or_else(heuristic);
                debug!("Format check: '{content_type}' -> {format}");
                format
            }
            Ok(Err(err)) => {
                debug!("{err}, falling back to URL detection");
                heuristic()
            }
            Err(_) => {
                debug!("Format check timed out, falling back to URL detection");
                heuristic()
            }
        }
    }

    async fn load_adaptive<M>(&mut self, media: &mut M, source: &ActiveSource) -> bool
    where
        M: MediaElement + ?Sized,
    {
        let max_retries = self.config.max_network_retries;
        let mut proxy_forced = false;

        'load: loop {
            let load_url = if proxy_forced {
                self.proxied(source)
            } else {
                source.url.clone()
            };
            let rewriter = self.config.proxy_enabled.then(|| {
                SegmentRewriter::new(&source.url, source.headers.clone(), self.proxy.clone())
            });
            info!(
                "HLS: {}",
                if proxy_forced { "proxy (forced)" } else { "smart proxy" }
            );

            let mut client = self.factory.create(&source.headers, rewriter);
            client.load_source(&load_url).await;
            self.client = Some(client);
            let mut retries = 0;

            loop {
                let Some(client) = self.client.as_mut() else {
                    return false;
                };
                let event = match timeout(self.config.manifest_timeout, client.next_event()).await {
                    Ok(Some(event)) => event,
                    Ok(None) => StreamEvent::Error {
                        kind: StreamErrorKind::Other,
                        fatal: true,
                        details: "stream client went idle".to_string(),
                    },
                    Err(_) => StreamEvent::Error {
                        kind: StreamErrorKind::Network,
                        fatal: true,
                        details: "manifest load timeout".to_string(),
                    },
                };

                match event {
                    StreamEvent::ManifestParsed(manifest) => {
                        let playback_url = playback_url(&load_url, &manifest);
                        media.set_source(&playback_url).await;
                        self.manifest = Some(manifest);
                        info!("HLS ready");
                        return true;
                    }
                    StreamEvent::Error { fatal: false, kind, details } => {
                        debug!("Non-fatal {kind} error: {details}");
                    }
                    StreamEvent::Error { kind: StreamErrorKind::Network, details, .. } => {
                        retries += 1;
                        if retries <= max_retries {
                            warn!("HLS network error ({details}), retry {retries}/{max_retries}");
                            client.start_load().await;
                        } else if !proxy_forced && self.config.proxy_enabled {
                            info!("Switching to forced proxy mode");
                            self.teardown();
                            proxy_forced = true;
                            continue 'load;
                        } else {
                            self.fail_adaptive(&details);
                            return false;
                        }
                    }
                    StreamEvent::Error { kind: StreamErrorKind::Media, details, .. } => {
                        warn!("HLS media error ({details}), recovering");
                        client.recover_media_error().await;
                    }
                    StreamEvent::Error { kind: StreamErrorKind::Other, details, .. } => {
                        self.fail_adaptive(&details);
                        return false;
                    }
                }
            }
        }
    }

    fn fail_adaptive(&mut self, details: &str) {
        self.teardown();
        self.observer
            .toast(ToastLevel::Error, &format!("HLS error: {details}"));
    }

    async fn load_progressive<M>(&mut self, media: &mut M, source: &ActiveSource) -> bool
    where
        M: MediaElement + ?Sized,
    {
        let mut use_proxy = false;

        loop {
            let load_url = if use_proxy {
                self.proxied(source)
            } else {
                source.url.clone()
            };
            media.set_source(&load_url).await;

            match timeout(self.config.progressive_ready_timeout, media.can_play()).await {
                Ok(Ok(())) => return true,
                Ok(Err(reason)) => {
                    warn!("Load error for {load_url}: {reason}");
                    if !use_proxy && self.config.proxy_enabled {
                        use_proxy = true;
                        continue;
                    }
                }
                Err(_) => {
                    if media.ready_state().await >= ReadyState::HaveCurrentData {
                        debug!("Readiness timeout with data buffered, accepting");
                        return true;
                    }
                    warn!("{load_url} did not become playable in time");
                }
            }

            self.observer.toast(ToastLevel::Error, VIDEO_LOAD_FAILED_MSG);
            return false;
        }
    }

    fn proxied(&self, source: &ActiveSource) -> String {
        self.proxy
            .build_proxy_url(&source.url, &source.headers, ProxyKind::Video)
    }

    fn subtitle_track(&self, subtitle_url: &str, source: &ActiveSource) -> TextTrack {
        let src = if self.config.proxy_enabled {
            self.proxy
                .build_proxy_url(subtitle_url, &source.headers, ProxyKind::Subtitle)
        } else {
            subtitle_url.to_string()
        };
        TextTrack {
            src,
            lang: self.config.subtitle_lang.clone(),
            label: self.config.subtitle_label.clone(),
            default: true,
        }
    }
}

/// What the surface plays: the best variant of a master playlist, else the manifest itself.
///
/// Variant URIs already went through the segment rewriter; relative ones are
/// resolved against the manifest.
fn playback_url(load_url: &str, manifest: &Manifest) -> String {
    let Some(variant) = manifest
        .variants
        .iter()
        .max_by_key(|variant| variant.bandwidth.unwrap_or_default())
    else {
        return load_url.to_string();
    };
    match Url::parse(load_url).and_then(|base| base.join(&variant.uri)) {
        Ok(url) => url.to_string(),
        Err(err) => {
            warn!("Cannot resolve variant {}: {err}", variant.uri);
            load_url.to_string()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::SuppressionFlag;
    use crate::error::{Error, Result};
    use crate::media::{LoadBehavior, MediaEventSink, VirtualPlayer};
    use crate::observer::LogObserver;
    use crate::resolver::{Manifest, SegmentRewriter};
    use crate::protocol::StreamHeaders;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Probe answering with a fixed content type, or failing
    pub(crate) struct FixedProbe(pub Option<&'static str>);

    #[async_trait]
    impl SourceProbe for FixedProbe {
        async fn content_type(&self, url: &str) -> Result<Option<String>> {
            match self.0 {
                Some(content_type) => Ok(Some(content_type.to_string())),
                None => Err(Error::ProbeFailed {
                    url: url.to_string(),
                    reason: "unreachable".to_string(),
                }),
            }
        }
    }

    /// Streaming client replaying a shared script of events
    struct ScriptedClient {
        script: Arc<Mutex<VecDeque<StreamEvent>>>,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl StreamClient for ScriptedClient {
        async fn load_source(&mut self, url: &str) {
            self.log.lock().unwrap().push(format!("load {url}"));
        }

        async fn next_event(&mut self) -> Option<StreamEvent> {
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(event) => Some(event),
                None => std::future::pending().await,
            }
        }

        async fn start_load(&mut self) {
            self.log.lock().unwrap().push("start_load".to_string());
        }

        async fn recover_media_error(&mut self) {
            self.log.lock().unwrap().push("recover".to_string());
        }

        fn destroy(&mut self) {
            self.log.lock().unwrap().push("destroy".to_string());
        }
    }

    #[derive(Default)]
    pub(crate) struct ScriptedFactory {
        script: Arc<Mutex<VecDeque<StreamEvent>>>,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedFactory {
        pub(crate) fn with_events(events: Vec<StreamEvent>) -> Self {
            Self {
                script: Arc::new(Mutex::new(events.into())),
                log: Arc::default(),
            }
        }

        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    impl StreamClientFactory for ScriptedFactory {
        fn create(
            &self,
            _headers: &StreamHeaders,
            _rewriter: Option<SegmentRewriter>,
        ) -> Box<dyn StreamClient> {
            self.log.lock().unwrap().push("create".to_string());
            Box::new(ScriptedClient {
                script: self.script.clone(),
                log: self.log.clone(),
            })
        }
    }

    pub(crate) fn network_error() -> StreamEvent {
        StreamEvent::Error {
            kind: StreamErrorKind::Network,
            fatal: true,
            details: "fragLoadError".to_string(),
        }
    }

    pub(crate) fn parsed() -> StreamEvent {
        StreamEvent::ManifestParsed(Manifest::default())
    }

    pub(crate) fn test_resolver_config(proxy_enabled: bool) -> ResolverConfig {
        ResolverConfig::from(&Config::default().with_proxy_enabled(proxy_enabled))
    }

    fn resolver(
        proxy_enabled: bool,
        probe: FixedProbe,
        factory: Arc<ScriptedFactory>,
    ) -> StreamResolver {
        StreamResolver::new(
            test_resolver_config(proxy_enabled),
            ProxyEndpoint::new("http://party.local:3310").unwrap(),
            Arc::new(probe),
            factory,
            Arc::new(LogObserver),
        )
    }

    fn player() -> VirtualPlayer {
        let (sink, _rx) = MediaEventSink::channel(SuppressionFlag::new());
        VirtualPlayer::new(sink)
    }

    fn source(url: &str) -> ActiveSource {
        ActiveSource {
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_probe_classifies_mpegurl_as_hls() {
        let factory = Arc::new(ScriptedFactory::with_events(vec![parsed()]));
        let mut resolver = resolver(true, FixedProbe(Some("application/vnd.apple.mpegurl")), factory.clone());
        let mut media = player();

        let source = source("https://x/a.m3u8");
        assert_eq!(resolver.resolve_format(&source).await, StreamFormat::Hls);
        assert!(resolver.load_source(&mut media, &source).await);
        assert_eq!(resolver.last_loaded_url(), Some("https://x/a.m3u8"));
        assert_eq!(media.sources().to_vec(), vec!["https://x/a.m3u8".to_string()]);
    }

    #[derive(Default)]
    struct MetadataRecorder(Mutex<Vec<Option<f64>>>);

    impl SessionObserver for MetadataRecorder {
        fn metadata_available(&self, _title: Option<&str>, duration: Option<f64>) {
            self.0.lock().unwrap().push(duration);
        }
    }

    const MASTER: &str = "#EXTM3U\n\
        #EXT-X-STREAM-INF:BANDWIDTH=640000\n\
        360p/index.m3u8\n\
        #EXT-X-STREAM-INF:BANDWIDTH=1280000\n\
        720p/index.m3u8\n";

    #[tokio::test]
    async fn test_master_playlist_plays_best_variant() {
        let manifest = Manifest::parse(MASTER, str::to_string).unwrap();
        let factory = Arc::new(ScriptedFactory::with_events(vec![StreamEvent::ManifestParsed(
            manifest,
        )]));
        let mut resolver = resolver(false, FixedProbe(None), factory);
        let mut media = player();

        assert!(resolver.load_source(&mut media, &source("https://x/live/master.m3u8")).await);
        assert_eq!(
            media.sources().to_vec(),
            vec!["https://x/live/720p/index.m3u8".to_string()]
        );
        assert_eq!(resolver.manifest().map(|m| m.variants.len()), Some(2));
    }

    #[tokio::test]
    async fn test_rewritten_variants_are_played_as_is() {
        let proxy = ProxyEndpoint::new("http://party.local:3310").unwrap();
        let headers = StreamHeaders {
            referer: Some("https://site.example/".to_string()),
            ..Default::default()
        };
        let rewriter = SegmentRewriter::new("https://x/live/master.m3u8", headers, proxy);
        let manifest = Manifest::parse(MASTER, |uri| rewriter.rewrite(uri)).unwrap();
        let factory = Arc::new(ScriptedFactory::with_events(vec![StreamEvent::ManifestParsed(
            manifest,
        )]));
        let mut resolver = resolver(true, FixedProbe(Some("application/x-mpegurl")), factory);
        let mut media = player();

        assert!(resolver.load_source(&mut media, &source("https://x/live/master.m3u8")).await);
        let played = &media.sources()[0];
        assert!(played.starts_with("http://party.local:3310/api/v1/proxy/video?url="));
        assert!(played.contains("720p"));
        assert!(played.contains("referer="));
    }

    #[tokio::test]
    async fn test_media_playlist_duration_is_reported() {
        let media_playlist = "#EXTM3U\n#EXTINF:6.0,\nseg-0.ts\n#EXTINF:4.5,\nseg-1.ts\n";
        let manifest = Manifest::parse(media_playlist, str::to_string).unwrap();
        let factory = Arc::new(ScriptedFactory::with_events(vec![StreamEvent::ManifestParsed(
            manifest,
        )]));
        let observer = Arc::new(MetadataRecorder::default());
        let mut resolver = StreamResolver::new(
            test_resolver_config(false),
            ProxyEndpoint::new("http://party.local:3310").unwrap(),
            Arc::new(FixedProbe(None)),
            factory,
            observer.clone(),
        );
        let mut media = player();

        assert!(resolver.load_source(&mut media, &source("https://x/a.m3u8")).await);
        assert_eq!(media.sources().to_vec(), vec!["https://x/a.m3u8".to_string()]);
        assert_eq!(observer.0.lock().unwrap().clone(), vec![Some(10.5)]);

        resolver.teardown();
        assert!(resolver.manifest().is_none());
    }

    #[tokio::test]
    async fn test_probe_failure_falls_back_to_heuristics() {
        let factory = Arc::new(ScriptedFactory::default());
        let resolver = resolver(true, FixedProbe(None), factory);

        assert_eq!(
            resolver.resolve_format(&source("https://x/movie.mp4")).await,
            StreamFormat::Mp4
        );
        let hinted = ActiveSource {
            format: Some("hls".to_string()),
            ..source("https://x/play")
        };
        assert_eq!(resolver.resolve_format(&hinted).await, StreamFormat::Hls);
    }

    #[tokio::test]
    async fn test_network_errors_escalate_to_forced_proxy_once() {
        let factory = Arc::new(ScriptedFactory::with_events(vec![
            network_error(),
            network_error(),
            network_error(),
            network_error(),
            parsed(),
        ]));
        let mut resolver = resolver(true, FixedProbe(Some("application/x-mpegurl")), factory.clone());
        let mut media = player();

        assert!(resolver.load_source(&mut media, &source("https://x/a.m3u8")).await);
        let log = factory.log();
        assert_eq!(log.iter().filter(|entry| *entry == "start_load").count(), 3);
        assert_eq!(log.iter().filter(|entry| *entry == "create").count(), 2);
        assert!(log.contains(&"destroy".to_string()));
        assert!(media.sources()[0].starts_with("http://party.local:3310/api/v1/proxy/video?url="));
    }

    #[tokio::test]
    async fn test_forced_proxy_failure_is_terminal() {
        let factory = Arc::new(ScriptedFactory::with_events(vec![network_error(); 8]));
        let mut resolver = resolver(true, FixedProbe(Some("application/x-mpegurl")), factory.clone());
        let mut media = player();

        assert!(!resolver.load_source(&mut media, &source("https://x/a.m3u8")).await);
        assert_eq!(resolver.last_loaded_url(), None);
        assert_eq!(factory.log().iter().filter(|entry| *entry == "create").count(), 2);
        assert!(media.sources().is_empty());
    }

    #[tokio::test]
    async fn test_without_proxy_there_is_no_escalation() {
        let factory = Arc::new(ScriptedFactory::with_events(vec![network_error(); 4]));
        let mut resolver = resolver(false, FixedProbe(None), factory.clone());
        let mut media = player();

        assert!(!resolver.load_source(&mut media, &source("https://x/a.m3u8")).await);
        assert_eq!(factory.log().iter().filter(|entry| *entry == "create").count(), 1);
    }

    #[tokio::test]
    async fn test_media_errors_do_not_consume_retries() {
        let media_error = StreamEvent::Error {
            kind: StreamErrorKind::Media,
            fatal: true,
            details: "bufferAppendError".to_string(),
        };
        let factory = Arc::new(ScriptedFactory::with_events(vec![
            network_error(),
            media_error.clone(),
            media_error,
            network_error(),
            network_error(),
            parsed(),
        ]));
        let mut resolver = resolver(false, FixedProbe(None), factory.clone());
        let mut media = player();

        assert!(resolver.load_source(&mut media, &source("https://x/a.m3u8")).await);
        let log = factory.log();
        assert_eq!(log.iter().filter(|entry| *entry == "recover").count(), 2);
        assert_eq!(log.iter().filter(|entry| *entry == "start_load").count(), 3);
    }

    #[tokio::test]
    async fn test_other_fatal_errors_abort() {
        let factory = Arc::new(ScriptedFactory::with_events(vec![StreamEvent::Error {
            kind: StreamErrorKind::Other,
            fatal: true,
            details: "internalException".to_string(),
        }]));
        let mut resolver = resolver(true, FixedProbe(Some("application/x-mpegurl")), factory.clone());
        let mut media = player();

        assert!(!resolver.load_source(&mut media, &source("https://x/a.m3u8")).await);
        assert_eq!(factory.log().last().map(String::as_str), Some("destroy"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manifest_timeout_counts_as_network_error() {
        let factory = Arc::new(ScriptedFactory::default());
        let mut resolver = resolver(false, FixedProbe(None), factory.clone());
        let mut media = player();

        assert!(!resolver.load_source(&mut media, &source("https://x/a.m3u8")).await);
        assert_eq!(factory.log().iter().filter(|entry| *entry == "start_load").count(), 3);
    }

    #[tokio::test]
    async fn test_previous_client_is_destroyed_on_new_load() {
        let factory = Arc::new(ScriptedFactory::with_events(vec![parsed(), parsed()]));
        let mut resolver = resolver(false, FixedProbe(None), factory.clone());
        let mut media = player();

        assert!(resolver.load_source(&mut media, &source("https://x/a.m3u8")).await);
        assert!(resolver.load_source(&mut media, &source("https://x/b.m3u8")).await);
        let log = factory.log();
        let second_create = log.iter().rposition(|entry| entry == "create").unwrap();
        assert_eq!(log[second_create - 1], "destroy");
    }

    #[tokio::test]
    async fn test_progressive_hard_error_retries_through_proxy() {
        let factory = Arc::new(ScriptedFactory::default());
        let mut resolver = resolver(true, FixedProbe(Some("video/mp4")), factory);
        let mut media = player();
        media.script_load(LoadBehavior::Fail("403".to_string()));

        assert!(resolver.load_source(&mut media, &source("https://x/a.mp4")).await);
        assert_eq!(media.sources().len(), 2);
        assert!(media.sources()[1].contains("/api/v1/proxy/video?url="));
    }

    #[tokio::test(start_paused = true)]
    async fn test_progressive_timeout_with_partial_data_succeeds() {
        let factory = Arc::new(ScriptedFactory::default());
        let mut resolver = resolver(false, FixedProbe(None), factory);
        let mut media = player();
        media.script_load(LoadBehavior::Stall { partial: true });

        assert!(resolver.load_source(&mut media, &source("https://x/a.mp4")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progressive_timeout_without_data_fails() {
        let factory = Arc::new(ScriptedFactory::default());
        let mut resolver = resolver(false, FixedProbe(None), factory);
        let mut media = player();
        media.script_load(LoadBehavior::Stall { partial: false });

        assert!(!resolver.load_source(&mut media, &source("https://x/a.mp4")).await);
        assert_eq!(resolver.last_loaded_url(), None);
    }

    #[tokio::test]
    async fn test_subtitles_are_proxied_and_default() {
        let factory = Arc::new(ScriptedFactory::default());
        let mut resolver = resolver(true, FixedProbe(Some("video/mp4")), factory);
        let mut media = player();
        let source = ActiveSource {
            subtitle_url: Some("https://x/subs.vtt".to_string()),
            ..source("https://x/a.mp4")
        };

        assert!(resolver.load_source(&mut media, &source).await);
        let tracks = media.text_tracks();
        assert_eq!(tracks.len(), 1);
        assert!(tracks[0].default);
        assert_eq!(tracks[0].lang, "tr");
        assert!(tracks[0].src.contains("/api/v1/proxy/subtitle?url="));
    }
}

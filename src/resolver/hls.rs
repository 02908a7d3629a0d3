//! Adaptive manifest client
//!
//! The loader drives a [`StreamClient`] through a small event protocol: load a
//! manifest, then pull [`StreamEvent`]s until the manifest parsed or a fatal
//! error needs a decision (restart the load, recover in place, give up).

use super::proxy::SegmentRewriter;
use crate::{
    config::USER_AGENT,
    error::{Error, Result},
    protocol::StreamHeaders,
};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::{REFERER, USER_AGENT as USER_AGENT_HEADER};
use std::fmt;

/// Error classes a streaming client distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamErrorKind {
    /// Download failed or returned garbage, a reload may help
    Network,
    /// Decoding failed, recoverable without reloading the manifest
    Media,
    Other,
}

impl fmt::Display for StreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamErrorKind::Network => write!(f, "network"),
            StreamErrorKind::Media => write!(f, "media"),
            StreamErrorKind::Other => write!(f, "other"),
        }
    }
}

/// Something the streaming client wants the loader to know
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    ManifestParsed(Manifest),
    Error {
        kind: StreamErrorKind,
        fatal: bool,
        details: String,
    },
}

/// A quality level listed by a master playlist
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub uri: String,
    pub bandwidth: Option<u64>,
    pub resolution: Option<String>,
}

/// A media segment listed by a media playlist
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub uri: String,
    pub duration: f64,
}

/// A parsed HLS playlist, master or media
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pub target_duration: Option<f64>,
    pub variants: Vec<Variant>,
    pub segments: Vec<Segment>,
}

impl Manifest {
    /// Parses playlist text, passing every URI through `rewrite`
    pub fn parse<F>(text: &str, rewrite: F) -> std::result::Result<Self, String>
    where
        F: Fn(&str) -> String,
    {
        let mut lines = text
            .trim_start_matches('\u{feff}')
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty());

        if lines.next() != Some("#EXTM3U") {
            return Err("missing #EXTM3U header".to_string());
        }

        let mut manifest = Manifest::default();
        let mut pending_duration = None;
        let mut pending_variant: Option<Variant> = None;

        for line in lines {
            if let Some(value) = line.strip_prefix("#EXT-X-TARGETDURATION:") {
                manifest.target_duration = value.trim().parse().ok();
            } else if let Some(value) = line.strip_prefix("#EXTINF:") {
                let duration = value.split(',').next().unwrap_or_default().trim();
                pending_duration = Some(
                    duration
                        .parse::<f64>()
                        .map_err(|_| format!("invalid segment duration '{duration}'"))?,
                );
            } else if let Some(attributes) = line.strip_prefix("#EXT-X-STREAM-INF:") {
                let mut variant = Variant {
                    uri: String::new(),
                    bandwidth: None,
                    resolution: None,
                };
                for (key, value) in split_attributes(attributes) {
                    match key {
                        "BANDWIDTH" => variant.bandwidth = value.parse().ok(),
                        "RESOLUTION" => variant.resolution = Some(value.to_string()),
                        _ => {}
                    }
                }
                pending_variant = Some(variant);
            } else if line.starts_with('#') {
                continue;
            } else if let Some(mut variant) = pending_variant.take() {
                variant.uri = rewrite(line);
                manifest.variants.push(variant);
            } else {
                manifest.segments.push(Segment {
                    uri: rewrite(line),
                    duration: pending_duration.take().unwrap_or_default(),
                });
            }
        }

        if manifest.variants.is_empty() && manifest.segments.is_empty() {
            return Err("playlist lists no variants and no segments".to_string());
        }
        Ok(manifest)
    }

    /// Sum of segment durations, only known for media playlists
    pub fn total_duration(&self) -> Option<f64> {
        if self.segments.is_empty() {
            return None;
        }
        Some(self.segments.iter().map(|segment| segment.duration).sum())
    }
}

/// Splits `KEY=value,KEY="quoted,value"` attribute lists
fn split_attributes(attributes: &str) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();
    let mut start = 0;
    let mut quoted = false;

    for (index, ch) in attributes.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                pairs.extend(parse_attribute(&attributes[start..index]));
                start = index + 1;
            }
            _ => {}
        }
    }
    pairs.extend(parse_attribute(&attributes[start..]));
    pairs
}

fn parse_attribute(pair: &str) -> Option<(&str, &str)> {
    let (key, value) = pair.split_once('=')?;
    Some((key.trim(), value.trim().trim_matches('"')))
}

/// A streaming client able to parse manifests and fetch segments
#[async_trait]
pub trait StreamClient: Send + Sync {
    /// Starts loading the manifest at `url`
    async fn load_source(&mut self, url: &str);

    /// Next event of the current load, `None` when the client has nothing pending
    async fn next_event(&mut self) -> Option<StreamEvent>;

    /// Restarts loading after a network error
    async fn start_load(&mut self);

    /// Recovers from a media error without reloading the manifest
    async fn recover_media_error(&mut self);

    /// Releases everything the client holds
    fn destroy(&mut self);
}

/// Creates one streaming client per load
pub trait StreamClientFactory: Send + Sync {
    fn create(&self, headers: &StreamHeaders, rewriter: Option<SegmentRewriter>)
    -> Box<dyn StreamClient>;
}

/// Manifest client over plain HTTP
pub struct HttpManifestClient {
    client: reqwest::Client,
    headers: StreamHeaders,
    rewriter: Option<SegmentRewriter>,
    url: Option<String>,
    pending: bool,
    /// Re-announce the parsed manifest without fetching it again
    replay: bool,
    manifest: Option<Manifest>,
}

impl HttpManifestClient {
    pub fn new(
        client: reqwest::Client,
        headers: StreamHeaders,
        rewriter: Option<SegmentRewriter>,
    ) -> Self {
        Self {
            client,
            headers,
            rewriter,
            url: None,
            pending: false,
            replay: false,
            manifest: None,
        }
    }

    /// The last parsed manifest
    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let fetch_failed = |reason: String| Error::ManifestFetchFailed {
            url: url.to_string(),
            reason,
        };

        let mut request = self.client.get(url).header(
            USER_AGENT_HEADER,
            self.headers.user_agent.as_deref().unwrap_or(USER_AGENT),
        );
        if let Some(referer) = &self.headers.referer {
            request = request.header(REFERER, referer);
        }

        let response = request
            .send()
            .await
            .map_err(|e| fetch_failed(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_failed(format!("HTTP {status}")));
        }
        response.text().await.map_err(|e| fetch_failed(e.to_string()))
    }

    fn parse(&self, url: &str, text: &str) -> Result<Manifest> {
        Manifest::parse(text, |uri| match &self.rewriter {
            Some(rewriter) => rewriter.rewrite(uri),
            None => uri.to_string(),
        })
        .map_err(|reason| Error::ManifestParseError {
            url: url.to_string(),
            reason,
        })
    }
}

#[async_trait]
impl StreamClient for HttpManifestClient {
    async fn load_source(&mut self, url: &str) {
        self.url = Some(url.to_string());
        self.manifest = None;
        self.replay = false;
        self.pending = true;
    }

    async fn next_event(&mut self) -> Option<StreamEvent> {
        if self.replay {
            self.replay = false;
            if let Some(manifest) = &self.manifest {
                return Some(StreamEvent::ManifestParsed(manifest.clone()));
            }
        }
        if !self.pending {
            return None;
        }
        self.pending = false;
        let url = self.url.clone()?;

        let result = match self.fetch(&url).await {
            Ok(text) => self.parse(&url, &text),
            Err(err) => Err(err),
        };
        match result {
            Ok(manifest) => {
                info!(
                    "Manifest parsed: {} variants, {} segments",
                    manifest.variants.len(),
                    manifest.segments.len()
                );
                self.manifest = Some(manifest.clone());
                Some(StreamEvent::ManifestParsed(manifest))
            }
            // Like any HLS player, an unusable playlist is a network-class fault
            Err(err) => Some(StreamEvent::Error {
                kind: StreamErrorKind::Network,
                fatal: true,
                details: err.to_string(),
            }),
        }
    }

    async fn start_load(&mut self) {
        self.pending = self.url.is_some();
    }

    async fn recover_media_error(&mut self) {
        debug!("Recovering media error");
        // The playlist is kept; a fetch still in flight stays pending
        self.replay = self.manifest.is_some();
    }

    fn destroy(&mut self) {
        self.url = None;
        self.manifest = None;
        self.pending = false;
        self.replay = false;
    }
}

/// Factory of [`HttpManifestClient`]s sharing one connection pool
#[derive(Debug, Clone, Default)]
pub struct HttpStreamClientFactory {
    client: reqwest::Client,
}

impl HttpStreamClientFactory {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl StreamClientFactory for HttpStreamClientFactory {
    fn create(
        &self,
        headers: &StreamHeaders,
        rewriter: Option<SegmentRewriter>,
    ) -> Box<dyn StreamClient> {
        Box::new(HttpManifestClient::new(
            self.client.clone(),
            headers.clone(),
            rewriter,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "#EXTM3U\n\
        #EXT-X-STREAM-INF:BANDWIDTH=1280000,CODECS=\"avc1.4d401f,mp4a.40.2\",RESOLUTION=1280x720\n\
        720p/index.m3u8\n\
        #EXT-X-STREAM-INF:BANDWIDTH=640000\n\
        360p/index.m3u8\n";

    const MEDIA: &str = "#EXTM3U\n\
        #EXT-X-VERSION:3\n\
        #EXT-X-TARGETDURATION:6\n\
        #EXTINF:6.0,\n\
        seg-0.ts\n\
        #EXTINF:4.5,title\n\
        seg-1.ts\n\
        #EXT-X-ENDLIST\n";

    #[test]
    fn test_parse_master_playlist() {
        let manifest = Manifest::parse(MASTER, str::to_string).unwrap();

        assert_eq!(manifest.variants.len(), 2);
        assert_eq!(manifest.variants[0].bandwidth, Some(1_280_000));
        assert_eq!(manifest.variants[0].resolution.as_deref(), Some("1280x720"));
        assert_eq!(manifest.variants[1].uri, "360p/index.m3u8");
        assert_eq!(manifest.total_duration(), None);
    }

    #[test]
    fn test_parse_media_playlist_rewrites_uris() {
        let manifest = Manifest::parse(MEDIA, |uri| format!("proxied/{uri}")).unwrap();

        assert_eq!(manifest.target_duration, Some(6.0));
        assert_eq!(manifest.segments.len(), 2);
        assert_eq!(manifest.segments[0].uri, "proxied/seg-0.ts");
        assert_eq!(manifest.total_duration(), Some(10.5));
    }

    #[test]
    fn test_parse_rejects_non_playlists() {
        assert!(Manifest::parse("<html></html>", str::to_string).is_err());
        assert!(Manifest::parse("#EXTM3U\n#EXT-X-VERSION:3\n", str::to_string).is_err());
        assert!(Manifest::parse("#EXTM3U\n#EXTINF:abc,\nseg.ts\n", str::to_string).is_err());
    }

    #[tokio::test]
    async fn test_idle_client_reports_nothing() {
        let mut client = HttpManifestClient::new(
            reqwest::Client::new(),
            StreamHeaders::default(),
            None,
        );
        assert_eq!(client.next_event().await, None);

        client.start_load().await;
        assert_eq!(client.next_event().await, None);
    }

    #[tokio::test]
    async fn test_media_recovery_keeps_the_parsed_manifest() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/a.m3u8", listener.local_addr().unwrap());
        drop(listener);

        let mut client = HttpManifestClient::new(
            reqwest::Client::new(),
            StreamHeaders::default(),
            None,
        );
        client.url = Some(url);
        client.manifest = Some(Manifest::parse(MEDIA, str::to_string).unwrap());

        // The host is gone, so any refetch would surface as a network error
        client.recover_media_error().await;
        match client.next_event().await {
            Some(StreamEvent::ManifestParsed(manifest)) => assert_eq!(manifest.segments.len(), 2),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(client.next_event().await, None);
    }

    #[tokio::test]
    async fn test_unreachable_manifest_is_a_fatal_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/a.m3u8", listener.local_addr().unwrap());
        drop(listener);

        let mut client = HttpManifestClient::new(
            reqwest::Client::new(),
            StreamHeaders::default(),
            None,
        );
        client.load_source(&url).await;

        match client.next_event().await {
            Some(StreamEvent::Error { kind, fatal, .. }) => {
                assert_eq!(kind, StreamErrorKind::Network);
                assert!(fatal);
            }
            other => panic!("unexpected event {other:?}"),
        }
        client.destroy();
        assert_eq!(client.next_event().await, None);
    }
}

//! Proxied request construction and segment URL rewriting
//!
//! The room server exposes an endpoint that fetches arbitrary URLs with the
//! upstream `User-Agent`/`Referer` supplied as query parameters. Segment
//! requests of an adaptive stream cannot carry those headers themselves, so
//! every one of them is routed through that endpoint.

use crate::{
    config::{PROXY_SUBTITLE_PATH, PROXY_VIDEO_PATH},
    error::{Error, Result},
    protocol::StreamHeaders,
};
use log::{debug, warn};
use url::Url;

/// Which proxy endpoint a request goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    Video,
    Subtitle,
}

impl ProxyKind {
    fn path(self) -> &'static str {
        match self {
            ProxyKind::Video => PROXY_VIDEO_PATH,
            ProxyKind::Subtitle => PROXY_SUBTITLE_PATH,
        }
    }
}

/// The proxying endpoint of the room server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    base: Url,
}

impl ProxyEndpoint {
    /// Creates the endpoint from the room server's base URL
    pub fn new(server_url: &str) -> Result<Self> {
        let base = Url::parse(server_url).map_err(|source| Error::InvalidUrl {
            url: server_url.to_string(),
            source,
        })?;
        Ok(Self { base })
    }

    /// Host the proxy is served from
    pub fn host(&self) -> Option<&str> {
        self.base.host_str()
    }

    /// Builds the proxied form of `url` with the upstream headers as query parameters
    pub fn build_proxy_url(&self, url: &str, headers: &StreamHeaders, kind: ProxyKind) -> String {
        let mut proxied = self.base.clone();
        proxied.set_path(kind.path());
        proxied.set_query(None);
        {
            let mut query = proxied.query_pairs_mut();
            query.append_pair("url", url);
            if let Some(user_agent) = &headers.user_agent {
                query.append_pair("user_agent", user_agent);
            }
            if let Some(referer) = &headers.referer {
                query.append_pair("referer", referer);
            }
        }
        proxied.to_string()
    }
}

/// Rewrites every segment request of one adaptive load into a proxied request
#[derive(Debug, Clone)]
pub struct SegmentRewriter {
    manifest_url: String,
    headers: StreamHeaders,
    proxy: ProxyEndpoint,
}

impl SegmentRewriter {
    /// `manifest_url` is the original, unproxied manifest location
    pub fn new(manifest_url: &str, headers: StreamHeaders, proxy: ProxyEndpoint) -> Self {
        Self {
            manifest_url: manifest_url.to_string(),
            headers,
            proxy,
        }
    }

    /// Maps a request URL as found in a manifest to the URL actually fetched
    pub fn rewrite(&self, request: &str) -> String {
        if request.contains(PROXY_VIDEO_PATH) {
            return request.to_string();
        }

        match self.resolve_target(request) {
            Ok(target) => {
                debug!("Segment {request} -> {target}");
                self.proxy
                    .build_proxy_url(&target, &self.headers, ProxyKind::Video)
            }
            Err(err) => {
                warn!("{err}, proxying the raw request");
                self.proxy
                    .build_proxy_url(request, &self.headers, ProxyKind::Video)
            }
        }
    }

    fn resolve_target(&self, request: &str) -> Result<String> {
        let manifest = Url::parse(&self.manifest_url).map_err(|source| Error::InvalidUrl {
            url: self.manifest_url.clone(),
            source,
        })?;

        if !request.starts_with("http") {
            if request.starts_with('/') {
                return Ok(format!("{}{request}", manifest.origin().ascii_serialization()));
            }
            return Ok(format!("{}{request}", self.manifest_base()));
        }

        let absolute = Url::parse(request).map_err(|source| Error::InvalidUrl {
            url: request.to_string(),
            source,
        })?;
        // A request aimed back at the proxy host lost its upstream origin during resolution
        if absolute.host_str().is_some() && absolute.host_str() == self.proxy.host() {
            let filename = absolute
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .unwrap_or_default();
            let query = absolute
                .query()
                .map(|query| format!("?{query}"))
                .unwrap_or_default();
            return Ok(format!("{}{filename}{query}", self.manifest_base()));
        }

        Ok(request.to_string())
    }

    /// Manifest URL up to and including its last `/`
    fn manifest_base(&self) -> &str {
        match self.manifest_url.rfind('/') {
            Some(index) => &self.manifest_url[..=index],
            None => &self.manifest_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> StreamHeaders {
        StreamHeaders {
            user_agent: Some("Agent/1.0".to_string()),
            referer: Some("https://site.example/".to_string()),
        }
    }

    fn rewriter() -> SegmentRewriter {
        SegmentRewriter::new(
            "https://cdn.example.com/live/master.m3u8",
            headers(),
            ProxyEndpoint::new("http://party.local:3310").unwrap(),
        )
    }

    fn proxied_target(proxied: &str) -> String {
        let url = Url::parse(proxied).unwrap();
        url.query_pairs()
            .find(|(key, _)| key == "url")
            .map(|(_, value)| value.into_owned())
            .unwrap()
    }

    #[test]
    fn test_build_proxy_url_encodes_headers() {
        let proxy = ProxyEndpoint::new("http://party.local:3310/").unwrap();
        let url = proxy.build_proxy_url("https://x/a b.mp4", &headers(), ProxyKind::Video);

        assert!(url.starts_with("http://party.local:3310/api/v1/proxy/video?"));
        assert!(url.contains("url=https%3A%2F%2Fx%2Fa+b.mp4"));
        assert!(url.contains("user_agent=Agent%2F1.0"));
        assert!(url.contains("referer=https%3A%2F%2Fsite.example%2F"));
    }

    #[test]
    fn test_subtitle_endpoint_without_headers() {
        let proxy = ProxyEndpoint::new("https://party.example").unwrap();
        let url = proxy.build_proxy_url(
            "https://x/subs.vtt",
            &StreamHeaders::default(),
            ProxyKind::Subtitle,
        );
        assert_eq!(
            url,
            "https://party.example/api/v1/proxy/subtitle?url=https%3A%2F%2Fx%2Fsubs.vtt"
        );
    }

    #[test]
    fn test_already_proxied_requests_are_untouched() {
        let request = "http://party.local:3310/api/v1/proxy/video?url=abc";
        assert_eq!(rewriter().rewrite(request), request);
    }

    #[test]
    fn test_relative_requests_resolve_against_manifest() {
        let rewriter = rewriter();
        assert_eq!(
            proxied_target(&rewriter.rewrite("seg-001.ts")),
            "https://cdn.example.com/live/seg-001.ts"
        );
        assert_eq!(
            proxied_target(&rewriter.rewrite("/keys/k.key")),
            "https://cdn.example.com/keys/k.key"
        );
    }

    #[test]
    fn test_requests_aliasing_the_proxy_host_are_rebased() {
        let rewritten = rewriter().rewrite("http://party.local:3310/some/where/seg-9.ts?sig=1");
        assert_eq!(
            proxied_target(&rewritten),
            "https://cdn.example.com/live/seg-9.ts?sig=1"
        );
    }

    #[test]
    fn test_foreign_absolute_requests_are_proxied_unchanged() {
        let rewritten = rewriter().rewrite("https://other.example/seg.ts");
        assert_eq!(proxied_target(&rewritten), "https://other.example/seg.ts");
        assert!(rewritten.contains("user_agent=Agent%2F1.0"));
    }
}

//! Stream format classification

use std::fmt;

/// Container or protocol of a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFormat {
    /// Adaptive HLS manifest
    Hls,
    Mp4,
    Webm,
    /// Nothing known, let the media surface figure it out
    Native,
    /// A caller-supplied hint this crate has no special handling for
    Other(String),
}

impl StreamFormat {
    /// Whether the source must go through the manifest client
    pub fn is_adaptive(&self) -> bool {
        matches!(self, StreamFormat::Hls)
    }

    /// MIME type announced to renderers
    pub fn mime_type(&self) -> &'static str {
        match self {
            StreamFormat::Hls => "application/vnd.apple.mpegurl",
            StreamFormat::Mp4 => "video/mp4",
            StreamFormat::Webm => "video/webm",
            StreamFormat::Native | StreamFormat::Other(_) => "video/*",
        }
    }
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamFormat::Hls => write!(f, "hls"),
            StreamFormat::Mp4 => write!(f, "mp4"),
            StreamFormat::Webm => write!(f, "webm"),
            StreamFormat::Native => write!(f, "native"),
            StreamFormat::Other(hint) => write!(f, "{hint}"),
        }
    }
}

/// Classifies a source by URL keywords, then by the caller's hint
pub fn detect_format(url: &str, hint: Option<&str>) -> StreamFormat {
    let url = url.to_lowercase();
    let hint = hint.map(|hint| hint.trim().to_lowercase()).filter(|hint| !hint.is_empty());
    let hinted = |name: &str| hint.as_deref() == Some(name);

    if url.contains(".m3u8") || url.contains("/hls/") || hinted("hls") {
        StreamFormat::Hls
    } else if url.contains(".mp4") || url.contains("/mp4/") || hinted("mp4") {
        StreamFormat::Mp4
    } else if url.contains(".webm") || hinted("webm") {
        StreamFormat::Webm
    } else {
        match hint {
            Some(hint) if hint == "native" => StreamFormat::Native,
            Some(hint) => StreamFormat::Other(hint),
            None => StreamFormat::Native,
        }
    }
}

/// Classifies a probe's declared content type, `None` when it says nothing useful
pub fn classify_content_type(content_type: &str) -> Option<StreamFormat> {
    let content_type = content_type.to_lowercase();
    if content_type.contains("mpegurl") || content_type.contains("mpeg") {
        Some(StreamFormat::Hls)
    } else if content_type.contains("mp4") {
        Some(StreamFormat::Mp4)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_keywords() {
        assert_eq!(detect_format("https://x/a.m3u8", None), StreamFormat::Hls);
        assert_eq!(detect_format("https://x/hls/master", None), StreamFormat::Hls);
        assert_eq!(detect_format("https://x/Movie.MP4?t=1", None), StreamFormat::Mp4);
        assert_eq!(detect_format("https://x/clip.webm", None), StreamFormat::Webm);
        assert_eq!(detect_format("https://x/stream", None), StreamFormat::Native);
    }

    #[test]
    fn test_url_wins_over_hint() {
        assert_eq!(detect_format("https://x/a.m3u8", Some("mp4")), StreamFormat::Hls);
        assert_eq!(detect_format("https://x/play", Some("hls")), StreamFormat::Hls);
        assert_eq!(
            detect_format("https://x/play", Some("dash")),
            StreamFormat::Other("dash".to_string())
        );
    }

    #[test]
    fn test_content_type_classification() {
        assert_eq!(
            classify_content_type("application/vnd.apple.mpegurl"),
            Some(StreamFormat::Hls)
        );
        assert_eq!(
            classify_content_type("audio/x-mpegURL; charset=utf-8"),
            Some(StreamFormat::Hls)
        );
        assert_eq!(classify_content_type("video/mp4"), Some(StreamFormat::Mp4));
        assert_eq!(classify_content_type("text/html"), None);
        assert_eq!(classify_content_type(""), None);
    }
}

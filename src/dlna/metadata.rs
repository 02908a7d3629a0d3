//! DIDL-Lite metadata and SetAVTransportURI payloads

use crate::{
    config::{DEFAULT_DLNA_VIDEO_TITLE, DLNA_INSTANCE_ID},
    error::{Error, Result},
    resolver::detect_format,
};
use askama::Template;
use quick_xml::escape::escape;

/// A source as announced to a renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub title: Option<String>,
    pub video_uri: String,
    pub subtitle_uri: Option<String>,
}

struct Caption {
    uri: String,
    kind: String,
}

#[derive(Template)]
#[template(
    ext = "xml",
    source = r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/" xmlns:sec="http://www.sec.co.kr/"><item id="0" parentID="-1" restricted="false"><dc:title>{{ title }}</dc:title><upnp:class>object.item.videoItem.movie</upnp:class><res protocolInfo="http-get:*:{{ video_type }}:*">{{ video_uri }}</res>{% if let Some(caption) = caption %}<res protocolInfo="http-get:*:text/{{ caption.kind }}:*">{{ caption.uri }}</res><sec:CaptionInfoEx sec:type="{{ caption.kind }}">{{ caption.uri }}</sec:CaptionInfoEx>{% endif %}</item></DIDL-Lite>"#
)]
struct DidlLiteTemplate<'a> {
    title: &'a str,
    video_uri: &'a str,
    video_type: &'a str,
    caption: Option<Caption>,
}

#[derive(Template)]
#[template(
    ext = "xml",
    source = "<InstanceID>{{ instance_id }}</InstanceID><CurrentURI>{{ current_uri }}</CurrentURI><CurrentURIMetaData>{{ current_uri_metadata|safe }}</CurrentURIMetaData>"
)]
struct SetAvTransportUriTemplate<'a> {
    instance_id: u32,
    current_uri: &'a str,
    current_uri_metadata: &'a str,
}

fn render_error(template_name: &str, source: askama::Error) -> Error {
    Error::TemplateRenderError {
        template_name: template_name.to_string(),
        source: source.into(),
    }
}

/// Subtitle kind from the URL's extension, `srt` when there is none
fn caption_kind(uri: &str) -> String {
    let path = uri.split(['?', '#']).next().unwrap_or(uri);
    path.rsplit_once('/')
        .map_or(path, |(_, file)| file)
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| matches!(ext.as_str(), "srt" | "vtt" | "ass" | "ssa" | "smi"))
        .unwrap_or_else(|| "srt".to_string())
}

/// Builds the attribute-escaped DIDL-Lite description of `item`
pub fn build_metadata(item: &MediaItem) -> Result<String> {
    let template = DidlLiteTemplate {
        title: item.title.as_deref().unwrap_or(DEFAULT_DLNA_VIDEO_TITLE),
        video_uri: &item.video_uri,
        video_type: detect_format(&item.video_uri, None).mime_type(),
        caption: item.subtitle_uri.as_ref().map(|uri| Caption {
            kind: caption_kind(uri),
            uri: uri.clone(),
        }),
    };
    let metadata = template
        .render()
        .map_err(|e| render_error("didl_lite", e))?;
    Ok(escape(metadata.as_str()).into_owned())
}

/// Builds the SetAVTransportURI payload for `item`
pub fn build_setavtransporturi_payload(item: &MediaItem) -> Result<String> {
    let metadata = build_metadata(item)?;
    SetAvTransportUriTemplate {
        instance_id: DLNA_INSTANCE_ID,
        current_uri: &item.video_uri,
        current_uri_metadata: &metadata,
    }
    .render()
    .map_err(|e| render_error("set_av_transport_uri", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(subtitle_uri: Option<&str>) -> MediaItem {
        MediaItem {
            title: Some("Night of the Crab".to_string()),
            video_uri: "http://192.168.1.100:3310/api/v1/proxy/video?url=a.mp4&referer=x".to_string(),
            subtitle_uri: subtitle_uri.map(str::to_string),
        }
    }

    #[test]
    fn test_metadata_without_subtitles() {
        let metadata = build_metadata(&item(None)).unwrap();

        assert!(metadata.contains("&lt;DIDL-Lite"));
        assert!(!metadata.contains("<DIDL-Lite"));
        assert!(metadata.contains("Night of the Crab"));
        assert!(metadata.contains("object.item.videoItem.movie"));
        assert!(metadata.contains("video/mp4"));
        assert!(!metadata.contains("CaptionInfoEx"));
    }

    #[test]
    fn test_metadata_with_subtitles() {
        let metadata = build_metadata(&item(Some("https://subs.example/ep1.vtt?sig=1"))).unwrap();

        assert!(metadata.contains("CaptionInfoEx"));
        assert!(metadata.contains("text/vtt"));
        assert!(metadata.contains("subs.example/ep1.vtt"));
    }

    #[test]
    fn test_default_title() {
        let mut untitled = item(None);
        untitled.title = None;
        let metadata = build_metadata(&untitled).unwrap();
        assert!(metadata.contains(DEFAULT_DLNA_VIDEO_TITLE));
    }

    #[test]
    fn test_setavtransporturi_payload() {
        let payload = build_setavtransporturi_payload(&item(None)).unwrap();

        assert!(payload.starts_with("<InstanceID>0</InstanceID><CurrentURI>"));
        assert!(payload.contains("url=a.mp4&#38;referer=x</CurrentURI>"));
        assert!(payload.contains("<CurrentURIMetaData>&lt;DIDL-Lite"));
    }

    #[test]
    fn test_caption_kind() {
        assert_eq!(caption_kind("https://x/a.VTT"), "vtt");
        assert_eq!(caption_kind("https://x/subs?id=3"), "srt");
        assert_eq!(caption_kind("https://x.y/sub"), "srt");
    }
}

//! Stream resolution for crab-party
//!
//! This module decides how a source is fetched and gets it into the media surface:
//! - Format detection from a content-type probe and URL heuristics
//! - Proxied URL construction and segment rewriting
//! - The adaptive manifest client
//! - Loading with retries and proxy escalation

pub mod format;
pub mod hls;
pub mod loader;
pub mod probe;
pub mod proxy;

pub use format::{StreamFormat, classify_content_type, detect_format};
pub use hls::{
    HttpManifestClient, HttpStreamClientFactory, Manifest, Segment, StreamClient,
    StreamClientFactory, StreamErrorKind, StreamEvent, Variant,
};
pub use loader::{ResolverConfig, StreamResolver};
pub use probe::{HttpProbe, SourceProbe};
pub use proxy::{ProxyEndpoint, ProxyKind, SegmentRewriter};

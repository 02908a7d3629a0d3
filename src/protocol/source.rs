//! Source descriptors and upstream header normalization
//!
//! A source descriptor may carry its `User-Agent`/`Referer` either as top-level
//! fields or nested in a headers map with arbitrary key casing. Everything past
//! this module only ever sees the canonical [`StreamHeaders`].

use std::collections::HashMap;

/// Upstream request headers a source needs in order to be fetched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamHeaders {
    /// `User-Agent` expected by the upstream host
    pub user_agent: Option<String>,
    /// `Referer` expected by the upstream host
    pub referer: Option<String>,
}

impl StreamHeaders {
    /// Builds canonical headers from top-level fields and a headers map.
    ///
    /// Top-level values win over map entries; map keys are matched case-insensitively.
    pub fn normalize(
        user_agent: Option<&str>,
        referer: Option<&str>,
        headers: Option<&HashMap<String, String>>,
    ) -> Self {
        let from_map = |name: &str| {
            headers.and_then(|map| {
                map.iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value.as_str())
            })
        };

        Self {
            user_agent: non_empty(user_agent).or_else(|| non_empty(from_map("User-Agent"))),
            referer: non_empty(referer).or_else(|| non_empty(from_map("Referer"))),
        }
    }

    /// Returns true when neither header is set
    pub fn is_empty(&self) -> bool {
        self.user_agent.is_none() && self.referer.is_none()
    }
}

/// The source currently owned by the synchronization engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveSource {
    /// Source URL, compared by exact string equality for deduplication
    pub url: String,
    /// Caller-supplied format hint (`hls`, `mp4`, ...)
    pub format: Option<String>,
    /// Canonical upstream headers
    pub headers: StreamHeaders,
    /// Optional subtitle URL
    pub subtitle_url: Option<String>,
    /// Display title
    pub title: Option<String>,
    /// Duration in seconds, when the room knows it
    pub duration: Option<f64>,
}

/// Trims a string and maps empty values to `None`
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

use crate::devices::RenderSpec;
use std::fmt;

/// Errors that can happen inside crab-party
#[derive(Debug)]
pub enum Error {
    // Real-time transport errors
    /// Failed to open the WebSocket channel to the room server
    WebSocketConnectFailed {
        /// The endpoint that was dialed
        endpoint: String,
        /// The underlying WebSocket error
        source: tokio_tungstenite::tungstenite::Error,
    },
    /// The reconnection budget was exhausted and the session is over
    ReconnectExhausted {
        /// The endpoint that could not be reached
        endpoint: String,
        /// Number of reconnection attempts that were made
        attempts: u32,
    },
    /// Failed to serialize an outbound message
    MessageEncodeFailed {
        /// The message type being encoded
        message_type: String,
        /// The underlying serialization error
        source: serde_json::Error,
    },
    /// Failed to deserialize an inbound message
    MessageDecodeFailed {
        /// The message type being decoded, if it could be read
        message_type: String,
        /// The underlying deserialization error
        source: serde_json::Error,
    },

    // Stream resolution errors
    /// A URL could not be parsed
    InvalidUrl {
        /// The URL that failed to parse
        url: String,
        /// The underlying parse error
        source: url::ParseError,
    },
    /// The content-type probe of a source failed
    ProbeFailed {
        /// The URL that was probed
        url: String,
        /// Why the probe failed
        reason: String,
    },
    /// Failed to download an adaptive manifest
    ManifestFetchFailed {
        /// The manifest URL
        url: String,
        /// Why the download failed
        reason: String,
    },
    /// An adaptive manifest could not be parsed
    ManifestParseError {
        /// The manifest URL
        url: String,
        /// The parsing error message
        reason: String,
    },

    /// The shared HTTP client could not be built
    HttpClientBuildFailed {
        /// The underlying reqwest error
        source: reqwest::Error,
    },

    // Device discovery and management errors
    /// Failed to discover DLNA devices on the network
    DeviceDiscoveryFailed {
        /// The underlying UPnP error
        source: rupnp::Error,
        /// Additional context about the discovery attempt
        context: String,
    },
    /// Failed to parse a device URL
    DeviceUrlParseError {
        /// The invalid URL that failed to parse
        url: String,
        /// Additional context about why parsing failed
        reason: String,
    },
    /// Failed to create a device from URL
    DeviceCreationError {
        /// The URL that failed to create a device
        url: String,
        /// The underlying UPnP error
        source: rupnp::Error,
    },
    /// The specified render device was not found
    RenderNotFound {
        /// The render specification that was searched for
        spec: RenderSpec,
        /// Additional context about the search
        context: String,
    },

    // DLNA protocol errors
    /// Failed to execute a DLNA action
    DlnaActionFailed {
        /// The action that failed
        action: String,
        /// The underlying UPnP error
        source: rupnp::Error,
    },
    /// Failed to parse response from DLNA device
    DlnaResponseParseError {
        /// The action that generated the response
        action: String,
        /// The parsing error message
        error: String,
    },
    /// Template rendering encountered an error
    TemplateRenderError {
        /// The name of the template that failed to render
        template_name: String,
        /// The underlying template error
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // Keyboard input errors
    /// Keyboard input handling encountered an error
    KeyboardError {
        /// The error message
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::WebSocketConnectFailed { endpoint, source } => {
                write!(f, "Failed to connect to '{endpoint}': {source}")
            }
            Error::ReconnectExhausted { endpoint, attempts } => write!(
                f,
                "Gave up reconnecting to '{endpoint}' after {attempts} attempts"
            ),
            Error::MessageEncodeFailed {
                message_type,
                source,
            } => {
                write!(f, "Failed to encode '{message_type}' message: {source}")
            }
            Error::MessageDecodeFailed {
                message_type,
                source,
            } => {
                write!(f, "Failed to decode '{message_type}' message: {source}")
            }
            Error::InvalidUrl { url, source } => {
                write!(f, "Invalid URL '{url}': {source}")
            }
            Error::ProbeFailed { url, reason } => {
                write!(f, "Failed to probe '{url}': {reason}")
            }
            Error::ManifestFetchFailed { url, reason } => {
                write!(f, "Failed to fetch manifest '{url}': {reason}")
            }
            Error::ManifestParseError { url, reason } => {
                write!(f, "Failed to parse manifest '{url}': {reason}")
            }
            Error::HttpClientBuildFailed { source } => {
                write!(f, "Failed to build HTTP client: {source}")
            }
            Error::DeviceDiscoveryFailed { source, context } => {
                write!(f, "Failed to discover devices: {source} ({context})")
            }
            Error::DeviceUrlParseError { url, reason } => {
                write!(f, "Failed to parse URL '{url}': {reason}")
            }
            Error::DeviceCreationError { url, source } => {
                write!(f, "Failed to create device from '{url}': {source}")
            }
            Error::RenderNotFound { spec, context } => match spec {
                RenderSpec::Location(device_url) => {
                    write!(f, "No render found at '{device_url}': {context}")
                }
                RenderSpec::Query(timeout, device_query) => write!(
                    f,
                    "No render found within {timeout} seconds with query '{device_query}': {context}"
                ),
                RenderSpec::First(timeout) => {
                    write!(f, "No render found within {timeout} seconds: {context}")
                }
            },
            Error::DlnaActionFailed { action, source } => {
                write!(f, "Failed to execute DLNA action '{action}': {source}")
            }
            Error::DlnaResponseParseError { action, error } => {
                write!(
                    f,
                    "Failed to parse response from action '{action}': {error}"
                )
            }
            Error::TemplateRenderError {
                template_name,
                source,
            } => {
                write!(f, "Failed to render template '{template_name}': {source}")
            }
            Error::KeyboardError { message } => {
                write!(f, "Keyboard input error: {message}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::WebSocketConnectFailed { source, .. } => Some(source),
            Error::MessageEncodeFailed { source, .. } => Some(source),
            Error::MessageDecodeFailed { source, .. } => Some(source),
            Error::InvalidUrl { source, .. } => Some(source),
            Error::HttpClientBuildFailed { source } => Some(source),
            Error::DeviceDiscoveryFailed { source, .. } => Some(source),
            Error::DeviceCreationError { source, .. } => Some(source),
            Error::DlnaActionFailed { source, .. } => Some(source),
            Error::TemplateRenderError { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<ssdp_client::Error> for Error {
    fn from(err: ssdp_client::Error) -> Self {
        Error::DeviceDiscoveryFailed {
            source: rupnp::Error::SSDPError(err),
            context: "SSDP discovery failed".to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! Configuration constants for crab-party
//!
//! This module contains all hardcoded constants used throughout the application,
//! organized by functionality and following Rust naming conventions.

// =============================================================================
// Transport Constants
// =============================================================================

/// Maximum number of reconnection attempts after an unexpected close
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Fixed delay between two reconnection attempts in milliseconds
pub const RECONNECT_DELAY_MS: u64 = 3000;

/// Interval between two heartbeat pings in milliseconds
pub const HEARTBEAT_INTERVAL_MS: u64 = 5000;

/// Age after which an unanswered ping is forgotten, in milliseconds
pub const PING_EXPIRY_MS: u64 = 10_000;

/// Field carrying the ping identifier in `ping` and `pong` messages
pub const PING_ID_FIELD: &str = "_ping_id";

/// Path template of the room WebSocket endpoint, `{room}` is replaced by the room id
pub const ROOM_WS_PATH: &str = "/wss/watch_party/{room}";

// =============================================================================
// Synchronization Constants
// =============================================================================

/// Drift above which a peer sync event triggers a seek, in seconds
pub const DRIFT_THRESHOLD_SECS: f64 = 0.5;

/// Upper bound for waiting on seek completion after a peer sync or seek
pub const SEEK_SETTLE_TIMEOUT_MS: u64 = 300;

/// Upper bound for waiting on seek completion during a buffer correction
pub const BUFFER_SEEK_SETTLE_TIMEOUT_MS: u64 = 500;

/// Smallest playback rate delta worth applying
pub const RATE_TOLERANCE: f64 = 0.01;

/// Normal playback rate
pub const NORMAL_PLAYBACK_RATE: f64 = 1.0;

/// Interval of authoritative state polling while waiting for user interaction
pub const INTERACTION_POLL_INTERVAL_MS: u64 = 1000;

/// Upper bound for a single play attempt
pub const PLAY_TIMEOUT_MS: u64 = 3000;

// =============================================================================
// Stream Loading Constants
// =============================================================================

/// Maximum number of in-place retries after a fatal network error
pub const MAX_NETWORK_RETRIES: u32 = 3;

/// Time given to a progressive source to become playable
pub const PROGRESSIVE_READY_TIMEOUT_MS: u64 = 5000;

/// Time given to an adaptive manifest to be fetched and parsed
pub const MANIFEST_TIMEOUT_MS: u64 = 15_000;

/// Time given to the content-type probe
pub const PROBE_TIMEOUT_MS: u64 = 5000;

/// Proxy endpoint used for video and segment requests
pub const PROXY_VIDEO_PATH: &str = "/api/v1/proxy/video";

/// Proxy endpoint used for subtitle requests
pub const PROXY_SUBTITLE_PATH: &str = "/api/v1/proxy/subtitle";

/// User agent string for the client's own HTTP requests
pub const USER_AGENT: &str = concat!("crab-party/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Subtitle Constants
// =============================================================================

/// Default language code of the subtitle track
pub const DEFAULT_SUBTITLE_LANG: &str = "tr";

/// Default label of the subtitle track
pub const DEFAULT_SUBTITLE_LABEL: &str = "Türkçe";

// =============================================================================
// Room Constants
// =============================================================================

/// Avatar used when none is given on the command line
pub const DEFAULT_AVATAR: &str = "🎬";

/// Prefix of the generated guest name
pub const GUEST_NAME_PREFIX: &str = "Guest";

/// Delay before an autoloaded source is announced, leaving time for the room snapshot
pub const AUTOLOAD_DELAY_MS: u64 = 500;

// =============================================================================
// Logging Constants
// =============================================================================

/// Environment variable name for custom log level
pub const LOG_LEVEL_ENV_VAR: &str = "CRABPARTY_LOG";

// =============================================================================
// Device Discovery Constants
// =============================================================================

/// Default timeout for device discovery in seconds
pub const DEFAULT_DISCOVERY_TIMEOUT: u64 = 5;

/// SSDP search attempts used when discovering renders
pub const SSDP_SEARCH_ATTEMPTS: usize = 3;

/// TTL (Time To Live) for SSDP multicast packets
pub const SSDP_TTL: Option<u32> = Some(3);

// =============================================================================
// DLNA Protocol Constants
// =============================================================================

/// DLNA instance ID used in payloads
pub const DLNA_INSTANCE_ID: u32 = 0;

/// DLNA default playback speed
pub const DLNA_DEFAULT_SPEED: u32 = 1;

/// DLNA action name for setting AV transport URI
pub const DLNA_ACTION_SET_AV_TRANSPORT_URI: &str = "SetAVTransportURI";

/// DLNA action name for play
pub const DLNA_ACTION_PLAY: &str = "Play";

/// DLNA action name for pause
pub const DLNA_ACTION_PAUSE: &str = "Pause";

/// DLNA action name for seek
pub const DLNA_ACTION_SEEK: &str = "Seek";

/// DLNA action name for getting position info
pub const DLNA_ACTION_GET_POSITION_INFO: &str = "GetPositionInfo";

/// DLNA action name for getting transport info
pub const DLNA_ACTION_GET_TRANSPORT_INFO: &str = "GetTransportInfo";

/// Title used in DIDL-Lite metadata when the room did not name the video
pub const DEFAULT_DLNA_VIDEO_TITLE: &str = "crab-party Video";

// =============================================================================
// User-visible Messages
// =============================================================================

/// Shown when the connection is lost and a reconnection is pending
pub const CONNECTION_LOST_MSG: &str = "Connection lost, reconnecting...";

/// Shown when reconnection gave up
pub const CONNECTION_FAILED_MSG: &str = "Could not connect. Please restart the session.";

/// Shown when a source could not be loaded
pub const VIDEO_LOAD_FAILED_MSG: &str = "Video could not be loaded";

/// Shown when a play attempt failed for a reason other than autoplay policy
pub const PLAYBACK_FAILED_MSG: &str = "Playback error";

/// Shown while a buffer correction is running
pub const SYNCHRONIZING_MSG: &str = "Synchronizing...";

/// Shown when a source change is requested without a URL
pub const MISSING_URL_MSG: &str = "Please enter a video URL";

/// Error message when no devices are discovered
pub const NO_DEVICES_DISCOVERED_MSG: &str = "No devices discovered in the network";

/// Log message when no render is specified
pub const RENDER_NOT_FOUND_MSG: &str = "No render specified, selecting first one";

//! CLI argument parsing for crab-party
//!
//! This module contains the CLI argument definitions and how they turn into a
//! session [`Config`].

use crate::config::{
    Config, DEFAULT_AVATAR, DEFAULT_DISCOVERY_TIMEOUT, DEFAULT_SUBTITLE_LABEL,
    DEFAULT_SUBTITLE_LANG, HEARTBEAT_INTERVAL_MS, MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY_MS,
};
use crate::devices::RenderSpec;
use crate::session::VideoRequest;
use clap::{Args, Parser};
use log::LevelFilter;

/// Watch videos together: keeps local playback in sync with a shared room
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Time in seconds to search and discover DLNA renderers
    #[arg(short, long, default_value_t = DEFAULT_DISCOVERY_TIMEOUT)]
    pub timeout: u64,

    /// Log level
    #[arg(long, value_name = "LEVEL", global = true, default_value_t = LevelFilter::Info)]
    pub log_level: LevelFilter,

    /// The command to execute
    #[command(subcommand)]
    pub command: super::Commands,
}

/// List command arguments
#[derive(Args)]
pub struct List;

/// Join command arguments
#[derive(Args)]
pub struct Join {
    /// Base URL of the room server
    #[arg(short, long, default_value = "http://localhost:3310")]
    pub server: String,

    /// Room to join
    #[arg(short, long)]
    pub room: String,

    /// Display name (a guest name is derived from the room when omitted)
    #[arg(short, long)]
    pub username: Option<String>,

    /// Avatar shown next to the display name
    #[arg(long, default_value = DEFAULT_AVATAR)]
    pub avatar: String,

    /// Fetch sources directly instead of through the server's proxy
    #[arg(long)]
    pub no_proxy: bool,

    /// Play on the DLNA renderer at this exact location (no scan, faster)
    #[arg(short, long = "device")]
    pub device_url: Option<String>,

    /// Play on the first DLNA renderer matching this query
    #[arg(short = 'q', long = "query-device")]
    pub device_query: Option<String>,

    /// Play on the first DLNA renderer found
    #[arg(long, conflicts_with_all = ["device_url", "device_query"])]
    pub dlna: bool,

    /// Simulate a player that refuses to start until ENTER is pressed
    #[arg(long)]
    pub autoplay_blocked: bool,

    /// Enable keyboard control (space to pause/resume, arrows to seek, q to quit)
    #[arg(short, long)]
    pub interactive: bool,

    /// Ask the room to play this video once joined
    #[arg(long)]
    pub url: Option<String>,

    /// Title of the video given with --url
    #[arg(long, requires = "url")]
    pub title: Option<String>,

    /// User-Agent the upstream host of --url expects
    #[arg(long, requires = "url")]
    pub user_agent: Option<String>,

    /// Referer the upstream host of --url expects
    #[arg(long, requires = "url")]
    pub referer: Option<String>,

    /// Subtitle of the video given with --url
    #[arg(long, requires = "url")]
    pub subtitle: Option<String>,

    /// Language code of subtitle tracks
    #[arg(long, default_value = DEFAULT_SUBTITLE_LANG)]
    pub subtitle_lang: String,

    /// Label of subtitle tracks
    #[arg(long, default_value = DEFAULT_SUBTITLE_LABEL)]
    pub subtitle_label: String,

    /// Reconnection attempts before giving up
    #[arg(long, default_value_t = MAX_RECONNECT_ATTEMPTS)]
    pub max_reconnect_attempts: u32,

    /// Delay between reconnection attempts in milliseconds
    #[arg(long, default_value_t = RECONNECT_DELAY_MS)]
    pub reconnect_delay: u64,

    /// Heartbeat interval in milliseconds
    #[arg(long, default_value_t = HEARTBEAT_INTERVAL_MS)]
    pub heartbeat_interval: u64,
}

impl Join {
    /// Session configuration for this room
    pub fn build_config(&self, log_level: LevelFilter) -> Config {
        Config::new()
            .with_server_url(&self.server)
            .with_room_id(&self.room)
            .with_username(self.username.clone())
            .with_avatar(&self.avatar)
            .with_proxy_enabled(!self.no_proxy)
            .with_subtitle_language(&self.subtitle_lang, &self.subtitle_label)
            .with_log_level(log_level)
            .with_reconnect(self.max_reconnect_attempts, self.reconnect_delay)
            .with_heartbeat_interval(self.heartbeat_interval)
    }

    /// Renderer to play on, `None` for the built-in virtual player
    pub fn render_spec(&self, discovery_timeout: u64) -> Option<RenderSpec> {
        if let Some(device_url) = &self.device_url {
            Some(RenderSpec::Location(device_url.to_owned()))
        } else if let Some(device_query) = &self.device_query {
            Some(RenderSpec::Query(discovery_timeout, device_query.to_owned()))
        } else if self.dlna {
            Some(RenderSpec::First(discovery_timeout))
        } else {
            None
        }
    }

    /// Source to announce after joining, if one was given
    pub fn autoload(&self) -> Option<VideoRequest> {
        let url = self.url.clone()?;
        Some(VideoRequest {
            url,
            title: self.title.clone(),
            user_agent: self.user_agent.clone(),
            referer: self.referer.clone(),
            subtitle_url: self.subtitle.clone(),
        })
    }
}

/// Probe command arguments
#[derive(Args)]
pub struct Probe {
    /// Source to inspect
    pub url: String,

    /// Base URL of the room server, used for proxied requests
    #[arg(short, long, default_value = "http://localhost:3310")]
    pub server: String,

    /// Check the source directly instead of through the server's proxy
    #[arg(long)]
    pub no_proxy: bool,

    /// Format hint (hls, mp4, webm)
    #[arg(short, long)]
    pub format: Option<String>,

    /// User-Agent the upstream host expects
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Referer the upstream host expects
    #[arg(long)]
    pub referer: Option<String>,
}

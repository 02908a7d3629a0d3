//! crab-party: a watch-party client
//!
//! Joins a room on a watch-party server and keeps a local media surface (a DLNA
//! renderer or the built-in virtual player) in step with everyone else in it.

pub mod cli;
pub mod config;
pub mod devices;
pub mod dlna;
pub mod engine;
pub mod error;
pub mod keyboard;
pub mod media;
pub mod observer;
pub mod protocol;
pub mod resolver;
pub mod session;
pub mod transport;
pub mod utils;

pub use config::Config;
pub use engine::{PlaybackState, SyncEngine};
pub use error::{Error, Result};
pub use observer::{LogObserver, SessionObserver, ToastLevel};
pub use session::{Session, UserCommand, VideoRequest};

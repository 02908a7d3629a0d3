//! DLNA protocol implementation for crab-party
//!
//! This module provides:
//! - AVTransport actions (set URI, play, pause, seek)
//! - DIDL-Lite metadata generation, with subtitle support

pub mod actions;
pub mod metadata;

pub use actions::{pause, play, seek, set_transport_uri};
pub use metadata::{MediaItem, build_metadata, build_setavtransporturi_payload};

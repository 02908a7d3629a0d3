//! Media surfaces for crab-party
//!
//! This module provides:
//! - The [`MediaElement`] port the sync engine drives
//! - A clock-driven [`VirtualPlayer`] for headless sessions
//! - A [`DlnaSurface`] casting the room's source to a renderer

pub mod dlna;
pub mod element;
pub mod virtual_player;

pub use dlna::DlnaSurface;
pub use element::{
    MediaElement, MediaEvent, MediaEventSink, ObservedMediaEvent, PlayError, ReadyState,
    TextTrack,
};
pub use virtual_player::{LoadBehavior, VirtualPlayer};

//! Device discovery and management for crab-party
//!
//! This module provides functionality for discovering DLNA renderers on the
//! network and querying their AVTransport service.

pub mod discovery;
pub mod render;
pub mod types;

pub use render::Render;
pub use types::{PositionInfo, RenderSpec, TransportInfo, TransportState};

//! Real-time transport for crab-party
//!
//! This module provides the duplex channel to the room server:
//! - Connection with bounded, fixed-delay reconnection
//! - Heartbeat pings and round-trip time measurement
//! - Demultiplexing of inbound messages by type

pub mod client;
pub mod heartbeat;
pub mod reconnect;

pub use client::{ConnectionState, HeartbeatDataProvider, MessageHandler, Transport, TransportConfig};
pub use heartbeat::PingTracker;
pub use reconnect::ReconnectPolicy;

//! Utility functions and helpers for crab-party
//!
//! This module provides various utility functions organized by functionality:
//! - Time parsing and formatting for DLNA renderers and display
//! - Retry with backoff for flaky network actions
//! - Text formatting of devices and durations

pub mod formatting;
pub mod network;
pub mod time;

pub use formatting::{format_device_description, format_device_with_service_description, format_duration};
pub use network::retry_with_backoff;
pub use time::{format_dlna_time, parse_dlna_time};

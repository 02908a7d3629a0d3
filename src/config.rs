//! Configuration module for crab-party
//!
//! This module provides configuration constants, default values, and configuration types
//! for the watch-party synchronization client.

mod constants;
mod types;

// Re-export all constants and types
pub use constants::*;
pub use types::*;

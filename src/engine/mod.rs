//! Playback synchronization
//!
//! This module keeps the local media surface converged with the room:
//! - The playback state machine and its guards
//! - Suppression of engine-driven media signals
//! - The published playback clock read by the heartbeat
//! - The [`SyncEngine`] applying snapshots, peer events and corrections

pub mod clock;
pub mod ports;
pub mod state;
pub mod suppression;
pub mod sync;

pub use clock::PlaybackClock;
pub use ports::IntentPort;
pub use state::{PeerSyncDisposition, PlaybackState};
pub use suppression::{SuppressionFlag, SuppressionGuard};
pub use sync::{EngineConfig, SyncEngine};

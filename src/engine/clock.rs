//! Published playback clock
//!
//! The engine publishes where playback is whenever it changes; the heartbeat
//! reads the latest value from another task and extrapolates.

use super::state::PlaybackState;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackClock {
    pub state: PlaybackState,
    /// Position at `anchored_at`
    pub position: f64,
    pub anchored_at: Instant,
    pub rate: f64,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self {
            state: PlaybackState::Idle,
            position: 0.0,
            anchored_at: Instant::now(),
            rate: 1.0,
        }
    }
}

impl PlaybackClock {
    /// Extrapolated position, only while playing
    pub fn position_at(&self, now: Instant) -> Option<f64> {
        if self.state != PlaybackState::Playing {
            return None;
        }
        let elapsed = now.saturating_duration_since(self.anchored_at).as_secs_f64();
        Some(self.position + elapsed * self.rate)
    }

    /// Extra heartbeat fields: the current position while playing, nothing otherwise
    pub fn heartbeat_payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        if let Some(position) = self.position_at(Instant::now()) {
            payload.insert("current_time".to_string(), Value::from(position));
        }
        payload
    }
}

/// Creates the publishing and reading ends of a clock
pub fn channel() -> (watch::Sender<PlaybackClock>, watch::Receiver<PlaybackClock>) {
    watch::channel(PlaybackClock::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_position_only_while_playing() {
        let now = Instant::now();
        let mut clock = PlaybackClock {
            state: PlaybackState::Ready,
            position: 30.0,
            anchored_at: now,
            rate: 1.0,
        };
        assert_eq!(clock.position_at(now + Duration::from_secs(2)), None);
        assert!(clock.heartbeat_payload().is_empty());

        clock.state = PlaybackState::Playing;
        clock.rate = 1.05;
        let position = clock.position_at(now + Duration::from_secs(2)).unwrap();
        assert!((position - 32.1).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_payload_while_playing() {
        let clock = PlaybackClock {
            state: PlaybackState::Playing,
            position: 5.0,
            anchored_at: Instant::now(),
            rate: 1.0,
        };
        tokio::time::advance(Duration::from_millis(1500)).await;

        let payload = clock.heartbeat_payload();
        assert_eq!(payload["current_time"], Value::from(6.5));
    }
}

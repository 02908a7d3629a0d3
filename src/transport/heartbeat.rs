//! Ping bookkeeping for round-trip time measurement

use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;

/// Outstanding pings keyed by their identifier.
///
/// Identifiers grow for the whole process lifetime and are not reset on
/// reconnect, so a late pong from a previous connection can never be matched
/// against a fresh ping.
#[derive(Debug)]
pub struct PingTracker {
    next_id: u64,
    pending: BTreeMap<u64, Instant>,
    expiry: Duration,
}

impl PingTracker {
    pub fn new(expiry: Duration) -> Self {
        Self {
            next_id: 0,
            pending: BTreeMap::new(),
            expiry,
        }
    }

    /// Records a ping sent at `now` and returns its identifier
    pub fn register(&mut self, now: Instant) -> u64 {
        self.next_id += 1;
        self.pending.insert(self.next_id, now);
        self.next_id
    }

    /// Forgets pings older than the expiry
    pub fn prune(&mut self, now: Instant) {
        let expiry = self.expiry;
        self.pending
            .retain(|_, sent| now.saturating_duration_since(*sent) <= expiry);
    }

    /// Matches a pong and returns the round-trip time.
    ///
    /// An absent or unknown id falls back to the oldest outstanding ping.
    /// With nothing outstanding there is no value to report.
    pub fn resolve(&mut self, id: Option<u64>, now: Instant) -> Option<Duration> {
        if let Some(sent) = id.and_then(|id| self.pending.remove(&id)) {
            return Some(now.saturating_duration_since(sent));
        }

        let oldest = self
            .pending
            .iter()
            .min_by_key(|(_, sent)| **sent)
            .map(|(id, _)| *id)?;
        self.pending
            .remove(&oldest)
            .map(|sent| now.saturating_duration_since(sent))
    }

    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_increase() {
        let mut tracker = PingTracker::new(Duration::from_secs(10));
        let now = Instant::now();
        assert_eq!(tracker.register(now), 1);
        assert_eq!(tracker.register(now), 2);
        assert_eq!(tracker.outstanding(), 2);
    }

    #[test]
    fn test_matched_pong_reports_elapsed_time() {
        let mut tracker = PingTracker::new(Duration::from_secs(10));
        let sent = Instant::now();
        let id = tracker.register(sent);

        let rtt = tracker.resolve(Some(id), sent + Duration::from_millis(42));
        assert_eq!(rtt, Some(Duration::from_millis(42)));
        assert_eq!(tracker.outstanding(), 0);
    }

    #[test]
    fn test_bare_pong_matches_oldest() {
        let mut tracker = PingTracker::new(Duration::from_secs(10));
        let start = Instant::now();
        tracker.register(start);
        let newer = tracker.register(start + Duration::from_millis(100));

        let rtt = tracker.resolve(None, start + Duration::from_millis(150));
        assert_eq!(rtt, Some(Duration::from_millis(150)));

        let rtt = tracker.resolve(Some(999), start + Duration::from_millis(160));
        assert_eq!(rtt, Some(Duration::from_millis(60)));
        assert_eq!(tracker.resolve(Some(newer), start), None);
    }

    #[test]
    fn test_unmatched_pong_reports_no_value() {
        let mut tracker = PingTracker::new(Duration::from_secs(10));
        assert_eq!(tracker.resolve(Some(7), Instant::now()), None);
        assert_eq!(tracker.resolve(None, Instant::now()), None);
    }

    #[test]
    fn test_prune_drops_expired_pings() {
        let mut tracker = PingTracker::new(Duration::from_secs(10));
        let start = Instant::now();
        tracker.register(start);
        tracker.register(start + Duration::from_secs(6));

        tracker.prune(start + Duration::from_secs(11));
        assert_eq!(tracker.outstanding(), 1);
    }
}

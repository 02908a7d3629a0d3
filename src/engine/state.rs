//! Playback state and its transition guards

use std::fmt;

/// What the engine is doing with the media surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No source loaded
    #[default]
    Idle,
    /// A source load is in flight
    Loading,
    /// Playback was refused until the user interacts
    WaitingInteraction,
    /// Loaded and paused
    Ready,
    Playing,
}

/// How a peer timeline event is treated in a given state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerSyncDisposition {
    /// Reconcile position and play state
    Apply,
    /// Only remember the target for when the user interacts
    DeferTarget,
    /// Drop the event
    Ignore,
}

impl PlaybackState {
    /// Whether local media signals may turn into outbound intents at all
    pub fn emits_intents(self) -> bool {
        !matches!(
            self,
            PlaybackState::Loading | PlaybackState::WaitingInteraction
        )
    }

    /// A local `play` signal reports a play intent
    pub fn accepts_local_play(self) -> bool {
        self == PlaybackState::Ready
    }

    /// A local `pause` signal reports a pause intent
    pub fn accepts_local_pause(self) -> bool {
        self == PlaybackState::Playing
    }

    /// A completed local seek reports a seek intent
    pub fn accepts_local_seek(self) -> bool {
        matches!(self, PlaybackState::Ready | PlaybackState::Playing)
    }

    /// Local stalls are reported as buffering
    pub fn reports_buffering(self) -> bool {
        self == PlaybackState::Playing
    }

    /// Drift corrections from the server apply
    pub fn accepts_correction(self) -> bool {
        self == PlaybackState::Playing
    }

    /// An authoritative snapshot can be applied to the surface
    pub fn accepts_snapshot(self) -> bool {
        matches!(self, PlaybackState::Ready | PlaybackState::Playing)
    }

    pub fn peer_sync_disposition(self) -> PeerSyncDisposition {
        match self {
            PlaybackState::WaitingInteraction => PeerSyncDisposition::DeferTarget,
            PlaybackState::Idle | PlaybackState::Loading => PeerSyncDisposition::Ignore,
            PlaybackState::Ready | PlaybackState::Playing => PeerSyncDisposition::Apply,
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Loading => "loading",
            PlaybackState::WaitingInteraction => "waiting for interaction",
            PlaybackState::Ready => "ready",
            PlaybackState::Playing => "playing",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PlaybackState; 5] = [
        PlaybackState::Idle,
        PlaybackState::Loading,
        PlaybackState::WaitingInteraction,
        PlaybackState::Ready,
        PlaybackState::Playing,
    ];

    #[test]
    fn test_loading_and_waiting_never_emit() {
        for state in ALL {
            let silent = matches!(
                state,
                PlaybackState::Loading | PlaybackState::WaitingInteraction
            );
            assert_eq!(state.emits_intents(), !silent, "{state}");
        }
    }

    #[test]
    fn test_local_seek_only_once_established() {
        let accepting: Vec<_> = ALL.into_iter().filter(|s| s.accepts_local_seek()).collect();
        assert_eq!(accepting, vec![PlaybackState::Ready, PlaybackState::Playing]);
    }

    #[test]
    fn test_peer_sync_disposition() {
        assert_eq!(
            PlaybackState::WaitingInteraction.peer_sync_disposition(),
            PeerSyncDisposition::DeferTarget
        );
        assert_eq!(
            PlaybackState::Loading.peer_sync_disposition(),
            PeerSyncDisposition::Ignore
        );
        assert_eq!(
            PlaybackState::Idle.peer_sync_disposition(),
            PeerSyncDisposition::Ignore
        );
        assert_eq!(
            PlaybackState::Playing.peer_sync_disposition(),
            PeerSyncDisposition::Apply
        );
    }
}

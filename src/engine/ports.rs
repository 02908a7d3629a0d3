//! Outbound intent port
//!
//! The engine never talks to the network itself. Local user intent leaves
//! through an [`IntentPort`] injected at construction.

use crate::{protocol::Outbound, transport::Transport};
use log::debug;

/// Capabilities the engine needs to report local playback intent
pub trait IntentPort: Send + Sync {
    fn play(&self, time: f64);
    fn pause(&self, time: f64);
    fn seek(&self, time: f64);
    fn buffer_start(&self);
    fn buffer_end(&self);
    /// Asks the server for a fresh authoritative snapshot
    fn request_sync(&self);
}

impl Transport {
    fn send_intent(&self, message: Outbound) {
        if !self.send(&message) {
            debug!("Intent '{}' dropped while offline", message.message_type());
        }
    }
}

impl IntentPort for Transport {
    fn play(&self, time: f64) {
        self.send_intent(Outbound::Play { time });
    }

    fn pause(&self, time: f64) {
        self.send_intent(Outbound::Pause { time });
    }

    fn seek(&self, time: f64) {
        self.send_intent(Outbound::Seek { time });
    }

    fn buffer_start(&self) {
        self.send_intent(Outbound::BufferStart);
    }

    fn buffer_end(&self) {
        self.send_intent(Outbound::BufferEnd);
    }

    fn request_sync(&self) {
        self.send_intent(Outbound::GetState);
    }
}

//! Scoped suppression of intent reporting
//!
//! Every mutation the engine performs on the media surface on behalf of the
//! room holds a [`SuppressionGuard`]. Media events emitted while any guard is
//! alive are stamped as suppressed and never turn into outbound intents.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared flag, true while at least one guard is alive
#[derive(Debug, Clone, Default)]
pub struct SuppressionFlag(Arc<AtomicUsize>);

impl SuppressionFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag until the returned guard is dropped
    #[must_use = "suppression ends when the guard is dropped"]
    pub fn acquire(&self) -> SuppressionGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        SuppressionGuard(self.0.clone())
    }

    pub fn is_suppressed(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }
}

/// Releases its share of the flag on drop, on every exit path
#[derive(Debug)]
pub struct SuppressionGuard(Arc<AtomicUsize>);

impl Drop for SuppressionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

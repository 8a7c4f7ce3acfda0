// Worker completion registry.
//
// Workers register before they start and deregister with their line count
// when done. The last deregistration cancels the batch's token, which tells
// the writer no further lines will arrive. The token fires exactly once per
// batch and never while a registered worker is live.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

static NEXT_WORKER_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("worker {0} deregistered without being registered")]
    UnknownWorker(u64),
}

#[derive(Default)]
struct RegistryState {
    live: HashSet<u64>,
    total_lines: u64,
}

pub struct CompletionRegistry {
    state: Mutex<RegistryState>,
    token: CancellationToken,
}

impl CompletionRegistry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            token: CancellationToken::new(),
        }
    }

    /// Allocate a worker identity and mark it live.
    pub fn register(&self) -> u64 {
        let id = NEXT_WORKER_ID.fetch_add(1, Ordering::Relaxed);
        self.state.lock().live.insert(id);
        id
    }

    /// Record a worker's completion and its appended-line count. When the
    /// last live worker leaves, the cancellation token fires.
    pub fn deregister(&self, id: u64, lines: u64) -> Result<(), RegistryError> {
        let emptied = {
            let mut state = self.state.lock();
            if !state.live.remove(&id) {
                return Err(RegistryError::UnknownWorker(id));
            }
            state.total_lines += lines;
            state.live.is_empty()
        };
        debug!(worker = id, lines, "worker deregistered");
        if emptied {
            self.token.cancel();
        }
        Ok(())
    }

    /// Lines appended across all deregistered workers so far.
    pub fn total_lines(&self) -> u64 {
        self.state.lock().total_lines
    }

    /// Token cancelled when the last worker deregisters.
    pub fn done_token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Default for CompletionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_ids_are_unique() {
        let registry = CompletionRegistry::new();
        let a = registry.register();
        let b = registry.register();
        assert_ne!(a, b);
    }

    #[test]
    fn token_fires_only_after_last_deregistration() {
        let registry = CompletionRegistry::new();
        let token = registry.done_token();
        let a = registry.register();
        let b = registry.register();
        let c = registry.register();

        registry.deregister(a, 10).unwrap();
        assert!(!token.is_cancelled());
        registry.deregister(b, 0).unwrap();
        assert!(!token.is_cancelled());
        registry.deregister(c, 5).unwrap();
        assert!(token.is_cancelled());

        assert_eq!(registry.total_lines(), 15);
    }

    #[test]
    fn fast_worker_cannot_trigger_early_cancel() {
        // Both workers register before either finishes, so the first
        // deregistration leaves the set non-empty.
        let registry = CompletionRegistry::new();
        let token = registry.done_token();
        let fast = registry.register();
        let slow = registry.register();

        registry.deregister(fast, 1).unwrap();
        assert!(!token.is_cancelled());
        registry.deregister(slow, 1).unwrap();
        assert!(token.is_cancelled());
    }

    #[test]
    fn unknown_worker_is_an_error() {
        let registry = CompletionRegistry::new();
        let err = registry.deregister(999_999, 0).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownWorker(999_999)));
    }

    #[test]
    fn double_deregistration_is_an_error() {
        let registry = CompletionRegistry::new();
        let id = registry.register();
        registry.register();
        registry.deregister(id, 1).unwrap();
        assert!(registry.deregister(id, 1).is_err());
    }
}

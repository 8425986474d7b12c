//! Latest-only product search per visitor.
//!
//! The search box fires a request on every keystroke. Responses can arrive
//! out of order, so an older, slower query could overwrite the results of
//! a newer one. [`SearchCoordinator`] keeps one [`CancellationToken`] per
//! key (the cart session id): starting a search cancels the previous token
//! for that key, and the superseded request stops waiting on the backend.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug)]
struct Inflight {
    generation: u64,
    token: CancellationToken,
}

/// Tracks the in-flight search of each visitor.
#[derive(Debug, Clone, Default)]
pub struct SearchCoordinator {
    inflight: Arc<RwLock<HashMap<String, Inflight>>>,
    generation: Arc<AtomicU64>,
}

/// Handle for one started search.
///
/// Dropping it forgets the search, unless a newer one has replaced it.
#[derive(Debug)]
pub struct SearchTicket {
    key: String,
    generation: u64,
    token: CancellationToken,
    inflight: Arc<RwLock<HashMap<String, Inflight>>>,
}

impl SearchCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a search for `key`, cancelling the one already running.
    #[must_use]
    pub fn begin(&self, key: &str) -> SearchTicket {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancellationToken::new();

        let previous = self.inflight.write().ok().and_then(|mut inflight| {
            inflight.insert(
                key.to_string(),
                Inflight {
                    generation,
                    token: token.clone(),
                },
            )
        });
        if let Some(previous) = previous {
            debug!(key, "Superseding running search");
            previous.token.cancel();
        }

        SearchTicket {
            key: key.to_string(),
            generation,
            token,
            inflight: Arc::clone(&self.inflight),
        }
    }

    /// Run `search` as the latest search for `key`.
    ///
    /// Returns `None` if a newer search for the same key started before
    /// this one finished. The future is dropped at that point.
    pub async fn run<F, T>(&self, key: &str, search: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let ticket = self.begin(key);
        ticket.run(search).await
    }

    /// Number of searches currently running.
    #[must_use]
    pub fn inflight(&self) -> usize {
        self.inflight.read().map(|inflight| inflight.len()).unwrap_or(0)
    }
}

impl SearchTicket {
    /// Whether a newer search replaced this one.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Drive `search` until it completes or this ticket is cancelled.
    pub async fn run<F, T>(self, search: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            () = self.token.cancelled() => None,
            output = search => (!self.token.is_cancelled()).then_some(output),
        }
    }
}

impl Drop for SearchTicket {
    fn drop(&mut self) {
        if let Ok(mut inflight) = self.inflight.write()
            && inflight
                .get(&self.key)
                .is_some_and(|entry| entry.generation == self.generation)
        {
            inflight.remove(&self.key);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use tokio::sync::oneshot;

    use super::*;

    #[tokio::test]
    async fn test_single_search_completes() {
        let coordinator = SearchCoordinator::new();
        let result = coordinator.run("session_1_a", async { 42 }).await;

        assert_eq!(result, Some(42));
        assert_eq!(coordinator.inflight(), 0);
    }

    #[tokio::test]
    async fn test_newer_search_cancels_older() {
        let coordinator = SearchCoordinator::new();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let older = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .run("session_1_a", async move {
                        let _ = release_rx.await;
                        "alt"
                    })
                    .await
            })
        };

        // Let the first search register.
        while coordinator.inflight() == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        let newer = coordinator.run("session_1_a", async { "neu" }).await;
        let _ = release_tx.send(());

        assert_eq!(newer, Some("neu"));
        assert_eq!(older.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_different_keys_are_independent() {
        let coordinator = SearchCoordinator::new();
        let first = coordinator.begin("session_1_a");
        let second = coordinator.begin("session_2_b");

        assert!(!first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(coordinator.inflight(), 2);
    }

    #[tokio::test]
    async fn test_stale_ticket_drop_keeps_newer_entry() {
        let coordinator = SearchCoordinator::new();
        let first = coordinator.begin("session_1_a");
        let second = coordinator.begin("session_1_a");

        assert!(first.is_cancelled());
        drop(first);
        assert_eq!(coordinator.inflight(), 1);

        drop(second);
        assert_eq!(coordinator.inflight(), 0);
    }
}

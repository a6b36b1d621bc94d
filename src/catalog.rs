//! Debounced medicine catalog lookup.
//!
//! Converts raw keystrokes into a bounded set of remote searches. Each
//! `search` call takes a fresh generation number; the call then waits out
//! the quiescence window and proceeds to the network only if it is still
//! the newest. A response is applied only under the same condition, so a
//! slow response for an old query can never overwrite results for a newer
//! one (last-writer-wins, in query-issue order).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::{GatewayError, RemoteGateway};
use crate::config;
use crate::models::medicine::MedicineSummary;
use crate::session::Credential;

/// How one `search` invocation settled.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Query under the minimum length; results cleared, no network call.
    Cleared,
    /// A newer search superseded this one (during the quiescence window or
    /// while its response was in flight); nothing was applied.
    Superseded,
    /// This search reached the network and its snapshot is now current.
    Applied(Vec<MedicineSummary>),
}

/// Debounced, cancelable catalog search.
///
/// Shared behind `Arc`; every concurrent `search` call is one independently
/// resolving lookup and the newest issued always wins.
pub struct CatalogSearch<G> {
    gateway: Arc<G>,
    debounce: Duration,
    generation: AtomicU64,
    results: Mutex<Vec<MedicineSummary>>,
}

impl<G: RemoteGateway> CatalogSearch<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self::with_debounce(gateway, config::SEARCH_DEBOUNCE)
    }

    /// Override the quiescence window (tests use short windows).
    pub fn with_debounce(gateway: Arc<G>, debounce: Duration) -> Self {
        Self {
            gateway,
            debounce,
            generation: AtomicU64::new(0),
            results: Mutex::new(Vec::new()),
        }
    }

    /// Latest applied result snapshot.
    pub fn results(&self) -> Vec<MedicineSummary> {
        self.results
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Search the catalog by name fragment.
    ///
    /// Queries shorter than the minimum clear the snapshot without any
    /// network access. A transport failure clears the snapshot and is
    /// returned to the caller; it never panics across this boundary.
    pub async fn search(
        &self,
        credential: &Credential,
        query: &str,
    ) -> Result<SearchOutcome, GatewayError> {
        let query = query.trim();
        if query.chars().count() < config::MIN_QUERY_CHARS {
            // Supersede any pending lookup: the user erased the query.
            self.generation.fetch_add(1, Ordering::SeqCst);
            self.clear_results();
            return Ok(SearchOutcome::Cleared);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        // Quiescence window: only the newest pending search survives it.
        tokio::time::sleep(self.debounce).await;
        if self.generation.load(Ordering::SeqCst) != generation {
            return Ok(SearchOutcome::Superseded);
        }

        tracing::debug!(query, "Searching catalog");
        let response = self.gateway.search_medicines(credential, query).await;

        // Re-check before applying: a newer query may have been issued while
        // this response was in flight.
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(query, "Discarding stale search response");
            return Ok(SearchOutcome::Superseded);
        }

        match response {
            Ok(results) => {
                if let Ok(mut snapshot) = self.results.lock() {
                    *snapshot = results.clone();
                }
                Ok(SearchOutcome::Applied(results))
            }
            Err(err) => {
                tracing::warn!(query, error = %err, "Catalog search failed");
                self.clear_results();
                Err(err)
            }
        }
    }

    fn clear_results(&self) {
        if let Ok(mut snapshot) = self.results.lock() {
            snapshot.clear();
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockGateway;

    fn medicine(id: &str, name: &str) -> MedicineSummary {
        MedicineSummary {
            catalog_id: id.to_string(),
            name: name.to_string(),
            unit_price: 1.0,
        }
    }

    fn credential() -> Credential {
        Credential::for_tests("bearer-1")
    }

    fn catalog(gateway: &Arc<MockGateway>) -> Arc<CatalogSearch<MockGateway>> {
        Arc::new(CatalogSearch::new(Arc::clone(gateway)))
    }

    #[tokio::test(start_paused = true)]
    async fn short_query_clears_without_network_call() {
        let gateway = Arc::new(MockGateway::new());
        let search = catalog(&gateway);

        let outcome = search.search(&credential(), "a").await.unwrap();

        assert_eq!(outcome, SearchOutcome::Cleared);
        assert!(search.results().is_empty());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_query_clears_previous_results() {
        let gateway = Arc::new(MockGateway::new());
        gateway.script_search("aspirin", Ok(vec![medicine("m1", "Aspirin")]));
        let search = catalog(&gateway);

        search.search(&credential(), "aspirin").await.unwrap();
        assert_eq!(search.results().len(), 1);

        search.search(&credential(), "").await.unwrap();
        assert!(search.results().is_empty());
        assert_eq!(gateway.call_count("search:"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn settled_query_applies_snapshot() {
        let gateway = Arc::new(MockGateway::new());
        gateway.script_search(
            "asp",
            Ok(vec![medicine("m1", "Aspirin"), medicine("m2", "Aspegic")]),
        );
        let search = catalog(&gateway);

        let outcome = search.search(&credential(), "asp").await.unwrap();

        match outcome {
            SearchOutcome::Applied(results) => assert_eq!(results.len(), 2),
            other => panic!("Expected Applied, got: {other:?}"),
        }
        assert_eq!(search.results().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_retyping_reaches_network_once() {
        let gateway = Arc::new(MockGateway::new());
        gateway.script_search("aspirin", Ok(vec![medicine("m1", "Aspirin")]));
        let search = catalog(&gateway);
        let cred = credential();

        // Three keystrokes inside one quiescence window: only the last one
        // may reach the network.
        let s1 = tokio::spawn({
            let search = Arc::clone(&search);
            let cred = cred.clone();
            async move { search.search(&cred, "as").await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        let s2 = tokio::spawn({
            let search = Arc::clone(&search);
            let cred = cred.clone();
            async move { search.search(&cred, "aspi").await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        let s3 = tokio::spawn({
            let search = Arc::clone(&search);
            let cred = cred.clone();
            async move { search.search(&cred, "aspirin").await }
        });

        assert_eq!(s1.await.unwrap().unwrap(), SearchOutcome::Superseded);
        assert_eq!(s2.await.unwrap().unwrap(), SearchOutcome::Superseded);
        match s3.await.unwrap().unwrap() {
            SearchOutcome::Applied(results) => assert_eq!(results[0].name, "Aspirin"),
            other => panic!("Expected Applied, got: {other:?}"),
        }

        assert_eq!(gateway.calls(), vec!["search:aspirin"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_cannot_overwrite_newer_results() {
        let gateway = Arc::new(MockGateway::new());
        gateway.script_search("asp", Ok(vec![medicine("m0", "Stale")]));
        gateway.script_search_delay("asp", Duration::from_secs(5));
        gateway.script_search("aspirin", Ok(vec![medicine("m1", "Aspirin")]));
        let search = catalog(&gateway);
        let cred = credential();

        // "asp" settles its debounce and goes to the network, where its
        // response hangs. "aspirin" is issued afterwards and resolves first.
        let slow = tokio::spawn({
            let search = Arc::clone(&search);
            let cred = cred.clone();
            async move { search.search(&cred, "asp").await }
        });
        tokio::time::sleep(Duration::from_millis(700)).await;
        let fast = tokio::spawn({
            let search = Arc::clone(&search);
            let cred = cred.clone();
            async move { search.search(&cred, "aspirin").await }
        });

        match fast.await.unwrap().unwrap() {
            SearchOutcome::Applied(results) => assert_eq!(results[0].name, "Aspirin"),
            other => panic!("Expected Applied, got: {other:?}"),
        }
        assert_eq!(slow.await.unwrap().unwrap(), SearchOutcome::Superseded);

        // Both reached the network, but the visible snapshot is the newer one.
        assert_eq!(gateway.call_count("search:"), 2);
        assert_eq!(search.results()[0].name, "Aspirin");
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_clears_results_and_surfaces_error() {
        let gateway = Arc::new(MockGateway::new());
        gateway.script_search("aspirin", Ok(vec![medicine("m1", "Aspirin")]));
        gateway.script_search(
            "parol",
            Err(GatewayError::Connection("http://gone".into())),
        );
        let search = catalog(&gateway);

        search.search(&credential(), "aspirin").await.unwrap();
        assert_eq!(search.results().len(), 1);

        let err = search.search(&credential(), "parol").await.unwrap_err();
        assert!(err.is_transport());
        assert!(search.results().is_empty());
    }
}

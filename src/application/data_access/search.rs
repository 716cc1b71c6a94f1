//! Search-as-you-type over the facade.

use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{DataAccessError, DataAccessFacade};
use crate::application::shaping::Debouncer;
use crate::domain::cache::Filters;
use crate::domain::policy::Principal;

/// Result of one settled query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub query: String,
    pub result: Result<Option<Value>, DataAccessError>,
}

/// Debounces query text and runs one facade read per settled query.
///
/// Results that arrive after a newer query was issued, or after the search
/// was cancelled or dropped, are discarded. A blank query settles to
/// `Ok(None)` without a remote call.
pub struct DebouncedSearch {
    debouncer: Debouncer<String>,
    generation: Arc<AtomicU64>,
}

impl DebouncedSearch {
    /// `query_param` is the filter the query text is sent as.
    pub fn new<F>(
        facade: Arc<DataAccessFacade>,
        principal: Principal,
        resource: impl Into<String>,
        query_param: impl Into<String>,
        delay: Duration,
        on_result: F,
    ) -> Self
    where
        F: Fn(SearchOutcome) + Send + Sync + 'static,
    {
        let resource = resource.into();
        let query_param = query_param.into();
        let generation = Arc::new(AtomicU64::new(0));
        let on_result = Arc::new(on_result);
        let latest = Arc::clone(&generation);

        let debouncer = Debouncer::new(delay, move |query: String| {
            let issued = latest.fetch_add(1, Ordering::SeqCst) + 1;
            let query = query.trim().to_string();

            if query.is_empty() {
                on_result(SearchOutcome {
                    query,
                    result: Ok(None),
                });
                return;
            }

            let facade = Arc::clone(&facade);
            let principal = principal.clone();
            let resource = resource.clone();
            let latest = Arc::clone(&latest);
            let on_result = Arc::clone(&on_result);
            let mut filters = Filters::new();
            filters.insert(query_param.clone(), query.clone());

            tokio::spawn(async move {
                let result = facade.get(&principal, &resource, &filters).await;
                if latest.load(Ordering::SeqCst) != issued {
                    tracing::trace!(query = %query, "Discarding superseded search result");
                    return;
                }
                on_result(SearchOutcome { query, result });
            });
        });

        Self {
            debouncer,
            generation,
        }
    }

    /// Records the latest query text.
    pub fn push(&self, query: impl Into<String>) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.debouncer.push(query.into());
    }

    /// Drops the pending query and any result still in flight.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.debouncer.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

impl Drop for DebouncedSearch {
    fn drop(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

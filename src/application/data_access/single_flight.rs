//! Coalescing of concurrent identical requests.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;

/// Runs at most one request per key at a time; callers arriving while a
/// request is in flight await the same outcome.
pub struct SingleFlight<T: Clone> {
    inflight: Mutex<HashMap<String, Shared<BoxFuture<'static, T>>>>,
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Awaits the in-flight request for `key`, starting `request` if there
    /// is none.
    pub async fn run<F, Fut>(&self, key: &str, request: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let flight = {
            let mut inflight = self.inflight.lock();
            match inflight.get(key) {
                Some(flight) => {
                    tracing::trace!(key, "Joining in-flight request");
                    flight.clone()
                }
                None => {
                    let flight = request().boxed().shared();
                    inflight.insert(key.to_string(), flight.clone());
                    flight
                }
            }
        };

        let outcome = flight.clone().await;

        let mut inflight = self.inflight.lock();
        if inflight
            .get(key)
            .is_some_and(|current| current.ptr_eq(&flight))
        {
            inflight.remove(key);
        }
        outcome
    }

    /// Number of keys with a request in flight.
    pub fn in_flight(&self) -> usize {
        self.inflight.lock().len()
    }
}

impl<T> Default for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn concurrent_calls_share_one_request() {
        let flights = Arc::new(SingleFlight::new());
        let calls = Arc::new(AtomicU32::new(0));

        let mut tasks = Vec::new();
        for _ in 0..5 {
            let flights = Arc::clone(&flights);
            let calls = Arc::clone(&calls);
            tasks.push(tokio::spawn(async move {
                flights
                    .run("clients", move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        42u32
                    })
                    .await
            }));
        }

        for task in tasks {
            assert_eq!(task.await.unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn sequential_calls_run_separately() {
        let flights = SingleFlight::new();
        let calls = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            flights
                .run("clients", move || async move { calls.fetch_add(1, Ordering::SeqCst) })
                .await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn different_keys_do_not_coalesce() {
        let flights = Arc::new(SingleFlight::new());
        let a = flights.run("a", || async { tokio::time::sleep(Duration::from_millis(5)).await; "a" });
        let b = flights.run("b", || async { "b" });
        let (a, b) = tokio::join!(a, b);
        assert_eq!((a, b), ("a", "b"));
    }
}

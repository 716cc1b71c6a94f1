//! Trailing-edge debouncer.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

struct DebounceState<T> {
    pending: Option<T>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
    alive: bool,
}

/// Emits the most recent pushed value once no new value has arrived for
/// `delay`.
///
/// Every push restarts the quiet period. A timer that has been superseded
/// by a newer push, cancelled, or outlived its debouncer never emits.
///
/// Pushing requires a Tokio runtime.
pub struct Debouncer<T> {
    delay: Duration,
    emit: Arc<dyn Fn(T) + Send + Sync>,
    state: Arc<Mutex<DebounceState<T>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F>(delay: Duration, emit: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            delay,
            emit: Arc::new(emit),
            state: Arc::new(Mutex::new(DebounceState {
                pending: None,
                generation: 0,
                timer: None,
                alive: true,
            })),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replaces the pending value and restarts the quiet period.
    pub fn push(&self, value: T) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.pending = Some(value);
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }

        let generation = state.generation;
        let delay = self.delay;
        let shared = Arc::clone(&self.state);
        let emit = Arc::clone(&self.emit);

        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let value = {
                let mut state = shared.lock();
                if !state.alive || state.generation != generation {
                    return;
                }
                state.timer = None;
                state.pending.take()
            };

            if let Some(value) = value {
                emit(value);
            }
        }));
    }

    /// Drops the pending value, if any, without emitting it.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.pending = None;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }

    /// Returns true while a value is waiting for its quiet period.
    pub fn is_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.alive = false;
        state.pending = None;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }
}

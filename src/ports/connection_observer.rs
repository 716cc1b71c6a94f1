//! Lifecycle callbacks from the connection manager.

use crate::domain::foundation::SessionId;
use crate::ports::TransportError;

/// Receives connection lifecycle events.
///
/// Transient failures are reported through `on_error`/`on_disconnect` for
/// diagnostics only; `on_connection_lost` is the single terminal signal
/// after which the caller must explicitly reconnect.
pub trait ConnectionObserver: Send + Sync {
    /// A session opened.
    fn on_open(&self, _session_id: SessionId) {}

    /// An open session ended.
    fn on_disconnect(&self, _session_id: SessionId, _reason: &str) {}

    /// A connect attempt or an open session failed.
    fn on_error(&self, _error: &TransportError) {}

    /// Reconnect attempts are exhausted. Fires once per exhausted cycle.
    fn on_connection_lost(&self, _attempts: u32, _last_error: Option<&str>) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ConnectionObserver for NoopObserver {}

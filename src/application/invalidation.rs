//! Push-driven cache invalidation.
//!
//! Domain events from the live connection mean cached reads of that
//! domain are out of date. The router either drops the affected
//! collections or, when the event carries the new value under a cache
//! key, writes it straight into the cache.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::application::data_access::TtlPolicy;
use crate::domain::cache::CacheKey;
use crate::domain::connection::{tags, InboundEnvelope, InboundMessage};
use crate::ports::{CacheStore, HandlerError, MessageHandler};

/// Collections whose cached reads go stale when a call starts or ends.
const CALL_COLLECTIONS: [&str; 2] = ["calls", "dashboard"];

/// Keeps the cache consistent with server-side changes.
pub struct InvalidationRouter {
    cache: Arc<dyn CacheStore<Value>>,
    ttl: TtlPolicy,
    domains: BTreeMap<String, Vec<String>>,
}

impl InvalidationRouter {
    pub fn new(cache: Arc<dyn CacheStore<Value>>, ttl: TtlPolicy) -> Self {
        Self {
            cache,
            ttl,
            domains: BTreeMap::new(),
        }
    }

    /// Declares which collections `<domain>-event` invalidates.
    ///
    /// Unmapped domains invalidate the collection of the same name.
    pub fn map_domain<I, S>(mut self, domain: impl Into<String>, collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domains
            .insert(domain.into(), collections.into_iter().map(Into::into).collect());
        self
    }

    /// Tags this router should be registered for.
    pub fn tags(&self) -> Vec<String> {
        let mut handled: Vec<String> = self
            .domains
            .keys()
            .map(|domain| format!("{domain}{}", tags::DOMAIN_EVENT_SUFFIX))
            .collect();
        handled.push(tags::CALL_STARTED.to_string());
        handled.push(tags::CALL_ENDED.to_string());
        handled
    }

    fn collections_for<'a>(&'a self, domain: &'a str) -> Vec<&'a str> {
        match self.domains.get(domain) {
            Some(collections) => collections.iter().map(String::as_str).collect(),
            None => vec![domain],
        }
    }

    fn invalidate(&self, collections: &[&str]) -> usize {
        self.cache.invalidate_matching(&|key| {
            collections
                .iter()
                .any(|collection| CacheKey::in_collection(key, collection))
        })
    }

    fn patch(&self, payload: &Value) -> Option<String> {
        let key = payload.get("cacheKey")?.as_str()?;
        let value = payload.get("value")?;
        // Invalidating first keeps an in-flight fetch from overwriting the pushed value.
        self.cache.invalidate(key);
        self.cache
            .set(key, value.clone(), self.ttl.ttl_for(CacheKey::collection_of(key)));
        Some(key.to_string())
    }
}

#[async_trait]
impl MessageHandler for InvalidationRouter {
    async fn handle(&self, envelope: InboundEnvelope) -> Result<(), HandlerError> {
        match &envelope.message {
            InboundMessage::DomainEvent {
                domain,
                event_type,
                payload,
            } => {
                if let Some(key) = self.patch(payload) {
                    tracing::debug!(domain = %domain, key = %key, "Cache entry patched from push");
                    return Ok(());
                }
                let collections = self.collections_for(domain);
                let dropped = self.invalidate(&collections);
                tracing::debug!(
                    domain = %domain,
                    event_type = ?event_type,
                    dropped,
                    "Cache invalidated from push"
                );
            }
            InboundMessage::CallStarted(call) | InboundMessage::CallEnded(call) => {
                let dropped = self.invalidate(&CALL_COLLECTIONS);
                tracing::debug!(call_id = %call.call_id, dropped, "Call lifecycle invalidated cache");
            }
            _ => {}
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "InvalidationRouter"
    }
}

//! The data access facade.

use serde_json::Value;
use std::sync::Arc;

use super::{DataAccessError, SingleFlight, TtlPolicy};
use crate::domain::cache::{CacheKey, Filters};
use crate::domain::policy::{AccessResult, Action, PolicyEvaluator, Principal};
use crate::ports::{CacheStore, RemoteError, RemoteStore};

type FetchOutcome = Result<Option<Value>, RemoteError>;

/// Behaviour switches for [`DataAccessFacade`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacadeOptions {
    /// Coalesce concurrent fetches of the same key into one remote call.
    pub single_flight: bool,
}

impl Default for FacadeOptions {
    fn default() -> Self {
        Self {
            single_flight: true,
        }
    }
}

/// Reads and writes remote resources through the policy table and the
/// TTL cache.
///
/// Resource paths are checked against the policy by collection, so
/// `clients/42` needs a grant on `clients`.
pub struct DataAccessFacade {
    cache: Arc<dyn CacheStore<Value>>,
    remote: Arc<dyn RemoteStore>,
    policy: PolicyEvaluator,
    ttl: TtlPolicy,
    flights: Option<SingleFlight<FetchOutcome>>,
}

impl DataAccessFacade {
    pub fn new(
        cache: Arc<dyn CacheStore<Value>>,
        remote: Arc<dyn RemoteStore>,
        policy: PolicyEvaluator,
        ttl: TtlPolicy,
        options: FacadeOptions,
    ) -> Self {
        Self {
            cache,
            remote,
            policy,
            ttl,
            flights: options.single_flight.then(SingleFlight::new),
        }
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore<Value>> {
        &self.cache
    }

    pub fn ttl_policy(&self) -> &TtlPolicy {
        &self.ttl
    }

    /// Returns the value for a resource query.
    ///
    /// Serves a fresh cached value when there is one; otherwise fetches,
    /// caches and returns it. `Ok(None)` means the remote has nothing.
    ///
    /// A fetch that overlaps an invalidation is returned to its callers but
    /// not cached, and callers arriving after the invalidation start a new
    /// fetch instead of joining it.
    pub async fn get(
        &self,
        principal: &Principal,
        resource: &str,
        filters: &Filters,
    ) -> Result<Option<Value>, DataAccessError> {
        self.authorize(principal, resource, Action::Read)?;

        let key = CacheKey::for_query(resource, filters);
        if let Some(value) = self.cache.get(key.as_str()) {
            tracing::trace!(key = %key, "Cache hit");
            return Ok(Some(value));
        }

        let generation = self.cache.generation();
        let outcome = match &self.flights {
            Some(flights) => {
                let remote = Arc::clone(&self.remote);
                let owned_resource = resource.to_string();
                let owned_filters = filters.clone();
                let flight_key = format!("{key}#{generation}");
                flights
                    .run(&flight_key, move || async move {
                        remote.fetch(&owned_resource, &owned_filters).await
                    })
                    .await
            }
            None => self.remote.fetch(resource, filters).await,
        };

        let value = outcome.map_err(|e| {
            tracing::debug!(key = %key, error = %e, "Remote fetch failed");
            DataAccessError::Remote(e)
        })?;

        if let Some(value) = &value {
            let ttl = self.ttl.ttl_for(resource);
            if !self
                .cache
                .set_if_unchanged(key.as_str(), value.clone(), ttl, generation)
            {
                tracing::debug!(key = %key, "Cache invalidated during fetch, result not cached");
            }
        }
        Ok(value)
    }

    /// Applies a create, update or delete and drops every cached query of
    /// the affected collection.
    pub async fn mutate(
        &self,
        principal: &Principal,
        resource: &str,
        action: Action,
        patch: &Value,
    ) -> Result<Value, DataAccessError> {
        if !action.is_mutation() {
            return Err(DataAccessError::NotAMutation(action));
        }
        self.authorize(principal, resource, action)?;

        let result = self.remote.mutate(resource, action, patch).await?;

        let dropped = self.invalidate(resource);
        tracing::debug!(resource, %action, dropped, "Mutation applied, cache invalidated");
        Ok(result)
    }

    /// Drops every cached query of `resource`'s collection.
    pub fn invalidate(&self, resource: &str) -> usize {
        let collection = CacheKey::collection_of(resource);
        self.cache
            .invalidate_matching(&|key| CacheKey::in_collection(key, collection))
    }

    fn authorize(
        &self,
        principal: &Principal,
        resource: &str,
        action: Action,
    ) -> Result<(), DataAccessError> {
        let collection = CacheKey::collection_of(resource);
        match self.policy.check(principal, collection, action) {
            AccessResult::Allowed => Ok(()),
            AccessResult::Denied(reason) => {
                tracing::debug!(
                    principal = %principal.id,
                    role = %principal.role,
                    resource,
                    %action,
                    reason = %reason,
                    "Access denied"
                );
                Err(DataAccessError::Denied(reason))
            }
        }
    }
}

//! Canonical cache keys for resource queries.

use std::collections::BTreeMap;
use std::fmt;

/// Query filters; ordered so equal filter sets produce equal keys.
pub type Filters = BTreeMap<String, String>;

/// Canonical key for a resource query: `resource` or `resource?k=v&k2=v2`.
///
/// Filter pairs are sorted and form-encoded, so two callers asking the same
/// question share one entry, and every query of a resource can be dropped
/// together with [`CacheKey::belongs_to`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for an unfiltered resource read.
    pub fn for_resource(resource: &str) -> Self {
        Self(resource.to_string())
    }

    /// Key for a filtered resource read.
    pub fn for_query(resource: &str, filters: &Filters) -> Self {
        if filters.is_empty() {
            return Self::for_resource(resource);
        }
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(filters.iter())
            .finish();
        Self(format!("{resource}?{query}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `key` caches some query of `resource`.
    pub fn belongs_to(key: &str, resource: &str) -> bool {
        match key.strip_prefix(resource) {
            Some(rest) => rest.is_empty() || rest.starts_with('?'),
            None => false,
        }
    }

    /// Returns true if `key` caches the collection or any resource under it.
    ///
    /// `clients`, `clients?tier=gold` and `clients/42` are all in the
    /// `clients` collection.
    pub fn in_collection(key: &str, collection: &str) -> bool {
        match key.strip_prefix(collection) {
            Some(rest) => rest.is_empty() || rest.starts_with('?') || rest.starts_with('/'),
            None => false,
        }
    }

    /// The collection a resource path belongs to: `clients/42` → `clients`.
    pub fn collection_of(resource: &str) -> &str {
        let resource = resource.trim_start_matches('/');
        resource.split(['/', '?']).next().unwrap_or(resource)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

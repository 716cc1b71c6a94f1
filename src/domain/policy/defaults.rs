//! Built-in policy table.

use once_cell::sync::Lazy;
use std::sync::Arc;

use super::{PolicyError, PolicyTable};

static DEFAULT_POLICY: Lazy<Arc<PolicyTable>> = Lazy::new(|| {
    let table = build_default().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Built-in policy rejected, denying everything");
        PolicyTable::deny_all()
    });
    Arc::new(table)
});

/// The process-wide built-in table, used when no policy file is configured.
pub fn default_policy() -> Arc<PolicyTable> {
    Arc::clone(&DEFAULT_POLICY)
}

fn build_default() -> Result<PolicyTable, PolicyError> {
    PolicyTable::builder()
        .allow_all("admin")
        .allow("supervisor", "clients", ["read", "update"])
        .allow("supervisor", "calls", ["read"])
        .allow("supervisor", "alerts", ["read", "update"])
        .allow("supervisor", "dashboard", ["read"])
        .allow("agent", "clients", ["read", "create", "update"])
        .allow("agent", "calls", ["read", "create"])
        .allow("agent", "dashboard", ["read"])
        .allow("agent", "alerts", ["read"])
        .allow("client", "profile", ["read", "update"])
        .allow("client", "appointments", ["read", "create"])
        .build()
}

//! Deny-by-default policy evaluation.

use std::sync::Arc;
use thiserror::Error;

use super::{default_policy, Action, PolicyTable, Principal, RoleGrant};

/// Result of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessResult {
    Allowed,
    Denied(AccessDeniedReason),
}

impl AccessResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessResult::Allowed)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, AccessResult::Denied(_))
    }

    /// Converts the result to a Result type, with denied becoming an error.
    pub fn into_result(self) -> Result<(), AccessDeniedReason> {
        match self {
            AccessResult::Allowed => Ok(()),
            AccessResult::Denied(reason) => Err(reason),
        }
    }
}

/// Why access was denied. Every variant is a lookup miss.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDeniedReason {
    #[error("role '{role}' has no policy entry")]
    UnknownRole { role: String },

    #[error("role '{role}' has no grant for '{resource}'")]
    UnknownResource { role: String, resource: String },

    #[error("role '{role}' may not {action} '{resource}'")]
    ActionNotPermitted {
        role: String,
        resource: String,
        action: Action,
    },

    #[error("'{verb}' is not a recognised action")]
    UnknownAction { verb: String },
}

/// Pure evaluator over a shared, read-only policy table.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    table: Arc<PolicyTable>,
}

impl PolicyEvaluator {
    pub fn new(table: PolicyTable) -> Self {
        Self::shared(Arc::new(table))
    }

    pub fn shared(table: Arc<PolicyTable>) -> Self {
        Self { table }
    }

    /// Evaluator over the built-in process-wide table.
    pub fn with_default_policy() -> Self {
        Self::shared(default_policy())
    }

    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    /// Boolean check with synonym normalisation; unknown verbs deny.
    pub fn can_access(&self, role: &str, resource: &str, action: &str) -> bool {
        self.evaluate_verb(role, resource, action).is_allowed()
    }

    /// Like [`can_access`](Self::can_access) but reports the reason.
    pub fn evaluate_verb(&self, role: &str, resource: &str, verb: &str) -> AccessResult {
        match Action::normalize(verb) {
            Some(action) => self.evaluate(role, resource, action),
            None => AccessResult::Denied(AccessDeniedReason::UnknownAction {
                verb: verb.to_string(),
            }),
        }
    }

    pub fn check(&self, principal: &Principal, resource: &str, action: Action) -> AccessResult {
        self.evaluate(principal.role.as_str(), resource, action)
    }

    pub fn evaluate(&self, role: &str, resource: &str, action: Action) -> AccessResult {
        let role = role.trim();
        let resources = match self.table.grant_for(role) {
            None => {
                return AccessResult::Denied(AccessDeniedReason::UnknownRole {
                    role: role.to_string(),
                })
            }
            Some(RoleGrant::All) => return AccessResult::Allowed,
            Some(RoleGrant::Resources(resources)) => resources,
        };

        match resources.get(resource) {
            None => AccessResult::Denied(AccessDeniedReason::UnknownResource {
                role: role.to_string(),
                resource: resource.to_string(),
            }),
            Some(actions) if actions.permits(action) => AccessResult::Allowed,
            Some(_) => AccessResult::Denied(AccessDeniedReason::ActionNotPermitted {
                role: role.to_string(),
                resource: resource.to_string(),
                action,
            }),
        }
    }
}

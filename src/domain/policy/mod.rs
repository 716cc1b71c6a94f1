//! Access policy: which role may perform which action on which resource.
//!
//! The table is an explicit finite mapping `role × resource → action set`,
//! validated when it is built and read-only afterwards. Evaluation is pure,
//! synchronous and deny-by-default.
//!
//! ```text
//! role ──► RoleGrant::All                       (every resource, every action)
//!      └─► RoleGrant::Resources
//!            resource ──► ActionSet::Any        (every action on it)
//!                     └─► ActionSet::Only{..}   (listed actions)
//! ```

mod action;
mod defaults;
mod error;
mod evaluator;
mod principal;
mod table;

pub use action::{Action, ActionSet};
pub use defaults::default_policy;
pub use error::PolicyError;
pub use evaluator::{AccessDeniedReason, AccessResult, PolicyEvaluator};
pub use principal::{Principal, Role};
pub use table::{PolicyTable, PolicyTableBuilder, RoleGrant, WILDCARD};

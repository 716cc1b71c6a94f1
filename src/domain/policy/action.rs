//! Actions and action synonyms.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Canonical action a principal can perform on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Read, Action::Create, Action::Update, Action::Delete];

    /// Maps a verb or one of its synonyms to the canonical action.
    ///
    /// Matching is case-insensitive; `write` is the same as `create`.
    pub fn normalize(verb: &str) -> Option<Action> {
        match verb.trim().to_ascii_lowercase().as_str() {
            "read" | "view" | "get" | "list" => Some(Action::Read),
            "create" | "write" | "add" | "insert" => Some(Action::Create),
            "update" | "edit" | "modify" | "patch" => Some(Action::Update),
            "delete" | "remove" | "destroy" => Some(Action::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    /// Returns true for actions that change remote state.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Action::Read)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::normalize(s)
            .ok_or_else(|| ValidationError::invalid_format("action", format!("unknown verb '{s}'")))
    }
}

/// Actions granted on one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionSet {
    /// Every action.
    Any,
    Only(BTreeSet<Action>),
}

impl ActionSet {
    pub fn only(actions: impl IntoIterator<Item = Action>) -> Self {
        ActionSet::Only(actions.into_iter().collect())
    }

    pub fn permits(&self, action: Action) -> bool {
        match self {
            ActionSet::Any => true,
            ActionSet::Only(actions) => actions.contains(&action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_is_create() {
        assert_eq!(Action::normalize("write"), Some(Action::Create));
        assert_eq!(Action::normalize("create"), Some(Action::Create));
    }

    #[test]
    fn synonyms_are_case_insensitive() {
        assert_eq!(Action::normalize("  View "), Some(Action::Read));
        assert_eq!(Action::normalize("EDIT"), Some(Action::Update));
        assert_eq!(Action::normalize("Remove"), Some(Action::Delete));
    }

    #[test]
    fn unknown_verb_is_rejected() {
        assert_eq!(Action::normalize("fly"), None);
        assert!("fly".parse::<Action>().is_err());
    }

    #[test]
    fn only_read_is_not_a_mutation() {
        assert!(!Action::Read.is_mutation());
        assert!(Action::Create.is_mutation());
        assert!(Action::Delete.is_mutation());
    }

    #[test]
    fn action_set_membership() {
        let set = ActionSet::only([Action::Read, Action::Update]);
        assert!(set.permits(Action::Read));
        assert!(!set.permits(Action::Delete));
        assert!(ActionSet::Any.permits(Action::Delete));
    }
}

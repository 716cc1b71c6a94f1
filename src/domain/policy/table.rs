//! The policy table and its construction.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use super::{Action, ActionSet, PolicyError};

/// Wildcard marker for "every resource" or "every action".
pub const WILDCARD: &str = "*";

/// Everything a role is granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleGrant {
    /// Every action on every resource.
    All,
    Resources(HashMap<String, ActionSet>),
}

/// Validated, read-only mapping of role → resource → actions.
///
/// Roles absent from the table have no permissions at all; there is no
/// inheritance between roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyTable {
    roles: HashMap<String, RoleGrant>,
}

impl PolicyTable {
    pub fn builder() -> PolicyTableBuilder {
        PolicyTableBuilder::default()
    }

    /// A table that grants nothing to anyone.
    pub fn deny_all() -> Self {
        Self::default()
    }

    pub fn grant_for(&self, role: &str) -> Option<&RoleGrant> {
        self.roles.get(role)
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Parses and validates a YAML policy document.
    ///
    /// ```yaml
    /// roles:
    ///   admin: "*"
    ///   agent:
    ///     clients: [read, write, update]
    ///     dashboard: "*"
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self, PolicyError> {
        let document: PolicyDocument =
            serde_yaml::from_str(yaml).map_err(|e| PolicyError::Parse(e.to_string()))?;
        compile(document.roles)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, PolicyError> {
        let yaml = std::fs::read_to_string(path).map_err(|e| PolicyError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_yaml_str(&yaml)
    }
}

/// Collects grants and validates them on [`build`](Self::build).
#[derive(Debug, Default)]
pub struct PolicyTableBuilder {
    roles: BTreeMap<String, RawGrant>,
}

impl PolicyTableBuilder {
    /// Grants every action on every resource. Supersedes other grants.
    pub fn allow_all(mut self, role: &str) -> Self {
        self.roles
            .insert(role.to_string(), RawGrant::Wildcard(WILDCARD.to_string()));
        self
    }

    /// Grants the listed verbs (synonyms allowed) on a resource.
    pub fn allow<I, S>(mut self, role: &str, resource: &str, verbs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let verbs = verbs.into_iter().map(|v| v.as_ref().to_string());
        let grant = self
            .roles
            .entry(role.to_string())
            .or_insert_with(|| RawGrant::Resources(BTreeMap::new()));

        if let RawGrant::Resources(resources) = grant {
            match resources
                .entry(resource.to_string())
                .or_insert_with(|| RawActions::Verbs(Vec::new()))
            {
                RawActions::Verbs(existing) => existing.extend(verbs),
                RawActions::Wildcard(_) => {}
            }
        }
        self
    }

    /// Grants every action on one resource.
    pub fn allow_any_action(mut self, role: &str, resource: &str) -> Self {
        let grant = self
            .roles
            .entry(role.to_string())
            .or_insert_with(|| RawGrant::Resources(BTreeMap::new()));

        if let RawGrant::Resources(resources) = grant {
            resources.insert(
                resource.to_string(),
                RawActions::Wildcard(WILDCARD.to_string()),
            );
        }
        self
    }

    pub fn build(self) -> Result<PolicyTable, PolicyError> {
        compile(self.roles)
    }
}

// ============================================
// Raw document shape
// ============================================

#[derive(Debug, Deserialize)]
struct PolicyDocument {
    #[serde(default)]
    roles: BTreeMap<String, RawGrant>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawGrant {
    Wildcard(String),
    Resources(BTreeMap<String, RawActions>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawActions {
    Wildcard(String),
    Verbs(Vec<String>),
}

fn compile(raw: BTreeMap<String, RawGrant>) -> Result<PolicyTable, PolicyError> {
    let mut roles = HashMap::with_capacity(raw.len());

    for (role, grant) in raw {
        let role = role.trim();
        if role.is_empty() {
            return Err(PolicyError::EmptyRole);
        }

        let grant = match grant {
            RawGrant::Wildcard(value) if value.trim() == WILDCARD => RoleGrant::All,
            RawGrant::Wildcard(value) => {
                return Err(PolicyError::InvalidWildcard {
                    role: role.to_string(),
                    value,
                })
            }
            RawGrant::Resources(resources) => compile_resources(role, resources)?,
        };
        roles.insert(role.to_string(), grant);
    }

    Ok(PolicyTable { roles })
}

fn compile_resources(
    role: &str,
    resources: BTreeMap<String, RawActions>,
) -> Result<RoleGrant, PolicyError> {
    let mut compiled = HashMap::with_capacity(resources.len());
    let mut wildcard_resource = false;

    for (resource, actions) in resources {
        let resource = resource.trim();
        if resource.is_empty() {
            return Err(PolicyError::EmptyResource {
                role: role.to_string(),
            });
        }

        let actions = compile_actions(role, resource, actions)?;
        if resource == WILDCARD {
            if actions != ActionSet::Any {
                return Err(PolicyError::AmbiguousWildcard {
                    role: role.to_string(),
                });
            }
            wildcard_resource = true;
            continue;
        }
        compiled.insert(resource.to_string(), actions);
    }

    if wildcard_resource {
        Ok(RoleGrant::All)
    } else {
        Ok(RoleGrant::Resources(compiled))
    }
}

fn compile_actions(role: &str, resource: &str, raw: RawActions) -> Result<ActionSet, PolicyError> {
    let unknown = |verb: &str| PolicyError::UnknownAction {
        role: role.to_string(),
        resource: resource.to_string(),
        verb: verb.to_string(),
    };

    match raw {
        RawActions::Wildcard(value) if value.trim() == WILDCARD => Ok(ActionSet::Any),
        RawActions::Wildcard(value) => Err(unknown(&value)),
        RawActions::Verbs(verbs) => {
            if verbs.is_empty() {
                return Err(PolicyError::EmptyActions {
                    role: role.to_string(),
                    resource: resource.to_string(),
                });
            }
            let mut actions = Vec::with_capacity(verbs.len());
            for verb in &verbs {
                if verb.trim() == WILDCARD {
                    return Ok(ActionSet::Any);
                }
                actions.push(Action::normalize(verb).ok_or_else(|| unknown(verb))?);
            }
            Ok(ActionSet::only(actions))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builder_normalizes_synonyms() {
        let table = PolicyTable::builder()
            .allow("agent", "clients", ["read", "write"])
            .build()
            .unwrap();

        match table.grant_for("agent") {
            Some(RoleGrant::Resources(resources)) => {
                assert_eq!(
                    resources["clients"],
                    ActionSet::only([Action::Read, Action::Create])
                );
            }
            other => panic!("Expected resource grants, got {other:?}"),
        }
    }

    #[test]
    fn allow_calls_accumulate() {
        let table = PolicyTable::builder()
            .allow("agent", "calls", ["read"])
            .allow("agent", "calls", ["create"])
            .build()
            .unwrap();

        let Some(RoleGrant::Resources(resources)) = table.grant_for("agent") else {
            panic!("Expected resource grants");
        };
        assert!(resources["calls"].permits(Action::Create));
        assert!(resources["calls"].permits(Action::Read));
    }

    #[test]
    fn builder_rejects_unknown_verbs() {
        let err = PolicyTable::builder()
            .allow("agent", "clients", ["read", "teleport"])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            PolicyError::UnknownAction {
                role: "agent".to_string(),
                resource: "clients".to_string(),
                verb: "teleport".to_string(),
            }
        );
    }

    #[test]
    fn builder_rejects_blank_names() {
        assert_eq!(
            PolicyTable::builder().allow_all(" ").build().unwrap_err(),
            PolicyError::EmptyRole
        );
        assert!(matches!(
            PolicyTable::builder()
                .allow("agent", "", ["read"])
                .build()
                .unwrap_err(),
            PolicyError::EmptyResource { .. }
        ));
    }

    #[test]
    fn allow_all_supersedes_resource_grants() {
        let table = PolicyTable::builder()
            .allow_all("admin")
            .allow("admin", "clients", ["read"])
            .build()
            .unwrap();
        assert_eq!(table.grant_for("admin"), Some(&RoleGrant::All));
    }

    #[test]
    fn yaml_document_is_compiled() {
        let table = PolicyTable::from_yaml_str(
            r#"
roles:
  admin: "*"
  agent:
    clients: [read, write, update]
    dashboard: "*"
  supervisor:
    "*": "*"
"#,
        )
        .unwrap();

        assert_eq!(table.grant_for("admin"), Some(&RoleGrant::All));
        assert_eq!(table.grant_for("supervisor"), Some(&RoleGrant::All));
        let Some(RoleGrant::Resources(agent)) = table.grant_for("agent") else {
            panic!("Expected resource grants");
        };
        assert_eq!(agent["dashboard"], ActionSet::Any);
        assert!(agent["clients"].permits(Action::Create));
        assert!(!agent["clients"].permits(Action::Delete));
    }

    #[test]
    fn yaml_wildcard_resource_with_restricted_actions_is_ambiguous() {
        let err = PolicyTable::from_yaml_str(
            r#"
roles:
  auditor:
    "*": [read]
"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            PolicyError::AmbiguousWildcard {
                role: "auditor".to_string()
            }
        );
    }

    #[test]
    fn yaml_rejects_non_wildcard_role_string() {
        let err = PolicyTable::from_yaml_str("roles:\n  admin: everything\n").unwrap_err();
        assert!(matches!(err, PolicyError::InvalidWildcard { .. }));
    }

    #[test]
    fn yaml_rejects_empty_action_list() {
        let err = PolicyTable::from_yaml_str("roles:\n  agent:\n    clients: []\n").unwrap_err();
        assert!(matches!(err, PolicyError::EmptyActions { .. }));
    }

    #[test]
    fn yaml_syntax_errors_are_parse_errors() {
        let err = PolicyTable::from_yaml_str("roles: [unclosed").unwrap_err();
        assert!(matches!(err, PolicyError::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "roles:\n  client:\n    profile: [read, edit]").unwrap();

        let table = PolicyTable::from_yaml_file(file.path()).unwrap();
        assert!(table.grant_for("client").is_some());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PolicyTable::from_yaml_file(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, PolicyError::Io { .. }));
    }
}

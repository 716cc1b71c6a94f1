//! Access policy configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;
use crate::domain::policy::{PolicyError, PolicyEvaluator, PolicyTable};

/// Where the access policy comes from
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyConfig {
    /// YAML policy file; the built-in table is used when unset
    pub path: Option<PathBuf>,
}

impl PolicyConfig {
    /// Build the evaluator this configuration describes
    pub fn evaluator(&self) -> Result<PolicyEvaluator, PolicyError> {
        match &self.path {
            Some(path) => {
                let table = PolicyTable::from_yaml_file(path)?;
                tracing::info!(path = %path.display(), roles = table.roles().count(), "Loaded access policy");
                Ok(PolicyEvaluator::new(table))
            }
            None => Ok(PolicyEvaluator::with_default_policy()),
        }
    }

    /// Validate policy configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(path) = &self.path {
            if path.as_os_str().is_empty() {
                return Err(ValidationError::MissingRequired("policy.path"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_uses_builtin_table() {
        let evaluator = PolicyConfig::default().evaluator().unwrap();
        assert!(evaluator.can_access("agent", "clients", "read"));
    }

    #[test]
    fn test_loads_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "roles:\n  auditor:\n    calls: [read]").unwrap();

        let config = PolicyConfig {
            path: Some(file.path().to_path_buf()),
        };
        let evaluator = config.evaluator().unwrap();

        assert!(evaluator.can_access("auditor", "calls", "view"));
        assert!(!evaluator.can_access("agent", "calls", "read"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let config = PolicyConfig {
            path: Some(PathBuf::from("/nonexistent/policy.yaml")),
        };
        assert!(matches!(config.evaluator(), Err(PolicyError::Io { .. })));
    }
}

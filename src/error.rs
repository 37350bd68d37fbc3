//! Error types for loading CSDL documents and assembling rule sets.
//!
//! Schema problems are never errors here: unresolved references and rule
//! violations surface as [`crate::Diagnostic`] values. These enums cover
//! I/O, malformed input, and configuration mistakes only.

use std::path::PathBuf;
use thiserror::Error;

use crate::validator::NodeKind;

/// Errors while reading a CSDL document.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid CSDL document: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}

/// Errors assembling or selecting a validation rule set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleSetError {
    #[error("duplicate rule {rule} in rule set bucket {kind:?}")]
    DuplicateRule { rule: &'static str, kind: NodeKind },

    #[error("unknown EDM version \"{version}\": expected 1.0, 1.1, 1.2, 2.0, 3.0 or 4.0")]
    UnknownVersion { version: String },
}

impl RuleSetError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("model.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let source = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let err = LoadError::InvalidJson { source };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn rule_set_error_display() {
        let err = RuleSetError::UnknownVersion {
            version: "9.9".into(),
        };
        assert_eq!(
            err.to_string(),
            "unknown EDM version \"9.9\": expected 1.0, 1.1, 1.2, 2.0, 3.0 or 4.0"
        );
        assert_eq!(err.exit_code(), 2);

        let err = RuleSetError::DuplicateRule {
            rule: "EntityTypeKeyMissing",
            kind: NodeKind::EntityType,
        };
        assert!(err.to_string().contains("EntityTypeKeyMissing"));
    }
}

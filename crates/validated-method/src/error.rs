//! Error types for method definition and invocation
//!
//! Two families are kept apart: [`DefinitionError`] is raised synchronously
//! while a method is being built and registered, [`MethodError`] travels
//! through the connection at call time and is serializable so it can cross
//! the wire unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single field that failed the final shape check of a definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Field name as written in a method definition
    pub field: String,
    /// What the field was expected to hold
    pub expected: String,
}

impl SchemaViolation {
    /// Create a new violation record
    pub fn new(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' must be {}", self.field, self.expected)
    }
}

/// Errors raised while building and registering a method
///
/// All of these are fatal for the definition that produced them: nothing is
/// registered on the connection when construction fails.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem
        message: String,
    },

    /// The definition did not have the required shape after mixins ran
    #[error("Schema error in '{method}': {}", join_violations(.violations))]
    Schema {
        /// Method name, or `<unnamed>` when the name itself is missing
        method: String,
        /// Every violated field, in declaration order
        violations: Vec<SchemaViolation>,
    },

    /// A mixin did not hand back a definition
    #[error("Error in {method} method: {} didn't return the options object.", mixin_label(.mixin))]
    MixinContract {
        /// Method name captured before the pipeline started
        method: String,
        /// Name of the offending mixin when it has one
        mixin: Option<String>,
    },
}

impl DefinitionError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a schema error from the collected violations
    pub fn schema(method: impl Into<String>, violations: Vec<SchemaViolation>) -> Self {
        Self::Schema {
            method: method.into(),
            violations,
        }
    }

    /// Create a mixin contract error
    pub fn mixin_contract(method: impl Into<String>, mixin: Option<&str>) -> Self {
        Self::MixinContract {
            method: method.into(),
            mixin: mixin.map(str::to_string),
        }
    }
}

fn join_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn mixin_label(mixin: &Option<String>) -> String {
    match mixin {
        Some(name) => format!("The function '{name}'"),
        None => "One of the mixins".to_string(),
    }
}

/// Errors produced while a method is being invoked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MethodError {
    /// `validate` handed back a value instead of nothing
    #[error("Returning from validate doesn't do anything; perhaps you meant to throw an error? (method '{method}')")]
    ValidationContract {
        /// Method whose validator broke the contract
        method: String,
    },

    /// Error raised by user code in `validate` or `run`
    #[error("{reason} [{error}]")]
    Raised {
        /// Machine-readable error code
        error: String,
        /// Human-readable reason
        reason: String,
        /// Optional structured details
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<Value>,
    },

    /// No handler is registered under the requested name
    #[error("Method '{method}' not found")]
    NotFound {
        /// Requested method name
        method: String,
    },

    /// The connection could not complete the call
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the failure
        message: String,
    },

    /// A handler finished without checking its arguments
    #[error("Argument check failed: {message}")]
    ArgumentCheck {
        /// Description of the unchecked call
        message: String,
    },
}

impl MethodError {
    /// Create a user-level error with a code and a reason
    pub fn raised(error: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Raised {
            error: error.into(),
            reason: reason.into(),
            details: None,
        }
    }

    /// Create a user-level error carrying structured details
    pub fn raised_with_details(
        error: impl Into<String>,
        reason: impl Into<String>,
        details: Value,
    ) -> Self {
        Self::Raised {
            error: error.into(),
            reason: reason.into(),
            details: Some(details),
        }
    }

    /// Create a not-found error
    pub fn not_found(method: impl Into<String>) -> Self {
        Self::NotFound {
            method: method.into(),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Error code for raised errors, `None` for everything else
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Raised { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Result of building a method
pub type DefinitionResult<T> = std::result::Result<T, DefinitionError>;

/// Result of invoking a method
pub type MethodResult<T> = std::result::Result<T, MethodError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixin_contract_message() {
        let named = DefinitionError::mixin_contract("todos.insert", Some("withAudit"));
        assert_eq!(
            named.to_string(),
            "Error in todos.insert method: The function 'withAudit' didn't return the options object."
        );

        let unnamed = DefinitionError::mixin_contract("todos.insert", None);
        assert_eq!(
            unnamed.to_string(),
            "Error in todos.insert method: One of the mixins didn't return the options object."
        );
    }

    #[test]
    fn test_schema_message_lists_fields() {
        let err = DefinitionError::schema(
            "todos.insert",
            vec![
                SchemaViolation::new("validate", "a function"),
                SchemaViolation::new("run", "a function"),
            ],
        );
        assert_eq!(
            err.to_string(),
            "Schema error in 'todos.insert': 'validate' must be a function, 'run' must be a function"
        );
    }

    #[test]
    fn test_raised_error_display_and_code() {
        let err = MethodError::raised("not-authorized", "You must be logged in");
        assert_eq!(err.to_string(), "You must be logged in [not-authorized]");
        assert_eq!(err.error_code(), Some("not-authorized"));
        assert_eq!(MethodError::not_found("x").error_code(), None);
    }

    #[test]
    fn test_method_error_serializes_with_kind_tag() {
        let err = MethodError::raised("validation-error", "bad input");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "raised");
        assert_eq!(json["error"], "validation-error");
        assert!(json.get("details").is_none());

        let back: MethodError = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
    }
}

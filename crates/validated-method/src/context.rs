//! Per-call invocation context
//!
//! A fresh [`InvocationContext`] is built by the connection every time a
//! registered handler fires. It is handed explicitly to `validate` and `run`
//! and discarded when the call settles.

use crate::connection::Side;
use std::collections::HashMap;
use uuid::Uuid;

/// Ambient state of a single method invocation
#[derive(Debug, Clone)]
pub struct InvocationContext {
    /// Name of the method being executed
    pub name: String,
    /// Unique id for this invocation
    pub operation_id: Uuid,
    /// Side of the connection the handler runs on
    pub side: Side,
    /// True when this run is a local stub simulating the remote call
    pub is_simulation: bool,
    /// Identity of the caller, when the connection knows it
    pub user_id: Option<String>,
    /// Identifier of the connection that delivered the call
    pub connection_id: Option<String>,
    /// Free-form data attached by the connection or by mixins
    pub metadata: HashMap<String, String>,
    arguments_checked: bool,
}

impl InvocationContext {
    /// Create a new context for a call arriving on `side`
    pub fn new(side: Side) -> Self {
        Self {
            name: String::new(),
            operation_id: Uuid::new_v4(),
            side,
            is_simulation: false,
            user_id: None,
            connection_id: None,
            metadata: HashMap::new(),
            arguments_checked: false,
        }
    }

    /// Create a context for a local stub run
    pub fn simulation() -> Self {
        Self {
            is_simulation: true,
            ..Self::new(Side::Initiating)
        }
    }

    /// Attach the caller identity
    pub fn with_user_id(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Attach the delivering connection id
    pub fn with_connection_id(mut self, connection_id: impl Into<String>) -> Self {
        self.connection_id = Some(connection_id.into());
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Record that the handler asserted its arguments
    pub fn mark_arguments_checked(&mut self) {
        self.arguments_checked = true;
    }

    /// Whether the handler asserted its arguments during this call
    pub fn arguments_checked(&self) -> bool {
        self.arguments_checked
    }
}

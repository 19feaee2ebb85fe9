//! Connection interface consumed by validated methods
//!
//! A connection owns the registry of named handlers and knows how to execute
//! a call, locally or remotely. Validated methods only ever talk to it
//! through the traits below. The enhanced surface is optional and probed at
//! construction time through [`Connection::enhanced`].

use crate::context::InvocationContext;
use crate::error::{DefinitionResult, MethodError, MethodResult};
use crate::local::LocalConnection;
use crate::options::ApplyOptions;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Which end of a connection code is running on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    /// The end that initiates calls and may hold local stubs (a client)
    Initiating,
    /// The end that answers calls authoritatively (a server)
    Responding,
}

impl Side {
    /// Check if this is the initiating side
    pub fn is_initiating(&self) -> bool {
        matches!(self, Self::Initiating)
    }
}

/// Handler a connection fires when a registered method is invoked
pub type MethodHandler =
    Arc<dyn Fn(&mut InvocationContext, Vec<Value>) -> MethodResult<Value> + Send + Sync>;

/// Settlement callback receiving the final outcome of a call
pub type Callback = Box<dyn FnOnce(MethodResult<Value>) + Send>;

/// Immediate outcome of an invocation primitive
///
/// `Ok(Some(value))` is a stub value surfaced before settlement, `Ok(None)`
/// means the result only arrives through the callback, and `Err` is a
/// synchronous failure.
pub type InvokeOutcome = MethodResult<Option<Value>>;

/// Plain registration and invocation surface
pub trait Connection: Send + Sync {
    /// Side this connection runs on
    fn side(&self) -> Side;

    /// Register a handler under `name`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `name` is already registered.
    fn register(&self, name: &str, handler: MethodHandler) -> DefinitionResult<()>;

    /// Invoke the method registered under `name`
    fn invoke(
        &self,
        name: &str,
        args: Vec<Value>,
        options: &ApplyOptions,
        callback: Option<Callback>,
    ) -> InvokeOutcome;

    /// The enhanced surface, when this connection has one
    fn enhanced(&self) -> Option<&dyn EnhancedConnection> {
        None
    }
}

/// Result-caching-enhanced registration and invocation surface
pub trait EnhancedConnection: Send + Sync {
    /// Register a handler under `name` on the enhanced surface
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `name` is already registered.
    fn register_enhanced(&self, name: &str, handler: MethodHandler) -> DefinitionResult<()>;

    /// Invoke the method registered under `name` through the enhanced surface
    fn invoke_enhanced(
        &self,
        name: &str,
        args: Vec<Value>,
        options: &ApplyOptions,
        callback: Option<Callback>,
    ) -> InvokeOutcome;
}

static DEFAULT_CONNECTION: Lazy<Arc<LocalConnection>> =
    Lazy::new(|| Arc::new(LocalConnection::new("default", Side::Responding)));

/// Process-wide connection used when a definition names none
pub fn default_connection() -> Arc<dyn Connection> {
    DEFAULT_CONNECTION.clone()
}

/// Run a settlement callback when one was supplied, logging errors otherwise
pub(crate) fn settle(name: &str, callback: Option<Callback>, outcome: MethodResult<Value>) {
    match callback {
        Some(callback) => callback(outcome),
        None => {
            if let Err(error) = &outcome {
                tracing::warn!(method = name, %error, "Method call failed with no callback to receive the error");
            }
        }
    }
}

/// Error used when a call is never settled
pub(crate) fn dropped_settlement(name: &str) -> MethodError {
    MethodError::connection(format!("call to '{name}' was dropped before it settled"))
}

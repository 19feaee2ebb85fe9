//! In-process connection
//!
//! [`LocalConnection`] keeps a registry of named handlers and executes them
//! in the calling thread. A responding connection answers calls directly. An
//! initiating connection runs its locally registered handler as a stub and
//! forwards the call to the responding connection it was linked to with
//! [`LocalConnection::connect`], which provides the authoritative result.

use crate::connection::{
    settle, Callback, Connection, EnhancedConnection, InvokeOutcome, MethodHandler, Side,
};
use crate::context::InvocationContext;
use crate::error::{DefinitionError, DefinitionResult, MethodError, MethodResult};
use crate::mode::RegistrationMode;
use crate::options::ApplyOptions;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

struct RegisteredHandler {
    mode: RegistrationMode,
    handler: MethodHandler,
}

/// Registry-backed connection executing handlers in process
pub struct LocalConnection {
    id: String,
    side: Side,
    audit_argument_checks: bool,
    handlers: RwLock<HashMap<String, RegisteredHandler>>,
    remote: RwLock<Option<Arc<LocalConnection>>>,
    user_id: RwLock<Option<String>>,
}

impl std::fmt::Debug for LocalConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalConnection")
            .field("id", &self.id)
            .field("side", &self.side)
            .field(
                "handlers",
                &format!("HashMap with {} entries", self.handlers.read().len()),
            )
            .field("linked", &self.remote.read().is_some())
            .finish()
    }
}

impl LocalConnection {
    /// Create a new connection on the given side
    pub fn new(id: impl Into<String>, side: Side) -> Self {
        Self {
            id: id.into(),
            side,
            audit_argument_checks: false,
            handlers: RwLock::new(HashMap::new()),
            remote: RwLock::new(None),
            user_id: RwLock::new(None),
        }
    }

    /// Create a responding connection
    pub fn responding(id: impl Into<String>) -> Self {
        Self::new(id, Side::Responding)
    }

    /// Create an initiating connection
    pub fn initiating(id: impl Into<String>) -> Self {
        Self::new(id, Side::Initiating)
    }

    /// Reject handlers that complete without asserting their arguments
    pub fn with_audit_argument_checks(mut self, enabled: bool) -> Self {
        self.audit_argument_checks = enabled;
        self
    }

    /// Link this connection to the responding end its calls are forwarded to
    pub fn connect(&self, remote: Arc<LocalConnection>) {
        debug!(connection = %self.id, remote = %remote.id, "Linking connection");
        *self.remote.write() = Some(remote);
    }

    /// Set the identity attached to calls made through this connection
    pub fn set_user_id(&self, user_id: Option<String>) {
        *self.user_id.write() = user_id;
    }

    /// Connection identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Check if a handler is registered under `name`
    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.read().contains_key(name)
    }

    /// Mode a handler was registered with
    pub fn registration_mode(&self, name: &str) -> Option<RegistrationMode> {
        self.handlers.read().get(name).map(|entry| entry.mode)
    }

    /// Names of all registered methods, sorted
    pub fn registered_methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered handlers
    pub fn handlers_len(&self) -> usize {
        self.handlers.read().len()
    }

    fn insert(
        &self,
        name: &str,
        mode: RegistrationMode,
        handler: MethodHandler,
    ) -> DefinitionResult<()> {
        let mut handlers = self.handlers.write();
        if handlers.contains_key(name) {
            return Err(DefinitionError::configuration(format!(
                "A method named '{name}' is already defined on connection '{}'",
                self.id
            )));
        }
        handlers.insert(name.to_string(), RegisteredHandler { mode, handler });
        debug!(connection = %self.id, method = name, %mode, "Registered method handler");
        Ok(())
    }

    fn handler(&self, name: &str) -> Option<MethodHandler> {
        self.handlers
            .read()
            .get(name)
            .map(|entry| entry.handler.clone())
    }

    /// Run the handler registered under `name` with a fresh context
    fn execute_handler(
        &self,
        name: &str,
        args: Vec<Value>,
        user_id: Option<String>,
        is_simulation: bool,
    ) -> MethodResult<Value> {
        // Cloned out so the registry lock is never held while user code runs
        let handler = self
            .handler(name)
            .ok_or_else(|| MethodError::not_found(name))?;

        let mut ctx = InvocationContext::new(self.side)
            .with_user_id(user_id)
            .with_connection_id(self.id.clone());
        ctx.is_simulation = is_simulation;

        let result = handler(&mut ctx, args);
        if self.audit_argument_checks && result.is_ok() && !ctx.arguments_checked() {
            return Err(MethodError::ArgumentCheck {
                message: format!("Did not check() all arguments during call to '{name}'"),
            });
        }
        result
    }

    fn dispatch(
        &self,
        mode: RegistrationMode,
        name: &str,
        args: Vec<Value>,
        options: &ApplyOptions,
        callback: Option<Callback>,
    ) -> InvokeOutcome {
        trace!(connection = %self.id, method = name, %mode, side = ?self.side, "Dispatching call");
        if let Some(registered) = self.registration_mode(name) {
            if registered != mode {
                debug!(method = name, %registered, requested = %mode, "Invocation surface differs from registration");
            }
        }

        match self.side {
            Side::Responding => self.answer(name, args, callback),
            Side::Initiating => self.simulate_and_forward(name, args, options, callback),
        }
    }

    fn answer(&self, name: &str, args: Vec<Value>, callback: Option<Callback>) -> InvokeOutcome {
        let user_id = self.user_id.read().clone();
        let outcome = self.execute_handler(name, args, user_id, false);
        match callback {
            Some(callback) => {
                callback(outcome);
                Ok(None)
            }
            None => outcome.map(Some),
        }
    }

    fn simulate_and_forward(
        &self,
        name: &str,
        args: Vec<Value>,
        options: &ApplyOptions,
        callback: Option<Callback>,
    ) -> InvokeOutcome {
        let user_id = self.user_id.read().clone();
        let stub = self
            .is_registered(name)
            .then(|| self.execute_handler(name, args.clone(), user_id.clone(), true));

        if let Some(Err(error)) = &stub {
            if options.throws_stub_exceptions() {
                return Err(error.clone());
            }
            warn!(method = name, %error, "Exception while simulating the effect of invoking method");
        }

        let remote = self.remote.read().clone();
        let settlement = match (remote, &stub) {
            (Some(remote), _) => remote.execute_handler(name, args, user_id, false),
            (None, Some(stub)) => stub.clone(),
            (None, None) => Err(MethodError::not_found(name)),
        };
        settle(name, callback, settlement);

        match stub {
            Some(Ok(value)) if options.returns_stub_value() => Ok(Some(value)),
            _ => Ok(None),
        }
    }
}

impl Connection for LocalConnection {
    fn side(&self) -> Side {
        self.side
    }

    fn register(&self, name: &str, handler: MethodHandler) -> DefinitionResult<()> {
        self.insert(name, RegistrationMode::Plain, handler)
    }

    fn invoke(
        &self,
        name: &str,
        args: Vec<Value>,
        options: &ApplyOptions,
        callback: Option<Callback>,
    ) -> InvokeOutcome {
        self.dispatch(RegistrationMode::Plain, name, args, options, callback)
    }

    fn enhanced(&self) -> Option<&dyn EnhancedConnection> {
        Some(self)
    }
}

impl EnhancedConnection for LocalConnection {
    fn register_enhanced(&self, name: &str, handler: MethodHandler) -> DefinitionResult<()> {
        self.insert(name, RegistrationMode::Enhanced, handler)
    }

    fn invoke_enhanced(
        &self,
        name: &str,
        args: Vec<Value>,
        options: &ApplyOptions,
        callback: Option<Callback>,
    ) -> InvokeOutcome {
        self.dispatch(RegistrationMode::Enhanced, name, args, options, callback)
    }
}

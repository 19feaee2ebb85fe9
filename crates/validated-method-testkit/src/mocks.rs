//! Recording collaborators
//!
//! [`RecordingConnection`] and [`RecordingCache`] stand in for a real
//! connection and caching service, keeping a log of everything validated
//! methods ask of them.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use validated_method::{
    ApplyOptions, CacheDescriptor, CachingService, Callback, Connection, DefinitionError,
    DefinitionResult, EnhancedConnection, InvocationContext, InvokeOutcome, MethodError,
    MethodHandler, MethodResult, RegistrationMode, Side,
};

/// A registration seen by the connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Method name
    pub name: String,
    /// Surface the method was registered on
    pub mode: RegistrationMode,
}

/// An invocation seen by the connection
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Method name
    pub name: String,
    /// Argument array as passed by the dispatcher
    pub args: Vec<Value>,
    /// Options forwarded with the call
    pub options: ApplyOptions,
    /// Surface the call came through
    pub mode: RegistrationMode,
    /// Whether a callback accompanied the call
    pub with_callback: bool,
}

#[derive(Debug, Clone)]
enum Script {
    Settle(MethodResult<Value>),
    ThrowSynchronously(MethodError),
}

/// Connection that records registrations and invocations
///
/// Unless scripted otherwise, invocations run the registered handler in
/// process and deliver its outcome to the callback.
pub struct RecordingConnection {
    side: Side,
    enhanced_surface: bool,
    handlers: Mutex<HashMap<String, MethodHandler>>,
    registrations: Mutex<Vec<Registration>>,
    invocations: Mutex<Vec<Invocation>>,
    script: Mutex<Option<Script>>,
}

impl RecordingConnection {
    /// Create a connection for `side` with both surfaces
    pub fn new(side: Side) -> Self {
        Self {
            side,
            enhanced_surface: true,
            handlers: Mutex::new(HashMap::new()),
            registrations: Mutex::new(Vec::new()),
            invocations: Mutex::new(Vec::new()),
            script: Mutex::new(None),
        }
    }

    /// Create an initiating-side connection
    pub fn initiating() -> Arc<Self> {
        Arc::new(Self::new(Side::Initiating))
    }

    /// Create a responding-side connection
    pub fn responding() -> Arc<Self> {
        Arc::new(Self::new(Side::Responding))
    }

    /// Create a connection with only the plain surface
    pub fn plain_only(side: Side) -> Arc<Self> {
        Arc::new(Self {
            enhanced_surface: false,
            ..Self::new(side)
        })
    }

    /// Settle every following call with `outcome` instead of running handlers
    pub fn settle_with(&self, outcome: MethodResult<Value>) {
        *self.script.lock() = Some(Script::Settle(outcome));
    }

    /// Fail every following call synchronously, without calling back
    pub fn throw_synchronously(&self, error: MethodError) {
        *self.script.lock() = Some(Script::ThrowSynchronously(error));
    }

    /// Registrations in the order they happened
    pub fn registrations(&self) -> Vec<Registration> {
        self.registrations.lock().clone()
    }

    /// Invocations in the order they happened
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().clone()
    }

    fn register_as(
        &self,
        name: &str,
        mode: RegistrationMode,
        handler: MethodHandler,
    ) -> DefinitionResult<()> {
        let mut handlers = self.handlers.lock();
        if handlers.contains_key(name) {
            return Err(DefinitionError::configuration(format!(
                "A method named '{name}' is already defined"
            )));
        }
        handlers.insert(name.to_string(), handler);
        self.registrations.lock().push(Registration {
            name: name.to_string(),
            mode,
        });
        Ok(())
    }

    fn invoke_as(
        &self,
        mode: RegistrationMode,
        name: &str,
        args: Vec<Value>,
        options: &ApplyOptions,
        callback: Option<Callback>,
    ) -> InvokeOutcome {
        self.invocations.lock().push(Invocation {
            name: name.to_string(),
            args: args.clone(),
            options: options.clone(),
            mode,
            with_callback: callback.is_some(),
        });

        let script = self.script.lock().clone();
        let outcome = match script {
            Some(Script::ThrowSynchronously(error)) => return Err(error),
            Some(Script::Settle(outcome)) => outcome,
            None => {
                let handler = self.handlers.lock().get(name).cloned();
                match handler {
                    Some(handler) => {
                        let mut ctx = InvocationContext::new(self.side)
                            .with_connection_id("recording");
                        handler(&mut ctx, args)
                    }
                    None => Err(MethodError::not_found(name)),
                }
            }
        };

        match callback {
            Some(callback) => {
                callback(outcome);
                Ok(None)
            }
            None => outcome.map(Some),
        }
    }
}

impl Connection for RecordingConnection {
    fn side(&self) -> Side {
        self.side
    }

    fn register(&self, name: &str, handler: MethodHandler) -> DefinitionResult<()> {
        self.register_as(name, RegistrationMode::Plain, handler)
    }

    fn invoke(
        &self,
        name: &str,
        args: Vec<Value>,
        options: &ApplyOptions,
        callback: Option<Callback>,
    ) -> InvokeOutcome {
        self.invoke_as(RegistrationMode::Plain, name, args, options, callback)
    }

    fn enhanced(&self) -> Option<&dyn EnhancedConnection> {
        if self.enhanced_surface {
            Some(self)
        } else {
            None
        }
    }
}

impl EnhancedConnection for RecordingConnection {
    fn register_enhanced(&self, name: &str, handler: MethodHandler) -> DefinitionResult<()> {
        self.register_as(name, RegistrationMode::Enhanced, handler)
    }

    fn invoke_enhanced(
        &self,
        name: &str,
        args: Vec<Value>,
        options: &ApplyOptions,
        callback: Option<Callback>,
    ) -> InvokeOutcome {
        self.invoke_as(RegistrationMode::Enhanced, name, args, options, callback)
    }
}

/// Caching service that keeps every descriptor it receives
#[derive(Debug, Default)]
pub struct RecordingCache {
    raw: Mutex<Vec<CacheDescriptor>>,
    collection: Mutex<Vec<CacheDescriptor>>,
}

impl RecordingCache {
    /// Create a new shared cache
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Descriptors received through `cache_method_result`
    pub fn raw(&self) -> Vec<CacheDescriptor> {
        self.raw.lock().clone()
    }

    /// Descriptors received through `cache_method_result_in_minimongo`
    pub fn collection(&self) -> Vec<CacheDescriptor> {
        self.collection.lock().clone()
    }

    /// Total number of descriptors received
    pub fn total(&self) -> usize {
        self.raw.lock().len() + self.collection.lock().len()
    }
}

impl CachingService for RecordingCache {
    fn cache_method_result(&self, descriptor: CacheDescriptor) {
        self.raw.lock().push(descriptor);
    }

    fn cache_method_result_in_minimongo(&self, descriptor: CacheDescriptor) {
        self.collection.lock().push(descriptor);
    }
}

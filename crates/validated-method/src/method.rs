//! Validated method instances
//!
//! [`ValidatedMethod::new`] normalizes a definition, picks the registration
//! mode and registers exactly one handler on the connection. The instance is
//! immutable afterwards; clones share it.

use crate::caching::CachingService;
use crate::checks::check_any;
use crate::connection::{Connection, MethodHandler};
use crate::context::InvocationContext;
use crate::definition::{MethodDefinition, Runner, Validator};
use crate::error::{DefinitionError, DefinitionResult, MethodResult};
use crate::execution::execute;
use crate::mixin::Mixin;
use crate::mode::RegistrationMode;
use crate::normalize::normalize;
use crate::options::ApplyOptions;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub(crate) struct MethodInner {
    pub(crate) name: String,
    pub(crate) validate: Validator,
    pub(crate) run: Runner,
    pub(crate) mixins: Vec<Mixin>,
    pub(crate) connection: Arc<dyn Connection>,
    pub(crate) caching: Option<Arc<dyn CachingService>>,
    pub(crate) apply_options: ApplyOptions,
    pub(crate) mode: RegistrationMode,
}

/// A composed method registered on its connection
#[derive(Clone)]
pub struct ValidatedMethod {
    pub(crate) inner: Arc<MethodInner>,
}

impl fmt::Debug for ValidatedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedMethod")
            .field("name", &self.inner.name)
            .field("mode", &self.inner.mode)
            .field("mixins", &self.inner.mixins)
            .field("apply_options", &self.inner.apply_options)
            .finish()
    }
}

impl ValidatedMethod {
    /// Build a method from `definition` and register it
    ///
    /// # Errors
    ///
    /// Returns any normalization error, or the connection's error when it
    /// refuses the registration. Nothing is registered on failure.
    pub fn new(definition: MethodDefinition) -> DefinitionResult<Self> {
        let normalized = normalize(definition)?;

        let method = Self {
            inner: Arc::new(MethodInner {
                name: normalized.name,
                validate: normalized.validate,
                run: normalized.run,
                mixins: normalized.mixins,
                connection: normalized.connection,
                caching: normalized.caching,
                apply_options: normalized.apply_options,
                mode: normalized.mode,
            }),
        };
        method.register()?;
        Ok(method)
    }

    fn register(&self) -> DefinitionResult<()> {
        let inner = &self.inner;
        let handler = self.handler();

        match inner.mode {
            RegistrationMode::Plain => inner.connection.register(&inner.name, handler)?,
            RegistrationMode::Enhanced => {
                let enhanced = inner.connection.enhanced().ok_or_else(|| {
                    DefinitionError::configuration(format!(
                        "Connection lost its enhanced surface while registering '{}'",
                        inner.name
                    ))
                })?;
                enhanced.register_enhanced(&inner.name, handler)?;
            }
        }

        debug!(method = %inner.name, mode = %inner.mode, side = ?inner.connection.side(), "Validated method registered");
        Ok(())
    }

    // Must not capture the connection: the connection owns this handler
    fn handler(&self) -> MethodHandler {
        let name = self.inner.name.clone();
        let validate = self.inner.validate.clone();
        let run = self.inner.run.clone();
        Arc::new(move |ctx: &mut InvocationContext, args: Vec<Value>| {
            check_any(ctx, &args);
            let args = args.into_iter().next().unwrap_or(Value::Null);
            execute(&name, &validate, &run, ctx, &args)
        })
    }

    /// Execute validate → run for one invocation
    ///
    /// Connections reach this through the registered handler; it is public so
    /// that methods can be exercised directly, without a connection.
    pub fn execute(&self, ctx: &mut InvocationContext, args: &Value) -> MethodResult<Value> {
        execute(&self.inner.name, &self.inner.validate, &self.inner.run, ctx, args)
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Options forwarded on every call, merged over the defaults
    pub fn apply_options(&self) -> &ApplyOptions {
        &self.inner.apply_options
    }

    /// Mode the method was registered with
    pub fn mode(&self) -> RegistrationMode {
        self.inner.mode
    }

    /// Mixins that were applied at construction
    pub fn mixins(&self) -> &[Mixin] {
        &self.inner.mixins
    }

    /// Connection the method is registered on
    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.inner.connection
    }
}

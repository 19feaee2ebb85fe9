//! Method definitions
//!
//! A [`MethodDefinition`] is the declarative description of a method before
//! it is composed and registered. Every field is optional at this stage: the
//! mixin pipeline may fill fields in, and the normalizer checks the final
//! shape once all mixins have run.

use crate::caching::CachingService;
use crate::config::MethodsConfig;
use crate::connection::Connection;
use crate::context::InvocationContext;
use crate::error::{DefinitionResult, MethodResult};
use crate::method::ValidatedMethod;
use crate::mixin::Mixin;
use crate::options::ApplyOptions;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// What a validator hands back: `Ok(None)` when the arguments are accepted
pub type ValidateOutcome = MethodResult<Option<Value>>;

type ValidateFn = dyn Fn(&InvocationContext, &Value) -> ValidateOutcome + Send + Sync;
type RunFn = dyn Fn(&InvocationContext, &Value) -> MethodResult<Value> + Send + Sync;

/// Argument validation step of a method
#[derive(Clone)]
pub struct Validator(Arc<ValidateFn>);

impl Validator {
    /// Create a validator that accepts or rejects its arguments
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&InvocationContext, &Value) -> MethodResult<()> + Send + Sync + 'static,
    {
        Self(Arc::new(move |ctx: &InvocationContext, args: &Value| {
            check(ctx, args).map(|()| None)
        }))
    }

    /// Create a validator from a function that may hand back a value
    ///
    /// Handing back `Some(_)` is a contract violation reported when the method
    /// executes; this exists for validators adapted from code that returns
    /// values.
    pub fn returning<F>(check: F) -> Self
    where
        F: Fn(&InvocationContext, &Value) -> ValidateOutcome + Send + Sync + 'static,
    {
        Self(Arc::new(check))
    }

    /// Validator accepting any arguments
    pub fn permissive() -> Self {
        Self(Arc::new(|_ctx: &InvocationContext, _args: &Value| Ok(None)))
    }

    /// Run the validator
    pub fn check(&self, ctx: &InvocationContext, args: &Value) -> ValidateOutcome {
        (self.0)(ctx, args)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

/// Business logic of a method
#[derive(Clone)]
pub struct Runner(Arc<RunFn>);

impl Runner {
    /// Create a runner
    pub fn new<F>(run: F) -> Self
    where
        F: Fn(&InvocationContext, &Value) -> MethodResult<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(run))
    }

    /// Run the business logic
    pub fn run(&self, ctx: &InvocationContext, args: &Value) -> MethodResult<Value> {
        (self.0)(ctx, args)
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Runner(..)")
    }
}

/// How a method validates its arguments
#[derive(Debug, Clone)]
pub enum Validation {
    /// The method takes no meaningful arguments
    NoArguments,
    /// Arguments are checked by the given validator
    With(Validator),
}

impl Validation {
    /// Resolve into a concrete validator
    pub fn into_validator(self) -> Validator {
        match self {
            Self::NoArguments => Validator::permissive(),
            Self::With(validator) => validator,
        }
    }
}

/// Declarative description of a validated method
#[derive(Clone, Default)]
pub struct MethodDefinition {
    /// Unique method name
    pub name: Option<String>,
    /// Argument validation
    pub validate: Option<Validation>,
    /// Business logic
    pub run: Option<Runner>,
    /// Transforms applied before registration, in order
    pub mixins: Vec<Mixin>,
    /// Connection to register on; the default connection when absent
    pub connection: Option<Arc<dyn Connection>>,
    /// Receiver of cache descriptors; required when result caching is on
    pub caching: Option<Arc<dyn CachingService>>,
    /// Options forwarded to the connection on every call
    pub apply_options: Option<ApplyOptions>,
}

impl fmt::Debug for MethodDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDefinition")
            .field("name", &self.name)
            .field("validate", &self.validate)
            .field("run", &self.run)
            .field("mixins", &self.mixins)
            .field("connection", &self.connection.as_ref().map(|_| ".."))
            .field("caching", &self.caching.as_ref().map(|_| ".."))
            .field("apply_options", &self.apply_options)
            .finish()
    }
}

impl MethodDefinition {
    /// Start a definition for the method `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Validate arguments with `check`
    pub fn validate<F>(mut self, check: F) -> Self
    where
        F: Fn(&InvocationContext, &Value) -> MethodResult<()> + Send + Sync + 'static,
    {
        self.validate = Some(Validation::With(Validator::new(check)));
        self
    }

    /// Use an already-built validator
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validate = Some(Validation::With(validator));
        self
    }

    /// Declare that the method takes no arguments
    pub fn no_arguments(mut self) -> Self {
        self.validate = Some(Validation::NoArguments);
        self
    }

    /// Set the business logic
    pub fn run<F>(mut self, run: F) -> Self
    where
        F: Fn(&InvocationContext, &Value) -> MethodResult<Value> + Send + Sync + 'static,
    {
        self.run = Some(Runner::new(run));
        self
    }

    /// Append a mixin
    pub fn mixin(mut self, mixin: Mixin) -> Self {
        self.mixins.push(mixin);
        self
    }

    /// Register on `connection` instead of the default connection
    pub fn connection(mut self, connection: Arc<dyn Connection>) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Send cache descriptors to `caching`
    pub fn caching(mut self, caching: Arc<dyn CachingService>) -> Self {
        self.caching = Some(caching);
        self
    }

    /// Set the apply options
    pub fn apply_options(mut self, options: ApplyOptions) -> Self {
        self.apply_options = Some(options);
        self
    }

    /// Layer the options configured for this method under the explicit ones
    pub fn with_config(mut self, config: &MethodsConfig) -> Self {
        if let Some(name) = &self.name {
            let configured = config.options_for(name);
            let explicit = self.apply_options.take().unwrap_or_default();
            self.apply_options = Some(explicit.merged_over(&configured));
        }
        self
    }

    /// Compose, check and register the method
    ///
    /// # Errors
    ///
    /// Returns a [`crate::DefinitionError`] when the definition is invalid or
    /// the connection refuses the registration.
    pub fn build(self) -> DefinitionResult<ValidatedMethod> {
        ValidatedMethod::new(self)
    }
}

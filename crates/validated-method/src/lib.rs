//! # Validated Method
//!
//! Remote-invocation methods that keep argument validation apart from
//! business logic.
//!
//! A [`MethodDefinition`] names the method and supplies `validate` and `run`.
//! Mixins transform the definition before it is checked; the result is
//! registered on a [`Connection`] through its plain or enhanced surface,
//! depending on the caching options. Calls made with
//! [`ValidatedMethod::call`] run through the connection, and on the
//! initiating side successful results can be handed to a
//! [`CachingService`].
//!
//! ```rust,no_run
//! use serde_json::json;
//! use validated_method::{MethodDefinition, MethodError};
//!
//! let method = MethodDefinition::new("todos.setDone")
//!     .validate(|_ctx, args| {
//!         if args["id"].is_string() {
//!             Ok(())
//!         } else {
//!             Err(MethodError::raised("validation-error", "id must be a string"))
//!         }
//!     })
//!     .run(|_ctx, args| Ok(json!({ "updated": args["id"] })))
//!     .build()?;
//!
//! let result = method.call(json!({ "id": "abc" }), None)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod caching;
pub mod checks;
pub mod config;
pub mod connection;
pub mod context;
pub mod definition;
pub mod dispatch;
pub mod error;
pub mod execution;
pub mod local;
pub mod method;
pub mod mixin;
pub mod mode;
pub mod normalize;
pub mod options;

pub use caching::{CacheDescriptor, CachingService};
pub use checks::check_any;
pub use config::MethodsConfig;
pub use connection::{
    default_connection, Callback, Connection, EnhancedConnection, InvokeOutcome, MethodHandler,
    Side,
};
pub use context::InvocationContext;
pub use definition::{MethodDefinition, Runner, ValidateOutcome, Validation, Validator};
pub use error::{DefinitionError, DefinitionResult, MethodError, MethodResult, SchemaViolation};
pub use execution::ExecutionState;
pub use local::LocalConnection;
pub use method::ValidatedMethod;
pub use mixin::{apply_mixins, authenticated_mixin, logging_mixin, Mixin};
pub use mode::RegistrationMode;
pub use options::ApplyOptions;

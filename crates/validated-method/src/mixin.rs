//! Mixin pipeline
//!
//! Mixins are transforms over a [`MethodDefinition`] composed as a left fold:
//! each one receives the definition produced by the previous one. Returning
//! `None` breaks the contract and halts construction at that mixin.

use crate::context::InvocationContext;
use crate::definition::{MethodDefinition, Runner};
use crate::error::{DefinitionError, DefinitionResult, MethodError};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

type TransformFn = dyn Fn(MethodDefinition) -> Option<MethodDefinition> + Send + Sync;

/// A named transform over a method definition
#[derive(Clone)]
pub struct Mixin {
    name: Option<String>,
    transform: Arc<TransformFn>,
}

impl Mixin {
    /// Create a named mixin
    pub fn named<F>(name: impl Into<String>, transform: F) -> Self
    where
        F: Fn(MethodDefinition) -> Option<MethodDefinition> + Send + Sync + 'static,
    {
        Self {
            name: Some(name.into()),
            transform: Arc::new(transform),
        }
    }

    /// Create a mixin without a name
    ///
    /// Errors raised for it fall back to a generic description.
    pub fn anonymous<F>(transform: F) -> Self
    where
        F: Fn(MethodDefinition) -> Option<MethodDefinition> + Send + Sync + 'static,
    {
        Self {
            name: None,
            transform: Arc::new(transform),
        }
    }

    /// Mixin name, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Apply the transform
    pub fn apply(&self, definition: MethodDefinition) -> Option<MethodDefinition> {
        (self.transform)(definition)
    }
}

impl fmt::Debug for Mixin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mixin").field("name", &self.name).finish()
    }
}

/// Fold `mixins` over `definition`, in order
///
/// # Errors
///
/// Returns [`DefinitionError::MixinContract`] for the first mixin that hands
/// back no definition; later mixins never run.
pub fn apply_mixins(
    definition: MethodDefinition,
    mixins: &[Mixin],
) -> DefinitionResult<MethodDefinition> {
    // Captured up front so errors name the method even if a mixin renamed it
    let method = definition.name.clone().unwrap_or_default();

    mixins
        .iter()
        .enumerate()
        .try_fold(definition, |current, (index, mixin)| {
            trace!(method = %method, index, mixin = ?mixin.name(), "Applying mixin");
            mixin
                .apply(current)
                .ok_or_else(|| DefinitionError::mixin_contract(method.clone(), mixin.name()))
        })
}

/// Mixin that emits tracing events around every run
pub fn logging_mixin() -> Mixin {
    Mixin::named("logging", |mut definition: MethodDefinition| {
        let Some(inner) = definition.run.take() else {
            return Some(definition);
        };
        definition.run = Some(Runner::new(move |ctx: &InvocationContext, args: &Value| {
            let started = Instant::now();
            let result = inner.run(ctx, args);
            debug!(
                method = %ctx.name,
                operation_id = %ctx.operation_id,
                simulation = ctx.is_simulation,
                ok = result.is_ok(),
                elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
                "Method run finished"
            );
            result
        }));
        Some(definition)
    })
}

/// Mixin rejecting invocations that carry no caller identity
///
/// The check runs before the wrapped business logic, after validation.
pub fn authenticated_mixin() -> Mixin {
    Mixin::named("authenticated", |mut definition: MethodDefinition| {
        let Some(inner) = definition.run.take() else {
            return Some(definition);
        };
        definition.run = Some(Runner::new(move |ctx: &InvocationContext, args: &Value| {
            if ctx.user_id.is_none() {
                return Err(MethodError::raised(
                    "not-authorized",
                    format!("You must be logged in to call '{}'", ctx.name),
                ));
            }
            inner.run(ctx, args)
        }));
        Some(definition)
    })
}

//! Validate → run execution protocol
//!
//! Invoked by the connection whenever a registered handler fires:
//!
//! ```text
//! Received → Validating → (Validated | Rejected) → Running → (Completed | Failed)
//! ```
//!
//! `run` is only reached from `Validated`, so business logic never sees
//! arguments its validator did not accept.

use crate::context::InvocationContext;
use crate::definition::{Runner, Validator};
use crate::error::{MethodError, MethodResult};
use serde_json::Value;
use std::fmt;
use tracing::trace;

/// States an invocation moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    /// Context built and named
    Received,
    /// Validator running
    Validating,
    /// Validator accepted the arguments
    Validated,
    /// Validator raised an error
    Rejected,
    /// Business logic running
    Running,
    /// Business logic produced a result
    Completed,
    /// Business logic or the validator contract failed
    Failed,
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

fn enter(ctx: &InvocationContext, state: ExecutionState) {
    trace!(method = %ctx.name, operation_id = %ctx.operation_id, %state, "Execution state");
}

/// Run `validate` then `run` for one invocation
///
/// # Errors
///
/// - [`MethodError::ValidationContract`] when the validator hands back a value;
///   `run` is not invoked.
/// - Any error raised by `validate` or `run`, unchanged.
pub fn execute(
    name: &str,
    validate: &Validator,
    run: &Runner,
    ctx: &mut InvocationContext,
    args: &Value,
) -> MethodResult<Value> {
    ctx.name = name.to_string();
    enter(ctx, ExecutionState::Received);

    enter(ctx, ExecutionState::Validating);
    match validate.check(ctx, args) {
        Ok(None) => enter(ctx, ExecutionState::Validated),
        Ok(Some(_)) => {
            enter(ctx, ExecutionState::Failed);
            return Err(MethodError::ValidationContract {
                method: name.to_string(),
            });
        }
        Err(error) => {
            enter(ctx, ExecutionState::Rejected);
            return Err(error);
        }
    }

    enter(ctx, ExecutionState::Running);
    let result = run.run(ctx, args);
    enter(
        ctx,
        if result.is_ok() {
            ExecutionState::Completed
        } else {
            ExecutionState::Failed
        },
    );
    result
}

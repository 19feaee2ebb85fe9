//! Argument assertions run by registered handlers

use crate::context::InvocationContext;
use serde_json::Value;
use tracing::trace;

/// Accept any arguments, recording that they were checked
///
/// Validated methods always check their arguments in `validate`, so the
/// handler asserts nothing itself. Marking the context keeps argument-check
/// auditing on the connection satisfied.
pub fn check_any(ctx: &mut InvocationContext, args: &[Value]) {
    trace!(method = %ctx.name, count = args.len(), "Arguments accepted by the opaque check");
    ctx.mark_arguments_checked();
}

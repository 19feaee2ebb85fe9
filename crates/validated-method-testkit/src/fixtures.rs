//! Definition fixtures and spies

use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use validated_method::{Callback, MethodDefinition, MethodResult, Mixin};

/// Records the arguments of every call it sees
#[derive(Debug, Clone, Default)]
pub struct Spy {
    calls: Arc<Mutex<Vec<Value>>>,
}

impl Spy {
    /// Create a new spy
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one call
    pub fn record(&self, args: &Value) {
        self.calls.lock().push(args.clone());
    }

    /// Number of recorded calls
    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Arguments of every recorded call
    pub fn calls(&self) -> Vec<Value> {
        self.calls.lock().clone()
    }
}

/// Shared log of settlement outcomes
#[derive(Debug, Clone, Default)]
pub struct Settlements {
    outcomes: Arc<Mutex<Vec<MethodResult<Value>>>>,
}

impl Settlements {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback appending to this log
    pub fn callback(&self) -> Callback {
        let outcomes = self.outcomes.clone();
        Box::new(move |outcome| outcomes.lock().push(outcome))
    }

    /// Outcomes received so far
    pub fn outcomes(&self) -> Vec<MethodResult<Value>> {
        self.outcomes.lock().clone()
    }
}

/// Method accepting any arguments and returning `result`, recording runs on `spy`
pub fn returning_definition(name: &str, spy: &Spy, result: Value) -> MethodDefinition {
    let spy = spy.clone();
    MethodDefinition::new(name)
        .validate(|_ctx, _args| Ok(()))
        .run(move |_ctx, args| {
            spy.record(args);
            Ok(result.clone())
        })
}

/// Method taking no arguments and returning its own name
pub fn no_argument_definition(name: &str) -> MethodDefinition {
    MethodDefinition::new(name)
        .no_arguments()
        .run(|ctx, _args| Ok(Value::String(ctx.name.clone())))
}

/// Pass-through mixin appending `label` to `log` when applied
pub fn recording_mixin(label: &str, log: &Arc<Mutex<Vec<String>>>) -> Mixin {
    let label = label.to_string();
    let log = log.clone();
    Mixin::named(label.clone(), move |definition| {
        log.lock().push(label.clone());
        Some(definition)
    })
}

/// Mixin that hands back no definition
pub fn breaking_mixin(name: Option<&str>) -> Mixin {
    match name {
        Some(name) => Mixin::named(name, |_definition| None),
        None => Mixin::anonymous(|_definition| None),
    }
}

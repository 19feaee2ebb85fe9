//! Property-testing strategies

use proptest::prelude::*;
use serde_json::{json, Value};
use validated_method::ApplyOptions;

/// Method names of the form `module.methodN`
pub fn arb_method_name() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["todos", "lists", "users", "billing"]),
        0u32..1000,
    )
        .prop_map(|(module, n)| format!("{module}.method{n}"))
}

/// Small JSON argument objects
pub fn arb_args() -> impl Strategy<Value = Value> {
    (any::<i64>(), any::<bool>(), prop::option::of(0u32..100)).prop_map(|(x, flag, limit)| {
        json!({ "x": x, "flag": flag, "limit": limit })
    })
}

/// Apply options with every flag independently set, unset or cleared
///
/// Both cache flags may come out true; filter with
/// [`ApplyOptions::caches_result`] when a valid definition is needed.
pub fn arb_apply_options() -> impl Strategy<Value = ApplyOptions> {
    (
        prop::option::of(any::<bool>()),
        prop::option::of(any::<bool>()),
        prop::option::of(any::<bool>()),
        prop::option::of(any::<bool>()),
        prop::option::of(any::<bool>()),
        prop::option::of(0u64..86_400_000),
    )
        .prop_map(|(stub, throw, enhanced, raw, minimongo, duration)| ApplyOptions {
            return_stub_value: stub,
            throw_stub_exceptions: throw,
            enhanced,
            cache_method_result: raw,
            cache_method_result_in_minimongo: minimongo,
            cache_duration_ms: duration,
            ..ApplyOptions::default()
        })
}

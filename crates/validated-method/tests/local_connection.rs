//! End-to-end tests over a linked pair of in-process connections

#![allow(clippy::unwrap_used)]

use assert_matches::assert_matches;
use serde_json::{json, Value};
use std::sync::Arc;
use validated_method::{
    authenticated_mixin, logging_mixin, ApplyOptions, LocalConnection, MethodDefinition,
    MethodError, RegistrationMode, ValidatedMethod,
};
use validated_method_testkit::*;

/// Same definition registered on both ends, the way shared method code is
fn pair(
    definition: impl Fn() -> MethodDefinition,
) -> (Arc<LocalConnection>, Arc<LocalConnection>, ValidatedMethod) {
    let server = Arc::new(LocalConnection::responding("server").with_audit_argument_checks(true));
    let client = Arc::new(LocalConnection::initiating("client"));
    client.connect(server.clone());

    definition().connection(server.clone()).build().unwrap();
    let method = definition().connection(client.clone()).build().unwrap();
    (client, server, method)
}

fn increment() -> MethodDefinition {
    MethodDefinition::new("counter.increment")
        .validate(|_ctx, args| match args["by"].as_i64() {
            Some(by) if by > 0 => Ok(()),
            _ => Err(MethodError::raised("validation-error", "'by' must be a positive integer")),
        })
        .run(|ctx, args| {
            let by = args["by"].as_i64().unwrap_or_default();
            Ok(json!({ "by": by, "simulated": ctx.is_simulation }))
        })
}

#[test]
fn test_client_returns_stub_and_settles_with_server_result() {
    init_test_tracing();
    let (_client, server, method) = pair(increment);
    assert!(server.is_registered("counter.increment"));

    let settlements = Settlements::new();
    let stub = method.call(json!({ "by": 2 }), Some(settlements.callback()));

    assert_eq!(stub, Ok(Some(json!({ "by": 2, "simulated": true }))));
    assert_eq!(
        settlements.outcomes(),
        vec![Ok::<Value, MethodError>(json!({ "by": 2, "simulated": false }))]
    );
}

#[test]
fn test_stub_validation_failure_reaches_callback() {
    let (_client, _server, method) = pair(increment);

    let settlements = Settlements::new();
    let outcome = method.call(json!({ "by": 0 }), Some(settlements.callback()));

    assert_eq!(outcome, Ok(None));
    assert_matches!(
        settlements.outcomes().as_slice(),
        [Err(MethodError::Raised { error, .. })] if error == "validation-error"
    );
}

#[test]
fn test_stub_value_can_be_suppressed() {
    let (_client, _server, method) = pair(|| {
        increment().apply_options(ApplyOptions::default().with_return_stub_value(false))
    });

    let settlements = Settlements::new();
    assert_eq!(
        method.call(json!({ "by": 1 }), Some(settlements.callback())),
        Ok(None)
    );
    assert_eq!(settlements.outcomes().len(), 1);
}

#[test]
fn test_cached_method_goes_through_enhanced_surface() {
    let cache = RecordingCache::new();
    let (client, server, method) = pair(|| {
        increment()
            .caching(cache.clone())
            .apply_options(ApplyOptions::default().with_cache_method_result(true))
    });

    assert_eq!(
        client.registration_mode("counter.increment"),
        Some(RegistrationMode::Enhanced)
    );
    assert_eq!(
        server.registration_mode("counter.increment"),
        Some(RegistrationMode::Enhanced)
    );

    method.call(json!({ "by": 5 }), None).unwrap();

    let stored = cache.raw();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].args, vec![json!({ "by": 5 })]);
    assert_eq!(stored[0].data, json!({ "by": 5, "simulated": false }));
}

#[test]
fn test_authenticated_method_follows_connection_identity() {
    let (client, server, method) = pair(|| {
        no_argument_definition("account.me")
            .mixin(authenticated_mixin())
            .mixin(logging_mixin())
            .apply_options(ApplyOptions::default().with_throw_stub_exceptions(false))
    });

    let settlements = Settlements::new();
    method.call(json!({}), Some(settlements.callback())).unwrap();
    assert_matches!(
        settlements.outcomes().as_slice(),
        [Err(err)] if err.error_code() == Some("not-authorized")
    );

    client.set_user_id(Some("alice".into()));
    server.set_user_id(Some("alice".into()));
    let settlements = Settlements::new();
    method.call(json!({}), Some(settlements.callback())).unwrap();
    assert_eq!(
        settlements.outcomes(),
        vec![Ok::<Value, MethodError>(json!("account.me"))]
    );
}

#[tokio::test]
async fn test_call_async_over_local_pair() {
    let (_client, _server, method) = pair(increment);
    let value = method.call_async(json!({ "by": 3 })).await.unwrap();
    assert_eq!(value, json!({ "by": 3, "simulated": false }));
}

#[test]
fn test_default_connection_answers_directly() {
    let method = no_argument_definition("local.defaultAnswer").build().unwrap();
    assert_eq!(
        method.call(json!({}), None),
        Ok(Some(json!("local.defaultAnswer")))
    );
}

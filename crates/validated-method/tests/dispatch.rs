//! Call dispatcher tests: sides, surfaces, caching hooks and sync failures

#![allow(clippy::unwrap_used)]

use assert_matches::assert_matches;
use serde_json::{json, Value};
use std::sync::Arc;
use validated_method::{
    ApplyOptions, CacheDescriptor, Connection, MethodError, RegistrationMode, Side,
    ValidatedMethod,
};
use validated_method_testkit::*;

fn cached_method(
    connection: &Arc<RecordingConnection>,
    cache: &Arc<RecordingCache>,
    options: ApplyOptions,
) -> ValidatedMethod {
    returning_definition("todos.get", &Spy::new(), json!({ "id": "abc" }))
        .connection(connection.clone())
        .caching(cache.clone())
        .apply_options(options)
        .build()
        .unwrap()
}

#[test]
fn test_initiating_call_caches_raw_result_once() {
    let connection = RecordingConnection::initiating();
    let cache = RecordingCache::new();
    let method = cached_method(
        &connection,
        &cache,
        ApplyOptions::default()
            .with_cache_method_result(true)
            .with_cache_duration_ms(60_000),
    );

    let settlements = Settlements::new();
    let outcome = method.call(json!({ "x": 1 }), Some(settlements.callback()));

    assert_eq!(outcome, Ok(None));
    assert_eq!(
        cache.raw(),
        vec![CacheDescriptor {
            name: "todos.get".into(),
            args: vec![json!({ "x": 1 })],
            data: json!({ "id": "abc" }),
            collection_name: None,
            duration_ms: Some(60_000),
        }]
    );
    assert!(cache.collection().is_empty());
    assert_eq!(
        settlements.outcomes(),
        vec![Ok::<Value, MethodError>(json!({ "id": "abc" }))]
    );

    let invocations = connection.invocations();
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].mode, RegistrationMode::Enhanced);
    assert_eq!(invocations[0].args, vec![json!({ "x": 1 })]);
    assert!(invocations[0].with_callback);
}

#[test]
fn test_initiating_call_caches_into_collection() {
    let connection = RecordingConnection::initiating();
    let cache = RecordingCache::new();
    let method = cached_method(
        &connection,
        &cache,
        ApplyOptions::default()
            .with_cache_method_result_in_minimongo(true)
            .with_collection_name("todos"),
    );

    method.call(json!({ "x": 2 }), None).unwrap();

    assert!(cache.raw().is_empty());
    let stored = cache.collection();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].collection_name.as_deref(), Some("todos"));
    assert_eq!(stored[0].args, vec![json!({ "x": 2 })]);
    assert_eq!(stored[0].duration_ms, None);
}

#[test]
fn test_responding_call_never_caches() {
    let connection = RecordingConnection::responding();
    let cache = RecordingCache::new();
    let method = cached_method(
        &connection,
        &cache,
        ApplyOptions::default().with_cache_method_result(true),
    );

    let outcome = method.call(json!({ "x": 1 }), None);

    assert_eq!(outcome, Ok(Some(json!({ "id": "abc" }))));
    assert_eq!(cache.total(), 0);
    // Always the plain surface on the responding side
    assert_eq!(connection.invocations()[0].mode, RegistrationMode::Plain);
}

#[test]
fn test_failed_settlement_is_not_cached() {
    let connection = RecordingConnection::initiating();
    connection.settle_with(Err(MethodError::raised("not-found", "no such todo")));
    let cache = RecordingCache::new();
    let method = cached_method(
        &connection,
        &cache,
        ApplyOptions::default().with_cache_method_result(true),
    );

    let settlements = Settlements::new();
    method
        .call(json!({ "x": 1 }), Some(settlements.callback()))
        .unwrap();

    assert_eq!(cache.total(), 0);
    assert_matches!(settlements.outcomes().as_slice(), [Err(MethodError::Raised { .. })]);
}

#[test]
fn test_plain_method_uses_plain_surface_on_initiating_side() {
    let connection = RecordingConnection::initiating();
    let method = no_argument_definition("lists.all")
        .connection(connection.clone())
        .apply_options(ApplyOptions::default().with_throw_stub_exceptions(false))
        .build()
        .unwrap();

    assert_eq!(method.call(json!({}), None), Ok(None));

    let invocation = &connection.invocations()[0];
    assert_eq!(invocation.mode, RegistrationMode::Plain);
    assert_eq!(
        invocation.options,
        ApplyOptions::defaults().with_throw_stub_exceptions(false)
    );
    // The dispatcher always interposes its own callback here
    assert!(invocation.with_callback);
}

#[test]
fn test_call_with_callback_uses_empty_arguments() {
    let connection = RecordingConnection::initiating();
    let spy = Spy::new();
    let method = returning_definition("ping", &spy, json!("pong"))
        .connection(connection.clone())
        .build()
        .unwrap();

    let settlements = Settlements::new();
    method.call_with_callback(settlements.callback()).unwrap();

    assert_eq!(spy.calls(), vec![json!({})]);
    assert_eq!(connection.invocations()[0].args, vec![json!({})]);
    assert_eq!(
        settlements.outcomes(),
        vec![Ok::<Value, MethodError>(json!("pong"))]
    );
}

#[test]
fn test_sync_failure_goes_to_callback_when_given() {
    let connection = RecordingConnection::initiating();
    connection.throw_synchronously(MethodError::connection("socket closed"));
    let cache = RecordingCache::new();
    let method = cached_method(
        &connection,
        &cache,
        ApplyOptions::default().with_cache_method_result(true),
    );

    let settlements = Settlements::new();
    let outcome = method.call(json!({ "x": 1 }), Some(settlements.callback()));

    assert_eq!(outcome, Ok(None));
    assert_eq!(
        settlements.outcomes(),
        vec![Err::<Value, MethodError>(MethodError::connection("socket closed"))]
    );
    assert_eq!(cache.total(), 0);
}

#[test]
fn test_sync_failure_is_returned_without_callback() {
    let connection = RecordingConnection::initiating();
    connection.throw_synchronously(MethodError::connection("socket closed"));
    let method = no_argument_definition("offline")
        .connection(connection.clone())
        .build()
        .unwrap();

    assert_eq!(
        method.call(json!({}), None),
        Err(MethodError::connection("socket closed"))
    );
}

#[test]
fn test_responding_side_passes_callback_through() {
    let connection = RecordingConnection::responding();
    let method = no_argument_definition("server.only")
        .connection(connection.clone())
        .build()
        .unwrap();

    let settlements = Settlements::new();
    assert_eq!(method.call(json!({}), Some(settlements.callback())), Ok(None));
    assert_eq!(
        settlements.outcomes(),
        vec![Ok::<Value, MethodError>(json!("server.only"))]
    );
    assert_eq!(connection.side(), Side::Responding);
}

#[tokio::test]
async fn test_call_async_resolves_settled_result() {
    let connection = RecordingConnection::initiating();
    let cache = RecordingCache::new();
    let method = cached_method(
        &connection,
        &cache,
        ApplyOptions::default().with_cache_method_result(true),
    );

    let value = method.call_async(json!({ "x": 3 })).await.unwrap();

    assert_eq!(value, json!({ "id": "abc" }));
    assert_eq!(cache.raw().len(), 1);
}

#[tokio::test]
async fn test_call_async_surfaces_sync_failure() {
    let connection = RecordingConnection::initiating();
    connection.throw_synchronously(MethodError::connection("socket closed"));
    let method = no_argument_definition("async.offline")
        .connection(connection.clone())
        .build()
        .unwrap();

    let err = method.call_async(json!({})).await.unwrap_err();
    assert_matches!(err, MethodError::Connection { .. });
}

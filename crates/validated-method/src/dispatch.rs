//! Call dispatcher
//!
//! Entry point for calling code. On the responding side a call is handed
//! straight to the connection's plain surface and never touches the cache.
//! On the initiating side the call goes through the surface chosen at
//! registration, and a wrapped callback feeds successful results to the
//! caching service before the caller's callback runs.

use crate::caching::{CacheDescriptor, CachingService};
use crate::connection::{dropped_settlement, settle, Callback, InvokeOutcome};
use crate::error::{MethodError, MethodResult};
use crate::method::ValidatedMethod;
use crate::mode::RegistrationMode;
use crate::options::ApplyOptions;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, trace};

/// Caller callback shared between the settlement hook and the dispatcher
type CallbackSlot = Arc<Mutex<Option<Callback>>>;

impl ValidatedMethod {
    /// Call the method with `args`
    ///
    /// The returned value is the stub value the connection surfaced
    /// immediately, if any; the settled result goes to `callback`.
    ///
    /// # Errors
    ///
    /// On the initiating side a synchronous failure of the invocation
    /// primitive is delivered to `callback` when one is given and returned
    /// here otherwise. On the responding side the connection's outcome is
    /// returned as is.
    pub fn call(&self, args: Value, callback: Option<Callback>) -> InvokeOutcome {
        let inner = &self.inner;
        let connection = &inner.connection;

        if !connection.side().is_initiating() {
            trace!(method = %inner.name, "Dispatching call on the responding side");
            return connection.invoke(&inner.name, vec![args], &inner.apply_options, callback);
        }

        trace!(method = %inner.name, mode = %inner.mode, "Dispatching call on the initiating side");
        let caller_supplied = callback.is_some();
        let slot: CallbackSlot = Arc::new(Mutex::new(callback));
        let hook = self.settlement_hook(args.clone(), slot.clone());

        let outcome = match inner.mode {
            RegistrationMode::Plain => {
                connection.invoke(&inner.name, vec![args], &inner.apply_options, Some(hook))
            }
            RegistrationMode::Enhanced => match connection.enhanced() {
                Some(enhanced) => enhanced.invoke_enhanced(
                    &inner.name,
                    vec![args],
                    &inner.apply_options,
                    Some(hook),
                ),
                None => Err(MethodError::connection(format!(
                    "connection has no enhanced surface for '{}'",
                    inner.name
                ))),
            },
        };

        let error = match outcome {
            Ok(stub) => return Ok(stub),
            Err(error) => error,
        };

        // Stub failures reach the caller the same way remote failures do
        let pending = slot.lock().take();
        match pending {
            Some(callback) => {
                callback(Err(error));
                Ok(None)
            }
            None if caller_supplied => {
                debug!(method = %inner.name, %error, "Connection failed after settling the call");
                Ok(None)
            }
            None => Err(error),
        }
    }

    /// Call the method with empty arguments, delivering the result to `callback`
    ///
    /// Equivalent to `call(json!({}), Some(callback))`.
    pub fn call_with_callback(&self, callback: Callback) -> InvokeOutcome {
        self.call(json!({}), Some(callback))
    }

    /// Call the method and wait for the settled result
    ///
    /// # Errors
    ///
    /// Returns the settled error, or a connection error when the call is
    /// dropped before it settles.
    pub async fn call_async(&self, args: Value) -> MethodResult<Value> {
        let (tx, rx) = oneshot::channel();
        let callback: Callback = Box::new(move |outcome| {
            // The receiver only goes away when the caller stopped waiting
            let _ = tx.send(outcome);
        });

        self.call(args, Some(callback))?;
        rx.await.map_err(|_| dropped_settlement(&self.inner.name))?
    }

    /// Wrap the caller's callback with the caching side effects
    fn settlement_hook(&self, args: Value, slot: CallbackSlot) -> Callback {
        let name = self.inner.name.clone();
        let options = self.inner.apply_options.clone();
        let caching = self.inner.caching.clone();

        Box::new(move |outcome: MethodResult<Value>| {
            if let (Ok(data), Some(caching)) = (&outcome, &caching) {
                emit_cache_descriptor(caching.as_ref(), &name, &args, data, &options);
            }
            let callback = slot.lock().take();
            settle(&name, callback, outcome);
        })
    }
}

/// Hand one descriptor to the caching service, according to the cache flags
fn emit_cache_descriptor(
    caching: &dyn CachingService,
    name: &str,
    args: &Value,
    data: &Value,
    options: &ApplyOptions,
) {
    if options.caches_result() {
        debug!(method = name, duration_ms = ?options.cache_duration_ms, "Caching method result");
        caching.cache_method_result(CacheDescriptor {
            name: name.to_string(),
            args: vec![args.clone()],
            data: data.clone(),
            collection_name: None,
            duration_ms: options.cache_duration_ms,
        });
    }
    if options.caches_result_in_minimongo() {
        debug!(
            method = name,
            collection = ?options.collection_name,
            duration_ms = ?options.cache_duration_ms,
            "Caching method result in collection"
        );
        caching.cache_method_result_in_minimongo(CacheDescriptor {
            name: name.to_string(),
            args: vec![args.clone()],
            data: data.clone(),
            collection_name: options.collection_name.clone(),
            duration_ms: options.cache_duration_ms,
        });
    }
}

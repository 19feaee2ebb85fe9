//! Apply options forwarded to the connection on every call
//!
//! Options are kept as optional fields so that layering (caller over config
//! over defaults) can tell "unset" apart from "false". Unrecognized keys are
//! preserved in [`ApplyOptions::extra`] and forwarded untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Options controlling how a method call is applied
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplyOptions {
    /// Surface the locally computed stub value before remote confirmation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_stub_value: Option<bool>,
    /// Suppress the remote call when the local stub fails
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throw_stub_exceptions: Option<bool>,
    /// Force enhanced registration and dispatch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhanced: Option<bool>,
    /// Cache the raw result after a successful call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_method_result: Option<bool>,
    /// Cache the result into a client-side collection after a successful call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_method_result_in_minimongo: Option<bool>,
    /// Cache lifetime hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_duration_ms: Option<u64>,
    /// Target collection hint for structured caching
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
    /// Any other option, forwarded as is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApplyOptions {
    /// Defaults every method starts from
    pub fn defaults() -> Self {
        Self {
            // Makes it possible to get the id of an inserted item
            return_stub_value: Some(true),
            // Don't call the remote if the stub throws, so validation never runs twice
            throw_stub_exceptions: Some(true),
            ..Self::default()
        }
    }

    /// Layer `self` over `base`: keys set on `self` win
    pub fn merged_over(&self, base: &ApplyOptions) -> ApplyOptions {
        let mut extra = base.extra.clone();
        extra.extend(self.extra.clone());

        ApplyOptions {
            return_stub_value: self.return_stub_value.or(base.return_stub_value),
            throw_stub_exceptions: self.throw_stub_exceptions.or(base.throw_stub_exceptions),
            enhanced: self.enhanced.or(base.enhanced),
            cache_method_result: self.cache_method_result.or(base.cache_method_result),
            cache_method_result_in_minimongo: self
                .cache_method_result_in_minimongo
                .or(base.cache_method_result_in_minimongo),
            cache_duration_ms: self.cache_duration_ms.or(base.cache_duration_ms),
            collection_name: self
                .collection_name
                .clone()
                .or_else(|| base.collection_name.clone()),
            extra,
        }
    }

    /// Set `returnStubValue`
    pub fn with_return_stub_value(mut self, value: bool) -> Self {
        self.return_stub_value = Some(value);
        self
    }

    /// Set `throwStubExceptions`
    pub fn with_throw_stub_exceptions(mut self, value: bool) -> Self {
        self.throw_stub_exceptions = Some(value);
        self
    }

    /// Set `enhanced`
    pub fn with_enhanced(mut self, value: bool) -> Self {
        self.enhanced = Some(value);
        self
    }

    /// Set `cacheMethodResult`
    pub fn with_cache_method_result(mut self, value: bool) -> Self {
        self.cache_method_result = Some(value);
        self
    }

    /// Set `cacheMethodResultInMinimongo`
    pub fn with_cache_method_result_in_minimongo(mut self, value: bool) -> Self {
        self.cache_method_result_in_minimongo = Some(value);
        self
    }

    /// Set `cacheDurationMs`
    pub fn with_cache_duration_ms(mut self, duration_ms: u64) -> Self {
        self.cache_duration_ms = Some(duration_ms);
        self
    }

    /// Set `collectionName`
    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    /// Set an option this crate does not interpret
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Whether the stub value is surfaced immediately (default true)
    pub fn returns_stub_value(&self) -> bool {
        self.return_stub_value.unwrap_or(true)
    }

    /// Whether a stub failure suppresses the remote call (default true)
    pub fn throws_stub_exceptions(&self) -> bool {
        self.throw_stub_exceptions.unwrap_or(true)
    }

    /// Whether enhancement was forced explicitly
    pub fn is_enhanced(&self) -> bool {
        self.enhanced.unwrap_or(false)
    }

    /// Whether raw-result caching is on
    pub fn caches_result(&self) -> bool {
        self.cache_method_result.unwrap_or(false)
    }

    /// Whether collection-backed caching is on
    pub fn caches_result_in_minimongo(&self) -> bool {
        self.cache_method_result_in_minimongo.unwrap_or(false)
    }

    /// Whether any kind of result caching is on
    pub fn caches_any_result(&self) -> bool {
        self.caches_result() || self.caches_result_in_minimongo()
    }
}

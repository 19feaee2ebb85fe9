//! Caching service interface
//!
//! After a successful caching-eligible call on the initiating side, the
//! dispatcher hands a [`CacheDescriptor`] to the method's caching service.
//! Storage, expiry and materialization are entirely the service's business;
//! calls are fire-and-forget.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Post-call payload describing a result to cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheDescriptor {
    /// Method name
    pub name: String,
    /// Arguments the method was called with
    pub args: Vec<Value>,
    /// Result of the call
    pub data: Value,
    /// Target collection, only for collection-backed caching
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
    /// Cache lifetime hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Receiver of post-call cache descriptors
pub trait CachingService: Send + Sync {
    /// Cache a raw method result
    fn cache_method_result(&self, descriptor: CacheDescriptor);

    /// Cache a method result into a client-side collection
    fn cache_method_result_in_minimongo(&self, descriptor: CacheDescriptor);
}

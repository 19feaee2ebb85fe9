//! Validated Method Testing Infrastructure
//!
//! Recording collaborators, definition fixtures and property-testing
//! strategies shared by the integration tests.
//!
//! # Usage
//!
//! ```rust,no_run
//! use validated_method_testkit::*;
//!
//! let connection = RecordingConnection::initiating();
//! let cache = RecordingCache::new();
//! let spy = Spy::new();
//! let method = returning_definition("todos.get", &spy, serde_json::json!({ "id": "abc" }))
//!     .connection(connection.clone())
//!     .caching(cache.clone())
//!     .build()
//!     .unwrap();
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod fixtures;
pub mod mocks;
pub mod strategies;

pub use fixtures::*;
pub use mocks::*;
pub use strategies::*;

/// Install a test-friendly tracing subscriber honoring `RUST_LOG`
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

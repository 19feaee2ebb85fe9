//! Registration mode selection
//!
//! The mode is decided once, at construction time, and drives both the
//! registration surface and the initiating-side invocation surface.

use crate::options::ApplyOptions;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which surface of the connection a method is registered and dispatched on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegistrationMode {
    /// The connection's plain surface
    Plain,
    /// The connection's result-caching-enhanced surface
    Enhanced,
}

impl RegistrationMode {
    /// Enhanced when enhancement is forced or any result caching is requested
    pub fn select(options: &ApplyOptions) -> Self {
        if options.is_enhanced() || options.caches_any_result() {
            Self::Enhanced
        } else {
            Self::Plain
        }
    }

    /// Check if this is the enhanced mode
    pub fn is_enhanced(&self) -> bool {
        matches!(self, Self::Enhanced)
    }
}

impl fmt::Display for RegistrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Enhanced => write!(f, "enhanced"),
        }
    }
}

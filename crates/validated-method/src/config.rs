//! Per-method option configuration
//!
//! Apply options can be kept out of code in a TOML file:
//!
//! ```toml
//! [defaults]
//! throwStubExceptions = false
//!
//! [methods."todos.get"]
//! cacheMethodResult = true
//! cacheDurationMs = 60000
//! ```
//!
//! Options configured for a method are layered over `[defaults]`; options
//! given explicitly on a definition are layered over both.

use crate::error::{DefinitionError, DefinitionResult};
use crate::options::ApplyOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Apply options for a set of methods
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodsConfig {
    /// Options every method starts from
    pub defaults: ApplyOptions,
    /// Options for individual methods, by name
    pub methods: BTreeMap<String, ApplyOptions>,
}

impl MethodsConfig {
    /// Parse a configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the text is not valid TOML or does
    /// not describe apply options.
    pub fn from_toml_str(content: &str) -> DefinitionResult<Self> {
        toml::from_str(content)
            .map_err(|e| DefinitionError::configuration(format!("Invalid method config: {e}")))
    }

    /// Load a configuration file
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> DefinitionResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DefinitionError::configuration(format!(
                "Failed to read method config {}: {e}",
                path.display()
            ))
        })?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Layer `other` over this configuration
    pub fn merge_with(&mut self, other: &Self) {
        self.defaults = other.defaults.merged_over(&self.defaults);
        for (name, options) in &other.methods {
            let merged = match self.methods.get(name) {
                Some(existing) => options.merged_over(existing),
                None => options.clone(),
            };
            self.methods.insert(name.clone(), merged);
        }
    }

    /// Check the defaults and every configured method for conflicting cache flags
    ///
    /// # Errors
    ///
    /// Returns one configuration error naming every conflicting entry.
    pub fn validate(&self) -> DefinitionResult<()> {
        let conflicts = |options: &ApplyOptions| {
            options.caches_result() && options.caches_result_in_minimongo()
        };

        let mut conflicting: Vec<&str> = Vec::new();
        if conflicts(&self.defaults) {
            conflicting.push("[defaults]");
        }
        conflicting.extend(
            self.methods
                .keys()
                .filter(|name| conflicts(&self.options_for(name)))
                .map(String::as_str),
        );

        if conflicting.is_empty() {
            Ok(())
        } else {
            Err(DefinitionError::configuration(format!(
                "Please use either cacheMethodResult or cacheMethodResultInMinimongo for {}",
                conflicting
                    .iter()
                    .map(|name| format!("'{name}'"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        }
    }

    /// Options configured for `name`, layered over the defaults
    pub fn options_for(&self, name: &str) -> ApplyOptions {
        match self.methods.get(name) {
            Some(options) => options.merged_over(&self.defaults),
            None => self.defaults.clone(),
        }
    }
}

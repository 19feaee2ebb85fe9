//! Option normalization
//!
//! Turns a caller-supplied [`MethodDefinition`] into a fully populated
//! [`NormalizedDefinition`], running the mixin pipeline on the way. Checks
//! happen in a fixed order: name, mixins, connection, validate shorthand,
//! options default, final shape, cache flags, enhanced capability, caching
//! service. The first failing step ends normalization.

use crate::caching::CachingService;
use crate::connection::{default_connection, Connection};
use crate::definition::{MethodDefinition, Runner, Validator};
use crate::error::{DefinitionError, DefinitionResult, SchemaViolation};
use crate::mixin::{apply_mixins, Mixin};
use crate::mode::RegistrationMode;
use crate::options::ApplyOptions;
use std::sync::Arc;
use tracing::trace;

/// A definition with every field resolved
#[derive(Clone)]
pub struct NormalizedDefinition {
    /// Method name
    pub name: String,
    /// Concrete validator
    pub validate: Validator,
    /// Business logic
    pub run: Runner,
    /// Mixins that were applied
    pub mixins: Vec<Mixin>,
    /// Connection the method registers on
    pub connection: Arc<dyn Connection>,
    /// Caching service, present whenever result caching is on
    pub caching: Option<Arc<dyn CachingService>>,
    /// Options merged over the defaults
    pub apply_options: ApplyOptions,
    /// Selected registration mode
    pub mode: RegistrationMode,
}

/// Accumulates shape violations before turning them into one error
#[derive(Debug, Default)]
struct ShapeCheck {
    violations: Vec<SchemaViolation>,
}

impl ShapeCheck {
    fn require<T>(&mut self, field: &str, value: &Option<T>, expected: &str) -> &mut Self {
        if value.is_none() {
            self.violations.push(SchemaViolation::new(field, expected));
        }
        self
    }

    fn finish(self, method: &str) -> DefinitionResult<()> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(DefinitionError::schema(method, self.violations))
        }
    }
}

/// Normalize a definition
///
/// # Errors
///
/// - [`DefinitionError::Configuration`] for a missing or empty name, mutually
///   exclusive cache flags, a connection without the enhanced surface an
///   enhanced method needs, or result caching on the initiating side without
///   a caching service.
/// - [`DefinitionError::MixinContract`] when a mixin hands back nothing.
/// - [`DefinitionError::Schema`] when required fields are missing after the
///   mixins ran.
pub fn normalize(definition: MethodDefinition) -> DefinitionResult<NormalizedDefinition> {
    match definition.name.as_deref() {
        None => {
            return Err(DefinitionError::configuration(
                "A validated method requires a name",
            ))
        }
        Some("") => {
            return Err(DefinitionError::configuration(
                "A validated method name must not be empty",
            ))
        }
        Some(_) => {}
    }

    let mixins = definition.mixins.clone();
    let mut definition = apply_mixins(definition, &mixins)?;

    let connection = definition
        .connection
        .take()
        .unwrap_or_else(default_connection);

    let method = definition
        .name
        .clone()
        .unwrap_or_else(|| "<unnamed>".to_string());
    let mut shape = ShapeCheck::default();
    shape
        .require("name", &definition.name, "a non-empty string")
        .require("validate", &definition.validate, "a function or the no-arguments shorthand")
        .require("run", &definition.run, "a function");
    shape.finish(&method)?;

    let (Some(name), Some(validation), Some(run)) =
        (definition.name, definition.validate, definition.run)
    else {
        return Err(DefinitionError::schema(method, Vec::new()));
    };
    if name.is_empty() {
        return Err(DefinitionError::schema(
            name,
            vec![SchemaViolation::new("name", "a non-empty string")],
        ));
    }

    let requested = definition.apply_options.unwrap_or_default();
    if requested.caches_result() && requested.caches_result_in_minimongo() {
        return Err(DefinitionError::configuration(format!(
            "Please use either cacheMethodResult or cacheMethodResultInMinimongo for '{name}'."
        )));
    }
    let apply_options = requested.merged_over(&ApplyOptions::defaults());
    let mode = RegistrationMode::select(&apply_options);

    if mode.is_enhanced() && connection.enhanced().is_none() {
        return Err(DefinitionError::configuration(format!(
            "Method '{name}' needs enhanced registration but its connection has no enhanced surface"
        )));
    }
    if apply_options.caches_any_result()
        && connection.side().is_initiating()
        && definition.caching.is_none()
    {
        return Err(DefinitionError::configuration(format!(
            "Method '{name}' caches its result but no caching service was provided"
        )));
    }

    trace!(method = %name, %mode, mixins = mixins.len(), "Normalized method definition");

    Ok(NormalizedDefinition {
        name,
        validate: validation.into_validator(),
        run,
        mixins,
        connection,
        caching: definition.caching,
        apply_options,
        mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalConnection;
    use serde_json::Value;

    fn initiating() -> Arc<dyn Connection> {
        Arc::new(LocalConnection::initiating("normalize-client"))
    }

    fn connection() -> Arc<dyn Connection> {
        Arc::new(LocalConnection::responding("normalize-test"))
    }

    fn valid(name: &str) -> MethodDefinition {
        MethodDefinition::new(name)
            .no_arguments()
            .run(|_ctx, _args| Ok(Value::Null))
            .connection(connection())
    }

    #[test]
    fn test_missing_name_is_configuration_error() {
        let mut definition = valid("x");
        definition.name = None;
        assert!(matches!(
            normalize(definition),
            Err(DefinitionError::Configuration { .. })
        ));
        assert!(matches!(
            normalize(valid("")),
            Err(DefinitionError::Configuration { .. })
        ));
    }

    #[test]
    fn test_schema_lists_every_missing_field() {
        let definition = MethodDefinition::new("bare").connection(connection());
        let Err(DefinitionError::Schema { method, violations }) = normalize(definition) else {
            panic!("expected a schema error");
        };
        assert_eq!(method, "bare");
        let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["validate", "run"]);
    }

    #[test]
    fn test_defaults_merged_under_caller_options() {
        let normalized = normalize(
            valid("opts").apply_options(ApplyOptions::default().with_return_stub_value(false)),
        )
        .unwrap();

        assert_eq!(normalized.apply_options.return_stub_value, Some(false));
        assert_eq!(normalized.apply_options.throw_stub_exceptions, Some(true));
        assert_eq!(normalized.mode, RegistrationMode::Plain);
    }

    #[test]
    fn test_mixin_can_supply_missing_run() {
        let definition = MethodDefinition::new("late.run")
            .no_arguments()
            .connection(connection())
            .mixin(Mixin::named("addRun", |d: MethodDefinition| {
                Some(d.run(|_ctx, _args| Ok(Value::Bool(true))))
            }));

        assert!(normalize(definition).is_ok());
    }

    #[test]
    fn test_caching_without_service_is_rejected_on_initiating_side() {
        let definition = valid("cached")
            .connection(initiating())
            .apply_options(ApplyOptions::default().with_cache_method_result(true));
        let err = normalize(definition).err().unwrap();
        assert!(matches!(err, DefinitionError::Configuration { .. }));
        assert!(err.to_string().contains("no caching service"));
    }

    #[test]
    fn test_responding_side_needs_no_caching_service() {
        let definition = valid("cached.server")
            .apply_options(ApplyOptions::default().with_cache_method_result_in_minimongo(true));
        let normalized = normalize(definition).unwrap();
        assert_eq!(normalized.mode, RegistrationMode::Enhanced);
        assert!(normalized.caching.is_none());
    }
}

//! The validation gate run before every create and update.
//!
//! The gate is a pure function: given an object it produces zero or more
//! human-readable messages, and zero messages means valid. It never mutates
//! the object and holds no state. Structural checks apply to every object;
//! per-type checks come from [`Constraint`]s registered on the
//! [`TypeRegistry`].

use crate::error::{ConstraintError, ValidationFailure};
use crate::object::DomainObject;
use crate::registry::TypeRegistry;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Longest accepted object name.
pub const MAX_NAME_LENGTH: usize = 255;

/// A declarative check attached to a property-bag field through the
/// registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constraint {
    /// The field must be present and non-null.
    Required,
    /// String length or array length bounds, inclusive. Non-string,
    /// non-array values pass.
    Size { min: usize, max: usize },
    /// The string value must match the regular expression. Absent values
    /// pass; pair with [`Constraint::Required`] to forbid absence.
    Pattern(String),
}

impl Constraint {
    /// Prepare the constraint for checking. Patterns compile exactly once,
    /// here; a malformed pattern fails registration.
    pub(crate) fn compile(
        self,
        type_tag: &str,
        field: &str,
    ) -> Result<CompiledConstraint, ConstraintError> {
        match self {
            Constraint::Required => Ok(CompiledConstraint::Required),
            Constraint::Size { min, max } => Ok(CompiledConstraint::Size { min, max }),
            Constraint::Pattern(source) => match Regex::new(&source) {
                Ok(regex) => Ok(CompiledConstraint::Pattern { source, regex }),
                Err(error) => Err(ConstraintError {
                    type_tag: type_tag.to_string(),
                    field: field.to_string(),
                    reason: error.to_string(),
                }),
            },
        }
    }
}

/// A [`Constraint`] as the registry stores it, with the pattern already
/// compiled.
#[derive(Debug, Clone)]
pub enum CompiledConstraint {
    Required,
    Size { min: usize, max: usize },
    Pattern { source: String, regex: Regex },
}

/// Run every structural and registered check against the object.
///
/// Returns one message per failed check, empty when valid.
pub fn validate_object(registry: &TypeRegistry, object: &DomainObject) -> Vec<String> {
    let mut messages = Vec::new();

    if object.name.trim().is_empty() {
        messages.push("name: must not be blank".to_string());
    } else if object.name.chars().count() > MAX_NAME_LENGTH {
        messages.push(format!(
            "name: must be at most {MAX_NAME_LENGTH} characters"
        ));
    }

    if object.type_tag.trim().is_empty() {
        messages.push("type: must not be blank".to_string());
    }

    for (field, constraint) in registry.constraints_for(&object.type_tag) {
        if let Some(message) = check_constraint(object, field, constraint) {
            messages.push(message);
        }
    }

    messages
}

/// Gate entry point used by the write path.
pub fn ensure_valid(
    registry: &TypeRegistry,
    object: &DomainObject,
) -> Result<(), ValidationFailure> {
    let messages = validate_object(registry, object);
    if messages.is_empty() {
        Ok(())
    } else {
        Err(ValidationFailure::new(messages))
    }
}

fn check_constraint(
    object: &DomainObject,
    field: &str,
    constraint: &CompiledConstraint,
) -> Option<String> {
    let value = object.property(field);
    match constraint {
        CompiledConstraint::Required => match value {
            None | Some(Value::Null) => Some(format!("{field}: is required")),
            _ => None,
        },
        CompiledConstraint::Size { min, max } => {
            let length = match value {
                Some(Value::String(s)) => Some(s.chars().count()),
                Some(Value::Array(items)) => Some(items.len()),
                _ => None,
            };
            match length {
                Some(len) if len < *min || len > *max => Some(format!(
                    "{field}: size must be between {min} and {max}"
                )),
                _ => None,
            }
        }
        CompiledConstraint::Pattern { source, regex } => match value {
            Some(Value::String(s)) if !regex.is_match(s) => {
                Some(format!("{field}: must match pattern {source}"))
            }
            _ => None,
        },
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn constrained_registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry
            .constrain("message", "body", Constraint::Required)
            .unwrap();
        registry
            .constrain("message", "body", Constraint::Size { min: 1, max: 10 })
            .unwrap();
        registry
            .constrain(
                "message",
                "channel",
                Constraint::Pattern("^[a-z-]+$".to_string()),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_valid_object_produces_no_messages() {
        let registry = TypeRegistry::new();
        let object = DomainObject::new("note");
        assert!(validate_object(&registry, &object).is_empty());
        assert!(ensure_valid(&registry, &object).is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        let registry = TypeRegistry::new();
        let mut object = DomainObject::new("note");
        object.name = "   ".to_string();
        let messages = validate_object(&registry, &object);
        assert_eq!(messages, ["name: must not be blank"]);
    }

    #[test]
    fn test_long_name_rejected() {
        let registry = TypeRegistry::new();
        let mut object = DomainObject::new("note");
        object.name = "x".repeat(MAX_NAME_LENGTH + 1);
        let messages = validate_object(&registry, &object);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("at most 255"));

        object.name = "x".repeat(MAX_NAME_LENGTH);
        assert!(validate_object(&registry, &object).is_empty());
    }

    #[test]
    fn test_required_field() {
        let registry = constrained_registry();
        let mut object = DomainObject::new("message");

        let messages = validate_object(&registry, &object);
        assert_eq!(messages, ["body: is required"]);

        object.set_property("body", Value::Null);
        let messages = validate_object(&registry, &object);
        assert_eq!(messages, ["body: is required"]);

        object.set_property("body", "hi");
        assert!(validate_object(&registry, &object).is_empty());
    }

    #[test]
    fn test_size_bounds() {
        let registry = constrained_registry();
        let mut object = DomainObject::new("message");
        object.set_property("body", "this is far too long");
        let messages = validate_object(&registry, &object);
        assert_eq!(messages, ["body: size must be between 1 and 10"]);

        object.set_property("body", "short");
        assert!(validate_object(&registry, &object).is_empty());
    }

    #[test]
    fn test_size_applies_to_arrays() {
        let mut registry = TypeRegistry::new();
        registry
            .constrain("poll", "options", Constraint::Size { min: 2, max: 4 })
            .unwrap();
        let mut object = DomainObject::new("poll");
        object.set_property("options", json!(["a"]));
        assert_eq!(validate_object(&registry, &object).len(), 1);

        object.set_property("options", json!(["a", "b"]));
        assert!(validate_object(&registry, &object).is_empty());
    }

    #[test]
    fn test_pattern() {
        let registry = constrained_registry();
        let mut object = DomainObject::new("message");
        object.set_property("body", "ok");
        object.set_property("channel", "General");
        let messages = validate_object(&registry, &object);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("channel: must match"));

        object.set_property("channel", "general-chat");
        assert!(validate_object(&registry, &object).is_empty());
    }

    #[test]
    fn test_pattern_skips_absent_values() {
        let registry = constrained_registry();
        let mut object = DomainObject::new("message");
        object.set_property("body", "ok");
        // channel absent: Pattern alone does not require presence
        assert!(validate_object(&registry, &object).is_empty());
    }

    #[test]
    fn test_messages_accumulate() {
        let registry = constrained_registry();
        let mut object = DomainObject::new("message");
        object.name = String::new();
        object.set_property("channel", "NOPE");

        let messages = validate_object(&registry, &object);
        assert_eq!(messages.len(), 3);

        let err = ensure_valid(&registry, &object).unwrap_err();
        assert_eq!(err.messages.len(), 3);
        let rendered = format!("{}", err);
        assert!(rendered.contains("name: must not be blank"));
        assert!(rendered.contains("body: is required"));
        assert!(rendered.contains("channel: must match"));
    }
}

//! Type registry mapping type tags to object factories.
//!
//! Types are registered explicitly at startup; the registry is then shared
//! read-only (typically behind an `Arc`) for the life of the process. There
//! is no runtime discovery and no global table. Tags nobody registered
//! resolve to the generic catch-all, so foreign and user-defined types are
//! always handled.

use crate::error::ConstraintError;
use crate::object::DomainObject;
use crate::validation::{CompiledConstraint, Constraint};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Catch-all type tag used when a declared type is blank or unrecognized.
pub const GENERIC_TYPE: &str = "custom";

/// Factory producing a fresh object for a registered type tag.
pub type ObjectFactory = Arc<dyn Fn() -> DomainObject + Send + Sync>;

/// Lowercase and trim a tag. Registration and lookup both go through this,
/// so `" Note "` and `"note"` name the same type.
pub(crate) fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Tag → factory map with per-type validation constraints.
pub struct TypeRegistry {
    factories: HashMap<String, ObjectFactory>,
    constraints: HashMap<String, Vec<(String, CompiledConstraint)>>,
}

impl TypeRegistry {
    /// An empty registry with only the generic catch-all registered.
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
            constraints: HashMap::new(),
        };
        registry.register(GENERIC_TYPE, Arc::new(|| DomainObject::new(GENERIC_TYPE)));
        registry
    }

    /// Register a factory for a type tag. Registering a tag twice replaces
    /// the earlier factory.
    pub fn register(&mut self, type_tag: &str, factory: ObjectFactory) {
        self.factories.insert(normalize_tag(type_tag), factory);
    }

    /// Attach a validation constraint to a field of the given type. The
    /// validation gate checks these against the property bag. Patterns are
    /// compiled here, so a malformed pattern is rejected up front.
    pub fn constrain(
        &mut self,
        type_tag: &str,
        field: &str,
        constraint: Constraint,
    ) -> Result<(), ConstraintError> {
        let tag = normalize_tag(type_tag);
        let compiled = constraint.compile(&tag, field)?;
        self.constraints
            .entry(tag)
            .or_default()
            .push((field.to_string(), compiled));
        Ok(())
    }

    pub fn is_registered(&self, type_tag: &str) -> bool {
        self.factories.contains_key(&normalize_tag(type_tag))
    }

    /// Registered tags, unordered.
    pub fn registered_tags(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Construct a fresh object for the tag. Unrecognized tags go through
    /// the catch-all factory but keep their declared tag, so they stay
    /// distinguishable downstream.
    pub fn new_instance(&self, type_tag: &str) -> DomainObject {
        let tag = normalize_tag(type_tag);
        let tag = if tag.is_empty() {
            GENERIC_TYPE.to_string()
        } else {
            tag
        };
        match self.factories.get(&tag) {
            Some(factory) => factory(),
            None => match self.factories.get(GENERIC_TYPE) {
                Some(generic) => {
                    let mut object = generic();
                    object.type_tag = tag;
                    object
                }
                None => DomainObject::new(&tag),
            },
        }
    }

    /// Normalize an object's declared tag in place: trimmed, lowercased,
    /// blank becomes the catch-all. Unregistered non-blank tags are kept.
    pub fn check_and_fix_type(&self, object: &mut DomainObject) {
        let tag = normalize_tag(&object.type_tag);
        object.type_tag = if tag.is_empty() {
            GENERIC_TYPE.to_string()
        } else {
            tag
        };
    }

    /// Constraints registered for the tag, empty when none.
    pub fn constraints_for(&self, type_tag: &str) -> &[(String, CompiledConstraint)] {
        self.constraints
            .get(&normalize_tag(type_tag))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("TypeRegistry")
            .field("types", &tags)
            .field("constrained_types", &self.constraints.len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

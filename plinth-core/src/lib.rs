//! Core data model for the Plinth persistence platform.
//!
//! Plinth treats every persisted entity as a [`DomainObject`]: a flat,
//! schema-light record with a type tag, a tenant scope, ordered tags, three
//! write-path opt-out flags, and an open property bag. This crate carries
//! that model plus the pieces the write path in `plinth-store` leans on:
//!
//! - [`TypeRegistry`]: explicit tag → factory mapping with a catch-all
//! - [`validation`]: the gate run before every create and update
//! - [`error`]: the shared error taxonomy and [`PlinthResult`]
//!
//! Coordination of durable storage, search indexing, and caching lives in
//! `plinth-store`; this crate stays free of IO.

pub mod error;
pub mod object;
pub mod registry;
pub mod validation;

pub use error::{
    CacheError, ConstraintError, IndexError, PlinthError, PlinthResult, StoreError,
    ValidationFailure,
};
pub use object::{DomainObject, Timestamp};
pub use registry::{ObjectFactory, TypeRegistry, GENERIC_TYPE};
pub use validation::{
    ensure_valid, validate_object, CompiledConstraint, Constraint, MAX_NAME_LENGTH,
};

use uuid::Uuid;

/// Generate a new object id.
///
/// UUIDv7 keeps ids time-ordered, which durable backends can exploit for
/// write locality.
pub fn new_object_id() -> String {
    Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_object_id_is_unique_and_parseable() {
        let a = new_object_id();
        let b = new_object_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
        assert!(Uuid::parse_str(&b).is_ok());
    }
}

//! Collaborator contracts for the write path.
//!
//! The durable store is the source of truth; the search index and the cache
//! are secondary projections kept in step by
//! [`WritePath`](crate::write_path::WritePath). Implementations own their
//! synchronization (every trait is `Send + Sync`) and every call carries the
//! tenant scope explicitly, so a collaborator never has to guess which
//! tenant's data it is touching.
//!
//! Concrete remote backends (databases, search clusters, cache servers) live
//! outside this crate; [`memory`](crate::memory) provides the embedded
//! reference implementations.

use async_trait::async_trait;
use plinth_core::{DomainObject, PlinthResult, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ordered per-item outcomes of a durable batch write, aligned with the
/// input order. The id is the persisted id of the item.
pub type BatchOutcome = Vec<Result<String, StoreError>>;

/// Durable storage collaborator.
///
/// Single-object absence is `Ok(None)`; batch reads simply omit absent ids.
/// Neither is an error.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Persist a new object. Assigns an id when the object arrives without
    /// one and returns the persisted id.
    async fn create(&self, tenant_id: &str, object: &DomainObject) -> PlinthResult<String>;

    async fn read(&self, tenant_id: &str, id: &str) -> PlinthResult<Option<DomainObject>>;

    /// Write the new state of an existing object. Upsert semantics are
    /// acceptable; the write path never reads before updating.
    async fn update(&self, tenant_id: &str, object: &DomainObject) -> PlinthResult<()>;

    /// Delete by id. Deleting an id that does not exist is not an error.
    async fn delete(&self, tenant_id: &str, id: &str) -> PlinthResult<()>;

    /// Persist a batch, returning per-item outcomes in input order.
    async fn create_all(
        &self,
        tenant_id: &str,
        objects: &[DomainObject],
    ) -> PlinthResult<BatchOutcome>;

    /// Read a batch of ids. Absent ids are missing from the map.
    async fn read_all(
        &self,
        tenant_id: &str,
        ids: &[String],
    ) -> PlinthResult<HashMap<String, DomainObject>>;

    async fn update_all(
        &self,
        tenant_id: &str,
        objects: &[DomainObject],
    ) -> PlinthResult<BatchOutcome>;

    async fn delete_all(&self, tenant_id: &str, ids: &[String]) -> PlinthResult<()>;
}

/// Search index collaborator.
///
/// The write path degrades when these calls fail: faults are logged and the
/// surrounding operation continues, so implementations should prefer
/// returning errors over blocking.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn index(&self, tenant_id: &str, object: &DomainObject) -> PlinthResult<()>;

    /// Removing an object that was never indexed is not an error.
    async fn unindex(&self, tenant_id: &str, object: &DomainObject) -> PlinthResult<()>;

    /// Index a batch in one call. Empty input is a no-op.
    async fn index_all(&self, tenant_id: &str, objects: &[DomainObject]) -> PlinthResult<()>;

    async fn unindex_all(&self, tenant_id: &str, objects: &[DomainObject]) -> PlinthResult<()>;

    /// Force pending index writes to become visible to readers. Called by
    /// collaborators that must read their own writes immediately, for
    /// example account provisioning flows.
    async fn flush(&self, tenant_id: &str) -> PlinthResult<()>;
}

/// Cache collaborator.
///
/// Same degradation contract as the index: a failing cache never fails the
/// surrounding operation.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, tenant_id: &str, id: &str) -> PlinthResult<Option<DomainObject>>;

    async fn put(&self, tenant_id: &str, id: &str, object: &DomainObject) -> PlinthResult<()>;

    async fn remove(&self, tenant_id: &str, id: &str) -> PlinthResult<()>;

    /// Look up a batch of ids. Missing ids are absent from the map.
    async fn get_all(
        &self,
        tenant_id: &str,
        ids: &[String],
    ) -> PlinthResult<HashMap<String, DomainObject>>;

    async fn put_all(
        &self,
        tenant_id: &str,
        objects: &HashMap<String, DomainObject>,
    ) -> PlinthResult<()>;

    async fn remove_all(&self, tenant_id: &str, ids: &[String]) -> PlinthResult<()>;

    /// Hit and miss counters for observability.
    async fn stats(&self) -> CacheStats;
}

/// Cache effectiveness counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that fell through.
    pub misses: u64,
    /// Entries written.
    pub puts: u64,
    /// Entries removed.
    pub removals: u64,
}

impl CacheStats {
    /// Hit rate in [0, 1]. Zero lookups count as 0.0.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! In-memory reference backends.
//!
//! These are the embedded defaults and the test doubles in one: nested
//! tenant → id maps behind `RwLock`s, with atomic counters recording every
//! call received and a fault switch that makes the backend fail with
//! `Unavailable` until flipped back. Clones share state, so a test can keep
//! a handle for inspection while the write path owns another.
//!
//! Counter semantics: the store and index count calls received (a batch is
//! one call); cache stats count entries, one hit or miss per id looked up.

use crate::traits::{BatchOutcome, Cache, CacheStats, DurableStore, SearchIndex};
use async_trait::async_trait;
use plinth_core::{
    new_object_id, CacheError, DomainObject, IndexError, PlinthResult, StoreError,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

type TenantMap = HashMap<String, HashMap<String, DomainObject>>;

// =============================================================================
// DURABLE STORE
// =============================================================================

/// In-memory durable store keyed tenant-first.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    objects: Arc<RwLock<TenantMap>>,
    reads: Arc<AtomicU64>,
    writes: Arc<AtomicU64>,
    deletes: Arc<AtomicU64>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Read calls received (`read` and `read_all` each count one).
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Write calls received (`create`, `update`, and their batch forms).
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Delete calls received.
    pub fn delete_count(&self) -> u64 {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Number of objects held for a tenant.
    pub fn len(&self, tenant_id: &str) -> usize {
        self.objects
            .read()
            .map(|map| map.get(tenant_id).map_or(0, HashMap::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, tenant_id: &str) -> bool {
        self.len(tenant_id) == 0
    }

    pub fn contains(&self, tenant_id: &str, id: &str) -> bool {
        self.objects
            .read()
            .map(|map| {
                map.get(tenant_id)
                    .is_some_and(|tenant| tenant.contains_key(id))
            })
            .unwrap_or(false)
    }

    /// Drop all data and keep the counters.
    pub fn clear(&self) {
        if let Ok(mut map) = self.objects.write() {
            map.clear();
        }
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: "injected fault".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DurableStore for InMemoryStore {
    async fn create(&self, tenant_id: &str, object: &DomainObject) -> PlinthResult<String> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut stored = object.clone();
        if stored.id.is_empty() {
            stored.id = new_object_id();
        }
        let id = stored.id.clone();
        let mut objects = self.objects.write().map_err(|_| StoreError::LockPoisoned)?;
        objects
            .entry(tenant_id.to_string())
            .or_default()
            .insert(id.clone(), stored);
        Ok(id)
    }

    async fn read(&self, tenant_id: &str, id: &str) -> PlinthResult<Option<DomainObject>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let objects = self.objects.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(objects
            .get(tenant_id)
            .and_then(|tenant| tenant.get(id))
            .cloned())
    }

    async fn update(&self, tenant_id: &str, object: &DomainObject) -> PlinthResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        if object.id.is_empty() {
            return Err(StoreError::WriteFailed {
                id: String::new(),
                reason: "object has no id".to_string(),
            }
            .into());
        }
        let mut objects = self.objects.write().map_err(|_| StoreError::LockPoisoned)?;
        objects
            .entry(tenant_id.to_string())
            .or_default()
            .insert(object.id.clone(), object.clone());
        Ok(())
    }

    async fn delete(&self, tenant_id: &str, id: &str) -> PlinthResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut objects = self.objects.write().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(tenant) = objects.get_mut(tenant_id) {
            tenant.remove(id);
        }
        Ok(())
    }

    async fn create_all(
        &self,
        tenant_id: &str,
        objects: &[DomainObject],
    ) -> PlinthResult<BatchOutcome> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut map = self.objects.write().map_err(|_| StoreError::LockPoisoned)?;
        let tenant = map.entry(tenant_id.to_string()).or_default();
        let mut outcomes = Vec::with_capacity(objects.len());
        for object in objects {
            let mut stored = object.clone();
            if stored.id.is_empty() {
                stored.id = new_object_id();
            }
            let id = stored.id.clone();
            tenant.insert(id.clone(), stored);
            outcomes.push(Ok(id));
        }
        Ok(outcomes)
    }

    async fn read_all(
        &self,
        tenant_id: &str,
        ids: &[String],
    ) -> PlinthResult<HashMap<String, DomainObject>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let objects = self.objects.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut found = HashMap::new();
        if let Some(tenant) = objects.get(tenant_id) {
            for id in ids {
                if let Some(object) = tenant.get(id) {
                    found.insert(id.clone(), object.clone());
                }
            }
        }
        Ok(found)
    }

    async fn update_all(
        &self,
        tenant_id: &str,
        objects: &[DomainObject],
    ) -> PlinthResult<BatchOutcome> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut map = self.objects.write().map_err(|_| StoreError::LockPoisoned)?;
        let tenant = map.entry(tenant_id.to_string()).or_default();
        let mut outcomes = Vec::with_capacity(objects.len());
        for object in objects {
            if object.id.is_empty() {
                outcomes.push(Err(StoreError::WriteFailed {
                    id: String::new(),
                    reason: "object has no id".to_string(),
                }));
                continue;
            }
            tenant.insert(object.id.clone(), object.clone());
            outcomes.push(Ok(object.id.clone()));
        }
        Ok(outcomes)
    }

    async fn delete_all(&self, tenant_id: &str, ids: &[String]) -> PlinthResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut objects = self.objects.write().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(tenant) = objects.get_mut(tenant_id) {
            for id in ids {
                tenant.remove(id);
            }
        }
        Ok(())
    }
}

// =============================================================================
// SEARCH INDEX
// =============================================================================

/// In-memory search index. Writes are immediately visible, so `flush` only
/// counts the call.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIndex {
    entries: Arc<RwLock<TenantMap>>,
    adds: Arc<AtomicU64>,
    removes: Arc<AtomicU64>,
    flushes: Arc<AtomicU64>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Index-write calls received (`index` and `index_all` each count one).
    pub fn add_count(&self) -> u64 {
        self.adds.load(Ordering::SeqCst)
    }

    pub fn remove_count(&self) -> u64 {
        self.removes.load(Ordering::SeqCst)
    }

    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::SeqCst)
    }

    pub fn contains(&self, tenant_id: &str, id: &str) -> bool {
        self.entries
            .read()
            .map(|map| {
                map.get(tenant_id)
                    .is_some_and(|tenant| tenant.contains_key(id))
            })
            .unwrap_or(false)
    }

    /// Indexed ids for a tenant, unordered.
    pub fn ids(&self, tenant_id: &str) -> Vec<String> {
        self.entries
            .read()
            .map(|map| {
                map.get(tenant_id)
                    .map(|tenant| tenant.keys().cloned().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    pub fn len(&self, tenant_id: &str) -> usize {
        self.entries
            .read()
            .map(|map| map.get(tenant_id).map_or(0, HashMap::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, tenant_id: &str) -> bool {
        self.len(tenant_id) == 0
    }

    pub fn clear(&self) {
        if let Ok(mut map) = self.entries.write() {
            map.clear();
        }
    }

    fn check_available(&self) -> Result<(), IndexError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(IndexError::Unavailable {
                reason: "injected fault".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for InMemoryIndex {
    async fn index(&self, tenant_id: &str, object: &DomainObject) -> PlinthResult<()> {
        self.adds.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        if object.id.is_empty() {
            return Err(IndexError::WriteFailed {
                id: String::new(),
                reason: "object has no id".to_string(),
            }
            .into());
        }
        let mut entries = self.entries.write().map_err(|_| IndexError::LockPoisoned)?;
        entries
            .entry(tenant_id.to_string())
            .or_default()
            .insert(object.id.clone(), object.clone());
        Ok(())
    }

    async fn unindex(&self, tenant_id: &str, object: &DomainObject) -> PlinthResult<()> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut entries = self.entries.write().map_err(|_| IndexError::LockPoisoned)?;
        if let Some(tenant) = entries.get_mut(tenant_id) {
            tenant.remove(&object.id);
        }
        Ok(())
    }

    async fn index_all(&self, tenant_id: &str, objects: &[DomainObject]) -> PlinthResult<()> {
        if objects.is_empty() {
            return Ok(());
        }
        self.adds.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut entries = self.entries.write().map_err(|_| IndexError::LockPoisoned)?;
        let tenant = entries.entry(tenant_id.to_string()).or_default();
        for object in objects {
            if !object.id.is_empty() {
                tenant.insert(object.id.clone(), object.clone());
            }
        }
        Ok(())
    }

    async fn unindex_all(&self, tenant_id: &str, objects: &[DomainObject]) -> PlinthResult<()> {
        if objects.is_empty() {
            return Ok(());
        }
        self.removes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut entries = self.entries.write().map_err(|_| IndexError::LockPoisoned)?;
        if let Some(tenant) = entries.get_mut(tenant_id) {
            for object in objects {
                tenant.remove(&object.id);
            }
        }
        Ok(())
    }

    async fn flush(&self, _tenant_id: &str) -> PlinthResult<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(())
    }
}

// =============================================================================
// CACHE
// =============================================================================

/// In-memory cache with hit/miss accounting.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    entries: Arc<RwLock<TenantMap>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    puts: Arc<AtomicU64>,
    removals: Arc<AtomicU64>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn contains(&self, tenant_id: &str, id: &str) -> bool {
        self.entries
            .read()
            .map(|map| {
                map.get(tenant_id)
                    .is_some_and(|tenant| tenant.contains_key(id))
            })
            .unwrap_or(false)
    }

    pub fn len(&self, tenant_id: &str) -> usize {
        self.entries
            .read()
            .map(|map| map.get(tenant_id).map_or(0, HashMap::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, tenant_id: &str) -> bool {
        self.len(tenant_id) == 0
    }

    /// Drop all entries and keep the stats.
    pub fn clear(&self) {
        if let Ok(mut map) = self.entries.write() {
            map.clear();
        }
    }

    fn check_available(&self) -> Result<(), CacheError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable {
                reason: "injected fault".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, tenant_id: &str, id: &str) -> PlinthResult<Option<DomainObject>> {
        self.check_available()?;
        let entries = self.entries.read().map_err(|_| CacheError::LockPoisoned)?;
        let found = entries
            .get(tenant_id)
            .and_then(|tenant| tenant.get(id))
            .cloned();
        match found {
            Some(object) => {
                self.hits.fetch_add(1, Ordering::SeqCst);
                Ok(Some(object))
            }
            None => {
                self.misses.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            }
        }
    }

    async fn put(&self, tenant_id: &str, id: &str, object: &DomainObject) -> PlinthResult<()> {
        self.check_available()?;
        self.puts.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        entries
            .entry(tenant_id.to_string())
            .or_default()
            .insert(id.to_string(), object.clone());
        Ok(())
    }

    async fn remove(&self, tenant_id: &str, id: &str) -> PlinthResult<()> {
        self.check_available()?;
        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        if let Some(tenant) = entries.get_mut(tenant_id) {
            if tenant.remove(id).is_some() {
                self.removals.fetch_add(1, Ordering::SeqCst);
            }
        }
        Ok(())
    }

    async fn get_all(
        &self,
        tenant_id: &str,
        ids: &[String],
    ) -> PlinthResult<HashMap<String, DomainObject>> {
        self.check_available()?;
        let entries = self.entries.read().map_err(|_| CacheError::LockPoisoned)?;
        let mut found = HashMap::new();
        let tenant = entries.get(tenant_id);
        for id in ids {
            match tenant.and_then(|t| t.get(id)) {
                Some(object) => {
                    self.hits.fetch_add(1, Ordering::SeqCst);
                    found.insert(id.clone(), object.clone());
                }
                None => {
                    self.misses.fetch_add(1, Ordering::SeqCst);
                }
            }
        }
        Ok(found)
    }

    async fn put_all(
        &self,
        tenant_id: &str,
        objects: &HashMap<String, DomainObject>,
    ) -> PlinthResult<()> {
        self.check_available()?;
        self.puts.fetch_add(objects.len() as u64, Ordering::SeqCst);
        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        let tenant = entries.entry(tenant_id.to_string()).or_default();
        for (id, object) in objects {
            tenant.insert(id.clone(), object.clone());
        }
        Ok(())
    }

    async fn remove_all(&self, tenant_id: &str, ids: &[String]) -> PlinthResult<()> {
        self.check_available()?;
        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        if let Some(tenant) = entries.get_mut(tenant_id) {
            for id in ids {
                if tenant.remove(id).is_some() {
                    self.removals.fetch_add(1, Ordering::SeqCst);
                }
            }
        }
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::SeqCst),
            misses: self.misses.load(Ordering::SeqCst),
            puts: self.puts.load(Ordering::SeqCst),
            removals: self.removals.load(Ordering::SeqCst),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! Write-path coordination across store, index, and cache.
//!
//! [`WritePath`] is the single entry point for object operations. Every
//! dispatch runs the listener chain, consults the policy table, validates
//! and stamps writes, and then fans out to the backing systems according to
//! each object's routing flags.
//!
//! # Design
//!
//! The durable store is the source of truth. A failed durable call aborts
//! the operation and surfaces the error; failed index and cache calls are
//! logged and swallowed so the write path degrades instead of failing.
//! Deletes clean up the durable store first, then best-effort the index and
//! cache. The search and cache kill switches suppress only those side
//! effects and never validation or durable writes.

use crate::listener::{ListenerRegistry, OpArgs, OpOutcome};
use crate::policy::{CacheAction, IndexAction, Op, OpPolicy, PolicyTable};
use crate::traits::{BatchOutcome, Cache, DurableStore, SearchIndex};
use plinth_core::{
    ensure_valid, validate_object, DomainObject, PlinthResult, StoreError, TypeRegistry,
    ValidationFailure, GENERIC_TYPE,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Runtime switches for the side-effect layers.
///
/// Disabling a layer suppresses its side effects only. Validation, stamping,
/// and durable writes always run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WritePathConfig {
    pub search_enabled: bool,
    pub cache_enabled: bool,
}

impl WritePathConfig {
    pub fn new() -> Self {
        Self {
            search_enabled: true,
            cache_enabled: true,
        }
    }

    pub fn with_search_enabled(mut self, enabled: bool) -> Self {
        self.search_enabled = enabled;
        self
    }

    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }
}

impl Default for WritePathConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// WRITE PATH
// =============================================================================

enum WriteVerb {
    Create,
    Update,
}

/// Coordinator for object operations across the three backing systems.
pub struct WritePath<D, X, C>
where
    D: DurableStore,
    X: SearchIndex,
    C: Cache,
{
    store: Arc<D>,
    index: Arc<X>,
    cache: Arc<C>,
    registry: Arc<TypeRegistry>,
    policies: PolicyTable,
    listeners: ListenerRegistry,
    config: WritePathConfig,
}

impl<D, X, C> WritePath<D, X, C>
where
    D: DurableStore,
    X: SearchIndex,
    C: Cache,
{
    /// Build a write path with the standard policy table, no listeners, and
    /// both side-effect layers enabled.
    pub fn new(
        store: Arc<D>,
        index: Arc<X>,
        cache: Arc<C>,
        registry: Arc<TypeRegistry>,
    ) -> Self {
        Self {
            store,
            index,
            cache,
            registry,
            policies: PolicyTable::standard(),
            listeners: ListenerRegistry::new(),
            config: WritePathConfig::new(),
        }
    }

    pub fn with_policies(mut self, policies: PolicyTable) -> Self {
        self.policies = policies;
        self
    }

    pub fn with_listeners(mut self, listeners: ListenerRegistry) -> Self {
        self.listeners = listeners;
        self
    }

    pub fn with_config(mut self, config: WritePathConfig) -> Self {
        self.config = config;
        self
    }

    /// Direct access to the durable store. Writes made through this handle
    /// skip validation, stamping, indexing, and caching.
    pub fn store(&self) -> &D {
        &self.store
    }

    /// Direct access to the search index. Mutations through this handle can
    /// drift from the durable store.
    pub fn index(&self) -> &X {
        &self.index
    }

    /// Direct access to the cache. Mutations through this handle can drift
    /// from the durable store.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn policies(&self) -> &PolicyTable {
        &self.policies
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn config(&self) -> WritePathConfig {
        self.config
    }

    // -------------------------------------------------------------------------
    // Single-object operations
    // -------------------------------------------------------------------------

    /// Create an object. Validates, stamps identity and timestamps, indexes
    /// and caches per the object's flags, and returns the assigned id.
    pub async fn create(
        &self,
        tenant_id: &str,
        object: &mut DomainObject,
    ) -> PlinthResult<String> {
        let policy = self.policies.policy_for(Op::Create);
        self.listeners
            .notify_pre(Op::Create, tenant_id, &OpArgs::Object(object))
            .await?;

        let id = if policy.is_pass_through() {
            self.store.create(tenant_id, object).await?
        } else {
            self.indexed_write(tenant_id, object, policy, WriteVerb::Create)
                .await?
        };
        if object.id.is_empty() {
            object.id = id.clone();
        }

        self.listeners
            .notify_post(
                Op::Create,
                tenant_id,
                &OpArgs::Object(object),
                &OpOutcome::Id(&id),
            )
            .await?;
        Ok(id)
    }

    /// Read one object, going through the cache when the policy asks for it.
    /// A blank id reads as absent without touching any backing system.
    pub async fn read(&self, tenant_id: &str, id: &str) -> PlinthResult<Option<DomainObject>> {
        let policy = self.policies.policy_for(Op::Read);
        let args = OpArgs::Id(id);
        self.listeners.notify_pre(Op::Read, tenant_id, &args).await?;

        if id.trim().is_empty() {
            self.listeners
                .notify_post(Op::Read, tenant_id, &args, &OpOutcome::Object(None))
                .await?;
            return Ok(None);
        }

        let through_cache = self.config.cache_enabled
            && matches!(policy.cache, CacheAction::Get | CacheAction::GetAll);
        if through_cache {
            match self.cache.get(tenant_id, id).await {
                Ok(Some(cached)) => {
                    debug!(tenant_id, id, "cache hit");
                    self.listeners
                        .notify_post(
                            Op::Read,
                            tenant_id,
                            &args,
                            &OpOutcome::Object(Some(&cached)),
                        )
                        .await?;
                    return Ok(Some(cached));
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(%error, tenant_id, id, "cache read failed, falling back to store");
                }
            }
        }

        let found = self.store.read(tenant_id, id).await?;
        if through_cache {
            if let Some(object) = &found {
                if object.is_cached {
                    if let Err(error) = self.cache.put(tenant_id, id, object).await {
                        warn!(%error, tenant_id, id, "cache populate failed");
                    }
                }
            }
        }

        self.listeners
            .notify_post(Op::Read, tenant_id, &args, &OpOutcome::Object(found.as_ref()))
            .await?;
        Ok(found)
    }

    /// Update an object in place. Validates, refreshes the update timestamp,
    /// and re-indexes and re-caches per the object's flags.
    pub async fn update(&self, tenant_id: &str, object: &mut DomainObject) -> PlinthResult<()> {
        let policy = self.policies.policy_for(Op::Update);
        self.listeners
            .notify_pre(Op::Update, tenant_id, &OpArgs::Object(object))
            .await?;

        if policy.is_pass_through() {
            self.store.update(tenant_id, object).await?;
        } else {
            self.indexed_write(tenant_id, object, policy, WriteVerb::Update)
                .await?;
        }

        self.listeners
            .notify_post(
                Op::Update,
                tenant_id,
                &OpArgs::Object(object),
                &OpOutcome::Unit,
            )
            .await?;
        Ok(())
    }

    /// Delete one object. The durable delete runs first and its failure
    /// aborts the operation; index and cache cleanup is best effort.
    pub async fn delete(&self, tenant_id: &str, id: &str) -> PlinthResult<()> {
        let policy = self.policies.policy_for(Op::Delete);
        let args = OpArgs::Id(id);
        self.listeners
            .notify_pre(Op::Delete, tenant_id, &args)
            .await?;

        self.store.delete(tenant_id, id).await?;

        if self.config.search_enabled
            && matches!(policy.index, IndexAction::Remove | IndexAction::RemoveAll)
        {
            let carrier = DomainObject::with_id(GENERIC_TYPE, id);
            if let Err(error) = self.index.unindex(tenant_id, &carrier).await {
                warn!(%error, tenant_id, id, "unindex failed, continuing");
            }
        }
        if self.config.cache_enabled
            && matches!(policy.cache, CacheAction::Delete | CacheAction::DeleteAll)
        {
            if let Err(error) = self.cache.remove(tenant_id, id).await {
                warn!(%error, tenant_id, id, "cache remove failed, continuing");
            }
        }

        self.listeners
            .notify_post(Op::Delete, tenant_id, &args, &OpOutcome::Unit)
            .await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Batch operations
    // -------------------------------------------------------------------------

    /// Create a batch. All objects are validated before anything is written;
    /// one invalid object rejects the whole batch. Outcomes align with the
    /// input order.
    pub async fn create_all(
        &self,
        tenant_id: &str,
        objects: &mut [DomainObject],
    ) -> PlinthResult<BatchOutcome> {
        self.batch_write(tenant_id, objects, Op::CreateAll).await
    }

    /// Update a batch, with the same validation and alignment rules as
    /// [`Self::create_all`].
    pub async fn update_all(
        &self,
        tenant_id: &str,
        objects: &mut [DomainObject],
    ) -> PlinthResult<BatchOutcome> {
        self.batch_write(tenant_id, objects, Op::UpdateAll).await
    }

    /// Read many objects by id. Cached entries short-circuit the durable
    /// read when they satisfy the whole request, and win over durable
    /// results on merge.
    pub async fn read_all(
        &self,
        tenant_id: &str,
        ids: &[String],
    ) -> PlinthResult<HashMap<String, DomainObject>> {
        let policy = self.policies.policy_for(Op::ReadAll);
        let args = OpArgs::Ids(ids);
        self.listeners
            .notify_pre(Op::ReadAll, tenant_id, &args)
            .await?;

        if ids.is_empty() {
            let found = HashMap::new();
            self.listeners
                .notify_post(Op::ReadAll, tenant_id, &args, &OpOutcome::Objects(&found))
                .await?;
            return Ok(found);
        }

        let through_cache = self.config.cache_enabled
            && matches!(policy.cache, CacheAction::Get | CacheAction::GetAll);
        let cached = if through_cache {
            match self.cache.get_all(tenant_id, ids).await {
                Ok(found) => found,
                Err(error) => {
                    warn!(%error, tenant_id, "cache batch read failed, falling back to store");
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        if cached.len() >= ids.len() {
            self.listeners
                .notify_post(Op::ReadAll, tenant_id, &args, &OpOutcome::Objects(&cached))
                .await?;
            return Ok(cached);
        }

        let mut merged = self.store.read_all(tenant_id, ids).await?;
        if through_cache {
            for (id, object) in &merged {
                if object.is_cached && !cached.contains_key(id) {
                    if let Err(error) = self.cache.put(tenant_id, id, object).await {
                        warn!(%error, tenant_id, id, "cache populate failed");
                    }
                }
            }
        }
        // Cached entries win over freshly read ones.
        for (id, object) in cached {
            merged.insert(id, object);
        }

        self.listeners
            .notify_post(Op::ReadAll, tenant_id, &args, &OpOutcome::Objects(&merged))
            .await?;
        Ok(merged)
    }

    /// Delete a batch by id. Durable delete first, then best-effort cleanup
    /// of index and cache.
    pub async fn delete_all(&self, tenant_id: &str, ids: &[String]) -> PlinthResult<()> {
        let policy = self.policies.policy_for(Op::DeleteAll);
        let args = OpArgs::Ids(ids);
        self.listeners
            .notify_pre(Op::DeleteAll, tenant_id, &args)
            .await?;

        if ids.is_empty() {
            self.listeners
                .notify_post(Op::DeleteAll, tenant_id, &args, &OpOutcome::Unit)
                .await?;
            return Ok(());
        }

        self.store.delete_all(tenant_id, ids).await?;

        if self.config.search_enabled
            && matches!(policy.index, IndexAction::Remove | IndexAction::RemoveAll)
        {
            let carriers: Vec<DomainObject> = ids
                .iter()
                .map(|id| DomainObject::with_id(GENERIC_TYPE, id))
                .collect();
            if let Err(error) = self.index.unindex_all(tenant_id, &carriers).await {
                warn!(%error, tenant_id, "unindex batch failed, continuing");
            }
        }
        if self.config.cache_enabled
            && matches!(policy.cache, CacheAction::Delete | CacheAction::DeleteAll)
        {
            if let Err(error) = self.cache.remove_all(tenant_id, ids).await {
                warn!(%error, tenant_id, "cache batch remove failed, continuing");
            }
        }

        self.listeners
            .notify_post(Op::DeleteAll, tenant_id, &args, &OpOutcome::Unit)
            .await?;
        Ok(())
    }

    /// Ask the index to make pending writes visible. A no-op while search is
    /// disabled.
    pub async fn flush_index(&self, tenant_id: &str) -> PlinthResult<()> {
        if !self.config.search_enabled {
            return Ok(());
        }
        self.index.flush(tenant_id).await
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    async fn indexed_write(
        &self,
        tenant_id: &str,
        object: &mut DomainObject,
        policy: OpPolicy,
        verb: WriteVerb,
    ) -> PlinthResult<String> {
        ensure_valid(&self.registry, object)?;
        self.registry.check_and_fix_type(object);
        if object.is_stored || object.is_indexed || object.is_cached {
            object.prepare_for_write(tenant_id);
        }

        if self.config.search_enabled {
            match policy.index {
                IndexAction::Add | IndexAction::AddAll if object.is_indexed => {
                    if let Err(error) = self.index.index(tenant_id, object).await {
                        warn!(%error, tenant_id, id = %object.id, "index write failed, continuing");
                    }
                }
                IndexAction::Remove | IndexAction::RemoveAll => {
                    if let Err(error) = self.index.unindex(tenant_id, object).await {
                        warn!(%error, tenant_id, id = %object.id, "unindex failed, continuing");
                    }
                }
                _ => {}
            }
        }

        if object.is_stored {
            match verb {
                WriteVerb::Create => {
                    let id = self.store.create(tenant_id, object).await?;
                    object.id = id;
                }
                WriteVerb::Update => self.store.update(tenant_id, object).await?,
            }
        }

        if self.config.cache_enabled && !object.id.is_empty() {
            match policy.cache {
                CacheAction::Put | CacheAction::PutAll if object.is_cached => {
                    if let Err(error) = self.cache.put(tenant_id, &object.id, object).await {
                        warn!(%error, tenant_id, id = %object.id, "cache put failed, continuing");
                    }
                }
                CacheAction::Delete | CacheAction::DeleteAll => {
                    if let Err(error) = self.cache.remove(tenant_id, &object.id).await {
                        warn!(%error, tenant_id, id = %object.id, "cache remove failed, continuing");
                    }
                }
                _ => {}
            }
        }

        Ok(object.id.clone())
    }

    async fn batch_write(
        &self,
        tenant_id: &str,
        objects: &mut [DomainObject],
        op: Op,
    ) -> PlinthResult<BatchOutcome> {
        let policy = self.policies.policy_for(op);
        self.listeners
            .notify_pre(op, tenant_id, &OpArgs::Objects(objects))
            .await?;

        if objects.is_empty() {
            let outcomes = Vec::new();
            self.listeners
                .notify_post(
                    op,
                    tenant_id,
                    &OpArgs::Objects(objects),
                    &OpOutcome::Outcomes(&outcomes),
                )
                .await?;
            return Ok(outcomes);
        }

        let outcomes = if policy.is_pass_through() {
            match op {
                Op::CreateAll => self.store.create_all(tenant_id, objects).await?,
                _ => self.store.update_all(tenant_id, objects).await?,
            }
        } else {
            self.indexed_batch_write(tenant_id, objects, policy, op).await?
        };

        self.listeners
            .notify_post(
                op,
                tenant_id,
                &OpArgs::Objects(objects),
                &OpOutcome::Outcomes(&outcomes),
            )
            .await?;
        Ok(outcomes)
    }

    async fn indexed_batch_write(
        &self,
        tenant_id: &str,
        objects: &mut [DomainObject],
        policy: OpPolicy,
        op: Op,
    ) -> PlinthResult<BatchOutcome> {
        // Validate everything before touching any backing system.
        let mut messages = Vec::new();
        for (i, object) in objects.iter().enumerate() {
            for message in validate_object(&self.registry, object) {
                messages.push(format!("[{i}] {message}"));
            }
        }
        if !messages.is_empty() {
            return Err(ValidationFailure::new(messages).into());
        }

        for object in objects.iter_mut() {
            self.registry.check_and_fix_type(object);
            if object.is_stored || object.is_indexed || object.is_cached {
                object.prepare_for_write(tenant_id);
            }
        }

        let to_store: Vec<DomainObject> =
            objects.iter().filter(|o| o.is_stored).cloned().collect();
        let store_outcomes = if to_store.is_empty() {
            Vec::new()
        } else {
            match op {
                Op::CreateAll => self.store.create_all(tenant_id, &to_store).await?,
                _ => self.store.update_all(tenant_id, &to_store).await?,
            }
        };
        log_failed_items(&store_outcomes);

        if self.config.search_enabled {
            match policy.index {
                IndexAction::Add | IndexAction::AddAll => {
                    let to_index: Vec<DomainObject> =
                        objects.iter().filter(|o| o.is_indexed).cloned().collect();
                    if let Err(error) = self.index.index_all(tenant_id, &to_index).await {
                        warn!(%error, tenant_id, "index batch failed, continuing");
                    }
                }
                IndexAction::Remove | IndexAction::RemoveAll => {
                    if let Err(error) = self.index.unindex_all(tenant_id, objects).await {
                        warn!(%error, tenant_id, "unindex batch failed, continuing");
                    }
                }
                IndexAction::None => {}
            }
        }

        if self.config.cache_enabled {
            match policy.cache {
                CacheAction::Put | CacheAction::PutAll => {
                    let to_cache: HashMap<String, DomainObject> = objects
                        .iter()
                        .filter(|o| o.is_cached && !o.id.is_empty())
                        .map(|o| (o.id.clone(), o.clone()))
                        .collect();
                    if !to_cache.is_empty() {
                        if let Err(error) = self.cache.put_all(tenant_id, &to_cache).await {
                            warn!(%error, tenant_id, "cache batch put failed, continuing");
                        }
                    }
                }
                CacheAction::Delete | CacheAction::DeleteAll => {
                    let ids: Vec<String> = objects
                        .iter()
                        .filter(|o| !o.id.is_empty())
                        .map(|o| o.id.clone())
                        .collect();
                    if let Err(error) = self.cache.remove_all(tenant_id, &ids).await {
                        warn!(%error, tenant_id, "cache batch remove failed, continuing");
                    }
                }
                _ => {}
            }
        }

        // Align outcomes with the caller's order; unstored items report the
        // id they were stamped with.
        let mut store_iter = store_outcomes.into_iter();
        let mut outcomes = Vec::with_capacity(objects.len());
        for object in objects.iter() {
            if object.is_stored {
                match store_iter.next() {
                    Some(outcome) => outcomes.push(outcome),
                    None => outcomes.push(Err(StoreError::WriteFailed {
                        id: object.id.clone(),
                        reason: "missing batch outcome".to_string(),
                    })),
                }
            } else {
                outcomes.push(Ok(object.id.clone()));
            }
        }
        Ok(outcomes)
    }
}

impl<D, X, C> Clone for WritePath<D, X, C>
where
    D: DurableStore,
    X: SearchIndex,
    C: Cache,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            index: Arc::clone(&self.index),
            cache: Arc::clone(&self.cache),
            registry: Arc::clone(&self.registry),
            policies: self.policies.clone(),
            listeners: self.listeners.clone(),
            config: self.config,
        }
    }
}

fn log_failed_items(outcomes: &[Result<String, StoreError>]) {
    for (i, outcome) in outcomes.iter().enumerate() {
        if let Err(error) = outcome {
            warn!(%error, position = i, "batch item failed");
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::OpListener;
    use crate::memory::{InMemoryCache, InMemoryIndex, InMemoryStore};
    use async_trait::async_trait;
    use plinth_core::PlinthError;

    type MemoryWritePath = WritePath<InMemoryStore, InMemoryIndex, InMemoryCache>;

    fn write_path() -> (MemoryWritePath, InMemoryStore, InMemoryIndex, InMemoryCache) {
        let store = InMemoryStore::new();
        let index = InMemoryIndex::new();
        let cache = InMemoryCache::new();
        let path = WritePath::new(
            Arc::new(store.clone()),
            Arc::new(index.clone()),
            Arc::new(cache.clone()),
            Arc::new(TypeRegistry::new()),
        );
        (path, store, index, cache)
    }

    struct Rejecting;

    #[async_trait]
    impl OpListener for Rejecting {
        fn name(&self) -> &str {
            "rejecting"
        }

        async fn on_pre_invoke(
            &self,
            _op: Op,
            _tenant_id: &str,
            _args: &OpArgs<'_>,
        ) -> PlinthResult<()> {
            Err(PlinthError::ListenerAborted {
                listener: "rejecting".to_string(),
                reason: "not today".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_create_stamps_and_writes_everywhere() {
        let (path, store, index, cache) = write_path();
        let mut object = DomainObject::new("note");
        let id = path.create("t1", &mut object).await.unwrap();

        assert_eq!(object.id, id);
        assert!(object.created_at.is_some());
        assert_eq!(object.tenant_id, "t1");
        assert!(store.contains("t1", &id));
        assert!(index.contains("t1", &id));
        assert!(cache.contains("t1", &id));
    }

    #[tokio::test]
    async fn test_pass_through_skips_validation_and_side_effects() {
        let (path, store, index, cache) = write_path();
        let path = path.with_policies(PolicyTable::pass_through());

        let mut object = DomainObject::new("note");
        object.name = String::new();
        let id = path.create("t1", &mut object).await.unwrap();

        // The raw durable call ran, nothing else did.
        assert!(store.contains("t1", &id));
        assert!(object.created_at.is_none());
        assert_eq!(index.add_count(), 0);
        assert!(cache.is_empty("t1"));
    }

    #[tokio::test]
    async fn test_validation_failure_writes_nothing() {
        let (path, store, index, cache) = write_path();
        let mut object = DomainObject::new("note");
        object.name = String::new();

        let err = path.create("t1", &mut object).await.unwrap_err();
        assert!(matches!(err, PlinthError::Validation(_)));
        assert_eq!(store.write_count(), 0);
        assert_eq!(index.add_count(), 0);
        assert!(cache.is_empty("t1"));
    }

    #[tokio::test]
    async fn test_search_kill_switch_skips_index_only() {
        let (path, store, index, cache) = write_path();
        let path = path.with_config(WritePathConfig::new().with_search_enabled(false));

        let mut object = DomainObject::new("note");
        let id = path.create("t1", &mut object).await.unwrap();

        assert!(store.contains("t1", &id));
        assert_eq!(index.add_count(), 0);
        assert!(cache.contains("t1", &id));
    }

    #[tokio::test]
    async fn test_cache_kill_switch_skips_cache_only() {
        let (path, store, index, cache) = write_path();
        let path = path.with_config(WritePathConfig::new().with_cache_enabled(false));

        let mut object = DomainObject::new("note");
        let id = path.create("t1", &mut object).await.unwrap();

        assert!(store.contains("t1", &id));
        assert!(index.contains("t1", &id));
        assert!(cache.is_empty("t1"));
    }

    #[tokio::test]
    async fn test_listener_abort_prevents_backing_calls() {
        let (path, store, index, cache) = write_path();
        let path = path
            .with_listeners(ListenerRegistry::new().register(Arc::new(Rejecting)));

        let mut object = DomainObject::new("note");
        let err = path.create("t1", &mut object).await.unwrap_err();
        assert!(matches!(err, PlinthError::ListenerAborted { .. }));
        assert_eq!(store.write_count(), 0);
        assert_eq!(index.add_count(), 0);
        assert!(cache.is_empty("t1"));
    }

    #[tokio::test]
    async fn test_read_blank_id_is_absent() {
        let (path, store, _index, _cache) = write_path();
        assert!(path.read("t1", "  ").await.unwrap().is_none());
        assert_eq!(store.read_count(), 0);
    }

    #[tokio::test]
    async fn test_flush_index_respects_kill_switch() {
        let (path, _store, index, _cache) = write_path();
        path.flush_index("t1").await.unwrap();
        assert_eq!(index.flush_count(), 1);

        let path = path.with_config(WritePathConfig::new().with_search_enabled(false));
        path.flush_index("t1").await.unwrap();
        assert_eq!(index.flush_count(), 1);
    }

    #[tokio::test]
    async fn test_clone_shares_backends() {
        let (path, store, _index, _cache) = write_path();
        let other = path.clone();
        let mut object = DomainObject::new("note");
        let id = other.create("t1", &mut object).await.unwrap();
        assert!(store.contains("t1", &id));
        assert!(path.read("t1", &id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_builder_wiring() {
        let (path, _store, _index, _cache) = write_path();
        let path = path
            .with_policies(PolicyTable::pass_through())
            .with_config(WritePathConfig::new().with_cache_enabled(false));

        assert!(path.policies().is_empty());
        assert!(!path.config().cache_enabled);
        assert!(path.config().search_enabled);
        assert!(path.listeners().is_empty());
        assert!(path.registry().is_registered("custom"));
    }
}

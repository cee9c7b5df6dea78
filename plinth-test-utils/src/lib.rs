//! Plinth Test Utilities
//!
//! Centralized test infrastructure for the Plinth workspace:
//! - A fully wired in-memory [`Harness`] around [`WritePath`]
//! - Recording and aborting listeners for observing dispatches
//! - Proptest generators for domain objects
//! - Fixtures and assertions shared across crates

// Re-export the in-memory backends from their source crate
pub use plinth_store::{InMemoryCache, InMemoryIndex, InMemoryStore};

// Re-export core types for convenience
pub use plinth_core::{
    Constraint, DomainObject, PlinthError, PlinthResult, TypeRegistry,
};
pub use plinth_store::{
    CacheAction, IndexAction, ListenerRegistry, Op, OpArgs, OpListener, OpOutcome, OpPolicy,
    PolicyTable, WritePath, WritePathConfig,
};

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

// ============================================================================
// RECORDING LISTENERS
// ============================================================================

/// Which side of an operation a hook fired on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Pre,
    Post,
}

/// One observed hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub hook: Hook,
    pub op: Op,
    pub tenant_id: String,
    pub items: usize,
}

/// Listener that records every hook invocation for later inspection.
///
/// Register it through an `Arc` and keep a clone of the handle; recorded
/// calls are visible through any handle.
#[derive(Debug)]
pub struct RecordingListener {
    name: String,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::named("recording")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of everything observed so far, in invocation order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Hook and operation pairs only, for compact assertions.
    pub fn ops(&self) -> Vec<(Hook, Op)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| (call.hook, call.op))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, hook: Hook, op: Op, tenant_id: &str, items: usize) {
        self.calls.lock().unwrap().push(RecordedCall {
            hook,
            op,
            tenant_id: tenant_id.to_string(),
            items,
        });
    }
}

impl Default for RecordingListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OpListener for RecordingListener {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_pre_invoke(
        &self,
        op: Op,
        tenant_id: &str,
        args: &OpArgs<'_>,
    ) -> PlinthResult<()> {
        self.record(Hook::Pre, op, tenant_id, args.len());
        Ok(())
    }

    async fn on_post_invoke(
        &self,
        op: Op,
        tenant_id: &str,
        args: &OpArgs<'_>,
        _outcome: &OpOutcome<'_>,
    ) -> PlinthResult<()> {
        self.record(Hook::Post, op, tenant_id, args.len());
        Ok(())
    }
}

/// Listener that rejects every operation on one side of the dispatch.
#[derive(Debug, Clone)]
pub struct AbortingListener {
    name: String,
    hook: Hook,
}

impl AbortingListener {
    /// Abort before any backing call runs.
    pub fn pre() -> Self {
        Self {
            name: "abort-pre".to_string(),
            hook: Hook::Pre,
        }
    }

    /// Abort after the backing calls already ran.
    pub fn post() -> Self {
        Self {
            name: "abort-post".to_string(),
            hook: Hook::Post,
        }
    }

    fn abort(&self) -> PlinthError {
        PlinthError::ListenerAborted {
            listener: self.name.clone(),
            reason: "aborted by test listener".to_string(),
        }
    }
}

#[async_trait]
impl OpListener for AbortingListener {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_pre_invoke(
        &self,
        _op: Op,
        _tenant_id: &str,
        _args: &OpArgs<'_>,
    ) -> PlinthResult<()> {
        if self.hook == Hook::Pre {
            return Err(self.abort());
        }
        Ok(())
    }

    async fn on_post_invoke(
        &self,
        _op: Op,
        _tenant_id: &str,
        _args: &OpArgs<'_>,
        _outcome: &OpOutcome<'_>,
    ) -> PlinthResult<()> {
        if self.hook == Hook::Post {
            return Err(self.abort());
        }
        Ok(())
    }
}

// ============================================================================
// HARNESS
// ============================================================================

/// A write path wired to shared in-memory backends.
///
/// The backend fields are clones of the handles inside the write path, so
/// tests can assert on state and counters directly while the write path
/// does the work.
pub struct Harness {
    pub write_path: WritePath<InMemoryStore, InMemoryIndex, InMemoryCache>,
    pub store: InMemoryStore,
    pub index: InMemoryIndex,
    pub cache: InMemoryCache,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_registry(TypeRegistry::new())
    }

    pub fn with_registry(registry: TypeRegistry) -> Self {
        let store = InMemoryStore::new();
        let index = InMemoryIndex::new();
        let cache = InMemoryCache::new();
        let write_path = WritePath::new(
            Arc::new(store.clone()),
            Arc::new(index.clone()),
            Arc::new(cache.clone()),
            Arc::new(registry),
        );
        Self {
            write_path,
            store,
            index,
            cache,
        }
    }

    pub fn with_listeners(mut self, listeners: ListenerRegistry) -> Self {
        self.write_path = self.write_path.with_listeners(listeners);
        self
    }

    pub fn with_policies(mut self, policies: PolicyTable) -> Self {
        self.write_path = self.write_path.with_policies(policies);
        self
    }

    pub fn with_config(mut self, config: WritePathConfig) -> Self {
        self.write_path = self.write_path.with_config(config);
        self
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating domain objects.

    use super::*;
    use proptest::collection::vec;
    use proptest::prelude::*;

    /// Generate a lowercase type tag.
    pub fn arb_type_tag() -> impl Strategy<Value = String> {
        "[a-z]{3,12}"
    }

    /// Generate a tenant id.
    pub fn arb_tenant_id() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9]{2,9}"
    }

    /// Generate an object id.
    pub fn arb_object_id() -> impl Strategy<Value = String> {
        "[a-z0-9]{8,16}"
    }

    /// Generate a single tag.
    pub fn arb_tag() -> impl Strategy<Value = String> {
        "[a-z]{1,10}"
    }

    /// Generate a name the validation gate accepts.
    pub fn arb_name() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 ]{0,30}"
    }

    /// Generate a valid object with random tags and routing flags.
    pub fn arb_object() -> impl Strategy<Value = DomainObject> {
        (
            arb_type_tag(),
            arb_name(),
            vec(arb_tag(), 0..5),
            any::<(bool, bool, bool)>(),
        )
            .prop_map(|(tag, name, tags, (stored, indexed, cached))| {
                let mut object = DomainObject::new(&tag);
                object.name = name;
                object.set_tags(tags);
                object.is_stored = stored;
                object.is_indexed = indexed;
                object.is_cached = cached;
                object
            })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built objects and registries for common scenarios.

    use super::*;
    use serde_json::json;

    /// Tenant used across fixtures.
    pub const TENANT: &str = "acme";

    /// A minimal valid object routed to all three systems.
    pub fn object() -> DomainObject {
        DomainObject::new("note")
    }

    /// A valid object with a caller-chosen name.
    pub fn named_object(name: &str) -> DomainObject {
        let mut object = object();
        object.name = name.to_string();
        object
    }

    /// An object that skips the durable store.
    pub fn unstored_object() -> DomainObject {
        let mut object = object();
        object.is_stored = false;
        object
    }

    /// An object that skips the search index.
    pub fn unindexed_object() -> DomainObject {
        let mut object = object();
        object.is_indexed = false;
        object
    }

    /// An object that skips the cache.
    pub fn uncached_object() -> DomainObject {
        let mut object = object();
        object.is_cached = false;
        object
    }

    /// A batch of distinct valid objects.
    pub fn objects(count: usize) -> Vec<DomainObject> {
        (0..count)
            .map(|i| named_object(&format!("note-{i}")))
            .collect()
    }

    /// Registry with a `report` type carrying one of each constraint kind.
    pub fn constrained_registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register("report", Arc::new(|| DomainObject::new("report")));
        registry
            .constrain("report", "status", Constraint::Required)
            .unwrap();
        registry
            .constrain("report", "label", Constraint::Size { min: 2, max: 8 })
            .unwrap();
        registry
            .constrain(
                "report",
                "code",
                Constraint::Pattern("^[A-Z]{3}-[0-9]+$".to_string()),
            )
            .unwrap();
        registry
    }

    /// A `report` that satisfies every constraint in
    /// [`constrained_registry`].
    pub fn report_object() -> DomainObject {
        let mut report = DomainObject::new("report");
        report.set_property("status", json!("open"));
        report.set_property("label", json!("weekly"));
        report.set_property("code", json!("RPT-2024"));
        report
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertion helpers for write-path results.

    use super::*;

    /// Assert that a result is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &PlinthResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {result:?}");
    }

    /// Assert that a result is Err.
    #[track_caller]
    pub fn assert_err<T: std::fmt::Debug>(result: &PlinthResult<T>) {
        assert!(result.is_err(), "Expected Err, got Ok: {result:?}");
    }

    /// Assert a validation failure with a message containing the fragment.
    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(
        result: &PlinthResult<T>,
        fragment: &str,
    ) {
        match result {
            Err(PlinthError::Validation(failure)) => {
                assert!(
                    failure.messages.iter().any(|m| m.contains(fragment)),
                    "No validation message contains {fragment:?}: {:?}",
                    failure.messages
                );
            }
            other => panic!("Expected Validation error, got: {other:?}"),
        }
    }

    /// Assert the operation was aborted by the named listener.
    #[track_caller]
    pub fn assert_listener_abort<T: std::fmt::Debug>(result: &PlinthResult<T>, name: &str) {
        match result {
            Err(PlinthError::ListenerAborted { listener, .. }) => {
                assert_eq!(listener, name, "Wrong listener in abort");
            }
            other => panic!("Expected ListenerAborted, got: {other:?}"),
        }
    }

    /// Assert a durable-store failure.
    #[track_caller]
    pub fn assert_store_error<T: std::fmt::Debug>(result: &PlinthResult<T>) {
        match result {
            Err(PlinthError::Store(_)) => {}
            other => panic!("Expected Store error, got: {other:?}"),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_harness_writes_to_all_backends() {
        let harness = Harness::new();
        let mut object = fixtures::object();
        let id = harness
            .write_path
            .create(fixtures::TENANT, &mut object)
            .await
            .unwrap();
        assert!(harness.store.contains(fixtures::TENANT, &id));
        assert!(harness.index.contains(fixtures::TENANT, &id));
        assert!(harness.cache.contains(fixtures::TENANT, &id));
    }

    #[tokio::test]
    async fn test_recording_listener_sees_both_hooks() {
        let recorder = Arc::new(RecordingListener::new());
        let harness = Harness::new()
            .with_listeners(ListenerRegistry::new().register(recorder.clone()));

        let mut object = fixtures::object();
        harness
            .write_path
            .create(fixtures::TENANT, &mut object)
            .await
            .unwrap();

        assert_eq!(
            recorder.ops(),
            [(Hook::Pre, Op::Create), (Hook::Post, Op::Create)]
        );
        let calls = recorder.calls();
        assert_eq!(calls[0].tenant_id, fixtures::TENANT);
        assert_eq!(calls[0].items, 1);
    }

    #[tokio::test]
    async fn test_aborting_listener_pre_blocks_backing_calls() {
        let harness = Harness::new().with_listeners(
            ListenerRegistry::new().register(Arc::new(AbortingListener::pre())),
        );

        let mut object = fixtures::object();
        let result = harness.write_path.create(fixtures::TENANT, &mut object).await;
        assertions::assert_listener_abort(&result, "abort-pre");
        assert_eq!(harness.store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_aborting_listener_post_surfaces_after_write() {
        let harness = Harness::new().with_listeners(
            ListenerRegistry::new().register(Arc::new(AbortingListener::post())),
        );

        let mut object = fixtures::object();
        let result = harness.write_path.create(fixtures::TENANT, &mut object).await;
        assertions::assert_listener_abort(&result, "abort-post");
        // The write already happened when the post hook rejected.
        assert_eq!(harness.store.len(fixtures::TENANT), 1);
    }

    #[test]
    fn test_fixture_flags() {
        assert!(!fixtures::unstored_object().is_stored);
        assert!(!fixtures::unindexed_object().is_indexed);
        assert!(!fixtures::uncached_object().is_cached);
        assert_eq!(fixtures::objects(3).len(), 3);
    }

    #[test]
    fn test_constrained_registry_shape() {
        let registry = fixtures::constrained_registry();
        assert!(registry.is_registered("report"));
        assert_eq!(registry.constraints_for("report").len(), 3);
    }

    #[tokio::test]
    async fn test_report_fixture_passes_its_registry() {
        let harness = Harness::with_registry(fixtures::constrained_registry());
        let mut report = fixtures::report_object();
        let result = harness.write_path.create(fixtures::TENANT, &mut report).await;
        assertions::assert_ok(&result);

        let mut bare = DomainObject::new("report");
        let result = harness.write_path.create(fixtures::TENANT, &mut bare).await;
        assertions::assert_validation_error(&result, "status: is required");
    }
}

//! Listener chain around dispatched operations.
//!
//! Listeners observe every operation the write path dispatches, before and
//! after the backing calls run. Hooks receive borrowed views of the inputs
//! and the outcome, so they can inspect but never mutate what flows
//! through. A pre hook returning an error aborts the operation before any
//! backing system is touched; a post hook error surfaces to the caller
//! after the work is already done.

use crate::policy::Op;
use async_trait::async_trait;
use plinth_core::{DomainObject, PlinthResult, StoreError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

// =============================================================================
// HOOK VIEWS
// =============================================================================

/// Borrowed view of an operation's inputs.
#[derive(Debug, Clone, Copy)]
pub enum OpArgs<'a> {
    Object(&'a DomainObject),
    Objects(&'a [DomainObject]),
    Id(&'a str),
    Ids(&'a [String]),
}

impl OpArgs<'_> {
    /// Number of items the operation touches.
    pub fn len(&self) -> usize {
        match self {
            OpArgs::Object(_) | OpArgs::Id(_) => 1,
            OpArgs::Objects(objects) => objects.len(),
            OpArgs::Ids(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Borrowed view of an operation's result.
#[derive(Debug, Clone, Copy)]
pub enum OpOutcome<'a> {
    Unit,
    Id(&'a str),
    Object(Option<&'a DomainObject>),
    Objects(&'a HashMap<String, DomainObject>),
    Outcomes(&'a [Result<String, StoreError>]),
}

// =============================================================================
// LISTENER TRAIT
// =============================================================================

/// Observer hooked around every dispatched operation.
///
/// Both hooks default to no-ops, so implementations only override the side
/// they care about.
#[async_trait]
pub trait OpListener: Send + Sync {
    /// Stable name used in logs and abort errors.
    fn name(&self) -> &str;

    /// Runs before any backing call. An error aborts the operation.
    async fn on_pre_invoke(
        &self,
        op: Op,
        tenant_id: &str,
        args: &OpArgs<'_>,
    ) -> PlinthResult<()> {
        let _ = (op, tenant_id, args);
        Ok(())
    }

    /// Runs after the backing calls succeed. An error surfaces to the
    /// caller, but the work is already done.
    async fn on_post_invoke(
        &self,
        op: Op,
        tenant_id: &str,
        args: &OpArgs<'_>,
        outcome: &OpOutcome<'_>,
    ) -> PlinthResult<()> {
        let _ = (op, tenant_id, args, outcome);
        Ok(())
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Ordered collection of listeners, notified in registration order.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    listeners: Vec<Arc<dyn OpListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener. Later registrations run later in both hooks.
    pub fn register(mut self, listener: Arc<dyn OpListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Registered listener names, in order.
    pub fn names(&self) -> Vec<&str> {
        self.listeners.iter().map(|l| l.name()).collect()
    }

    pub(crate) async fn notify_pre(
        &self,
        op: Op,
        tenant_id: &str,
        args: &OpArgs<'_>,
    ) -> PlinthResult<()> {
        for listener in &self.listeners {
            listener.on_pre_invoke(op, tenant_id, args).await?;
        }
        Ok(())
    }

    pub(crate) async fn notify_post(
        &self,
        op: Op,
        tenant_id: &str,
        args: &OpArgs<'_>,
        outcome: &OpOutcome<'_>,
    ) -> PlinthResult<()> {
        for listener in &self.listeners {
            listener.on_post_invoke(op, tenant_id, args, outcome).await?;
        }
        Ok(())
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.names())
            .finish()
    }
}

// =============================================================================
// TRACING LISTENER
// =============================================================================

/// Listener that logs every dispatch at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

#[async_trait]
impl OpListener for TracingListener {
    fn name(&self) -> &str {
        "tracing"
    }

    async fn on_pre_invoke(
        &self,
        op: Op,
        tenant_id: &str,
        args: &OpArgs<'_>,
    ) -> PlinthResult<()> {
        debug!(?op, tenant_id, items = args.len(), "op dispatch");
        Ok(())
    }

    async fn on_post_invoke(
        &self,
        op: Op,
        tenant_id: &str,
        args: &OpArgs<'_>,
        _outcome: &OpOutcome<'_>,
    ) -> PlinthResult<()> {
        debug!(?op, tenant_id, items = args.len(), "op complete");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

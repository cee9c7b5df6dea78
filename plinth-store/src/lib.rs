//! Write-path coordination for the Plinth persistence platform.
//!
//! This crate wires a [`DurableStore`], a [`SearchIndex`], and a [`Cache`]
//! behind one [`WritePath`] entry point. Each dispatched operation runs the
//! listener chain, consults the per-operation [`PolicyTable`], validates and
//! stamps writes, and routes side effects by the object's `is_stored`,
//! `is_indexed`, and `is_cached` flags. The durable store is the source of
//! truth; index and cache failures degrade instead of failing the call.
//!
//! [`InMemoryStore`], [`InMemoryIndex`], and [`InMemoryCache`] are the
//! embedded backends. They share state across clones, which also makes them
//! the test doubles for everything downstream.
//!
//! [`DurableStore`]: crate::traits::DurableStore
//! [`SearchIndex`]: crate::traits::SearchIndex
//! [`Cache`]: crate::traits::Cache

pub mod listener;
pub mod memory;
pub mod policy;
pub mod traits;
pub mod write_path;

pub use listener::{ListenerRegistry, OpArgs, OpListener, OpOutcome, TracingListener};
pub use memory::{InMemoryCache, InMemoryIndex, InMemoryStore};
pub use policy::{CacheAction, IndexAction, Op, OpPolicy, PolicyTable};
pub use traits::{BatchOutcome, Cache, CacheStats, DurableStore, SearchIndex};
pub use write_path::{WritePath, WritePathConfig};

//! Per-operation side-effect policy.
//!
//! Every logical operation carries a policy describing what the index and
//! the cache should do alongside the durable write. The write path consults
//! the table at dispatch time; an operation with no entry passes straight
//! through to the durable store with no side effects, no validation, and no
//! stamping.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// OPERATIONS
// =============================================================================

/// Logical operations the write path dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    Create,
    Read,
    Update,
    Delete,
    CreateAll,
    ReadAll,
    UpdateAll,
    DeleteAll,
}

impl Op {
    /// True for the batch forms.
    pub fn is_batch(&self) -> bool {
        matches!(
            self,
            Op::CreateAll | Op::ReadAll | Op::UpdateAll | Op::DeleteAll
        )
    }
}

// =============================================================================
// ACTIONS
// =============================================================================

/// What the search index does for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexAction {
    None,
    Add,
    Remove,
    AddAll,
    RemoveAll,
}

/// What the cache does for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheAction {
    None,
    Get,
    Put,
    Delete,
    GetAll,
    PutAll,
    DeleteAll,
}

/// Index and cache actions paired for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpPolicy {
    pub index: IndexAction,
    pub cache: CacheAction,
}

impl OpPolicy {
    /// No side effects at all. The write path treats operations with this
    /// policy as raw durable calls.
    pub const PASS_THROUGH: OpPolicy = OpPolicy {
        index: IndexAction::None,
        cache: CacheAction::None,
    };

    pub fn new(index: IndexAction, cache: CacheAction) -> Self {
        Self { index, cache }
    }

    pub fn is_pass_through(&self) -> bool {
        self.index == IndexAction::None && self.cache == CacheAction::None
    }
}

// =============================================================================
// POLICY TABLE
// =============================================================================

/// Operation → policy mapping consulted on every dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyTable {
    policies: HashMap<Op, OpPolicy>,
}

impl PolicyTable {
    /// The standard mapping: writes index and cache, reads go through the
    /// cache, deletes clean up both.
    pub fn standard() -> Self {
        let mut policies = HashMap::new();
        policies.insert(
            Op::Create,
            OpPolicy::new(IndexAction::Add, CacheAction::Put),
        );
        policies.insert(
            Op::Read,
            OpPolicy::new(IndexAction::None, CacheAction::Get),
        );
        policies.insert(
            Op::Update,
            OpPolicy::new(IndexAction::Add, CacheAction::Put),
        );
        policies.insert(
            Op::Delete,
            OpPolicy::new(IndexAction::Remove, CacheAction::Delete),
        );
        policies.insert(
            Op::CreateAll,
            OpPolicy::new(IndexAction::AddAll, CacheAction::PutAll),
        );
        policies.insert(
            Op::ReadAll,
            OpPolicy::new(IndexAction::None, CacheAction::GetAll),
        );
        policies.insert(
            Op::UpdateAll,
            OpPolicy::new(IndexAction::AddAll, CacheAction::PutAll),
        );
        policies.insert(
            Op::DeleteAll,
            OpPolicy::new(IndexAction::RemoveAll, CacheAction::DeleteAll),
        );
        Self { policies }
    }

    /// An empty table. Every operation passes straight through.
    pub fn pass_through() -> Self {
        Self {
            policies: HashMap::new(),
        }
    }

    /// Replace the policy for one operation.
    pub fn with_policy(mut self, op: Op, policy: OpPolicy) -> Self {
        self.policies.insert(op, policy);
        self
    }

    /// Policy for an operation, `PASS_THROUGH` when the table has no entry.
    pub fn policy_for(&self, op: Op) -> OpPolicy {
        self.policies
            .get(&op)
            .copied()
            .unwrap_or(OpPolicy::PASS_THROUGH)
    }

    pub fn is_pass_through(&self, op: Op) -> bool {
        self.policy_for(op).is_pass_through()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::standard()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_mapping() {
        let table = PolicyTable::standard();
        let cases = [
            (Op::Create, IndexAction::Add, CacheAction::Put),
            (Op::Read, IndexAction::None, CacheAction::Get),
            (Op::Update, IndexAction::Add, CacheAction::Put),
            (Op::Delete, IndexAction::Remove, CacheAction::Delete),
            (Op::CreateAll, IndexAction::AddAll, CacheAction::PutAll),
            (Op::ReadAll, IndexAction::None, CacheAction::GetAll),
            (Op::UpdateAll, IndexAction::AddAll, CacheAction::PutAll),
            (Op::DeleteAll, IndexAction::RemoveAll, CacheAction::DeleteAll),
        ];
        for (op, index, cache) in cases {
            let policy = table.policy_for(op);
            assert_eq!(policy.index, index, "{op:?}");
            assert_eq!(policy.cache, cache, "{op:?}");
        }
        assert_eq!(table.len(), 8);
    }

    #[test]
    fn test_missing_entry_is_pass_through() {
        let table = PolicyTable::pass_through();
        assert!(table.is_empty());
        assert_eq!(table.policy_for(Op::Create), OpPolicy::PASS_THROUGH);
        assert!(table.is_pass_through(Op::Read));
    }

    #[test]
    fn test_with_policy_overrides() {
        let table = PolicyTable::standard().with_policy(
            Op::Create,
            OpPolicy::new(IndexAction::None, CacheAction::Put),
        );
        let policy = table.policy_for(Op::Create);
        assert_eq!(policy.index, IndexAction::None);
        assert_eq!(policy.cache, CacheAction::Put);
        // Other entries untouched.
        assert_eq!(table.policy_for(Op::Delete).index, IndexAction::Remove);
    }

    #[test]
    fn test_default_is_standard() {
        assert_eq!(PolicyTable::default(), PolicyTable::standard());
    }

    #[test]
    fn test_is_batch() {
        assert!(!Op::Create.is_batch());
        assert!(!Op::Delete.is_batch());
        assert!(Op::CreateAll.is_batch());
        assert!(Op::ReadAll.is_batch());
    }

    #[test]
    fn test_table_serde_round_trip() {
        let table = PolicyTable::standard()
            .with_policy(Op::Read, OpPolicy::PASS_THROUGH);
        let json = serde_json::to_string(&table).unwrap();
        let back: PolicyTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}

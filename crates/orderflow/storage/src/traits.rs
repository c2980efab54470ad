use crate::StorageResult;
use async_trait::async_trait;
use orderflow_types::{
    CustomStatus, HistoryAppend, NewRule, NewStatus, RulePatch, StatusHistoryEntry, StatusPatch,
    TimelineEntry, TriggerType, WorkflowRule,
};

/// Storage interface for custom status definitions.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Insert a new status. Fails with `Conflict` when the slug exists.
    async fn create_status(&self, new: NewStatus) -> StorageResult<CustomStatus>;

    /// Partial update; unspecified fields retain their previous value.
    /// The slug is immutable and not part of the patch.
    async fn update_status(&self, id: i64, patch: StatusPatch) -> StorageResult<CustomStatus>;

    /// Remove the row. Callers are responsible for reassigning orders first.
    async fn delete_status(&self, id: i64) -> StorageResult<()>;

    async fn get_status(&self, id: i64) -> StorageResult<Option<CustomStatus>>;

    async fn get_status_by_slug(&self, slug: &str) -> StorageResult<Option<CustomStatus>>;

    /// All statuses ordered by `workflow_order` ascending (ties by id).
    /// A fresh query per call; callers tolerate a full read.
    async fn list_statuses(&self) -> StorageResult<Vec<CustomStatus>>;
}

/// Storage interface for workflow rules.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Insert a new rule. Fails with `Conflict` when the `(from, to)` pair exists.
    async fn create_rule(&self, new: NewRule) -> StorageResult<WorkflowRule>;

    /// Partial update; unspecified fields retain their previous value.
    async fn update_rule(&self, id: i64, patch: RulePatch) -> StorageResult<WorkflowRule>;

    async fn delete_rule(&self, id: i64) -> StorageResult<()>;

    async fn get_rule(&self, id: i64) -> StorageResult<Option<WorkflowRule>>;

    /// All rules in insertion (id) order.
    async fn list_rules(&self) -> StorageResult<Vec<WorkflowRule>>;

    /// Rules with the given trigger type, insertion order.
    async fn list_rules_by_trigger(&self, trigger: TriggerType)
        -> StorageResult<Vec<WorkflowRule>>;

    /// Distinct custom statuses reachable from `current_bare` via any rule
    /// whose `from_status` equals it or is the wildcard, ordered by
    /// `workflow_order` (ties by id).
    async fn next_possible_statuses(&self, current_bare: &str)
        -> StorageResult<Vec<CustomStatus>>;
}

/// Storage interface for the append-only status history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Pure insert: no dedup, no merge, never rejected. Repeated identical
    /// transitions are logged again.
    async fn append_history(&self, entry: HistoryAppend) -> StorageResult<StatusHistoryEntry>;

    /// An order's transitions ascending by `created_at`, LEFT-joined with
    /// custom-status display metadata.
    async fn timeline(&self, order_id: i64) -> StorageResult<Vec<TimelineEntry>>;
}

/// Unified storage bundle used by the engine and service surfaces.
pub trait OrderflowStore: StatusStore + RuleStore + HistoryStore + Send + Sync {}

impl<T> OrderflowStore for T where T: StatusStore + RuleStore + HistoryStore + Send + Sync {}

//! In-memory reference implementation for the orderflow storage traits.
//!
//! Deterministic and test-friendly. Production deployments should use the
//! PostgreSQL adapter for source-of-truth data.

use crate::traits::{HistoryStore, RuleStore, StatusStore};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::Utc;
use orderflow_types::{
    CustomStatus, HistoryAppend, NewRule, NewStatus, RulePatch, StatusHistoryEntry, StatusPatch,
    TimelineEntry, TriggerType, WorkflowRule,
};
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
struct Inner {
    statuses: HashMap<i64, CustomStatus>,
    rules: HashMap<i64, WorkflowRule>,
    history: Vec<StatusHistoryEntry>,
    next_status_id: i64,
    next_rule_id: i64,
    next_history_id: i64,
}

/// In-memory orderflow storage adapter.
#[derive(Default)]
pub struct InMemoryOrderflowStore {
    inner: RwLock<Inner>,
}

impl InMemoryOrderflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| StorageError::Backend("store lock poisoned".to_string()))
    }

    fn write(&self) -> StorageResult<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| StorageError::Backend("store lock poisoned".to_string()))
    }
}

fn sort_by_workflow_order(statuses: &mut [CustomStatus]) {
    statuses.sort_by(|a, b| {
        a.workflow_order
            .cmp(&b.workflow_order)
            .then(a.id.cmp(&b.id))
    });
}

#[async_trait]
impl StatusStore for InMemoryOrderflowStore {
    async fn create_status(&self, new: NewStatus) -> StorageResult<CustomStatus> {
        let mut guard = self.write()?;

        if guard.statuses.values().any(|s| s.slug == new.slug) {
            return Err(StorageError::Conflict(format!(
                "status slug '{}' already exists",
                new.slug
            )));
        }

        guard.next_status_id += 1;
        let now = Utc::now();
        let status = CustomStatus {
            id: guard.next_status_id,
            name: new.name,
            slug: new.slug,
            color: new.color,
            icon: new.icon,
            visibility: new.visibility,
            workflow_order: new.workflow_order,
            email_template: new.email_template,
            created_at: now,
            updated_at: now,
        };
        guard.statuses.insert(status.id, status.clone());
        Ok(status)
    }

    async fn update_status(&self, id: i64, patch: StatusPatch) -> StorageResult<CustomStatus> {
        let mut guard = self.write()?;
        let status = guard
            .statuses
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("status {id} not found")))?;

        if let Some(name) = patch.name {
            status.name = name;
        }
        if let Some(color) = patch.color {
            status.color = color;
        }
        if let Some(icon) = patch.icon {
            status.icon = icon;
        }
        if let Some(visibility) = patch.visibility {
            status.visibility = visibility;
        }
        if let Some(order) = patch.workflow_order {
            status.workflow_order = order;
        }
        if let Some(template) = patch.email_template {
            status.email_template = template;
        }
        status.updated_at = Utc::now();
        Ok(status.clone())
    }

    async fn delete_status(&self, id: i64) -> StorageResult<()> {
        let mut guard = self.write()?;
        guard
            .statuses
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(format!("status {id} not found")))
    }

    async fn get_status(&self, id: i64) -> StorageResult<Option<CustomStatus>> {
        Ok(self.read()?.statuses.get(&id).cloned())
    }

    async fn get_status_by_slug(&self, slug: &str) -> StorageResult<Option<CustomStatus>> {
        Ok(self
            .read()?
            .statuses
            .values()
            .find(|s| s.slug == slug)
            .cloned())
    }

    async fn list_statuses(&self) -> StorageResult<Vec<CustomStatus>> {
        let mut statuses: Vec<_> = self.read()?.statuses.values().cloned().collect();
        sort_by_workflow_order(&mut statuses);
        Ok(statuses)
    }
}

#[async_trait]
impl RuleStore for InMemoryOrderflowStore {
    async fn create_rule(&self, new: NewRule) -> StorageResult<WorkflowRule> {
        let mut guard = self.write()?;

        if guard
            .rules
            .values()
            .any(|r| r.from_status == new.from_status && r.to_status == new.to_status)
        {
            return Err(StorageError::Conflict(format!(
                "rule for {} -> {} already exists",
                new.from_status, new.to_status
            )));
        }

        guard.next_rule_id += 1;
        let rule = WorkflowRule {
            id: guard.next_rule_id,
            from_status: new.from_status,
            to_status: new.to_status,
            trigger_type: new.trigger_type,
            trigger_condition: new.trigger_condition,
            email_notification: new.email_notification,
            email_template: new.email_template,
            created_at: Utc::now(),
        };
        guard.rules.insert(rule.id, rule.clone());
        Ok(rule)
    }

    async fn update_rule(&self, id: i64, patch: RulePatch) -> StorageResult<WorkflowRule> {
        let mut guard = self.write()?;

        let current = guard
            .rules
            .get(&id)
            .ok_or_else(|| StorageError::NotFound(format!("rule {id} not found")))?;

        let from = patch
            .from_status
            .clone()
            .unwrap_or_else(|| current.from_status.clone());
        let to = patch
            .to_status
            .clone()
            .unwrap_or_else(|| current.to_status.clone());
        if guard
            .rules
            .values()
            .any(|r| r.id != id && r.from_status == from && r.to_status == to)
        {
            return Err(StorageError::Conflict(format!(
                "rule for {from} -> {to} already exists"
            )));
        }

        let rule = guard.rules.get_mut(&id).ok_or_else(|| {
            StorageError::NotFound(format!("rule {id} not found"))
        })?;
        rule.from_status = from;
        rule.to_status = to;
        if let Some(trigger) = patch.trigger_type {
            rule.trigger_type = trigger;
        }
        if let Some(condition) = patch.trigger_condition {
            rule.trigger_condition = condition;
        }
        if let Some(notify) = patch.email_notification {
            rule.email_notification = notify;
        }
        if let Some(template) = patch.email_template {
            rule.email_template = template;
        }
        Ok(rule.clone())
    }

    async fn delete_rule(&self, id: i64) -> StorageResult<()> {
        let mut guard = self.write()?;
        guard
            .rules
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(format!("rule {id} not found")))
    }

    async fn get_rule(&self, id: i64) -> StorageResult<Option<WorkflowRule>> {
        Ok(self.read()?.rules.get(&id).cloned())
    }

    async fn list_rules(&self) -> StorageResult<Vec<WorkflowRule>> {
        let mut rules: Vec<_> = self.read()?.rules.values().cloned().collect();
        rules.sort_by_key(|r| r.id);
        Ok(rules)
    }

    async fn list_rules_by_trigger(
        &self,
        trigger: TriggerType,
    ) -> StorageResult<Vec<WorkflowRule>> {
        let mut rules: Vec<_> = self
            .read()?
            .rules
            .values()
            .filter(|r| r.trigger_type == trigger)
            .cloned()
            .collect();
        rules.sort_by_key(|r| r.id);
        Ok(rules)
    }

    async fn next_possible_statuses(
        &self,
        current_bare: &str,
    ) -> StorageResult<Vec<CustomStatus>> {
        let guard = self.read()?;
        let mut statuses: Vec<CustomStatus> = Vec::new();
        for rule in guard.rules.values() {
            if rule.from_status != current_bare && rule.from_status != orderflow_types::WILDCARD_FROM
            {
                continue;
            }
            if let Some(status) = guard.statuses.values().find(|s| s.slug == rule.to_status) {
                if !statuses.iter().any(|s| s.id == status.id) {
                    statuses.push(status.clone());
                }
            }
        }
        sort_by_workflow_order(&mut statuses);
        Ok(statuses)
    }
}

#[async_trait]
impl HistoryStore for InMemoryOrderflowStore {
    async fn append_history(&self, entry: HistoryAppend) -> StorageResult<StatusHistoryEntry> {
        let mut guard = self.write()?;
        guard.next_history_id += 1;
        let record = StatusHistoryEntry {
            id: guard.next_history_id,
            order_id: entry.order_id,
            from_status: entry.from_status,
            to_status: entry.to_status,
            changed_by: entry.changed_by,
            change_reason: entry.change_reason,
            created_at: entry.created_at,
        };
        guard.history.push(record.clone());
        Ok(record)
    }

    async fn timeline(&self, order_id: i64) -> StorageResult<Vec<TimelineEntry>> {
        let guard = self.read()?;
        let mut entries: Vec<_> = guard
            .history
            .iter()
            .filter(|e| e.order_id == order_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(entries
            .into_iter()
            .map(|entry| {
                let status = guard.statuses.values().find(|s| s.slug == entry.to_status);
                TimelineEntry {
                    status_name: status.map(|s| s.name.clone()),
                    status_color: status.map(|s| s.color.clone()),
                    status_icon: status.map(|s| s.icon.clone()),
                    status_visibility: status.map(|s| s.visibility),
                    entry,
                }
            })
            .collect())
    }
}

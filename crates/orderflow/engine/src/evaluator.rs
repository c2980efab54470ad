//! The workflow evaluator: matches status transitions against stored rules
//! and runs the side effects of every rule whose trigger is satisfied.

use crate::error::{EngineResult, GatewayError};
use crate::events::WorkflowEvent;
use crate::gateway::OrderGateway;
use chrono::Utc;
use orderflow_notify::Notifier;
use orderflow_storage::{HistoryStore, OrderflowStore, RuleStore, StatusStore};
use orderflow_types::{
    bare_status, prefixed_status, CustomStatus, HistoryAppend, OrderSnapshot, TimelineEntry,
    TriggerType, WorkflowRule,
};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Stock quantity at or below which a product counts as low stock.
const LOW_STOCK_THRESHOLD: i32 = 5;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Coordinates transition evaluation over injected collaborators.
///
/// Holds no evaluation state of its own: rules are re-read from the store on
/// every invocation, so a rule created mid-flight applies to the next
/// transition.
pub struct WorkflowEngine {
    store: Arc<dyn OrderflowStore>,
    orders: Arc<dyn OrderGateway>,
    notifier: Arc<dyn Notifier>,
    notifications_enabled: bool,
    events: broadcast::Sender<WorkflowEvent>,
}

impl WorkflowEngine {
    pub fn new(
        store: Arc<dyn OrderflowStore>,
        orders: Arc<dyn OrderGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            orders,
            notifier,
            notifications_enabled: true,
            events,
        }
    }

    /// Disable or enable customer notifications globally. Rule matching and
    /// history logging are unaffected.
    pub fn with_notifications_enabled(mut self, enabled: bool) -> Self {
        self.notifications_enabled = enabled;
        self
    }

    /// Subscribe to workflow events.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub fn orders(&self) -> &Arc<dyn OrderGateway> {
        &self.orders
    }

    pub fn store(&self) -> &Arc<dyn OrderflowStore> {
        &self.store
    }

    fn emit(&self, event: WorkflowEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    // ── Transition-triggered evaluation ──────────────────────────────

    /// React to an order status transition raised by the platform.
    ///
    /// The transition is recorded in the history log once, before any rule
    /// matching and regardless of its outcome. Status keys may arrive with
    /// the platform prefix; comparison always uses bare slugs.
    pub async fn on_status_changed(
        &self,
        order_id: i64,
        old_status: &str,
        new_status: &str,
        changed_by: Option<i64>,
        reason: &str,
    ) -> EngineResult<()> {
        let old_bare = bare_status(old_status).to_string();
        let new_bare = bare_status(new_status).to_string();

        let from = if old_bare.is_empty() {
            None
        } else {
            Some(old_bare.clone())
        };
        self.store
            .append_history(HistoryAppend::now(
                order_id,
                from.clone(),
                new_bare.clone(),
                changed_by,
                reason,
            ))
            .await?;

        self.emit(WorkflowEvent::StatusChanged {
            order_id,
            from_status: from,
            to_status: new_bare.clone(),
            at: Utc::now(),
        });

        let rules = self.store.list_rules().await?;
        for rule in &rules {
            if !rule.matches(&old_bare, &new_bare) {
                continue;
            }
            if self.trigger_satisfied(order_id, rule).await {
                self.execute_rule(order_id, rule).await;
            }
        }

        self.maybe_send_status_notification(order_id, &new_bare).await;

        Ok(())
    }

    /// Operator-driven status change: writes the new status key through the
    /// gateway, then runs the transition evaluation with the previous key.
    pub async fn change_status(
        &self,
        order_id: i64,
        new_slug: &str,
        changed_by: Option<i64>,
        reason: &str,
    ) -> EngineResult<()> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(GatewayError::OrderNotFound(order_id))?;

        let old_status = order.status.clone();
        let new_key = prefixed_status(new_slug);
        self.orders.set_status(order_id, &new_key).await?;

        self.on_status_changed(order_id, &old_status, &new_key, changed_by, reason)
            .await
    }

    // ── Independent trigger entry points ─────────────────────────────

    /// Payment completion: every `payment`-trigger rule executes, with no
    /// re-check of the rule's from/to against the order's recorded statuses.
    /// That asymmetry with the transition path is deliberate.
    pub async fn on_payment_complete(&self, order_id: i64) -> EngineResult<()> {
        let rules = self.store.list_rules_by_trigger(TriggerType::Payment).await?;
        for rule in &rules {
            self.execute_rule(order_id, rule).await;
        }
        Ok(())
    }

    /// Order entered processing: `automatic`-trigger rules whose origin is
    /// literally `pending` execute.
    pub async fn on_order_processing(&self, order_id: i64) -> EngineResult<()> {
        let rules = self
            .store
            .list_rules_by_trigger(TriggerType::Automatic)
            .await?;
        for rule in &rules {
            if rule.from_status == "pending" {
                self.execute_rule(order_id, rule).await;
            }
        }
        Ok(())
    }

    /// Stock reduced for an order: `stock`-trigger rules whose condition
    /// currently holds execute.
    pub async fn on_stock_reduction(&self, order_id: i64) -> EngineResult<()> {
        let rules = self.store.list_rules_by_trigger(TriggerType::Stock).await?;
        for rule in &rules {
            if self.check_stock_condition(order_id, &rule.trigger_condition).await {
                self.execute_rule(order_id, rule).await;
            }
        }
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Distinct statuses reachable from the given (possibly prefixed)
    /// status via any stored rule, ordered by workflow position.
    pub async fn next_possible_statuses(
        &self,
        current_status: &str,
    ) -> EngineResult<Vec<CustomStatus>> {
        Ok(self
            .store
            .next_possible_statuses(bare_status(current_status))
            .await?)
    }

    /// An order's transition timeline joined with display metadata.
    pub async fn timeline(&self, order_id: i64) -> EngineResult<Vec<TimelineEntry>> {
        Ok(self.store.timeline(order_id).await?)
    }

    // ── Rule execution ───────────────────────────────────────────────

    /// Whether a matched rule's trigger condition holds. Anything the
    /// condition cannot establish (a missing order, an unknown condition
    /// string, a gateway failure) means the rule does not fire.
    async fn trigger_satisfied(&self, order_id: i64, rule: &WorkflowRule) -> bool {
        match rule.trigger_type {
            TriggerType::Automatic => true,
            TriggerType::Payment => match self.orders.get(order_id).await {
                Ok(Some(order)) => order.is_paid(),
                _ => false,
            },
            TriggerType::Stock => {
                self.check_stock_condition(order_id, &rule.trigger_condition)
                    .await
            }
            // Manual rules only run through direct operator action.
            TriggerType::Manual => false,
        }
    }

    async fn check_stock_condition(&self, order_id: i64, condition: &str) -> bool {
        let order = match self.orders.get(order_id).await {
            Ok(Some(order)) => order,
            _ => return false,
        };
        match condition {
            "in_stock" => order
                .items
                .iter()
                .filter_map(|item| item.product.as_ref())
                .all(|product| product.in_stock),
            "low_stock" => order.items.iter().any(|item| {
                item.product.as_ref().is_some_and(|product| {
                    product.in_stock
                        && product.stock_quantity.unwrap_or(0) <= LOW_STOCK_THRESHOLD
                })
            }),
            _ => false,
        }
    }

    /// Run a satisfied rule's side effects. Nothing here surfaces an error:
    /// a vanished order skips the rule, and notifier failures are logged
    /// and dropped.
    async fn execute_rule(&self, order_id: i64, rule: &WorkflowRule) {
        let order = match self.orders.get(order_id).await {
            Ok(Some(order)) => order,
            _ => return,
        };

        let note = format!(
            "Workflow rule triggered: {} -> {}",
            rule.from_status, rule.to_status
        );
        if let Err(err) = self.orders.add_note(order_id, &note).await {
            tracing::warn!(order_id, rule_id = rule.id, %err, "failed to add order note");
        }

        if self.notifications_enabled && rule.email_notification && rule.has_email_template() {
            self.dispatch_rule_notification(&order, rule).await;
        }

        self.emit(WorkflowEvent::RuleExecuted {
            order_id,
            rule_id: rule.id,
            from_status: rule.from_status.clone(),
            to_status: rule.to_status.clone(),
            at: Utc::now(),
        });

        tracing::info!(
            order_id,
            rule_id = rule.id,
            from = %rule.from_status,
            to = %rule.to_status,
            "workflow rule executed"
        );
    }

    async fn dispatch_rule_notification(&self, order: &OrderSnapshot, rule: &WorkflowRule) {
        match self.notifier.send_rule_notification(order, rule).await {
            Ok(()) => {
                let note = format!(
                    "Workflow notification email sent to {}",
                    order.billing_email
                );
                let _ = self.orders.add_note(order.id, &note).await;
                self.emit(WorkflowEvent::NotificationSent {
                    order_id: order.id,
                    recipient: order.billing_email.clone(),
                    at: Utc::now(),
                });
            }
            Err(err) => {
                tracing::warn!(order_id = order.id, rule_id = rule.id, %err,
                    "workflow notification failed");
            }
        }
    }

    /// Status-level notification: when the destination status resolves in
    /// the catalog and carries a template, the customer is notified even if
    /// no rule matched the transition.
    async fn maybe_send_status_notification(&self, order_id: i64, new_bare: &str) {
        if !self.notifications_enabled {
            return;
        }
        let status = match self.store.get_status_by_slug(new_bare).await {
            Ok(Some(status)) if status.has_email_template() => status,
            _ => return,
        };
        let order = match self.orders.get(order_id).await {
            Ok(Some(order)) => order,
            _ => return,
        };

        match self.notifier.send_status_notification(&order, &status).await {
            Ok(()) => {
                let note = format!(
                    "Status notification email sent to {}",
                    order.billing_email
                );
                let _ = self.orders.add_note(order_id, &note).await;
                self.emit(WorkflowEvent::NotificationSent {
                    order_id,
                    recipient: order.billing_email,
                    at: Utc::now(),
                });
            }
            Err(err) => {
                tracing::warn!(order_id, status = %status.slug, %err,
                    "status notification failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryOrderGateway;
    use orderflow_notify::RecordingNotifier;
    use orderflow_storage::{InMemoryOrderflowStore, RuleStore, StatusStore};
    use orderflow_types::{NewRule, NewStatus, OrderLineItem, ProductStock};

    struct Fixture {
        store: Arc<InMemoryOrderflowStore>,
        orders: Arc<MemoryOrderGateway>,
        notifier: Arc<RecordingNotifier>,
        engine: WorkflowEngine,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryOrderflowStore::new());
        let orders = Arc::new(MemoryOrderGateway::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let engine = WorkflowEngine::new(store.clone(), orders.clone(), notifier.clone());
        Fixture {
            store,
            orders,
            notifier,
            engine,
        }
    }

    fn item(in_stock: bool, quantity: Option<i32>) -> OrderLineItem {
        OrderLineItem {
            name: "Widget".to_string(),
            quantity: 1,
            product: Some(ProductStock {
                in_stock,
                stock_quantity: quantity,
            }),
        }
    }

    #[tokio::test]
    async fn test_matching_rule_produces_one_history_entry_and_one_execution() {
        let f = fixture();
        f.orders.seed_order(42, "shop-processing", true);
        f.store
            .create_rule(
                NewRule::new("processing", "packed").with_trigger(TriggerType::Automatic),
            )
            .await
            .unwrap();

        f.engine
            .on_status_changed(42, "shop-processing", "shop-packed", None, "test")
            .await
            .unwrap();

        let timeline = f.engine.timeline(42).await.unwrap();
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].entry.from_status.as_deref(), Some("processing"));
        assert_eq!(timeline[0].entry.to_status, "packed");

        let notes = f.orders.notes_for(42);
        assert_eq!(notes, vec!["Workflow rule triggered: processing -> packed"]);
        // No template on the rule: no email.
        assert_eq!(f.notifier.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_no_matching_rule_still_records_history() {
        let f = fixture();
        f.orders.seed_order(42, "shop-processing", true);
        f.store
            .create_rule(NewRule::new("pending", "packed").with_trigger(TriggerType::Automatic))
            .await
            .unwrap();

        f.engine
            .on_status_changed(42, "shop-processing", "shop-shipped", None, "test")
            .await
            .unwrap();

        assert_eq!(f.engine.timeline(42).await.unwrap().len(), 1);
        assert!(f.orders.notes_for(42).is_empty());
        assert_eq!(f.notifier.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_wildcard_rule_matches_any_origin() {
        let f = fixture();
        f.orders.seed_order(1, "shop-on-hold", false);
        f.store
            .create_rule(NewRule::new("*", "packed").with_trigger(TriggerType::Automatic))
            .await
            .unwrap();

        f.engine
            .on_status_changed(1, "shop-on-hold", "shop-packed", None, "")
            .await
            .unwrap();

        assert_eq!(f.orders.notes_for(1).len(), 1);
    }

    #[tokio::test]
    async fn test_manual_rule_never_fires_from_transition_path() {
        let f = fixture();
        f.orders.seed_order(1, "shop-processing", true);
        f.store
            .create_rule(NewRule::new("processing", "packed").with_trigger(TriggerType::Manual))
            .await
            .unwrap();

        f.engine
            .on_status_changed(1, "shop-processing", "shop-packed", None, "")
            .await
            .unwrap();

        assert!(f.orders.notes_for(1).is_empty());
    }

    #[tokio::test]
    async fn test_payment_trigger_checks_order_paid() {
        let f = fixture();
        f.orders.seed_order(1, "shop-pending", false);
        f.orders.seed_order(2, "shop-pending", true);
        f.store
            .create_rule(NewRule::new("pending", "processing").with_trigger(TriggerType::Payment))
            .await
            .unwrap();

        f.engine
            .on_status_changed(1, "shop-pending", "shop-processing", None, "")
            .await
            .unwrap();
        assert!(f.orders.notes_for(1).is_empty());

        f.engine
            .on_status_changed(2, "shop-pending", "shop-processing", None, "")
            .await
            .unwrap();
        assert_eq!(f.orders.notes_for(2).len(), 1);
    }

    #[tokio::test]
    async fn test_rule_with_template_sends_notification_and_logs_note() {
        let f = fixture();
        f.orders.seed_order(7, "shop-processing", true);
        f.store
            .create_rule(
                NewRule::new("processing", "packed")
                    .with_trigger(TriggerType::Automatic)
                    .with_notification("<p>Hi {customer_name}</p>"),
            )
            .await
            .unwrap();

        f.engine
            .on_status_changed(7, "shop-processing", "shop-packed", None, "")
            .await
            .unwrap();

        assert_eq!(f.notifier.sent_count(), 1);
        let sent = f.notifier.sent();
        assert_eq!(sent[0].to, "customer7@example.com");
        let notes = f.orders.notes_for(7);
        assert_eq!(notes.len(), 2);
        assert!(notes[1].starts_with("Workflow notification email sent to"));
    }

    #[tokio::test]
    async fn test_notifications_disabled_suppresses_email_but_not_rule() {
        let f = fixture();
        let engine = WorkflowEngine::new(
            f.store.clone(),
            f.orders.clone(),
            f.notifier.clone(),
        )
        .with_notifications_enabled(false);

        f.orders.seed_order(7, "shop-processing", true);
        f.store
            .create_rule(
                NewRule::new("processing", "packed")
                    .with_trigger(TriggerType::Automatic)
                    .with_notification("<p>Hi</p>"),
            )
            .await
            .unwrap();

        engine
            .on_status_changed(7, "shop-processing", "shop-packed", None, "")
            .await
            .unwrap();

        assert_eq!(f.notifier.sent_count(), 0);
        assert_eq!(f.orders.notes_for(7).len(), 1);
    }

    #[tokio::test]
    async fn test_status_level_notification_without_any_rule() {
        let f = fixture();
        f.orders.seed_order(3, "shop-processing", true);
        f.store
            .create_status(
                NewStatus::new("Packed", "packed").with_email_template("<p>Packed!</p>"),
            )
            .await
            .unwrap();

        f.engine
            .on_status_changed(3, "shop-processing", "shop-packed", None, "")
            .await
            .unwrap();

        assert_eq!(f.notifier.sent_count(), 1);
        assert!(f.notifier.sent()[0].subject.contains("Status Update: Packed"));
    }

    #[tokio::test]
    async fn test_payment_complete_fires_all_payment_rules_unconditionally() {
        let f = fixture();
        // Order is unpaid and its statuses match no rule; the payment-complete
        // path must still execute every payment rule.
        f.orders.seed_order(5, "shop-on-hold", false);
        f.store
            .create_rule(NewRule::new("pending", "processing").with_trigger(TriggerType::Payment))
            .await
            .unwrap();
        f.store
            .create_rule(NewRule::new("processing", "packed").with_trigger(TriggerType::Payment))
            .await
            .unwrap();
        f.store
            .create_rule(NewRule::new("*", "completed").with_trigger(TriggerType::Automatic))
            .await
            .unwrap();

        f.engine.on_payment_complete(5).await.unwrap();

        let notes = f.orders.notes_for(5);
        assert_eq!(notes.len(), 2);
        assert!(notes[0].contains("pending -> processing"));
        assert!(notes[1].contains("processing -> packed"));
        // No history entry: the payment path is not a transition.
        assert!(f.engine.timeline(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_order_processing_runs_automatic_rules_from_pending_only() {
        let f = fixture();
        f.orders.seed_order(6, "shop-processing", true);
        f.store
            .create_rule(NewRule::new("pending", "packed").with_trigger(TriggerType::Automatic))
            .await
            .unwrap();
        f.store
            .create_rule(NewRule::new("on-hold", "packed").with_trigger(TriggerType::Automatic))
            .await
            .unwrap();

        f.engine.on_order_processing(6).await.unwrap();

        let notes = f.orders.notes_for(6);
        assert_eq!(notes.len(), 1);
        assert!(notes[0].contains("pending -> packed"));
    }

    #[tokio::test]
    async fn test_low_stock_boundary() {
        let f = fixture();
        f.orders.seed_order(1, "shop-processing", true);
        f.store
            .create_rule(
                NewRule::new("*", "backordered")
                    .with_trigger(TriggerType::Stock)
                    .with_condition("low_stock"),
            )
            .await
            .unwrap();

        // Quantity 5: fires.
        f.orders.set_items(1, vec![item(true, Some(5))]);
        f.engine.on_stock_reduction(1).await.unwrap();
        assert_eq!(f.orders.notes_for(1).len(), 1);

        // Quantity 6: does not fire.
        f.orders.set_items(1, vec![item(true, Some(6))]);
        f.engine.on_stock_reduction(1).await.unwrap();
        assert_eq!(f.orders.notes_for(1).len(), 1);

        // Out of stock: does not fire.
        f.orders.set_items(1, vec![item(false, Some(2))]);
        f.engine.on_stock_reduction(1).await.unwrap();
        assert_eq!(f.orders.notes_for(1).len(), 1);
    }

    #[tokio::test]
    async fn test_in_stock_condition_ignores_unresolvable_products() {
        let f = fixture();
        f.orders.seed_order(1, "shop-processing", true);
        f.store
            .create_rule(
                NewRule::new("*", "ready")
                    .with_trigger(TriggerType::Stock)
                    .with_condition("in_stock"),
            )
            .await
            .unwrap();

        // One resolvable in-stock product, one unresolvable: condition holds.
        f.orders.set_items(
            1,
            vec![
                item(true, Some(10)),
                OrderLineItem {
                    name: "Ghost".to_string(),
                    quantity: 1,
                    product: None,
                },
            ],
        );
        f.engine.on_stock_reduction(1).await.unwrap();
        assert_eq!(f.orders.notes_for(1).len(), 1);

        // Any resolvable out-of-stock product breaks it.
        f.orders.set_items(1, vec![item(true, Some(10)), item(false, None)]);
        f.engine.on_stock_reduction(1).await.unwrap();
        assert_eq!(f.orders.notes_for(1).len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_stock_condition_never_fires() {
        let f = fixture();
        f.orders.seed_order(1, "shop-processing", true);
        f.orders.set_items(1, vec![item(true, Some(1))]);
        f.store
            .create_rule(
                NewRule::new("*", "ready")
                    .with_trigger(TriggerType::Stock)
                    .with_condition("phase-of-moon"),
            )
            .await
            .unwrap();

        f.engine.on_stock_reduction(1).await.unwrap();
        assert!(f.orders.notes_for(1).is_empty());
    }

    #[tokio::test]
    async fn test_missing_order_is_silent() {
        let f = fixture();
        f.store
            .create_rule(NewRule::new("*", "packed").with_trigger(TriggerType::Automatic))
            .await
            .unwrap();

        // No order 99 anywhere. History is still recorded; rule execution
        // silently skips.
        f.engine
            .on_status_changed(99, "shop-processing", "shop-packed", None, "")
            .await
            .unwrap();
        assert_eq!(f.engine.timeline(99).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_change_status_writes_gateway_and_evaluates() {
        let f = fixture();
        f.orders.seed_order(8, "shop-processing", true);
        f.store
            .create_rule(NewRule::new("processing", "packed").with_trigger(TriggerType::Automatic))
            .await
            .unwrap();

        f.engine
            .change_status(8, "packed", Some(1), "Status changed via admin")
            .await
            .unwrap();

        let order = f.orders.get(8).await.unwrap().unwrap();
        assert_eq!(order.status, "shop-packed");

        let timeline = f.engine.timeline(8).await.unwrap();
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].entry.changed_by, Some(1));
        assert_eq!(timeline[0].entry.change_reason, "Status changed via admin");
        assert_eq!(f.orders.notes_for(8).len(), 1);
    }

    #[tokio::test]
    async fn test_change_status_unknown_order_errors() {
        let f = fixture();
        let err = f.engine.change_status(404, "packed", None, "").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_events_emitted_for_rule_execution() {
        let f = fixture();
        let mut events = f.engine.subscribe();
        f.orders.seed_order(1, "shop-processing", true);
        f.store
            .create_rule(NewRule::new("processing", "packed").with_trigger(TriggerType::Automatic))
            .await
            .unwrap();

        f.engine
            .on_status_changed(1, "shop-processing", "shop-packed", None, "")
            .await
            .unwrap();

        let first = events.try_recv().unwrap();
        assert!(matches!(first, WorkflowEvent::StatusChanged { order_id: 1, .. }));
        let second = events.try_recv().unwrap();
        assert!(matches!(
            second,
            WorkflowEvent::RuleExecuted {
                order_id: 1,
                from_status,
                ..
            } if from_status == "processing"
        ));
    }
}

//! PostgreSQL adapter for orderflow storage.
//!
//! The transactional source-of-truth backend. Schema is initialized on
//! connect; uniqueness (status slug, rule `(from, to)` pair) is enforced by
//! database constraints and surfaced as `StorageError::Conflict`.

use crate::traits::{HistoryStore, RuleStore, StatusStore};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::Utc;
use orderflow_types::{
    CustomStatus, HistoryAppend, NewRule, NewStatus, RulePatch, StatusHistoryEntry, StatusPatch,
    StatusVisibility, TimelineEntry, TriggerType, WorkflowRule, WILDCARD_FROM,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

/// PostgreSQL-backed orderflow storage adapter.
#[derive(Clone)]
pub struct PostgresOrderflowStore {
    pool: PgPool,
}

impl PostgresOrderflowStore {
    /// Connect to PostgreSQL and initialize the required schema.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        Self::connect_with_options(database_url, 10, 5).await
    }

    /// Connect with explicit pool parameters.
    pub async fn connect_with_options(
        database_url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(connect_timeout_secs))
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Backend(format!("failed to connect postgres: {e}")))?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create an adapter from an existing pool.
    pub async fn from_pool(pool: PgPool) -> StorageResult<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn init_schema(&self) -> StorageResult<()> {
        let ddl = [
            r#"
            CREATE TABLE IF NOT EXISTS orderflow_custom_statuses (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                color TEXT NOT NULL DEFAULT '#0073aa',
                icon TEXT NOT NULL DEFAULT '',
                visibility TEXT NOT NULL DEFAULT 'both',
                workflow_order INTEGER NOT NULL DEFAULT 0,
                email_template TEXT,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS orderflow_workflow_rules (
                id BIGSERIAL PRIMARY KEY,
                from_status TEXT NOT NULL,
                to_status TEXT NOT NULL,
                trigger_type TEXT NOT NULL DEFAULT 'manual',
                trigger_condition TEXT NOT NULL DEFAULT '',
                email_notification BOOLEAN NOT NULL DEFAULT FALSE,
                email_template TEXT,
                created_at TIMESTAMPTZ NOT NULL,
                UNIQUE (from_status, to_status)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS orderflow_status_history (
                id BIGSERIAL PRIMARY KEY,
                order_id BIGINT NOT NULL,
                from_status TEXT,
                to_status TEXT NOT NULL,
                changed_by BIGINT,
                change_reason TEXT NOT NULL DEFAULT '',
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_orderflow_history_order
                ON orderflow_status_history (order_id)
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_orderflow_history_to_status
                ON orderflow_status_history (to_status)
            "#,
        ];

        for statement in ddl {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Backend(format!("schema init failed: {e}")))?;
        }
        Ok(())
    }
}

fn map_sqlx_err(err: sqlx::Error, what: &str) -> StorageError {
    if let sqlx::Error::Database(db) = &err {
        if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) {
            return StorageError::Conflict(format!("{what} already exists"));
        }
    }
    StorageError::Backend(format!("{what}: {err}"))
}

fn status_from_row(row: &PgRow) -> StorageResult<CustomStatus> {
    let visibility: String = read(row, "visibility")?;
    Ok(CustomStatus {
        id: read(row, "id")?,
        name: read(row, "name")?,
        slug: read(row, "slug")?,
        color: read(row, "color")?,
        icon: read(row, "icon")?,
        visibility: visibility
            .parse::<StatusVisibility>()
            .map_err(|e| StorageError::Serialization(e.to_string()))?,
        workflow_order: read(row, "workflow_order")?,
        email_template: read(row, "email_template")?,
        created_at: read(row, "created_at")?,
        updated_at: read(row, "updated_at")?,
    })
}

fn rule_from_row(row: &PgRow) -> StorageResult<WorkflowRule> {
    let trigger: String = read(row, "trigger_type")?;
    Ok(WorkflowRule {
        id: read(row, "id")?,
        from_status: read(row, "from_status")?,
        to_status: read(row, "to_status")?,
        trigger_type: trigger
            .parse::<TriggerType>()
            .map_err(|e| StorageError::Serialization(e.to_string()))?,
        trigger_condition: read(row, "trigger_condition")?,
        email_notification: read(row, "email_notification")?,
        email_template: read(row, "email_template")?,
        created_at: read(row, "created_at")?,
    })
}

fn history_from_row(row: &PgRow) -> StorageResult<StatusHistoryEntry> {
    Ok(StatusHistoryEntry {
        id: read(row, "id")?,
        order_id: read(row, "order_id")?,
        from_status: read(row, "from_status")?,
        to_status: read(row, "to_status")?,
        changed_by: read(row, "changed_by")?,
        change_reason: read(row, "change_reason")?,
        created_at: read(row, "created_at")?,
    })
}

fn read<'r, T>(row: &'r PgRow, column: &str) -> StorageResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| StorageError::Serialization(format!("column {column}: {e}")))
}

#[async_trait]
impl StatusStore for PostgresOrderflowStore {
    async fn create_status(&self, new: NewStatus) -> StorageResult<CustomStatus> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO orderflow_custom_statuses
                (name, slug, color, icon, visibility, workflow_order, email_template,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.color)
        .bind(&new.icon)
        .bind(new.visibility.as_str())
        .bind(new.workflow_order)
        .bind(&new.email_template)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_err(e, &format!("status slug '{}'", new.slug)))?;
        status_from_row(&row)
    }

    async fn update_status(&self, id: i64, patch: StatusPatch) -> StorageResult<CustomStatus> {
        let current = self
            .get_status(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("status {id} not found")))?;

        let merged = CustomStatus {
            id: current.id,
            slug: current.slug,
            name: patch.name.unwrap_or(current.name),
            color: patch.color.unwrap_or(current.color),
            icon: patch.icon.unwrap_or(current.icon),
            visibility: patch.visibility.unwrap_or(current.visibility),
            workflow_order: patch.workflow_order.unwrap_or(current.workflow_order),
            email_template: patch.email_template.unwrap_or(current.email_template),
            created_at: current.created_at,
            updated_at: Utc::now(),
        };

        sqlx::query(
            r#"
            UPDATE orderflow_custom_statuses
            SET name = $2, color = $3, icon = $4, visibility = $5,
                workflow_order = $6, email_template = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&merged.name)
        .bind(&merged.color)
        .bind(&merged.icon)
        .bind(merged.visibility.as_str())
        .bind(merged.workflow_order)
        .bind(&merged.email_template)
        .bind(merged.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_err(e, "status update"))?;

        Ok(merged)
    }

    async fn delete_status(&self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM orderflow_custom_statuses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_err(e, "status delete"))?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("status {id} not found")));
        }
        Ok(())
    }

    async fn get_status(&self, id: i64) -> StorageResult<Option<CustomStatus>> {
        let row = sqlx::query("SELECT * FROM orderflow_custom_statuses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_err(e, "status fetch"))?;
        row.as_ref().map(status_from_row).transpose()
    }

    async fn get_status_by_slug(&self, slug: &str) -> StorageResult<Option<CustomStatus>> {
        let row = sqlx::query("SELECT * FROM orderflow_custom_statuses WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_err(e, "status fetch"))?;
        row.as_ref().map(status_from_row).transpose()
    }

    async fn list_statuses(&self) -> StorageResult<Vec<CustomStatus>> {
        let rows = sqlx::query(
            "SELECT * FROM orderflow_custom_statuses ORDER BY workflow_order ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_err(e, "status list"))?;
        rows.iter().map(status_from_row).collect()
    }
}

#[async_trait]
impl RuleStore for PostgresOrderflowStore {
    async fn create_rule(&self, new: NewRule) -> StorageResult<WorkflowRule> {
        let row = sqlx::query(
            r#"
            INSERT INTO orderflow_workflow_rules
                (from_status, to_status, trigger_type, trigger_condition,
                 email_notification, email_template, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&new.from_status)
        .bind(&new.to_status)
        .bind(new.trigger_type.as_str())
        .bind(&new.trigger_condition)
        .bind(new.email_notification)
        .bind(&new.email_template)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_sqlx_err(
                e,
                &format!("rule for {} -> {}", new.from_status, new.to_status),
            )
        })?;
        rule_from_row(&row)
    }

    async fn update_rule(&self, id: i64, patch: RulePatch) -> StorageResult<WorkflowRule> {
        let current = self
            .get_rule(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("rule {id} not found")))?;

        let merged = WorkflowRule {
            id: current.id,
            from_status: patch.from_status.unwrap_or(current.from_status),
            to_status: patch.to_status.unwrap_or(current.to_status),
            trigger_type: patch.trigger_type.unwrap_or(current.trigger_type),
            trigger_condition: patch.trigger_condition.unwrap_or(current.trigger_condition),
            email_notification: patch.email_notification.unwrap_or(current.email_notification),
            email_template: patch.email_template.unwrap_or(current.email_template),
            created_at: current.created_at,
        };

        sqlx::query(
            r#"
            UPDATE orderflow_workflow_rules
            SET from_status = $2, to_status = $3, trigger_type = $4,
                trigger_condition = $5, email_notification = $6, email_template = $7
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&merged.from_status)
        .bind(&merged.to_status)
        .bind(merged.trigger_type.as_str())
        .bind(&merged.trigger_condition)
        .bind(merged.email_notification)
        .bind(&merged.email_template)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_sqlx_err(
                e,
                &format!("rule for {} -> {}", merged.from_status, merged.to_status),
            )
        })?;

        Ok(merged)
    }

    async fn delete_rule(&self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM orderflow_workflow_rules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_err(e, "rule delete"))?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("rule {id} not found")));
        }
        Ok(())
    }

    async fn get_rule(&self, id: i64) -> StorageResult<Option<WorkflowRule>> {
        let row = sqlx::query("SELECT * FROM orderflow_workflow_rules WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_err(e, "rule fetch"))?;
        row.as_ref().map(rule_from_row).transpose()
    }

    async fn list_rules(&self) -> StorageResult<Vec<WorkflowRule>> {
        let rows = sqlx::query("SELECT * FROM orderflow_workflow_rules ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_err(e, "rule list"))?;
        rows.iter().map(rule_from_row).collect()
    }

    async fn list_rules_by_trigger(
        &self,
        trigger: TriggerType,
    ) -> StorageResult<Vec<WorkflowRule>> {
        let rows = sqlx::query(
            "SELECT * FROM orderflow_workflow_rules WHERE trigger_type = $1 ORDER BY id ASC",
        )
        .bind(trigger.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_err(e, "rule list"))?;
        rows.iter().map(rule_from_row).collect()
    }

    async fn next_possible_statuses(
        &self,
        current_bare: &str,
    ) -> StorageResult<Vec<CustomStatus>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT s.*
            FROM orderflow_workflow_rules r
            JOIN orderflow_custom_statuses s ON r.to_status = s.slug
            WHERE r.from_status = $1 OR r.from_status = $2
            ORDER BY s.workflow_order ASC, s.id ASC
            "#,
        )
        .bind(current_bare)
        .bind(WILDCARD_FROM)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_err(e, "next statuses"))?;
        rows.iter().map(status_from_row).collect()
    }
}

#[async_trait]
impl HistoryStore for PostgresOrderflowStore {
    async fn append_history(&self, entry: HistoryAppend) -> StorageResult<StatusHistoryEntry> {
        let row = sqlx::query(
            r#"
            INSERT INTO orderflow_status_history
                (order_id, from_status, to_status, changed_by, change_reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(entry.order_id)
        .bind(&entry.from_status)
        .bind(&entry.to_status)
        .bind(entry.changed_by)
        .bind(&entry.change_reason)
        .bind(entry.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_err(e, "history append"))?;
        history_from_row(&row)
    }

    async fn timeline(&self, order_id: i64) -> StorageResult<Vec<TimelineEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT
                h.*,
                s.name AS status_name,
                s.color AS status_color,
                s.icon AS status_icon,
                s.visibility AS status_visibility
            FROM orderflow_status_history h
            LEFT JOIN orderflow_custom_statuses s ON h.to_status = s.slug
            WHERE h.order_id = $1
            ORDER BY h.created_at ASC, h.id ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_err(e, "timeline"))?;

        rows.iter()
            .map(|row| {
                let visibility: Option<String> = read(row, "status_visibility")?;
                Ok(TimelineEntry {
                    entry: history_from_row(row)?,
                    status_name: read(row, "status_name")?,
                    status_color: read(row, "status_color")?,
                    status_icon: read(row, "status_icon")?,
                    status_visibility: visibility
                        .map(|v| {
                            v.parse::<StatusVisibility>()
                                .map_err(|e| StorageError::Serialization(e.to_string()))
                        })
                        .transpose()?,
                })
            })
            .collect()
    }
}

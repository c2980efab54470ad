//! Append-only status history and the joined timeline view.

use crate::StatusVisibility;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// History append payload. Row ids are assigned by storage; the timestamp is
/// supplied by the caller so replays and tests stay deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryAppend {
    pub order_id: i64,
    pub from_status: Option<String>,
    pub to_status: String,
    pub changed_by: Option<i64>,
    pub change_reason: String,
    pub created_at: DateTime<Utc>,
}

impl HistoryAppend {
    pub fn now(
        order_id: i64,
        from_status: Option<String>,
        to_status: impl Into<String>,
        changed_by: Option<i64>,
        change_reason: impl Into<String>,
    ) -> Self {
        Self {
            order_id,
            from_status,
            to_status: to_status.into(),
            changed_by,
            change_reason: change_reason.into(),
            created_at: Utc::now(),
        }
    }
}

/// A persisted status transition. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub id: i64,
    pub order_id: i64,
    pub from_status: Option<String>,
    pub to_status: String,
    pub changed_by: Option<i64>,
    pub change_reason: String,
    pub created_at: DateTime<Utc>,
}

/// A history entry joined with custom-status display metadata.
///
/// The join is LEFT: entries whose `to_status` resolves to no catalog row
/// (built-in platform statuses, deleted statuses) keep `None` metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    #[serde(flatten)]
    pub entry: StatusHistoryEntry,
    pub status_name: Option<String>,
    pub status_color: Option<String>,
    pub status_icon: Option<String>,
    pub status_visibility: Option<StatusVisibility>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_entry_flattens_history_fields() {
        let entry = TimelineEntry {
            entry: StatusHistoryEntry {
                id: 1,
                order_id: 42,
                from_status: Some("processing".to_string()),
                to_status: "packed".to_string(),
                changed_by: None,
                change_reason: "Status changed via admin".to_string(),
                created_at: Utc::now(),
            },
            status_name: Some("Packed".to_string()),
            status_color: Some("#ff9500".to_string()),
            status_icon: None,
            status_visibility: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["order_id"], 42);
        assert_eq!(json["to_status"], "packed");
        assert_eq!(json["status_name"], "Packed");
    }
}

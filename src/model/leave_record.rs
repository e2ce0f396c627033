use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::EngineError;
use crate::model::status::ApprovalStatus;

/// Raw `leave_records` row as the store returns it. Mapped into
/// [`LeaveRecord`] at the boundary so the engine never sees loose strings.
#[derive(Debug, FromRow)]
pub struct LeaveRecordRow {
    pub id: u64,
    pub employee_id: u64,
    pub employee_name: String,
    pub sender_email: String,
    pub date: NaiveDate,
    pub weekday: String,
    pub hours: f64,
    pub is_pto: bool,
    pub status: String,
    pub request_reason: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One calendar day of requested leave for one employee. Multi-day
/// requests are N rows sharing a submission; each row is decided
/// independently.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1000,
    "employee_name": "John Doe",
    "sender_email": "john.doe@company.com",
    "date": "2026-06-10",
    "weekday": "Wed",
    "hours": 8.0,
    "is_pto": true,
    "status": "pending",
    "request_reason": "family trip",
    "approved_at": null,
    "updated_at": "2026-06-01T00:00:00Z"
}))]
pub struct LeaveRecord {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1000)]
    pub employee_id: u64,

    #[schema(example = "John Doe")]
    pub employee_name: String,

    #[schema(example = "john.doe@company.com")]
    pub sender_email: String,

    #[schema(example = "2026-06-10", value_type = String, format = "date")]
    pub date: NaiveDate,

    /// Three-letter weekday label derived from `date`, kept for display.
    #[schema(example = "Wed")]
    pub weekday: String,

    /// Hours requested for this day, 0 < hours <= 8.
    #[schema(example = 8.0)]
    pub hours: f64,

    /// True if the day counts against the PTO allowance.
    #[schema(example = true)]
    pub is_pto: bool,

    pub status: ApprovalStatus,

    #[schema(example = "family trip", nullable = true)]
    pub request_reason: Option<String>,

    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub approved_at: Option<DateTime<Utc>>,

    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<LeaveRecordRow> for LeaveRecord {
    type Error = EngineError;

    fn try_from(row: LeaveRecordRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<ApprovalStatus>().map_err(|_| {
            EngineError::Collaborator(format!(
                "leave record {} carries unknown status '{}'",
                row.id, row.status
            ))
        })?;

        Ok(LeaveRecord {
            id: row.id,
            employee_id: row.employee_id,
            employee_name: row.employee_name,
            sender_email: row.sender_email,
            date: row.date,
            weekday: row.weekday,
            hours: row.hours,
            is_pto: row.is_pto,
            status,
            request_reason: row.request_reason,
            approved_at: row.approved_at,
            updated_at: row.updated_at,
        })
    }
}

pub fn map_rows(rows: Vec<LeaveRecordRow>) -> Result<Vec<LeaveRecord>, EngineError> {
    rows.into_iter().map(LeaveRecord::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> LeaveRecordRow {
        LeaveRecordRow {
            id: 7,
            employee_id: 1000,
            employee_name: "John Doe".into(),
            sender_email: "john@company.com".into(),
            date: NaiveDate::from_ymd_opt(2026, 6, 10).unwrap(),
            weekday: "Wed".into(),
            hours: 8.0,
            is_pto: true,
            status: status.into(),
            request_reason: None,
            approved_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn maps_known_status() {
        let record = LeaveRecord::try_from(row("approved")).unwrap();
        assert_eq!(record.status, ApprovalStatus::Approved);
        assert_eq!(record.employee_id, 1000);
    }

    #[test]
    fn rejects_unknown_status() {
        let err = LeaveRecord::try_from(row("cancelled")).unwrap_err();
        assert!(matches!(err, EngineError::Collaborator(_)));
    }
}

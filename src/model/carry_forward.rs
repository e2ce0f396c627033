use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::EngineError;
use crate::model::status::ApprovalStatus;

/// Raw `carry_forward_requests` row.
#[derive(Debug, FromRow)]
pub struct CarryForwardRow {
    pub id: u64,
    pub employee_id: u64,
    pub employee_name: String,
    pub sender_email: String,
    pub from_year: i32,
    pub to_year: i32,
    pub days_requested: f64,
    pub reason: Option<String>,
    pub status: String,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request to move unused PTO allowance from one year to the next.
/// `to_year = from_year + 1` by convention, not enforced.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 3,
    "employee_id": 1000,
    "employee_name": "John Doe",
    "sender_email": "john.doe@company.com",
    "from_year": 2025,
    "to_year": 2026,
    "days_requested": 2.5,
    "reason": "project crunch in December",
    "status": "pending",
    "updated_at": "2026-01-05T00:00:00Z"
}))]
pub struct CarryForwardRequest {
    #[schema(example = 3)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "John Doe")]
    pub employee_name: String,
    #[schema(example = "john.doe@company.com")]
    pub sender_email: String,
    #[schema(example = 2025)]
    pub from_year: i32,
    #[schema(example = 2026)]
    pub to_year: i32,
    /// Positive, 0.5-day increments allowed.
    #[schema(example = 2.5)]
    pub days_requested: f64,
    #[schema(nullable = true)]
    pub reason: Option<String>,
    pub status: ApprovalStatus,
    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<CarryForwardRow> for CarryForwardRequest {
    type Error = EngineError;

    fn try_from(row: CarryForwardRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<ApprovalStatus>().map_err(|_| {
            EngineError::Collaborator(format!(
                "carry-forward request {} carries unknown status '{}'",
                row.id, row.status
            ))
        })?;

        Ok(CarryForwardRequest {
            id: row.id,
            employee_id: row.employee_id,
            employee_name: row.employee_name,
            sender_email: row.sender_email,
            from_year: row.from_year,
            to_year: row.to_year,
            days_requested: row.days_requested,
            reason: row.reason,
            status,
            updated_at: row.updated_at,
        })
    }
}

pub fn map_rows(rows: Vec<CarryForwardRow>) -> Result<Vec<CarryForwardRequest>, EngineError> {
    rows.into_iter().map(CarryForwardRequest::try_from).collect()
}

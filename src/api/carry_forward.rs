use crate::auth::auth::AuthUser;
use crate::engine::decision::{Decision, next_status};
use crate::error::EngineError;
use crate::model::carry_forward::{CarryForwardRequest, CarryForwardRow, map_rows};
use crate::model::status::ApprovalStatus;
use crate::utils::summary_cache;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use super::leave::fetch_employee;

const CF_COLUMNS: &str = "id, employee_id, employee_name, sender_email, from_year, to_year, \
     days_requested, reason, status, updated_at";

#[derive(Deserialize, ToSchema)]
pub struct CreateCarryForward {
    #[schema(example = 2025)]
    pub from_year: i32,
    /// Defaults to the year after `from_year`
    #[schema(example = 2026, nullable = true)]
    pub to_year: Option<i32>,
    #[schema(example = 2.5)]
    pub days_requested: f64,
    #[schema(example = "project crunch in December", nullable = true)]
    pub reason: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct CarryForwardFilter {
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    pub status: Option<String>,
    #[schema(example = 2026)]
    pub to_year: Option<i32>,
}

#[derive(Serialize, ToSchema)]
pub struct CarryForwardListResponse {
    pub data: Vec<CarryForwardRequest>,
}

/* =========================
Create carry-forward request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/carry-forward",
    request_body = CreateCarryForward,
    responses(
        (status = 201, description = "Carry-forward request submitted", body = CarryForwardRequest),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "CarryForward"
)]
pub async fn create_carry_forward(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateCarryForward>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id_or_forbidden()?;

    if payload.days_requested <= 0.0 {
        return Err(EngineError::Validation("days_requested must be positive".into()).into());
    }
    // half-day granularity
    if (payload.days_requested * 2.0).fract() != 0.0 {
        return Err(
            EngineError::Validation("days_requested must be in 0.5 increments".into()).into(),
        );
    }

    let to_year = payload.to_year.unwrap_or(payload.from_year + 1);
    let employee = fetch_employee(pool.get_ref(), employee_id).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO carry_forward_requests
            (employee_id, employee_name, sender_email, from_year, to_year, days_requested, reason, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(employee.full_name())
    .bind(&employee.email)
    .bind(payload.from_year)
    .bind(to_year)
    .bind(payload.days_requested)
    .bind(&payload.reason)
    .bind(ApprovalStatus::Pending.as_str())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to create carry-forward request");
        EngineError::from(e)
    })?;

    let sql = format!(
        "SELECT {} FROM carry_forward_requests WHERE id = ?",
        CF_COLUMNS
    );
    let row = sqlx::query_as::<_, CarryForwardRow>(&sql)
        .bind(result.last_insert_id())
        .fetch_one(pool.get_ref())
        .await
        .map_err(EngineError::from)?;

    Ok(HttpResponse::Created().json(CarryForwardRequest::try_from(row)?))
}

/* =========================
List carry-forward requests
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/carry-forward",
    params(CarryForwardFilter),
    responses(
        (status = 200, description = "Carry-forward requests", body = CarryForwardListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "CarryForward"
)]
pub async fn carry_forward_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<CarryForwardFilter>,
) -> actix_web::Result<impl Responder> {
    let mut where_sql = String::from(" WHERE 1=1");

    let employee_filter = if auth.is_employee() {
        Some(auth.employee_id_or_forbidden()?)
    } else {
        query.employee_id
    };

    let status_filter = match query.status.as_deref() {
        Some(raw) => Some(raw.parse::<ApprovalStatus>().map_err(|_| {
            EngineError::Validation(format!("unknown status '{}'", raw))
        })?),
        None => None,
    };

    if employee_filter.is_some() {
        where_sql.push_str(" AND employee_id = ?");
    }
    if status_filter.is_some() {
        where_sql.push_str(" AND status = ?");
    }
    if query.to_year.is_some() {
        where_sql.push_str(" AND to_year = ?");
    }

    let sql = format!(
        "SELECT {} FROM carry_forward_requests{} ORDER BY id DESC",
        CF_COLUMNS, where_sql
    );
    let mut q = sqlx::query_as::<_, CarryForwardRow>(&sql);
    if let Some(emp_id) = employee_filter {
        q = q.bind(emp_id);
    }
    if let Some(status) = status_filter {
        q = q.bind(status.as_str());
    }
    if let Some(to_year) = query.to_year {
        q = q.bind(to_year);
    }

    let rows = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch carry-forward requests");
        EngineError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(CarryForwardListResponse {
        data: map_rows(rows)?,
    }))
}

/* =========================
Decide carry-forward (Manager/Admin)
========================= */
async fn decide_carry_forward(
    pool: &MySqlPool,
    request_id: u64,
    decision: Decision,
) -> Result<CarryForwardRequest, EngineError> {
    let sql = format!(
        "SELECT {} FROM carry_forward_requests WHERE id = ?",
        CF_COLUMNS
    );
    let row = sqlx::query_as::<_, CarryForwardRow>(&sql)
        .bind(request_id)
        .fetch_optional(pool)
        .await?
        .ok_or(EngineError::NotFound("carry-forward request"))?;

    let request = CarryForwardRequest::try_from(row)?;
    let target = next_status(request.status, decision, "carry-forward request")?;

    let result = sqlx::query(
        r#"
        UPDATE carry_forward_requests
        SET status = ?
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(target.as_str())
    .bind(request_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(EngineError::AlreadyDecided("carry-forward request"));
    }

    // an approved grant raises the target year's effective limit
    if target == ApprovalStatus::Approved {
        summary_cache::invalidate(request.to_year).await;
    }

    Ok(CarryForwardRequest {
        status: target,
        ..request
    })
}

#[utoipa::path(
    put,
    path = "/api/v1/carry-forward/{request_id}/approve",
    params(
        ("request_id" = u64, Path, description = "ID of the carry-forward request to approve")
    ),
    responses(
        (status = 200, description = "Carry-forward approved", body = CarryForwardRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Carry-forward request not found"),
        (status = 409, description = "Carry-forward request already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "CarryForward"
)]
pub async fn approve_carry_forward(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let request = decide_carry_forward(pool.get_ref(), path.into_inner(), Decision::Approve).await?;
    Ok(HttpResponse::Ok().json(request))
}

#[utoipa::path(
    put,
    path = "/api/v1/carry-forward/{request_id}/reject",
    params(
        ("request_id" = u64, Path, description = "ID of the carry-forward request to reject")
    ),
    responses(
        (status = 200, description = "Carry-forward rejected", body = CarryForwardRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Carry-forward request not found"),
        (status = 409, description = "Carry-forward request already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "CarryForward"
)]
pub async fn reject_carry_forward(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let request = decide_carry_forward(pool.get_ref(), path.into_inner(), Decision::Reject).await?;
    Ok(HttpResponse::Ok().json(request))
}

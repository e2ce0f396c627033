use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::engine::calendar::{DateRange, build_continuous_ranges, expand_date_range, weekday_label, year_bounds};
use crate::engine::classify::{classify_days, find_conflicts, remaining_pto_slots};
use crate::engine::decision::{Decision, next_status};
use crate::error::{EngineError, map_insert_error};
use crate::model::employee::Employee;
use crate::model::leave_record::{LeaveRecord, LeaveRecordRow, map_rows};
use crate::model::status::ApprovalStatus;
use crate::utils::{csv_export, summary_cache};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

const RECORD_COLUMNS: &str = "id, employee_id, employee_name, sender_email, date, weekday, \
     hours, is_pto, status, request_reason, approved_at, updated_at";

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-06-09", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-06-11", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Hours per requested day, defaults to a full 8-hour day
    #[schema(example = 8.0, nullable = true)]
    pub hours_per_day: Option<f64>,
    #[schema(example = "family trip", nullable = true)]
    pub request_reason: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CreatedLeaveResponse {
    #[schema(example = "Leave request submitted")]
    pub message: String,
    /// One record per requested calendar day, in date order
    pub records: Vec<LeaveRecord>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 1000)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<String>,
    #[schema(example = 2026)]
    /// Restrict to one calendar year
    pub year: Option<i32>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRecord>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RangeQuery {
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    #[schema(example = 2026)]
    pub year: i32,
    /// Status to group, defaults to approved
    #[schema(example = "approved")]
    pub status: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ExportQuery {
    #[schema(example = 2026)]
    pub year: i32,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
    Date(NaiveDate),
}

pub(crate) async fn fetch_employee(
    pool: &MySqlPool,
    employee_id: u64,
) -> Result<Employee, EngineError> {
    sqlx::query_as::<_, Employee>(
        r#"
        SELECT id, employee_code, first_name, last_name, email, hire_date, status
        FROM employees
        WHERE id = ?
        "#,
    )
    .bind(employee_id)
    .fetch_optional(pool)
    .await?
    .ok_or(EngineError::NotFound("employee"))
}

/// All of one employee's records inside one calendar year, any status.
async fn fetch_employee_year_records(
    pool: &MySqlPool,
    employee_id: u64,
    year: i32,
) -> Result<Vec<LeaveRecord>, EngineError> {
    let (from, to) = year_bounds(year)?;
    let rows = sqlx::query_as::<_, LeaveRecordRow>(&format!(
        "SELECT {} FROM leave_records WHERE employee_id = ? AND date BETWEEN ? AND ? ORDER BY date",
        RECORD_COLUMNS
    ))
    .bind(employee_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    map_rows(rows)
}

fn parse_status(raw: &str) -> Result<ApprovalStatus, EngineError> {
    raw.parse::<ApprovalStatus>()
        .map_err(|_| EngineError::Validation(format!("unknown status '{}'", raw)))
}

/* =========================
Create leave request
========================= */
/// Swagger doc for create_leave endpoint
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload; every day in the range becomes one record",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = CreatedLeaveResponse),
        (status = 400, description = "Missing or out-of-range fields"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Requested dates already have leave records")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id_or_forbidden()?;

    let hours_per_day = payload.hours_per_day.unwrap_or(8.0);
    if !(hours_per_day > 0.0 && hours_per_day <= 8.0) {
        return Err(EngineError::Validation("hours_per_day must be within (0, 8]".into()).into());
    }

    // one record per calendar day, inclusive both ends
    let dates = expand_date_range(payload.start_date, payload.end_date)?;

    let employee = fetch_employee(pool.get_ref(), employee_id).await?;

    // best-effort pre-check; the UNIQUE (employee_id, date) constraint is
    // the authoritative guard against the read-then-write race
    let existing = sqlx::query_scalar::<_, NaiveDate>(
        "SELECT date FROM leave_records WHERE employee_id = ?",
    )
    .bind(employee_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(EngineError::from)?;

    let conflicts = find_conflicts(&existing, &dates);

    if !conflicts.is_empty() {
        tracing::info!(employee_id, ?conflicts, "Leave submission rejected on date conflict");
        return Err(EngineError::Conflict { dates: conflicts }.into());
    }

    // approved and pending days both count against the allowance
    let year = payload.start_date.year();
    let year_records = fetch_employee_year_records(pool.get_ref(), employee_id, year).await?;
    let remaining = remaining_pto_slots(config.pto_base_days, &year_records);

    let plan = classify_days(&dates, remaining);

    // single multi-row INSERT so a failure leaves no partial batch
    let row_placeholders = vec!["(?, ?, ?, ?, ?, ?, ?, ?, ?)"; plan.len()].join(", ");
    let insert_sql = format!(
        "INSERT INTO leave_records \
         (employee_id, employee_name, sender_email, date, weekday, hours, is_pto, status, request_reason) \
         VALUES {}",
        row_placeholders
    );
    let mut insert_q = sqlx::query(&insert_sql);
    for day in &plan {
        insert_q = insert_q
            .bind(employee_id)
            .bind(employee.full_name())
            .bind(&employee.email)
            .bind(day.date)
            .bind(weekday_label(day.date))
            .bind(hours_per_day)
            .bind(day.is_pto)
            .bind(ApprovalStatus::Pending.as_str())
            .bind(&payload.request_reason);
    }

    insert_q.execute(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to create leave records");
        map_insert_error(e, &dates)
    })?;

    summary_cache::invalidate(year).await;

    // read the batch back so the caller gets store-assigned ids
    let placeholders = vec!["?"; dates.len()].join(", ");
    let created_sql = format!(
        "SELECT {} FROM leave_records WHERE employee_id = ? AND date IN ({}) ORDER BY date",
        RECORD_COLUMNS, placeholders
    );
    let mut created_q = sqlx::query_as::<_, LeaveRecordRow>(&created_sql).bind(employee_id);
    for date in &dates {
        created_q = created_q.bind(*date);
    }
    let created = map_rows(
        created_q
            .fetch_all(pool.get_ref())
            .await
            .map_err(EngineError::from)?,
    )?;

    Ok(HttpResponse::Created().json(CreatedLeaveResponse {
        message: "Leave request submitted".into(),
        records: created,
    }))
}

/* =========================
Decide leave (Manager/Admin)
========================= */
async fn decide_leave(
    pool: &MySqlPool,
    leave_id: u64,
    decision: Decision,
) -> Result<LeaveRecord, EngineError> {
    let sql = format!(
        "SELECT {} FROM leave_records WHERE id = ?",
        RECORD_COLUMNS
    );
    let row = sqlx::query_as::<_, LeaveRecordRow>(&sql)
        .bind(leave_id)
        .fetch_optional(pool)
        .await?
        .ok_or(EngineError::NotFound("leave request"))?;

    let record = LeaveRecord::try_from(row)?;
    let target = next_status(record.status, decision, "leave request")?;
    let approved_at = matches!(decision, Decision::Approve).then(Utc::now);

    // guarded update closes the race against a concurrent decision
    let result = sqlx::query(
        r#"
        UPDATE leave_records
        SET status = ?, approved_at = ?
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(target.as_str())
    .bind(approved_at)
    .bind(leave_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(EngineError::AlreadyDecided("leave request"));
    }

    summary_cache::invalidate(record.date.year()).await;

    Ok(LeaveRecord {
        status: target,
        approved_at,
        ..record
    })
}

/// Swagger doc for approve_leave endpoint
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved", body = LeaveRecord),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let record = decide_leave(pool.get_ref(), path.into_inner(), Decision::Approve).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Swagger doc for reject_leave endpoint
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRecord),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let record = decide_leave(pool.get_ref(), path.into_inner(), Decision::Reject).await?;
    Ok(HttpResponse::Ok().json(record))
}

/* =========================
Delete leave (Manager/Admin escape hatch)
========================= */
/// Unconditional removal, not a state transition.
#[utoipa::path(
    delete,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave record to delete")
    ),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let leave_id = path.into_inner();

    let date: Option<NaiveDate> =
        sqlx::query_scalar("SELECT date FROM leave_records WHERE id = ?")
            .bind(leave_id)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(EngineError::from)?;

    let date = date.ok_or(EngineError::NotFound("leave record"))?;

    sqlx::query("DELETE FROM leave_records WHERE id = ?")
        .bind(leave_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to delete leave record");
            EngineError::from(e)
        })?;

    summary_cache::invalidate(date.year()).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Successfully deleted"
    })))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRecord),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let sql = format!("SELECT {} FROM leave_records WHERE id = ?", RECORD_COLUMNS);
    let row = sqlx::query_as::<_, LeaveRecordRow>(&sql)
        .bind(leave_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
            EngineError::from(e)
        })?
        .ok_or(EngineError::NotFound("leave request"))?;

    let record = LeaveRecord::try_from(row)?;

    // employees may only read their own records
    if auth.is_employee() && Some(record.employee_id) != auth.employee_id {
        return Err(actix_web::error::ErrorForbidden("Not your record"));
    }

    Ok(HttpResponse::Ok().json(record))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    // employees see their own rows regardless of the filter they pass
    let employee_filter = if auth.is_employee() {
        Some(auth.employee_id_or_forbidden()?)
    } else {
        query.employee_id
    };

    if let Some(emp_id) = employee_filter {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status.as_deref() {
        parse_status(status)?;
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    if let Some(year) = query.year {
        let (from, to) = year_bounds(year)?;
        where_sql.push_str(" AND date BETWEEN ? AND ?");
        args.push(FilterValue::Date(from));
        args.push(FilterValue::Date(to));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_records{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error=%e, "Failed to count leave records");
        EngineError::from(e)
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        "SELECT {} FROM leave_records{} ORDER BY date DESC, employee_id LIMIT ? OFFSET ?",
        RECORD_COLUMNS, where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveRecordRow>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
            FilterValue::Date(d) => data_q.bind(d),
        };
    }

    let rows = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error=%e, "Failed to fetch leave list");
            EngineError::from(e)
        })?;

    let response = LeaveListResponse {
        data: map_rows(rows)?,
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}

/* =========================
Continuous ranges (display grouping)
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/ranges",
    params(RangeQuery),
    responses(
        (status = 200, description = "Contiguous leave ranges", body = [DateRange]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_ranges(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<RangeQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = if auth.is_employee() {
        auth.employee_id_or_forbidden()?
    } else {
        query
            .employee_id
            .ok_or_else(|| EngineError::Validation("employee_id is required".into()))?
    };

    let status = match query.status.as_deref() {
        Some(raw) => parse_status(raw)?,
        None => ApprovalStatus::Approved,
    };
    let (from, to) = year_bounds(query.year)?;

    let dates = sqlx::query_scalar::<_, NaiveDate>(
        r#"
        SELECT date FROM leave_records
        WHERE employee_id = ? AND status = ? AND date BETWEEN ? AND ?
        ORDER BY date
        "#,
    )
    .bind(employee_id)
    .bind(status.as_str())
    .bind(from)
    .bind(to)
    .fetch_all(pool.get_ref())
    .await
    .map_err(EngineError::from)?;

    Ok(HttpResponse::Ok().json(build_continuous_ranges(&dates)))
}

/* =========================
CSV export (Manager/Admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/export",
    params(ExportQuery),
    responses(
        (status = 200, description = "CSV of the year's leave records", content_type = "text/csv"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn export_leave_csv(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ExportQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let (from, to) = year_bounds(query.year)?;
    let sql = format!(
        "SELECT {} FROM leave_records WHERE date BETWEEN ? AND ? ORDER BY employee_id, date",
        RECORD_COLUMNS
    );
    let rows = sqlx::query_as::<_, LeaveRecordRow>(&sql)
        .bind(from)
        .bind(to)
        .fetch_all(pool.get_ref())
        .await
        .map_err(EngineError::from)?;

    let csv = csv_export::leave_records_csv(&map_rows(rows)?)?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"leave_{}.csv\"", query.year),
        ))
        .body(csv))
}

use std::collections::HashMap;

use actix_web::{HttpResponse, Responder, web};
use chrono::Datelike;
use futures_util::StreamExt;
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::engine::calendar::year_bounds;
use crate::engine::summary::{
    EmployeePtoSummary, compute_summaries, employees_needing_notification,
};
use crate::error::EngineError;
use crate::model::leave_record::{LeaveRecord, LeaveRecordRow};
use crate::notify::Mailer;
use crate::utils::summary_cache;

#[derive(Serialize, ToSchema)]
pub struct SummaryListResponse {
    #[schema(example = 2026)]
    pub year: i32,
    pub data: Vec<EmployeePtoSummary>,
}

#[derive(Serialize, ToSchema)]
pub struct NotifyResponse {
    #[schema(example = 1)]
    pub sent: usize,
    /// Emails the threshold alert went to
    pub recipients: Vec<String>,
}

/// Streams the full year of records rather than buffering the driver's
/// row set twice; years run to a few thousand rows at most.
async fn load_year_records(pool: &MySqlPool, year: i32) -> Result<Vec<LeaveRecord>, EngineError> {
    let (from, to) = year_bounds(year)?;

    let mut stream = sqlx::query_as::<_, LeaveRecordRow>(
        r#"
        SELECT id, employee_id, employee_name, sender_email, date, weekday,
               hours, is_pto, status, request_reason, approved_at, updated_at
        FROM leave_records
        WHERE date BETWEEN ? AND ?
        ORDER BY employee_id, date
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch(pool);

    let mut records = Vec::new();
    while let Some(row) = stream.next().await {
        records.push(LeaveRecord::try_from(row.map_err(EngineError::from)?)?);
    }
    Ok(records)
}

/// Approved carry-forward days granted into `year`, keyed by employee.
async fn load_carry_forward_map(
    pool: &MySqlPool,
    year: i32,
) -> Result<HashMap<u64, f64>, EngineError> {
    let rows = sqlx::query_as::<_, (u64, f64)>(
        r#"
        SELECT employee_id, SUM(days_requested)
        FROM carry_forward_requests
        WHERE status = 'approved' AND to_year = ?
        GROUP BY employee_id
        "#,
    )
    .bind(year)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

/// Full recompute from the latest snapshot, then cache. Balance depends
/// on the complete approved set, so there is no incremental patching.
pub async fn refresh_year(
    pool: &MySqlPool,
    base_limit_days: f64,
    year: i32,
) -> Result<Vec<EmployeePtoSummary>, EngineError> {
    let records = load_year_records(pool, year).await?;
    let carried = load_carry_forward_map(pool, year).await?;
    let summaries = compute_summaries(&records, &carried, base_limit_days);
    summary_cache::put(year, summaries.clone()).await;
    Ok(summaries)
}

/// Primes the cache for the current year so the first dashboard load
/// after a restart doesn't pay the full scan.
pub async fn warmup_summary_cache(pool: &MySqlPool, base_limit_days: f64) -> anyhow::Result<()> {
    let year = chrono::Utc::now().year();
    let summaries = refresh_year(pool, base_limit_days, year).await?;

    log::info!(
        "Summary cache warmup complete: {} employees for {}",
        summaries.len(),
        year
    );

    Ok(())
}

/* =========================
Yearly summaries (Manager/Admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/summary/{year}",
    params(
        ("year" = i32, Path, description = "Calendar year to summarize")
    ),
    responses(
        (status = 200, description = "Per-employee PTO summaries", body = SummaryListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Summary"
)]
pub async fn get_summaries(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<i32>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let year = path.into_inner();

    let data = match summary_cache::get(year).await {
        Some(cached) => cached.as_ref().clone(),
        None => refresh_year(pool.get_ref(), config.pto_base_days, year).await?,
    };

    Ok(HttpResponse::Ok().json(SummaryListResponse { year, data }))
}

/* =========================
Threshold alerts (Manager/Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/summary/{year}/notify",
    params(
        ("year" = i32, Path, description = "Calendar year to scan for near-exhausted allowances")
    ),
    responses(
        (status = 200, description = "Alerts dispatched", body = NotifyResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Email dispatch failed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Summary"
)]
pub async fn notify_thresholds(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    mailer: web::Data<Mailer>,
    path: web::Path<i32>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let year = path.into_inner();

    // alerts always go out against a fresh snapshot, never the cache
    let summaries = refresh_year(pool.get_ref(), config.pto_base_days, year).await?;
    let recipients = employees_needing_notification(&summaries);

    let sent = mailer.send_threshold_alerts(&recipients).await?;

    Ok(HttpResponse::Ok().json(NotifyResponse {
        sent,
        recipients: recipients
            .iter()
            .map(|s| s.sender_email.clone())
            .collect(),
    }))
}

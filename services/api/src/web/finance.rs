//! services/api/src/web/finance.rs
//!
//! Income and expense records with a totals summary. Admin only.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{Datelike, NaiveDate};
use preschool_core::dates::{checked_range, month_bounds, parse_date};
use preschool_core::domain::{FinanceKind, FinancialRecord};
use preschool_core::finance::{summarize, FinanceSummary};
use preschool_core::validation::validate_financial_record;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{bad_date, invalid, port_failure, HandlerResult};
use crate::web::middleware::CurrentUser;
use crate::web::state::AppState;
use crate::web::today;

#[derive(Deserialize, ToSchema)]
pub struct FinancialRecordRequest {
    /// `income` or `expense`.
    #[schema(value_type = String)]
    pub kind: FinanceKind,
    pub category: String,
    /// Positive amount in the smallest currency unit.
    pub amount_cents: i64,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    /// Set for fee payments.
    pub roll_number: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FinanceQuery {
    /// Defaults to the first day of the current month.
    pub start: Option<String>,
    /// Defaults to today.
    pub end: Option<String>,
}

#[derive(Serialize)]
pub struct FinanceResponse {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub records: Vec<FinancialRecord>,
    pub summary: FinanceSummary,
}

/// GET /finance - Records in a date range with totals (admin only)
#[utoipa::path(
    get,
    path = "/finance",
    params(FinanceQuery),
    responses(
        (status = 200, description = "Records and summary"),
        (status = 400, description = "Bad range")
    )
)]
pub async fn list_finance_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<FinanceQuery>,
) -> HandlerResult<Json<FinanceResponse>> {
    current.require_admin()?;
    let now = today();
    let start = match &query.start {
        Some(raw) => parse_date(raw).map_err(bad_date)?,
        None => month_bounds(now.year(), now.month()).map_err(bad_date)?.0,
    };
    let end = match &query.end {
        Some(raw) => parse_date(raw).map_err(bad_date)?,
        None => now,
    };
    checked_range(start, end).map_err(bad_date)?;

    let records = state
        .db
        .list_financial_records(start, end)
        .await
        .map_err(|e| port_failure("list financial records", e))?;
    let summary = summarize(&records);
    Ok(Json(FinanceResponse {
        start,
        end,
        records,
        summary,
    }))
}

/// POST /finance - Record income or an expense (admin only)
#[utoipa::path(
    post,
    path = "/finance",
    request_body = FinancialRecordRequest,
    responses(
        (status = 201, description = "Record stored"),
        (status = 422, description = "Invalid record")
    )
)]
pub async fn create_finance_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<FinancialRecordRequest>,
) -> HandlerResult<impl IntoResponse> {
    current.require_admin()?;
    let record = FinancialRecord {
        id: Uuid::new_v4(),
        kind: req.kind,
        category: req.category.trim().to_string(),
        amount_cents: req.amount_cents,
        description: req.description.trim().to_string(),
        date: req.date,
        roll_number: req.roll_number.filter(|r| !r.trim().is_empty()),
        created_by: current.user.user_id,
    };
    validate_financial_record(&record).map_err(invalid)?;
    let record = state
        .db
        .create_financial_record(record)
        .await
        .map_err(|e| port_failure("create financial record", e))?;
    info!(record_id = %record.id, kind = record.kind.as_str(), "financial record stored");
    Ok((StatusCode::CREATED, Json(record)))
}

/// DELETE /finance/{id} - Delete a record (admin only)
#[utoipa::path(
    delete,
    path = "/finance/{id}",
    params(("id" = Uuid, Path, description = "Record id")),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 404, description = "No such record")
    )
)]
pub async fn delete_finance_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(record_id): Path<Uuid>,
) -> HandlerResult<StatusCode> {
    current.require_admin()?;
    state
        .db
        .delete_financial_record(record_id)
        .await
        .map_err(|e| port_failure("delete financial record", e))?;
    Ok(StatusCode::NO_CONTENT)
}

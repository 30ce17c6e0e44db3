use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::db::MySqlAttendanceSource;
use crate::report::export;
use crate::report::period::{DateRange, PeriodAggregator, PeriodReport, ReportError};
use crate::rules::lateness::GracePolicy;
use actix_web::http::StatusCode;
use actix_web::http::header::ContentDisposition;
use actix_web::{HttpResponse, Responder, ResponseError, web};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReportQuery {
    /// Employee to report on; defaults to the caller's own record
    #[param(example = 1000)]
    pub employee_id: Option<u64>,
    /// First day of the range, inclusive
    #[param(value_type = Option<String>, example = "2025-01-01")]
    pub start: Option<NaiveDate>,
    /// Last day of the range, inclusive
    #[param(value_type = Option<String>, example = "2025-01-31")]
    pub end: Option<NaiveDate>,
    /// Calendar month as YYYY-MM, used when start/end are absent
    #[param(example = "2025-01")]
    pub month: Option<String>,
    /// strict (default) or tolerance
    #[param(value_type = Option<String>, example = "strict")]
    pub grace: Option<GracePolicy>,
}

#[derive(Serialize, ToSchema)]
pub struct ReportResponse {
    /// Fresh per request; clients keep the response of their latest request.
    #[schema(example = "6f1c1a52-3f4e-4a8e-9d0b-9a3c5b1e2f77")]
    pub request_id: String,
    #[serde(flatten)]
    pub report: PeriodReport,
}

impl ResponseError for ReportError {
    fn status_code(&self) -> StatusCode {
        match self {
            ReportError::InvalidRange { .. } | ReportError::RangeTooLarge { .. } => {
                StatusCode::BAD_REQUEST
            }
            ReportError::EmployeeNotFound(_) => StatusCode::NOT_FOUND,
            ReportError::SourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

fn parse_month(raw: &str) -> Option<DateRange> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d").ok()?;
    DateRange::month(first.year(), first.month())
}

/// Explicit start/end wins, then `month`, then the month containing `today`.
fn resolve_range(query: &ReportQuery, today: NaiveDate) -> actix_web::Result<DateRange> {
    match (query.start, query.end, query.month.as_deref()) {
        (Some(start), Some(end), _) => Ok(DateRange::new(start, end)?),
        (Some(_), None, _) | (None, Some(_), _) => Err(actix_web::error::ErrorBadRequest(
            "start and end must be given together",
        )),
        (None, None, Some(month)) => parse_month(month)
            .ok_or_else(|| actix_web::error::ErrorBadRequest("month must look like YYYY-MM")),
        (None, None, None) => DateRange::month(today.year(), today.month())
            .ok_or_else(|| actix_web::error::ErrorInternalServerError("Internal Server Error")),
    }
}

async fn build_report(
    auth: &AuthUser,
    config: &Config,
    source: &MySqlAttendanceSource,
    query: &ReportQuery,
) -> actix_web::Result<PeriodReport> {
    let employee_id = match query.employee_id {
        Some(id) => id,
        None => auth.require_employee()?,
    };
    auth.require_self_or_reviewer(employee_id)?;

    let today = Local::now().date_naive();
    let range = resolve_range(query, today)?;
    let grace = query.grace.unwrap_or_default();

    let report = PeriodAggregator::new(source, &config.calendar, config.report_max_days)
        .aggregate(range, employee_id, today, grace)
        .await?;

    Ok(report)
}

/// Period report endpoint
#[utoipa::path(
    get,
    path = "/api/attendance/report",
    params(ReportQuery),
    responses(
        (status = 200, description = "One status per day of the range plus totals", body = ReportResponse),
        (status = 400, description = "Invalid or oversized range", body = Object, example = json!({
            "message": "range end 2025-01-01 is before start 2025-01-31"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found"),
        (status = 503, description = "Attendance data unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn period_report(
    auth: AuthUser,
    config: web::Data<Config>,
    source: web::Data<MySqlAttendanceSource>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    let report = build_report(&auth, &config, &source, &query).await?;

    Ok(HttpResponse::Ok().json(ReportResponse {
        request_id: Uuid::new_v4().to_string(),
        report,
    }))
}

/// Spreadsheet export of the period report
#[utoipa::path(
    get,
    path = "/api/attendance/report/export",
    params(ReportQuery),
    responses(
        (status = 200, description = "XLSX workbook", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 400, description = "Invalid or oversized range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found"),
        (status = 503, description = "Attendance data unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn export_report(
    auth: AuthUser,
    config: web::Data<Config>,
    source: web::Data<MySqlAttendanceSource>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    let report = build_report(&auth, &config, &source, &query).await?;

    let employee_name = match source.fetch_employee(report.employee_id).await {
        Ok(Some(employee)) => employee.full_name,
        Ok(None) => return Err(ReportError::EmployeeNotFound(report.employee_id).into()),
        Err(e) => {
            tracing::warn!(error = %e, employee_id = report.employee_id, "Employee name lookup failed");
            format!("Employee {}", report.employee_id)
        }
    };

    let bytes = export::render_workbook(&report, &employee_name).map_err(|e| {
        tracing::error!(error = %e, employee_id = report.employee_id, "Failed to render workbook");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header(ContentDisposition::attachment(export::file_name(&report)))
        .body(bytes))
}

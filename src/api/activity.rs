use crate::auth::auth::AuthUser;
use crate::model::activity_log::ActivityLog;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

const MAX_ACTIVITY_LEN: usize = 2000;
const MAX_LIST_DAYS: i64 = 366;

#[derive(Deserialize, ToSchema)]
pub struct UpsertActivity {
    #[schema(example = "Patrolled parking area, logged visitor entries")]
    pub activity: String,
}

#[derive(Deserialize, IntoParams)]
pub struct ActivityQuery {
    /// Reviewers may read another employee's log
    #[param(example = 1000)]
    pub employee_id: Option<u64>,
    #[param(value_type = String, example = "2025-01-01")]
    pub start: NaiveDate,
    #[param(value_type = String, example = "2025-01-31")]
    pub end: NaiveDate,
}

fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), &'static str> {
    if end < start {
        return Err("end cannot be before start");
    }
    if (end - start).num_days() + 1 > MAX_LIST_DAYS {
        return Err("range is too large");
    }
    Ok(())
}

/// Write or replace today's activity entry
#[utoipa::path(
    put,
    path = "/api/activity",
    request_body = UpsertActivity,
    responses(
        (status = 200, description = "Activity saved", body = Object, example = json!({
            "message": "Activity saved",
            "date": "2025-01-13"
        })),
        (status = 400, description = "Empty or overlong activity"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Activity"
)]
pub async fn upsert_activity(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<UpsertActivity>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let activity = payload.activity.trim();
    if activity.is_empty() || activity.chars().count() > MAX_ACTIVITY_LEN {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": format!("activity must be between 1 and {MAX_ACTIVITY_LEN} characters")
        })));
    }

    let date = Local::now().date_naive();

    sqlx::query(
        r#"
        INSERT INTO activity_logs (employee_id, date, activity)
        VALUES (?, ?, ?)
        ON DUPLICATE KEY UPDATE activity = VALUES(activity), updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .bind(activity)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to save activity");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Activity saved",
        "date": date
    })))
}

/// Activity entries in a date range, oldest first
#[utoipa::path(
    get,
    path = "/api/activity",
    params(ActivityQuery),
    responses(
        (status = 200, description = "Activity entries", body = [ActivityLog]),
        (status = 400, description = "Invalid range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Activity"
)]
pub async fn list_activity(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ActivityQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = match query.employee_id {
        Some(id) => id,
        None => auth.require_employee()?,
    };
    auth.require_self_or_reviewer(employee_id)?;

    if let Err(message) = validate_range(query.start, query.end) {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": message })));
    }

    let rows = sqlx::query_as::<_, ActivityLog>(
        r#"
        SELECT id, employee_id, date, activity, updated_at
        FROM activity_logs
        WHERE employee_id = ?
        AND date BETWEEN ? AND ?
        ORDER BY date
        "#,
    )
    .bind(employee_id)
    .bind(query.start)
    .bind(query.end)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to fetch activity");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn single_day_range_is_fine() {
        assert!(validate_range(date(1, 13), date(1, 13)).is_ok());
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert_eq!(
            validate_range(date(1, 14), date(1, 13)),
            Err("end cannot be before start")
        );
    }

    #[test]
    fn year_long_range_is_capped() {
        assert!(validate_range(date(1, 1), date(12, 31)).is_ok());
        let next_year = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        assert_eq!(validate_range(date(1, 1), next_year), Err("range is too large"));
    }
}

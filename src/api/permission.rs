use crate::auth::auth::AuthUser;
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{MySqlPool, prelude::FromRow};
use utoipa::{IntoParams, ToSchema};

const MAX_REASON_LEN: usize = 500;

#[derive(Deserialize, ToSchema)]
pub struct CreatePermission {
    #[schema(example = "2025-01-14", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2025-01-14", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Child's school meeting")]
    pub reason: String,
}

#[derive(Deserialize, IntoParams)]
pub struct PermissionFilter {
    /// Filter by employee ID
    #[param(example = 1000)]
    pub employee_id: Option<u64>,
    /// Filter by review status
    #[param(example = "pending")]
    pub status: Option<String>,
    /// Maximum rows returned, at most 200
    #[param(example = 50)]
    pub limit: Option<u64>,
}

#[derive(Serialize, FromRow, ToSchema)]
pub struct PermissionResponse {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2025-01-14", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2025-01-14", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Child's school meeting")]
    pub reason: String,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(example = "2025-01-13T09:12:00Z", format = "date-time", value_type = Option<String>)]
    pub created_at: Option<DateTime<Utc>>,
}

fn validate(payload: &CreatePermission) -> Result<(), &'static str> {
    if payload.start_date > payload.end_date {
        return Err("start_date cannot be after end_date");
    }
    let reason = payload.reason.trim();
    if reason.is_empty() {
        return Err("reason is required");
    }
    if reason.chars().count() > MAX_REASON_LEN {
        return Err("reason is too long");
    }
    Ok(())
}

async fn review(pool: &MySqlPool, permission_id: u64, status: &str) -> actix_web::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE permission_requests
        SET status = ?
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(status)
    .bind(permission_id)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, permission_id, status, "Permission review failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(result.rows_affected() > 0)
}

/// Submit a permission request
#[utoipa::path(
    post,
    path = "/api/permission",
    request_body = CreatePermission,
    responses(
        (status = 200, description = "Permission request submitted", body = Object, example = json!({
            "message": "Permission request submitted",
            "status": "pending"
        })),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Permission"
)]
pub async fn create_permission(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreatePermission>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    if let Err(message) = validate(&payload) {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": message })));
    }

    sqlx::query(
        r#"
        INSERT INTO permission_requests (employee_id, start_date, end_date, reason)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.reason.trim())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to create permission request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Permission request submitted",
        "status": "pending"
    })))
}

/// Approve a pending permission (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/permission/{permission_id}/approve",
    params(
        ("permission_id" = u64, Path, description = "ID of the permission request")
    ),
    responses(
        (status = 200, description = "Permission approved", body = Object, example = json!({
            "message": "Permission approved"
        })),
        (status = 400, description = "Permission request not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Permission"
)]
pub async fn approve_permission(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    if !review(&pool, path.into_inner(), "approved").await? {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Permission request not found or already processed"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Permission approved" })))
}

/// Reject a pending permission (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/permission/{permission_id}/reject",
    params(
        ("permission_id" = u64, Path, description = "ID of the permission request")
    ),
    responses(
        (status = 200, description = "Permission rejected", body = Object, example = json!({
            "message": "Permission rejected"
        })),
        (status = 400, description = "Permission request not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Permission"
)]
pub async fn reject_permission(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    if !review(&pool, path.into_inner(), "rejected").await? {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Permission request not found or already processed"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Permission rejected" })))
}

/// Permission requests, newest first (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/permission",
    params(PermissionFilter),
    responses(
        (status = 200, description = "Permission requests", body = [PermissionResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Permission"
)]
pub async fn permission_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PermissionFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let limit = query.limit.unwrap_or(50).clamp(1, 200);

    // NULL filters match everything
    let rows = sqlx::query_as::<_, PermissionResponse>(
        r#"
        SELECT id, employee_id, start_date, end_date, reason, status, created_at
        FROM permission_requests
        WHERE (? IS NULL OR employee_id = ?)
        AND (? IS NULL OR status = ?)
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(query.employee_id)
    .bind(query.employee_id)
    .bind(query.status.as_deref())
    .bind(query.status.as_deref())
    .bind(limit)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch permission list");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(start: u32, end: u32, reason: &str) -> CreatePermission {
        CreatePermission {
            start_date: NaiveDate::from_ymd_opt(2025, 1, start).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, end).unwrap(),
            reason: reason.to_string(),
        }
    }

    #[test]
    fn accepts_a_single_day() {
        assert!(validate(&request(14, 14, "Family event")).is_ok());
    }

    #[test]
    fn rejects_blank_reason() {
        assert_eq!(validate(&request(14, 14, "   ")), Err("reason is required"));
    }

    #[test]
    fn rejects_reversed_dates() {
        assert!(validate(&request(15, 14, "Family event")).is_err());
    }

    #[test]
    fn rejects_overlong_reason() {
        let reason = "x".repeat(MAX_REASON_LEN + 1);
        assert_eq!(validate(&request(14, 14, &reason)), Err("reason is too long"));
    }
}

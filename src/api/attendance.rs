use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::db::MySqlAttendanceSource;
use crate::report::source::AttendanceSource;
use crate::rules::geofence::{Coordinate, Geofence, LocationVerdict};
use crate::rules::lateness::{self, GracePolicy, Shift, StaffRole};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Days, Local, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ShiftPunch {
    #[schema(example = "morning")]
    pub shift: Shift,
    #[schema(example = json!(-6.1755))]
    pub latitude: Option<f64>,
    #[schema(example = 106.8271)]
    pub longitude: Option<f64>,
    /// Reverse-geocoded address resolved by the client.
    #[schema(example = "Jl. Medan Merdeka Barat No. 7, Jakarta")]
    pub address: Option<String>,
}

/// Where a punch happened once checked against the office geofence.
struct Located {
    point: Option<Coordinate>,
    distance_meters: Option<f64>,
    verdict: LocationVerdict,
}

/// Rejects punches outside the fence; missing coordinates pass as unknown.
fn locate(office: &Geofence, payload: &ShiftPunch) -> Result<Located, HttpResponse> {
    let point = match (payload.latitude, payload.longitude) {
        (Some(lat), Some(lon)) => match Coordinate::new(lat, lon) {
            Ok(p) => Some(p),
            Err(e) => {
                return Err(HttpResponse::BadRequest().json(json!({
                    "message": e.to_string()
                })));
            }
        },
        _ => None,
    };

    let verdict = office.evaluate(point);
    match verdict {
        LocationVerdict::Outside { distance_meters } => Err(HttpResponse::BadRequest().json(json!({
            "message": "You are outside the office area",
            "distance_meters": distance_meters.round(),
            "radius_meters": office.radius_meters
        }))),
        LocationVerdict::Inside { distance_meters } => Ok(Located {
            point,
            distance_meters: Some(distance_meters),
            verdict,
        }),
        LocationVerdict::Unknown => Ok(Located {
            point: None,
            distance_meters: None,
            verdict,
        }),
    }
}

async fn staff_role(
    source: &MySqlAttendanceSource,
    employee_id: u64,
) -> actix_web::Result<StaffRole> {
    let position = source.employee_role(employee_id).await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to resolve employee position");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    position
        .map(|p| StaffRole::from_role_str(&p))
        .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))
}

/// Oldest record date a check-out at `at` may still close.
///
/// Morning shifts close on their own day; night shifts may also close the
/// previous day's record after midnight.
fn earliest_open_date(shift: Shift, at: NaiveDateTime) -> NaiveDate {
    let today = at.date();
    match shift {
        Shift::Morning => today,
        Shift::Night => today.checked_sub_days(Days::new(1)).unwrap_or(today),
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = ShiftPunch,
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully",
            "shift": "morning",
            "check_in": "2025-01-13T07:58:12",
            "minutes_late": 0,
            "is_late": false,
            "location": { "verdict": "inside", "distance_meters": 35.2 }
        })),
        (status = 400, description = "Already checked in, or outside the office area", body = Object, example = json!({
            "message": "Already checked in for this shift today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    config: web::Data<Config>,
    source: web::Data<MySqlAttendanceSource>,
    payload: web::Json<ShiftPunch>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let located = match locate(&config.office, &payload) {
        Ok(l) => l,
        Err(resp) => return Ok(resp),
    };

    let role = staff_role(&source, employee_id).await?;
    let at = now();
    let date = at.date();
    let shift_start = date.and_time(lateness::default_shift_start(role, payload.shift));
    let late = lateness::lateness_for(role, payload.shift, at, GracePolicy::StrictCheckIn);

    let result = sqlx::query(
        r#"
        INSERT INTO attendance
            (employee_id, date, shift, shift_start, check_in,
             check_in_lat, check_in_lon, check_in_address, check_in_distance, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'open')
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .bind(payload.shift.as_ref())
    .bind(shift_start)
    .bind(at)
    .bind(located.point.map(|p| p.lat))
    .bind(located.point.map(|p| p.lon))
    .bind(payload.address.as_deref())
    .bind(located.distance_meters)
    .execute(source.pool())
    .await;

    match result {
        Ok(_) => {
            tracing::info!(
                employee_id,
                shift = %payload.shift,
                minutes_late = late.minutes_late,
                "Checked in"
            );
            Ok(HttpResponse::Ok().json(json!({
                "message": "Checked in successfully",
                "shift": payload.shift,
                "check_in": at,
                "minutes_late": late.minutes_late,
                "is_late": late.is_late,
                "location": located.verdict
            })))
        }

        Err(e) => {
            // One record per employee, date and shift
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::BadRequest().json(json!({
                        "message": "Already checked in for this shift today"
                    })));
                }
            }

            tracing::error!(error = %e, employee_id, "Check-in failed");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    request_body = ShiftPunch,
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully"
        })),
        (status = 400, description = "No open check-in for the shift, or outside the office area", body = Object, example = json!({
            "message": "No open check-in found for this shift"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    config: web::Data<Config>,
    source: web::Data<MySqlAttendanceSource>,
    payload: web::Json<ShiftPunch>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let located = match locate(&config.office, &payload) {
        Ok(l) => l,
        Err(resp) => return Ok(resp),
    };

    let at = now();
    let earliest = earliest_open_date(payload.shift, at);

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET check_out = ?,
            check_out_lat = ?,
            check_out_lon = ?,
            check_out_address = ?,
            check_out_distance = ?,
            status = 'completed'
        WHERE employee_id = ?
        AND shift = ?
        AND status = 'open'
        AND date BETWEEN ? AND ?
        AND check_in <= ?
        ORDER BY date DESC
        LIMIT 1
        "#,
    )
    .bind(at)
    .bind(located.point.map(|p| p.lat))
    .bind(located.point.map(|p| p.lon))
    .bind(payload.address.as_deref())
    .bind(located.distance_meters)
    .bind(employee_id)
    .bind(payload.shift.as_ref())
    .bind(earliest)
    .bind(at.date())
    .bind(at)
    .execute(source.pool())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Check-out failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "No open check-in found for this shift"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Checked out successfully",
        "shift": payload.shift,
        "check_out": at,
        "location": located.verdict
    })))
}

use crate::api::activity::UpsertActivity;
use crate::api::attendance::ShiftPunch;
use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse, LeaveResponse, LeaveType};
use crate::api::permission::{CreatePermission, PermissionResponse};
use crate::api::report::ReportResponse;
use crate::model::activity_log::ActivityLog;
use crate::model::attendance::ShiftLocation;
use crate::report::daily_status::{DailyStatus, DailyStatusRecord, ShiftDetail};
use crate::report::period::{DateRange, FetchKind, PeriodReport, PeriodStats, ReportWarning};
use crate::rules::geofence::{Coordinate, LocationVerdict};
use crate::rules::lateness::{GracePolicy, Shift, StaffRole};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Presensi API",
        version = "1.0.0",
        description = r#"
## Employee Attendance

Shift-based check-in and check-out with office geofencing, leave and
permission requests, a daily activity log, and per-period attendance reports.

### Key Features
- **Attendance**
  - Check in and out per shift (morning / night), validated against the office radius
  - Lateness computed from the staff category's shift cutoff
- **Reports**
  - One status per calendar day with on-time, late, leave, permission and absence totals
  - The same report as an XLSX workbook
- **Leave & Permission**
  - Submit requests, HR/Admin approve or reject
- **Activity Log**
  - One free-text entry per employee per day

### Security
All endpoints require a **JWT Bearer** access token. Employees see their own
data; **Admin** and **HR** may read any employee and review requests.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,

        crate::api::report::period_report,
        crate::api::report::export_report,

        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::permission::permission_list,
        crate::api::permission::create_permission,
        crate::api::permission::approve_permission,
        crate::api::permission::reject_permission,

        crate::api::activity::list_activity,
        crate::api::activity::upsert_activity
    ),
    components(
        schemas(
            ShiftPunch,
            Shift,
            Coordinate,
            LocationVerdict,
            ShiftLocation,
            StaffRole,
            GracePolicy,
            DailyStatus,
            ShiftDetail,
            DailyStatusRecord,
            DateRange,
            PeriodStats,
            FetchKind,
            ReportWarning,
            PeriodReport,
            ReportResponse,
            LeaveType,
            CreateLeave,
            LeaveFilter,
            LeaveResponse,
            LeaveListResponse,
            CreatePermission,
            PermissionResponse,
            UpsertActivity,
            ActivityLog
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Shift check-in and check-out"),
        (name = "Report", description = "Per-period attendance reports"),
        (name = "Leave", description = "Leave requests and review"),
        (name = "Permission", description = "Short permission requests and review"),
        (name = "Activity", description = "Daily activity log"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

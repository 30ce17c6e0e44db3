use std::future::Future;

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::attendance::AttendanceShiftRecord;
use crate::model::leave_request::LeaveInterval;
use crate::model::permission::PermissionInterval;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Where the aggregator gets its rows from.
///
/// Leave and permission fetches return approved intervals only.
pub trait AttendanceSource {
    fn fetch_attendance(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<AttendanceShiftRecord>, SourceError>> + Send;

    fn fetch_approved_leave(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<LeaveInterval>, SourceError>> + Send;

    fn fetch_approved_permission(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<PermissionInterval>, SourceError>> + Send;

    /// Raw position text, `None` when there is no such employee.
    fn employee_role(
        &self,
        employee_id: u64,
    ) -> impl Future<Output = Result<Option<String>, SourceError>> + Send;
}

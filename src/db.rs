use std::time::Duration;

use chrono::NaiveDate;
use moka::future::Cache;
use sqlx::MySqlPool;

use crate::model::attendance::{AttendanceRow, AttendanceShiftRecord};
use crate::model::employee::Employee;
use crate::model::leave_request::{LeaveInterval, LeaveRequest};
use crate::model::permission::{PermissionInterval, PermissionRequest};
use crate::report::source::{AttendanceSource, SourceError};

pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    MySqlPool::connect(database_url).await
}

/// Record source backed by the MySQL pool.
///
/// Positions are cached per employee so repeated reports do not hit the
/// `employees` table every time.
#[derive(Clone)]
pub struct MySqlAttendanceSource {
    pool: MySqlPool,
    roles: Cache<u64, String>,
}

impl MySqlAttendanceSource {
    pub fn new(pool: MySqlPool, role_ttl: Duration) -> Self {
        Self {
            pool,
            roles: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(role_ttl)
                .build(),
        }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub async fn fetch_employee(&self, employee_id: u64) -> Result<Option<Employee>, SourceError> {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, employee_code, full_name, position, status
            FROM employees
            WHERE id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }
}

impl AttendanceSource for MySqlAttendanceSource {
    async fn fetch_attendance(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceShiftRecord>, SourceError> {
        let rows = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, employee_id, date, shift, shift_start, check_in, check_out,
                   check_in_lat, check_in_lon, check_in_address, check_in_distance,
                   check_out_lat, check_out_lon, check_out_address, check_out_distance,
                   status
            FROM attendance
            WHERE employee_id = ?
            AND date BETWEEN ? AND ?
            ORDER BY date, shift
            "#,
        )
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(AttendanceRow::into_record).collect())
    }

    async fn fetch_approved_leave(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LeaveInterval>, SourceError> {
        let rows = sqlx::query_as::<_, LeaveRequest>(
            r#"
            SELECT id, employee_id, start_date, end_date, leave_type, half_day, status
            FROM leave_requests
            WHERE employee_id = ?
            AND status = 'approved'
            AND start_date <= ?
            AND end_date >= ?
            ORDER BY start_date
            "#,
        )
        .bind(employee_id)
        .bind(end)
        .bind(start)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LeaveInterval::from).collect())
    }

    async fn fetch_approved_permission(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PermissionInterval>, SourceError> {
        let rows = sqlx::query_as::<_, PermissionRequest>(
            r#"
            SELECT id, employee_id, start_date, end_date, reason, status
            FROM permission_requests
            WHERE employee_id = ?
            AND status = 'approved'
            AND start_date <= ?
            AND end_date >= ?
            ORDER BY start_date
            "#,
        )
        .bind(employee_id)
        .bind(end)
        .bind(start)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PermissionInterval::from).collect())
    }

    async fn employee_role(&self, employee_id: u64) -> Result<Option<String>, SourceError> {
        if let Some(position) = self.roles.get(&employee_id).await {
            return Ok(Some(position));
        }

        let position = sqlx::query_scalar::<_, String>(
            "SELECT position FROM employees WHERE id = ?",
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(p) = &position {
            self.roles.insert(employee_id, p.clone()).await;
        }

        Ok(position)
    }
}

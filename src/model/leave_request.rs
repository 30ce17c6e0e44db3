use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `leave_requests` table row.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: String,
    pub half_day: bool,
    pub status: String,
}

/// An approved leave, as the status derivation sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeaveInterval {
    #[schema(example = "2025-01-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2025-01-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub category: String,
    pub half_day: bool,
}

impl LeaveInterval {
    pub fn is_sick(&self) -> bool {
        self.category.to_lowercase().contains("sick")
    }
}

impl From<LeaveRequest> for LeaveInterval {
    fn from(row: LeaveRequest) -> Self {
        Self {
            start_date: row.start_date,
            end_date: row.end_date,
            category: row.leave_type,
            half_day: row.half_day,
        }
    }
}

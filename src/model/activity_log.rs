use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One employee's activity entry for one working day.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ActivityLog {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2025-01-13", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Patrolled parking area, logged visitor entries")]
    pub activity: String,
    #[schema(example = "2025-01-13T16:02:00Z", format = "date-time", value_type = Option<String>)]
    pub updated_at: Option<DateTime<Utc>>,
}

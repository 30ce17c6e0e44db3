use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct PermissionRequest {
    pub id: u64,
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PermissionInterval {
    #[schema(example = "2025-01-14", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2025-01-14", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

impl From<PermissionRequest> for PermissionInterval {
    fn from(row: PermissionRequest) -> Self {
        Self {
            start_date: row.start_date,
            end_date: row.end_date,
        }
    }
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1000,
        "employee_code": "NIP-198703122010011001",
        "full_name": "Budi Santoso",
        "position": "Security Guard",
        "status": "active"
    })
)]
pub struct Employee {
    #[schema(example = 1000)]
    pub id: u64,

    #[schema(example = "NIP-198703122010011001")]
    pub employee_code: String,

    #[schema(example = "Budi Santoso")]
    pub full_name: String,

    /// Free-text position as entered by HR.
    #[schema(example = "Security Guard")]
    pub position: String,

    #[schema(example = "active")]
    pub status: String,
}

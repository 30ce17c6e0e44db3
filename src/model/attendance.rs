use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::rules::geofence::Coordinate;
use crate::rules::lateness::Shift;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecordStatus {
    Open,
    Completed,
}

/// Where a check-in or check-out happened, as far as we know.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ShiftLocation {
    pub coordinate: Option<Coordinate>,
    #[schema(example = "Jl. Medan Merdeka Barat No. 7")]
    pub address: Option<String>,
    /// Meters from the office; `None` when the location is unknown.
    pub distance_meters: Option<f64>,
}

/// One check-in/check-out pair for one employee, date and shift.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendanceShiftRecord {
    #[schema(example = "2025-01-13", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub shift: Shift,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub shift_start: Option<NaiveDateTime>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub check_in: Option<NaiveDateTime>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub check_out: Option<NaiveDateTime>,
    pub check_in_location: ShiftLocation,
    pub check_out_location: ShiftLocation,
    pub status: RecordStatus,
}

/// `attendance` table row.
#[derive(Debug, sqlx::FromRow)]
pub struct AttendanceRow {
    pub id: u64,
    pub employee_id: u64,
    pub date: NaiveDate,
    pub shift: String,
    pub shift_start: Option<NaiveDateTime>,
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub check_in_lat: Option<f64>,
    pub check_in_lon: Option<f64>,
    pub check_in_address: Option<String>,
    pub check_in_distance: Option<f64>,
    pub check_out_lat: Option<f64>,
    pub check_out_lon: Option<f64>,
    pub check_out_address: Option<String>,
    pub check_out_distance: Option<f64>,
    pub status: String,
}

impl AttendanceRow {
    /// Converts the row, or `None` when the shift label is not one we know.
    pub fn into_record(self) -> Option<AttendanceShiftRecord> {
        let shift = match self.shift.parse::<Shift>() {
            Ok(s) => s,
            Err(_) => {
                tracing::warn!(
                    attendance_id = self.id,
                    employee_id = self.employee_id,
                    shift = %self.shift,
                    "Skipping attendance row with unknown shift"
                );
                return None;
            }
        };

        let status = self.status.parse().unwrap_or(if self.check_out.is_some() {
            RecordStatus::Completed
        } else {
            RecordStatus::Open
        });

        Some(AttendanceShiftRecord {
            date: self.date,
            shift,
            shift_start: self.shift_start,
            check_in: self.check_in,
            check_out: self.check_out,
            check_in_location: ShiftLocation {
                coordinate: Coordinate::from_parts(self.check_in_lat, self.check_in_lon),
                address: self.check_in_address,
                distance_meters: self.check_in_distance,
            },
            check_out_location: ShiftLocation {
                coordinate: Coordinate::from_parts(self.check_out_lat, self.check_out_lon),
                address: self.check_out_address,
                distance_meters: self.check_out_distance,
            },
            status,
        })
    }
}

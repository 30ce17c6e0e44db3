use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Shift {
    Morning,
    Night,
}

/// Staff categories with their own shift cutoffs.
///
/// Resolved once from the free-text role on the employee row; everything
/// downstream matches on the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StaffRole {
    Security,
    Cleaning,
    Driver,
    SupportStaff,
    Default,
}

impl StaffRole {
    pub fn from_role_str(raw: &str) -> Self {
        let role = raw.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| role.contains(n));

        if has(&["security", "satpam"]) {
            StaffRole::Security
        } else if has(&["cleaning", "cleaner", "kebersihan"]) {
            StaffRole::Cleaning
        } else if has(&["driver", "sopir", "pengemudi"]) {
            StaffRole::Driver
        } else if has(&["support"]) {
            StaffRole::SupportStaff
        } else {
            StaffRole::Default
        }
    }
}

/// Grace window added to the cutoff before a check-in counts as late.
///
/// Check-in and the reporting view disagree on the window; both are kept
/// until the office settles on one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GracePolicy {
    #[default]
    #[serde(alias = "strict")]
    StrictCheckIn,
    #[serde(alias = "tolerance")]
    ReportingTolerance,
}

impl GracePolicy {
    pub const STRICT_CHECK_IN_MINUTES: i64 = 0;
    pub const REPORTING_TOLERANCE_MINUTES: i64 = 10;

    pub fn minutes(self) -> i64 {
        match self {
            GracePolicy::StrictCheckIn => Self::STRICT_CHECK_IN_MINUTES,
            GracePolicy::ReportingTolerance => Self::REPORTING_TOLERANCE_MINUTES,
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

/// Latest on-time check-in for a role and shift, before any grace.
pub fn cutoff_for(role: StaffRole, shift: Shift) -> NaiveTime {
    match (role, shift) {
        (StaffRole::Security, Shift::Morning) => hm(7, 5),
        (StaffRole::Security, Shift::Night) => hm(18, 5),
        (StaffRole::Cleaning, Shift::Morning) => hm(7, 30),
        (_, Shift::Morning) => hm(8, 0),
        (_, Shift::Night) => hm(19, 0),
    }
}

/// Expected start when a record carries no explicit shift start.
pub fn default_shift_start(role: StaffRole, shift: Shift) -> NaiveTime {
    match (role, shift) {
        (StaffRole::Security, Shift::Morning) => hm(7, 0),
        (StaffRole::Security, Shift::Night) => hm(18, 0),
        (StaffRole::Cleaning, Shift::Morning) => hm(7, 30),
        (_, Shift::Morning) => hm(8, 0),
        (_, Shift::Night) => hm(19, 0),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Lateness {
    pub minutes_late: i64,
    pub is_late: bool,
}

pub fn lateness(check_in: NaiveDateTime, cutoff: NaiveTime, grace: GracePolicy) -> Lateness {
    let threshold = check_in.date().and_time(cutoff) + Duration::minutes(grace.minutes());
    let minutes_late = (check_in - threshold).num_minutes().max(0);

    Lateness {
        minutes_late,
        is_late: minutes_late > 0,
    }
}

/// Lateness of a check-in against the role's cutoff for the shift.
pub fn lateness_for(
    role: StaffRole,
    shift: Shift,
    check_in: NaiveDateTime,
    grace: GracePolicy,
) -> Lateness {
    lateness(check_in, cutoff_for(role, shift), grace)
}

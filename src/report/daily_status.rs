use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use strum_macros::{AsRefStr, Display};
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceShiftRecord, ShiftLocation};
use crate::model::leave_request::LeaveInterval;
use crate::model::permission::PermissionInterval;
use crate::rules::lateness::{self, GracePolicy, Shift, StaffRole};

/// Canonical classification of one employee's calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DailyStatus {
    Off,
    OnTime,
    DoubleShiftOnTime,
    Late,
    DoubleShiftLate,
    MultipleLate,
    HalfDayLeave,
    SickLeave,
    Leave,
    Permission,
    Absent,
    Unmarked,
}

/// Counter a status folds into. `Off` and `Unmarked` fold into nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatBucket {
    OnTime,
    Late,
    Leave,
    HalfDayLeave,
    Permission,
    Absent,
}

impl DailyStatus {
    pub fn label(self) -> &'static str {
        match self {
            DailyStatus::Off => "Off (weekend)",
            DailyStatus::OnTime => "Present (on time)",
            DailyStatus::DoubleShiftOnTime => "Present, two shifts (on time)",
            DailyStatus::Late => "Present (late)",
            DailyStatus::DoubleShiftLate => "Present, two shifts (one late)",
            DailyStatus::MultipleLate => "Present (multiple late)",
            DailyStatus::HalfDayLeave => "Leave (half day)",
            DailyStatus::SickLeave => "Leave/Sick",
            DailyStatus::Leave => "Leave",
            DailyStatus::Permission => "Permission",
            DailyStatus::Absent => "Absent",
            DailyStatus::Unmarked => "Unmarked",
        }
    }

    pub fn bucket(self) -> Option<StatBucket> {
        match self {
            DailyStatus::OnTime | DailyStatus::DoubleShiftOnTime => Some(StatBucket::OnTime),
            DailyStatus::Late | DailyStatus::DoubleShiftLate | DailyStatus::MultipleLate => {
                Some(StatBucket::Late)
            }
            DailyStatus::SickLeave | DailyStatus::Leave => Some(StatBucket::Leave),
            DailyStatus::HalfDayLeave => Some(StatBucket::HalfDayLeave),
            DailyStatus::Permission => Some(StatBucket::Permission),
            DailyStatus::Absent => Some(StatBucket::Absent),
            DailyStatus::Off | DailyStatus::Unmarked => None,
        }
    }

    pub fn is_present(self) -> bool {
        matches!(self.bucket(), Some(StatBucket::OnTime | StatBucket::Late))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ShiftDetail {
    pub shift: Shift,
    #[schema(format = "date-time", value_type = String)]
    pub shift_start: NaiveDateTime,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub check_in: Option<NaiveDateTime>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub check_out: Option<NaiveDateTime>,
    pub check_in_location: ShiftLocation,
    pub check_out_location: ShiftLocation,
    pub minutes_late: i64,
    pub is_late: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyStatusRecord {
    #[schema(example = "2025-01-13", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub status: DailyStatus,
    #[schema(example = "Present (late)")]
    pub label: String,
    pub shifts: Vec<ShiftDetail>,
    pub notes: Option<String>,
}

impl DailyStatusRecord {
    fn new(date: NaiveDate, status: DailyStatus) -> Self {
        Self {
            date,
            status,
            label: status.label().to_string(),
            shifts: Vec::new(),
            notes: None,
        }
    }

    pub fn minutes_late(&self) -> i64 {
        self.shifts.iter().map(|s| s.minutes_late).sum()
    }
}

/// An inclusive date interval taking part in status derivation.
pub trait DateSpan {
    fn start(&self) -> NaiveDate;
    fn end(&self) -> NaiveDate;

    fn is_well_formed(&self) -> bool {
        self.start() <= self.end()
    }

    fn contains(&self, date: NaiveDate) -> bool {
        self.start() <= date && date <= self.end()
    }
}

impl DateSpan for LeaveInterval {
    fn start(&self) -> NaiveDate {
        self.start_date
    }

    fn end(&self) -> NaiveDate {
        self.end_date
    }
}

impl DateSpan for PermissionInterval {
    fn start(&self) -> NaiveDate {
        self.start_date
    }

    fn end(&self) -> NaiveDate {
        self.end_date
    }
}

/// First well-formed interval covering `date`; malformed ones are skipped.
pub fn find_covering<T: DateSpan>(spans: &[T], date: NaiveDate) -> Option<&T> {
    spans.iter().find(|span| {
        if !span.is_well_formed() {
            tracing::debug!(
                start = %span.start(),
                end = %span.end(),
                "Ignoring interval that ends before it starts"
            );
            return false;
        }
        span.contains(date)
    })
}

/// Everything known about one employee on one calendar date.
#[derive(Debug, Clone, Copy)]
pub struct DayInput<'a> {
    pub date: NaiveDate,
    pub role: StaffRole,
    pub attendance: &'a [AttendanceShiftRecord],
    pub leave: &'a [LeaveInterval],
    pub permission: &'a [PermissionInterval],
    pub is_weekend: bool,
    pub today: NaiveDate,
    pub grace: GracePolicy,
}

fn shift_detail(
    record: &AttendanceShiftRecord,
    role: StaffRole,
    grace: GracePolicy,
) -> ShiftDetail {
    let late = record
        .check_in
        .map(|at| lateness::lateness_for(role, record.shift, at, grace))
        .unwrap_or(lateness::Lateness {
            minutes_late: 0,
            is_late: false,
        });

    let shift_start = record.shift_start.unwrap_or_else(|| {
        record
            .date
            .and_time(lateness::default_shift_start(role, record.shift))
    });

    ShiftDetail {
        shift: record.shift,
        shift_start,
        check_in: record.check_in,
        check_out: record.check_out,
        check_in_location: record.check_in_location.clone(),
        check_out_location: record.check_out_location.clone(),
        minutes_late: late.minutes_late,
        is_late: late.is_late,
    }
}

fn presence_status(shifts: &[ShiftDetail]) -> DailyStatus {
    let late = shifts.iter().filter(|s| s.is_late).count();
    let double = shifts.len() > 1;

    match (late, double) {
        (0, false) => DailyStatus::OnTime,
        (0, true) => DailyStatus::DoubleShiftOnTime,
        (1, false) => DailyStatus::Late,
        (1, true) => DailyStatus::DoubleShiftLate,
        _ => DailyStatus::MultipleLate,
    }
}

/// Resolves one day. Rules are tried in order and the first match wins.
pub fn reduce_day(input: DayInput<'_>) -> DailyStatusRecord {
    let DayInput {
        date,
        role,
        attendance,
        leave,
        permission,
        is_weekend,
        today,
        grace,
    } = input;

    let mut worked: Vec<&AttendanceShiftRecord> = attendance
        .iter()
        .filter(|r| r.date == date && r.check_in.is_some())
        .collect();
    worked.sort_by_key(|r| (r.shift as u8, r.check_in));

    if is_weekend && worked.is_empty() {
        return DailyStatusRecord::new(date, DailyStatus::Off);
    }

    if !worked.is_empty() {
        let shifts: Vec<ShiftDetail> = worked
            .into_iter()
            .map(|r| shift_detail(r, role, grace))
            .collect();
        let mut record = DailyStatusRecord::new(date, presence_status(&shifts));
        record.shifts = shifts;
        return record;
    }

    if let Some(interval) = find_covering(leave, date) {
        let status = if interval.half_day {
            DailyStatus::HalfDayLeave
        } else if interval.is_sick() {
            DailyStatus::SickLeave
        } else {
            DailyStatus::Leave
        };
        let mut record = DailyStatusRecord::new(date, status);
        record.notes = Some(interval.category.clone());
        return record;
    }

    if find_covering(permission, date).is_some() {
        return DailyStatusRecord::new(date, DailyStatus::Permission);
    }

    if !is_weekend && date < today {
        return DailyStatusRecord::new(date, DailyStatus::Absent);
    }

    DailyStatusRecord::new(date, DailyStatus::Unmarked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::RecordStatus;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn shift_record(day: u32, shift: Shift, h: u32, m: u32) -> AttendanceShiftRecord {
        AttendanceShiftRecord {
            date: d(day),
            shift,
            shift_start: None,
            check_in: d(day).and_hms_opt(h, m, 0),
            check_out: None,
            check_in_location: ShiftLocation::default(),
            check_out_location: ShiftLocation::default(),
            status: RecordStatus::Open,
        }
    }

    fn leave(start: u32, end: u32, category: &str, half_day: bool) -> LeaveInterval {
        LeaveInterval {
            start_date: d(start),
            end_date: d(end),
            category: category.to_string(),
            half_day,
        }
    }

    // 2025-01-13 is a Monday; "today" sits after the whole month of January.
    fn input<'a>(
        day: u32,
        attendance: &'a [AttendanceShiftRecord],
        leave: &'a [LeaveInterval],
        permission: &'a [PermissionInterval],
    ) -> DayInput<'a> {
        DayInput {
            date: d(day),
            role: StaffRole::Default,
            attendance,
            leave,
            permission,
            is_weekend: false,
            today: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            grace: GracePolicy::StrictCheckIn,
        }
    }

    #[test]
    fn weekend_without_attendance_is_off() {
        let leaves = [leave(11, 11, "annual", false)];
        let day = DayInput {
            is_weekend: true,
            ..input(11, &[], &leaves, &[])
        };
        let record = reduce_day(day);
        assert_eq!(record.status, DailyStatus::Off);
        assert_eq!(record.status.bucket(), None);
    }

    #[test]
    fn weekend_with_attendance_counts_as_present() {
        let att = [shift_record(11, Shift::Morning, 7, 45)];
        let day = DayInput {
            is_weekend: true,
            ..input(11, &att, &[], &[])
        };
        assert_eq!(reduce_day(day).status, DailyStatus::OnTime);
    }

    #[test]
    fn single_shift_late_keeps_minutes() {
        let att = [shift_record(13, Shift::Morning, 8, 25)];
        let record = reduce_day(input(13, &att, &[], &[]));
        assert_eq!(record.status, DailyStatus::Late);
        assert_eq!(record.shifts.len(), 1);
        assert_eq!(record.shifts[0].minutes_late, 25);
        assert_eq!(record.minutes_late(), 25);
    }

    #[test]
    fn two_on_time_shifts_have_their_own_variant() {
        let att = [
            shift_record(13, Shift::Night, 18, 50),
            shift_record(13, Shift::Morning, 7, 50),
        ];
        let record = reduce_day(input(13, &att, &[], &[]));
        assert_eq!(record.status, DailyStatus::DoubleShiftOnTime);
        assert_ne!(record.label, DailyStatus::OnTime.label());
        assert_eq!(record.shifts[0].shift, Shift::Morning);
    }

    #[test]
    fn two_shifts_one_late() {
        let att = [
            shift_record(13, Shift::Morning, 7, 50),
            shift_record(13, Shift::Night, 19, 20),
        ];
        let record = reduce_day(input(13, &att, &[], &[]));
        assert_eq!(record.status, DailyStatus::DoubleShiftLate);
        assert_eq!(record.minutes_late(), 20);
    }

    #[test]
    fn two_shifts_both_late() {
        let att = [
            shift_record(13, Shift::Morning, 8, 10),
            shift_record(13, Shift::Night, 19, 5),
        ];
        let record = reduce_day(input(13, &att, &[], &[]));
        assert_eq!(record.status, DailyStatus::MultipleLate);
        assert_eq!(record.minutes_late(), 15);
    }

    #[test]
    fn grace_policy_changes_classification() {
        let att = [shift_record(13, Shift::Morning, 8, 6)];
        let strict = reduce_day(input(13, &att, &[], &[]));
        let tolerant = reduce_day(DayInput {
            grace: GracePolicy::ReportingTolerance,
            ..input(13, &att, &[], &[])
        });
        assert_eq!(strict.status, DailyStatus::Late);
        assert_eq!(tolerant.status, DailyStatus::OnTime);
    }

    #[test]
    fn shift_start_defaults_from_role() {
        let att = [shift_record(13, Shift::Morning, 7, 6)];
        let record = reduce_day(DayInput {
            role: StaffRole::Security,
            ..input(13, &att, &[], &[])
        });
        assert_eq!(record.status, DailyStatus::Late);
        assert_eq!(record.shifts[0].minutes_late, 1);
        assert_eq!(record.shifts[0].shift_start, d(13).and_hms_opt(7, 0, 0).unwrap());
    }

    #[test]
    fn attendance_wins_over_leave() {
        let att = [shift_record(13, Shift::Morning, 7, 50)];
        let leaves = [leave(13, 13, "annual", false)];
        assert_eq!(
            reduce_day(input(13, &att, &leaves, &[])).status,
            DailyStatus::OnTime
        );
    }

    #[test]
    fn record_without_check_in_is_not_attendance() {
        let mut open = shift_record(13, Shift::Morning, 7, 50);
        open.check_in = None;
        let att = [open];
        assert_eq!(
            reduce_day(input(13, &att, &[], &[])).status,
            DailyStatus::Absent
        );
    }

    #[test]
    fn leave_subtypes() {
        let sick = [leave(10, 12, "Sick", false)];
        let record = reduce_day(input(11, &[], &sick, &[]));
        assert_eq!(record.status, DailyStatus::SickLeave);
        assert_eq!(record.label, "Leave/Sick");
        assert_eq!(record.notes.as_deref(), Some("Sick"));

        let half = [leave(10, 10, "sick", true)];
        assert_eq!(
            reduce_day(input(10, &[], &half, &[])).status,
            DailyStatus::HalfDayLeave
        );

        let annual = [leave(10, 10, "annual", false)];
        assert_eq!(
            reduce_day(input(10, &[], &annual, &[])).status,
            DailyStatus::Leave
        );
    }

    #[test]
    fn interval_bounds_are_inclusive() {
        let leaves = [leave(10, 12, "annual", false)];
        assert_eq!(reduce_day(input(10, &[], &leaves, &[])).status, DailyStatus::Leave);
        assert_eq!(reduce_day(input(12, &[], &leaves, &[])).status, DailyStatus::Leave);
        assert_eq!(reduce_day(input(13, &[], &leaves, &[])).status, DailyStatus::Absent);
    }

    #[test]
    fn leave_wins_over_permission() {
        let leaves = [leave(14, 14, "annual", false)];
        let permissions = [PermissionInterval {
            start_date: d(14),
            end_date: d(14),
        }];
        assert_eq!(
            reduce_day(input(14, &[], &leaves, &permissions)).status,
            DailyStatus::Leave
        );
        assert_eq!(
            reduce_day(input(14, &[], &[], &permissions)).status,
            DailyStatus::Permission
        );
    }

    #[test]
    fn malformed_interval_is_skipped() {
        let leaves = [leave(15, 10, "annual", false), leave(12, 12, "sick", false)];
        assert_eq!(
            reduce_day(input(12, &[], &leaves, &[])).status,
            DailyStatus::SickLeave
        );
        assert_eq!(
            reduce_day(input(11, &[], &leaves, &[])).status,
            DailyStatus::Absent
        );
    }

    #[test]
    fn past_weekday_without_facts_is_absent() {
        let record = reduce_day(input(13, &[], &[], &[]));
        assert_eq!(record.status, DailyStatus::Absent);
        assert_eq!(record.status.bucket(), Some(StatBucket::Absent));
    }

    #[test]
    fn today_and_future_are_unmarked() {
        let today = DayInput {
            today: d(13),
            ..input(13, &[], &[], &[])
        };
        assert_eq!(reduce_day(today).status, DailyStatus::Unmarked);

        let future = DayInput {
            today: d(13),
            ..input(20, &[], &[], &[])
        };
        let record = reduce_day(future);
        assert_eq!(record.status, DailyStatus::Unmarked);
        assert_eq!(record.status.bucket(), None);
    }

    #[test]
    fn records_for_other_dates_are_ignored() {
        let att = [shift_record(14, Shift::Morning, 7, 50)];
        assert_eq!(
            reduce_day(input(13, &att, &[], &[])).status,
            DailyStatus::Absent
        );
    }
}

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate, Weekday};
use serde::Serialize;
use strum_macros::Display;
use thiserror::Error;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::model::attendance::AttendanceShiftRecord;
use crate::model::leave_request::LeaveInterval;
use crate::model::permission::PermissionInterval;
use crate::report::daily_status::{
    DailyStatusRecord, DateSpan, DayInput, StatBucket, reduce_day,
};
use crate::report::source::{AttendanceSource, SourceError};
use crate::rules::lateness::{GracePolicy, StaffRole};

#[derive(Debug, Error, PartialEq)]
pub enum ReportError {
    #[error("range end {end} is before start {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("range of {days} days exceeds the limit of {max} days")]
    RangeTooLarge { days: i64, max: i64 },

    #[error("employee {0} not found")]
    EmployeeNotFound(u64),

    #[error("attendance data unavailable: {0}")]
    SourceUnavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DateRange {
    #[schema(example = "2025-01-01", format = "date", value_type = String)]
    pub start: NaiveDate,
    #[schema(example = "2025-01-31", format = "date", value_type = String)]
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ReportError> {
        if end < start {
            return Err(ReportError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The whole calendar month containing `year`-`month`.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = start.checked_add_months(Months::new(1))?.pred_opt()?;
        Some(Self { start, end })
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Every date in the range, ascending, ends included.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// Which weekdays the office is closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkCalendar {
    weekend: Vec<Weekday>,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self {
            weekend: vec![Weekday::Sat, Weekday::Sun],
        }
    }
}

impl WorkCalendar {
    pub fn new(weekend: Vec<Weekday>) -> Self {
        Self { weekend }
    }

    /// Parses a comma separated list such as `sat,sun` or `Friday, Saturday`.
    pub fn parse(list: &str) -> Option<Self> {
        let weekend = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<Weekday>().ok())
            .collect::<Option<Vec<_>>>()?;
        Some(Self::new(weekend))
    }

    pub fn is_weekend(&self, date: NaiveDate) -> bool {
        self.weekend.contains(&date.weekday())
    }
}

/// Immutable rows for one employee and one range, as fetched.
#[derive(Debug, Clone, Default)]
pub struct RecordSnapshot {
    pub attendance: Vec<AttendanceShiftRecord>,
    pub leave: Vec<LeaveInterval>,
    pub permission: Vec<PermissionInterval>,
}

impl RecordSnapshot {
    /// Drops intervals that end before they start, logging each one once.
    pub fn without_malformed_intervals(mut self) -> Self {
        fn keep<T: DateSpan>(kind: &str, spans: &mut Vec<T>) {
            spans.retain(|s| {
                let ok = s.is_well_formed();
                if !ok {
                    warn!(
                        kind,
                        start = %s.start(),
                        end = %s.end(),
                        "Skipping malformed interval"
                    );
                }
                ok
            });
        }

        keep("leave", &mut self.leave);
        keep("permission", &mut self.permission);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PeriodStats {
    pub on_time_days: u32,
    pub late_days: u32,
    /// Full-day leave, sick leave included.
    pub leave_days: u32,
    /// Half-day leave, kept out of `leave_days`.
    pub half_day_leave_days: u32,
    pub permission_days: u32,
    pub absent_days: u32,
    pub total_late_minutes: i64,
    pub total_days: u32,
}

impl PeriodStats {
    pub fn record(&mut self, day: &DailyStatusRecord) {
        self.total_days += 1;

        let Some(bucket) = day.status.bucket() else {
            return;
        };
        match bucket {
            StatBucket::OnTime => self.on_time_days += 1,
            StatBucket::Late => {
                self.late_days += 1;
                self.total_late_minutes += day.minutes_late();
            }
            StatBucket::Leave => self.leave_days += 1,
            StatBucket::HalfDayLeave => self.half_day_leave_days += 1,
            StatBucket::Permission => self.permission_days += 1,
            StatBucket::Absent => self.absent_days += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FetchKind {
    Attendance,
    Leave,
    Permission,
}

/// A collaborator failed but the report was still produced without it.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReportWarning {
    pub source: FetchKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PeriodReport {
    pub employee_id: u64,
    pub role: StaffRole,
    pub range: DateRange,
    pub grace: GracePolicy,
    pub days: Vec<DailyStatusRecord>,
    pub stats: PeriodStats,
    pub warnings: Vec<ReportWarning>,
}

/// One record per date of `range`, in order, plus the folded counters.
pub fn build_period(
    range: DateRange,
    role: StaffRole,
    snapshot: &RecordSnapshot,
    calendar: &WorkCalendar,
    today: NaiveDate,
    grace: GracePolicy,
) -> (Vec<DailyStatusRecord>, PeriodStats) {
    let mut by_date: BTreeMap<NaiveDate, Vec<AttendanceShiftRecord>> = BTreeMap::new();
    for record in &snapshot.attendance {
        by_date.entry(record.date).or_default().push(record.clone());
    }

    let mut stats = PeriodStats::default();
    let days: Vec<DailyStatusRecord> = range
        .days()
        .map(|date| {
            let attendance = by_date.get(&date).map(Vec::as_slice).unwrap_or(&[]);
            let record = reduce_day(DayInput {
                date,
                role,
                attendance,
                leave: &snapshot.leave,
                permission: &snapshot.permission,
                is_weekend: calendar.is_weekend(date),
                today,
                grace,
            });
            stats.record(&record);
            record
        })
        .collect();

    (days, stats)
}

fn or_warn<T>(
    kind: FetchKind,
    employee_id: u64,
    result: Result<Vec<T>, SourceError>,
    warnings: &mut Vec<ReportWarning>,
) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, employee_id, source = %kind, "Fetch failed, continuing without it");
            warnings.push(ReportWarning {
                source: kind,
                message: e.to_string(),
            });
            Vec::new()
        }
    }
}

/// Fetches one employee's rows for a range and folds them into a report.
pub struct PeriodAggregator<'a, S> {
    source: &'a S,
    calendar: &'a WorkCalendar,
    max_days: i64,
}

impl<'a, S: AttendanceSource> PeriodAggregator<'a, S> {
    pub fn new(source: &'a S, calendar: &'a WorkCalendar, max_days: i64) -> Self {
        Self {
            source,
            calendar,
            max_days,
        }
    }

    pub async fn aggregate(
        &self,
        range: DateRange,
        employee_id: u64,
        today: NaiveDate,
        grace: GracePolicy,
    ) -> Result<PeriodReport, ReportError> {
        let days = range.num_days();
        if days > self.max_days {
            return Err(ReportError::RangeTooLarge {
                days,
                max: self.max_days,
            });
        }

        let role = match self.source.employee_role(employee_id).await {
            Ok(Some(raw)) => StaffRole::from_role_str(&raw),
            Ok(None) => return Err(ReportError::EmployeeNotFound(employee_id)),
            Err(e) => {
                warn!(error = %e, employee_id, "Failed to resolve employee role");
                return Err(ReportError::SourceUnavailable(e.to_string()));
            }
        };

        let (attendance, leave, permission) = futures::join!(
            self.source.fetch_attendance(employee_id, range.start, range.end),
            self.source.fetch_approved_leave(employee_id, range.start, range.end),
            self.source.fetch_approved_permission(employee_id, range.start, range.end),
        );

        if let (Err(a), Err(_), Err(_)) = (&attendance, &leave, &permission) {
            return Err(ReportError::SourceUnavailable(a.to_string()));
        }

        let mut warnings = Vec::new();
        let snapshot = RecordSnapshot {
            attendance: or_warn(FetchKind::Attendance, employee_id, attendance, &mut warnings),
            leave: or_warn(FetchKind::Leave, employee_id, leave, &mut warnings),
            permission: or_warn(FetchKind::Permission, employee_id, permission, &mut warnings),
        }
        .without_malformed_intervals();

        debug!(
            employee_id,
            attendance = snapshot.attendance.len(),
            leave = snapshot.leave.len(),
            permission = snapshot.permission.len(),
            "Snapshot fetched"
        );

        let (days, stats) = build_period(range, role, &snapshot, self.calendar, today, grace);

        info!(
            employee_id,
            start = %range.start,
            end = %range.end,
            absent = stats.absent_days,
            late = stats.late_days,
            "Period report computed"
        );

        Ok(PeriodReport {
            employee_id,
            role,
            range,
            grace,
            days,
            stats,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::{RecordStatus, ShiftLocation};
    use crate::report::daily_status::DailyStatus;
    use crate::rules::lateness::Shift;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    fn checked_in(date: NaiveDate, shift: Shift, h: u32, m: u32) -> AttendanceShiftRecord {
        AttendanceShiftRecord {
            date,
            shift,
            shift_start: None,
            check_in: date.and_hms_opt(h, m, 0),
            check_out: date
                .and_hms_opt(h, m, 0)
                .map(|at| at + chrono::Duration::hours(8)),
            check_in_location: ShiftLocation::default(),
            check_out_location: ShiftLocation::default(),
            status: RecordStatus::Completed,
        }
    }

    fn january() -> DateRange {
        DateRange::month(2025, 1).unwrap()
    }

    fn after_january() -> NaiveDate {
        d(2, 1)
    }

    #[derive(Default)]
    struct FakeSource {
        role: Option<String>,
        role_fails: bool,
        attendance: Option<Vec<AttendanceShiftRecord>>,
        leave: Option<Vec<LeaveInterval>>,
        permission: Option<Vec<PermissionInterval>>,
    }

    impl FakeSource {
        fn healthy(role: &str) -> Self {
            Self {
                role: Some(role.to_string()),
                attendance: Some(Vec::new()),
                leave: Some(Vec::new()),
                permission: Some(Vec::new()),
                ..Default::default()
            }
        }
    }

    fn rows<T: Clone>(rows: &Option<Vec<T>>) -> Result<Vec<T>, SourceError> {
        rows.clone()
            .ok_or_else(|| SourceError::Database(sqlx::Error::PoolClosed))
    }

    impl AttendanceSource for FakeSource {
        async fn fetch_attendance(
            &self,
            _employee_id: u64,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<AttendanceShiftRecord>, SourceError> {
            rows(&self.attendance)
        }

        async fn fetch_approved_leave(
            &self,
            _employee_id: u64,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<LeaveInterval>, SourceError> {
            rows(&self.leave)
        }

        async fn fetch_approved_permission(
            &self,
            _employee_id: u64,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<PermissionInterval>, SourceError> {
            rows(&self.permission)
        }

        async fn employee_role(&self, _employee_id: u64) -> Result<Option<String>, SourceError> {
            if self.role_fails {
                return Err(SourceError::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(self.role.clone())
        }
    }

    #[test]
    fn one_record_per_day_in_order() {
        let range = DateRange::new(d(1, 27), d(3, 3)).unwrap();
        let (days, stats) = build_period(
            range,
            StaffRole::Default,
            &RecordSnapshot::default(),
            &WorkCalendar::default(),
            after_january(),
            GracePolicy::StrictCheckIn,
        );

        assert_eq!(days.len() as i64, range.num_days());
        assert_eq!(stats.total_days as usize, days.len());
        assert_eq!(days.first().unwrap().date, range.start);
        assert_eq!(days.last().unwrap().date, range.end);
        for pair in days.windows(2) {
            assert_eq!(pair[0].date.succ_opt().unwrap(), pair[1].date);
        }
    }

    #[test]
    fn single_day_range() {
        let range = DateRange::new(d(1, 13), d(1, 13)).unwrap();
        assert_eq!(range.days().count(), 1);
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert_eq!(
            DateRange::new(d(1, 13), d(1, 12)),
            Err(ReportError::InvalidRange {
                start: d(1, 13),
                end: d(1, 12)
            })
        );
    }

    #[test]
    fn month_range_covers_whole_month() {
        let feb = DateRange::month(2024, 2).unwrap();
        assert_eq!(feb.end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(DateRange::month(2025, 13), None);
    }

    #[test]
    fn no_data_renders_weekends_and_absences() {
        let (days, stats) = build_period(
            january(),
            StaffRole::Default,
            &RecordSnapshot::default(),
            &WorkCalendar::default(),
            after_january(),
            GracePolicy::StrictCheckIn,
        );

        let off = days.iter().filter(|r| r.status == DailyStatus::Off).count();
        // January 2025 has 4 Saturdays and 4 Sundays
        assert_eq!(off, 8);
        assert_eq!(stats.absent_days, 23);
        assert_eq!(stats.on_time_days + stats.late_days + stats.leave_days, 0);
    }

    #[test]
    fn weekends_never_count() {
        let range = DateRange::new(d(1, 11), d(1, 12)).unwrap();
        let (days, stats) = build_period(
            range,
            StaffRole::Default,
            &RecordSnapshot::default(),
            &WorkCalendar::default(),
            after_january(),
            GracePolicy::StrictCheckIn,
        );

        assert!(days.iter().all(|r| r.status == DailyStatus::Off));
        assert_eq!(
            stats,
            PeriodStats {
                total_days: 2,
                ..Default::default()
            }
        );
    }

    #[test]
    fn sick_leave_counts_each_day() {
        let snapshot = RecordSnapshot {
            leave: vec![LeaveInterval {
                start_date: d(1, 10),
                end_date: d(1, 12),
                category: "Sick".to_string(),
                half_day: false,
            }],
            ..Default::default()
        };
        let range = DateRange::new(d(1, 10), d(1, 12)).unwrap();
        // Friday to Sunday would turn the weekend Off, so use a calendar without one
        let calendar = WorkCalendar::new(Vec::new());
        let (days, stats) = build_period(
            range,
            StaffRole::Default,
            &snapshot,
            &calendar,
            after_january(),
            GracePolicy::StrictCheckIn,
        );

        assert!(days.iter().all(|r| r.status == DailyStatus::SickLeave));
        assert!(days.iter().all(|r| r.label == "Leave/Sick"));
        assert_eq!(stats.leave_days, 3);
    }

    #[test]
    fn half_day_leave_has_its_own_counter() {
        let snapshot = RecordSnapshot {
            leave: vec![LeaveInterval {
                start_date: d(1, 14),
                end_date: d(1, 14),
                category: "annual".to_string(),
                half_day: true,
            }],
            ..Default::default()
        };
        let range = DateRange::new(d(1, 14), d(1, 14)).unwrap();
        let (_, stats) = build_period(
            range,
            StaffRole::Default,
            &snapshot,
            &WorkCalendar::default(),
            after_january(),
            GracePolicy::StrictCheckIn,
        );

        assert_eq!(stats.half_day_leave_days, 1);
        assert_eq!(stats.leave_days, 0);
    }

    #[test]
    fn two_shifts_count_once() {
        let snapshot = RecordSnapshot {
            attendance: vec![
                checked_in(d(1, 13), Shift::Morning, 7, 40),
                checked_in(d(1, 13), Shift::Night, 18, 40),
            ],
            ..Default::default()
        };
        let range = DateRange::new(d(1, 13), d(1, 13)).unwrap();
        let (days, stats) = build_period(
            range,
            StaffRole::Default,
            &snapshot,
            &WorkCalendar::default(),
            after_january(),
            GracePolicy::StrictCheckIn,
        );

        assert_eq!(days[0].status, DailyStatus::DoubleShiftOnTime);
        assert_eq!(stats.on_time_days, 1);
    }

    #[test]
    fn late_minutes_accumulate() {
        let snapshot = RecordSnapshot {
            attendance: vec![
                checked_in(d(1, 13), Shift::Morning, 8, 10),
                checked_in(d(1, 14), Shift::Morning, 8, 5),
                checked_in(d(1, 15), Shift::Morning, 7, 55),
            ],
            ..Default::default()
        };
        let range = DateRange::new(d(1, 13), d(1, 15)).unwrap();
        let (_, stats) = build_period(
            range,
            StaffRole::Default,
            &snapshot,
            &WorkCalendar::default(),
            after_january(),
            GracePolicy::StrictCheckIn,
        );

        assert_eq!(stats.late_days, 2);
        assert_eq!(stats.on_time_days, 1);
        assert_eq!(stats.total_late_minutes, 15);
    }

    #[test]
    fn permission_and_multiple_late_fold_into_counters() {
        let snapshot = RecordSnapshot {
            attendance: vec![
                checked_in(d(1, 13), Shift::Morning, 8, 5),
                checked_in(d(1, 13), Shift::Night, 19, 10),
            ],
            leave: vec![LeaveInterval {
                start_date: d(1, 17),
                end_date: d(1, 16),
                category: "annual".to_string(),
                half_day: false,
            }],
            permission: vec![PermissionInterval {
                start_date: d(1, 14),
                end_date: d(1, 15),
            }],
        };
        let range = DateRange::new(d(1, 13), d(1, 17)).unwrap();
        let (days, stats) = build_period(
            range,
            StaffRole::Default,
            &snapshot,
            &WorkCalendar::default(),
            after_january(),
            GracePolicy::StrictCheckIn,
        );

        let statuses: Vec<DailyStatus> = days.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                DailyStatus::MultipleLate,
                DailyStatus::Permission,
                DailyStatus::Permission,
                DailyStatus::Absent,
                DailyStatus::Absent,
            ]
        );
        assert_eq!(stats.permission_days, 2);
        assert_eq!(stats.late_days, 1);
        assert_eq!(stats.total_late_minutes, 15);
        assert_eq!(stats.absent_days, 2);
        assert_eq!(stats.leave_days, 0);
    }

    #[test]
    fn one_late_shift_of_two_is_double_shift_late() {
        let snapshot = RecordSnapshot {
            attendance: vec![
                checked_in(d(1, 13), Shift::Morning, 7, 50),
                checked_in(d(1, 13), Shift::Night, 19, 20),
            ],
            ..Default::default()
        };
        let range = DateRange::new(d(1, 13), d(1, 13)).unwrap();
        let (days, stats) = build_period(
            range,
            StaffRole::Default,
            &snapshot,
            &WorkCalendar::default(),
            after_january(),
            GracePolicy::StrictCheckIn,
        );

        assert_eq!(days[0].status, DailyStatus::DoubleShiftLate);
        assert_eq!(stats.late_days, 1);
        assert_eq!(stats.on_time_days, 0);
        assert_eq!(stats.total_late_minutes, 20);
    }

    #[test]
    fn future_days_stay_unmarked() {
        let (days, stats) = build_period(
            january(),
            StaffRole::Default,
            &RecordSnapshot::default(),
            &WorkCalendar::default(),
            d(1, 15),
            GracePolicy::StrictCheckIn,
        );

        let jan_20 = days.iter().find(|r| r.date == d(1, 20)).unwrap();
        assert_eq!(jan_20.status, DailyStatus::Unmarked);
        // weekdays 1..=14 minus the weekend of the 4th/5th and 11th/12th
        assert_eq!(stats.absent_days, 10);
    }

    #[test]
    fn malformed_intervals_are_dropped_from_snapshot() {
        let snapshot = RecordSnapshot {
            permission: vec![
                PermissionInterval {
                    start_date: d(1, 20),
                    end_date: d(1, 10),
                },
                PermissionInterval {
                    start_date: d(1, 13),
                    end_date: d(1, 13),
                },
            ],
            ..Default::default()
        }
        .without_malformed_intervals();

        assert_eq!(snapshot.permission.len(), 1);
    }

    #[test]
    fn weekend_days_parse() {
        let calendar = WorkCalendar::parse("fri, sat").unwrap();
        assert!(calendar.is_weekend(d(1, 10)));
        assert!(!calendar.is_weekend(d(1, 12)));
        assert!(WorkCalendar::parse("sat,funday").is_none());
    }

    #[actix_web::test]
    async fn aggregate_is_idempotent() {
        let source = FakeSource {
            attendance: Some(vec![checked_in(d(1, 13), Shift::Morning, 7, 6)]),
            leave: Some(vec![LeaveInterval {
                start_date: d(1, 20),
                end_date: d(1, 21),
                category: "annual".to_string(),
                half_day: false,
            }]),
            ..FakeSource::healthy("Security Guard")
        };
        let calendar = WorkCalendar::default();
        let aggregator = PeriodAggregator::new(&source, &calendar, 366);

        let first = aggregator
            .aggregate(january(), 1000, after_january(), GracePolicy::StrictCheckIn)
            .await
            .unwrap();
        let second = aggregator
            .aggregate(january(), 1000, after_january(), GracePolicy::StrictCheckIn)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.role, StaffRole::Security);
        assert_eq!(first.stats.late_days, 1);
        assert_eq!(first.stats.total_late_minutes, 1);
        assert_eq!(first.stats.leave_days, 2);
        assert!(first.warnings.is_empty());
    }

    #[actix_web::test]
    async fn reporting_tolerance_forgives_small_lateness() {
        let source = FakeSource {
            attendance: Some(vec![checked_in(d(1, 13), Shift::Morning, 7, 6)]),
            ..FakeSource::healthy("security guard")
        };
        let calendar = WorkCalendar::default();
        let report = PeriodAggregator::new(&source, &calendar, 366)
            .aggregate(
                DateRange::new(d(1, 13), d(1, 13)).unwrap(),
                1000,
                after_january(),
                GracePolicy::ReportingTolerance,
            )
            .await
            .unwrap();

        assert_eq!(report.days[0].status, DailyStatus::OnTime);
        assert_eq!(report.stats.on_time_days, 1);
    }

    #[actix_web::test]
    async fn partial_fetch_failure_degrades_to_warning() {
        let source = FakeSource {
            leave: None,
            attendance: Some(vec![checked_in(d(1, 13), Shift::Morning, 7, 50)]),
            ..FakeSource::healthy("analyst")
        };
        let calendar = WorkCalendar::default();
        let report = PeriodAggregator::new(&source, &calendar, 366)
            .aggregate(january(), 7, after_january(), GracePolicy::StrictCheckIn)
            .await
            .unwrap();

        assert_eq!(report.days.len(), 31);
        assert_eq!(report.stats.on_time_days, 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].source, FetchKind::Leave);
    }

    #[actix_web::test]
    async fn total_fetch_failure_is_an_error() {
        let source = FakeSource {
            role: Some("analyst".to_string()),
            ..Default::default()
        };
        let calendar = WorkCalendar::default();
        let result = PeriodAggregator::new(&source, &calendar, 366)
            .aggregate(january(), 7, after_january(), GracePolicy::StrictCheckIn)
            .await;

        assert!(matches!(result, Err(ReportError::SourceUnavailable(_))));
    }

    #[actix_web::test]
    async fn unknown_employee_is_an_error() {
        let source = FakeSource {
            role: None,
            ..FakeSource::healthy("x")
        };
        let calendar = WorkCalendar::default();
        let result = PeriodAggregator::new(&source, &calendar, 366)
            .aggregate(january(), 42, after_january(), GracePolicy::StrictCheckIn)
            .await;
        assert_eq!(result, Err(ReportError::EmployeeNotFound(42)));

        let source = FakeSource {
            role_fails: true,
            ..FakeSource::healthy("x")
        };
        let result = PeriodAggregator::new(&source, &calendar, 366)
            .aggregate(january(), 42, after_january(), GracePolicy::StrictCheckIn)
            .await;
        assert!(matches!(result, Err(ReportError::SourceUnavailable(_))));
    }

    #[actix_web::test]
    async fn oversized_range_is_rejected() {
        let source = FakeSource::healthy("analyst");
        let calendar = WorkCalendar::default();
        let result = PeriodAggregator::new(&source, &calendar, 31)
            .aggregate(
                DateRange::new(d(1, 1), d(2, 1)).unwrap(),
                7,
                after_january(),
                GracePolicy::StrictCheckIn,
            )
            .await;
        assert_eq!(
            result,
            Err(ReportError::RangeTooLarge { days: 32, max: 31 })
        );
    }
}

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

use crate::report::daily_status::DailyStatusRecord;
use crate::report::period::PeriodReport;

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M";

struct ExportFormats {
    title: Format,
    header: Format,
    cell: Format,
    left_text: Format,
}

impl ExportFormats {
    fn new() -> Self {
        Self {
            title: Format::new()
                .set_bold()
                .set_font_size(14)
                .set_align(FormatAlign::Left)
                .set_align(FormatAlign::VerticalCenter),
            header: Format::new()
                .set_bold()
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_text_wrap(),
            cell: Format::new()
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            left_text: Format::new()
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Left)
                .set_align(FormatAlign::VerticalCenter)
                .set_text_wrap(),
        }
    }
}

const HEADERS: [&str; 11] = [
    "Date",
    "Day",
    "Status",
    "Shift",
    "Shift start",
    "Check-in",
    "Check-out",
    "Minutes late",
    "Distance (m)",
    "Check-in address",
    "Notes",
];

fn write_headers(ws: &mut Worksheet, row: u32, fmt: &Format) -> Result<(), XlsxError> {
    for (i, h) in HEADERS.iter().enumerate() {
        ws.write_string_with_format(row, i as u16, *h, fmt)?;
    }
    Ok(())
}

fn set_column_widths(ws: &mut Worksheet) -> Result<(), XlsxError> {
    let widths = [12, 10, 28, 9, 16, 10, 10, 12, 12, 32, 16];
    for (col, w) in widths.iter().enumerate() {
        ws.set_column_width(col as u16, *w)?;
    }
    Ok(())
}

/// Writes one row per shift, or a single row for days without attendance.
fn write_day(
    ws: &mut Worksheet,
    mut row: u32,
    day: &DailyStatusRecord,
    fmt: &ExportFormats,
) -> Result<u32, XlsxError> {
    let date = day.date.format(DATE_FMT).to_string();
    let weekday = day.date.format("%A").to_string();
    let notes = day.notes.clone().unwrap_or_default();

    if day.shifts.is_empty() {
        ws.write_string_with_format(row, 0, &date, &fmt.cell)?;
        ws.write_string_with_format(row, 1, &weekday, &fmt.cell)?;
        ws.write_string_with_format(row, 2, &day.label, &fmt.left_text)?;
        for col in 3..=9 {
            ws.write_blank(row, col, &fmt.cell)?;
        }
        ws.write_string_with_format(row, 10, &notes, &fmt.left_text)?;
        return Ok(row + 1);
    }

    for shift in &day.shifts {
        let time = |t: Option<chrono::NaiveDateTime>| {
            t.map(|t| t.format(TIME_FMT).to_string()).unwrap_or_default()
        };

        ws.write_string_with_format(row, 0, &date, &fmt.cell)?;
        ws.write_string_with_format(row, 1, &weekday, &fmt.cell)?;
        ws.write_string_with_format(row, 2, &day.label, &fmt.left_text)?;
        ws.write_string_with_format(row, 3, shift.shift.to_string(), &fmt.cell)?;
        ws.write_string_with_format(
            row,
            4,
            shift.shift_start.format(TIME_FMT).to_string(),
            &fmt.cell,
        )?;
        ws.write_string_with_format(row, 5, time(shift.check_in), &fmt.cell)?;
        ws.write_string_with_format(row, 6, time(shift.check_out), &fmt.cell)?;
        ws.write_number_with_format(row, 7, shift.minutes_late as f64, &fmt.cell)?;
        match shift.check_in_location.distance_meters {
            Some(d) => ws.write_number_with_format(row, 8, d.round(), &fmt.cell)?,
            None => ws.write_string_with_format(row, 8, "unknown", &fmt.cell)?,
        };
        ws.write_string_with_format(
            row,
            9,
            shift.check_in_location.address.as_deref().unwrap_or(""),
            &fmt.left_text,
        )?;
        ws.write_string_with_format(row, 10, &notes, &fmt.left_text)?;
        row += 1;
    }

    Ok(row)
}

fn write_summary(
    ws: &mut Worksheet,
    start_row: u32,
    report: &PeriodReport,
    fmt: &ExportFormats,
) -> Result<(), XlsxError> {
    let stats = &report.stats;
    let present = report.days.iter().filter(|d| d.status.is_present()).count();
    let lines: [(&str, f64); 9] = [
        ("Days present", present as f64),
        ("On time", stats.on_time_days as f64),
        ("Late", stats.late_days as f64),
        ("Leave / sick", stats.leave_days as f64),
        ("Half-day leave", stats.half_day_leave_days as f64),
        ("Permission", stats.permission_days as f64),
        ("Absent", stats.absent_days as f64),
        ("Total late minutes", stats.total_late_minutes as f64),
        ("Days in period", stats.total_days as f64),
    ];

    ws.write_string_with_format(start_row, 0, "Summary", &fmt.title)?;
    for (i, (name, value)) in lines.iter().enumerate() {
        let r = start_row + 1 + i as u32;
        ws.merge_range(r, 0, r, 1, name, &fmt.left_text)?;
        ws.write_number_with_format(r, 2, *value, &fmt.cell)?;
    }
    Ok(())
}

/// Renders a period report as an xlsx workbook held in memory.
pub fn render_workbook(report: &PeriodReport, employee_name: &str) -> Result<Vec<u8>, XlsxError> {
    let fmt = ExportFormats::new();
    let mut workbook = Workbook::new();
    let ws = workbook.add_worksheet();
    ws.set_name("Attendance")?;
    set_column_widths(ws)?;

    let title = format!(
        "Attendance report: {} ({} to {})",
        employee_name,
        report.range.start.format(DATE_FMT),
        report.range.end.format(DATE_FMT)
    );
    ws.merge_range(0, 0, 0, 10, &title, &fmt.title)?;
    ws.set_row_height(0, 24)?;

    write_headers(ws, 2, &fmt.header)?;
    ws.set_freeze_panes(3, 0)?;

    let mut row = 3;
    for day in &report.days {
        row = write_day(ws, row, day, &fmt)?;
    }

    write_summary(ws, row + 1, report, &fmt)?;

    workbook.save_to_buffer()
}

/// File name offered to the browser for a report download.
pub fn file_name(report: &PeriodReport) -> String {
    format!(
        "attendance_{}_{}_{}.xlsx",
        report.employee_id,
        report.range.start.format("%Y%m%d"),
        report.range.end.format("%Y%m%d")
    )
}

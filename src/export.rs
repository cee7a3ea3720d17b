//! Spreadsheet export for the filtered attendance report.
//!
//! The currently filtered sequence is handed to the workbook writer as-is;
//! this module is a sink and never reaches back into the cache.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};

use crate::models::AttendanceRecord;

const SHEET_NAME: &str = "Attendance";

const HEADERS: [&str; 6] = ["Date", "Student ID", "Name", "Arrival", "Departure", "Status"];

/// File name for an exported range, e.g. `attendance_2024-05-01_2024-05-03.xlsx`.
pub fn report_file_name(start: NaiveDate, end: NaiveDate) -> String {
    format!("attendance_{}_{}.xlsx", start, end)
}

/// One spreadsheet row per record, column order matching `HEADERS`.
fn row_cells(record: &AttendanceRecord) -> [String; 6] {
    [
        record.formatted_date(),
        record.student_id.clone(),
        record.student_name.clone().unwrap_or_default(),
        record.formatted_check_in(),
        record.formatted_check_out(),
        record.status_display().to_string(),
    ]
}

/// Write the filtered report to an `.xlsx` workbook at `path`.
/// The caller is responsible for refusing an empty sequence.
pub fn write_report(records: &[AttendanceRecord], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new().set_bold();
    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (row, record) in records.iter().enumerate() {
        for (col, cell) in row_cells(record).iter().enumerate() {
            worksheet.write_string((row + 1) as u32, col as u16, cell.as_str())?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to write workbook to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_file_name() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        assert_eq!(
            report_file_name(start, end),
            "attendance_2024-05-01_2024-05-03.xlsx"
        );
    }

    #[test]
    fn test_row_cells_column_order() {
        let record = AttendanceRecord {
            id: Some(1),
            student_id: "1012040015".to_string(),
            student_name: Some("Ava Moreno".to_string()),
            date: Some("2024-05-01".to_string()),
            check_in: Some("2024-05-01T06:42:11+00:00".to_string()),
            check_out: None,
            status: Some("Present".to_string()),
        };
        let cells = row_cells(&record);
        assert_eq!(cells[0], "May 01, 2024");
        assert_eq!(cells[1], "1012040015");
        assert_eq!(cells[2], "Ava Moreno");
        assert_eq!(cells[3], "06:42");
        assert_eq!(cells[4], "not yet");
        assert_eq!(cells[5], "Present");
    }
}

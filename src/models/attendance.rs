use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Which half of the attendance pair a scan records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    Arrival,
    Departure,
}

impl ScanDirection {
    /// Wire value for the recordAttendance action.
    pub fn action_value(&self) -> &'static str {
        match self {
            ScanDirection::Arrival => "arrival",
            ScanDirection::Departure => "departure",
        }
    }
}

impl std::fmt::Display for ScanDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanDirection::Arrival => write!(f, "Arrival"),
            ScanDirection::Departure => write!(f, "Departure"),
        }
    }
}

/// One student's arrival/departure entry for a single calendar date, as
/// returned in the raw attendance batch. Date and timestamp fields are kept
/// as wire strings and parsed on demand: the spreadsheet backend is not
/// strict about formats, and a malformed value should degrade to "shown
/// raw / excluded from filters" rather than fail the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "studentId")]
    pub student_id: String,
    #[serde(rename = "studentName", default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "checkIn", default)]
    pub check_in: Option<String>,
    #[serde(rename = "checkOut", default)]
    pub check_out: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl AttendanceRecord {
    /// The attendance date as a calendar day, if the wire string parses.
    /// Accepts RFC 3339 timestamps (what the spreadsheet backend emits for
    /// date cells) and plain `YYYY-MM-DD`.
    pub fn day(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(parse_day)
    }

    pub fn formatted_date(&self) -> String {
        match self.day() {
            Some(day) => day.format("%b %d, %Y").to_string(),
            None => self.date.clone().unwrap_or_else(|| "-".to_string()),
        }
    }

    pub fn formatted_check_in(&self) -> String {
        format_time_of_day(self.check_in.as_deref(), "-")
    }

    pub fn formatted_check_out(&self) -> String {
        format_time_of_day(self.check_out.as_deref(), "not yet")
    }

    pub fn status_display(&self) -> &str {
        self.status.as_deref().unwrap_or("-")
    }
}

/// Parse a wire date string down to its calendar day.
fn parse_day(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d").ok()
}

/// Format a timestamp string as HH:MM, or return the fallback when absent.
/// An unparseable value is shown raw rather than hidden.
fn format_time_of_day(raw: Option<&str>, fallback: &str) -> String {
    match raw {
        None => fallback.to_string(),
        Some(s) if s.is_empty() => fallback.to_string(),
        Some(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                dt.format("%H:%M").to_string()
            } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                dt.format("%H:%M").to_string()
            } else {
                s.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: Option<&str>) -> AttendanceRecord {
        AttendanceRecord {
            id: Some(1),
            student_id: "1012040015".to_string(),
            student_name: Some("Ava Moreno".to_string()),
            date: date.map(|d| d.to_string()),
            check_in: None,
            check_out: None,
            status: Some("Present".to_string()),
        }
    }

    #[test]
    fn test_day_parses_rfc3339() {
        let r = record(Some("2024-05-01T06:42:11.000Z"));
        assert_eq!(r.day(), NaiveDate::from_ymd_opt(2024, 5, 1));
    }

    #[test]
    fn test_day_parses_plain_date() {
        let r = record(Some("2024-05-01"));
        assert_eq!(r.day(), NaiveDate::from_ymd_opt(2024, 5, 1));
    }

    #[test]
    fn test_day_rejects_garbage() {
        assert_eq!(record(Some("yesterday-ish")).day(), None);
        assert_eq!(record(None).day(), None);
    }

    #[test]
    fn test_formatted_check_out_placeholder() {
        let mut r = record(Some("2024-05-01"));
        assert_eq!(r.formatted_check_out(), "not yet");
        r.check_out = Some("2024-05-01T13:05:00.000Z".to_string());
        assert_eq!(r.formatted_check_out(), "13:05");
    }

    #[test]
    fn test_record_batch_deserializes() {
        let json = r#"[{"id": 3, "studentId": "1012040015", "studentName": "Ava Moreno",
            "date": "2024-05-01T00:00:00.000Z", "checkIn": "2024-05-01T06:42:11.000Z",
            "checkOut": null, "status": "Present"}]"#;
        let batch: Vec<AttendanceRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].student_id, "1012040015");
        assert_eq!(batch[0].day(), NaiveDate::from_ymd_opt(2024, 5, 1));
        assert!(batch[0].check_out.is_none());
    }
}

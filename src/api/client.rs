//! API client for the spreadsheet-backed attendance service.
//!
//! The whole backend is a single script endpoint: reads are GET requests
//! with an `action` query parameter, writes are form-encoded POSTs with an
//! `action` field. Every response is wrapped in the same envelope:
//!
//! ```json
//! { "status": "success", "message": "...", "data": ... }
//! ```
//!
//! A non-"success" status is surfaced as `ApiError::Rejected` carrying the
//! server's message.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use crate::models::{AttendanceRecord, ScanDirection, StaffUser, Student};

use super::ApiError;

/// HTTP request timeout in seconds.
/// The script backend can take several seconds against a large sheet.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Response envelope used by every backend action.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<T> {
        if self.status != "success" {
            let message = self
                .message
                .unwrap_or_else(|| "The server reported an error".to_string());
            return Err(ApiError::Rejected(message).into());
        }
        self.data
            .ok_or_else(|| ApiError::InvalidResponse("missing data field".to_string()).into())
    }

    /// For mutations, the message is the payload.
    fn into_message(self) -> Result<String> {
        if self.status != "success" {
            let message = self
                .message
                .unwrap_or_else(|| "The server reported an error".to_string());
            return Err(ApiError::Rejected(message).into());
        }
        Ok(self.message.unwrap_or_else(|| "Done".to_string()))
    }
}

/// Acknowledgement for a recorded scan.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanAck {
    /// Server wall-clock time the scan was stamped with.
    #[serde(default)]
    pub time: Option<String>,
    #[serde(skip)]
    pub message: String,
}

/// Client for the attendance script endpoint.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    script_url: String,
}

impl ApiClient {
    pub fn new(script_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, script_url })
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// GET `?action=<action>` and unwrap the envelope's data field.
    async fn get<T: DeserializeOwned>(&self, action: &str) -> Result<T> {
        let response = self
            .client
            .get(&self.script_url)
            .query(&[("action", action)])
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", action))?;

        let response = Self::check_response(response).await?;

        let envelope: Envelope<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", action))?;
        envelope.into_data()
    }

    /// POST a form-encoded action and unwrap the envelope's data field.
    async fn post<T: DeserializeOwned>(&self, form: &[(&str, &str)]) -> Result<Envelope<T>> {
        let action = form
            .iter()
            .find(|(k, _)| *k == "action")
            .map(|(_, v)| *v)
            .unwrap_or("unknown");

        let response = self
            .client
            .post(&self.script_url)
            .form(form)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", action))?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", action))
    }

    // ===== Authentication =====

    /// Authenticate and return the staff account on success.
    pub async fn login(&self, username: &str, password: &str) -> Result<StaffUser> {
        let envelope: Envelope<StaffUser> = self
            .post(&[
                ("action", "login"),
                ("username", username),
                ("password", password),
            ])
            .await?;
        let user = envelope.into_data()?;
        debug!(username = %user.username, "login accepted");
        Ok(user)
    }

    // ===== Students =====

    /// Fetch the full student roster.
    pub async fn fetch_students(&self) -> Result<Vec<Student>> {
        let students: Vec<Student> = self.get("getStudents").await?;
        debug!(count = students.len(), "students fetched");
        Ok(students)
    }

    pub async fn add_student(&self, student: &Student) -> Result<String> {
        let envelope: Envelope<serde_json::Value> = self
            .post(&[
                ("action", "addStudent"),
                ("studentId", &student.student_id),
                ("name", &student.name),
                ("className", student.class_display()),
            ])
            .await?;
        envelope.into_message()
    }

    /// Update a roster entry. `original_id` identifies the row when the
    /// student id itself was edited.
    pub async fn update_student(&self, original_id: &str, student: &Student) -> Result<String> {
        let envelope: Envelope<serde_json::Value> = self
            .post(&[
                ("action", "updateStudent"),
                ("originalId", original_id),
                ("studentId", &student.student_id),
                ("name", &student.name),
                ("className", student.class_display()),
            ])
            .await?;
        envelope.into_message()
    }

    pub async fn delete_student(&self, student_id: &str) -> Result<String> {
        let envelope: Envelope<serde_json::Value> = self
            .post(&[("action", "deleteStudent"), ("studentId", student_id)])
            .await?;
        envelope.into_message()
    }

    // ===== Staff users =====

    pub async fn fetch_users(&self) -> Result<Vec<StaffUser>> {
        let users: Vec<StaffUser> = self.get("getUsers").await?;
        debug!(count = users.len(), "staff users fetched");
        Ok(users)
    }

    /// Add or update a staff account. A blank password on update leaves the
    /// stored password unchanged (server-side rule).
    pub async fn save_user(
        &self,
        original_username: Option<&str>,
        user: &StaffUser,
        password: &str,
    ) -> Result<String> {
        let mut form: Vec<(&str, &str)> = vec![
            ("name", &user.name),
            ("username", &user.username),
            ("role", user.role_display()),
            ("password", password),
        ];
        match original_username {
            Some(original) => {
                form.push(("action", "updateUser"));
                form.push(("originalUsername", original));
            }
            None => form.push(("action", "addUser")),
        }
        let envelope: Envelope<serde_json::Value> = self.post(&form).await?;
        envelope.into_message()
    }

    pub async fn delete_user(&self, username: &str) -> Result<String> {
        let envelope: Envelope<serde_json::Value> = self
            .post(&[("action", "deleteUser"), ("username", username)])
            .await?;
        envelope.into_message()
    }

    // ===== Attendance =====

    /// Record one scan. The caller has already resolved the student against
    /// the roster cache; the server assigns the timestamp and status.
    pub async fn record_attendance(
        &self,
        student_id: &str,
        direction: ScanDirection,
    ) -> Result<ScanAck> {
        let envelope: Envelope<ScanAck> = self
            .post(&[
                ("action", "recordAttendance"),
                ("studentId", student_id),
                ("direction", direction.action_value()),
            ])
            .await?;

        if envelope.status != "success" {
            let message = envelope
                .message
                .unwrap_or_else(|| "The server rejected the scan".to_string());
            return Err(ApiError::Rejected(message).into());
        }

        let message = envelope.message.clone().unwrap_or_default();
        let mut ack = envelope.data.unwrap_or(ScanAck {
            time: None,
            message: String::new(),
        });
        ack.message = message;
        Ok(ack)
    }

    /// Fetch the full raw attendance batch. The backend offers no
    /// server-side filtering or pagination; filtering happens client-side
    /// against the report cache.
    pub async fn fetch_attendance(&self) -> Result<Vec<AttendanceRecord>> {
        let records: Vec<AttendanceRecord> = self.get("getAttendance").await?;
        debug!(count = records.len(), "attendance batch fetched");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success_unwraps_data() {
        let json = r#"{"status": "success", "message": "ok", "data": [{"studentId": "101", "name": "Ava Moreno", "className": "8B"}]}"#;
        let envelope: Envelope<Vec<Student>> = serde_json::from_str(json).unwrap();
        let students = envelope.into_data().unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].name, "Ava Moreno");
    }

    #[test]
    fn test_envelope_error_surfaces_server_message() {
        let json = r#"{"status": "error", "message": "Username already taken"}"#;
        let envelope: Envelope<Vec<StaffUser>> = serde_json::from_str(json).unwrap();
        let err = envelope.into_data().unwrap_err();
        assert!(err.to_string().contains("Username already taken"));
    }

    #[test]
    fn test_envelope_message_payload() {
        let json = r#"{"status": "success", "message": "Student deleted"}"#;
        let envelope: Envelope<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.into_message().unwrap(), "Student deleted");
    }

    #[test]
    fn test_scan_ack_parses_time() {
        let json = r#"{"status": "success", "message": "Arrival recorded", "data": {"time": "06:42:11"}}"#;
        let envelope: Envelope<ScanAck> = serde_json::from_str(json).unwrap();
        let ack = envelope.data.unwrap();
        assert_eq!(ack.time.as_deref(), Some("06:42:11"));
    }
}

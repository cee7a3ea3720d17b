use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::StaffUser;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Session lifetime in hours.
/// One school day; the operator logs in again the next morning.
const SESSION_EXPIRY_HOURS: i64 = 12;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub username: String,
    pub display_name: String,
    #[serde(default)]
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn from_user(user: &StaffUser) -> Self {
        Self {
            username: user.username.clone(),
            display_name: user.name.clone(),
            role: user.role.clone(),
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        let expiry = self.created_at + Duration::hours(SESSION_EXPIRY_HOURS);
        Utc::now() > expiry
    }

    pub fn is_admin(&self) -> bool {
        self.role
            .as_deref()
            .map(|r| r.eq_ignore_ascii_case("admin"))
            .unwrap_or(false)
    }
}

pub struct Session {
    cache_dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            data: None,
        }
    }

    /// Load session from disk. An expired session is ignored, not an error.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if path.exists() {
            let contents =
                std::fs::read_to_string(&path).context("Failed to read session file")?;
            let data: SessionData =
                serde_json::from_str(&contents).context("Failed to parse session file")?;

            if !data.is_expired() {
                self.data = Some(data);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    /// Clear session data (logout)
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Update session with new data
    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    /// Check if session is valid (exists and not expired)
    pub fn is_valid(&self) -> bool {
        self.data.as_ref().map(|d| !d.is_expired()).unwrap_or(false)
    }

    pub fn is_admin(&self) -> bool {
        self.data.as_ref().map(|d| d.is_admin()).unwrap_or(false)
    }

    pub fn username(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.username.as_str())
    }

    pub fn display_name(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.display_name.as_str())
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_data(role: Option<&str>) -> SessionData {
        SessionData {
            username: "frontdesk".to_string(),
            display_name: "Front Desk".to_string(),
            role: role.map(|r| r.to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_fresh_session_is_not_expired() {
        assert!(!session_data(None).is_expired());
    }

    #[test]
    fn test_old_session_is_expired() {
        let mut data = session_data(None);
        data.created_at = Utc::now() - Duration::hours(SESSION_EXPIRY_HOURS + 1);
        assert!(data.is_expired());
    }

    #[test]
    fn test_admin_flag_follows_role() {
        assert!(session_data(Some("Admin")).is_admin());
        assert!(!session_data(Some("operator")).is_admin());
        assert!(!session_data(None).is_admin());
    }
}

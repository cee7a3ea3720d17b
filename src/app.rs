//! Application state management for Rollcall.
//!
//! This module contains the core `App` struct that manages all application
//! state: UI state, the in-memory roster and attendance caches, session
//! management, and background task coordination.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::NaiveDate;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::api::ApiClient;
use crate::auth::{CredentialStore, Session, SessionData};
use crate::cache::{filter_by_range, ReportCache};
use crate::config::Config;
use crate::models::{AttendanceRecord, ScanDirection, StaffUser, Student};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// A refresh is at most a handful of messages; 32 leaves headroom.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for roster form fields and the scan input line.
const MAX_FIELD_LENGTH: usize = 64;

/// Seconds a status notification stays on screen before auto-dismissing.
const STATUS_MESSAGE_SECS: u64 = 5;

/// Maximum rows kept in each scan session log.
const SCAN_LOG_LIMIT: usize = 200;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Arrival,
    Departure,
    Report,
    Students,
    Users,
}

impl Tab {
    /// Get the display title for this tab.
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Arrival => "Arrival",
            Tab::Departure => "Departure",
            Tab::Report => "Report",
            Tab::Students => "Students",
            Tab::Users => "Users",
        }
    }

    /// Get the next tab (wrapping around). The Users tab is skipped for
    /// non-admin accounts.
    pub fn next(&self, admin: bool) -> Self {
        match self {
            Tab::Arrival => Tab::Departure,
            Tab::Departure => Tab::Report,
            Tab::Report => Tab::Students,
            Tab::Students => {
                if admin {
                    Tab::Users
                } else {
                    Tab::Arrival
                }
            }
            Tab::Users => Tab::Arrival,
        }
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self, admin: bool) -> Self {
        match self {
            Tab::Arrival => {
                if admin {
                    Tab::Users
                } else {
                    Tab::Students
                }
            }
            Tab::Departure => Tab::Arrival,
            Tab::Report => Tab::Departure,
            Tab::Students => Tab::Report,
            Tab::Users => Tab::Students,
        }
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    LoggingIn,
    EditingStudent,
    EditingUser,
    EditingRange,
    ConfirmingDelete,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

/// Student form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StudentFormFocus {
    Id,
    Name,
    Class,
}

impl StudentFormFocus {
    pub fn next(&self) -> Self {
        match self {
            StudentFormFocus::Id => StudentFormFocus::Name,
            StudentFormFocus::Name => StudentFormFocus::Class,
            StudentFormFocus::Class => StudentFormFocus::Id,
        }
    }
}

/// Staff user form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UserFormFocus {
    Name,
    Username,
    Role,
    Password,
}

impl UserFormFocus {
    pub fn next(&self) -> Self {
        match self {
            UserFormFocus::Name => UserFormFocus::Username,
            UserFormFocus::Username => UserFormFocus::Role,
            UserFormFocus::Role => UserFormFocus::Password,
            UserFormFocus::Password => UserFormFocus::Name,
        }
    }
}

/// Which report range input is being edited
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeFocus {
    Start,
    End,
}

/// Add/edit form for a roster entry. `original_id` is set when editing.
#[derive(Debug, Clone, Default)]
pub struct StudentForm {
    pub student_id: String,
    pub name: String,
    pub class_name: String,
    pub original_id: Option<String>,
    pub focus: Option<StudentFormFocus>,
}

impl StudentForm {
    pub fn editing(student: &Student) -> Self {
        Self {
            student_id: student.student_id.clone(),
            name: student.name.clone(),
            class_name: student.class_name.clone().unwrap_or_default(),
            original_id: Some(student.student_id.clone()),
            focus: Some(StudentFormFocus::Id),
        }
    }

    pub fn field_mut(&mut self) -> &mut String {
        match self.focus.unwrap_or(StudentFormFocus::Id) {
            StudentFormFocus::Id => &mut self.student_id,
            StudentFormFocus::Name => &mut self.name,
            StudentFormFocus::Class => &mut self.class_name,
        }
    }
}

impl Default for StudentFormFocus {
    fn default() -> Self {
        StudentFormFocus::Id
    }
}

/// Add/edit form for a staff account. `original_username` is set when
/// editing; the password field is blank-means-unchanged in that case.
#[derive(Debug, Clone, Default)]
pub struct UserForm {
    pub name: String,
    pub username: String,
    pub role: String,
    pub password: String,
    pub original_username: Option<String>,
    pub focus: Option<UserFormFocus>,
}

impl UserForm {
    pub fn editing(user: &StaffUser) -> Self {
        Self {
            name: user.name.clone(),
            username: user.username.clone(),
            role: user.role.clone().unwrap_or_default(),
            password: String::new(),
            original_username: Some(user.username.clone()),
            focus: Some(UserFormFocus::Name),
        }
    }

    pub fn field_mut(&mut self) -> &mut String {
        match self.focus.unwrap_or(UserFormFocus::Name) {
            UserFormFocus::Name => &mut self.name,
            UserFormFocus::Username => &mut self.username,
            UserFormFocus::Role => &mut self.role,
            UserFormFocus::Password => &mut self.password,
        }
    }
}

/// Pending delete confirmation
#[derive(Debug, Clone)]
pub enum DeleteTarget {
    Student { student_id: String, name: String },
    User { username: String },
}

// ============================================================================
// Notifications and Scan Feedback
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// Transient status line notification; auto-dismisses after a few seconds.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    shown_at: Instant,
}

impl StatusMessage {
    fn expired(&self) -> bool {
        self.shown_at.elapsed() > Duration::from_secs(STATUS_MESSAGE_SECS)
    }
}

/// Result panel contents for the last scan on a scan tab.
#[derive(Debug, Clone)]
pub struct ScanFeedback {
    pub ok: bool,
    pub headline: String,
    pub detail: String,
}

/// One accepted scan in the session log table.
#[derive(Debug, Clone)]
pub struct ScanLogEntry {
    pub time: String,
    pub student_id: String,
    pub name: String,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Result types from background fetch tasks, sent through an MPSC channel
/// back to the main event loop.
enum RefreshResult {
    /// Student roster fetched successfully
    Students(Vec<Student>),
    /// Staff roster fetched successfully
    Users(Vec<StaffUser>),
    /// Raw attendance batch fetched successfully
    Attendance(Vec<AttendanceRecord>),
    /// Attendance batch fetch failed; the cache keeps its prior contents
    AttendanceError(String),
    /// A scan was accepted by the backend
    ScanOk {
        direction: ScanDirection,
        student_id: String,
        name: String,
        time: String,
        message: String,
    },
    /// A scan was rejected or could not be delivered
    ScanError {
        direction: ScanDirection,
        message: String,
    },
    /// A roster mutation succeeded; carries the server's message
    Saved(String),
    /// Any other failure
    Error(String),
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub session: Session,
    pub api: ApiClient,

    // UI state
    pub state: AppState,
    pub current_tab: Tab,
    pub search_query: String,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Cached data. Rosters use the same fetch-if-empty discipline as the
    // report cache, tracked with a loaded flag since they have no range
    // filtering of their own.
    pub students: Vec<Student>,
    pub students_loaded: bool,
    pub users: Vec<StaffUser>,
    pub users_loaded: bool,
    pub report: ReportCache,

    // Report view state
    pub range_start: String,
    pub range_end: String,
    pub range_focus: RangeFocus,
    pub filtered: Vec<AttendanceRecord>,
    pub filter_applied: bool,
    pub report_selection: usize,
    report_loading: bool,
    pending_filter: bool,

    // Scan tabs
    pub scan_input: String,
    pub arrival_feedback: Option<ScanFeedback>,
    pub departure_feedback: Option<ScanFeedback>,
    pub arrival_log: Vec<ScanLogEntry>,
    pub departure_log: Vec<ScanLogEntry>,

    // Selections
    pub student_selection: usize,
    pub user_selection: usize,

    // Forms and confirmations
    pub student_form: StudentForm,
    pub user_form: UserForm,
    pub pending_delete: Option<DeleteTarget>,

    // Background task channel
    refresh_rx: Option<mpsc::Receiver<RefreshResult>>,
    refresh_tx: mpsc::Sender<RefreshResult>,

    // Status notification
    pub status: Option<StatusMessage>,
}

impl App {
    /// Create a new application instance
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let script_url = config.script_url()?;
        let api = ApiClient::new(script_url)?;

        let cache_dir = config
            .cache_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("./cache"));

        // Load session from disk if it exists
        let mut session = Session::new(cache_dir);
        let load_result = session.load();
        debug!(?load_result, has_data = session.data.is_some(), "Session loaded");

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let login_username = std::env::var("ROLLCALL_USERNAME")
            .ok()
            .or_else(|| config.last_username.clone())
            .unwrap_or_default();
        let login_password = std::env::var("ROLLCALL_PASSWORD").unwrap_or_default();

        Ok(Self {
            config,
            session,
            api,

            state: AppState::Normal,
            current_tab: Tab::Arrival,
            search_query: String::new(),

            login_username,
            login_password,
            login_focus: LoginFocus::Username,
            login_error: None,

            students: Vec::new(),
            students_loaded: false,
            users: Vec::new(),
            users_loaded: false,
            report: ReportCache::new(),

            range_start: String::new(),
            range_end: String::new(),
            range_focus: RangeFocus::Start,
            filtered: Vec::new(),
            filter_applied: false,
            report_selection: 0,
            report_loading: false,
            pending_filter: false,

            scan_input: String::new(),
            arrival_feedback: None,
            departure_feedback: None,
            arrival_log: Vec::new(),
            departure_log: Vec::new(),

            student_selection: 0,
            user_selection: 0,

            student_form: StudentForm::default(),
            user_form: UserForm::default(),
            pending_delete: None,

            refresh_rx: Some(rx),
            refresh_tx: tx,

            status: None,
        })
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.session.is_valid()
    }

    pub fn is_admin(&self) -> bool {
        self.session.is_admin()
    }

    /// Start the login process (show login overlay)
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.login_error = None;

        // Offer the stored password for the remembered username
        if self.login_password.is_empty() && CredentialStore::has_credentials(&self.login_username)
        {
            if let Ok(password) = CredentialStore::get_password(&self.login_username) {
                self.login_password = password;
            }
        }
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) -> Result<()> {
        let username = self.login_username.clone();
        let password = self.login_password.clone();

        if username.is_empty() || password.is_empty() {
            self.login_error = Some("Username and password required".to_string());
            return Err(anyhow::anyhow!("Username and password required"));
        }

        self.login_error = None;

        match self.api.login(&username, &password).await {
            Ok(user) => {
                if let Err(e) = CredentialStore::store(&username, &password) {
                    warn!(error = %e, "Failed to store credentials");
                }

                self.config.last_username = Some(username);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }

                self.session.update(SessionData::from_user(&user));
                if let Err(e) = self.session.save() {
                    warn!(error = %e, "Failed to save session");
                }

                self.login_password.clear();
                self.state = AppState::Normal;
                info!(username = %user.username, "Login successful");

                self.bootstrap_data();
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.login_error = Some(Self::friendly_error(&e.to_string()));
                Err(e)
            }
        }
    }

    /// Log out and return to the login overlay.
    pub fn logout(&mut self) {
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear session");
        }
        self.login_password.clear();
        self.start_login();
    }

    /// Kick off the fetches every session needs: the student roster backs
    /// scan lookups on all tabs, so load it immediately after login.
    pub fn bootstrap_data(&mut self) {
        self.ensure_students_loaded(false);
    }

    // =========================================================================
    // Cache population
    // =========================================================================

    /// Fetch the student roster if it has not been loaded yet, or
    /// unconditionally when forced.
    pub fn ensure_students_loaded(&mut self, force: bool) {
        if self.students_loaded && !force {
            return;
        }
        let api = self.api.clone();
        let tx = self.refresh_tx.clone();
        tokio::spawn(async move {
            match api.fetch_students().await {
                Ok(list) => Self::send(&tx, RefreshResult::Students(list)).await,
                Err(e) => {
                    Self::send(&tx, RefreshResult::Error(format!("Student roster: {}", e))).await
                }
            }
        });
    }

    /// Fetch the staff roster if it has not been loaded yet, or
    /// unconditionally when forced. Admin-gated at the UI layer.
    pub fn ensure_users_loaded(&mut self, force: bool) {
        if self.users_loaded && !force {
            return;
        }
        let api = self.api.clone();
        let tx = self.refresh_tx.clone();
        tokio::spawn(async move {
            match api.fetch_users().await {
                Ok(list) => Self::send(&tx, RefreshResult::Users(list)).await,
                Err(e) => Self::send(&tx, RefreshResult::Error(format!("Staff roster: {}", e))).await,
            }
        });
    }

    /// The single entry point for report data. Fetches the raw attendance
    /// batch when the cache is empty or a refresh is forced; otherwise the
    /// existing cache is used untouched and subsequent filtering needs no
    /// network access.
    ///
    /// Overlapping forced refreshes are not deduplicated: if the user
    /// triggers two, the cache ends up holding whichever response is applied
    /// last.
    pub fn ensure_report_loaded(&mut self, force: bool) {
        if !self.report.needs_fetch(force) {
            return;
        }
        self.report_loading = true;
        self.pending_filter = true;
        self.set_status(StatusKind::Info, "Fetching attendance data...");

        let api = self.api.clone();
        let tx = self.refresh_tx.clone();
        tokio::spawn(async move {
            match api.fetch_attendance().await {
                Ok(batch) => Self::send(&tx, RefreshResult::Attendance(batch)).await,
                Err(e) => Self::send(&tx, RefreshResult::AttendanceError(e.to_string())).await,
            }
        });
    }

    pub fn is_report_loading(&self) -> bool {
        self.report_loading
    }

    // =========================================================================
    // Report filtering
    // =========================================================================

    /// Called when the Report tab becomes active.
    pub fn enter_report_tab(&mut self) {
        if self.range_start.is_empty() && self.range_end.is_empty() {
            let today = chrono::Local::now().date_naive().to_string();
            self.range_start = today.clone();
            self.range_end = today;
        }
        if self.report.needs_fetch(false) {
            self.ensure_report_loaded(false);
        } else {
            self.apply_filter();
        }
    }

    fn parse_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::parse_from_str(self.range_start.trim(), "%Y-%m-%d").ok()?;
        let end = NaiveDate::parse_from_str(self.range_end.trim(), "%Y-%m-%d").ok()?;
        Some((start, end))
    }

    /// Run the range filter against the cached batch. Both dates must be
    /// supplied and well-formed; an inverted range is not an error and
    /// simply selects nothing.
    pub fn apply_filter(&mut self) {
        let Some((start, end)) = self.parse_range() else {
            self.set_status(
                StatusKind::Error,
                "Select a date range first (YYYY-MM-DD)",
            );
            return;
        };

        self.filtered = filter_by_range(self.report.records(), start, end);
        self.filter_applied = true;
        self.report_selection = 0;
        debug!(
            rows = self.filtered.len(),
            %start,
            %end,
            "report filter applied"
        );
    }

    /// Resolve a record's display name: prefer the current roster, fall back
    /// to the name stored with the row, then a placeholder. Roster names win
    /// because the recorded copy can be stale after a roster edit.
    pub fn display_name_for(&self, record: &AttendanceRecord) -> String {
        if let Some(student) = self
            .students
            .iter()
            .find(|s| s.student_id == record.student_id)
        {
            return student.name.clone();
        }
        match record.student_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => "(name not found)".to_string(),
        }
    }

    /// Export the currently filtered rows to a workbook in the current
    /// directory. Refuses an empty report.
    pub fn export_report(&mut self) {
        if !self.filter_applied || self.filtered.is_empty() {
            self.set_status(StatusKind::Info, "Nothing to export for this range");
            return;
        }
        let Some((start, end)) = self.parse_range() else {
            self.set_status(StatusKind::Error, "Select a date range first (YYYY-MM-DD)");
            return;
        };

        // Resolve names the same way the table renders them
        let rows: Vec<AttendanceRecord> = self
            .filtered
            .iter()
            .map(|r| {
                let mut row = r.clone();
                row.student_name = Some(self.display_name_for(r));
                row
            })
            .collect();

        let path = std::path::PathBuf::from(crate::export::report_file_name(start, end));
        match crate::export::write_report(&rows, &path) {
            Ok(()) => {
                info!(path = %path.display(), rows = rows.len(), "report exported");
                self.set_status(
                    StatusKind::Success,
                    format!("Exported {} rows to {}", rows.len(), path.display()),
                );
            }
            Err(e) => {
                error!(error = %e, "Export failed");
                self.set_status(StatusKind::Error, format!("Export failed: {}", e));
            }
        }
    }

    // =========================================================================
    // Scanning
    // =========================================================================

    /// Accept the scan input line (wedge scanner or manual entry). The id is
    /// resolved against the roster cache before anything goes on the wire; an
    /// unknown id is rejected locally.
    pub fn submit_scan(&mut self, direction: ScanDirection) {
        let student_id = self.scan_input.trim().to_string();
        self.scan_input.clear();
        if student_id.is_empty() {
            return;
        }

        let roster_name = self
            .students
            .iter()
            .find(|s| s.student_id == student_id)
            .map(|s| s.name.clone());
        let Some(name) = roster_name else {
            let message = format!("Student id {} is not on the roster", student_id);
            warn!(student_id = %student_id, "scan rejected: unknown id");
            self.set_scan_feedback(
                direction,
                ScanFeedback {
                    ok: false,
                    headline: "Not registered".to_string(),
                    detail: message.clone(),
                },
            );
            self.set_status(StatusKind::Error, message);
            return;
        };

        let api = self.api.clone();
        let tx = self.refresh_tx.clone();
        tokio::spawn(async move {
            match api.record_attendance(&student_id, direction).await {
                Ok(ack) => {
                    Self::send(
                        &tx,
                        RefreshResult::ScanOk {
                            direction,
                            student_id,
                            name,
                            time: ack.time.unwrap_or_default(),
                            message: ack.message,
                        },
                    )
                    .await
                }
                Err(e) => {
                    Self::send(
                        &tx,
                        RefreshResult::ScanError {
                            direction,
                            message: e.to_string(),
                        },
                    )
                    .await
                }
            }
        });
    }

    fn set_scan_feedback(&mut self, direction: ScanDirection, feedback: ScanFeedback) {
        match direction {
            ScanDirection::Arrival => self.arrival_feedback = Some(feedback),
            ScanDirection::Departure => self.departure_feedback = Some(feedback),
        }
    }

    pub fn scan_feedback(&self, direction: ScanDirection) -> Option<&ScanFeedback> {
        match direction {
            ScanDirection::Arrival => self.arrival_feedback.as_ref(),
            ScanDirection::Departure => self.departure_feedback.as_ref(),
        }
    }

    pub fn scan_log(&self, direction: ScanDirection) -> &[ScanLogEntry] {
        match direction {
            ScanDirection::Arrival => &self.arrival_log,
            ScanDirection::Departure => &self.departure_log,
        }
    }

    // =========================================================================
    // Roster mutations
    // =========================================================================

    /// Run a mutation in the background, surface the server's message, then
    /// force a roster refetch so the table reflects the authoritative state.
    fn spawn_mutation<F, Fut>(&self, op: F, refetch_users: bool)
    where
        F: FnOnce(ApiClient) -> Fut + Send + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let api = self.api.clone();
        let tx = self.refresh_tx.clone();
        tokio::spawn(async move {
            match op(api.clone()).await {
                Ok(message) => {
                    Self::send(&tx, RefreshResult::Saved(message)).await;
                    let refreshed = if refetch_users {
                        api.fetch_users().await.map(RefreshResult::Users)
                    } else {
                        api.fetch_students().await.map(RefreshResult::Students)
                    };
                    match refreshed {
                        Ok(result) => Self::send(&tx, result).await,
                        Err(e) => {
                            Self::send(&tx, RefreshResult::Error(format!("Refresh failed: {}", e)))
                                .await
                        }
                    }
                }
                Err(e) => Self::send(&tx, RefreshResult::Error(e.to_string())).await,
            }
        });
    }

    pub fn open_student_form(&mut self, editing: Option<&Student>) {
        self.student_form = match editing {
            Some(student) => StudentForm::editing(student),
            None => StudentForm {
                focus: Some(StudentFormFocus::Id),
                ..Default::default()
            },
        };
        self.state = AppState::EditingStudent;
    }

    /// Submit the student form.
    pub fn save_student_form(&mut self) {
        let form = self.student_form.clone();
        if form.student_id.trim().is_empty() || form.name.trim().is_empty() {
            self.set_status(StatusKind::Error, "Student id and name are required");
            return;
        }

        let student = Student {
            student_id: form.student_id.trim().to_string(),
            name: form.name.trim().to_string(),
            class_name: match form.class_name.trim() {
                "" => None,
                class => Some(class.to_string()),
            },
        };

        self.spawn_mutation(
            move |api| async move {
                match form.original_id {
                    Some(ref original) => api.update_student(original, &student).await,
                    None => api.add_student(&student).await,
                }
            },
            false,
        );

        self.state = AppState::Normal;
    }

    pub fn open_user_form(&mut self, editing: Option<&StaffUser>) {
        self.user_form = match editing {
            Some(user) => UserForm::editing(user),
            None => UserForm {
                focus: Some(UserFormFocus::Name),
                ..Default::default()
            },
        };
        self.state = AppState::EditingUser;
    }

    /// Submit the staff user form. New accounts require a password; on edit
    /// a blank password leaves the stored one unchanged.
    pub fn save_user_form(&mut self) {
        let form = self.user_form.clone();
        if form.username.trim().is_empty() || form.name.trim().is_empty() {
            self.set_status(StatusKind::Error, "Name and username are required");
            return;
        }
        if form.original_username.is_none() && form.password.is_empty() {
            self.set_status(StatusKind::Error, "A password is required for a new user");
            return;
        }

        let user = StaffUser {
            name: form.name.trim().to_string(),
            username: form.username.trim().to_string(),
            role: match form.role.trim() {
                "" => None,
                role => Some(role.to_string()),
            },
        };
        let password = form.password.clone();
        let original = form.original_username.clone();

        self.spawn_mutation(
            move |api| async move { api.save_user(original.as_deref(), &user, &password).await },
            true,
        );

        self.state = AppState::Normal;
    }

    /// Ask for confirmation before deleting the selected roster entry.
    pub fn request_delete(&mut self, target: DeleteTarget) {
        // Deleting the account you are logged in with would lock you out
        if let DeleteTarget::User { ref username } = target {
            if self.session.username() == Some(username.as_str()) {
                self.set_status(StatusKind::Error, "You cannot delete your own account");
                return;
            }
        }
        self.pending_delete = Some(target);
        self.state = AppState::ConfirmingDelete;
    }

    /// Execute a confirmed delete.
    pub fn confirm_delete(&mut self) {
        let Some(target) = self.pending_delete.take() else {
            self.state = AppState::Normal;
            return;
        };

        match target {
            DeleteTarget::Student { student_id, .. } => {
                self.spawn_mutation(
                    move |api| async move { api.delete_student(&student_id).await },
                    false,
                );
            }
            DeleteTarget::User { username } => {
                self.spawn_mutation(
                    move |api| async move { api.delete_user(&username).await },
                    true,
                );
            }
        }

        self.state = AppState::Normal;
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Students matching the current search query, sorted by name.
    pub fn visible_students(&self) -> Vec<&Student> {
        let mut visible: Vec<&Student> = self
            .students
            .iter()
            .filter(|s| s.matches(&self.search_query))
            .collect();
        visible.sort_by(|a, b| crate::utils::cmp_ignore_case(&a.name, &b.name));
        visible
    }

    /// Staff users matching the current search query.
    pub fn visible_users(&self) -> Vec<&StaffUser> {
        self.users
            .iter()
            .filter(|u| u.matches(&self.search_query))
            .collect()
    }

    // =========================================================================
    // Status notifications
    // =========================================================================

    pub fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
            shown_at: Instant::now(),
        });
    }

    /// Expire stale notifications. Called once per event loop iteration.
    pub fn tick(&mut self) {
        if self.status.as_ref().map(|s| s.expired()).unwrap_or(false) {
            self.status = None;
        }
    }

    /// Map raw error text to something an operator can act on.
    fn friendly_error(message: &str) -> String {
        let lower = message.to_lowercase();
        if lower.contains("unauthorized") || lower.contains("401") {
            "Invalid username or password".to_string()
        } else if lower.contains("network") || lower.contains("connect") || lower.contains("dns") {
            "Unable to reach the server. Check your internet connection.".to_string()
        } else if lower.contains("timeout") || lower.contains("timed out") {
            "Connection timed out. Please try again.".to_string()
        } else {
            message.to_string()
        }
    }

    // =========================================================================
    // Background task processing
    // =========================================================================

    /// Helper to send refresh results, logging any channel errors
    async fn send(tx: &mpsc::Sender<RefreshResult>, result: RefreshResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send refresh result - channel closed");
        }
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        // Collect all pending results first to avoid borrow conflicts
        let results: Vec<RefreshResult> = {
            if let Some(ref mut rx) = self.refresh_rx {
                let mut results = Vec::new();
                while let Ok(result) = rx.try_recv() {
                    results.push(result);
                }
                results
            } else {
                Vec::new()
            }
        };

        for result in results {
            self.process_refresh_result(result);
        }
    }

    /// Process a single refresh result from a background task.
    fn process_refresh_result(&mut self, result: RefreshResult) {
        match result {
            RefreshResult::Students(list) => {
                info!(count = list.len(), "student roster updated");
                self.students = list;
                self.students_loaded = true;
                self.student_selection = self
                    .student_selection
                    .min(self.students.len().saturating_sub(1));
            }
            RefreshResult::Users(list) => {
                info!(count = list.len(), "staff roster updated");
                self.users = list;
                self.users_loaded = true;
                self.user_selection = self.user_selection.min(self.users.len().saturating_sub(1));
            }
            RefreshResult::Attendance(batch) => {
                self.report.replace(batch);
                self.report_loading = false;
                if self.pending_filter {
                    self.pending_filter = false;
                    self.apply_filter();
                }
                // Replace a progress notice, preserve errors
                let dismiss = self
                    .status
                    .as_ref()
                    .map(|s| s.kind != StatusKind::Error)
                    .unwrap_or(false);
                if dismiss {
                    self.status = None;
                }
            }
            RefreshResult::AttendanceError(message) => {
                // The cache keeps its last-known-good batch (or stays empty)
                error!(error = %message, "attendance fetch failed");
                self.report_loading = false;
                self.pending_filter = false;
                self.set_status(StatusKind::Error, Self::friendly_error(&message));
            }
            RefreshResult::ScanOk {
                direction,
                student_id,
                name,
                time,
                message,
            } => {
                let headline = if message.is_empty() {
                    format!("{} recorded", direction)
                } else {
                    message
                };
                self.set_scan_feedback(
                    direction,
                    ScanFeedback {
                        ok: true,
                        headline,
                        detail: format!("{} ({}) - {}", name, student_id, time),
                    },
                );

                let log = match direction {
                    ScanDirection::Arrival => &mut self.arrival_log,
                    ScanDirection::Departure => &mut self.departure_log,
                };
                log.insert(
                    0,
                    ScanLogEntry {
                        time,
                        student_id,
                        name,
                    },
                );
                log.truncate(SCAN_LOG_LIMIT);

                // A new scan makes any populated report batch stale; the user
                // refreshes explicitly when they need it.
            }
            RefreshResult::ScanError { direction, message } => {
                error!(error = %message, "scan failed");
                let friendly = Self::friendly_error(&message);
                self.set_scan_feedback(
                    direction,
                    ScanFeedback {
                        ok: false,
                        headline: "Scan failed".to_string(),
                        detail: friendly.clone(),
                    },
                );
                self.set_status(StatusKind::Error, friendly);
            }
            RefreshResult::Saved(message) => {
                self.set_status(StatusKind::Success, message);
            }
            RefreshResult::Error(message) => {
                error!(error = %message, "background task error");
                self.set_status(StatusKind::Error, Self::friendly_error(&message));
            }
        }
    }
}

// ============================================================================
// Input length guards
// ============================================================================

pub fn can_add_username_char(current: &str) -> bool {
    current.len() < MAX_USERNAME_LENGTH
}

pub fn can_add_password_char(current: &str) -> bool {
    current.len() < MAX_PASSWORD_LENGTH
}

pub fn can_add_field_char(current: &str) -> bool {
    current.len() < MAX_FIELD_LENGTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_cycle_skips_users_for_non_admin() {
        assert_eq!(Tab::Students.next(false), Tab::Arrival);
        assert_eq!(Tab::Students.next(true), Tab::Users);
        assert_eq!(Tab::Arrival.prev(false), Tab::Students);
        assert_eq!(Tab::Arrival.prev(true), Tab::Users);
    }

    #[test]
    fn test_friendly_error_mapping() {
        assert_eq!(
            App::friendly_error("error sending request: network unreachable"),
            "Unable to reach the server. Check your internet connection."
        );
        assert_eq!(
            App::friendly_error("Unauthorized - please log in again"),
            "Invalid username or password"
        );
        assert_eq!(App::friendly_error("Row not found"), "Row not found");
    }

    #[test]
    fn test_student_form_field_focus() {
        let mut form = StudentForm {
            focus: Some(StudentFormFocus::Name),
            ..Default::default()
        };
        form.field_mut().push('A');
        assert_eq!(form.name, "A");
        assert!(form.student_id.is_empty());
    }

    #[test]
    fn test_input_length_guards() {
        assert!(can_add_username_char("short"));
        assert!(!can_add_username_char(&"x".repeat(MAX_USERNAME_LENGTH)));
        assert!(!can_add_field_char(&"x".repeat(MAX_FIELD_LENGTH)));
    }
}

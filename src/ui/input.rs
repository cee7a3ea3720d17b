//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes. On the scan tabs, digits are routed to the
//! scan input line so a keyboard-wedge QR scanner (which types the decoded
//! id and presses Enter) works without any mode switching; letters stay
//! available as commands.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    can_add_field_char, can_add_password_char, can_add_username_char, App, AppState, DeleteTarget,
    LoginFocus, RangeFocus, Tab, UserFormFocus, PAGE_SCROLL_SIZE,
};
use crate::models::ScanDirection;

/// Maximum length of a date input field (YYYY-MM-DD)
const RANGE_FIELD_LENGTH: usize = 10;

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::LoggingIn => return handle_login_input(app, key).await,
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.confirm_delete();
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.pending_delete = None;
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::EditingStudent => return handle_student_form_input(app, key),
        AppState::EditingUser => return handle_user_form_input(app, key),
        AppState::EditingRange => return handle_range_input(app, key),
        AppState::Searching => return handle_search_input(app, key),
        AppState::Normal | AppState::Quitting => {}
    }

    // Scan tabs first: digits belong to the scan line
    let scan_direction = match app.current_tab {
        Tab::Arrival => Some(ScanDirection::Arrival),
        Tab::Departure => Some(ScanDirection::Departure),
        _ => None,
    };
    if let Some(direction) = scan_direction {
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if can_add_field_char(&app.scan_input) {
                    app.scan_input.push(c);
                }
                return Ok(false);
            }
            KeyCode::Backspace => {
                app.scan_input.pop();
                return Ok(false);
            }
            KeyCode::Enter => {
                app.submit_scan(direction);
                return Ok(false);
            }
            KeyCode::Esc => {
                app.scan_input.clear();
                return Ok(false);
            }
            _ => {}
        }
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char('L') => {
            app.logout();
        }
        KeyCode::Char('1') => switch_tab(app, Tab::Arrival),
        KeyCode::Char('2') => switch_tab(app, Tab::Departure),
        KeyCode::Char('3') => switch_tab(app, Tab::Report),
        KeyCode::Char('4') => switch_tab(app, Tab::Students),
        KeyCode::Char('5') => {
            if app.is_admin() {
                switch_tab(app, Tab::Users);
            }
        }
        KeyCode::Left => {
            let prev = app.current_tab.prev(app.is_admin());
            switch_tab(app, prev);
        }
        KeyCode::Right => {
            let next = app.current_tab.next(app.is_admin());
            switch_tab(app, next);
        }
        KeyCode::Char('/') => {
            if matches!(app.current_tab, Tab::Students | Tab::Users) {
                app.state = AppState::Searching;
            }
        }
        KeyCode::Esc => {
            if !app.search_query.is_empty() {
                app.search_query.clear();
            }
        }
        _ => {
            handle_tab_input(app, key);
        }
    }

    Ok(false)
}

/// Switch tabs, kicking off whatever data load the new tab needs.
fn switch_tab(app: &mut App, tab: Tab) {
    app.current_tab = tab;
    match tab {
        Tab::Arrival | Tab::Departure => {
            app.scan_input.clear();
            app.ensure_students_loaded(false);
        }
        Tab::Report => app.enter_report_tab(),
        Tab::Students => app.ensure_students_loaded(false),
        Tab::Users => app.ensure_users_loaded(false),
    }
}

/// Per-tab keys in the normal state.
fn handle_tab_input(app: &mut App, key: KeyEvent) {
    match app.current_tab {
        Tab::Arrival | Tab::Departure => {}
        Tab::Report => handle_report_keys(app, key),
        Tab::Students => handle_students_keys(app, key),
        Tab::Users => {
            if app.is_admin() {
                handle_users_keys(app, key);
            }
        }
    }
}

fn handle_report_keys(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('e') => {
            app.range_focus = RangeFocus::Start;
            app.state = AppState::EditingRange;
        }
        KeyCode::Char('f') => app.apply_filter(),
        KeyCode::Char('u') => app.ensure_report_loaded(true),
        KeyCode::Char('x') => app.export_report(),
        KeyCode::Up => {
            app.report_selection = app.report_selection.saturating_sub(1);
        }
        KeyCode::Down => {
            if !app.filtered.is_empty() {
                app.report_selection = (app.report_selection + 1).min(app.filtered.len() - 1);
            }
        }
        KeyCode::PageUp => {
            app.report_selection = app.report_selection.saturating_sub(PAGE_SCROLL_SIZE);
        }
        KeyCode::PageDown => {
            if !app.filtered.is_empty() {
                app.report_selection =
                    (app.report_selection + PAGE_SCROLL_SIZE).min(app.filtered.len() - 1);
            }
        }
        _ => {}
    }
}

fn handle_students_keys(app: &mut App, key: KeyEvent) {
    let visible = app.visible_students().len();
    match key.code {
        KeyCode::Char('a') => app.open_student_form(None),
        KeyCode::Char('e') => {
            let selected = app
                .visible_students()
                .get(app.student_selection)
                .map(|s| (*s).clone());
            if let Some(student) = selected {
                app.open_student_form(Some(&student));
            }
        }
        KeyCode::Char('d') => {
            let target = app
                .visible_students()
                .get(app.student_selection)
                .map(|s| DeleteTarget::Student {
                    student_id: s.student_id.clone(),
                    name: s.name.clone(),
                });
            if let Some(target) = target {
                app.request_delete(target);
            }
        }
        KeyCode::Char('u') => app.ensure_students_loaded(true),
        KeyCode::Up => app.student_selection = app.student_selection.saturating_sub(1),
        KeyCode::Down => {
            if visible > 0 {
                app.student_selection = (app.student_selection + 1).min(visible - 1);
            }
        }
        KeyCode::PageUp => {
            app.student_selection = app.student_selection.saturating_sub(PAGE_SCROLL_SIZE)
        }
        KeyCode::PageDown => {
            if visible > 0 {
                app.student_selection =
                    (app.student_selection + PAGE_SCROLL_SIZE).min(visible - 1);
            }
        }
        _ => {}
    }
}

fn handle_users_keys(app: &mut App, key: KeyEvent) {
    let visible = app.visible_users().len();
    match key.code {
        KeyCode::Char('a') => app.open_user_form(None),
        KeyCode::Char('e') => {
            let selected = app
                .visible_users()
                .get(app.user_selection)
                .map(|u| (*u).clone());
            if let Some(user) = selected {
                app.open_user_form(Some(&user));
            }
        }
        KeyCode::Char('d') => {
            let target = app
                .visible_users()
                .get(app.user_selection)
                .map(|u| DeleteTarget::User {
                    username: u.username.clone(),
                });
            if let Some(target) = target {
                app.request_delete(target);
            }
        }
        KeyCode::Char('u') => app.ensure_users_loaded(true),
        KeyCode::Up => app.user_selection = app.user_selection.saturating_sub(1),
        KeyCode::Down => {
            if visible > 0 {
                app.user_selection = (app.user_selection + 1).min(visible - 1);
            }
        }
        _ => {}
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Tab | KeyCode::Down => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Username,
            };
        }
        KeyCode::Up => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Username,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => {
                // Errors surface in the overlay; the event loop keeps running
                let _ = app.attempt_login().await;
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Username => {
                if can_add_username_char(&app.login_username) {
                    app.login_username.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(&app.login_password) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        KeyCode::Esc => {
            // Only usable as a dismissal when already authenticated
            if app.is_authenticated() {
                app.state = AppState::Normal;
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_student_form_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Tab | KeyCode::Down => {
            let focus = app.student_form.focus.unwrap_or_default();
            app.student_form.focus = Some(focus.next());
        }
        KeyCode::Enter => app.save_student_form(),
        KeyCode::Esc => app.state = AppState::Normal,
        KeyCode::Backspace => {
            app.student_form.field_mut().pop();
        }
        KeyCode::Char(c) => {
            let field = app.student_form.field_mut();
            if can_add_field_char(field) {
                field.push(c);
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_user_form_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Tab | KeyCode::Down => {
            let focus = app.user_form.focus.unwrap_or(UserFormFocus::Name);
            app.user_form.focus = Some(focus.next());
        }
        KeyCode::Enter => app.save_user_form(),
        KeyCode::Esc => app.state = AppState::Normal,
        KeyCode::Backspace => {
            app.user_form.field_mut().pop();
        }
        KeyCode::Char(c) => {
            let limit_ok = match app.user_form.focus {
                Some(UserFormFocus::Password) => can_add_password_char(&app.user_form.password),
                _ => can_add_field_char(app.user_form.field_mut()),
            };
            if limit_ok {
                app.user_form.field_mut().push(c);
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_range_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    fn field(app: &mut App) -> &mut String {
        match app.range_focus {
            RangeFocus::Start => &mut app.range_start,
            RangeFocus::End => &mut app.range_end,
        }
    }

    match key.code {
        KeyCode::Tab | KeyCode::Down | KeyCode::Up => {
            app.range_focus = match app.range_focus {
                RangeFocus::Start => RangeFocus::End,
                RangeFocus::End => RangeFocus::Start,
            };
        }
        KeyCode::Enter => {
            app.state = AppState::Normal;
            app.apply_filter();
        }
        KeyCode::Esc => app.state = AppState::Normal,
        KeyCode::Backspace => {
            field(app).pop();
        }
        KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => {
            let input = field(app);
            if input.len() < RANGE_FIELD_LENGTH {
                input.push(c);
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_search_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.search_query.clear();
            app.state = AppState::Normal;
        }
        KeyCode::Enter => {
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => {
            app.search_query.pop();
        }
        KeyCode::Char(c) => {
            app.search_query.push(c);
            app.student_selection = 0;
            app.user_selection = 0;
        }
        _ => {}
    }
    Ok(false)
}

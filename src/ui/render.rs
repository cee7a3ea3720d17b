use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{
    App, AppState, DeleteTarget, LoginFocus, StatusKind, StudentFormFocus, Tab, UserFormFocus,
};
use crate::models::ScanDirection;

use super::styles;
use super::tabs::{report, scan, students, users};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        AppState::EditingStudent => render_student_form_overlay(frame, app),
        AppState::EditingUser => render_user_form_overlay(frame, app),
        _ => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Rollcall";
    let operator = app
        .session
        .display_name()
        .map(|name| format!("{} · [?] Help", name))
        .unwrap_or_else(|| "[?] Help".to_string());

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + operator.len() + 4),
        )),
        Span::styled(operator, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut tabs = vec![Tab::Arrival, Tab::Departure, Tab::Report, Tab::Students];
    if app.is_admin() {
        tabs.push(Tab::Users);
    }

    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in tabs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", i + 1, tab.title());
        spans.push(Span::styled(label, styles::tab_style(app.current_tab == *tab)));
    }

    // Show the live search query on the right while searching
    if matches!(app.state, AppState::Searching) || !app.search_query.is_empty() {
        let search_text = format!("/{}", app.search_query);
        let used: usize = spans.iter().map(|s| s.content.len()).sum();
        let padding = (area.width as usize).saturating_sub(used + search_text.len() + 2);
        spans.push(Span::raw(" ".repeat(padding)));
        spans.push(Span::styled(search_text, styles::search_style()));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Arrival => scan::render(frame, app, area, ScanDirection::Arrival),
        Tab::Departure => scan::render(frame, app, area, ScanDirection::Departure),
        Tab::Report => report::render(frame, app, area),
        Tab::Students => students::render(frame, app, area),
        Tab::Users => users::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[/] search | [q]uit";

    let (left_text, left_style) = match app.status {
        Some(ref status) => {
            let style = match status.kind {
                StatusKind::Info => styles::muted_style(),
                StatusKind::Success => styles::success_style(),
                StatusKind::Error => styles::error_style(),
            };
            (format!(" {} ", status.text), style)
        }
        None => {
            let hint = if app.report.is_populated() {
                format!(" {} attendance records cached ", app.report.len())
            } else {
                " Ready ".to_string()
            };
            (hint, styles::muted_style())
        }
    };

    let right_text = format!(" {} ", shortcuts);
    let left_text = crate::utils::truncate(
        &left_text,
        (area.width as usize).saturating_sub(right_text.len() + 1),
    );
    let padding = (area.width as usize)
        .saturating_sub(left_text.len())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding)),
        Span::styled(right_text, styles::muted_style()),
    ]);

    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 24, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  ╦═╗╔═╗╦  ╦  ╔═╗╔═╗╦  ╦  ", styles::title_style())),
        Line::from(Span::styled("  ╠╦╝║ ║║  ║  ║  ╠═╣║  ║  ", styles::title_style())),
        Line::from(Span::styled("  ╩╚═╚═╝╩═╝╩═╝╚═╝╩ ╩╩═╝╩═╝", styles::title_style())),
        Line::from(Span::styled(
            format!("         version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("  1-5       ", "Switch tabs"),
        help_line("  ←/→       ", "Prev/next tab"),
        help_line("  ↑/↓       ", "Navigate tables"),
        help_line("  Esc       ", "Close overlay / clear search"),
        Line::from(""),
        Line::from(Span::styled(" Scanning", styles::highlight_style())),
        help_line("  (type)    ", "Scanner input goes to the scan line"),
        help_line("  Enter     ", "Record the scan"),
        Line::from(""),
        Line::from(Span::styled(" Report", styles::highlight_style())),
        help_line("  e/f       ", "Edit date range / apply filter"),
        help_line("  u         ", "Refetch attendance from the server"),
        help_line("  x         ", "Export filtered rows to .xlsx"),
        Line::from(""),
        Line::from(Span::styled(" Rosters", styles::highlight_style())),
        help_line("  a/e/d     ", "Add / edit / delete entry"),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(key, styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 13 } else { 11 };
    let area = centered_rect_fixed(46, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled("      ╦═╗╔═╗╦  ╦  ╔═╗╔═╗╦  ╦  ", styles::title_style())),
        Line::from(Span::styled("      ╠╦╝║ ║║  ║  ║  ╠═╣║  ║  ", styles::title_style())),
        Line::from(Span::styled("      ╩╚═╚═╝╩═╝╩═╝╚═╝╩ ╩╩═╝╩═╝", styles::title_style())),
        Line::from(""),
    ];

    let field = |label: &'static str, value: String, focused: bool| -> Line<'static> {
        let style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let cursor = if focused { "▌" } else { "" };
        Line::from(vec![
            Span::raw("      "),
            Span::styled(label, styles::muted_style()),
            Span::styled(format!("{:<16}{}", value, cursor), style),
            Span::styled("]", styles::muted_style()),
        ])
    };

    lines.push(field(
        "Username: [",
        app.login_username.clone(),
        app.login_focus == LoginFocus::Username,
    ));
    lines.push(field(
        "Password: [",
        "*".repeat(app.login_password.len().min(16)),
        app.login_focus == LoginFocus::Password,
    ));

    lines.push(Line::from(""));
    let button_focused = app.login_focus == LoginFocus::Button;
    let button_label = if button_focused { " ▶ Login ◀ " } else { "   Login   " };
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    lines.push(Line::from(vec![
        Span::raw("            ["),
        Span::styled(button_label, button_style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(52, 8, frame.area());
    frame.render_widget(Clear, area);

    let subject = match app.pending_delete {
        Some(DeleteTarget::Student {
            ref student_id,
            ref name,
        }) => format!("student {} ({})", name, student_id),
        Some(DeleteTarget::User { ref username }) => format!("user '{}'", username),
        None => "this entry".to_string(),
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("   Delete from the roster?", styles::error_style())),
        Line::from(Span::styled(format!("   {}", subject), styles::list_item_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to delete, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn form_field(label: &'static str, value: String, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::raw("   "),
        Span::styled(format!("{:<10}", label), styles::muted_style()),
        Span::styled("[", styles::muted_style()),
        Span::styled(format!("{:<24}{}", value, cursor), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn render_student_form_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(48, 11, frame.area());
    frame.render_widget(Clear, area);

    let form = &app.student_form;
    let focus = form.focus.unwrap_or(StudentFormFocus::Id);
    let title = if form.original_id.is_some() {
        " Edit student "
    } else {
        " Add student "
    };

    let lines = vec![
        Line::from(""),
        form_field("Id", form.student_id.clone(), focus == StudentFormFocus::Id),
        form_field("Name", form.name.clone(), focus == StudentFormFocus::Name),
        form_field("Class", form.class_name.clone(), focus == StudentFormFocus::Class),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Tab", styles::help_key_style()),
            Span::styled(" next field  ", styles::muted_style()),
            Span::styled("Enter", styles::help_key_style()),
            Span::styled(" save  ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_user_form_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(48, 12, frame.area());
    frame.render_widget(Clear, area);

    let form = &app.user_form;
    let focus = form.focus.unwrap_or(UserFormFocus::Name);
    let title = if form.original_username.is_some() {
        " Edit user "
    } else {
        " Add user "
    };

    // Blank password on an existing account keeps the stored one
    let password_display = if form.password.is_empty() && form.original_username.is_some() {
        "(unchanged)".to_string()
    } else {
        "*".repeat(form.password.len().min(24))
    };

    let lines = vec![
        Line::from(""),
        form_field("Name", form.name.clone(), focus == UserFormFocus::Name),
        form_field("Username", form.username.clone(), focus == UserFormFocus::Username),
        form_field("Role", form.role.clone(), focus == UserFormFocus::Role),
        form_field("Password", password_display, focus == UserFormFocus::Password),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Tab", styles::help_key_style()),
            Span::styled(" next field  ", styles::muted_style()),
            Span::styled("Enter", styles::help_key_style()),
            Span::styled(" save  ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

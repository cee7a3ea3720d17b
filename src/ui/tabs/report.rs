//! Date-filtered attendance report.
//!
//! Filtering always runs against the in-memory batch; the network is only
//! touched on first entry or an explicit refresh.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, AppState, RangeFocus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Range inputs
            Constraint::Min(5),    // Results table
        ])
        .split(area);

    render_range_bar(frame, app, chunks[0]);
    render_result_table(frame, app, chunks[1]);
}

fn render_range_bar(frame: &mut Frame, app: &App, area: Rect) {
    let editing = matches!(app.state, AppState::EditingRange);

    let field = |value: &str, focused: bool| -> Span<'static> {
        let text = format!("{:<10}", value);
        if focused && editing {
            Span::styled(format!("{}▌", text), styles::selected_style())
        } else {
            Span::styled(text, styles::list_item_style())
        }
    };

    let line = Line::from(vec![
        Span::styled(" From [", styles::muted_style()),
        field(&app.range_start, app.range_focus == RangeFocus::Start),
        Span::styled("]  To [", styles::muted_style()),
        field(&app.range_end, app.range_focus == RangeFocus::End),
        Span::styled("]   ", styles::muted_style()),
        Span::styled("[e]", styles::help_key_style()),
        Span::styled("dit range  ", styles::muted_style()),
        Span::styled("[f]", styles::help_key_style()),
        Span::styled("ilter  ", styles::muted_style()),
        Span::styled("[u]", styles::help_key_style()),
        Span::styled("refresh  ", styles::muted_style()),
        Span::styled("[x]", styles::help_key_style()),
        Span::styled("export", styles::muted_style()),
    ]);

    let block = Block::default()
        .title(" Date range (inclusive) ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(editing));

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_result_table(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.is_report_loading() {
        " Report - fetching attendance data... ".to_string()
    } else if !app.report.is_populated() {
        " Report ".to_string()
    } else {
        format!(
            " Report ({} of {} records) ",
            app.filtered.len(),
            app.report.len()
        )
    };

    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(!matches!(
            app.state,
            AppState::EditingRange
        )));

    // Placeholder states render as a paragraph instead of an empty table
    if app.filter_applied && app.filtered.is_empty() {
        let placeholder = Paragraph::new(Line::from(Span::styled(
            "  No attendance records found for this date range.",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(placeholder, area);
        return;
    }
    if !app.filter_applied {
        let hint = if app.is_report_loading() {
            "  Loading..."
        } else {
            "  Press [f] to filter the cached records."
        };
        let placeholder =
            Paragraph::new(Line::from(Span::styled(hint, styles::muted_style()))).block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let header = Row::new([
        Cell::from("Date"),
        Cell::from("Student ID"),
        Cell::from("Name"),
        Cell::from("Arrival"),
        Cell::from("Departure"),
        Cell::from("Status"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .filtered
        .iter()
        .map(|record| {
            Row::new(vec![
                Cell::from(record.formatted_date()),
                Cell::from(record.student_id.as_str()),
                Cell::from(app.display_name_for(record)),
                Cell::from(record.formatted_check_in()),
                Cell::from(record.formatted_check_out()),
                Cell::from(record.status_display()),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Fill(1),
        Constraint::Length(9),
        Constraint::Length(10),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.report_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

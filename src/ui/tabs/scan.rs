//! Arrival and departure scan stations.
//!
//! A keyboard-wedge QR scanner behaves like fast typing followed by Enter,
//! so the scan input line accepts both hardware scans and manual entry.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::app::App;
use crate::models::ScanDirection;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect, direction: ScanDirection) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Scan input line
            Constraint::Length(6), // Last scan result panel
            Constraint::Min(5),    // Session log
        ])
        .split(area);

    render_input_line(frame, app, chunks[0], direction);
    render_result_panel(frame, app, chunks[1], direction);
    render_session_log(frame, app, chunks[2], direction);
}

fn render_input_line(frame: &mut Frame, app: &App, area: Rect, direction: ScanDirection) {
    let title = format!(" {} scan - point the scanner or type an id + Enter ", direction);

    let line = Line::from(vec![
        Span::styled("> ", styles::highlight_style()),
        Span::styled(app.scan_input.as_str(), styles::list_item_style()),
        Span::styled("▌", styles::highlight_style()),
    ]);

    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_result_panel(frame: &mut Frame, app: &App, area: Rect, direction: ScanDirection) {
    let content = match app.scan_feedback(direction) {
        Some(feedback) => {
            let headline_style = if feedback.ok {
                styles::scan_ok_style()
            } else {
                styles::scan_fail_style()
            };
            vec![
                Line::from(""),
                Line::from(Span::styled(format!("  {}", feedback.headline), headline_style)),
                Line::from(Span::styled(
                    format!("  {}", feedback.detail),
                    styles::list_item_style(),
                )),
            ]
        }
        None => vec![
            Line::from(""),
            Line::from(Span::styled(
                "  Waiting for the first scan...",
                styles::muted_style(),
            )),
        ],
    };

    let block = Block::default()
        .title(" Last scan ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(content).block(block), area);
}

fn render_session_log(frame: &mut Frame, app: &App, area: Rect, direction: ScanDirection) {
    let log = app.scan_log(direction);

    let header = Row::new([Cell::from("Time"), Cell::from("Student ID"), Cell::from("Name")])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = log
        .iter()
        .map(|entry| {
            Row::new(vec![
                Cell::from(entry.time.as_str()),
                Cell::from(entry.student_id.as_str()),
                Cell::from(entry.name.as_str()),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Length(16),
        Constraint::Fill(1),
    ];

    let title = format!(" {} log - this session ({}) ", direction, log.len());

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(title)
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(false)),
    );

    frame.render_widget(table, area);
}

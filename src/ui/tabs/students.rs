//! Student roster table with add/edit/delete.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let students = app.visible_students();

    let header = Row::new([
        Cell::from("Student ID"),
        Cell::from("Name"),
        Cell::from("Class"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = students
        .iter()
        .map(|student| {
            Row::new(vec![
                Cell::from(student.student_id.as_str()),
                Cell::from(student.name.as_str()),
                Cell::from(student.class_display()),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Length(16),
        Constraint::Fill(1),
        Constraint::Length(12),
    ];

    let title = if app.search_query.is_empty() {
        format!(
            " Students ({}) - [a]dd [e]dit [d]elete [u]pdate ",
            students.len()
        )
    } else {
        format!(
            " Students ({}) - filter: {} ",
            students.len(),
            app.search_query
        )
    };

    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if students.is_empty() {
        let text = if app.students_loaded {
            "  No students match."
        } else {
            "  Loading student roster..."
        };
        let placeholder =
            Paragraph::new(Line::from(Span::styled(text, styles::muted_style()))).block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.student_selection.min(students.len() - 1)));

    frame.render_stateful_widget(table, area, &mut state);
}

//! Staff account table, visible to administrators only.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let users = app.visible_users();

    let header = Row::new([
        Cell::from("Name"),
        Cell::from("Username"),
        Cell::from("Role"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = users
        .iter()
        .map(|user| {
            let role_style = if user.is_admin() {
                styles::highlight_style()
            } else {
                styles::list_item_style()
            };
            Row::new(vec![
                Cell::from(user.name.as_str()),
                Cell::from(user.username.as_str()),
                Cell::from(Span::styled(user.role_display(), role_style)),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Fill(1),
        Constraint::Length(20),
        Constraint::Length(12),
    ];

    let title = if app.search_query.is_empty() {
        format!(" Users ({}) - [a]dd [e]dit [d]elete [u]pdate ", users.len())
    } else {
        format!(" Users ({}) - filter: {} ", users.len(), app.search_query)
    };

    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if users.is_empty() {
        let text = if app.users_loaded {
            "  No users match."
        } else {
            "  Loading staff accounts..."
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
    state.select(Some(app.user_selection.min(users.len() - 1)));

    frame.render_stateful_widget(table, area, &mut state);
}

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use plank::session::format_secs;

use super::App;

/// History screen: finished planks, most recent first
pub fn render_history(app: &App, f: &mut Frame) {
    let area = f.area();
    let view = app.history_view();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Sessions table
            Constraint::Length(3), // Summary
            Constraint::Length(3), // Instructions
        ])
        .split(area);

    let title = Paragraph::new("История тренировок")
        .block(Block::default().borders(Borders::ALL))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    if view.sessions.is_empty() {
        let no_data = Paragraph::new("Пока нет ни одной тренировки.")
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(no_data, chunks[1]);
    } else {
        let table_height = chunks[1].height.saturating_sub(3) as usize; // borders and header
        let total_rows = view.sessions.len();
        let best = view.summary.map(|s| s.best_secs);

        let header = Row::new(vec![Cell::from("Дата"), Cell::from("Время")]).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let visible_rows: Vec<Row> = view
            .sessions
            .iter()
            .skip(view.scroll_offset)
            .take(table_height)
            .map(|session| {
                let time_style = if Some(session.time) == best {
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(session.formatted_date()),
                    Cell::from(session.formatted_time()).style(time_style),
                ])
            })
            .collect();

        let scroll_info = if total_rows > table_height {
            format!(
                " ({}/{})",
                (view.scroll_offset + visible_rows.len()).min(total_rows),
                total_rows
            )
        } else {
            String::new()
        };

        let table = Table::new(visible_rows, [Constraint::Length(28), Constraint::Length(14)])
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Тренировки{scroll_info}")),
            );
        f.render_widget(table, chunks[1]);
    }

    let summary_text = match view.summary {
        Some(s) => format!(
            "Всего: {}   Лучший результат: {}   В среднем: {:.0} сек.   Суммарно: {}",
            s.count,
            format_secs(s.best_secs),
            s.average_secs,
            format_secs(s.total_secs)
        ),
        None => String::new(),
    };
    let summary = Paragraph::new(summary_text)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
    f.render_widget(summary, chunks[2]);

    let instructions = Paragraph::new("↑/↓ PgUp/PgDn | (b)ack (esc)ape")
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center);
    f.render_widget(instructions, chunks[3]);
}

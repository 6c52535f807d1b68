pub mod camera;
pub mod history;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};

use plank::{
    app::{PlankApp, PresenceMode},
    controller::Phase,
    session::format_secs,
    storage::KeyValueStore,
};

/// The app as the binary runs it, with the storage backend picked at startup
pub type App = PlankApp<Box<dyn KeyValueStore>>;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

const DESCRIPTION: &str =
    "Встаньте в планку так, чтобы камера видела ваше лицо. Секундомер остановится, как только лицо пропадёт из кадра.";

pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(app.screen()).render(app, f);
}

/// Trainer screen: camera panel, start action, countdown and stopwatch, result popup
pub struct TrainerView<'a>(pub &'a App);

impl Widget for TrainerView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.0;
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(6),    // camera
                Constraint::Length(1), // padding
                Constraint::Length(3), // description / countdown / stopwatch
                Constraint::Length(1), // start action
                Constraint::Length(1), // padding
                Constraint::Length(1), // legend
            ])
            .split(area);

        camera::CameraPanel::new(app.faces(), app.controller().is_face_present()).render(chunks[0], buf);

        match app.phase() {
            Phase::Idle | Phase::Finished { .. } => {
                Paragraph::new(Span::styled(DESCRIPTION, italic_style))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true })
                    .render(chunks[2], buf);

                let start_style = if app.can_start() {
                    Style::default().patch(bold_style).fg(Color::Green)
                } else {
                    dim_style
                };
                Paragraph::new(Span::styled("[ Старт ]", start_style))
                    .alignment(Alignment::Center)
                    .render(chunks[3], buf);
            }
            Phase::Countdown { remaining } => {
                Paragraph::new(Span::styled(
                    remaining.to_string(),
                    Style::default().patch(bold_style).fg(Color::Yellow),
                ))
                .alignment(Alignment::Center)
                .render(chunks[2], buf);
            }
            Phase::Running { .. } => {
                Paragraph::new(Span::styled(format_secs(app.displayed_secs()), bold_style))
                    .alignment(Alignment::Center)
                    .render(chunks[2], buf);
            }
        }

        let legend = match app.presence_mode() {
            PresenceMode::Manual { .. } => "(space) start  (f) face in frame  (h) history  (esc) quit",
            PresenceMode::Detector => "(space) start  (h) history  (esc) quit",
        };
        Paragraph::new(Span::styled(legend, italic_style))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);

        if let Phase::Finished { session } = app.phase() {
            render_result(session.time, area, buf);
        }
    }
}

fn render_result(secs: u64, area: Rect, buf: &mut Buffer) {
    let popup = centered_rect(60, 7, area);
    Clear.render(popup, buf);

    let text = vec![
        Line::from(Span::styled(
            format!("Вы простояли в планке {secs} секунд"),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("(h) История тренировок", Style::default().fg(Color::Cyan)),
            Span::raw("   "),
            Span::styled("(c) Продолжить", Style::default().fg(Color::Green)),
        ]),
    ];

    Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Отлично!"))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(popup, buf);
}

/// Rect of `percent_x` width and fixed `height`, centered in `area`
pub fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let height = height.min(area.height);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height - height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

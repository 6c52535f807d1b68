use ratatui::Frame;

use plank::app::Screen as ScreenKind;

use super::{history::render_history, App, TrainerView};

/// A UI Screen boundary: responsible for rendering one app screen
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Trainer screen - camera, countdown, stopwatch and the result popup
pub struct TrainerScreen;

impl Screen for TrainerScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(TrainerView(app), f.area());
    }
}

/// History screen - uses dedicated renderer
pub struct HistoryScreen;

impl Screen for HistoryScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_history(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(kind: ScreenKind) -> Box<dyn Screen> {
    match kind {
        ScreenKind::Trainer => Box::new(TrainerScreen),
        ScreenKind::History => Box::new(HistoryScreen),
    }
}

use chrono::{DateTime, Local, Locale};
use serde::{Deserialize, Serialize};

/// Format used by the history list, e.g. "01 марта 2024, 10:00"
pub const DATE_FORMAT: &str = "%d %B %Y, %H:%M";
pub const DATE_LOCALE: Locale = Locale::ru_RU;

/// One completed plank: when it ended and how long it lasted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSession {
    pub date: DateTime<Local>,
    /// whole seconds
    pub time: u64,
}

impl TrainingSession {
    pub fn new(date: DateTime<Local>, time: u64) -> Self {
        Self { date, time }
    }

    /// Build the record for a plank that started at `started_at` and ended at `finished_at`.
    /// The duration is floored to whole seconds and never negative.
    pub fn completed(started_at: DateTime<Local>, finished_at: DateTime<Local>) -> Self {
        Self {
            date: finished_at,
            time: elapsed_secs(started_at, finished_at),
        }
    }

    pub fn formatted_date(&self) -> String {
        self.date
            .format_localized(DATE_FORMAT, DATE_LOCALE)
            .to_string()
    }

    pub fn formatted_time(&self) -> String {
        format_secs(self.time)
    }
}

/// Whole seconds between two instants, clamped at zero
pub fn elapsed_secs(from: DateTime<Local>, to: DateTime<Local>) -> u64 {
    (to - from).num_seconds().max(0) as u64
}

pub fn format_secs(secs: u64) -> String {
    format!("{secs} сек.")
}

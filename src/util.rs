use itertools::{Itertools, MinMaxResult};

use crate::session::TrainingSession;

pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Aggregate figures shown under the history list
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HistorySummary {
    pub count: usize,
    pub total_secs: u64,
    pub best_secs: u64,
    pub shortest_secs: u64,
    pub average_secs: f64,
}

pub fn summarize(sessions: &[TrainingSession]) -> Option<HistorySummary> {
    let (shortest_secs, best_secs) = match sessions.iter().map(|s| s.time).minmax() {
        MinMaxResult::NoElements => return None,
        MinMaxResult::OneElement(t) => (t, t),
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
    };
    let times = sessions.iter().map(|s| s.time as f64).collect_vec();

    Some(HistorySummary {
        count: sessions.len(),
        total_secs: sessions.iter().map(|s| s.time).sum(),
        best_secs,
        shortest_secs,
        average_secs: mean(&times).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn sessions(times: &[u64]) -> Vec<TrainingSession> {
        let date = Local.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        times
            .iter()
            .map(|&t| TrainingSession::new(date, t))
            .collect()
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10., 20., 30., 15., 22.]), Some(19.4));
        assert_eq!(mean(&[42.0]), Some(42.0));
    }

    #[test]
    fn test_mean_empty_slice() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&[]), None);
    }

    #[test]
    fn test_summarize_single() {
        let summary = summarize(&sessions(&[30])).unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.best_secs, 30);
        assert_eq!(summary.shortest_secs, 30);
        assert_eq!(summary.average_secs, 30.0);
    }

    #[test]
    fn test_summarize_many() {
        let summary = summarize(&sessions(&[10, 25, 0, 45])).unwrap();
        assert_eq!(summary.count, 4);
        assert_eq!(summary.total_secs, 80);
        assert_eq!(summary.best_secs, 45);
        assert_eq!(summary.shortest_secs, 0);
        assert_eq!(summary.average_secs, 20.0);
    }
}

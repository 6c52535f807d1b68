use chrono::{DateTime, Duration, Local};
use tracing::{debug, warn};

use crate::controller::{Phase, SessionController};
use crate::detector::{Detection, FaceRegion};
use crate::history::HistoryStore;
use crate::session::TrainingSession;
use crate::storage::KeyValueStore;
use crate::util::{summarize, HistorySummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Trainer,
    History,
}

/// Choices offered once a plank is over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultChoice {
    Continue,
    ShowHistory,
}

/// Where presence comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceMode {
    /// toggled from the keyboard and re-sampled on every tick
    Manual { present: bool },
    /// frames from an external detector
    Detector,
}

#[derive(Debug, Default)]
pub struct HistoryView {
    pub sessions: Vec<TrainingSession>,
    pub summary: Option<HistorySummary>,
    pub scroll_offset: usize,
}

/// Owns the controller and the history, and turns runtime events into transitions.
/// All calls happen on the one thread that drains the event queue.
#[derive(Debug)]
pub struct PlankApp<S: KeyValueStore> {
    controller: SessionController,
    history: HistoryStore<S>,
    presence_mode: PresenceMode,
    screen: Screen,
    faces: Vec<FaceRegion>,
    next_second: Option<DateTime<Local>>,
    displayed_secs: u64,
    history_view: HistoryView,
}

impl<S: KeyValueStore> PlankApp<S> {
    pub fn new(controller: SessionController, history: HistoryStore<S>, presence_mode: PresenceMode) -> Self {
        Self {
            controller,
            history,
            presence_mode,
            screen: Screen::Trainer,
            faces: Vec::new(),
            next_second: None,
            displayed_secs: 0,
            history_view: HistoryView::default(),
        }
    }

    pub fn phase(&self) -> &Phase {
        self.controller.phase()
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn history(&self) -> &HistoryStore<S> {
        &self.history
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn presence_mode(&self) -> PresenceMode {
        self.presence_mode
    }

    pub fn faces(&self) -> &[FaceRegion] {
        &self.faces
    }

    /// Stopwatch value as last refreshed by the per-second tick
    pub fn displayed_secs(&self) -> u64 {
        self.displayed_secs
    }

    pub fn history_view(&self) -> &HistoryView {
        &self.history_view
    }

    pub fn can_start(&self) -> bool {
        self.controller.can_start()
    }

    pub fn start(&mut self, now: DateTime<Local>) -> bool {
        if !self.controller.start() {
            return false;
        }
        self.next_second = Some(now + Duration::seconds(1));
        true
    }

    /// Runner tick: re-sample manual presence, then fire any per-second ticks that are due
    pub fn on_tick(&mut self, now: DateTime<Local>) {
        if let PresenceMode::Manual { present } = self.presence_mode {
            self.apply_presence(Detection::manual(present), now);
        }

        while let Some(due) = self.next_second {
            if now < due {
                break;
            }
            let was_running = self.controller.is_running();
            self.controller.tick(now);

            match self.controller.phase() {
                Phase::Countdown { .. } => self.next_second = Some(due + Duration::seconds(1)),
                Phase::Running { .. } => {
                    self.displayed_secs = if was_running {
                        self.controller.elapsed_secs(now)
                    } else {
                        0
                    };
                    self.next_second = Some(due + Duration::seconds(1));
                }
                Phase::Idle | Phase::Finished { .. } => self.next_second = None,
            }
        }
    }

    /// One processed camera frame
    pub fn on_detection(&mut self, detection: Detection, now: DateTime<Local>) {
        match self.presence_mode {
            PresenceMode::Detector => self.apply_presence(detection, now),
            PresenceMode::Manual { .. } => debug!("ignoring detector frame in manual mode"),
        }
    }

    pub fn toggle_manual_presence(&mut self, now: DateTime<Local>) {
        if let PresenceMode::Manual { present } = self.presence_mode {
            self.presence_mode = PresenceMode::Manual { present: !present };
            self.apply_presence(Detection::manual(!present), now);
        }
    }

    fn apply_presence(&mut self, detection: Detection, now: DateTime<Local>) {
        let present = detection.has_face();
        self.faces = detection.faces;

        if let Some(session) = self.controller.on_presence(present, now) {
            self.next_second = None;
            self.displayed_secs = session.time;
            if let Err(e) = self.history.append(session) {
                warn!(error = %e, "failed to save session, dropping it");
            }
        }
    }

    /// Dismiss the result popup
    pub fn acknowledge(&mut self, choice: ResultChoice) -> Option<TrainingSession> {
        let session = self.controller.acknowledge()?;
        self.displayed_secs = 0;
        if choice == ResultChoice::ShowHistory {
            self.open_history();
        }
        Some(session)
    }

    pub fn open_history(&mut self) {
        let sessions = self.history.newest_first();
        self.history_view = HistoryView {
            summary: summarize(&sessions),
            sessions,
            scroll_offset: 0,
        };
        self.screen = Screen::History;
    }

    pub fn close_history(&mut self) {
        self.screen = Screen::Trainer;
    }

    pub fn scroll_history(&mut self, delta: isize) {
        let max = self.history_view.sessions.len().saturating_sub(1);
        let offset = self.history_view.scroll_offset as isize + delta;
        self.history_view.scroll_offset = offset.clamp(0, max as isize) as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StorageError};
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    fn secs(s: i64) -> DateTime<Local> {
        t0() + Duration::seconds(s)
    }

    fn detector_app() -> PlankApp<MemoryStore> {
        PlankApp::new(
            SessionController::default(),
            HistoryStore::new(MemoryStore::new()),
            PresenceMode::Detector,
        )
    }

    fn face(present: bool) -> Detection {
        Detection::manual(present)
    }

    /// Drive the runner at 100ms until `until`
    fn tick_until(app: &mut PlankApp<MemoryStore>, from_ms: i64, until_ms: i64) {
        let mut ms = from_ms;
        while ms <= until_ms {
            app.on_tick(t0() + Duration::milliseconds(ms));
            ms += 100;
        }
    }

    #[test]
    fn full_session_is_recorded() {
        let mut app = detector_app();
        app.on_detection(face(true), t0());
        assert!(app.start(t0()));

        // countdown 3,2,1,0 then running at t0+4s
        tick_until(&mut app, 100, 4_000);
        assert_eq!(app.phase(), &Phase::Running { started_at: secs(4) });

        tick_until(&mut app, 4_100, 14_000);
        assert_eq!(app.displayed_secs(), 10);

        app.on_detection(face(true), secs(20));
        app.on_detection(face(false), secs(20) + Duration::milliseconds(500));
        assert_matches!(app.phase(), Phase::Finished { session } if session.time == 16);

        let saved = app.history().load_all();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].time, 16);

        let acked = app.acknowledge(ResultChoice::Continue).unwrap();
        assert_eq!(acked.time, 16);
        assert_eq!(app.phase(), &Phase::Idle);
        assert_eq!(app.screen(), Screen::Trainer);
    }

    #[test]
    fn start_without_face_is_noop() {
        let mut app = detector_app();
        assert!(!app.start(t0()));
        tick_until(&mut app, 0, 5_000);
        assert_eq!(app.phase(), &Phase::Idle);
    }

    #[test]
    fn faces_follow_latest_frame() {
        let mut app = detector_app();
        app.on_detection(
            Detection {
                faces: vec![FaceRegion::centered(), FaceRegion::centered()],
            },
            t0(),
        );
        assert_eq!(app.faces().len(), 2);
        app.on_detection(Detection::none(), t0());
        assert!(app.faces().is_empty());
        assert!(!app.can_start());
    }

    #[test]
    fn manual_presence_is_resampled_each_tick() {
        let mut app = PlankApp::new(
            SessionController::new(0),
            HistoryStore::new(MemoryStore::new()),
            PresenceMode::Manual { present: false },
        );
        app.toggle_manual_presence(t0());
        assert!(app.can_start());
        assert!(app.start(t0()));

        tick_until(&mut app, 100, 1_000);
        assert!(app.controller().is_running());

        app.toggle_manual_presence(secs(8));
        assert_matches!(app.phase(), Phase::Finished { session } if session.time == 7);
    }

    #[test]
    fn running_without_face_ends_on_next_sample() {
        let mut app = PlankApp::new(
            SessionController::new(0),
            HistoryStore::new(MemoryStore::new()),
            PresenceMode::Manual { present: true },
        );
        app.on_tick(t0());
        app.start(t0());
        app.toggle_manual_presence(t0());

        // countdown ignores the flicker, running sees it on the following tick
        tick_until(&mut app, 1_000, 1_100);
        assert_matches!(app.phase(), Phase::Finished { session } if session.time == 0);
    }

    #[test]
    fn detector_frames_ignored_in_manual_mode() {
        let mut app = PlankApp::new(
            SessionController::default(),
            HistoryStore::new(MemoryStore::new()),
            PresenceMode::Manual { present: false },
        );
        app.on_detection(face(true), t0());
        assert!(!app.can_start());
    }

    #[test]
    fn show_history_lists_newest_first() {
        let mut app = PlankApp::new(
            SessionController::new(0),
            HistoryStore::new(MemoryStore::new()),
            PresenceMode::Detector,
        );

        for (start, end) in [(0, 10), (100, 125)] {
            app.on_detection(face(true), secs(start));
            app.start(secs(start));
            app.on_tick(secs(start + 1));
            app.on_detection(face(false), secs(start + 1 + end - start));
            app.acknowledge(ResultChoice::Continue);
        }

        app.on_detection(face(true), secs(200));
        app.start(secs(200));
        app.on_tick(secs(201));
        app.on_detection(face(false), secs(206));
        app.acknowledge(ResultChoice::ShowHistory);

        assert_eq!(app.screen(), Screen::History);
        let times: Vec<u64> = app.history_view().sessions.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![5, 25, 10]);
        assert_eq!(app.history_view().summary.unwrap().best_secs, 25);

        app.scroll_history(10);
        assert_eq!(app.history_view().scroll_offset, 2);
        app.scroll_history(-5);
        assert_eq!(app.history_view().scroll_offset, 0);

        app.close_history();
        assert_eq!(app.screen(), Screen::Trainer);
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn load(&self, _key: &str) -> Option<Vec<u8>> {
            None
        }

        fn save(&self, _key: &str, _value: &[u8]) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn write_failure_is_dropped_silently() {
        let mut app = PlankApp::new(
            SessionController::new(0),
            HistoryStore::new(FailingStore),
            PresenceMode::Detector,
        );
        app.on_detection(face(true), t0());
        app.start(t0());
        app.on_tick(secs(1));
        app.on_detection(face(false), secs(4));

        assert_matches!(app.phase(), Phase::Finished { session } if session.time == 3);
        assert!(app.history().load_all().is_empty());
        assert!(app.acknowledge(ResultChoice::Continue).is_some());
    }
}

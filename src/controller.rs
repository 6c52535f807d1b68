//! Plank session state machine.
//!
//! ```text
//! Idle --start (face visible)--> Countdown(n)
//! Countdown(n > 0) --tick--> Countdown(n - 1)
//! Countdown(0) --tick--> Running(now)
//! Running --face lost--> Finished(session)
//! Finished --acknowledge--> Idle
//! ```
//!
//! The controller never reads the clock; every time-dependent call takes `now`.

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::session::{elapsed_secs, TrainingSession};

pub const DEFAULT_COUNTDOWN_SECS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Countdown { remaining: u32 },
    Running { started_at: DateTime<Local> },
    Finished { session: TrainingSession },
}

#[derive(Debug, Clone)]
pub struct SessionController {
    phase: Phase,
    face_present: bool,
    countdown_secs: u32,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTDOWN_SECS)
    }
}

impl SessionController {
    pub fn new(countdown_secs: u32) -> Self {
        Self {
            phase: Phase::Idle,
            face_present: false,
            countdown_secs,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_face_present(&self) -> bool {
        self.face_present
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running { .. })
    }

    /// Start is offered only from Idle while a face is visible
    pub fn can_start(&self) -> bool {
        self.phase == Phase::Idle && self.face_present
    }

    /// Begin the countdown. Returns false (and changes nothing) when start is not allowed.
    pub fn start(&mut self) -> bool {
        if !self.can_start() {
            debug!(phase = ?self.phase, face_present = self.face_present, "start ignored");
            return false;
        }
        self.phase = Phase::Countdown {
            remaining: self.countdown_secs,
        };
        true
    }

    /// Advance by one second. Only the countdown reacts; running time is derived from `now`.
    pub fn tick(&mut self, now: DateTime<Local>) {
        if let Phase::Countdown { remaining } = self.phase {
            self.phase = match remaining {
                0 => {
                    info!("plank started");
                    Phase::Running { started_at: now }
                }
                n => Phase::Countdown { remaining: n - 1 },
            };
        }
    }

    /// Feed one presence sample. Losing the face while running ends the session
    /// immediately and returns the completed record.
    pub fn on_presence(&mut self, present: bool, now: DateTime<Local>) -> Option<TrainingSession> {
        self.face_present = present;

        match self.phase {
            Phase::Running { started_at } if !present => {
                let session = TrainingSession::completed(started_at, now);
                info!(secs = session.time, "plank finished");
                self.phase = Phase::Finished {
                    session: session.clone(),
                };
                Some(session)
            }
            _ => None,
        }
    }

    /// Seconds on the stopwatch; zero outside Running
    pub fn elapsed_secs(&self, now: DateTime<Local>) -> u64 {
        match self.phase {
            Phase::Running { started_at } => elapsed_secs(started_at, now),
            _ => 0,
        }
    }

    /// Dismiss the result and return to Idle, yielding the finished session
    pub fn acknowledge(&mut self) -> Option<TrainingSession> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Finished { session } => Some(session),
            other => {
                self.phase = other;
                None
            }
        }
    }
}

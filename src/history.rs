use std::io::Write;

use tracing::{debug, info};

use crate::session::TrainingSession;
use crate::storage::{KeyValueStore, StorageError};

/// Key under which the whole session list is stored
pub const HISTORY_KEY: &str = "history";

/// Append-only log of completed sessions, serialized as one JSON list
#[derive(Debug)]
pub struct HistoryStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> HistoryStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// All sessions in append order. Missing or malformed data reads as empty.
    pub fn load_all(&self) -> Vec<TrainingSession> {
        let Some(bytes) = self.store.load(HISTORY_KEY) else {
            return Vec::new();
        };

        match serde_json::from_slice::<Vec<TrainingSession>>(&bytes) {
            Ok(sessions) => sessions,
            Err(e) => {
                debug!(error = %e, len = bytes.len(), "history blob is malformed, treating as empty");
                Vec::new()
            }
        }
    }

    /// Sessions ordered for display, most recent first
    pub fn newest_first(&self) -> Vec<TrainingSession> {
        let mut sessions = self.load_all();
        sessions.reverse();
        sessions
    }

    /// Read-modify-write of the full list with `session` added at the end
    pub fn append(&self, session: TrainingSession) -> Result<(), StorageError> {
        let mut sessions = self.load_all();
        sessions.push(session);

        let bytes = serde_json::to_vec(&sessions)?;
        self.store.save(HISTORY_KEY, &bytes)?;

        info!(count = sessions.len(), "history saved");
        Ok(())
    }
}

/// Write sessions as CSV with a `date,time` header. Dates are RFC 3339.
pub fn write_csv<W: Write>(sessions: &[TrainingSession], writer: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["date", "time"])?;
    for session in sessions {
        wtr.write_record([session.date.to_rfc3339(), session.time.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

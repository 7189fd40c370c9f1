//! Session identity and command history.

use chrono::{DateTime, Local};
use cirrus_types::CommandRecord;
use parking_lot::Mutex;
use uuid::Uuid;

/// One interactive session: an id, when it started, and what was run.
///
/// Lives in memory only. History is append-only; records are never edited
/// or removed.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    started_at: DateTime<Local>,
    history: Mutex<Vec<CommandRecord>>,
}

impl Session {
    /// Start a new session with a fresh v4 id.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Local::now(),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Append a record. The lock is held only for the push.
    pub fn record(&self, record: CommandRecord) {
        self.history.lock().push(record);
    }

    /// Copy of the history in append order.
    pub fn history(&self) -> Vec<CommandRecord> {
        self.history.lock().clone()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

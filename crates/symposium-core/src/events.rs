//! Table event stream
//!
//! The arbiter narrates every state transition (and any adjacency
//! violation) to an [`EventSink`] instead of printing. Sinks are invoked
//! while the arbiter lock is held, so implementations must stay quick and
//! must never call back into the arbiter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

use crate::table::{SeatId, SeatState, SeatView};

/// One protocol event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableEvent {
    /// A seat moved to a new state; neighbor states are the ones recorded
    /// at the instant of the transition, inside the critical section
    Transition {
        seat: SeatId,
        state: SeatState,
        left: SeatView,
        right: SeatView,
    },
    /// A seat about to eat observed a neighbor recorded as eating
    Violation {
        seat: SeatId,
        left: SeatView,
        right: SeatView,
    },
}

/// Consumer of protocol events
pub trait EventSink: Send + Sync {
    fn record(&self, event: &TableEvent);
}

/// Discards every event
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: &TableEvent) {}
}

/// Narrates events through `tracing`
///
/// Transitions go out at info level, violations at warn. The sink is
/// opt-in, so an embedding that does not want the narration simply does
/// not install it.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &TableEvent) {
        match event {
            TableEvent::Transition { seat, state, .. } => {
                tracing::info!(seat = *seat, state = %state, "seat transition");
            }
            TableEvent::Violation { seat, left, right } => {
                tracing::warn!(
                    seat = *seat,
                    left_seat = left.seat,
                    left_state = %left.state,
                    right_seat = right.seat,
                    right_state = %right.state,
                    "adjacency violation"
                );
            }
        }
    }
}

/// Dispatches each event to several sinks in order
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

impl EventSink for FanoutSink {
    fn record(&self, event: &TableEvent) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}

/// Timestamped record written to an event log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event timestamp
    pub timestamp: DateTime<Utc>,
    /// Run ID for grouping records from the same run
    pub run_id: Uuid,
    #[serde(flatten)]
    pub event: TableEvent,
}

/// Event sink that appends one JSON line per event to a log file
pub struct JsonlEventSink {
    run_id: Uuid,
    file: Mutex<File>,
}

impl JsonlEventSink {
    /// Open `path` for appending, creating parent directories as needed
    pub fn create(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            run_id: Uuid::new_v4(),
            file: Mutex::new(file),
        })
    }

    /// Get the run ID stamped on this sink's records
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

impl EventSink for JsonlEventSink {
    fn record(&self, event: &TableEvent) {
        let record = EventRecord {
            timestamp: Utc::now(),
            run_id: self.run_id,
            event: event.clone(),
        };
        // A full disk must not take the protocol down with it
        if let Ok(json) = serde_json::to_string(&record) {
            let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
            let _ = writeln!(file, "{}", json);
            let _ = file.flush();
        }
    }
}

/// Read the last `count` records from an event log
pub fn read_recent_events(path: impl AsRef<Path>, count: usize) -> Vec<EventRecord> {
    let file = match File::open(path.as_ref()) {
        Ok(f) => f,
        Err(_) => return Vec::new(),
    };

    let reader = BufReader::new(file);
    let mut records: Vec<EventRecord> = reader
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str(&line).ok())
        .collect();

    if records.len() > count {
        records.drain(0..records.len() - count);
    }
    records
}

/// Read all records stamped with `run_id` from an event log
pub fn read_run_events(path: impl AsRef<Path>, run_id: Uuid) -> Vec<EventRecord> {
    let file = match File::open(path.as_ref()) {
        Ok(f) => f,
        Err(_) => return Vec::new(),
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<EventRecord>(&line).ok())
        .filter(|r| r.run_id == run_id)
        .collect()
}

/// Default event log location
pub fn events_file_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".symposium")
        .join("table-events.jsonl")
}

//! Progress reporting for collection and download runs.
//!
//! Both long-running procedures emit [`ProgressEvent`]s through a
//! [`ProgressReporter`] injected by the caller. Delivery is fire-and-forget:
//! reporters swallow their own failures so an unhappy front end can never
//! take a run down with it.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use crossbeam_queue::ArrayQueue;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// One observable step of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// One scroll round finished.
    Round {
        /// Link elements rendered in this round's snapshot.
        visible: usize,
        /// Elements whose href could not be read this round.
        skipped_elements: usize,
        /// Unique links known after this round.
        unique_total: usize,
        /// Consecutive rounds without growth, including this one.
        stagnant_rounds: u32,
    },
    /// A fetch advanced. Rate and ETA are absent when the fetcher has no
    /// estimate yet.
    Downloading {
        item: String,
        percent: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        rate_bytes_per_sec: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        eta_seconds: Option<u64>,
    },
    Finished {
        item: String,
    },
    /// Already on disk from an earlier run; nothing was fetched.
    Skipped {
        item: String,
    },
    Error {
        item: String,
        message: String,
    },
}

/// Sink for progress events. Implementations must not block the caller for
/// long and must not fail; drop events rather than propagate trouble.
pub trait ProgressReporter: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Reporter that discards everything, for callers that only want the
/// returned result.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    #[inline(always)]
    fn emit(&self, _event: ProgressEvent) {}
}

/// Forwards events to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn emit(&self, event: ProgressEvent) {
        match &event {
            ProgressEvent::Round {
                visible,
                skipped_elements,
                unique_total,
                stagnant_rounds,
            } => {
                info!(
                    visible,
                    skipped_elements, unique_total, stagnant_rounds, "scroll round"
                );
            }
            ProgressEvent::Downloading { item, percent, .. } => {
                debug!(item = %item, percent, "downloading");
            }
            ProgressEvent::Finished { item } => info!(item = %item, "finished"),
            ProgressEvent::Skipped { item } => info!(item = %item, "already on disk, skipped"),
            ProgressEvent::Error { item, message } => {
                warn!(item = %item, %message, "download failed");
            }
        }
    }
}

/// Bounded event buffer for a polling front end.
///
/// When the queue is full the oldest event is dropped, so a stalled consumer
/// slows nothing down and sees the most recent window of events.
pub struct QueueReporter {
    queue: ArrayQueue<ProgressEvent>,
}

impl QueueReporter {
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity),
        }
    }

    /// Removes and returns up to `max` buffered events, oldest first.
    pub fn drain(&self, max: usize) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while events.len() < max {
            match self.queue.pop() {
                Some(event) => events.push(event),
                None => break,
            }
        }
        events
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl ProgressReporter for QueueReporter {
    fn emit(&self, event: ProgressEvent) {
        // force_push evicts the oldest event on overflow
        let _ = self.queue.force_push(event);
    }
}

/// Appends each event as one JSON object per line.
pub struct JsonlReporter {
    file: Mutex<File>,
}

impl JsonlReporter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| Error::Storage {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl ProgressReporter for JsonlReporter {
    fn emit(&self, event: ProgressEvent) {
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                debug!("event serialization failed: {e}");
                return;
            }
        };
        let Ok(mut file) = self.file.lock() else {
            return;
        };
        if let Err(e) = writeln!(file, "{line}") {
            debug!("event log write failed: {e}");
        }
    }
}

/// Duplicates every event to each inner reporter, in insertion order.
#[derive(Default)]
pub struct FanoutReporter {
    inner: Vec<Box<dyn ProgressReporter>>,
}

impl FanoutReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reporter: Box<dyn ProgressReporter>) {
        self.inner.push(reporter);
    }
}

impl ProgressReporter for FanoutReporter {
    fn emit(&self, event: ProgressEvent) {
        for reporter in &self.inner {
            reporter.emit(event.clone());
        }
    }
}

// ABOUTME: Append-only, ordered deployment log with live tail support.
// ABOUTME: Hidden entries stay in the record but are filtered from the visible tail.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// One immutable log line produced during a deployment.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentOutput {
    pub output: String,
    pub timestamp: DateTime<Utc>,
    /// Excluded from the user-visible tail; still part of the ordered record.
    pub hidden: bool,
}

impl DeploymentOutput {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            timestamp: Utc::now(),
            hidden: false,
        }
    }

    pub fn hidden(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            timestamp: Utc::now(),
            hidden: true,
        }
    }

    /// Render as a JSON line for scripting consumers.
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.output.clone())
    }
}

/// Append-only log associated with one deployment.
///
/// Entries are appended, never edited or removed. Observers tail the sink
/// incrementally with [`DeploymentLog::tail_from`], keeping their own cursor.
#[derive(Debug, Default, Clone)]
pub struct DeploymentLog {
    entries: Arc<Mutex<Vec<DeploymentOutput>>>,
}

impl DeploymentLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, entry: DeploymentOutput) {
        self.entries.lock().push(entry);
    }

    /// Append a visible, user-facing line.
    pub fn push(&self, output: impl Into<String>) {
        self.append(DeploymentOutput::new(output));
    }

    /// Append a line kept out of the user-visible tail.
    pub fn push_hidden(&self, output: impl Into<String>) {
        self.append(DeploymentOutput::hidden(output));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Entries appended since `cursor`, together with the new cursor position.
    pub fn tail_from(&self, cursor: usize) -> (Vec<DeploymentOutput>, usize) {
        let entries = self.entries.lock();
        let new = entries.get(cursor..).unwrap_or_default().to_vec();
        (new, entries.len())
    }

    /// All user-visible entries, in order.
    pub fn visible(&self) -> Vec<DeploymentOutput> {
        self.entries
            .lock()
            .iter()
            .filter(|e| !e.hidden)
            .cloned()
            .collect()
    }

    /// Full ordered record including hidden entries.
    pub fn snapshot(&self) -> Vec<DeploymentOutput> {
        self.entries.lock().clone()
    }
}

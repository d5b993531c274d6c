//! Critique memory: short lessons carried from one tick or run to the next.
//!
//! Stored as `{"rules": [...]}` in a single JSON file. The file is the only
//! state shared between runs of a sweep, so every append reloads it
//! first and writes the result atomically.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crisis_types::{MetricsReport, RejectionReason};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::tick::TickSummary;

/// Errors that can occur while persisting memory or results.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// Filesystem failure.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File being written.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// Serialization failure.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying error.
        #[from]
        source: serde_json::Error,
    },
}

/// Write `value` as pretty JSON to `path` through a temporary sibling file
/// and a rename, creating parent directories as needed.
pub fn write_json_atomic<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), MemoryError> {
    let io_err = |source| MemoryError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MemoryFile {
    #[serde(default)]
    rules: Vec<String>,
}

/// Bounded, file-backed list of critiques.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CritiqueMemory {
    path: PathBuf,
    capacity: usize,
}

impl CritiqueMemory {
    /// Memory stored at `path`, keeping at most `capacity` critiques.
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity,
        }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Maximum number of critiques kept.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored critiques, oldest first.
    ///
    /// A missing or unreadable file is treated as empty memory.
    pub fn load(&self) -> Vec<String> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "Critique memory unreadable, starting empty");
                return Vec::new();
            }
        };
        match serde_json::from_str::<MemoryFile>(&text) {
            Ok(file) => file.rules,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "Critique memory corrupt, starting empty");
                Vec::new()
            }
        }
    }

    /// Append a critique, keeping only the most recent `capacity` entries.
    ///
    /// Reloads the file first so concurrent writers lose at most one
    /// interleaved entry.
    pub fn append(&self, critique: impl Into<String>) -> Result<(), MemoryError> {
        let mut rules = self.load();
        rules.push(critique.into());
        let excess = rules.len().saturating_sub(self.capacity);
        rules.drain(..excess);
        write_json_atomic(&MemoryFile { rules }, &self.path)?;
        debug!(path = %self.path.display(), "Critique stored");
        Ok(())
    }

    /// Stored critiques as numbered lines, or `None` when memory is empty.
    pub fn render(&self) -> Option<String> {
        let rules = self.load();
        if rules.is_empty() {
            return None;
        }
        let out: String = rules
            .iter()
            .enumerate()
            .map(|(i, rule)| format!("{}. {rule}\n", i.saturating_add(1)))
            .collect();
        Some(out)
    }
}

const fn hint(reason: RejectionReason) -> &'static str {
    match reason {
        RejectionReason::UnknownAgent => "only address agents listed in the state",
        RejectionReason::OutOfBounds => "keep move targets inside the grid",
        RejectionReason::PathBlocked => "route around fire and rubble",
        RejectionReason::CapabilityMismatch => {
            "match actions to agent kinds and stand next to the target"
        }
        RejectionReason::ResourceExhausted => "resupply or recharge at the depot first",
    }
}

/// Summarize the rejected commands of a tick, or `None` if all applied.
pub fn critique_tick(summary: &TickSummary) -> Option<String> {
    let mut counts: BTreeMap<RejectionReason, usize> = BTreeMap::new();
    for reason in summary.rejections().filter_map(|o| o.rejection) {
        let n = counts.entry(reason).or_insert(0);
        *n = n.saturating_add(1);
    }
    if counts.is_empty() {
        return None;
    }
    let parts: Vec<String> = counts
        .into_iter()
        .map(|(reason, n)| format!("{n}x {reason} ({})", hint(reason)))
        .collect();
    Some(format!("Tick {}: {}", summary.tick, parts.join("; ")))
}

/// Summarize what went wrong in a finished run, or `None` for a clean run.
pub fn critique_episode(report: &MetricsReport) -> Option<String> {
    let mut notes = Vec::new();
    if report.deaths > 0 {
        notes.push(format!(
            "lost {} of {} survivors; reach the smallest deadlines first",
            report.deaths, report.total_survivors
        ));
    }
    if report.invalid_json > 0 {
        notes.push(format!(
            "{} responses failed validation; emit only the commands object",
            report.invalid_json
        ));
    }
    if report.hospital_overflow_events > 0 {
        notes.push(format!(
            "{} deliveries queued at full hospitals; spread drops across hospitals",
            report.hospital_overflow_events
        ));
    }
    if notes.is_empty() {
        None
    } else {
        Some(format!("Run of {} ticks: {}", report.ticks, notes.join("; ")))
    }
}

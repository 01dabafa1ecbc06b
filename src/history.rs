//! Session history storage
//!
//! Records are append-only. The only rewrite is age-based cleanup, which
//! writes the surviving records to a temporary file and renames it over the
//! original, so readers never observe a partially written history.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{PaletteError, Result};
use crate::session::SessionRecord;

/// Aggregate counts over the stored history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStatistics {
    pub total_sessions: usize,
    pub total_analyses: usize,
    pub total_matches: usize,
    /// Matches per pencil brand
    pub brand_popularity: BTreeMap<String, usize>,
}

impl HistoryStatistics {
    pub fn from_records(records: &[SessionRecord]) -> Self {
        let sessions: BTreeSet<&str> = records.iter().map(|r| r.session_id()).collect();
        let mut brand_popularity = BTreeMap::new();
        for m in records.iter().flat_map(|r| r.matches()) {
            *brand_popularity.entry(m.pencil.brand.clone()).or_insert(0) += 1;
        }

        Self {
            total_sessions: sessions.len(),
            total_analyses: records.len(),
            total_matches: records.iter().map(|r| r.matches().len()).sum(),
            brand_popularity,
        }
    }
}

/// Storage backend for completed analyses
pub trait SessionStore {
    /// Append one record
    fn save(&mut self, record: &SessionRecord) -> Result<()>;

    /// Every stored record in insertion order
    fn all(&self) -> Result<Vec<SessionRecord>>;

    /// Delete records created before `cutoff`, returning how many were removed
    fn remove_older_than(&mut self, cutoff: DateTime<Utc>) -> Result<usize>;

    /// Latest records of one session, newest first
    fn recent(&self, session_id: &str, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut records: Vec<SessionRecord> = self
            .all()?
            .into_iter()
            .filter(|r| r.session_id() == session_id)
            .collect();
        records.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        records.truncate(limit);
        Ok(records)
    }

    fn statistics(&self) -> Result<HistoryStatistics> {
        Ok(HistoryStatistics::from_records(&self.all()?))
    }
}

/// In-process store, useful for tests and short-lived sessions
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<SessionRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn save(&mut self, record: &SessionRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn all(&self) -> Result<Vec<SessionRecord>> {
        Ok(self.records.clone())
    }

    fn remove_older_than(&mut self, cutoff: DateTime<Utc>) -> Result<usize> {
        let before = self.records.len();
        self.records.retain(|r| r.created_at() >= cutoff);
        Ok(before - self.records.len())
    }
}

/// One JSON record per line in a single file
#[derive(Debug, Clone)]
pub struct JsonLinesStore {
    path: PathBuf,
}

impl JsonLinesStore {
    /// Use `path` as the history file, creating parent directories
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                PaletteError::history(format!("Failed to create {}", parent.display()), e)
            })?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cut off a trailing record left incomplete by an interrupted append
    fn truncate_partial_tail(&self) -> std::io::Result<()> {
        let mut file = match OpenOptions::new().read(true).write(true).open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(());
        }
        let mut last = [0u8; 1];
        file.seek(SeekFrom::Start(len - 1))?;
        file.read_exact(&mut last)?;
        if last[0] == b'\n' {
            return Ok(());
        }

        let mut content = Vec::with_capacity(len as usize);
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut content)?;
        let keep = content.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
        warn!(
            "dropping {} bytes of incomplete history record in {}",
            content.len() - keep,
            self.path.display()
        );
        file.set_len(keep as u64)?;
        file.sync_data()
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStore for JsonLinesStore {
    fn save(&mut self, record: &SessionRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)
            .map_err(|e| PaletteError::history("Failed to serialize session record", e))?;
        line.push('\n');

        self.truncate_partial_tail()
            .map_err(|e| PaletteError::history("Failed to repair history tail", e))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                PaletteError::history(format!("Failed to open {}", self.path.display()), e)
            })?;
        file.write_all(line.as_bytes())
            .and_then(|_| file.sync_data())
            .map_err(|e| PaletteError::history("Failed to append session record", e))?;
        debug!("saved session record {}", record.id());
        Ok(())
    }

    fn all(&self) -> Result<Vec<SessionRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(PaletteError::history(
                    format!("Failed to read {}", self.path.display()),
                    e,
                ))
            }
        };

        let mut records = Vec::new();
        for (number, line) in content.split_inclusive('\n').enumerate() {
            let complete = line.ends_with('\n');
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(record) => records.push(record),
                // Only the unterminated last line can be an interrupted append
                Err(e) if !complete => {
                    warn!("ignoring incomplete history record on line {}: {}", number + 1, e);
                }
                Err(e) => {
                    return Err(PaletteError::history(
                        format!("Corrupt history record on line {}", number + 1),
                        e,
                    ))
                }
            }
        }
        Ok(records)
    }

    fn remove_older_than(&mut self, cutoff: DateTime<Utc>) -> Result<usize> {
        let records = self.all()?;
        let (keep, removed): (Vec<_>, Vec<_>) =
            records.into_iter().partition(|r| r.created_at() >= cutoff);
        if removed.is_empty() {
            return Ok(0);
        }

        let temp = self.temp_path();
        let write_temp = || -> std::io::Result<()> {
            let mut file = File::create(&temp)?;
            for record in &keep {
                let line = serde_json::to_string(record)?;
                file.write_all(line.as_bytes())?;
                file.write_all(b"\n")?;
            }
            file.sync_all()
        };
        if let Err(e) = write_temp() {
            let _ = fs::remove_file(&temp);
            return Err(PaletteError::history("Failed to write compacted history", e));
        }
        fs::rename(&temp, &self.path)
            .map_err(|e| PaletteError::history("Failed to replace history file", e))?;

        info!(
            "removed {} session records older than {}",
            removed.len(),
            cutoff.to_rfc3339()
        );
        Ok(removed.len())
    }
}

//! Append-only JSON Lines event journal.
//!
//! Uses JSON Lines format (.jsonl) for robustness:
//! - Each line is a complete JSON object
//! - Partial file corruption only affects individual lines
//! - Can be read even if a write was interrupted

use crate::error::PersistenceResult;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Append-only journal of serialized events, one JSON object per line.
///
/// Internally synchronized; share via `Arc` across tasks. Every append
/// is flushed to the OS before returning, so a crash loses at most the
/// event being written.
pub struct EventJournal {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl EventJournal {
    /// Open (or create) a journal file in append mode.
    pub fn open(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Append mode - never truncates existing history.
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!(path = %path.display(), "Opened event journal (append mode)");

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Append one event and flush it to the OS.
    pub fn append<T: Serialize>(&self, event: &T) -> PersistenceResult<()> {
        let json = serde_json::to_string(event)?;

        let mut writer = self.writer.lock();
        writeln!(writer, "{}", json)?;
        writer.flush()?;

        debug!(path = %self.path.display(), "Appended journal event");
        Ok(())
    }

    /// Read every event in the journal, oldest first.
    ///
    /// Corrupt lines (interrupted writes) are skipped with a warning
    /// rather than failing the whole read.
    pub fn read_all<T: DeserializeOwned>(&self) -> PersistenceResult<Vec<T>> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);

        let mut events = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(event) => events.push(event),
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        line = line_no + 1,
                        ?e,
                        "Skipping corrupt journal line"
                    );
                }
            }
        }
        Ok(events)
    }

    /// Path of the underlying journal file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestEvent {
        seq: u64,
        kind: String,
    }

    fn make_event(seq: u64) -> TestEvent {
        TestEvent {
            seq,
            kind: "test".to_string(),
        }
    }

    #[test]
    fn test_append_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let journal = EventJournal::open(temp_dir.path().join("events.jsonl")).unwrap();

        for i in 0..5 {
            journal.append(&make_event(i)).unwrap();
        }

        let events: Vec<TestEvent> = journal.read_all().unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(events[0].seq, 0);
        assert_eq!(events[4].seq, 4);
    }

    #[test]
    fn test_reopen_appends() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("events.jsonl");

        {
            let journal = EventJournal::open(&path).unwrap();
            journal.append(&make_event(0)).unwrap();
        }
        {
            let journal = EventJournal::open(&path).unwrap();
            journal.append(&make_event(1)).unwrap();

            let events: Vec<TestEvent> = journal.read_all().unwrap();
            assert_eq!(events.len(), 2, "reopen must not truncate history");
        }
    }

    #[test]
    fn test_corrupt_line_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("events.jsonl");

        let journal = EventJournal::open(&path).unwrap();
        journal.append(&make_event(0)).unwrap();

        // Simulate an interrupted write.
        {
            use std::io::Write as _;
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "{{\"seq\": 1, \"ki").unwrap();
        }
        journal.append(&make_event(2)).unwrap();

        let events: Vec<TestEvent> = journal.read_all().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].seq, 2);
    }

    #[test]
    fn test_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/events.jsonl");

        let journal = EventJournal::open(&path).unwrap();
        journal.append(&make_event(0)).unwrap();
        assert!(path.exists());
    }
}

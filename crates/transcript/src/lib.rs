//! Durable, append-only session transcript file.
//!
//! One file per session in the OS temp directory, named by session start
//! time. Records are never rewritten; each one is flushed and fsynced before
//! the engine is allowed to proceed.

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use sysaidmin_core::{Section, TerminationReason, TranscriptSink};

const DELIMITER_WIDTH: usize = 30;

pub struct FileTranscript {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileTranscript {
    /// Create the transcript for a session starting now, in the OS temp
    /// directory.
    pub fn create_in_temp() -> std::io::Result<Self> {
        Self::create(std::env::temp_dir().join(session_file_name()))
    }

    /// Create the transcript at an explicit path.
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)?;

        tracing::debug!("Transcript opened at {}", path.display());

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, text: &str) -> std::io::Result<()> {
        let mut file = self.file.lock();
        file.write_all(text.as_bytes())?;
        file.flush()?;
        file.sync_data()?;
        Ok(())
    }

    fn append_record(&self, label: &str, content: &str) -> std::io::Result<()> {
        self.append(&format!(
            "{}\n{}:\n{}\n\n",
            "=".repeat(DELIMITER_WIDTH),
            label,
            content
        ))
    }
}

/// Session-start-derived file name, collision-resistant across sessions.
fn session_file_name() -> String {
    format!(
        "sysaidmin_{}.log",
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    )
}

impl TranscriptSink for FileTranscript {
    fn record_problem(&self, text: &str) -> std::io::Result<()> {
        self.append(&format!("Problem:\n\n{}\n\n", text))
    }

    fn record_turn(&self, section: Section, text: &str) -> std::io::Result<()> {
        self.append_record(section.label(), text)
    }

    fn record_termination(&self, reason: &TerminationReason) -> std::io::Result<()> {
        self.append(&format!(
            "{}\n{}\n",
            "=".repeat(DELIMITER_WIDTH),
            reason
        ))
    }
}

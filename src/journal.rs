//! # Record Journal
//!
//! Writes decoded quality reports to JSONL files with rotation.
//!
//! This module handles:
//! - Formatting records as JSONL (JSON Lines) with an RFC 3339 timestamp
//! - Writing to numbered `records-NNNN.jsonl` files
//! - Rotating after a configured number of records per file
//! - Retaining only the last N files

use chrono::Utc;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::TelemetryConfig;
use crate::error::Result;
use crate::report::DecodedReport;

const FILE_PREFIX: &str = "records-";
const FILE_SUFFIX: &str = ".jsonl";

/// One line of the journal
#[derive(Serialize)]
struct JournalEntry<'a> {
    /// RFC 3339 timestamp of the append, not of the report itself
    ts: String,

    #[serde(flatten)]
    report: &'a DecodedReport,
}

/// JSONL journal of decoded quality reports
///
/// Files are numbered monotonically; an existing journal directory is
/// continued, never overwritten.
pub struct RecordJournal {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    file: Option<File>,
    next_index: u32,
    records_in_file: usize,
}

impl RecordJournal {
    /// Open a journal in the configured directory
    ///
    /// Creates the directory if needed and picks the file index after the
    /// highest one already present.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or listed.
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        let dir = PathBuf::from(&config.log_dir);
        fs::create_dir_all(&dir)?;

        let next_index = highest_index(&dir)?.map_or(1, |index| index + 1);

        Ok(Self {
            dir,
            max_records_per_file: config.max_records_per_file,
            max_files_to_keep: config.max_files_to_keep,
            file: None,
            next_index,
            records_in_file: 0,
        })
    }

    /// Append one decoded report as a JSONL line
    ///
    /// Rotates to a fresh file when the current one is full and prunes
    /// files beyond the retention limit.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the file write fails.
    pub fn append(&mut self, report: &DecodedReport) -> Result<()> {
        if self.file.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let entry = JournalEntry {
            ts: Utc::now().to_rfc3339(),
            report,
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        // rotate() guarantees the file is open here.
        if let Some(file) = self.file.as_mut() {
            file.write_all(line.as_bytes())?;
        }
        self.records_in_file += 1;

        Ok(())
    }

    /// Path the next rotation will write to, mainly for diagnostics
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn rotate(&mut self) -> Result<()> {
        let path = self.dir.join(file_name(self.next_index));
        debug!("rotating journal to {}", path.display());

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        self.file = Some(file);
        self.next_index += 1;
        self.records_in_file = 0;

        self.prune()?;
        Ok(())
    }

    /// Delete the oldest journal files beyond the retention limit
    fn prune(&self) -> Result<()> {
        let mut indices = journal_indices(&self.dir)?;
        indices.sort_unstable();

        if indices.len() <= self.max_files_to_keep {
            return Ok(());
        }

        let excess = indices.len() - self.max_files_to_keep;
        for index in &indices[..excess] {
            let path = self.dir.join(file_name(*index));
            info!("pruning journal file {}", path.display());
            fs::remove_file(path)?;
        }

        Ok(())
    }
}

fn file_name(index: u32) -> String {
    format!("{}{:04}{}", FILE_PREFIX, index, FILE_SUFFIX)
}

/// Indices of all journal files in a directory, in no particular order
fn journal_indices(dir: &Path) -> Result<Vec<u32>> {
    let mut indices = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(stem) = name
            .strip_prefix(FILE_PREFIX)
            .and_then(|rest| rest.strip_suffix(FILE_SUFFIX))
        else {
            continue;
        };
        if let Ok(index) = stem.parse::<u32>() {
            indices.push(index);
        }
    }

    Ok(indices)
}

fn highest_index(dir: &Path) -> Result<Option<u32>> {
    Ok(journal_indices(dir)?.into_iter().max())
}

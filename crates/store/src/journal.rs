//! Append-only JSONL journal of applied operations
//!
//! Files rotate by the UTC day the record was written (`YYYY-MM-DD.jsonl`).

use crate::error::StoreResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One applied operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub id: Uuid,
    pub sequence: u64,
    /// Wall clock when written
    pub recorded_at: DateTime<Utc>,
    /// Ledger time the operation ran at (unix seconds)
    pub ledger_time: i64,
    /// Command name, e.g. `transfer`
    pub operation: String,
    pub detail: serde_json::Value,
}

pub struct Journal {
    base_path: PathBuf,
    next_sequence: u64,
    writer: Option<BufWriter<File>>,
    current_date: Option<String>,
}

impl Journal {
    /// Open the journal directory, continuing after the last written sequence
    pub fn open(base_path: impl AsRef<Path>) -> StoreResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        let next_sequence = read_records(&base_path)?
            .last()
            .map(|r| r.sequence + 1)
            .unwrap_or(1);

        Ok(Self {
            base_path,
            next_sequence,
            writer: None,
            current_date: None,
        })
    }

    pub fn append(
        &mut self,
        ledger_time: i64,
        operation: impl Into<String>,
        detail: serde_json::Value,
    ) -> StoreResult<JournalRecord> {
        let record = JournalRecord {
            id: Uuid::new_v4(),
            sequence: self.next_sequence,
            recorded_at: Utc::now(),
            ledger_time,
            operation: operation.into(),
            detail,
        };

        let date = record.recorded_at.format("%Y-%m-%d").to_string();
        if self.current_date.as_ref() != Some(&date) {
            self.rotate(&date)?;
        }
        if let Some(ref mut writer) = self.writer {
            writeln!(writer, "{}", serde_json::to_string(&record)?)?;
            writer.flush()?;
        }

        self.next_sequence += 1;
        tracing::debug!(sequence = record.sequence, operation = %record.operation, "Journaled");
        Ok(record)
    }

    fn rotate(&mut self, date: &str) -> StoreResult<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.base_path.join(format!("{}.jsonl", date)))?;
        self.writer = Some(BufWriter::new(file));
        self.current_date = Some(date.to_string());
        Ok(())
    }

    /// Every record in sequence order
    pub fn read_all(&self) -> StoreResult<Vec<JournalRecord>> {
        read_records(&self.base_path)
    }
}

fn read_records(base_path: &Path) -> StoreResult<Vec<JournalRecord>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(base_path)? {
        let path = entry?.path();
        if path.extension().map_or(false, |ext| ext == "jsonl") {
            files.push(path);
        }
    }
    files.sort();

    let mut records = Vec::new();
    for path in files {
        for line in BufReader::new(File::open(path)?).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str::<JournalRecord>(&line)?);
        }
    }
    records.sort_by_key(|r| r.sequence);
    Ok(records)
}

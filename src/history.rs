use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::sweep::SweepReport;

/// Ledger file kept inside the capture directory. Its extension is not
/// on the photo allow-list, so sweeps never touch it.
pub const HISTORY_FILE: &str = ".history.jsonl";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One comparison pass, as recorded in the ledger.
#[derive(Serialize, Deserialize, Debug)]
pub struct SweepRecord {
    pub timestamp: String,
    pub kept: String,
    pub deleted: Vec<String>,
    pub matched: bool,
}

impl SweepRecord {
    /// Build a record from a pass that actually scored something.
    /// Passes with nothing to compare are not worth recording.
    pub fn from_report(report: &SweepReport) -> Option<Self> {
        let kept = report.kept.as_ref()?;
        Some(Self {
            timestamp: Utc::now().to_rfc3339(),
            kept: kept.to_string_lossy().into_owned(),
            deleted: report
                .deleted
                .iter()
                .map(|path| path.to_string_lossy().into_owned())
                .collect(),
            matched: report.matched,
        })
    }
}

pub fn history_path(dir: &Path) -> PathBuf {
    dir.join(HISTORY_FILE)
}

/// Append one record to the ledger, creating it on first use.
pub fn append_record(dir: &Path, record: &SweepRecord) -> Result<(), HistoryError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(history_path(dir))?;
    writeln!(file, "{}", serde_json::to_string(record)?)?;
    Ok(())
}

/// All parseable records, oldest first. A ledger that was never written
/// reads as empty; malformed lines are skipped with a warning.
pub fn read_records(dir: &Path) -> Result<Vec<SweepRecord>, HistoryError> {
    let file = match File::open(history_path(dir)) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<SweepRecord>(&line) {
            Ok(record) => records.push(record),
            Err(err) => log::warn!("Skipping malformed history line {}: {}", index + 1, err),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample_report(dir: &Path) -> SweepReport {
        SweepReport {
            listed: 3,
            pairs_compared: 3,
            matched: true,
            deleted: vec![dir.join("b.jpg"), dir.join("c.jpg")],
            kept: Some(dir.join("a.jpg")),
        }
    }

    #[test]
    fn records_round_trip_through_the_ledger() {
        let dir = TempDir::new().unwrap();

        let record = SweepRecord::from_report(&sample_report(dir.path())).unwrap();
        append_record(dir.path(), &record).unwrap();
        let record = SweepRecord::from_report(&sample_report(dir.path())).unwrap();
        append_record(dir.path(), &record).unwrap();

        let records = read_records(dir.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].matched);
        assert_eq!(records[0].deleted.len(), 2);
        assert!(records[0].kept.ends_with("a.jpg"));
    }

    #[test]
    fn missing_ledger_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        assert!(read_records(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();

        let record = SweepRecord::from_report(&sample_report(dir.path())).unwrap();
        append_record(dir.path(), &record).unwrap();

        let path = history_path(dir.path());
        let mut raw = fs::read_to_string(&path).unwrap();
        raw.push_str("{ this is not json\n");
        fs::write(&path, raw).unwrap();

        let records = read_records(dir.path()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn a_pass_with_nothing_to_score_is_not_recorded() {
        let report = SweepReport {
            listed: 1,
            pairs_compared: 0,
            matched: false,
            deleted: Vec::new(),
            kept: None,
        };
        assert!(SweepRecord::from_report(&report).is_none());
    }
}

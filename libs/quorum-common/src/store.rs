use crate::types::ProblemId;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

/// Line-delimited record store semantics.
///
/// Generation output, test output and ground-truth datasets are all JSONL
/// files: one record per line, appended by upstream generation and read
/// back here. Nothing in the core reads its own output; the selection sink
/// is write-only.

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed record at {path}:{line}: {source}")]
    Malformed {
        path: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Task identifier as it appears on disk: either a bare integer index or a
/// dataset-qualified string like `"Mbpp/602"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    Index(ProblemId),
    Tagged(String),
}

impl TaskId {
    /// Convert to a problem id. Composite ids map through their last
    /// `/`-separated segment; an unparseable tag yields `None` and the
    /// record is dropped by the caller.
    pub fn problem_id(&self) -> Option<ProblemId> {
        match self {
            TaskId::Index(id) => Some(*id),
            TaskId::Tagged(tag) => tag.rsplit('/').next()?.parse().ok(),
        }
    }
}

/// One generated solution or test block, as emitted by the generation
/// phase. Only `task_id` and `response_code` matter to evaluation; the raw
/// response is kept when present for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub task_id: TaskId,
    pub response_code: String,
    #[serde(default)]
    pub response: Option<String>,
}

/// One ground-truth test block for a problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenRecord {
    pub task_id: TaskId,
    #[serde(alias = "tests")]
    pub test: String,
}

/// Output record for a selected golden solution, appended to the optional
/// run sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionRecord {
    pub task_id: ProblemId,
    pub solution_index: usize,
    pub score: u64,
    pub solution: String,
    /// Indices of the generated tests selected as the golden test subset.
    pub golden_test_indices: Vec<usize>,
    pub oracle_correct: bool,
    pub generated_at: DateTime<Utc>,
}

/// Read every record from a JSONL file. Blank lines are skipped; a
/// malformed line is an error carrying its line number.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let file = File::open(path).map_err(|source| StoreError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut records = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| StoreError::Malformed {
            path: path.display().to_string(),
            line: idx + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Append records to a JSONL sink, creating the file if needed.
pub fn append_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.display().to_string(),
        source,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;

    for record in records {
        let payload = serde_json::to_string(record).map_err(|source| StoreError::Malformed {
            path: path.display().to_string(),
            line: 0,
            source,
        })?;
        writeln!(file, "{}", payload).map_err(io_err)?;
    }
    Ok(())
}

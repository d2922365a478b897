use crate::metadata::{ResolvedTimestamp, TimestampSource};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Renamed,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTask {
    pub source_path: PathBuf,
    pub status: TaskStatus,
    pub resolved_timestamp: Option<ResolvedTimestamp>,
    pub target_path: Option<PathBuf>,
    pub error_detail: Option<String>,
}

impl FileTask {
    pub fn new(source_path: PathBuf) -> Self {
        Self {
            source_path,
            status: TaskStatus::Pending,
            resolved_timestamp: None,
            target_path: None,
            error_detail: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status != TaskStatus::Pending
    }

    pub fn outcome(&self) -> TaskOutcome {
        TaskOutcome {
            source_path: self.source_path.clone(),
            status: self.status,
            source: self.resolved_timestamp.map(|r| r.source),
            target_path: self.target_path.clone(),
            error_detail: self.error_detail.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub source_path: PathBuf,
    pub status: TaskStatus,
    pub source: Option<TimestampSource>,
    pub target_path: Option<PathBuf>,
    pub error_detail: Option<String>,
}

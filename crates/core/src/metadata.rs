use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimestampSource {
    HeicContainer,
    EmbeddedExif,
    FileModified,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedTimestamp {
    pub source: TimestampSource,
    pub date: DateTime<Local>,
}

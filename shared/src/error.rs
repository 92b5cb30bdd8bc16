use thiserror::Error;

use crate::week::WeekCode;

/// Which family of weekly snapshot a request referred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Players,
    Matches,
}

impl std::fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Players => f.write_str("player"),
            Self::Matches => f.write_str("match"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScoutedError {
    #[error("no {kind} snapshot for week {week}")]
    MissingSnapshot { kind: SnapshotKind, week: WeekCode },

    #[error("malformed record in {source_name} at row {row}, column '{column}': {reason}")]
    MalformedRecord {
        source_name: String,
        row: u64,
        column: String,
        reason: String,
    },

    #[error("invalid view request: {0}")]
    InvalidViewRequest(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {source_name}: {source}")]
    Csv {
        source_name: String,
        source: csv::Error,
    },
}

pub type Result<T> = std::result::Result<T, ScoutedError>;

impl ScoutedError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidViewRequest(message.into())
    }

    pub fn is_missing_snapshot(&self) -> bool {
        matches!(self, Self::MissingSnapshot { .. })
    }
}

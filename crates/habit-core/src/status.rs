//! Execution status of a habit on one calendar date.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome of a habit on a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Not decided yet (also used to undo an accidental completion).
    Pending,
    /// Completed.
    Done,
    /// Explicitly failed.
    NotDone,
}

impl ExecutionStatus {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Done => "done",
            ExecutionStatus::NotDone => "not_done",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a stored or submitted status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown execution status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for ExecutionStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ExecutionStatus::Pending),
            "done" => Ok(ExecutionStatus::Done),
            "not_done" => Ok(ExecutionStatus::NotDone),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

impl TryFrom<String> for ExecutionStatus {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("DONE".parse::<ExecutionStatus>(), Ok(ExecutionStatus::Done));
        assert_eq!(" not_done ".parse::<ExecutionStatus>(), Ok(ExecutionStatus::NotDone));
    }

    #[test]
    fn test_parse_unknown() {
        let err = "skipped".parse::<ExecutionStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown execution status: skipped");
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&ExecutionStatus::NotDone).unwrap();
        assert_eq!(json, "\"not_done\"");
        let parsed: ExecutionStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(parsed, ExecutionStatus::Pending);
    }
}

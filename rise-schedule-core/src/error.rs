use thiserror::Error;

use crate::types::TimeField;

/// Why a single recurrence rule could not be decoded or expanded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("Invalid day '{0}'. Valid days are: MONDAY, TUESDAY, WEDNESDAY, THURSDAY, FRIDAY, SATURDAY, SUNDAY")]
    InvalidDay(String),

    #[error("Invalid {field} '{value}': expected HH:MM, HH:MM:SS or HH:MM:SS±HH:MM")]
    InvalidTime { field: TimeField, value: String },

    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Recurrence start date {start} must not be after the end date {end}")]
    InvertedRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Recurrence(#[from] RecurrenceError),

    #[error("Capacity must be greater than zero, got {0}")]
    InvalidCapacity(i32),

    #[error("No events to update")]
    NoEvents,

    #[error("Extending a recurrence is not supported: {requested} is after {original}, create a new schedule instead")]
    RecurrenceExtension {
        original: chrono::NaiveDate,
        requested: chrono::NaiveDate,
    },

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("ICS generation failed: {0}")]
    IcsGeneration(String),
}

impl Error {
    /// Whether the error was caused by caller input rather than the environment.
    pub const fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::Recurrence(_)
                | Self::InvalidCapacity(_)
                | Self::NoEvents
                | Self::RecurrenceExtension { .. }
                | Self::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

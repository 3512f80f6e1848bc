//! Rise Schedule Core Library
//!
//! Expands weekly facility schedules into concrete calendar occurrences and
//! builds the event rows, seed data and ICS calendars derived from them.

pub mod error;
pub mod events;
pub mod ics;
pub mod recurrence;
pub mod seed;
pub mod types;

// Re-export core types and error handling
pub use error::{Error, RecurrenceError, Result};
pub use recurrence::{BatchExpansion, Occurrences, RecurrenceRule, expand, expand_batch};
pub use seed::Practice;
pub use types::*;

/// Commonly used items
pub mod prelude {
    pub use crate::{events::*, ics::*, recurrence::*, seed::*, types::*};
}

//! Event rows for the scheduling service.
//!
//! A recurrence request becomes one [`NewEvent`] per matching date. Unlike the
//! bare expander this path is strict: inverted ranges, bad capacity and bad
//! times are errors, and windows that cross midnight end on the next day.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Error, Result,
    error::RecurrenceError,
    recurrence::RecurrenceRule,
    types::{DayOfWeek, Occurrence, TimeField, TimeOfDay},
};

/// Request to create events for a program at a location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecurrence {
    /// `None` creates a single event on `recurrence_start`
    #[serde(default)]
    pub day: Option<DayOfWeek>,
    pub recurrence_start: NaiveDate,
    pub recurrence_end: NaiveDate,
    pub event_start_time: String,
    pub event_end_time: String,
    pub program_id: Uuid,
    pub location_id: Uuid,
    #[serde(default)]
    pub team_id: Option<Uuid>,
    pub capacity: i32,
    pub created_by: Uuid,
}

/// Columns shared by created and updated events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub program_id: Uuid,
    pub location_id: Uuid,
    pub team_id: Option<Uuid>,
    pub capacity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub created_by: Uuid,
    #[serde(flatten)]
    pub details: EventDetails,
}

/// An event already stored, as read back for a bulk change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingEvent {
    pub id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

/// New time window and ownership applied to a set of existing events.
///
/// `new_recurrence_end` may shorten the series but never extend it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub start_time: String,
    pub end_time: String,
    pub original_recurrence_end: NaiveDate,
    pub new_recurrence_end: NaiveDate,
    pub program_id: Uuid,
    pub location_id: Uuid,
    #[serde(default)]
    pub team_id: Option<Uuid>,
    pub capacity: i32,
    pub updated_by: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventUpdate {
    pub id: Uuid,
    pub updated_by: Uuid,
    #[serde(flatten)]
    pub details: EventDetails,
}

/// Outcome of [`reschedule`]: rows to rewrite and rows past the new end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reschedule {
    pub updates: Vec<EventUpdate>,
    pub deletions: Vec<Uuid>,
}

/// Expands a recurrence request into the events to insert.
pub fn generate_events(recurrence: &EventRecurrence) -> Result<Vec<NewEvent>> {
    if recurrence.recurrence_start > recurrence.recurrence_end {
        return Err(RecurrenceError::InvertedRange {
            start: recurrence.recurrence_start,
            end: recurrence.recurrence_end,
        }
        .into());
    }

    check_capacity(recurrence.capacity)?;

    let start_time = TimeOfDay::parse(&recurrence.event_start_time, TimeField::Start)?;
    let end_time = TimeOfDay::parse(&recurrence.event_end_time, TimeField::End)?;

    let to_event = |occurrence: Occurrence| {
        let occurrence = occurrence.overnight_adjusted();
        NewEvent {
            created_by: recurrence.created_by,
            details: EventDetails {
                start_at: occurrence.start_at,
                end_at: occurrence.end_at,
                program_id: recurrence.program_id,
                location_id: recurrence.location_id,
                team_id: recurrence.team_id,
                capacity: recurrence.capacity,
            },
        }
    };

    let events: Vec<_> = match recurrence.day {
        None => vec![to_event(Occurrence::on(
            recurrence.recurrence_start,
            start_time,
            end_time,
        ))],
        Some(day) => RecurrenceRule::new(
            day,
            recurrence.recurrence_start,
            Some(recurrence.recurrence_end),
            start_time,
            end_time,
        )
        .occurrences()
        .map(to_event)
        .collect(),
    };

    tracing::debug!(
        program_id = %recurrence.program_id,
        count = events.len(),
        "generated events from recurrence"
    );

    Ok(events)
}

/// Moves every event to the new daily window while keeping its calendar date.
///
/// Events starting after `new_recurrence_end` are listed for deletion instead.
pub fn reschedule(request: &RescheduleRequest, events: &[ExistingEvent]) -> Result<Reschedule> {
    if request.new_recurrence_end > request.original_recurrence_end {
        return Err(Error::RecurrenceExtension {
            original: request.original_recurrence_end,
            requested: request.new_recurrence_end,
        });
    }

    let start_time = TimeOfDay::parse(&request.start_time, TimeField::Start)?;
    let end_time = TimeOfDay::parse(&request.end_time, TimeField::End)?;

    check_capacity(request.capacity)?;

    if events.is_empty() {
        return Err(Error::NoEvents);
    }

    let mut outcome = Reschedule::default();
    for event in events {
        let date = start_time.local_date(event.start_at);
        if date > request.new_recurrence_end {
            outcome.deletions.push(event.id);
            continue;
        }

        let window = Occurrence::on(date, start_time, end_time).overnight_adjusted();
        outcome.updates.push(EventUpdate {
            id: event.id,
            updated_by: request.updated_by,
            details: EventDetails {
                start_at: window.start_at,
                end_at: window.end_at,
                program_id: request.program_id,
                location_id: request.location_id,
                team_id: request.team_id,
                capacity: request.capacity,
            },
        });
    }

    tracing::debug!(
        updated = outcome.updates.len(),
        deleted = outcome.deletions.len(),
        "rescheduled events"
    );

    Ok(outcome)
}

fn check_capacity(capacity: i32) -> Result<()> {
    if capacity <= 0 {
        return Err(Error::InvalidCapacity(capacity));
    }
    Ok(())
}

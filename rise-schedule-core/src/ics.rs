use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Error, Result,
    events::NewEvent,
    recurrence::RecurrenceRule,
    seed::SeedEvent,
    types::Occurrence,
};

const ICS_TIMESTAMP: &str = "%Y%m%dT%H%M%SZ";

/// ICS generation options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcsOptions {
    /// Calendar display name
    pub calendar_name: Option<String>,
    /// Timezone hint for clients, events are always written in UTC
    pub timezone: Option<String>,
    pub include_description: bool,
    pub reminder_minutes: Option<u32>,
}

impl Default for IcsOptions {
    fn default() -> Self {
        Self {
            calendar_name: Some("Rise Schedule".to_string()),
            timezone: Some("America/Edmonton".to_string()),
            include_description: true,
            reminder_minutes: Some(30),
        }
    }
}

/// A single VEVENT. With `recurrence` set it stands for the whole weekly series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub title: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub recurrence: Option<RecurrenceRule>,
}

impl CalendarEvent {
    /// Windows that cross midnight end on the following day.
    pub fn from_occurrence(title: impl Into<String>, occurrence: &Occurrence) -> Self {
        let occurrence = occurrence.overnight_adjusted();
        Self {
            title: title.into(),
            location: None,
            description: None,
            start_at: occurrence.start_at,
            end_at: occurrence.end_at,
            recurrence: None,
        }
    }

    pub fn from_new_event(title: impl Into<String>, event: &NewEvent) -> Self {
        Self {
            title: title.into(),
            location: None,
            description: Some(format!("Capacity: {}", event.details.capacity)),
            start_at: event.details.start_at,
            end_at: event.details.end_at,
            recurrence: None,
        }
    }

    /// One recurring event covering every occurrence of `rule`.
    ///
    /// `None` when the rule has no occurrence at all.
    pub fn series(title: impl Into<String>, rule: &RecurrenceRule) -> Option<Self> {
        let first = rule.occurrences().next()?;
        Some(Self {
            recurrence: Some(*rule),
            ..Self::from_occurrence(title, &first)
        })
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl From<&SeedEvent> for CalendarEvent {
    fn from(event: &SeedEvent) -> Self {
        Self {
            title: event.program_name.clone(),
            location: Some(event.location_name.clone()),
            description: Some(seed_description(event)),
            start_at: event.start_at,
            end_at: event.end_at,
            recurrence: None,
        }
    }
}

fn seed_description(event: &SeedEvent) -> String {
    let mut description = format!("Capacity: {}", event.capacity);
    if !event.trainer_names.is_empty() {
        description.push_str(&format!("\nTrainers: {}", event.trainer_names.join(", ")));
    }
    description
}

/// ICS calendar generator
pub struct IcsGenerator {
    options: IcsOptions,
}

impl IcsGenerator {
    pub const fn new(options: IcsOptions) -> Self {
        Self { options }
    }

    /// Renders a VCALENDAR containing one VEVENT per event.
    pub fn generate(&self, events: &[CalendarEvent]) -> Result<String> {
        let mut ics_content = String::new();

        ics_content.push_str("BEGIN:VCALENDAR\r\n");
        ics_content.push_str("VERSION:2.0\r\n");
        ics_content.push_str("PRODID:-//Rise//Rise Schedule//EN\r\n");
        ics_content.push_str("CALSCALE:GREGORIAN\r\n");
        ics_content.push_str("METHOD:PUBLISH\r\n");

        if let Some(ref name) = self.options.calendar_name {
            ics_content.push_str(&format!("X-WR-CALNAME:{}\r\n", escape_text(name)));
        }

        if let Some(ref timezone) = self.options.timezone {
            ics_content.push_str(&format!("X-WR-TIMEZONE:{}\r\n", timezone));
        }

        for event in events {
            self.add_event(&mut ics_content, event)?;
        }

        ics_content.push_str("END:VCALENDAR\r\n");

        Ok(ics_content)
    }

    fn add_event(&self, ics_content: &mut String, event: &CalendarEvent) -> Result<()> {
        if event.end_at < event.start_at {
            return Err(Error::IcsGeneration(format!(
                "event '{}' ends before it starts ({} < {})",
                event.title, event.end_at, event.start_at
            )));
        }

        let uid = Uuid::new_v4().to_string();
        let dtstamp = Utc::now().format(ICS_TIMESTAMP).to_string();

        ics_content.push_str("BEGIN:VEVENT\r\n");
        ics_content.push_str(&format!("UID:{}\r\n", uid));
        ics_content.push_str(&format!("DTSTAMP:{}\r\n", dtstamp));
        ics_content.push_str(&format!("DTSTART:{}\r\n", event.start_at.format(ICS_TIMESTAMP)));
        ics_content.push_str(&format!("DTEND:{}\r\n", event.end_at.format(ICS_TIMESTAMP)));
        ics_content.push_str(&format!("SUMMARY:{}\r\n", escape_text(&event.title)));

        if let Some(ref location) = event.location {
            ics_content.push_str(&format!("LOCATION:{}\r\n", escape_text(location)));
        }

        if self.options.include_description {
            if let Some(ref description) = event.description {
                ics_content.push_str(&format!("DESCRIPTION:{}\r\n", escape_text(description)));
            }
        }

        if let Some(ref rule) = event.recurrence {
            ics_content.push_str(&Self::rrule_for(rule));
            ics_content.push_str("\r\n");
        }

        if let Some(reminder_minutes) = self.options.reminder_minutes {
            ics_content.push_str("BEGIN:VALARM\r\n");
            ics_content.push_str("ACTION:DISPLAY\r\n");
            ics_content.push_str(&format!("DESCRIPTION:{}\r\n", escape_text(&event.title)));
            ics_content.push_str(&format!("TRIGGER:-PT{}M\r\n", reminder_minutes));
            ics_content.push_str("END:VALARM\r\n");
        }

        ics_content.push_str("END:VEVENT\r\n");

        Ok(())
    }

    /// `RRULE` line equivalent to the rule's expansion. UNTIL covers the whole end date.
    pub fn rrule_for(rule: &RecurrenceRule) -> String {
        format!(
            "RRULE:FREQ=WEEKLY;BYDAY={};UNTIL={}T235959Z",
            rule.day.ical_code(),
            rule.end.format("%Y%m%d")
        )
    }
}

impl Default for IcsGenerator {
    fn default() -> Self {
        Self::new(IcsOptions::default())
    }
}

/// Escapes ICS text content
fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace(',', "\\,")
        .replace(';', "\\;")
}

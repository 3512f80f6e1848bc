use std::iter::FusedIterator;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;

use crate::{
    error::RecurrenceError,
    types::{DayOfWeek, Occurrence, ScheduleSpec, TimeField, TimeOfDay},
};

/// Window used when a schedule has no end date.
pub const DEFAULT_RECURRENCE_MONTHS: u32 = 5;

/// A decoded weekly schedule: one weekday, an inclusive date range and a daily window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecurrenceRule {
    pub day: DayOfWeek,
    pub start: NaiveDate,
    /// Effective end, inclusive. Already defaulted when the schedule had none.
    pub end: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

impl RecurrenceRule {
    pub fn new(
        day: DayOfWeek,
        start: NaiveDate,
        end: Option<NaiveDate>,
        start_time: TimeOfDay,
        end_time: TimeOfDay,
    ) -> Self {
        Self {
            day,
            start,
            end: end.unwrap_or_else(|| default_end(start)),
            start_time,
            end_time,
        }
    }

    /// Decodes a raw schedule.
    ///
    /// `today` stands in for a missing start date, so the same spec expands
    /// identically for the same `today`.
    pub fn from_spec(spec: &ScheduleSpec, today: NaiveDate) -> Result<Self, RecurrenceError> {
        let day = spec.day.parse::<DayOfWeek>()?;
        let start = parse_date(spec.start_date.as_deref())?.unwrap_or(today);
        let end = parse_date(spec.end_date.as_deref())?;
        let start_time = TimeOfDay::parse(&spec.start_time, TimeField::Start)?;
        let end_time = TimeOfDay::parse(&spec.end_time, TimeField::End)?;

        Ok(Self::new(day, start, end, start_time, end_time))
    }

    /// Rejects a range whose end precedes its start.
    ///
    /// [`Self::occurrences`] tolerates such a range and yields nothing.
    pub fn validate(&self) -> Result<(), RecurrenceError> {
        if self.start > self.end {
            return Err(RecurrenceError::InvertedRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Lazily walks the matching dates in ascending order.
    pub fn occurrences(&self) -> Occurrences {
        let offset = (7 + self.day.weekday().num_days_from_monday()
            - self.start.weekday().num_days_from_monday())
            % 7;

        Occurrences {
            rule: *self,
            next: self.start.checked_add_days(Days::new(u64::from(offset))),
        }
    }

    pub fn expand(&self) -> Vec<Occurrence> {
        self.occurrences().collect()
    }

    pub fn occurrence_on(&self, date: NaiveDate) -> Occurrence {
        Occurrence::on(date, self.start_time, self.end_time)
    }
}

/// `start` plus [`DEFAULT_RECURRENCE_MONTHS`] calendar months.
///
/// Days missing from the target month clamp to its last day (Jan 31 -> Jun 30).
pub fn default_end(start: NaiveDate) -> NaiveDate {
    start
        .checked_add_months(Months::new(DEFAULT_RECURRENCE_MONTHS))
        .unwrap_or(NaiveDate::MAX)
}

fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>, RecurrenceError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| RecurrenceError::InvalidDate(raw.to_string())),
    }
}

/// Iterator over the occurrences of a [`RecurrenceRule`].
///
/// Every yielded date falls on the rule's weekday and within `[start, end]`.
#[derive(Debug, Clone)]
pub struct Occurrences {
    rule: RecurrenceRule,
    next: Option<NaiveDate>,
}

impl Occurrences {
    fn remaining(&self) -> usize {
        match self.next {
            Some(date) if date <= self.rule.end => {
                let weeks = (self.rule.end - date).num_days() / 7;
                usize::try_from(weeks).map_or(usize::MAX, |w| w.saturating_add(1))
            }
            _ => 0,
        }
    }
}

impl Iterator for Occurrences {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Self::Item> {
        let date = self.next.filter(|date| *date <= self.rule.end)?;
        self.next = date.checked_add_days(Days::new(7));
        Some(self.rule.occurrence_on(date))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Occurrences {}

impl FusedIterator for Occurrences {}

/// Decodes and expands one schedule.
pub fn expand(spec: &ScheduleSpec, today: NaiveDate) -> Result<Vec<Occurrence>, RecurrenceError> {
    RecurrenceRule::from_spec(spec, today).map(|rule| rule.expand())
}

/// Per-schedule outcome of [`expand_batch`], in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchExpansion {
    results: Vec<Result<Vec<Occurrence>, RecurrenceError>>,
}

impl BatchExpansion {
    pub fn results(&self) -> &[Result<Vec<Occurrence>, RecurrenceError>] {
        &self.results
    }

    pub fn into_results(self) -> Vec<Result<Vec<Occurrence>, RecurrenceError>> {
        self.results
    }

    /// Occurrences of every schedule that decoded, flattened in input order.
    pub fn occurrences(&self) -> impl Iterator<Item = &Occurrence> {
        self.results.iter().flatten().flatten()
    }

    pub fn errors(&self) -> impl Iterator<Item = (usize, &RecurrenceError)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(idx, result)| result.as_ref().err().map(|err| (idx, err)))
    }

    pub fn is_clean(&self) -> bool {
        self.results.iter().all(Result::is_ok)
    }
}

/// Expands every schedule, logging and keeping the error of any that fails to decode.
pub fn expand_batch(specs: &[ScheduleSpec], today: NaiveDate) -> BatchExpansion {
    let results = specs
        .iter()
        .enumerate()
        .map(|(idx, spec)| {
            let result = expand(spec, today);
            match &result {
                Ok(occurrences) => {
                    tracing::debug!(index = idx, day = %spec.day, count = occurrences.len(), "expanded schedule");
                }
                Err(err) => {
                    tracing::warn!(index = idx, day = %spec.day, "skipping schedule: {}", err);
                }
            }
            result
        })
        .collect();

    BatchExpansion { results }
}

#[cfg(test)]
mod tests;

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::RecurrenceError;

/// Day of week a recurring schedule runs on.
///
/// Stored as the upper-case database enum (`MONDAY`), accepted in any case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [Self; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    /// Full English name, e.g. `Monday`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }

    /// Database enum value, e.g. `MONDAY`.
    pub const fn as_db_str(self) -> &'static str {
        match self {
            Self::Monday => "MONDAY",
            Self::Tuesday => "TUESDAY",
            Self::Wednesday => "WEDNESDAY",
            Self::Thursday => "THURSDAY",
            Self::Friday => "FRIDAY",
            Self::Saturday => "SATURDAY",
            Self::Sunday => "SUNDAY",
        }
    }

    /// Two letter iCalendar BYDAY code.
    pub const fn ical_code(self) -> &'static str {
        match self {
            Self::Monday => "MO",
            Self::Tuesday => "TU",
            Self::Wednesday => "WE",
            Self::Thursday => "TH",
            Self::Friday => "FR",
            Self::Saturday => "SA",
            Self::Sunday => "SU",
        }
    }

    pub const fn weekday(self) -> Weekday {
        match self {
            Self::Monday => Weekday::Mon,
            Self::Tuesday => Weekday::Tue,
            Self::Wednesday => Weekday::Wed,
            Self::Thursday => Weekday::Thu,
            Self::Friday => Weekday::Fri,
            Self::Saturday => Weekday::Sat,
            Self::Sunday => Weekday::Sun,
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
            Weekday::Sun => Self::Sunday,
        }
    }
}

impl From<DayOfWeek> for Weekday {
    fn from(day: DayOfWeek) -> Self {
        day.weekday()
    }
}

impl FromStr for DayOfWeek {
    type Err = RecurrenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|day| day.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| RecurrenceError::InvalidDay(s.to_string()))
    }
}

impl TryFrom<String> for DayOfWeek {
    type Error = RecurrenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// Which end of the daily window a time value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    Start,
    End,
}

impl fmt::Display for TimeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start time"),
            Self::End => f.write_str("end time"),
        }
    }
}

/// Wall-clock hour and minute at a fixed UTC offset. Seconds are always zero.
///
/// Plain `HH:MM` values are UTC. The offset is kept rather than folded into the
/// clock, so a session at 17:00-07:00 stays on the local date it was booked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeOfDay {
    local: NaiveTime,
    offset: FixedOffset,
}

impl TimeOfDay {
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(|local| Self {
            local,
            offset: Utc.fix(),
        })
    }

    /// Parses `HH:MM`, `HH:MM:SS`, or the request form `HH:MM:SS±HH:MM` / `HH:MM:SSZ`.
    pub fn parse(value: &str, field: TimeField) -> Result<Self, RecurrenceError> {
        let invalid = || RecurrenceError::InvalidTime {
            field,
            value: value.to_string(),
        };

        let trimmed = value.trim();
        let (clock, offset_secs) = split_offset(trimmed).ok_or_else(invalid)?;
        let offset = FixedOffset::east_opt(offset_secs).ok_or_else(invalid)?;

        let time = NaiveTime::parse_from_str(clock, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(clock, "%H:%M:%S"))
            .map_err(|_| invalid())?;

        Self::from_hm(time.hour(), time.minute())
            .map(|t| t.with_offset(offset))
            .ok_or_else(invalid)
    }

    #[must_use]
    pub const fn with_offset(self, offset: FixedOffset) -> Self {
        Self {
            local: self.local,
            offset,
        }
    }

    pub const fn offset(self) -> FixedOffset {
        self.offset
    }

    /// Clock hour at [`Self::offset`].
    pub fn hour(self) -> u32 {
        self.local.hour()
    }

    pub fn minute(self) -> u32 {
        self.local.minute()
    }

    /// The instant this time falls on for the local calendar `date`.
    ///
    /// May land on the previous or next UTC day when the offset is not zero.
    pub fn on(self, date: NaiveDate) -> DateTime<Utc> {
        let local = date.and_time(self.local);
        let shift = Duration::seconds(i64::from(self.offset.local_minus_utc()));
        local.checked_sub_signed(shift).unwrap_or(local).and_utc()
    }

    /// Local calendar date of `instant` at this time's offset.
    pub fn local_date(self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }
}

/// Splits a trailing `Z` or `±HH:MM` off a clock value, returning the offset in seconds.
fn split_offset(value: &str) -> Option<(&str, i32)> {
    if let Some(clock) = value.strip_suffix(['Z', 'z']) {
        return Some((clock, 0));
    }

    let Some(idx) = value.rfind(['+', '-']) else {
        return Some((value, 0));
    };

    let (clock, offset) = value.split_at(idx);
    let sign = if offset.starts_with('-') { -1 } else { 1 };
    let (hours, minutes) = offset[1..].split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }

    Some((clock, sign * (hours * 3600 + minutes * 60)))
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.local.format("%H:%M"))?;
        if self.offset.local_minus_utc() != 0 {
            write!(f, "{}", self.offset)?;
        }
        Ok(())
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A recurring schedule as it arrives from a request body or a seed table.
///
/// Everything is still text; [`crate::RecurrenceRule::from_spec`] decodes it.
/// Empty date strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSpec {
    /// Weekday name, any case (`Monday`, `MONDAY`)
    pub day: String,
    /// First possible occurrence date, `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Last possible occurrence date, `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub start_time: String,
    pub end_time: String,
}

/// One concrete calendar slot produced from a recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Occurrence {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl Occurrence {
    /// The daily window placed on the local calendar `date`, converted to UTC.
    pub fn on(date: NaiveDate, start_time: TimeOfDay, end_time: TimeOfDay) -> Self {
        Self {
            start_at: start_time.on(date),
            end_at: end_time.on(date),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.start_at.date_naive()
    }

    pub fn duration(&self) -> Duration {
        self.end_at - self.start_at
    }

    /// Moves the end to the following day when the window crosses midnight.
    #[must_use]
    pub fn overnight_adjusted(self) -> Self {
        if self.end_at < self.start_at {
            Self {
                start_at: self.start_at,
                end_at: self.end_at + Duration::days(1),
            }
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_parsing_ignores_case() {
        assert_eq!("monday".parse::<DayOfWeek>().unwrap(), DayOfWeek::Monday);
        assert_eq!("MONDAY".parse::<DayOfWeek>().unwrap(), DayOfWeek::Monday);
        assert_eq!(" Saturday ".parse::<DayOfWeek>().unwrap(), DayOfWeek::Saturday);
        assert_eq!(
            "Mon".parse::<DayOfWeek>(),
            Err(RecurrenceError::InvalidDay("Mon".to_string()))
        );
    }

    #[test]
    fn day_serde_uses_database_enum() {
        let json = serde_json::to_string(&DayOfWeek::Wednesday).unwrap();
        assert_eq!(json, "\"WEDNESDAY\"");

        let day: DayOfWeek = serde_json::from_str("\"friday\"").unwrap();
        assert_eq!(day, DayOfWeek::Friday);

        assert!(serde_json::from_str::<DayOfWeek>("\"someday\"").is_err());
    }

    #[test]
    fn day_round_trips_through_chrono() {
        for day in DayOfWeek::ALL {
            assert_eq!(DayOfWeek::from(day.weekday()), day);
        }
    }

    #[test]
    fn time_accepts_all_request_forms() {
        let expected = TimeOfDay::from_hm(9, 30).unwrap();
        assert_eq!(TimeOfDay::parse("09:30", TimeField::Start).unwrap(), expected);
        assert_eq!(TimeOfDay::parse("09:30:45", TimeField::Start).unwrap(), expected);
        assert_eq!(TimeOfDay::parse("09:30:00+00:00", TimeField::Start).unwrap(), expected);
        assert_eq!(TimeOfDay::parse("09:30:00Z", TimeField::Start).unwrap(), expected);
    }

    #[test]
    fn offset_times_keep_their_local_date() {
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();

        let time = TimeOfDay::parse("17:00:00-07:00", TimeField::Start).unwrap();
        assert_eq!(time.hour(), 17);
        assert_eq!(time.offset().local_minus_utc(), -7 * 3600);
        assert_eq!(time.to_string(), "17:00-07:00");
        assert_eq!(
            time.on(monday),
            NaiveDate::from_ymd_opt(2025, 1, 7).unwrap().and_hms_opt(0, 0, 0).unwrap().and_utc()
        );
        assert_eq!(time.local_date(time.on(monday)), monday);

        let time = TimeOfDay::parse("01:15:00+02:00", TimeField::End).unwrap();
        assert_eq!(
            time.on(monday),
            NaiveDate::from_ymd_opt(2025, 1, 5).unwrap().and_hms_opt(23, 15, 0).unwrap().and_utc()
        );
    }

    #[test]
    fn malformed_time_reports_field() {
        let err = TimeOfDay::parse("25:99", TimeField::End).unwrap_err();
        assert_eq!(
            err,
            RecurrenceError::InvalidTime {
                field: TimeField::End,
                value: "25:99".to_string(),
            }
        );
        assert!(TimeOfDay::parse("", TimeField::Start).is_err());
        assert!(TimeOfDay::parse("noon", TimeField::Start).is_err());
        assert!(TimeOfDay::parse("09:00:00+25:00", TimeField::Start).is_err());
    }

    #[test]
    fn overnight_window_rolls_end_forward() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let occurrence = Occurrence {
            start_at: day.and_hms_opt(22, 0, 0).unwrap().and_utc(),
            end_at: day.and_hms_opt(1, 0, 0).unwrap().and_utc(),
        }
        .overnight_adjusted();

        assert_eq!(occurrence.duration(), Duration::hours(3));
        assert_eq!(occurrence.date(), day);
    }
}

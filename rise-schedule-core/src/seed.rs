use std::{fs, path::Path};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, recurrence::RecurrenceRule, types::ScheduleSpec};

/// Author recorded on seeded rows when none is configured.
pub const DEFAULT_SEED_AUTHOR: &str = "seed@localhost";

/// Membership plan allowed to book a practice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEligibility {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_price_id: Option<String>,
}

/// One weekly slot of a practice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSchedule {
    #[serde(flatten)]
    pub spec: ScheduleSpec,
    pub location: String,
    #[serde(default)]
    pub trainers: Vec<String>,
}

/// A program offered by the facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Practice {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub capacity: i32,
    #[serde(default)]
    pub memberships: Vec<MembershipEligibility>,
    pub schedules: Vec<SeedSchedule>,
}

/// Row of the batched seed event insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedEvent {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub location_name: String,
    pub program_name: String,
    pub capacity: i32,
    pub created_by_email: String,
    /// Staff assigned to the event, from the schedule's trainers
    #[serde(default)]
    pub trainer_names: Vec<String>,
}

/// Row of the practice membership eligibility insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityRow {
    pub practice_name: String,
    pub membership_name: String,
    /// Per-booking price; `None` means the membership books for free
    pub stripe_price_id: Option<String>,
}

/// Parses a JSON array of practices.
pub fn practices_from_json(json: &str) -> Result<Vec<Practice>> {
    Ok(serde_json::from_str(json)?)
}

/// Loads practices from a JSON file.
pub fn load_practices<P: AsRef<Path>>(path: P) -> Result<Vec<Practice>> {
    let path_ref = path.as_ref();
    let content = fs::read_to_string(path_ref).map_err(|err| {
        Error::Config(format!(
            "cannot read seed file {}: {}",
            path_ref.display(),
            err
        ))
    })?;
    practices_from_json(&content)
}

/// Expands every schedule of every practice into seed rows.
///
/// A schedule that fails to decode is logged and skipped; its siblings still expand.
pub fn seed_events(practices: &[Practice], today: NaiveDate, created_by: &str) -> Vec<SeedEvent> {
    let mut events = Vec::new();

    for practice in practices {
        for schedule in &practice.schedules {
            if schedule.spec.start_date.as_deref().is_none_or(str::is_empty) {
                tracing::info!("using {} as start date for '{}'", today, practice.name);
            }

            let rule = match RecurrenceRule::from_spec(&schedule.spec, today) {
                Ok(rule) => rule,
                Err(err) => {
                    tracing::warn!("skipping schedule of '{}': {}", practice.name, err);
                    continue;
                }
            };

            let before = events.len();
            events.extend(rule.occurrences().map(|occurrence| SeedEvent {
                start_at: occurrence.start_at,
                end_at: occurrence.end_at,
                location_name: schedule.location.clone(),
                program_name: practice.name.clone(),
                capacity: practice.capacity,
                created_by_email: created_by.to_string(),
                trainer_names: schedule.trainers.clone(),
            }));

            tracing::debug!(
                practice = %practice.name,
                day = %rule.day,
                count = events.len() - before,
                "seeded schedule"
            );
        }
    }

    events
}

/// Flattens each practice's membership list into eligibility rows.
pub fn eligibility_rows(practices: &[Practice]) -> Vec<EligibilityRow> {
    practices
        .iter()
        .flat_map(|practice| {
            practice.memberships.iter().map(|membership| EligibilityRow {
                practice_name: practice.name.clone(),
                membership_name: membership.name.clone(),
                stripe_price_id: membership.stripe_price_id.clone(),
            })
        })
        .collect()
}

fn memberships(names: &[&str]) -> Vec<MembershipEligibility> {
    names
        .iter()
        .map(|name| MembershipEligibility {
            name: (*name).to_string(),
            stripe_price_id: None,
        })
        .collect()
}

fn priced(name: &str, price_id: Option<&str>) -> MembershipEligibility {
    MembershipEligibility {
        name: name.to_string(),
        stripe_price_id: price_id.map(str::to_string),
    }
}

fn schedule(
    day: &str,
    start_date: Option<&str>,
    end_date: Option<&str>,
    times: (&str, &str),
    location: &str,
) -> SeedSchedule {
    SeedSchedule {
        spec: ScheduleSpec {
            day: day.to_string(),
            start_date: start_date.map(str::to_string),
            end_date: end_date.map(str::to_string),
            start_time: times.0.to_string(),
            end_time: times.1.to_string(),
        },
        location: location.to_string(),
        trainers: vec!["Test_Trainer".to_string()],
    }
}

const TRYOUT_LOCATIONS: &str = "Check out Tryout Locations via website";
const SPORTSPLEX: &str = "Rise Facility- Calgary Central Sportsplex";

const GENERAL_MEMBERSHIPS: &[&str] = &[
    "PAYG",
    "Rise Basketball Full Year Membership",
    "Jr.Rise Elite Hooper (Ages 5-8)",
    "2025 Spring Club Membership",
    "Seasonal Membership- Winter Rise League",
    "High School Pro Club",
    "Gym Membership",
    "Jr. Rise Seasonal (3 Months)",
    "Open Gym- Strength Room and Courts",
    "PAYMENT PLAN 2025 SPRING CLUB",
    "Rise Full Year Family Member Guided Strength Gym Membership",
    "Seasonal member - Rise WINTER LEAGUE",
    "SPRING RISE LEAGUE 2025",
    "Strength Room Unlimited Membership",
];

impl Practice {
    /// Built-in practice table used for local development databases.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                name: "Monday- Shooting Class".to_string(),
                description: "Shooting Class, All ages".to_string(),
                capacity: 30,
                memberships: memberships(GENERAL_MEMBERSHIPS),
                schedules: vec![
                    schedule("Monday", Some("2025-03-03"), None, ("17:30", "18:30"), TRYOUT_LOCATIONS),
                    schedule("Monday", Some("2025-03-03"), None, ("18:31", "19:30"), TRYOUT_LOCATIONS),
                ],
            },
            Self {
                name: "OPEN GYM/DROP IN-Select Courts".to_string(),
                description: "Full access to one of our open courts during designated times. \
                              See front desk for available court."
                    .to_string(),
                capacity: 1000,
                memberships: memberships(GENERAL_MEMBERSHIPS),
                schedules: vec![schedule(
                    "Saturday",
                    Some("2024-12-21"),
                    Some("2025-07-05"),
                    ("13:00", "23:00"),
                    SPORTSPLEX,
                )],
            },
            Self {
                name: "Saturday Strength".to_string(),
                description: "Strength".to_string(),
                capacity: 15,
                memberships: memberships(GENERAL_MEMBERSHIPS),
                schedules: vec![schedule("Saturday", None, None, ("09:00", "10:00"), TRYOUT_LOCATIONS)],
            },
            Self {
                name: "APRIL Spring Break Camp".to_string(),
                description: "Skills, drills and fun on the court. Bring indoor shoes, a ball, \
                              water bottles, lunch and snacks."
                    .to_string(),
                capacity: 300,
                memberships: vec![
                    priced("PAYG", Some("price_1R9snzAB1pU7Ebknp5imRy62")),
                    priced(
                        "Rise Basketball Full Year Membership",
                        Some("price_1R9sq7AB1pU7EbknKtPXbwAt"),
                    ),
                    priced("2025 Spring Club Membership", Some("price_1R9sraAB1pU7EbknLtevElCK")),
                    priced(
                        "PAYMENT PLAN 2025 SPRING CLUB",
                        Some("price_1R9ssQAB1pU7EbknVn9Lskuh"),
                    ),
                    priced("Strength Room Unlimited Membership", None),
                ],
                schedules: vec![schedule(
                    "Tuesday",
                    Some("2025-04-22"),
                    Some("2025-04-22"),
                    ("10:00", "15:30"),
                    SPORTSPLEX,
                )],
            },
            Self {
                name: "Rise & Honor Memorial Cup".to_string(),
                description: "Age groups U11 to U18, boys and girls".to_string(),
                capacity: 100,
                memberships: memberships(&["PAYG", "Clients"]),
                schedules: vec![schedule(
                    "Friday",
                    Some("2025-05-30"),
                    Some("2025-06-01"),
                    ("10:00", "20:00"),
                    SPORTSPLEX,
                )],
            },
        ]
    }
}

use std::fs;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::ValueEnum;
use rise_schedule_core::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per event
    Table,
    Json,
    Ics,
}

/// Parameters of the expand command
pub struct ExpandParams {
    pub day: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub title: String,
    pub collapse: bool,
    pub format: OutputFormat,
    pub output: Option<String>,
}

/// Parameters of the seed command
pub struct SeedParams {
    pub file: Option<String>,
    pub created_by: String,
    pub format: OutputFormat,
    pub output: Option<String>,
}

/// Expand one schedule
pub fn expand_command(params: ExpandParams) -> Result<()> {
    let today = Utc::now().date_naive();
    let spec = ScheduleSpec {
        day: params.day,
        start_date: params.start_date,
        end_date: params.end_date,
        start_time: params.start_time,
        end_time: params.end_time,
    };

    if spec.start_date.is_none() {
        tracing::info!("no start date given, using today ({})", today);
    }

    let rule = RecurrenceRule::from_spec(&spec, today).context("invalid schedule")?;
    if let Err(err) = rule.validate() {
        tracing::warn!("{}; the schedule has no occurrences", err);
    }

    tracing::info!(
        "expanding {} {}-{} from {} to {}",
        rule.day,
        rule.start_time,
        rule.end_time,
        rule.start,
        rule.end
    );

    let content = match params.format {
        OutputFormat::Table => render_table(rule.occurrences().map(|o| (o, None))),
        OutputFormat::Json => to_json(&rule.expand())?,
        OutputFormat::Ics => {
            let events: Vec<CalendarEvent> = if params.collapse {
                CalendarEvent::series(&params.title, &rule).into_iter().collect()
            } else {
                rule.occurrences()
                    .map(|o| CalendarEvent::from_occurrence(&params.title, &o))
                    .collect()
            };
            IcsGenerator::default().generate(&events)?
        }
    };

    write_output(params.output.as_deref(), &content)?;
    tracing::info!("{} occurrences", rule.occurrences().len());

    Ok(())
}

/// Expand the seed practice tables
pub fn seed_command(params: SeedParams) -> Result<()> {
    let practices = practices_from(params.file.as_deref())?;

    let events = seed_events(&practices, Utc::now().date_naive(), &params.created_by);
    tracing::info!(
        "seeded {} events from {} practices",
        events.len(),
        practices.len()
    );

    let content = match params.format {
        OutputFormat::Table => render_table(events.iter().map(|e| {
            (
                Occurrence {
                    start_at: e.start_at,
                    end_at: e.end_at,
                },
                Some(e.program_name.as_str()),
            )
        })),
        OutputFormat::Json => to_json(&events)?,
        OutputFormat::Ics => {
            let calendar: Vec<CalendarEvent> = events.iter().map(CalendarEvent::from).collect();
            IcsGenerator::default().generate(&calendar)?
        }
    };

    write_output(params.output.as_deref(), &content)
}

/// List which memberships may book each practice
pub fn eligibility_command(
    file: Option<&str>,
    format: OutputFormat,
    output: Option<&str>,
) -> Result<()> {
    let rows = eligibility_rows(&practices_from(file)?);

    let content: String = match format {
        OutputFormat::Table => rows
            .iter()
            .map(|row| {
                format!(
                    "{}  {}  {}\n",
                    row.practice_name,
                    row.membership_name,
                    row.stripe_price_id.as_deref().unwrap_or("free")
                )
            })
            .collect(),
        OutputFormat::Json => to_json(&rows)?,
        OutputFormat::Ics => anyhow::bail!("eligibility rows have no calendar form"),
    };

    write_output(output, &content)
}

/// List accepted day names
pub fn days_command() -> Result<()> {
    println!("Accepted days (any case):");
    for day in DayOfWeek::ALL {
        println!("  {} ({})", day.name(), day.as_db_str());
    }
    Ok(())
}

fn practices_from(file: Option<&str>) -> Result<Vec<Practice>> {
    match file {
        Some(file) => {
            tracing::info!("loading practices from {}", file);
            Ok(load_practices(file)?)
        }
        None => Ok(Practice::defaults()),
    }
}

fn render_table<'a>(rows: impl Iterator<Item = (Occurrence, Option<&'a str>)>) -> String {
    let mut out = String::new();
    for (occurrence, label) in rows {
        out.push_str(&format!(
            "{}  {}-{}",
            occurrence.start_at.format("%Y-%m-%d %a"),
            occurrence.start_at.format("%H:%M"),
            occurrence.end_at.format("%H:%M"),
        ));
        if let Some(label) = label {
            out.push_str("  ");
            out.push_str(label);
        }
        out.push('\n');
    }
    out
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}

fn write_output(output: Option<&str>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("cannot write {}", path))?;
            println!("✓ Saved to: {}", path);
        }
        None => print!("{}", content),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn table_rows_show_date_and_window() {
        let rule = RecurrenceRule::from_spec(
            &ScheduleSpec {
                day: "monday".to_string(),
                start_date: Some("2025-01-06".to_string()),
                end_date: Some("2025-01-13".to_string()),
                start_time: "09:00".to_string(),
                end_time: "10:00".to_string(),
            },
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        )
        .unwrap();

        let table = render_table(rule.occurrences().map(|o| (o, Some("Skills"))));

        assert_eq!(
            table,
            "2025-01-06 Mon  09:00-10:00  Skills\n2025-01-13 Mon  09:00-10:00  Skills\n"
        );
    }
}

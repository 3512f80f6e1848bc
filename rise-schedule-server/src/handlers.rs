use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use rise_schedule_core::prelude::*;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub practices: Arc<Vec<Practice>>,
    pub seed_author: Arc<str>,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

/// Output selection shared by every calendar endpoint
#[derive(Deserialize)]
struct FormatQuery {
    format: Option<String>, // "json" or "ics", "json" by default
    title: Option<String>,
}

impl FormatQuery {
    fn wants_ics(&self) -> bool {
        self.format.as_deref() == Some("ics")
    }

    fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("Rise Event")
    }
}

#[derive(Serialize)]
struct ExpandResponse {
    rule: RecurrenceRule,
    occurrences: Vec<Occurrence>,
}

#[derive(Serialize)]
struct RuleResult {
    index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    occurrences: Option<Vec<Occurrence>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct BatchResponse {
    total: usize,
    failed: usize,
    results: Vec<RuleResult>,
}

/// Existing events together with the change applied to them
#[derive(Deserialize)]
struct RescheduleBody {
    #[serde(flatten)]
    request: RescheduleRequest,
    events: Vec<ExistingEvent>,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/schedules/expand", post(expand_handler))
        .route("/schedules/expand/batch", post(expand_batch_handler))
        .route("/events/generate", post(generate_events_handler))
        .route("/events/reschedule", post(reschedule_handler))
        .route("/seed/events", get(seed_events_handler))
        .route("/seed/eligibility", get(eligibility_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Root handler
async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "Rise Schedule Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Expands weekly facility schedules into calendar events",
        "endpoints": {
            "health": "/health",
            "expand": "/schedules/expand",
            "expand_batch": "/schedules/expand/batch",
            "generate_events": "/events/generate",
            "reschedule_events": "/events/reschedule",
            "seed_events": "/seed/events",
            "seed_eligibility": "/seed/eligibility"
        }
    }))
}

/// Health check handler
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Expand a single schedule
async fn expand_handler(
    Query(params): Query<FormatQuery>,
    Json(spec): Json<ScheduleSpec>,
) -> Result<Response, AppError> {
    let rule = RecurrenceRule::from_spec(&spec, Utc::now().date_naive())?;

    if params.wants_ics() {
        let events: Vec<_> = rule
            .occurrences()
            .map(|o| CalendarEvent::from_occurrence(params.title(), &o))
            .collect();
        return ics_response(&events);
    }

    Ok(Json(ExpandResponse {
        rule,
        occurrences: rule.expand(),
    })
    .into_response())
}

/// Expand several schedules, reporting failures per schedule
async fn expand_batch_handler(Json(specs): Json<Vec<ScheduleSpec>>) -> impl IntoResponse {
    let batch = expand_batch(&specs, Utc::now().date_naive());

    let results: Vec<_> = batch
        .into_results()
        .into_iter()
        .enumerate()
        .map(|(index, result)| match result {
            Ok(occurrences) => RuleResult {
                index,
                occurrences: Some(occurrences),
                error: None,
            },
            Err(err) => RuleResult {
                index,
                occurrences: None,
                error: Some(err.to_string()),
            },
        })
        .collect();

    Json(BatchResponse {
        total: results.len(),
        failed: results.iter().filter(|r| r.error.is_some()).count(),
        results,
    })
}

/// Build the event rows for a recurrence request
async fn generate_events_handler(
    Query(params): Query<FormatQuery>,
    Json(recurrence): Json<EventRecurrence>,
) -> Result<Response, AppError> {
    let events = generate_events(&recurrence)?;
    tracing::info!(
        "generated {} events for program {}",
        events.len(),
        recurrence.program_id
    );

    if params.wants_ics() {
        let calendar: Vec<_> = events
            .iter()
            .map(|event| CalendarEvent::from_new_event(params.title(), event))
            .collect();
        return ics_response(&calendar);
    }

    Ok(Json(events).into_response())
}

/// Apply a new window to existing events, splitting off those past the new end
async fn reschedule_handler(Json(body): Json<RescheduleBody>) -> Result<Json<Reschedule>, AppError> {
    let outcome = reschedule(&body.request, &body.events)?;
    tracing::info!(
        "rescheduled {} events, {} to delete",
        outcome.updates.len(),
        outcome.deletions.len()
    );
    Ok(Json(outcome))
}

/// Membership eligibility of the configured seed practices
async fn eligibility_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(eligibility_rows(&state.practices))
}

/// Expand the configured seed practices
async fn seed_events_handler(
    Query(params): Query<FormatQuery>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let events = seed_events(
        &state.practices,
        Utc::now().date_naive(),
        &state.seed_author,
    );

    if params.wants_ics() {
        let calendar: Vec<CalendarEvent> = events.iter().map(CalendarEvent::from).collect();
        return ics_response(&calendar);
    }

    Ok(Json(events).into_response())
}

fn ics_response(events: &[CalendarEvent]) -> Result<Response, AppError> {
    let ics_content = IcsGenerator::default().generate(events)?;

    Ok((
        StatusCode::OK,
        [("Content-Type", "text/calendar; charset=utf-8")],
        ics_content,
    )
        .into_response())
}

/// Application error
#[derive(Debug)]
struct AppError(rise_schedule_core::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self.0 {
            err if err.is_invalid_input() => (StatusCode::BAD_REQUEST, "invalid request"),
            rise_schedule_core::Error::Config(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration error")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal server error"),
        };

        if status.is_server_error() {
            tracing::error!("{}", self.0);
        }

        let body = Json(ErrorResponse {
            error: error_message.to_string(),
            message: self.0.to_string(),
        });

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<rise_schedule_core::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

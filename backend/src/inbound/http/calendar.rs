//! Calendar event handlers for user dashboards.

use actix_web::{get, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::calendar::CalendarEvent;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthedUser;
use crate::inbound::http::state::HttpState;

/// Calendar event payload.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventResponse {
    /// Event id.
    pub id: Uuid,
    /// Title.
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Start time.
    pub starts_at: DateTime<Utc>,
    /// End time, when bounded.
    pub ends_at: Option<DateTime<Utc>>,
}

impl CalendarEventResponse {
    pub(crate) fn from_event(event: &CalendarEvent) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            description: event.description.clone(),
            starts_at: event.starts_at,
            ends_at: event.ends_at,
        }
    }
}

/// Upcoming events, soonest first.
#[utoipa::path(
    get,
    path = "/api/calendar-events",
    responses(
        (status = 200, description = "Upcoming events", body = [CalendarEventResponse]),
        (status = 401, description = "Unauthorised")
    ),
    tags = ["calendar"],
    operation_id = "listCalendarEvents"
)]
#[get("/calendar-events")]
pub async fn list_calendar_events(
    state: web::Data<HttpState>,
    _user: AuthedUser,
) -> ApiResult<web::Json<Vec<CalendarEventResponse>>> {
    let events = state.calendar_events.upcoming(Utc::now()).await?;
    Ok(web::Json(
        events.iter().map(CalendarEventResponse::from_event).collect(),
    ))
}

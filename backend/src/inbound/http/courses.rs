//! Public course catalogue handlers.

use actix_web::{get, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::course::Course;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Public course payload.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    /// Course id.
    pub id: Uuid,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Category label.
    pub category: Option<String>,
    /// Nominal duration in weeks.
    pub duration_weeks: Option<i32>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl CourseResponse {
    pub(crate) fn from_course(course: &Course) -> Self {
        Self {
            id: course.id,
            title: course.title.clone(),
            description: course.description.clone(),
            category: course.category.clone(),
            duration_weeks: course.duration_weeks,
            created_at: course.created_at,
        }
    }
}

/// Active courses, publicly listable.
#[utoipa::path(
    get,
    path = "/api/courses",
    responses(
        (status = 200, description = "Active courses", body = [CourseResponse])
    ),
    tags = ["courses"],
    operation_id = "listCourses",
    security([])
)]
#[get("/courses")]
pub async fn list_courses(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<CourseResponse>>> {
    let courses = state.courses.list_active().await?;
    Ok(web::Json(
        courses.iter().map(CourseResponse::from_course).collect(),
    ))
}

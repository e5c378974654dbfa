//! Public contact form handler.

use actix_web::{HttpResponse, post, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::Error;
use crate::domain::contact::{ContactMessage, ContactValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Contact form body.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactBody {
    /// Sender name.
    pub name: String,
    /// Sender email.
    pub email: String,
    /// Optional subject line.
    #[serde(default)]
    pub subject: Option<String>,
    /// Message body.
    pub message: String,
}

/// Submit a contact message.
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactBody,
    responses(
        (status = 202, description = "Message stored"),
        (status = 400, description = "Invalid request", body = Error)
    ),
    tags = ["contact"],
    operation_id = "submitContactMessage",
    security([])
)]
#[post("/contact")]
pub async fn submit_contact(
    state: web::Data<HttpState>,
    payload: web::Json<ContactBody>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let message = ContactMessage::submit(
        &body.name,
        &body.email,
        body.subject,
        &body.message,
        Utc::now(),
    )
    .map_err(|err| {
        let code = match &err {
            ContactValidationError::EmptyName => "empty_name",
            ContactValidationError::EmptyMessage => "empty_message",
            ContactValidationError::Email(_) => "invalid_email",
        };
        Error::invalid_request(err.to_string()).with_details(json!({ "code": code }))
    })?;

    state.contacts.insert(&message).await?;
    Ok(HttpResponse::Accepted().finish())
}

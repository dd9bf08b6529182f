use std::fmt::Debug;

use actix_web::http::header::CONTENT_TYPE;
use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use anyhow::Context;
use chrono::Utc;
use serde::Serialize;

use super::error_chain_fmt;
use crate::domain::SignupEmail;
use crate::domain::SignupSubmission;
use crate::domain::SubmissionError;
use crate::notification::NotificationMessage;
use crate::startup::SourceLabel;
use crate::webhook_client::DispatchOutcome;
use crate::webhook_client::WebhookClient;

pub const SUCCESS_MESSAGE: &str = "You're on the list! We'll be in touch soon.";

/// Largest signup body read, in bytes. A real form posts well under 1 KiB.
pub const SIGNUP_BODY_LIMIT: usize = 16 * 1024;

/// JSON body of every signup response: either `success` (with an optional
/// `message`) or `error`, never both.
#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    Success {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<&'static str>,
    },
    Failure {
        error: String,
    },
}

impl ResponseEnvelope {
    fn success(message: Option<&'static str>) -> Self {
        Self::Success {
            success: true,
            message,
        }
    }
}

/// Only the `Display` strings are shown to the caller; both 500 variants
/// share the same generic text, and the detail goes to the logs via `Debug`.
#[derive(thiserror::Error)]
pub enum SignupError {
    #[error("Invalid content type")]
    InvalidContentType(String),
    #[error("Valid email required")]
    InvalidEmail(String),
    /// The body could not be read (e.g. too large), or claimed to be
    /// JSON/form but could not be decoded
    #[error("Something went wrong. Please try again.")]
    MalformedBody(#[source] anyhow::Error),
    #[error("Something went wrong. Please try again.")]
    UnexpectedError(#[from] anyhow::Error),
}

impl Debug for SignupError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SignupError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidContentType(_) | Self::InvalidEmail(_) => StatusCode::BAD_REQUEST,
            Self::MalformedBody(_) | Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // CORS headers are added by the resource's `DefaultHeaders`, which also
    // wraps error responses
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ResponseEnvelope::Failure {
            error: self.to_string(),
        })
    }
}

impl From<SubmissionError> for SignupError {
    fn from(e: SubmissionError) -> Self {
        match e {
            SubmissionError::UnsupportedContentType(t) => Self::InvalidContentType(t),
            e => Self::MalformedBody(anyhow::Error::new(e).context("Failed to decode signup body")),
        }
    }
}

impl TryFrom<SignupSubmission> for SignupEmail {
    type Error = String;
    fn try_from(value: SignupSubmission) -> Result<Self, Self::Error> {
        let email = value.email.ok_or("Missing email")?;
        SignupEmail::parse(email)
    }
}

/// `POST /api/signup`
///
/// Accepts `{"email": ..., "website": ...}` as JSON, or the same fields as a
/// urlencoded or multipart form, where `website` is a honeypot. A valid
/// signup is relayed to the chat webhook; the caller never learns whether
/// that worked.
///
/// | outcome                           | status | body                          |
/// |-----------------------------------|--------|-------------------------------|
/// | unsupported content type          | 400    | `{"error": ...}`              |
/// | honeypot filled in                | 200    | `{"success": true}`           |
/// | missing/invalid email             | 400    | `{"error": ...}`              |
/// | webhook url not configured        | 200    | `{"success": true}`           |
/// | webhook called (any status)       | 200    | `{"success": true, "message"}`|
/// | body unreadable/too large/garbled | 500    | `{"error": <generic>}`        |
/// | webhook unreachable               | 500    | `{"error": <generic>}`        |
///
/// # Request example
///
/// ```sh
///     curl -v --data 'email=john@foo.com&website=' http://127.0.0.1:8000/api/signup
///     curl -v -F email=john@foo.com -F website= http://127.0.0.1:8000/api/signup
///     curl -v -H 'Content-Type: application/json' -d '{"email":"john@foo.com"}' \
///         http://127.0.0.1:8000/api/signup
/// ```
#[tracing::instrument(
    name = "Handling beta signup",
    // the raw email is never logged, only the normalized one
    skip_all,
    fields(signup_email = tracing::field::Empty)
)]
pub async fn signup(
    req: HttpRequest,
    // a body over `SIGNUP_BODY_LIMIT` arrives here as an error, so that it
    // still gets the JSON envelope (500) rather than actix's plaintext 413
    body: Result<web::Bytes, actix_web::Error>,
    webhook_client: web::Data<WebhookClient>,
    source_label: web::Data<SourceLabel>,
) -> Result<HttpResponse, SignupError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    handle_signup(content_type, body, &webhook_client, &source_label.0)
        .await
        .map_err(|e| {
            if e.status_code().is_server_error() {
                tracing::error!(error.cause_chain = ?e, error.message = %e, "Signup failed");
            }
            e
        })
}

async fn handle_signup(
    content_type: &str,
    body: Result<web::Bytes, actix_web::Error>,
    webhook_client: &WebhookClient,
    source_label: &str,
) -> Result<HttpResponse, SignupError> {
    // `actix_web::Error` is not `Sync`, so only its message is kept
    let body = body
        .map_err(|e| SignupError::MalformedBody(anyhow::anyhow!("Failed to read signup body: {e}")))?;
    let submission = SignupSubmission::parse(content_type, &body).await?;

    if submission.is_bot() {
        // pretend it worked, so bots have nothing to learn from
        tracing::info!("Honeypot filled in, discarding submission");
        return Ok(HttpResponse::Ok().json(ResponseEnvelope::success(None)));
    }

    let email: SignupEmail = submission.try_into().map_err(SignupError::InvalidEmail)?;
    tracing::Span::current().record("signup_email", tracing::field::display(&email));

    let message = NotificationMessage::new(&email, source_label, Utc::now());
    let outcome = webhook_client
        .send_notification(&message)
        .await
        .context("Failed to post signup notification to webhook")?;

    let reply = match outcome {
        DispatchOutcome::Delivered => ResponseEnvelope::success(Some(SUCCESS_MESSAGE)),
        DispatchOutcome::NotConfigured => {
            tracing::error!("Webhook url not configured, signup notification dropped");
            ResponseEnvelope::success(None)
        }
        DispatchOutcome::Rejected { status, body } => {
            tracing::error!(%status, body = %body, "Webhook rejected signup notification");
            ResponseEnvelope::success(Some(SUCCESS_MESSAGE))
        }
    };
    Ok(HttpResponse::Ok().json(reply))
}

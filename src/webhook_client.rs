use reqwest::Client;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use secrecy::Secret;

use crate::notification::NotificationMessage;

/// Posts signup notifications to a chat webhook.
///
/// A single `Client` is kept for the lifetime of the app (shared via
/// `web::Data`), so connections to the webhook host are reused. No timeout is
/// set: the signup response waits for the webhook, however long it takes.
pub struct WebhookClient {
    http_client: Client,
    url: Option<Secret<String>>,
}

/// What happened to a notification that did not fail outright.
#[derive(Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    /// No url configured; nothing was sent.
    NotConfigured,
    /// The webhook answered, but not with 2xx.
    Rejected { status: StatusCode, body: String },
}

impl WebhookClient {
    pub fn new(url: Option<Secret<String>>) -> Self {
        Self {
            http_client: Client::new(),
            url,
        }
    }

    pub fn is_configured(&self) -> bool { self.url.is_some() }

    /// Errors are transport-level only (unreachable host, invalid url, body
    /// could not be read); a non-2xx answer is `DispatchOutcome::Rejected`.
    #[tracing::instrument(name = "Posting signup notification to webhook", skip_all)]
    pub async fn send_notification(
        &self,
        message: &NotificationMessage,
    ) -> Result<DispatchOutcome, reqwest::Error> {
        let Some(url) = &self.url else {
            return Ok(DispatchOutcome::NotConfigured);
        };

        let resp = self
            .http_client
            .post(url.expose_secret())
            .json(message)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(DispatchOutcome::Delivered);
        }
        Ok(DispatchOutcome::Rejected {
            status,
            body: resp.text().await?,
        })
    }
}

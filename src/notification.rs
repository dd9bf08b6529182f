use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;
use serde::Serialize;

use crate::domain::SignupEmail;

pub const HEADER_TEXT: &str = "🎉 New CartGoals Beta Signup!";

/// One signup, rendered as a chat message made of blocks (header, a section
/// with two fields, and a context line). This is what gets `POST`ed to the
/// webhook, verbatim.
#[derive(Serialize, Debug)]
pub struct NotificationMessage {
    blocks: Vec<Block>,
}

#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Block {
    Header { text: Text },
    Section { fields: Vec<Text> },
    Context { elements: Vec<Text> },
}

#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Text {
    PlainText { text: String, emoji: bool },
    Mrkdwn { text: String },
}

impl Text {
    fn mrkdwn(text: String) -> Self { Self::Mrkdwn { text } }
}

impl NotificationMessage {
    pub fn new(
        email: &SignupEmail,
        source_label: &str,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        // e.g. 2024-04-23T07:48:23.364Z
        let submitted_at = submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        Self {
            blocks: vec![
                Block::Header {
                    text: Text::PlainText {
                        text: HEADER_TEXT.to_string(),
                        emoji: true,
                    },
                },
                Block::Section {
                    fields: vec![
                        Text::mrkdwn(format!("*Email:*\n{email}")),
                        Text::mrkdwn(format!("*Source:*\n{source_label}")),
                    ],
                },
                Block::Context {
                    elements: vec![Text::mrkdwn(format!("Submitted: {submitted_at}"))],
                },
            ],
        }
    }
}

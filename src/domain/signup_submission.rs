use std::convert::Infallible;

use serde_json::Value;

#[derive(thiserror::Error, Debug)]
pub enum SubmissionError {
    #[error("Unsupported content type: {0:?}")]
    UnsupportedContentType(String),
    #[error("Malformed JSON body")]
    MalformedJson(#[source] serde_json::Error),
    #[error("Expected `email` to be a string, got {0}")]
    EmailNotAString(Value),
    #[error("Malformed form body")]
    MalformedForm(#[source] serde_urlencoded::de::Error),
    #[error("Malformed multipart body")]
    MalformedMultipart(#[source] multer::Error),
}

/// Raw, unvalidated signup as decoded from the request body. Lives for a
/// single request; see `SignupEmail` for the validated form.
///
/// The form's `website` field is a honeypot: it is hidden from humans, so
/// only bots fill it in. Its value is never needed, only whether it was set.
#[derive(Debug, Default)]
pub struct SignupSubmission {
    pub email: Option<String>,
    pub honeypot_filled: bool,
}

impl SignupSubmission {
    /// Decode `body` according to the request's declared `content_type`:
    /// a JSON object, a urlencoded form, or a multipart form. Anything else
    /// (including a missing header) is rejected before the body is looked at.
    ///
    /// For forms, the first value of a repeated field wins.
    pub async fn parse(
        content_type: &str,
        body: &[u8],
    ) -> Result<Self, SubmissionError> {
        let lowercase = content_type.to_lowercase();

        if lowercase.contains("application/json") {
            Self::from_json(body)
        } else if lowercase.contains("application/x-www-form-urlencoded") {
            let fields: Vec<(String, String)> =
                serde_urlencoded::from_bytes(body).map_err(SubmissionError::MalformedForm)?;
            Ok(Self::from_form_fields(fields))
        } else if lowercase.contains("multipart/form-data") {
            // the boundary is case sensitive, so use the header as sent
            Self::from_multipart(content_type, body)
                .await
                .map_err(SubmissionError::MalformedMultipart)
        } else {
            Err(SubmissionError::UnsupportedContentType(lowercase))
        }
    }

    /// Any non-empty honeypot value means the submission came from a bot.
    pub fn is_bot(&self) -> bool { self.honeypot_filled }

    fn from_json(body: &[u8]) -> Result<Self, SubmissionError> {
        let value: Value = serde_json::from_slice(body).map_err(SubmissionError::MalformedJson)?;

        // only an object has fields; `[...]`, `"..."` etc carry no email
        let Value::Object(mut fields) = value else {
            return Ok(Self::default());
        };

        // bots put all sorts in here (`1`, `true`, ...); whatever the type, they
        // must get the same fake success as a string would, so the honeypot is
        // checked before anything can fail
        if fields.get("website").is_some_and(is_filled) {
            return Ok(Self {
                email: None,
                honeypot_filled: true,
            });
        }

        let email = match fields.remove("email") {
            None | Some(Value::Null) => None,
            Some(Value::String(email)) => Some(email),
            Some(other) => return Err(SubmissionError::EmailNotAString(other)),
        };
        Ok(Self {
            email,
            honeypot_filled: false,
        })
    }

    fn from_form_fields(fields: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut email = None;
        let mut website = None;
        for (name, value) in fields {
            match name.as_str() {
                "email" if email.is_none() => email = Some(value),
                "website" if website.is_none() => website = Some(value),
                _ => {}
            }
        }
        Self {
            email,
            honeypot_filled: website.is_some_and(|w| !w.is_empty()),
        }
    }

    async fn from_multipart(
        content_type: &str,
        body: &[u8],
    ) -> Result<Self, multer::Error> {
        let boundary = multer::parse_boundary(content_type)?;
        let body = body.to_vec();
        let stream = futures_util::stream::once(async move { Ok::<_, Infallible>(body) });
        let mut multipart = multer::Multipart::new(stream, boundary);

        let mut fields = Vec::new();
        while let Some(field) = multipart.next_field().await? {
            // unnamed parts are skipped (and drained by `next_field`)
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            fields.push((name, field.text().await?));
        }
        Ok(Self::from_form_fields(fields))
    }
}

/// Whether a JSON honeypot value counts as filled in: anything but `null`,
/// `false`, `0` and `""`.
fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

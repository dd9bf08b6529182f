use unicode_segmentation::UnicodeSegmentation;

/// Longest address accepted downstream; anything longer is truncated, not
/// rejected.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Shortest raw (untrimmed) input considered an email at all.
const MIN_EMAIL_LENGTH: usize = 5;

/// A signup email that passed the (deliberately loose) validation and has been
/// normalized. Must be instantiated with `SignupEmail::parse`.
///
/// This is intentionally weaker than RFC 5322 parsing: anything with an `@`
/// and a few characters gets through, and a human reads the notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupEmail(String);

impl SignupEmail {
    /// Validate `email` as submitted (before trimming), then trim, lowercase,
    /// and truncate to `MAX_EMAIL_LENGTH` characters, in that order.
    pub fn parse(email: String) -> Result<Self, String> {
        // lengths are in graphemes, so a combining accent is never cut off its
        // letter; for ASCII addresses this is the same as counting bytes
        let long_enough = email.graphemes(true).count() >= MIN_EMAIL_LENGTH;
        if !email.contains('@') || !long_enough {
            return Err(format!("Invalid email: {email:?}"));
        }

        let normalized = email
            .trim()
            .to_lowercase()
            .graphemes(true)
            .take(MAX_EMAIL_LENGTH)
            .collect();
        Ok(Self(normalized))
    }
}

impl AsRef<str> for SignupEmail {
    fn as_ref(&self) -> &str { &self.0 }
}

impl std::fmt::Display for SignupEmail {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

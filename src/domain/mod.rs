mod signup_email;
mod signup_submission;
// allow external `use` statements to skip `signup_email` etc
pub use signup_email::SignupEmail;
pub use signup_email::MAX_EMAIL_LENGTH;
pub use signup_submission::SignupSubmission;
pub use signup_submission::SubmissionError;

use actix_web::http::header::ACCESS_CONTROL_MAX_AGE;
use actix_web::HttpResponse;

/// How long (seconds) browsers may cache a preflight answer: one day.
pub const PREFLIGHT_MAX_AGE: u32 = 86_400;

/// `OPTIONS /api/signup`
///
/// Answers the browser's CORS preflight. The allow-origin/methods/headers
/// trio is added by the `DefaultHeaders` wrapping the resource (see
/// `startup::run`), so only the cache hint is set here.
pub async fn preflight() -> HttpResponse {
    HttpResponse::NoContent()
        .insert_header((ACCESS_CONTROL_MAX_AGE, PREFLIGHT_MAX_AGE))
        .finish()
}

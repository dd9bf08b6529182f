use actix_web::HttpResponse;

/// `GET /health_check`
///
/// Liveness probe for the host; does not touch the webhook.
pub async fn health_check() -> HttpResponse { HttpResponse::Ok().finish() }

use reqwest::header::ACCESS_CONTROL_ALLOW_HEADERS;
use reqwest::header::ACCESS_CONTROL_ALLOW_METHODS;
use reqwest::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use reqwest::header::ACCESS_CONTROL_MAX_AGE;
use reqwest::header::CONTENT_TYPE;
use wiremock::matchers::any;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::spawn_app;
use crate::helpers::TEST_ORIGIN;

#[tokio::test]
async fn preflight_is_204_with_cors_headers() {
    let app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.webhook_server)
        .await;

    let resp = app.preflight().await;
    assert_eq!(resp.status().as_u16(), 204);

    let headers = resp.headers();
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], TEST_ORIGIN);
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
    assert_eq!(headers[ACCESS_CONTROL_MAX_AGE], "86400");
    assert!(headers.get(CONTENT_TYPE).is_none());

    assert!(resp.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn max_age_is_preflight_only() {
    let app = spawn_app().await;
    let resp = app.post_signup(Some("text/plain"), "hi".to_string()).await;
    assert!(resp.headers().get(ACCESS_CONTROL_MAX_AGE).is_none());
    assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], TEST_ORIGIN);
}

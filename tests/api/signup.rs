use std::net::TcpListener;

use beta_signup::routes::SIGNUP_BODY_LIMIT;
use beta_signup::routes::SUCCESS_MESSAGE;
use fake::faker::internet::en::SafeEmail;
use fake::Fake;
use reqwest::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use secrecy::Secret;
use serde_json::json;
use serde_json::Value;
use wiremock::matchers::any;
use wiremock::matchers::method;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::spawn_app;
use crate::helpers::spawn_app_with;
use crate::helpers::TestApp;
use crate::helpers::TEST_ORIGIN;

const GENERIC_ERROR: &str = "Something went wrong. Please try again.";

/// Any call to the webhook fails the test (checked when the `MockServer` is
/// dropped)
async fn forbid_notifications(app: &TestApp) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .named("No notification expected")
        .expect(0)
        .mount(&app.webhook_server)
        .await;
}

async fn expect_notification(
    app: &TestApp,
    status: u16,
) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(status).set_body_string("webhook says no"))
        .named("Signup notification")
        .expect(1)
        .mount(&app.webhook_server)
        .await;
}

async fn assert_reply(
    resp: reqwest::Response,
    status: u16,
    body: Value,
    msg: &str,
) {
    assert_eq!(resp.status().as_u16(), status, "{msg}");
    assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], TEST_ORIGIN, "{msg}");
    assert_eq!(resp.json::<Value>().await.unwrap(), body, "{msg}");
}

#[tokio::test]
async fn valid_signup_is_relayed() {
    let app = spawn_app().await;
    expect_notification(&app, 200).await;

    let resp = app
        .post_signup_json(&json!({ "email": "a@b.com", "website": "" }))
        .await;

    assert_reply(
        resp,
        200,
        json!({ "success": true, "message": SUCCESS_MESSAGE }),
        "json",
    )
    .await;
    assert_eq!(app.relayed_email().await, "a@b.com");
}

#[tokio::test]
async fn valid_form_signup_is_relayed() {
    let app = spawn_app().await;
    expect_notification(&app, 200).await;

    let email: String = SafeEmail().fake();
    let body = serde_urlencoded::to_string([("email", email.as_str()), ("website", "")]).unwrap();
    let resp = app.post_signup_form(&body).await;

    assert_reply(
        resp,
        200,
        json!({ "success": true, "message": SUCCESS_MESSAGE }),
        "form",
    )
    .await;
    assert_eq!(app.relayed_email().await, email.to_lowercase());
}

#[tokio::test]
async fn notification_layout() {
    let app = spawn_app().await;
    expect_notification(&app, 200).await;

    app.post_signup_json(&json!({ "email": "a@b.com" }))
        .await
        .error_for_status()
        .unwrap();

    let reqs = app.webhook_server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&reqs[0].body).unwrap();
    let blocks = body["blocks"].as_array().unwrap();

    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0]["type"], "header");
    assert_eq!(blocks[1]["fields"][1]["text"], "*Source:*\nsignup.test");
    let submitted = blocks[2]["elements"][0]["text"].as_str().unwrap();
    let submitted = submitted.strip_prefix("Submitted: ").unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(submitted).is_ok(), "{submitted}");
}

#[tokio::test]
async fn email_is_normalized_before_relay() {
    let app = spawn_app().await;
    expect_notification(&app, 200).await;

    app.post_signup_form("email=%20%20User%40Example.com%20&website=")
        .await
        .error_for_status()
        .unwrap();

    assert_eq!(app.relayed_email().await, "user@example.com");
}

#[tokio::test]
async fn long_email_is_truncated() {
    let app = spawn_app().await;
    expect_notification(&app, 200).await;

    let email = format!("{}@example.com", "X".repeat(300));
    app.post_signup_json(&json!({ "email": email }))
        .await
        .error_for_status()
        .unwrap();

    assert_eq!(app.relayed_email().await, "x".repeat(254));
}

#[tokio::test]
async fn invalid_content_type_is_rejected() {
    let app = spawn_app().await;
    forbid_notifications(&app).await;

    for content_type in [Some("text/plain"), Some("application/xml"), None] {
        let resp = app
            .post_signup(content_type, r#"{"email":"a@b.com"}"#.to_string())
            .await;
        assert_reply(
            resp,
            400,
            json!({ "error": "Invalid content type" }),
            &format!("{content_type:?}"),
        )
        .await;
    }
}

#[tokio::test]
async fn honeypot_fakes_success() {
    let app = spawn_app().await;
    forbid_notifications(&app).await;

    for (body, msg) in [
        (json!({ "email": "a@b.com", "website": "http://spam.example" }), "valid email"),
        (json!({ "email": "nope", "website": "x" }), "invalid email"),
        (json!({ "website": "x" }), "no email"),
    ] {
        let resp = app.post_signup_json(&body).await;
        assert_reply(resp, 200, json!({ "success": true }), msg).await;
    }

    let resp = app.post_signup_form("email=a%40b.com&website=spam").await;
    assert_reply(resp, 200, json!({ "success": true }), "form").await;

    let resp = app
        .post_signup_multipart(&[("email", "a@b.com"), ("website", "spam")])
        .await;
    assert_reply(resp, 200, json!({ "success": true }), "multipart").await;
}

#[tokio::test]
async fn honeypot_of_any_json_type_fakes_success() {
    let app = spawn_app().await;
    forbid_notifications(&app).await;

    for (body, msg) in [
        (json!({ "email": "a@b.com", "website": 1 }), "number"),
        (json!({ "email": "x", "website": true }), "bool"),
        (json!({ "email": 42, "website": ["x"] }), "array, bad email"),
    ] {
        let resp = app.post_signup_json(&body).await;
        assert_reply(resp, 200, json!({ "success": true }), msg).await;
    }
}

#[tokio::test]
async fn multipart_signup_is_relayed() {
    let app = spawn_app().await;
    expect_notification(&app, 200).await;

    let resp = app
        .post_signup_multipart(&[("email", "A@B.com"), ("website", "")])
        .await;

    assert_reply(
        resp,
        200,
        json!({ "success": true, "message": SUCCESS_MESSAGE }),
        "multipart",
    )
    .await;
    assert_eq!(app.relayed_email().await, "a@b.com");
}

#[tokio::test]
async fn repeated_form_field_takes_first_value() {
    let app = spawn_app().await;
    expect_notification(&app, 200).await;

    app.post_signup_form("email=a%40b.com&email=c%40d.com&website=")
        .await
        .error_for_status()
        .unwrap();

    assert_eq!(app.relayed_email().await, "a@b.com");
}

#[tokio::test]
async fn json_array_has_no_email() {
    let app = spawn_app().await;
    forbid_notifications(&app).await;

    let resp = app.post_signup_json(&json!(["a@b.com"])).await;
    assert_reply(resp, 400, json!({ "error": "Valid email required" }), "array").await;
}

#[tokio::test]
async fn oversized_body_is_generic_500() {
    let app = spawn_app().await;
    forbid_notifications(&app).await;

    let padding = "x".repeat(SIGNUP_BODY_LIMIT);
    let resp = app
        .post_signup_json(&json!({ "email": "a@b.com", "padding": padding }))
        .await;
    assert_reply(resp, 500, json!({ "error": GENERIC_ERROR }), "oversized").await;
}

#[tokio::test]
async fn invalid_email_is_rejected() {
    let app = spawn_app().await;
    forbid_notifications(&app).await;

    for (body, msg) in [
        ("", "no fields"),
        ("website=", "no email"),
        ("email=&website=", "empty email"),
        ("email=not-an-email", "no @"),
        ("email=a%40b", "too short"),
    ] {
        let resp = app.post_signup_form(body).await;
        assert_reply(resp, 400, json!({ "error": "Valid email required" }), msg).await;
    }

    let resp = app.post_signup_json(&json!({ "email": null })).await;
    assert_reply(resp, 400, json!({ "error": "Valid email required" }), "null").await;
}

#[tokio::test]
async fn malformed_body_is_generic_500() {
    let app = spawn_app().await;
    forbid_notifications(&app).await;

    for body in ["{not json", r#"{"email": 42}"#] {
        let resp = app
            .post_signup(Some("application/json"), body.to_string())
            .await;
        assert_reply(resp, 500, json!({ "error": GENERIC_ERROR }), body).await;
    }
}

#[tokio::test]
async fn unset_webhook_still_succeeds() {
    let app = spawn_app_with(|cfg, _| cfg.webhook.url = None).await;
    forbid_notifications(&app).await;

    let resp = app.post_signup_json(&json!({ "email": "a@b.com" })).await;
    assert_reply(resp, 200, json!({ "success": true }), "unset").await;

    let app = spawn_app_with(|cfg, _| cfg.webhook.url = Some(Secret::new(String::new()))).await;
    forbid_notifications(&app).await;

    let resp = app.post_signup_json(&json!({ "email": "a@b.com" })).await;
    assert_reply(resp, 200, json!({ "success": true }), "empty").await;
}

#[tokio::test]
async fn webhook_failure_still_succeeds() {
    let app = spawn_app().await;
    expect_notification(&app, 500).await;

    let resp = app.post_signup_json(&json!({ "email": "a@b.com" })).await;
    assert_reply(
        resp,
        200,
        json!({ "success": true, "message": SUCCESS_MESSAGE }),
        "webhook 500",
    )
    .await;
}

#[tokio::test]
async fn unreachable_webhook_is_generic_500() {
    // bind, then release, a port; nothing listens there afterwards
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let app = spawn_app_with(|cfg, _| {
        cfg.webhook.url = Some(Secret::new(format!("http://127.0.0.1:{port}/hook")));
    })
    .await;

    let resp = app.post_signup_json(&json!({ "email": "a@b.com" })).await;
    assert_reply(resp, 500, json!({ "error": GENERIC_ERROR }), "unreachable").await;
}

use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use bml_agents::ConciergeConfig;
use bml_api::{build_app, build_router, ApiConfig, ApiState};
use serde_json::{json, Value};
use tower::ServiceExt;

const API_KEY: &str = "dev-bamboolino-key";

fn app_with(api: ApiConfig) -> Router {
    build_router(ApiState::new(&api, ConciergeConfig::default()))
}

fn app() -> Router {
    app_with(ApiConfig::default())
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, parsed)
}

fn button_actions(reply: &Value) -> Vec<String> {
    reply["keyboard"]["rows"]
        .as_array()
        .into_iter()
        .flatten()
        .flat_map(|row| row.as_array().into_iter().flatten())
        .filter_map(|button| button["action"].as_str().map(ToString::to_string))
        .collect()
}

#[tokio::test]
async fn health_is_public() {
    let app = build_app().await.expect("app should build");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert!(response.headers().get("x-request-id").is_some());

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["status"], "ok");
    assert!(parsed["metrics"].get("requests_total").is_some());
}

#[tokio::test]
async fn chat_requires_api_key() {
    let app = app();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "user_id": "guest", "text": "opening hours" }).to_string(),
        ))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn start_uses_locale_for_welcome() {
    let app = app();
    let (status, reply) = send(
        &app,
        post("/v1/start", json!({ "user_id": "anna", "locale": "de-AT" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["language"], "de");
    assert!(reply["text"]
        .as_str()
        .unwrap()
        .starts_with("🎉 **Willkommen beim Bamboolino Spielplatz Bot!**"));
    assert!(button_actions(&reply).contains(&"booking_menu".to_string()));
}

#[tokio::test]
async fn chat_answers_faq_in_detected_language() {
    let app = app();
    let (status, reply) = send(
        &app,
        post(
            "/v1/chat",
            json!({ "user_id": "guest", "text": "Wann ist der Spielplatz geöffnet?" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["language"], "de");
    assert_eq!(reply["matched_topic"], "opening_hours");
}

#[tokio::test]
async fn chat_rejects_blank_user_and_oversized_text() {
    let app = app();
    let (status, body) = send(&app, post("/v1/chat", json!({ "user_id": " ", "text": "hi" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_user_id");

    let (status, body) = send(
        &app,
        post("/v1/chat", json!({ "user_id": "guest", "text": "a".repeat(2_001) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "text_too_long");
}

#[tokio::test]
async fn button_flow_confirms_booking_and_clears_session() {
    let app = app();
    let user = "family-1";

    let (_, reply) = send(&app, post("/v1/action", json!({ "user_id": user, "action": "booking_menu" }))).await;
    assert!(button_actions(&reply).contains(&"booking_entry".to_string()));

    let (_, reply) = send(&app, post("/v1/action", json!({ "user_id": user, "action": "booking_entry" }))).await;
    assert!(button_actions(&reply).contains(&"sub_family".to_string()));

    let (_, reply) = send(&app, post("/v1/action", json!({ "user_id": user, "action": "sub_family" }))).await;
    let first_date = button_actions(&reply)
        .into_iter()
        .find(|action| action.starts_with("date_"))
        .expect("calendar offers dates");

    let (status, session) = send(
        &app,
        Request::builder()
            .uri(format!("/v1/booking/{user}"))
            .header("x-api-key", API_KEY)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["step"], "selecting_date");

    let (_, reply) = send(&app, post("/v1/action", json!({ "user_id": user, "action": first_date }))).await;
    let slot = button_actions(&reply)
        .into_iter()
        .find(|action| action.starts_with("time_") && action.ends_with("_09:00-12:00"))
        .expect("morning slot offered");

    let (status, reply) = send(&app, post("/v1/action", json!({ "user_id": user, "action": slot }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["booking"]["price"], 35);
    assert!(reply["booking"]["booking_id"].as_str().unwrap().starts_with("BML"));
    assert_eq!(reply["qr"]["media_type"], "application/json");

    let (status, body) = send(
        &app,
        Request::builder()
            .uri(format!("/v1/booking/{user}"))
            .header("x-api-key", API_KEY)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "no_active_booking");

    let (_, health) = send(&app, Request::builder().uri("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(health["metrics"]["bookings_confirmed_total"], 1);
}

#[tokio::test]
async fn transcript_routes_with_given_language() {
    let app = app();
    let (status, reply) = send(
        &app,
        post(
            "/v1/transcript",
            json!({ "user_id": "voice", "text": "opening hours", "language": "de" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["language"], "de");
    assert_eq!(reply["matched_topic"], "opening_hours");
}

#[tokio::test]
async fn rate_limit_applies_per_client() {
    let app = app_with(ApiConfig {
        rate_limit_max: 2,
        rate_limit_window: Duration::from_secs(60),
        ..ApiConfig::default()
    });

    let request = |client: &str| {
        let mut request = post("/v1/chat", json!({ "user_id": "busy", "text": "hi" }));
        request
            .headers_mut()
            .insert("x-client-id", client.parse().unwrap());
        request
    };

    assert_eq!(send(&app, request("kiosk")).await.0, StatusCode::OK);
    assert_eq!(send(&app, request("kiosk")).await.0, StatusCode::OK);
    let (status, body) = send(&app, request("kiosk")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "rate_limited");

    assert_eq!(send(&app, request("tablet")).await.0, StatusCode::OK);

    let health = Request::builder().uri("/health").body(Body::empty()).unwrap();
    assert_eq!(send(&app, health).await.0, StatusCode::OK);
}

#[tokio::test]
async fn voice_without_transcriber_explains_itself() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/v1/voice/caller")
        .header("content-type", "application/octet-stream")
        .header("x-api-key", API_KEY)
        .body(Body::from(vec![0_u8, 1, 2, 3]))
        .unwrap();

    let (status, reply) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["language"], "en");
    assert!(reply["text"].as_str().is_some_and(|text| !text.is_empty()));
}

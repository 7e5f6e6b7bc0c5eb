#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web};
use customer_support_server::{AppState, Settings};
use serde_json::{json, Value};

/// Fresh state over its own in-memory database.
pub async fn test_state(auth_required: bool) -> web::Data<AppState> {
    let mut config = Settings::new_for_test().expect("Failed to load test config");
    config.auth.required = auth_required;
    let state = AppState::new(config).await.expect("Failed to build app state");
    web::Data::new(state)
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Registers a user and returns `(access_token, user_id)`.
pub async fn register<S, B>(app: &S, email: &str, is_agent: bool) -> (String, i64)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "email": email,
            "password": "secret12",
            "full_name": null,
            "is_agent": is_agent
        }))
        .send_request(app)
        .await;
    assert!(resp.status().is_success(), "registration failed: {}", resp.status());

    let body: Value = test::read_body_json(resp).await;
    (
        body["access_token"].as_str().expect("token").to_string(),
        body["user_id"].as_i64().expect("user id"),
    )
}

/// Creates a ticket as `token` for `creator_id` and returns the ticket JSON.
pub async fn create_ticket<S, B>(app: &S, token: &str, creator_id: i64, title: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::TestRequest::post()
        .uri("/tickets")
        .insert_header(bearer(token))
        .set_json(json!({ "title": title, "creator_id": creator_id }))
        .send_request(app)
        .await;
    assert_eq!(resp.status(), 201);
    test::read_body_json(resp).await
}

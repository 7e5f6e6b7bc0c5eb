mod common;

use actix_web::{http::header, test, App};
use common::{bearer, register, test_state};
use customer_support_server::configure_routes;
use serde_json::{json, Value};

#[actix_web::test]
async fn test_register_and_login() {
    let app = test::init_service(
        App::new()
            .app_data(test_state(true).await)
            .configure(configure_routes),
    )
    .await;

    let register_response = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "email": "test@example.com",
            "password": "password123",
            "full_name": "Test User"
        }))
        .send_request(&app)
        .await;

    assert_eq!(register_response.status(), 201);
    let register_body: Value = test::read_body_json(register_response).await;
    assert_eq!(register_body["message"], "registered");
    assert_eq!(register_body["token_type"], "bearer");
    assert!(register_body["access_token"].as_str().is_some());

    let login_response = test::TestRequest::post()
        .uri("/auth/login")
        .set_form([("username", "test@example.com"), ("password", "password123")])
        .send_request(&app)
        .await;

    assert_eq!(login_response.status(), 200);
    let login_body: Value = test::read_body_json(login_response).await;
    assert_eq!(login_body["user_id"], register_body["user_id"]);
    let token = login_body["access_token"].as_str().unwrap();

    let me = test::TestRequest::get()
        .uri("/auth/me")
        .insert_header(bearer(token))
        .send_request(&app)
        .await;
    assert_eq!(me.status(), 200);
    let me: Value = test::read_body_json(me).await;
    assert_eq!(me["email"], "test@example.com");
    assert_eq!(me["full_name"], "Test User");
    assert_eq!(me["is_agent"], false);
    assert!(me.get("hashed_password").is_none());
}

#[actix_web::test]
async fn test_duplicate_registration_is_rejected() {
    let app = test::init_service(
        App::new()
            .app_data(test_state(true).await)
            .configure(configure_routes),
    )
    .await;

    register(&app, "dup@example.com", false).await;

    let response = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({ "email": "dup@example.com", "password": "password123" }))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["error"]["status"], 400);
}

#[actix_web::test]
async fn test_invalid_login() {
    let app = test::init_service(
        App::new()
            .app_data(test_state(true).await)
            .configure(configure_routes),
    )
    .await;
    register(&app, "known@example.com", false).await;

    for (email, password) in [
        ("nonexistent@example.com", "wrongpassword"),
        ("known@example.com", "wrongpassword"),
    ] {
        let response = test::TestRequest::post()
            .uri("/auth/login")
            .set_form([("username", email), ("password", password)])
            .send_request(&app)
            .await;

        assert_eq!(response.status(), 401);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}

#[actix_web::test]
async fn test_invalid_registration() {
    let app = test::init_service(
        App::new()
            .app_data(test_state(true).await)
            .configure(configure_routes),
    )
    .await;

    let cases = [
        json!({ "email": "test@example.com", "password": "" }),
        json!({ "email": "test@example.com" }),
        json!({ "email": "not-an-email", "password": "password123" }),
        json!({ "email": "long@example.com", "password": "x".repeat(73) }),
    ];

    for case in cases {
        let response = test::TestRequest::post()
            .uri("/auth/register")
            .set_json(&case)
            .send_request(&app)
            .await;
        assert_eq!(response.status(), 422, "case {}", case);
    }
}

#[actix_web::test]
async fn test_protected_routes_need_a_valid_token() {
    let app = test::init_service(
        App::new()
            .app_data(test_state(true).await)
            .configure(configure_routes),
    )
    .await;

    let missing = test::TestRequest::get().uri("/tickets").send_request(&app).await;
    assert_eq!(missing.status(), 401);
    assert_eq!(
        missing.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );

    let garbage = test::TestRequest::get()
        .uri("/auth/me")
        .insert_header(bearer("not.a.token"))
        .send_request(&app)
        .await;
    assert_eq!(garbage.status(), 401);
}

#[actix_web::test]
async fn test_expired_and_foreign_tokens_are_rejected() {
    let state = test_state(true).await;
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .configure(configure_routes),
    )
    .await;
    let (_, user_id) = register(&app, "exp@example.com", false).await;

    let mut config = state.config.auth.clone();
    let tokens = customer_support_server::TokenService::new(&config).unwrap();
    let expired = tokens
        .issue("exp@example.com", user_id, false, chrono::Duration::hours(-2))
        .unwrap();

    let resp = test::TestRequest::get()
        .uri("/auth/me")
        .insert_header(bearer(&expired))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], "Authentication error: Token expired");

    config.jwt_secret = Some("some-other-secret".into());
    let foreign = customer_support_server::TokenService::new(&config)
        .unwrap()
        .issue("exp@example.com", user_id, false, chrono::Duration::minutes(5))
        .unwrap();
    let resp = test::TestRequest::get()
        .uri("/auth/me")
        .insert_header(bearer(&foreign))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_token_for_a_different_email_is_rejected() {
    let state = test_state(true).await;
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .configure(configure_routes),
    )
    .await;
    let (_, user_id) = register(&app, "real@example.com", false).await;

    let tokens = customer_support_server::TokenService::new(&state.config.auth).unwrap();
    let forged = tokens
        .issue("someone-else@example.com", user_id, true, chrono::Duration::minutes(5))
        .unwrap();

    let resp = test::TestRequest::get()
        .uri("/auth/me")
        .insert_header(bearer(&forged))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_agent_registration_can_be_turned_off() {
    let mut config = customer_support_server::Settings::new_for_test().unwrap();
    config.auth.allow_agent_registration = Some(false);
    let state = customer_support_server::AppState::new(config).await.unwrap();
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let resp = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({ "email": "a@example.com", "password": "secret12", "is_agent": true }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn test_malformed_bodies_get_the_error_payload() {
    let app = test::init_service(
        App::new()
            .app_data(test_state(true).await)
            .configure(configure_routes),
    )
    .await;

    let missing_email = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({ "password": "secret12" }))
        .to_request();
    let broken_json = test::TestRequest::post()
        .uri("/auth/register")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"email\": ")
        .to_request();
    let missing_username = test::TestRequest::post()
        .uri("/auth/login")
        .set_form([("password", "secret12")])
        .to_request();

    for request in [missing_email, broken_json, missing_username] {
        let resp = test::call_service(&app, request).await;
        assert_eq!(resp.status(), 422);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["status"], 422);
        assert!(body["error"]["message"].is_string());
    }
}

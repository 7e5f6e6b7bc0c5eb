mod common;

use actix_web::{test, App};
use common::{bearer, register, test_state};
use customer_support_server::configure_routes;
use serde_json::{json, Value};

#[actix_web::test]
async fn test_list_users_requires_agent() {
    let app = test::init_service(
        App::new()
            .app_data(test_state(true).await)
            .configure(configure_routes),
    )
    .await;
    let (cust, _) = register(&app, "u.cust@example.com", false).await;
    let (agent, _) = register(&app, "u.agent@example.com", true).await;

    let resp = test::TestRequest::get()
        .uri("/users")
        .insert_header(bearer(&cust))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 403);

    let resp = test::TestRequest::get()
        .uri("/users")
        .insert_header(bearer(&agent))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
    let users: Vec<Value> = test::read_body_json(resp).await;
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("hashed_password").is_none()));
}

#[actix_web::test]
async fn test_get_user_rbac() {
    let app = test::init_service(
        App::new()
            .app_data(test_state(true).await)
            .configure(configure_routes),
    )
    .await;
    let (cust, me) = register(&app, "self@example.com", false).await;
    let (_, other) = register(&app, "someone@example.com", false).await;
    let (agent, _) = register(&app, "viewer@example.com", true).await;

    let cases = [(&cust, me, 200), (&cust, other, 403), (&agent, other, 200), (&agent, 424242, 404)];
    for (token, user_id, expected) in cases {
        let resp = test::TestRequest::get()
            .uri(&format!("/users/{}", user_id))
            .insert_header(bearer(token))
            .send_request(&app)
            .await;
        assert_eq!(resp.status(), expected, "user {}", user_id);
    }
}

#[actix_web::test]
async fn test_update_user() {
    let app = test::init_service(
        App::new()
            .app_data(test_state(true).await)
            .configure(configure_routes),
    )
    .await;
    let (cust, me) = register(&app, "upd@example.com", false).await;
    let (_, other) = register(&app, "upd.other@example.com", false).await;
    let (agent, _) = register(&app, "upd.agent@example.com", true).await;

    let resp = test::TestRequest::put()
        .uri(&format!("/users/{}", me))
        .insert_header(bearer(&cust))
        .set_json(json!({ "full_name": "Updated Name" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["full_name"], "Updated Name");

    let resp = test::TestRequest::put()
        .uri(&format!("/users/{}", other))
        .insert_header(bearer(&cust))
        .set_json(json!({ "full_name": "Nope" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 403);

    let resp = test::TestRequest::put()
        .uri(&format!("/users/{}", other))
        .insert_header(bearer(&agent))
        .set_json(json!({ "full_name": "Set by agent" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn test_password_change() {
    let app = test::init_service(
        App::new()
            .app_data(test_state(true).await)
            .configure(configure_routes),
    )
    .await;
    let (token, me) = register(&app, "pw@example.com", false).await;

    let resp = test::TestRequest::put()
        .uri(&format!("/users/{}", me))
        .insert_header(bearer(&token))
        .set_json(json!({ "password": "y".repeat(80) }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 422);

    let resp = test::TestRequest::put()
        .uri(&format!("/users/{}", me))
        .insert_header(bearer(&token))
        .set_json(json!({ "password": "brand-new-pass" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);

    let old = test::TestRequest::post()
        .uri("/auth/login")
        .set_form([("username", "pw@example.com"), ("password", "secret12")])
        .send_request(&app)
        .await;
    assert_eq!(old.status(), 401);

    let new = test::TestRequest::post()
        .uri("/auth/login")
        .set_form([("email", "pw@example.com"), ("password", "brand-new-pass")])
        .send_request(&app)
        .await;
    assert_eq!(new.status(), 200);
}

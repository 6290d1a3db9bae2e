use axum::http::{Method, StatusCode};
use serde_json::json;

use grocery_backend::models::user::UserRole;

mod support;
use support::{assert_error, TestApp};

#[tokio::test]
async fn missing_header_is_rejected() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/users/1", None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error(&body, "Unauthorized Access - No authorization header");
}

#[tokio::test]
async fn invalid_token_is_rejected() {
    let app = TestApp::new();
    let (status, body) = app
        .send(Method::GET, "/users/1", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error(&body, "Unauthorized Access - Invalid or expired token");
}

#[tokio::test]
async fn token_without_bearer_prefix_is_accepted() {
    let app = TestApp::new();
    let user = app
        .users
        .seed("Asha", "a@x.com", "secret1", UserRole::Customer);
    let token = app.token_for(&user);

    let request = axum::http::Request::builder()
        .uri(format!("/users/{}", user.user_id))
        .header("authorization", token)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();
    let (status, body) = support::read_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "a@x.com");
}

#[tokio::test]
async fn exempt_routes_need_no_token() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/users/signin", json!({ "email": "nobody@x.com", "password": "whatever" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_error(&body, "Invalid email");
}

#[tokio::test]
async fn exemption_is_not_a_prefix_match() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/users/signin-logs", None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error(&body, "Unauthorized Access - No authorization header");
}

#[tokio::test]
async fn customer_cannot_reach_admin_routes() {
    let app = TestApp::new();
    let user = app
        .users
        .seed("Asha", "a@x.com", "secret1", UserRole::Customer);
    let token = app.token_for(&user);

    for uri in ["/users/all/users", "/users/customers/all"] {
        let (status, body) = app.send(Method::GET, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_error(&body, "Access denied. Admin privileges required.");
    }

    let (status, body) = app
        .send(
            Method::POST,
            "/api/categories",
            Some(&token),
            Some(json!({ "category_name": "Fruit" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error(&body, "Access denied. Admin privileges required.");
}

#[tokio::test]
async fn admin_lists_users_newest_first() {
    let app = TestApp::new();
    let admin = app
        .users
        .seed("Root", "root@x.com", "secret1", UserRole::Admin);
    app.users
        .seed("Asha", "a@x.com", "secret1", UserRole::Customer);
    app.users
        .seed("Ben", "b@x.com", "secret1", UserRole::Customer);
    let token = app.token_for(&admin);

    let (status, body) = app
        .send(Method::GET, "/users/customers/all", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let emails: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(emails, vec!["b@x.com", "a@x.com"]);

    let (_, body) = app
        .send(Method::GET, "/users/all/users", Some(&token), None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
    assert!(body["data"][0].get("password").is_none());
}

#[tokio::test]
async fn customer_updates_only_own_profile() {
    let app = TestApp::new();
    let asha = app
        .users
        .seed("Asha", "a@x.com", "secret1", UserRole::Customer);
    let ben = app
        .users
        .seed("Ben", "b@x.com", "secret1", UserRole::Customer);
    let token = app.token_for(&asha);
    let payload = json!({ "name": "Asha K", "phone": "5550199" });

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/users/{}", asha.user_id),
            Some(&token),
            Some(payload.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Asha K");

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/users/{}", ben.user_id),
            Some(&token),
            Some(payload),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error(&body, "Access denied. You can only access your own data.");
    assert_eq!(app.users.get("b@x.com").unwrap().name, "Ben");
}

#[tokio::test]
async fn admin_updates_any_profile() {
    let app = TestApp::new();
    let admin = app
        .users
        .seed("Root", "root@x.com", "secret1", UserRole::Admin);
    let ben = app
        .users
        .seed("Ben", "b@x.com", "secret1", UserRole::Customer);
    let token = app.token_for(&admin);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/users/{}", ben.user_id),
            Some(&token),
            Some(json!({ "name": "Benjamin", "phone": "5550142" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Benjamin");
}

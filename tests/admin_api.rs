mod common;

use actix_web::http::{header, Method, StatusCode};
use actix_web::{test, App};
use serde_json::json;

use betboard::{configure, cors};
use common::{send, TestContext};

async fn seeded() -> TestContext {
    let ctx = TestContext::new();
    ctx.state
        .admins
        .ensure_admin("root", "root@example.com", "correct-horse")
        .await
        .unwrap();
    ctx
}

#[actix_web::test]
async fn login_issues_token_usable_for_profile() {
    let ctx = seeded().await;
    let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/login")
        .set_json(json!({ "username": "root@example.com", "password": "correct-horse" }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["admin"]["username"], "root");
    assert!(body["data"]["admin"].get("passwordHash").is_none());

    let token = body["data"]["token"].as_str().unwrap().to_string();
    let req = test::TestRequest::get()
        .uri("/api/v1/admin/profile")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["admin"]["email"], "root@example.com");
}

#[actix_web::test]
async fn bad_credentials_are_unauthorized() {
    let ctx = seeded().await;
    let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(configure)).await;

    for (username, password) in [("root", "wrong"), ("nobody", "correct-horse")] {
        let req = test::TestRequest::post()
            .uri("/api/v1/admin/login")
            .set_json(json!({ "username": username, "password": password }))
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");
    }

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/login")
        .set_json(json!({ "username": "", "password": "x" }))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn profile_requires_bearer_token() {
    let ctx = seeded().await;
    let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(configure)).await;

    let (status, body) = send(
        &app,
        test::TestRequest::get().uri("/api/v1/admin/profile").to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Missing Authorization header");

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/profile")
        .insert_header(("Authorization", "Token abc"))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token format");
}

#[actix_web::test]
async fn health_reports_ok() {
    let ctx = TestContext::new();
    let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(configure)).await;

    let (status, body) = send(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[actix_web::test]
async fn admin_accounts_can_be_managed() {
    let ctx = seeded().await;
    let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/admin")
        .insert_header(ctx.bearer())
        .set_json(json!({
            "username": " second_admin ",
            "email": "Second@Example.com",
            "password": "s3cret!"
        }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Admin created successfully");
    assert_eq!(body["data"]["admin"]["username"], "second_admin");
    assert_eq!(body["data"]["admin"]["email"], "second@example.com");
    assert!(body["data"]["admin"].get("passwordHash").is_none());
    let id = body["data"]["admin"]["id"].as_i64().unwrap();

    let req = test::TestRequest::get()
        .uri("/api/v1/admin")
        .insert_header(ctx.bearer())
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["admins"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/admin/{id}"))
        .insert_header(ctx.bearer())
        .set_json(json!({ "password": "n3w-pass" }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Admin updated successfully");

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/login")
        .set_json(json!({ "username": "second_admin", "password": "n3w-pass" }))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/admin/{id}"))
        .insert_header(ctx.bearer())
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["admin"]["id"], id);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/admin/{id}"))
        .insert_header(ctx.bearer())
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Admin deleted successfully");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/admin/{id}"))
        .insert_header(ctx.bearer())
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn admin_payloads_are_validated() {
    let ctx = seeded().await;
    let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(configure)).await;

    let cases = [
        (
            json!({ "username": "ab", "email": "a@example.com", "password": "secret" }),
            "username",
            "Username must be at least 3 characters",
        ),
        (
            json!({ "username": "bad-name", "email": "a@example.com", "password": "secret" }),
            "username",
            "Username can only contain letters, numbers, and underscores",
        ),
        (
            json!({ "username": "valid", "email": "nope", "password": "secret" }),
            "email",
            "Invalid email format",
        ),
        (
            json!({ "username": "valid", "email": "a@example.com", "password": "12345" }),
            "password",
            "Password must be between 6 and 100 characters",
        ),
    ];

    for (payload, field, message) in cases {
        let req = test::TestRequest::post()
            .uri("/api/v1/admin")
            .insert_header(ctx.bearer())
            .set_json(payload)
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], field);
        assert_eq!(body["message"], message);
    }

    let req = test::TestRequest::put()
        .uri("/api/v1/admin/1")
        .insert_header(ctx.bearer())
        .set_json(json!({}))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "At least one field must be provided");
}

#[actix_web::test]
async fn duplicate_admin_and_self_delete_conflict() {
    let ctx = seeded().await;
    let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/admin")
        .insert_header(ctx.bearer())
        .set_json(json!({ "username": "other", "email": "ROOT@example.com", "password": "secret" }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Admin with this username or email already exists");

    let req = test::TestRequest::delete()
        .uri("/api/v1/admin/1")
        .insert_header(ctx.bearer())
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Cannot delete your own account");
}

#[actix_web::test]
async fn admin_routes_require_auth_and_logout_succeeds() {
    let ctx = seeded().await;
    let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(configure)).await;

    let (status, _) = send(&app, test::TestRequest::get().uri("/api/v1/admin").to_request()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        test::TestRequest::post().uri("/api/v1/admin/logout").to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/logout")
        .insert_header(ctx.bearer())
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logout successful");
}

#[actix_web::test]
async fn unknown_routes_return_json_404() {
    let ctx = TestContext::new();
    let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(configure)).await;

    for uri in ["/nope", "/api/v1/nope"] {
        let (status, body) = send(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Resource not found");
    }
}

#[actix_web::test]
async fn cors_preflight_allows_configured_origin() {
    let ctx = TestContext::new();
    let origins = vec!["http://localhost:5173".to_string()];
    let app = test::init_service(
        App::new()
            .app_data(ctx.state.clone())
            .wrap(cors(&origins))
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::default()
        .method(Method::OPTIONS)
        .uri("/api/v1/bets")
        .insert_header((header::ORIGIN, "http://localhost:5173"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
    assert_eq!(
        res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
}

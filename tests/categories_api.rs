mod common;

use actix_web::http::StatusCode;
use actix_web::{test, App};
use serde_json::json;

use betboard::configure;
use common::{send, TestContext};

#[actix_web::test]
async fn category_titles_are_unique_ignoring_case() {
    let ctx = TestContext::new();
    let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(configure)).await;

    let create = |title: &str| {
        test::TestRequest::post()
            .uri("/api/v1/categories")
            .insert_header(ctx.bearer())
            .set_json(json!({ "title": title }))
            .to_request()
    };

    let (status, body) = send(&app, create("E-Sports")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["category"]["title"], "E-Sports");
    assert_eq!(body["data"]["category"]["betCount"], 0);

    let (status, body) = send(&app, create("e-sports")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Category with this title already exists");
}

#[actix_web::test]
async fn category_titles_are_validated() {
    let ctx = TestContext::new();
    let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(configure)).await;

    let too_long = "a".repeat(51);
    for title in ["x", "Sports & Games", too_long.as_str()] {
        let req = test::TestRequest::post()
            .uri("/api/v1/categories")
            .insert_header(ctx.bearer())
            .set_json(json!({ "title": title }))
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{title}");
        assert_eq!(body["errors"][0]["field"], "title");
    }
}

#[actix_web::test]
async fn category_with_bets_cannot_be_deleted_until_they_are_gone() {
    let ctx = TestContext::new();
    let category_id = ctx.category("Sports").await;
    let bet = ctx.bet(category_id, "Derby", &["Home", "Away"]).await;
    let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(configure)).await;

    let delete_category = || {
        test::TestRequest::delete()
            .uri(&format!("/api/v1/categories/{category_id}"))
            .insert_header(ctx.bearer())
            .to_request()
    };

    let (status, body) = send(&app, delete_category()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Cannot delete category that has bets");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/bets/{}", bet.bet.id))
        .insert_header(ctx.bearer())
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, delete_category()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/categories/{category_id}"))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn listing_reports_bet_counts_and_searches() {
    let ctx = TestContext::new();
    let sports = ctx.category("Sports").await;
    ctx.category("Music").await;
    ctx.bet(sports, "Derby", &["Home", "Away"]).await;
    ctx.bet(sports, "Cup", &["Home", "Away"]).await;
    let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(configure)).await;

    let (status, body) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/categories?search=spo")
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["meta"]["total"], 1);
    assert_eq!(body["data"]["data"][0]["title"], "Sports");
    assert_eq!(body["data"]["data"][0]["betCount"], 2);

    let (_, body) = send(
        &app,
        test::TestRequest::get().uri("/api/v1/categories").to_request(),
    )
    .await;
    assert_eq!(body["data"]["meta"]["total"], 2);
}

#[actix_web::test]
async fn renaming_requires_admin_and_respects_uniqueness() {
    let ctx = TestContext::new();
    let sports = ctx.category("Sports").await;
    ctx.category("Music").await;
    let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(configure)).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/categories/{sports}"))
        .set_json(json!({ "title": "Athletics" }))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/categories/{sports}"))
        .insert_header(ctx.bearer())
        .set_json(json!({ "title": "MUSIC" }))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/categories/{sports}"))
        .insert_header(ctx.bearer())
        .set_json(json!({ "title": "Athletics" }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["category"]["title"], "Athletics");
}

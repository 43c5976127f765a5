use actix_web::{delete, get, patch, post, put, web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthMiddleware;
use crate::models::BetStatus;
use crate::types::bet_types::{BetQuery, CreateBetRequest, ResolveBetRequest, UpdateBetRequest};
use crate::types::positive_id;
use crate::utils::responses;
use crate::AppState;

#[get("/bets")]
pub async fn get_all_bets(
    state: web::Data<AppState>,
    query: web::Query<BetQuery>,
) -> AppResult<HttpResponse> {
    query.validate()?;

    let page = state
        .bets
        .find_all(&query.filter(), query.page_request())
        .await?;
    Ok(responses::ok(page))
}

#[get("/bets/status/{status}")]
pub async fn get_bets_by_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let status: BetStatus = path.parse()?;
    let bets = state.bets.find_by_status(status).await?;
    Ok(responses::ok(json!({ "bets": bets })))
}

#[get("/bets/category/{category_id}")]
pub async fn get_bets_by_category(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let category_id = positive_id(path.into_inner())?;
    let bets = state.bets.find_by_category(category_id).await?;
    Ok(responses::ok(json!({ "bets": bets })))
}

#[get("/bets/{id}")]
pub async fn get_bet_by_id(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = positive_id(path.into_inner())?;
    let bet = state.bets.find_by_id(id).await?;
    Ok(responses::ok(json!({ "bet": bet })))
}

#[post("/bets", wrap = "AuthMiddleware")]
pub async fn create_bet(
    state: web::Data<AppState>,
    req: web::Json<CreateBetRequest>,
) -> AppResult<HttpResponse> {
    req.validate()?;

    let bet = state.bets.create(req.into_inner().into_new_bet()).await?;
    Ok(responses::created(json!({ "bet": bet }), "Bet created successfully"))
}

#[put("/bets/{id}", wrap = "AuthMiddleware")]
pub async fn update_bet(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req: web::Json<UpdateBetRequest>,
) -> AppResult<HttpResponse> {
    let id = positive_id(path.into_inner())?;
    req.validate()?;

    let changes = req.into_inner().into_changes()?;
    let bet = state.bets.update(id, changes).await?;
    Ok(responses::ok_with_message(json!({ "bet": bet }), "Bet updated successfully"))
}

#[delete("/bets/{id}", wrap = "AuthMiddleware")]
pub async fn delete_bet(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = positive_id(path.into_inner())?;
    state.bets.delete(id).await?;
    Ok(responses::message("Bet deleted successfully"))
}

#[patch("/bets/{id}/close", wrap = "AuthMiddleware")]
pub async fn close_bet(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = positive_id(path.into_inner())?;
    let bet = state.lifecycle.close_bet(id).await?;
    Ok(responses::ok_with_message(json!({ "bet": bet }), "Bet closed successfully"))
}

#[patch("/bets/{id}/resolve", wrap = "AuthMiddleware")]
pub async fn resolve_bet(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req: web::Json<ResolveBetRequest>,
) -> AppResult<HttpResponse> {
    let id = positive_id(path.into_inner())?;
    req.validate()?;

    let bet = state.lifecycle.resolve_bet(id, req.winning_odd_id).await?;
    Ok(responses::ok_with_message(json!({ "bet": bet }), "Bet resolved successfully"))
}

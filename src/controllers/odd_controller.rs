use actix_web::{get, web, HttpResponse};
use serde_json::json;

use crate::error::AppResult;
use crate::types::positive_id;
use crate::utils::responses;
use crate::AppState;

#[get("/odds")]
pub async fn get_all_odds(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let odds = state.votes.list_odds().await?;
    Ok(responses::ok(json!({ "odds": odds })))
}

#[get("/odds/{id}")]
pub async fn get_odd_by_id(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = positive_id(path.into_inner())?;
    let odd = state.votes.find_odd(id).await?;
    Ok(responses::ok(json!({ "odd": odd })))
}

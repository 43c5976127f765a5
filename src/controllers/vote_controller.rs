use actix_web::{get, post, web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::error::AppResult;
use crate::types::vote_types::{CreateVoteRequest, VoteQuery};
use crate::utils::responses;
use crate::AppState;

#[post("/votes")]
pub async fn cast_vote(
    state: web::Data<AppState>,
    req: web::Json<CreateVoteRequest>,
) -> AppResult<HttpResponse> {
    req.validate()?;

    let vote = state.votes.cast_vote(req.odd_id).await?;
    Ok(responses::created(json!({ "vote": vote }), "Vote cast successfully"))
}

#[get("/votes")]
pub async fn get_votes(
    state: web::Data<AppState>,
    query: web::Query<VoteQuery>,
) -> AppResult<HttpResponse> {
    query.validate()?;

    let page = state
        .votes
        .list_votes(&query.filter(), query.page_request())
        .await?;
    Ok(responses::ok(page))
}

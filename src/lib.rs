pub mod config;
pub mod controllers;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;
pub mod types;
pub mod utils;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::{header, Method};
use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::controllers::admin_auth_controller::{get_admin_profile, login_admin, logout_admin};
use crate::controllers::admin_controller::{
    create_admin, delete_admin, get_admin_by_id, get_all_admins, update_admin,
};
use crate::controllers::bet_controller::{
    close_bet, create_bet, delete_bet, get_all_bets, get_bet_by_id, get_bets_by_category,
    get_bets_by_status, resolve_bet, update_bet,
};
use crate::controllers::category_controller::{
    create_category, delete_category, get_all_categories, get_category_by_id, update_category,
};
use crate::controllers::odd_controller::{get_all_odds, get_odd_by_id};
use crate::controllers::vote_controller::{cast_vote, get_votes};
use crate::error::{json_error_handler, path_error_handler, query_error_handler};
use crate::services::admin_service::AdminService;
use crate::services::bet_lifecycle::BetLifecycle;
use crate::services::bet_service::BetService;
use crate::services::category_service::CategoryService;
use crate::services::vote_aggregator::VoteAggregator;
use crate::store::Store;
use crate::utils::jwt::JwtKeys;

/// Shared by every handler through `web::Data`.
pub struct AppState {
    pub bets: BetService,
    pub lifecycle: BetLifecycle,
    pub votes: VoteAggregator,
    pub categories: CategoryService,
    pub admins: AdminService,
    pub jwt: JwtKeys,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, jwt: JwtKeys, bcrypt_cost: u32) -> Self {
        Self {
            bets: BetService::new(store.clone()),
            lifecycle: BetLifecycle::new(store.clone()),
            votes: VoteAggregator::new(store.clone()),
            categories: CategoryService::new(store.clone()),
            admins: AdminService::new(store, jwt.clone(), bcrypt_cost),
            jwt,
        }
    }
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": Utc::now()
    }))
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "success": false,
        "message": "Resource not found"
    }))
}

/// CORS policy for the given origins; `*` allows any origin.
pub fn cors(origins: &[String]) -> Cors {
    let cors = if origins.iter().any(|o| o == "*") {
        Cors::default().allow_any_origin()
    } else {
        origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };

    cors.allowed_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ])
    .allowed_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    .supports_credentials()
    .max_age(86400)
}

/// Registers extractor error handlers and every route. `AppState` is added by the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(health)
        .service(
            web::scope("/api/v1")
                .service(get_all_bets)
                .service(get_bets_by_status)
                .service(get_bets_by_category)
                .service(get_bet_by_id)
                .service(create_bet)
                .service(update_bet)
                .service(delete_bet)
                .service(close_bet)
                .service(resolve_bet)
                .service(get_all_categories)
                .service(get_category_by_id)
                .service(create_category)
                .service(update_category)
                .service(delete_category)
                .service(get_all_odds)
                .service(get_odd_by_id)
                .service(cast_vote)
                .service(get_votes)
                .service(login_admin)
                .service(get_admin_profile)
                .service(logout_admin)
                .service(get_all_admins)
                .service(create_admin)
                .service(get_admin_by_id)
                .service(update_admin)
                .service(delete_admin),
        )
        .default_service(web::to(not_found));
}

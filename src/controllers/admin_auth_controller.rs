use actix_web::{get, post, web, HttpResponse};
use log::info;
use serde_json::json;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthMiddleware;
use crate::types::auth_types::LoginAdminInput;
use crate::utils::jwt::AdminClaims;
use crate::utils::responses;
use crate::AppState;

#[post("/admin/login")]
pub async fn login_admin(
    state: web::Data<AppState>,
    req: web::Json<LoginAdminInput>,
) -> AppResult<HttpResponse> {
    req.validate()?;

    let session = state.admins.login(req.into_inner()).await?;
    Ok(responses::ok_with_message(session, "Signed in successfully"))
}

#[get("/admin/profile", wrap = "AuthMiddleware")]
pub async fn get_admin_profile(
    state: web::Data<AppState>,
    claims: web::ReqData<AdminClaims>,
) -> AppResult<HttpResponse> {
    let admin = state.admins.find_by_id(claims.sub).await?;
    Ok(responses::ok(json!({ "admin": admin })))
}

/// Tokens are stateless; the client discards its copy.
#[post("/admin/logout", wrap = "AuthMiddleware")]
pub async fn logout_admin(claims: web::ReqData<AdminClaims>) -> AppResult<HttpResponse> {
    info!("Admin signed out: admin_id={}", claims.sub);
    Ok(responses::message("Logout successful"))
}

use actix_web::{delete, get, post, put, web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthMiddleware;
use crate::types::admin_types::{CreateAdminRequest, UpdateAdminRequest};
use crate::utils::jwt::AdminClaims;
use crate::utils::responses;
use crate::AppState;

#[get("/admin", wrap = "AuthMiddleware")]
pub async fn get_all_admins(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let admins = state.admins.list().await?;
    Ok(responses::ok(json!({ "admins": admins })))
}

#[post("/admin", wrap = "AuthMiddleware")]
pub async fn create_admin(
    state: web::Data<AppState>,
    req: web::Json<CreateAdminRequest>,
) -> AppResult<HttpResponse> {
    req.validate()?;

    let admin = state.admins.create(req.into_inner()).await?;
    Ok(responses::created(json!({ "admin": admin }), "Admin created successfully"))
}

#[get("/admin/{id}", wrap = "AuthMiddleware")]
pub async fn get_admin_by_id(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let admin = state.admins.find_by_id(path.into_inner()).await?;
    Ok(responses::ok(json!({ "admin": admin })))
}

#[put("/admin/{id}", wrap = "AuthMiddleware")]
pub async fn update_admin(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req: web::Json<UpdateAdminRequest>,
) -> AppResult<HttpResponse> {
    req.validate()?;

    let admin = state.admins.update(path.into_inner(), req.into_inner()).await?;
    Ok(responses::ok_with_message(json!({ "admin": admin }), "Admin updated successfully"))
}

#[delete("/admin/{id}", wrap = "AuthMiddleware")]
pub async fn delete_admin(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    claims: web::ReqData<AdminClaims>,
) -> AppResult<HttpResponse> {
    state.admins.delete(path.into_inner(), claims.sub).await?;
    Ok(responses::message("Admin deleted successfully"))
}

use actix_web::{delete, get, post, put, web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthMiddleware;
use crate::types::category_types::{CategoryQuery, CreateCategoryRequest, UpdateCategoryRequest};
use crate::types::positive_id;
use crate::utils::responses;
use crate::AppState;

#[get("/categories")]
pub async fn get_all_categories(
    state: web::Data<AppState>,
    query: web::Query<CategoryQuery>,
) -> AppResult<HttpResponse> {
    query.validate()?;

    let page = state
        .categories
        .find_all(&query.filter(), query.page_request())
        .await?;
    Ok(responses::ok(page))
}

#[get("/categories/{id}")]
pub async fn get_category_by_id(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = positive_id(path.into_inner())?;
    let category = state.categories.find_by_id(id).await?;
    Ok(responses::ok(json!({ "category": category })))
}

#[post("/categories", wrap = "AuthMiddleware")]
pub async fn create_category(
    state: web::Data<AppState>,
    req: web::Json<CreateCategoryRequest>,
) -> AppResult<HttpResponse> {
    req.validate()?;

    let category = state.categories.create(&req.title).await?;
    Ok(responses::created(
        json!({ "category": category }),
        "Category created successfully",
    ))
}

#[put("/categories/{id}", wrap = "AuthMiddleware")]
pub async fn update_category(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req: web::Json<UpdateCategoryRequest>,
) -> AppResult<HttpResponse> {
    let id = positive_id(path.into_inner())?;
    req.validate()?;

    let category = state.categories.update(id, &req.title).await?;
    Ok(responses::ok_with_message(
        json!({ "category": category }),
        "Category updated successfully",
    ))
}

#[delete("/categories/{id}", wrap = "AuthMiddleware")]
pub async fn delete_category(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = positive_id(path.into_inner())?;
    state.categories.delete(id).await?;
    Ok(responses::message("Category deleted successfully"))
}

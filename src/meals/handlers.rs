use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::AppError,
    response::{ApiResponse, Pagination},
    state::AppState,
};

use super::dto::{CreateMealRequest, MealListQuery};
use super::repo::{self, CatalogFilter, Meal};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals).post(create_meal))
        .route("/meals/:id", get(get_meal))
}

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(q): Query<MealListQuery>,
) -> Result<Json<ApiResponse<Vec<Meal>>>, AppError> {
    let page = q.page.max(1);
    let limit = q.limit.clamp(1, 100);
    let filter = CatalogFilter {
        meal_type: q.meal_type,
        dietary_tags: q.tag_list(),
    };

    let meals = repo::list(&state.db, &filter, limit, (page - 1) * limit).await?;
    let total = repo::count(&state.db, &filter).await?;

    Ok(Json(ApiResponse::ok_paginated(
        meals,
        Pagination::new(page, limit, total),
    )))
}

#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Meal>>, AppError> {
    let meal = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Meal not found"))?;
    Ok(Json(ApiResponse::ok(meal)))
}

#[instrument(skip(state, payload))]
pub async fn create_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateMealRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Meal>>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Meal name is required"));
    }
    if payload.servings < 1 {
        return Err(AppError::validation("Servings must be at least 1"));
    }
    if payload.nutrition.calories < 0.0 {
        return Err(AppError::validation("Calories cannot be negative"));
    }

    let meal = repo::create(&state.db, &payload).await?;

    info!(meal_id = %meal.id, created_by = %user_id, meal_type = %meal.meal_type, "meal created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(meal))))
}

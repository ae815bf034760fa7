use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::AppError,
    response::{ApiResponse, Pagination},
    state::AppState,
};

use super::dto::{
    CreateMealPlanRequest, GenerateMealPlanRequest, MarkConsumedRequest, NutritionQuery,
    PlanListQuery,
};
use super::model::MealPlan;
use super::nutrition::PlanNutrition;
use super::service;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/meal-plans", get(list_meal_plans).post(create_meal_plan))
        .route("/meal-plans/generate", post(generate_meal_plan))
        .route("/meal-plans/current", get(get_current_meal_plan))
        .route(
            "/meal-plans/:id",
            get(get_meal_plan).delete(delete_meal_plan),
        )
        .route("/meal-plans/:id/nutrition", get(get_meal_plan_nutrition))
        .route("/meal-plans/:id/consume", put(mark_meal_consumed))
        .route("/meal-plans/:id/stop", put(stop_meal_plan))
}

#[instrument(skip(state))]
pub async fn list_meal_plans(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<PlanListQuery>,
) -> Result<Json<ApiResponse<Vec<MealPlan>>>, AppError> {
    let page = q.page.max(1);
    let limit = q.limit.clamp(1, 50);
    let (plans, total) =
        service::list_meal_plans(&state.db, user_id, limit, (page - 1) * limit).await?;
    Ok(Json(ApiResponse::ok_paginated(
        plans,
        Pagination::new(page, limit, total),
    )))
}

#[instrument(skip(state, payload))]
pub async fn generate_meal_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<GenerateMealPlanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MealPlan>>), AppError> {
    // ThreadRng is !Send and would pin the handler future to one thread
    let mut rng = StdRng::from_entropy();
    let plan = service::generate_meal_plan(&state.db, user_id, payload, &mut rng).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(plan))))
}

#[instrument(skip(state, payload))]
pub async fn create_meal_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateMealPlanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MealPlan>>), AppError> {
    let plan = service::create_meal_plan(&state.db, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(plan))))
}

#[instrument(skip(state))]
pub async fn get_current_meal_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ApiResponse<MealPlan>>, AppError> {
    let plan = service::get_current_meal_plan(&state.db, user_id).await?;
    Ok(Json(ApiResponse::ok(plan)))
}

#[instrument(skip(state))]
pub async fn get_meal_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MealPlan>>, AppError> {
    let plan = service::get_meal_plan(&state.db, id, user_id).await?;
    Ok(Json(ApiResponse::ok(plan)))
}

#[instrument(skip(state))]
pub async fn get_meal_plan_nutrition(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Query(q): Query<NutritionQuery>,
) -> Result<Json<ApiResponse<PlanNutrition>>, AppError> {
    let nutrition = service::get_meal_plan_nutrition(&state.db, id, user_id, q.consumed).await?;
    Ok(Json(ApiResponse::ok(nutrition)))
}

#[instrument(skip(state, payload))]
pub async fn mark_meal_consumed(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MarkConsumedRequest>,
) -> Result<Json<ApiResponse<MealPlan>>, AppError> {
    let plan = service::mark_meal_consumed(&state.db, id, user_id, payload).await?;
    Ok(Json(ApiResponse::ok(plan)))
}

#[instrument(skip(state))]
pub async fn stop_meal_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MealPlan>>, AppError> {
    let plan = service::stop_meal_plan(&state.db, id, user_id).await?;
    Ok(Json(ApiResponse::ok(plan)))
}

#[instrument(skip(state))]
pub async fn delete_meal_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    service::delete_meal_plan(&state.db, id, user_id).await?;
    Ok(Json(ApiResponse::ok_with_message((), "Meal plan deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    // The router only accepts handlers whose futures are Send; a thread-local
    // RNG held across an await point would break that.
    #[tokio::test]
    async fn generate_handler_future_is_send() {
        fn assert_send<F: Send>(_: F) {}

        let payload = GenerateMealPlanRequest {
            name: None,
            start_date: date!(2024 - 01 - 01),
            duration: 7,
        };
        assert_send(generate_meal_plan(
            State(AppState::fake()),
            AuthUser(Uuid::new_v4()),
            Json(payload),
        ));
    }
}

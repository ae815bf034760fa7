use sqlx::{types::Json, PgPool};
use time::Date;
use uuid::Uuid;

use crate::error::AppError;

use super::model::{MealPlan, PlanDay, PlanStatus, TargetNutrition};

const PLAN_COLUMNS: &str = "id, user_id, name, start_date, duration, status, \
     target_nutrition, days, created_at, updated_at";

pub async fn find_active(db: &PgPool, user_id: Uuid) -> Result<Option<MealPlan>, sqlx::Error> {
    sqlx::query_as::<_, MealPlan>(&format!(
        "SELECT {PLAN_COLUMNS} FROM meal_plans WHERE user_id = $1 AND status = 'active'"
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<MealPlan>, sqlx::Error> {
    sqlx::query_as::<_, MealPlan>(&format!(
        "SELECT {PLAN_COLUMNS} FROM meal_plans WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn find_by_id_and_user(
    db: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<MealPlan>, sqlx::Error> {
    sqlx::query_as::<_, MealPlan>(&format!(
        "SELECT {PLAN_COLUMNS} FROM meal_plans WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

/// Inserts a new active plan. The partial unique index
/// `meal_plans_one_active_per_user` turns a second concurrent active plan
/// into a unique violation, which surfaces as `Conflict` here — the
/// one-active-plan invariant holds even when two generations race.
pub async fn create(
    db: &PgPool,
    user_id: Uuid,
    name: Option<&str>,
    start_date: Date,
    duration: i32,
    target: &TargetNutrition,
    days: &[PlanDay],
) -> Result<MealPlan, AppError> {
    sqlx::query_as::<_, MealPlan>(&format!(
        r#"
        INSERT INTO meal_plans (user_id, name, start_date, duration, status, target_nutrition, days)
        VALUES ($1, $2, $3, $4, 'active', $5, $6)
        RETURNING {PLAN_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(name)
    .bind(start_date)
    .bind(duration)
    .bind(Json(target))
    .bind(Json(days))
    .fetch_one(db)
    .await
    .map_err(|e| {
        if e.as_database_error()
            .map(|d| d.is_unique_violation())
            .unwrap_or(false)
        {
            AppError::conflict("An active meal plan already exists")
        } else {
            AppError::Storage(e)
        }
    })
}

pub async fn update_days(
    db: &PgPool,
    id: Uuid,
    days: &[PlanDay],
) -> Result<MealPlan, sqlx::Error> {
    sqlx::query_as::<_, MealPlan>(&format!(
        r#"
        UPDATE meal_plans SET days = $2, updated_at = now()
        WHERE id = $1
        RETURNING {PLAN_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(Json(days))
    .fetch_one(db)
    .await
}

pub async fn update_status(
    db: &PgPool,
    id: Uuid,
    status: PlanStatus,
) -> Result<MealPlan, sqlx::Error> {
    sqlx::query_as::<_, MealPlan>(&format!(
        r#"
        UPDATE meal_plans SET status = $2, updated_at = now()
        WHERE id = $1
        RETURNING {PLAN_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status)
    .fetch_one(db)
    .await
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM meal_plans WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<MealPlan>, sqlx::Error> {
    sqlx::query_as::<_, MealPlan>(&format!(
        r#"
        SELECT {PLAN_COLUMNS} FROM meal_plans
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

pub async fn count_by_user(db: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM meal_plans WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await
}

//! Plan assembly orchestration and state mutations. Everything here is
//! request-scoped: load, validate, mutate, persist.

use std::collections::HashMap;

use rand::Rng;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::repo::User;
use crate::error::AppError;
use crate::meals::{repo as meals_repo, Meal, MealType};

use super::dto::{CreateMealPlanRequest, GenerateMealPlanRequest, MarkConsumedRequest, SlotRef};
use super::generator::{build_days, CandidatePools};
use super::model::{DayMeals, MealPlan, MealSlot, PlanDay, PlanStatus};
use super::nutrition::{calculate_target_nutrition, plan_nutrition_summary, PlanNutrition};
use super::repo;

const MIN_DURATION: i64 = 1;
const MAX_DURATION: i64 = 30;

fn validate_duration(duration: i64) -> Result<i32, AppError> {
    if !(MIN_DURATION..=MAX_DURATION).contains(&duration) {
        return Err(AppError::validation(format!(
            "Duration must be between {MIN_DURATION} and {MAX_DURATION} days"
        )));
    }
    Ok(duration as i32)
}

async fn load_user(db: &PgPool, user_id: Uuid) -> Result<User, AppError> {
    User::find_by_id(db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

/// Generates a complete plan for the user: target from the profile, one
/// catalog query per meal type, then pure assembly with the given RNG.
pub async fn generate_meal_plan<R: Rng + ?Sized>(
    db: &PgPool,
    user_id: Uuid,
    req: GenerateMealPlanRequest,
    rng: &mut R,
) -> Result<MealPlan, AppError> {
    let user = load_user(db, user_id).await?;
    let duration = validate_duration(req.duration)?;
    let target = calculate_target_nutrition(&user)?;

    // Friendly fast path; the partial unique index closes the race window
    // on insert regardless.
    if repo::find_active(db, user_id).await?.is_some() {
        return Err(AppError::conflict("An active meal plan already exists"));
    }

    let pools = CandidatePools {
        breakfast: meals_repo::find_by_type(db, MealType::Breakfast).await?,
        lunch: meals_repo::find_by_type(db, MealType::Lunch).await?,
        dinner: meals_repo::find_by_type(db, MealType::Dinner).await?,
        snacks: meals_repo::find_by_type(db, MealType::Snack).await?,
    };

    let days = build_days(req.start_date, duration as i64, &target, &pools, rng)?;

    let plan = repo::create(
        db,
        user_id,
        req.name.as_deref(),
        req.start_date,
        duration,
        &target,
        &days,
    )
    .await?;

    info!(plan_id = %plan.id, user_id = %user_id, duration, "meal plan generated");
    Ok(plan)
}

/// Manual creation from an explicit day layout of catalog meal ids.
pub async fn create_meal_plan(
    db: &PgPool,
    user_id: Uuid,
    req: CreateMealPlanRequest,
) -> Result<MealPlan, AppError> {
    let user = load_user(db, user_id).await?;
    let duration = validate_duration(req.duration)?;
    if req.days.len() as i64 != req.duration {
        return Err(AppError::validation("Days must match the plan duration"));
    }

    let target = match req.target_nutrition {
        Some(t) => t,
        None => calculate_target_nutrition(&user)?,
    };

    let mut ids: Vec<Uuid> = Vec::new();
    for day in &req.days {
        ids.extend(day.meals.breakfast.iter().map(|s| s.meal));
        ids.extend(day.meals.lunch.iter().map(|s| s.meal));
        ids.extend(day.meals.dinner.iter().map(|s| s.meal));
        ids.extend(day.meals.snacks.iter().map(|s| s.meal));
    }
    ids.sort_unstable();
    ids.dedup();

    let resolved: HashMap<Uuid, Meal> = meals_repo::find_by_ids(db, &ids)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();
    if resolved.len() != ids.len() {
        return Err(AppError::not_found("One or more meals were not found"));
    }

    let to_slot = |r: &SlotRef| -> MealSlot {
        MealSlot::new(resolved[&r.meal].clone(), r.servings)
    };
    let days: Vec<PlanDay> = req
        .days
        .iter()
        .enumerate()
        .map(|(i, day)| PlanDay {
            date: req.start_date + time::Duration::days(i as i64),
            meals: DayMeals {
                breakfast: day.meals.breakfast.as_ref().map(to_slot),
                lunch: day.meals.lunch.as_ref().map(to_slot),
                dinner: day.meals.dinner.as_ref().map(to_slot),
                snacks: day.meals.snacks.iter().map(to_slot).collect(),
            },
        })
        .collect();

    let plan = repo::create(
        db,
        user_id,
        req.name.as_deref(),
        req.start_date,
        duration,
        &target,
        &days,
    )
    .await?;

    info!(plan_id = %plan.id, user_id = %user_id, "meal plan created");
    Ok(plan)
}

pub async fn get_current_meal_plan(db: &PgPool, user_id: Uuid) -> Result<MealPlan, AppError> {
    repo::find_active(db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("No active meal plan found"))
}

pub async fn get_meal_plan(db: &PgPool, id: Uuid, user_id: Uuid) -> Result<MealPlan, AppError> {
    repo::find_by_id_and_user(db, id, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Meal plan not found"))
}

pub async fn list_meal_plans(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<(Vec<MealPlan>, i64), AppError> {
    let plans = repo::list_by_user(db, user_id, limit, offset).await?;
    let total = repo::count_by_user(db, user_id).await?;
    Ok((plans, total))
}

/// Loads the plan by id so a foreign caller gets `Forbidden`, not a 404.
async fn load_owned(db: &PgPool, id: Uuid, user_id: Uuid) -> Result<MealPlan, AppError> {
    let plan = repo::find_by_id(db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Meal plan not found"))?;
    plan.ensure_owned_by(user_id)?;
    Ok(plan)
}

pub async fn stop_meal_plan(db: &PgPool, id: Uuid, user_id: Uuid) -> Result<MealPlan, AppError> {
    let mut plan = load_owned(db, id, user_id).await?;
    plan.stop()?;
    let plan = repo::update_status(db, id, PlanStatus::Stopped).await?;
    info!(plan_id = %id, user_id = %user_id, "meal plan stopped");
    Ok(plan)
}

pub async fn delete_meal_plan(db: &PgPool, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    let plan = load_owned(db, id, user_id).await?;
    repo::delete(db, plan.id).await?;
    info!(plan_id = %id, user_id = %user_id, "meal plan deleted");
    Ok(())
}

pub async fn mark_meal_consumed(
    db: &PgPool,
    id: Uuid,
    user_id: Uuid,
    req: MarkConsumedRequest,
) -> Result<MealPlan, AppError> {
    let mut plan = get_meal_plan(db, id, user_id).await?;
    plan.set_consumed(req.day_index, req.meal_type, req.snack_index, req.consumed)?;
    let plan = repo::update_days(db, id, &plan.days).await?;
    info!(
        plan_id = %id,
        day_index = req.day_index,
        meal_type = %req.meal_type,
        consumed = req.consumed,
        "meal consumption updated"
    );
    Ok(plan)
}

pub async fn get_meal_plan_nutrition(
    db: &PgPool,
    id: Uuid,
    user_id: Uuid,
    consumed_only: bool,
) -> Result<PlanNutrition, AppError> {
    let plan = get_meal_plan(db, id, user_id).await?;
    Ok(plan_nutrition_summary(&plan, consumed_only))
}

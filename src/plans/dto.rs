use serde::Deserialize;
use time::Date;
use uuid::Uuid;

use crate::meals::MealType;

use super::model::{plan_date, TargetNutrition};

#[derive(Debug, Deserialize)]
pub struct GenerateMealPlanRequest {
    pub name: Option<String>,
    #[serde(with = "plan_date")]
    pub start_date: Date,
    pub duration: i64,
}

/// Manual plan creation: explicit day layout referencing catalog meal ids.
#[derive(Debug, Deserialize)]
pub struct CreateMealPlanRequest {
    pub name: Option<String>,
    #[serde(with = "plan_date")]
    pub start_date: Date,
    pub duration: i64,
    /// Optional explicit target; derived from the profile when absent.
    pub target_nutrition: Option<TargetNutrition>,
    pub days: Vec<ManualDay>,
}

#[derive(Debug, Deserialize)]
pub struct ManualDay {
    pub meals: ManualDayMeals,
}

#[derive(Debug, Default, Deserialize)]
pub struct ManualDayMeals {
    pub breakfast: Option<SlotRef>,
    pub lunch: Option<SlotRef>,
    pub dinner: Option<SlotRef>,
    #[serde(default)]
    pub snacks: Vec<SlotRef>,
}

#[derive(Debug, Deserialize)]
pub struct SlotRef {
    pub meal: Uuid,
    #[serde(default = "default_servings")]
    pub servings: f64,
}

fn default_servings() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
pub struct MarkConsumedRequest {
    pub day_index: i64,
    pub meal_type: MealType,
    pub snack_index: Option<i64>,
    #[serde(default = "default_true")]
    pub consumed: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct PlanListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}
fn default_limit() -> i64 {
    10
}

#[derive(Debug, Default, Deserialize)]
pub struct NutritionQuery {
    /// `?consumed=true` switches to the consumed-only summary.
    #[serde(default)]
    pub consumed: bool,
}

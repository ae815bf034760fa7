use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::AppError;
use crate::meals::{Meal, MealType};

time::serde::format_description!(pub(crate) plan_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PlanStatus {
    Active,
    Completed,
    Stopped,
}

/// Daily macro goal, snapshotted into the plan at generation time. Profile
/// edits after generation never change an existing plan's target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetNutrition {
    pub daily_calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fats: f64,
}

/// One meal assignment within a day. The meal is embedded as a snapshot so
/// plan reads and nutrition summaries need no catalog lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealSlot {
    pub meal: Meal,
    #[serde(default = "default_servings")]
    pub servings: f64,
    #[serde(default)]
    pub consumed: bool,
}

fn default_servings() -> f64 {
    1.0
}

impl MealSlot {
    pub fn new(meal: Meal, servings: f64) -> Self {
        Self {
            meal,
            servings,
            consumed: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DayMeals {
    pub breakfast: Option<MealSlot>,
    pub lunch: Option<MealSlot>,
    pub dinner: Option<MealSlot>,
    #[serde(default)]
    pub snacks: Vec<MealSlot>,
}

impl DayMeals {
    /// All non-empty slots in display order.
    pub fn slots(&self) -> impl Iterator<Item = &MealSlot> {
        self.breakfast
            .iter()
            .chain(self.lunch.iter())
            .chain(self.dinner.iter())
            .chain(self.snacks.iter())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDay {
    #[serde(with = "plan_date")]
    pub date: Date,
    pub meals: DayMeals,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MealPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: Option<String>,
    #[serde(with = "plan_date")]
    pub start_date: Date,
    pub duration: i32,
    pub status: PlanStatus,
    pub target_nutrition: Json<TargetNutrition>,
    pub days: Json<Vec<PlanDay>>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl MealPlan {
    pub fn ensure_owned_by(&self, user_id: Uuid) -> Result<(), AppError> {
        if self.user_id != user_id {
            return Err(AppError::forbidden("You do not own this meal plan"));
        }
        Ok(())
    }

    /// Stop transition. A plan that is not active cannot be stopped again;
    /// callers that double-stop get a Conflict instead of a silent no-op.
    pub fn stop(&mut self) -> Result<(), AppError> {
        if self.status != PlanStatus::Active {
            return Err(AppError::conflict("Meal plan is not active"));
        }
        self.status = PlanStatus::Stopped;
        Ok(())
    }

    /// Flips the consumed flag on one slot. Validates the day index, the
    /// slot kind and (for snacks) the snack index before touching anything.
    pub fn set_consumed(
        &mut self,
        day_index: i64,
        meal_type: MealType,
        snack_index: Option<i64>,
        consumed: bool,
    ) -> Result<(), AppError> {
        if day_index < 0 || day_index as usize >= self.days.len() {
            return Err(AppError::validation("Invalid day index"));
        }
        let day = &mut self.days.0[day_index as usize];

        let slot = match meal_type {
            MealType::Breakfast => day.meals.breakfast.as_mut(),
            MealType::Lunch => day.meals.lunch.as_mut(),
            MealType::Dinner => day.meals.dinner.as_mut(),
            MealType::Snack => {
                let idx = snack_index
                    .ok_or_else(|| AppError::validation("Snack index is required for snacks"))?;
                if idx < 0 || idx as usize >= day.meals.snacks.len() {
                    return Err(AppError::validation("Invalid snack index"));
                }
                Some(&mut day.meals.snacks[idx as usize])
            }
        };

        let slot = slot.ok_or_else(|| AppError::not_found("No meal assigned to this slot"))?;
        slot.consumed = consumed;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use time::macros::date;

    fn three_day_plan() -> MealPlan {
        let days = (0..3)
            .map(|i| {
                single_slot_day(
                    date!(2024 - 01 - 01) + time::Duration::days(i),
                    500.0,
                    1.0,
                )
            })
            .collect();
        plan_with_days(days)
    }

    #[test]
    fn set_consumed_rejects_day_index_out_of_range() {
        let mut plan = three_day_plan();
        let before = serde_json::to_string(&plan.days.0).unwrap();

        let err = plan
            .set_consumed(3, MealType::Breakfast, None, true)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid day index");

        let err = plan
            .set_consumed(-1, MealType::Breakfast, None, true)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid day index");

        // plan must be untouched after a rejected mutation
        assert_eq!(serde_json::to_string(&plan.days.0).unwrap(), before);
    }

    #[test]
    fn set_consumed_marks_breakfast() {
        let mut plan = three_day_plan();
        plan.set_consumed(1, MealType::Breakfast, None, true).unwrap();
        assert!(plan.days.0[1].meals.breakfast.as_ref().unwrap().consumed);
        assert!(!plan.days.0[0].meals.breakfast.as_ref().unwrap().consumed);

        plan.set_consumed(1, MealType::Breakfast, None, false).unwrap();
        assert!(!plan.days.0[1].meals.breakfast.as_ref().unwrap().consumed);
    }

    #[test]
    fn set_consumed_requires_snack_index_for_snacks() {
        let mut plan = three_day_plan();
        plan.days.0[0]
            .meals
            .snacks
            .push(MealSlot::new(meal("apple", MealType::Snack, 80.0), 1.0));

        let err = plan.set_consumed(0, MealType::Snack, None, true).unwrap_err();
        assert_eq!(err.to_string(), "Snack index is required for snacks");

        let err = plan
            .set_consumed(0, MealType::Snack, Some(1), true)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid snack index");

        plan.set_consumed(0, MealType::Snack, Some(0), true).unwrap();
        assert!(plan.days.0[0].meals.snacks[0].consumed);
    }

    #[test]
    fn set_consumed_on_empty_slot_is_not_found() {
        let mut plan = three_day_plan();
        let err = plan.set_consumed(0, MealType::Lunch, None, true).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn ownership_check_rejects_foreign_user() {
        let plan = three_day_plan();
        plan.ensure_owned_by(plan.user_id).unwrap();

        let err = plan.ensure_owned_by(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn stop_rejects_second_stop() {
        let mut plan = three_day_plan();
        plan.stop().unwrap();
        assert_eq!(plan.status, PlanStatus::Stopped);

        let err = plan.stop().unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn plan_day_serializes_iso_date() {
        let day = single_slot_day(date!(2024 - 01 - 01), 500.0, 1.0);
        let json = serde_json::to_string(&day).unwrap();
        assert!(json.contains("\"date\":\"2024-01-01\""));
    }
}

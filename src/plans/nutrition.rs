//! Pure nutrition math: target derivation from the user profile, totals
//! over plan slots, averages across days. No I/O.

use serde::Serialize;
use time::Date;

use crate::auth::repo::{Gender, User};
use crate::error::AppError;
use crate::meals::Nutrition;

use super::model::{plan_date, MealPlan, MealSlot, TargetNutrition};

// Fixed macro split: 30% protein / 45% carbohydrates / 25% fat.
const PROTEIN_SHARE: f64 = 0.30;
const CARB_SHARE: f64 = 0.45;
const FAT_SHARE: f64 = 0.25;

const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_CARB: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;

/// Hard floor on the daily target; aggressive deficits below this are not
/// something the planner will produce.
const MIN_DAILY_CALORIES: f64 = 1200.0;

/// Derives the daily calorie/macro target from the profile.
///
/// Mifflin-St Jeor BMR, scaled by the activity factor, shifted by the goal
/// adjustment. Fails with `Validation` naming every missing profile field.
pub fn calculate_target_nutrition(user: &User) -> Result<TargetNutrition, AppError> {
    let mut missing = Vec::new();
    if user.weight_kg.is_none() {
        missing.push("weight_kg");
    }
    if user.height_cm.is_none() {
        missing.push("height_cm");
    }
    if user.age.is_none() {
        missing.push("age");
    }
    if user.gender.is_none() {
        missing.push("gender");
    }
    if user.activity_level.is_none() {
        missing.push("activity_level");
    }
    if user.goal.is_none() {
        missing.push("goal");
    }
    let (weight, height, age, gender, activity, goal) = match (
        user.weight_kg,
        user.height_cm,
        user.age,
        user.gender,
        user.activity_level,
        user.goal,
    ) {
        (Some(w), Some(h), Some(a), Some(g), Some(act), Some(goal)) => (w, h, a, g, act, goal),
        _ => {
            return Err(AppError::validation(format!(
                "Profile is missing required fields: {}",
                missing.join(", ")
            )))
        }
    };

    let gender_offset = match gender {
        Gender::Male => 5.0,
        Gender::Female => -161.0,
    };

    let bmr = 10.0 * weight + 6.25 * height - 5.0 * age as f64 + gender_offset;
    let maintenance = bmr * activity.factor();
    let daily_calories = (maintenance + goal.calorie_adjustment()).max(MIN_DAILY_CALORIES);

    Ok(TargetNutrition {
        daily_calories: daily_calories.round(),
        protein: (daily_calories * PROTEIN_SHARE / KCAL_PER_G_PROTEIN).round(),
        carbohydrates: (daily_calories * CARB_SHARE / KCAL_PER_G_CARB).round(),
        fats: (daily_calories * FAT_SHARE / KCAL_PER_G_FAT).round(),
    })
}

/// Sums `nutrition * servings` over the given slots. Missing optional
/// nutrition fields are already zero at deserialization time.
pub fn calculate_total_nutrition<'a>(slots: impl Iterator<Item = &'a MealSlot>) -> Nutrition {
    let mut total = Nutrition::default();
    for slot in slots {
        let n = &slot.meal.nutrition;
        total.calories += n.calories * slot.servings;
        total.protein += n.protein * slot.servings;
        total.carbohydrates += n.carbohydrates * slot.servings;
        total.fats += n.fats * slot.servings;
        total.fiber += n.fiber * slot.servings;
        total.sugar += n.sugar * slot.servings;
        total.sodium += n.sodium * slot.servings;
    }
    total
}

/// Arithmetic mean across days; all-zero on empty input.
pub fn calculate_average_nutrition(daily: &[Nutrition]) -> Nutrition {
    if daily.is_empty() {
        return Nutrition::default();
    }
    let n = daily.len() as f64;
    let mut avg = Nutrition::default();
    for d in daily {
        avg.calories += d.calories;
        avg.protein += d.protein;
        avg.carbohydrates += d.carbohydrates;
        avg.fats += d.fats;
        avg.fiber += d.fiber;
        avg.sugar += d.sugar;
        avg.sodium += d.sodium;
    }
    avg.calories /= n;
    avg.protein /= n;
    avg.carbohydrates /= n;
    avg.fats /= n;
    avg.fiber /= n;
    avg.sugar /= n;
    avg.sodium /= n;
    avg
}

#[derive(Debug, Serialize)]
pub struct DayNutrition {
    #[serde(with = "plan_date")]
    pub date: Date,
    pub nutrition: Nutrition,
}

#[derive(Debug, Serialize)]
pub struct PlanNutrition {
    pub daily_nutrition: Vec<DayNutrition>,
    pub averages: Nutrition,
    pub target: TargetNutrition,
}

/// Per-day totals plus averages, paired with the stored target snapshot.
///
/// The default summary counts every planned slot regardless of its consumed
/// flag; `consumed_only` is the explicit alternative for "what was actually
/// eaten".
pub fn plan_nutrition_summary(plan: &MealPlan, consumed_only: bool) -> PlanNutrition {
    let daily_nutrition: Vec<DayNutrition> = plan
        .days
        .iter()
        .map(|day| DayNutrition {
            date: day.date,
            nutrition: calculate_total_nutrition(
                day.meals.slots().filter(|s| !consumed_only || s.consumed),
            ),
        })
        .collect();

    let totals: Vec<Nutrition> = daily_nutrition.iter().map(|d| d.nutrition.clone()).collect();

    PlanNutrition {
        daily_nutrition,
        averages: calculate_average_nutrition(&totals),
        target: plan.target_nutrition.0.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::{ActivityLevel, Goal};
    use crate::meals::MealType;
    use crate::plans::model::test_support::{meal, plan_with_days, single_slot_day};
    use crate::plans::model::{DayMeals, MealSlot, PlanDay};
    use time::macros::date;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn full_profile() -> User {
        User {
            id: Uuid::new_v4(),
            email: "u@example.com".into(),
            password_hash: String::new(),
            weight_kg: Some(80.0),
            height_cm: Some(180.0),
            age: Some(30),
            gender: Some(Gender::Male),
            activity_level: Some(ActivityLevel::Moderate),
            goal: Some(Goal::Maintain),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn target_macros_add_up_to_daily_calories() {
        for (weight, activity, goal) in [
            (60.0, ActivityLevel::Sedentary, Goal::Lose),
            (80.0, ActivityLevel::Moderate, Goal::Maintain),
            (110.0, ActivityLevel::VeryActive, Goal::Gain),
        ] {
            let mut user = full_profile();
            user.weight_kg = Some(weight);
            user.activity_level = Some(activity);
            user.goal = Some(goal);

            let t = calculate_target_nutrition(&user).unwrap();
            let from_macros = t.protein * 4.0 + t.carbohydrates * 4.0 + t.fats * 9.0;
            // grams are rounded to whole numbers, so allow a few kcal of drift
            assert!(
                (from_macros - t.daily_calories).abs() < 10.0,
                "macros {from_macros} vs calories {}",
                t.daily_calories
            );
        }
    }

    #[test]
    fn target_respects_goal_direction() {
        let mut lose = full_profile();
        lose.goal = Some(Goal::Lose);
        let mut gain = full_profile();
        gain.goal = Some(Goal::Gain);

        let lose_t = calculate_target_nutrition(&lose).unwrap();
        let maintain_t = calculate_target_nutrition(&full_profile()).unwrap();
        let gain_t = calculate_target_nutrition(&gain).unwrap();

        assert!(lose_t.daily_calories < maintain_t.daily_calories);
        assert!(gain_t.daily_calories > maintain_t.daily_calories);
        assert_eq!(maintain_t.daily_calories - lose_t.daily_calories, 500.0);
    }

    #[test]
    fn target_floors_at_minimum() {
        let mut user = full_profile();
        user.weight_kg = Some(40.0);
        user.height_cm = Some(140.0);
        user.age = Some(80);
        user.gender = Some(Gender::Female);
        user.activity_level = Some(ActivityLevel::Sedentary);
        user.goal = Some(Goal::Lose);

        let t = calculate_target_nutrition(&user).unwrap();
        assert_eq!(t.daily_calories, 1200.0);
    }

    #[test]
    fn target_rejects_incomplete_profile_naming_fields() {
        let mut user = full_profile();
        user.weight_kg = None;
        user.goal = None;

        let err = calculate_target_nutrition(&user).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(msg.contains("weight_kg"));
        assert!(msg.contains("goal"));
        assert!(!msg.contains("height_cm"));
    }

    #[test]
    fn average_of_empty_input_is_all_zero() {
        let avg = calculate_average_nutrition(&[]);
        assert_eq!(avg, Nutrition::default());
    }

    #[test]
    fn total_is_linear_in_servings() {
        let day = PlanDay {
            date: date!(2024 - 01 - 01),
            meals: DayMeals {
                breakfast: Some(MealSlot::new(meal("b", MealType::Breakfast, 400.0), 1.0)),
                lunch: Some(MealSlot::new(meal("l", MealType::Lunch, 700.0), 2.0)),
                dinner: Some(MealSlot::new(meal("d", MealType::Dinner, 600.0), 1.5)),
                snacks: vec![MealSlot::new(meal("s", MealType::Snack, 150.0), 1.0)],
            },
        };

        let single = calculate_total_nutrition(day.meals.slots());

        let mut doubled_day = day.clone();
        for slot in [
            doubled_day.meals.breakfast.as_mut().unwrap(),
            doubled_day.meals.lunch.as_mut().unwrap(),
            doubled_day.meals.dinner.as_mut().unwrap(),
        ] {
            slot.servings *= 2.0;
        }
        doubled_day.meals.snacks[0].servings *= 2.0;
        let double = calculate_total_nutrition(doubled_day.meals.slots());

        assert!((double.calories - 2.0 * single.calories).abs() < 1e-9);
        assert!((double.protein - 2.0 * single.protein).abs() < 1e-9);
        assert!((double.carbohydrates - 2.0 * single.carbohydrates).abs() < 1e-9);
        assert!((double.fats - 2.0 * single.fats).abs() < 1e-9);
    }

    #[test]
    fn summary_of_single_500_kcal_slot() {
        let plan = plan_with_days(vec![single_slot_day(date!(2024 - 01 - 01), 500.0, 1.0)]);

        let summary = plan_nutrition_summary(&plan, false);
        assert_eq!(summary.daily_nutrition.len(), 1);
        assert_eq!(summary.daily_nutrition[0].nutrition.calories, 500.0);
        assert_eq!(summary.averages.calories, 500.0);
        assert_eq!(summary.target.daily_calories, 2000.0);
    }

    #[test]
    fn summary_counts_planned_slots_unless_consumed_only() {
        let mut plan = plan_with_days(vec![single_slot_day(date!(2024 - 01 - 01), 500.0, 1.0)]);

        // nothing consumed yet: planned view sees 500, consumed view sees 0
        let planned = plan_nutrition_summary(&plan, false);
        assert_eq!(planned.daily_nutrition[0].nutrition.calories, 500.0);

        let eaten = plan_nutrition_summary(&plan, true);
        assert_eq!(eaten.daily_nutrition[0].nutrition.calories, 0.0);

        plan.set_consumed(0, MealType::Breakfast, None, true).unwrap();
        let eaten = plan_nutrition_summary(&plan, true);
        assert_eq!(eaten.daily_nutrition[0].nutrition.calories, 500.0);
    }
}

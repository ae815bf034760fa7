//! Pure plan assembly: turns per-type candidate pools into a day-by-day
//! plan. Storage and profile lookups stay in the service layer, so the
//! whole generation path is testable with a seeded RNG.

use std::collections::HashSet;

use rand::Rng;
use time::{Date, Duration};
use uuid::Uuid;

use crate::error::AppError;
use crate::meals::{Meal, MealType};

use super::model::{DayMeals, MealSlot, PlanDay, TargetNutrition};
use super::selection::{select_meals, select_random_meals, MealFilter};

// Proportional split of the daily calorie target across slots.
const BREAKFAST_SHARE: f64 = 0.25;
const LUNCH_SHARE: f64 = 0.35;
const DINNER_SHARE: f64 = 0.30;

/// Width of the calorie band around each slot's sub-target (±25%).
const CALORIE_BAND: f64 = 0.25;

const MAX_SNACKS_PER_DAY: usize = 2;

/// Candidate pools fetched once per generation, one catalog query per type.
#[derive(Debug, Default)]
pub struct CandidatePools {
    pub breakfast: Vec<Meal>,
    pub lunch: Vec<Meal>,
    pub dinner: Vec<Meal>,
    pub snacks: Vec<Meal>,
}

impl CandidatePools {
    fn required(&self) -> [(MealType, &Vec<Meal>); 3] {
        [
            (MealType::Breakfast, &self.breakfast),
            (MealType::Lunch, &self.lunch),
            (MealType::Dinner, &self.dinner),
        ]
    }
}

/// Builds the full `days` sequence for a plan.
///
/// Policy (uniform across days): a required meal type with an empty catalog
/// pool fails the whole generation with `InsufficientData` before anything
/// is written; within a non-empty pool, the repeat-exclusion set resets and
/// the calorie band widens to the whole pool rather than leaving a hole.
/// An empty snack pool just means days without snacks.
pub fn build_days<R: Rng + ?Sized>(
    start_date: Date,
    duration: i64,
    target: &TargetNutrition,
    pools: &CandidatePools,
    rng: &mut R,
) -> Result<Vec<PlanDay>, AppError> {
    for (meal_type, pool) in pools.required() {
        if pool.is_empty() {
            return Err(AppError::InsufficientData(format!(
                "No {meal_type} meals available in the catalog"
            )));
        }
    }

    let mut used: HashSet<Uuid> = HashSet::new();
    let mut days = Vec::with_capacity(duration as usize);

    for i in 0..duration {
        let breakfast = pick_slot(
            &pools.breakfast,
            MealType::Breakfast,
            target.daily_calories * BREAKFAST_SHARE,
            &mut used,
            rng,
        );
        let lunch = pick_slot(
            &pools.lunch,
            MealType::Lunch,
            target.daily_calories * LUNCH_SHARE,
            &mut used,
            rng,
        );
        let dinner = pick_slot(
            &pools.dinner,
            MealType::Dinner,
            target.daily_calories * DINNER_SHARE,
            &mut used,
            rng,
        );

        let snack_count = rng.gen_range(0..=MAX_SNACKS_PER_DAY);
        let snack_candidates: Vec<&Meal> = pools
            .snacks
            .iter()
            .filter(|m| !used.contains(&m.id))
            .collect();
        let snack_candidates = if snack_candidates.is_empty() {
            pools.snacks.iter().collect()
        } else {
            snack_candidates
        };
        let snacks: Vec<MealSlot> = select_random_meals(&snack_candidates, snack_count, rng)
            .into_iter()
            .map(|m| {
                used.insert(m.id);
                MealSlot::new(m.clone(), 1.0)
            })
            .collect();

        days.push(PlanDay {
            date: start_date + Duration::days(i),
            meals: DayMeals {
                breakfast: Some(breakfast),
                lunch: Some(lunch),
                dinner: Some(dinner),
                snacks,
            },
        });
    }

    Ok(days)
}

/// Picks one meal for a required slot. Tries the calorie band with repeat
/// exclusion first, then relaxes exclusion, then the band, before falling
/// back to the whole pool. The pool is known non-empty, so this always
/// yields a meal.
fn pick_slot<R: Rng + ?Sized>(
    pool: &[Meal],
    meal_type: MealType,
    calorie_target: f64,
    used: &mut HashSet<Uuid>,
    rng: &mut R,
) -> MealSlot {
    let band = (
        calorie_target * (1.0 - CALORIE_BAND),
        calorie_target * (1.0 + CALORIE_BAND),
    );
    let attempts: [MealFilter<'_>; 4] = [
        MealFilter {
            calorie_band: Some(band),
            dietary_tags: &[],
            exclude: Some(&*used),
        },
        MealFilter {
            calorie_band: Some(band),
            dietary_tags: &[],
            exclude: None,
        },
        MealFilter {
            calorie_band: None,
            dietary_tags: &[],
            exclude: Some(&*used),
        },
        MealFilter {
            calorie_band: None,
            dietary_tags: &[],
            exclude: None,
        },
    ];

    let mut picked: Option<&Meal> = None;
    for filter in &attempts {
        let candidates = select_meals(pool, meal_type, filter);
        if let Some(&meal) = select_random_meals(&candidates, 1, rng).first() {
            picked = Some(meal);
            break;
        }
    }

    // last attempt matches the whole non-empty pool
    let meal = picked.expect("pool checked non-empty before assembly");
    used.insert(meal.id);
    MealSlot::new(meal.clone(), 1.0)
}

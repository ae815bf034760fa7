//! Meal selection: catalog filtering plus uniform random sampling. The RNG
//! is always passed in by the caller so selection is reproducible in tests.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use crate::meals::{Meal, MealType};

#[derive(Debug, Default)]
pub struct MealFilter<'a> {
    /// Inclusive calorie range on the meal's per-serving calories.
    pub calorie_band: Option<(f64, f64)>,
    /// A meal must carry every requested tag to qualify.
    pub dietary_tags: &'a [String],
    /// Meals already placed earlier in the plan, skipped to reduce repeats.
    pub exclude: Option<&'a HashSet<Uuid>>,
}

pub fn select_meals<'a>(
    catalog: &'a [Meal],
    meal_type: MealType,
    filter: &MealFilter<'_>,
) -> Vec<&'a Meal> {
    catalog
        .iter()
        .filter(|m| m.meal_type == meal_type)
        .filter(|m| match filter.calorie_band {
            Some((lo, hi)) => m.nutrition.calories >= lo && m.nutrition.calories <= hi,
            None => true,
        })
        .filter(|m| {
            filter
                .dietary_tags
                .iter()
                .all(|tag| m.dietary_tags.iter().any(|t| t == tag))
        })
        .filter(|m| filter.exclude.map_or(true, |ex| !ex.contains(&m.id)))
        .collect()
}

/// Uniform sample without replacement; returns `min(count, candidates.len())`
/// meals.
pub fn select_random_meals<'a, R: Rng + ?Sized>(
    candidates: &[&'a Meal],
    count: usize,
    rng: &mut R,
) -> Vec<&'a Meal> {
    candidates
        .choose_multiple(rng, count.min(candidates.len()))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plans::model::test_support::meal;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn catalog() -> Vec<Meal> {
        let mut meals = vec![
            meal("oatmeal", MealType::Breakfast, 350.0),
            meal("omelette", MealType::Breakfast, 450.0),
            meal("pancakes", MealType::Breakfast, 600.0),
            meal("salad", MealType::Lunch, 400.0),
            meal("apple", MealType::Snack, 80.0),
        ];
        meals[0].dietary_tags = vec!["vegan".into(), "gluten-free".into()];
        meals[1].dietary_tags = vec!["vegetarian".into()];
        meals
    }

    #[test]
    fn filters_by_exact_meal_type() {
        let catalog = catalog();
        let picked = select_meals(&catalog, MealType::Breakfast, &MealFilter::default());
        assert_eq!(picked.len(), 3);
        assert!(picked.iter().all(|m| m.meal_type == MealType::Breakfast));
    }

    #[test]
    fn calorie_band_is_inclusive() {
        let catalog = catalog();
        let filter = MealFilter {
            calorie_band: Some((350.0, 450.0)),
            ..MealFilter::default()
        };
        let picked = select_meals(&catalog, MealType::Breakfast, &filter);
        let names: Vec<_> = picked.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["oatmeal", "omelette"]);
    }

    #[test]
    fn dietary_tags_require_all_requested() {
        let catalog = catalog();
        let tags = vec!["vegan".to_string(), "gluten-free".to_string()];
        let filter = MealFilter {
            dietary_tags: &tags,
            ..MealFilter::default()
        };
        let picked = select_meals(&catalog, MealType::Breakfast, &filter);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "oatmeal");

        // one tag matching is not enough
        let tags = vec!["vegan".to_string(), "vegetarian".to_string()];
        let filter = MealFilter {
            dietary_tags: &tags,
            ..MealFilter::default()
        };
        assert!(select_meals(&catalog, MealType::Breakfast, &filter).is_empty());
    }

    #[test]
    fn excluded_ids_are_skipped() {
        let catalog = catalog();
        let exclude: HashSet<Uuid> = [catalog[0].id, catalog[1].id].into();
        let filter = MealFilter {
            exclude: Some(&exclude),
            ..MealFilter::default()
        };
        let picked = select_meals(&catalog, MealType::Breakfast, &filter);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "pancakes");
    }

    #[test]
    fn random_sample_size_and_uniqueness() {
        let catalog = catalog();
        let candidates: Vec<&Meal> = catalog.iter().collect();
        let mut rng = StdRng::seed_from_u64(7);

        let picked = select_random_meals(&candidates, 3, &mut rng);
        assert_eq!(picked.len(), 3);
        let ids: HashSet<Uuid> = picked.iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), 3);
        assert!(picked.iter().all(|p| candidates.iter().any(|c| c.id == p.id)));

        // asking for more than available returns everything
        let picked = select_random_meals(&candidates, 99, &mut rng);
        assert_eq!(picked.len(), candidates.len());

        let picked = select_random_meals(&candidates, 0, &mut rng);
        assert!(picked.is_empty());
    }

    #[test]
    fn random_sample_is_deterministic_for_a_seed() {
        let catalog = catalog();
        let candidates: Vec<&Meal> = catalog.iter().collect();

        let a: Vec<Uuid> = select_random_meals(&candidates, 3, &mut StdRng::seed_from_u64(42))
            .iter()
            .map(|m| m.id)
            .collect();
        let b: Vec<Uuid> = select_random_meals(&candidates, 3, &mut StdRng::seed_from_u64(42))
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(a, b);
    }
}

use serde::Deserialize;

use super::repo::{MealType, Nutrition};

#[derive(Debug, Deserialize)]
pub struct MealListQuery {
    pub meal_type: Option<MealType>,
    /// Comma-separated dietary tags; a meal must carry all of them.
    pub tags: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}
fn default_limit() -> i64 {
    20
}

impl MealListQuery {
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .map(|t| {
                t.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMealRequest {
    pub name: String,
    pub meal_type: MealType,
    pub nutrition: Nutrition,
    #[serde(default)]
    pub dietary_tags: Vec<String>,
    pub difficulty: Option<String>,
    #[serde(default)]
    pub prep_time_minutes: i32,
    #[serde(default)]
    pub cook_time_minutes: i32,
    #[serde(default = "default_servings")]
    pub servings: i32,
    pub image_url: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

fn default_servings() -> i32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_list_splits_and_trims() {
        let q = MealListQuery {
            meal_type: None,
            tags: Some("vegan, gluten-free ,,".into()),
            page: 1,
            limit: 20,
        };
        assert_eq!(q.tag_list(), vec!["vegan", "gluten-free"]);
    }

    #[test]
    fn tag_list_empty_when_absent() {
        let q = MealListQuery {
            meal_type: None,
            tags: None,
            page: 1,
            limit: 20,
        };
        assert!(q.tag_list().is_empty());
    }
}

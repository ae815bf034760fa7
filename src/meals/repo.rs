use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// The four plan slots a meal can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl std::fmt::Display for MealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-serving nutrition record. Fields absent in the stored document are
/// zero, never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbohydrates: f64,
    #[serde(default)]
    pub fats: f64,
    #[serde(default)]
    pub fiber: f64,
    #[serde(default)]
    pub sugar: f64,
    #[serde(default)]
    pub sodium: f64,
}

/// Catalog entry. Read-only from the plan engine's perspective.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Meal {
    pub id: Uuid,
    pub name: String,
    pub meal_type: MealType,
    pub nutrition: Json<Nutrition>,
    pub dietary_tags: Vec<String>,
    pub difficulty: Option<String>,
    pub prep_time_minutes: i32,
    pub cook_time_minutes: i32,
    pub total_time_minutes: i32,
    pub servings: i32,
    pub image_url: Option<String>,
    pub ingredients: Json<Vec<String>>,
    pub instructions: Json<Vec<String>>,
    pub created_at: OffsetDateTime,
}

const MEAL_COLUMNS: &str = "id, name, meal_type, nutrition, dietary_tags, difficulty, \
     prep_time_minutes, cook_time_minutes, total_time_minutes, servings, image_url, \
     ingredients, instructions, created_at";

#[derive(Debug, Default)]
pub struct CatalogFilter {
    pub meal_type: Option<MealType>,
    pub dietary_tags: Vec<String>,
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Meal>, sqlx::Error> {
    sqlx::query_as::<_, Meal>(&format!("SELECT {MEAL_COLUMNS} FROM meals WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_by_ids(db: &PgPool, ids: &[Uuid]) -> Result<Vec<Meal>, sqlx::Error> {
    sqlx::query_as::<_, Meal>(&format!(
        "SELECT {MEAL_COLUMNS} FROM meals WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(db)
    .await
}

/// Full candidate pool for one meal type. The generator filters and samples
/// this in memory, so generation issues one catalog query per slot type.
pub async fn find_by_type(db: &PgPool, meal_type: MealType) -> Result<Vec<Meal>, sqlx::Error> {
    sqlx::query_as::<_, Meal>(&format!(
        "SELECT {MEAL_COLUMNS} FROM meals WHERE meal_type = $1 ORDER BY created_at"
    ))
    .bind(meal_type)
    .fetch_all(db)
    .await
}

pub async fn list(
    db: &PgPool,
    filter: &CatalogFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Meal>, sqlx::Error> {
    sqlx::query_as::<_, Meal>(&format!(
        r#"
        SELECT {MEAL_COLUMNS} FROM meals
        WHERE ($1::text IS NULL OR meal_type = $1)
          AND (cardinality($2::text[]) = 0 OR dietary_tags @> $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(filter.meal_type.map(MealType::as_str))
    .bind(&filter.dietary_tags)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

pub async fn count(db: &PgPool, filter: &CatalogFilter) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM meals
        WHERE ($1::text IS NULL OR meal_type = $1)
          AND (cardinality($2::text[]) = 0 OR dietary_tags @> $2)
        "#,
    )
    .bind(filter.meal_type.map(MealType::as_str))
    .bind(&filter.dietary_tags)
    .fetch_one(db)
    .await
}

pub async fn create(db: &PgPool, req: &super::dto::CreateMealRequest) -> Result<Meal, sqlx::Error> {
    sqlx::query_as::<_, Meal>(&format!(
        r#"
        INSERT INTO meals (name, meal_type, nutrition, dietary_tags, difficulty,
                           prep_time_minutes, cook_time_minutes, servings, image_url,
                           ingredients, instructions)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {MEAL_COLUMNS}
        "#
    ))
    .bind(req.name.trim())
    .bind(req.meal_type)
    .bind(Json(&req.nutrition))
    .bind(&req.dietary_tags)
    .bind(req.difficulty.as_deref())
    .bind(req.prep_time_minutes)
    .bind(req.cook_time_minutes)
    .bind(req.servings)
    .bind(req.image_url.as_deref())
    .bind(Json(&req.ingredients))
    .bind(Json(&req.instructions))
    .fetch_one(db)
    .await
}

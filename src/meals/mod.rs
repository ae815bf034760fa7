use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod repo;

pub use repo::{Meal, MealType, Nutrition};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::routes())
}

use crate::state::AppState;
use axum::Router;

mod dto;
pub mod generator;
pub mod handlers;
pub mod model;
pub mod nutrition;
pub mod repo;
pub mod selection;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::routes())
}

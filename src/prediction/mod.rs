mod dto;
pub mod error;
pub mod features;
pub mod handlers;
pub mod model;
pub mod services;

pub use error::PredictionError;
pub use model::Model;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::predict_routes())
}

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde_json::{Map, Value};
use tracing::instrument;

use super::{dto::PredictResponse, services};
use crate::{auth::AuthUser, error::AppError, state::AppState};

pub fn predict_routes() -> Router<AppState> {
    Router::new().route("/predict", post(predict))
}

#[instrument(skip(state, payload))]
pub async fn predict(
    State(state): State<AppState>,
    AuthUser(email): AuthUser,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<PredictResponse>, AppError> {
    let Json(input) = payload?;
    let prediction = services::predict(&state.model, &input)?;
    Ok(Json(prediction.into()))
}

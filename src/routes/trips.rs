use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::{
    config::url_with_path,
    error::AppError,
    models::trip::{Trip, TripRequest},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trips", post(create_trip).get(list_trips))
        .route("/trips/:id/confirm", get(confirm_trip))
}

#[derive(Debug, Serialize)]
pub struct CreateTripResponse {
    #[serde(rename = "tripId")]
    pub trip_id: String,
}

async fn create_trip(
    State(state): State<AppState>,
    payload: Result<Json<TripRequest>, JsonRejection>,
) -> Result<Json<CreateTripResponse>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("malformed trip payload: {rejection}");
        AppError::BadRequest(rejection.body_text())
    })?;
    request.check()?;

    let trip_id = state.planner.create_trip(request, Utc::now()).await?;
    Ok(Json(CreateTripResponse { trip_id }))
}

async fn confirm_trip(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let outcome = state.planner.confirm_trip(&id).await?;
    debug!(trip_id = %id, ?outcome, "confirmation handled");

    let target = url_with_path(&state.config.web_origin, &format!("trips/{id}"));
    Ok(Redirect::to(&target))
}

async fn list_trips(State(state): State<AppState>) -> Result<Json<Vec<Trip>>, AppError> {
    Ok(Json(state.planner.list_trips().await?))
}

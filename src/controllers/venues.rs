use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use super::ApiResult;
use crate::catalog::VenueSummary;
use crate::models::Seat;
use crate::services::flow::FlowError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/venues", get(list_venues))
        .route("/venues/{venue}/buildings/{building}/floors/{floor}/seats", get(floor_seats))
}

// GET /api/venues
async fn list_venues(State(state): State<Arc<AppState>>) -> Json<Vec<VenueSummary>> {
    Json(state.catalog.summary())
}

// GET /api/venues/{venue}/buildings/{building}/floors/{floor}/seats
async fn floor_seats(
    State(state): State<Arc<AppState>>,
    Path((venue, building, floor)): Path<(String, String, String)>,
) -> ApiResult<Json<Vec<Seat>>> {
    let floor = state
        .catalog
        .resolve(&venue, &building, &floor)
        .map_err(FlowError::from)?;
    Ok(Json(floor.seats.clone()))
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde::Deserialize;
use std::sync::Arc;

use super::{to_api_error, ApiResult};
use crate::middleware::RequestUser;
use crate::models::{BookedSeat, Booking, NewBooking, TeamMember};
use crate::services::flow::{validate_booking, BookingDetails, BookingDraft};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/{id}", get(get_booking).put(update_booking).delete(delete_booking))
        .route("/bookings/{id}/edit", post(edit_booking))
}

/* ---------- helpers ---------- */

/// Бронь существует и принадлежит пользователю.
async fn owned_booking(state: &AppState, id: &str, user: &RequestUser) -> ApiResult<Booking> {
    let booking = state.store.get_booking(id).await?;
    if booking.record.user != user.id {
        return Err(to_api_error(StatusCode::FORBIDDEN, "Booking not found or does not belong to you"));
    }
    Ok(booking)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingRequest {
    #[serde(flatten)]
    details: BookingDetails,
    seats: Vec<BookedSeat>,
    #[serde(default)]
    team_members: Vec<TeamMember>,
}

impl BookingRequest {
    fn into_booking(self, user_id: &str) -> NewBooking {
        NewBooking {
            user: user_id.to_string(),
            date: self.details.date,
            venue: self.details.venue,
            building: self.details.building,
            floor: self.details.floor,
            mode: self.details.mode,
            seats: self.seats,
            team_members: self.team_members,
        }
    }
}

/* ---------- BOOKINGS ---------- */

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    all: bool,
}

// GET /api/bookings - предстоящие брони (с сегодняшнего дня), ?all=true для всех
async fn list_bookings(
    State(state): State<Arc<AppState>>,
    user: RequestUser,
    Query(params): Query<ListQuery>,
) -> ApiResult<Json<Vec<Booking>>> {
    let today = Local::now().date_naive();
    let mut bookings = state.store.list_bookings(&user.id).await?;
    if !params.all {
        bookings.retain(|b| b.record.date >= today);
    }
    bookings.sort_by(|a, b| a.record.date.cmp(&b.record.date));
    Ok(Json(bookings))
}

// POST /api/bookings
async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: RequestUser,
    Json(req): Json<BookingRequest>,
) -> ApiResult<impl IntoResponse> {
    let booking = req.into_booking(&user.id);
    validate_booking(&booking, &state.catalog)?;

    let created = state.store.create_booking(&booking).await?;
    tracing::info!("Created booking {} for user {} ({} seat(s))", created.id, user.id, created.record.seats.len());
    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/bookings/{id}
async fn get_booking(
    State(state): State<Arc<AppState>>,
    user: RequestUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Booking>> {
    Ok(Json(owned_booking(&state, &id, &user).await?))
}

// PUT /api/bookings/{id}
async fn update_booking(
    State(state): State<Arc<AppState>>,
    user: RequestUser,
    Path(id): Path<String>,
    Json(req): Json<BookingRequest>,
) -> ApiResult<Json<Booking>> {
    owned_booking(&state, &id, &user).await?;

    let booking = req.into_booking(&user.id);
    validate_booking(&booking, &state.catalog)?;

    let updated = state.store.update_booking(&id, &booking).await?;
    tracing::info!("Updated booking {}", id);
    Ok(Json(updated))
}

// DELETE /api/bookings/{id}
async fn delete_booking(
    State(state): State<Arc<AppState>>,
    user: RequestUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    owned_booking(&state, &id, &user).await?;
    state.store.delete_booking(&id).await?;
    tracing::info!("Deleted booking {}", id);
    Ok((StatusCode::OK, Json(serde_json::json!({"success": true, "message": "Booking deleted"}))))
}

// POST /api/bookings/{id}/edit - черновик для изменения брони
async fn edit_booking(
    State(state): State<Arc<AppState>>,
    user: RequestUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let booking = owned_booking(&state, &id, &user).await?;
    let draft = BookingDraft::edit(&booking, &state.catalog)?;

    let dropped = booking.record.seats.len().saturating_sub(draft.selection.len());
    if dropped > 0 {
        tracing::warn!("Edit draft {} for booking {}: {} seat(s) no longer available", draft.id, id, dropped);
    }

    state.drafts.save(&draft).await?;
    Ok((StatusCode::CREATED, Json(draft)))
}

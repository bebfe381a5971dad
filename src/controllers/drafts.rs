//! drafts.rs
//!
//! Экранный поток бронирования поверх черновика:
//! детали -> выбор мест -> (участники команды) -> подтверждение -> отправка.
//! Каждый запрос загружает черновик из кеша, применяет одну операцию
//! и сохраняет его обратно.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{load_draft, to_api_error, ApiResult};
use crate::middleware::RequestUser;
use crate::models::{SeatId, TeamMember};
use crate::services::flow::{validate_booking, BookingDetails, BookingDraft, DraftSummary, FlowError, FlowStep, SeatView};
use crate::services::selection::{SelectionError, ToggleOutcome};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drafts", post(start_draft))
        .route("/drafts/{id}", get(get_draft).delete(discard_draft))
        .route("/drafts/{id}/details", put(revise_details))
        .route("/drafts/{id}/seats", get(seat_map))
        .route("/drafts/{id}/seats/{seat_id}/toggle", post(toggle_seat))
        .route("/drafts/{id}/seats/confirm", post(confirm_seats))
        .route("/drafts/{id}/team-members", put(set_team_members))
        .route("/drafts/{id}/summary", get(summary))
        .route("/drafts/{id}/submit", post(submit))
}

// POST /api/drafts
async fn start_draft(
    State(state): State<Arc<AppState>>,
    Json(details): Json<BookingDetails>,
) -> ApiResult<impl IntoResponse> {
    let draft = BookingDraft::start(details, &state.catalog)?;
    state.drafts.save(&draft).await?;
    tracing::info!(
        "Draft {} started: {} / {} / floor {} on {}",
        draft.id, draft.details.venue, draft.details.building, draft.details.floor, draft.details.date
    );
    Ok((StatusCode::CREATED, Json(draft)))
}

// GET /api/drafts/{id}
async fn get_draft(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<BookingDraft>> {
    Ok(Json(load_draft(&state, id).await?))
}

// DELETE /api/drafts/{id} - пользователь ушёл с экрана
async fn discard_draft(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.drafts.discard(id).await? {
        tracing::debug!("Draft {} discarded", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(to_api_error(StatusCode::NOT_FOUND, &format!("Draft {} not found or expired", id)))
    }
}

// PUT /api/drafts/{id}/details - "Back to Booking Details"
async fn revise_details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(details): Json<BookingDetails>,
) -> ApiResult<Json<BookingDraft>> {
    let mut draft = load_draft(&state, id).await?;
    draft.revise_details(details, &state.catalog)?;
    state.drafts.save(&draft).await?;
    Ok(Json(draft))
}

// GET /api/drafts/{id}/seats
async fn seat_map(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<SeatView>>> {
    let draft = load_draft(&state, id).await?;
    Ok(Json(draft.seat_map(&state.catalog)?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToggleResponse {
    #[serde(flatten)]
    outcome: Option<ToggleOutcome>,
    selected_seats: Vec<SeatId>,
    /// Сообщение для пользователя, если выбор отклонён по лимиту.
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
}

// POST /api/drafts/{id}/seats/{seat_id}/toggle
async fn toggle_seat(
    State(state): State<Arc<AppState>>,
    Path((id, seat_id)): Path<(Uuid, SeatId)>,
) -> ApiResult<Json<ToggleResponse>> {
    let mut draft = load_draft(&state, id).await?;

    let (outcome, notice) = match draft.toggle_seat(seat_id, &state.catalog) {
        Ok(outcome) => (Some(outcome), None),
        // лимит мест - не ошибка, а подсказка пользователю
        Err(FlowError::Selection(e @ SelectionError::CapacityExceeded { .. })) => {
            tracing::warn!("Draft {}: seat {} rejected: {}", id, seat_id, e);
            (None, Some(e.to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(outcome) = outcome {
        tracing::debug!("Draft {}: seat {} -> {:?}, selected {:?}", id, seat_id, outcome, draft.selection.seats());
        state.drafts.save(&draft).await?;
    }

    Ok(Json(ToggleResponse { outcome, selected_seats: draft.selection.seat_ids(), notice }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StepResponse {
    next_step: FlowStep,
    draft: BookingDraft,
}

// POST /api/drafts/{id}/seats/confirm
async fn confirm_seats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<StepResponse>> {
    let mut draft = load_draft(&state, id).await?;
    let next_step = draft.confirm_seats()?;
    state.drafts.save(&draft).await?;
    Ok(Json(StepResponse { next_step, draft }))
}

// PUT /api/drafts/{id}/team-members
async fn set_team_members(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(members): Json<Vec<TeamMember>>,
) -> ApiResult<Json<StepResponse>> {
    let mut draft = load_draft(&state, id).await?;
    draft.set_team_members(members)?;
    state.drafts.save(&draft).await?;
    Ok(Json(StepResponse { next_step: draft.step, draft }))
}

// GET /api/drafts/{id}/summary
async fn summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DraftSummary>> {
    let draft = load_draft(&state, id).await?;
    Ok(Json(draft.summary()))
}

// POST /api/drafts/{id}/submit - создать или обновить бронь в хранилище
async fn submit(
    State(state): State<Arc<AppState>>,
    user: RequestUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mut draft = load_draft(&state, id).await?;
    let payload = draft.to_booking_payload(&user.id)?;
    validate_booking(&payload, &state.catalog)?;

    let (status, booking) = match draft.booking_id.clone() {
        Some(booking_id) => {
            let existing = state.store.get_booking(&booking_id).await?;
            if existing.record.user != user.id {
                return Err(to_api_error(StatusCode::FORBIDDEN, "Booking not found or does not belong to you"));
            }
            (StatusCode::OK, state.store.update_booking(&booking_id, &payload).await?)
        }
        None => (StatusCode::CREATED, state.store.create_booking(&payload).await?),
    };

    draft.mark_submitted(booking.id.clone())?;
    if let Err(e) = state.drafts.save(&draft).await {
        // черновик остался на Confirmation: новая бронь откатывается, иначе повтор создаст дубль
        if status == StatusCode::CREATED {
            tracing::warn!("Draft {} was not saved, rolling back booking {}", id, booking.id);
            if let Err(rollback) = state.store.delete_booking(&booking.id).await {
                tracing::error!("Rollback of booking {} failed: {}", booking.id, rollback);
            }
        }
        return Err(e.into());
    }
    tracing::info!("Draft {} submitted as booking {}", id, booking.id);

    Ok((status, Json(booking)))
}

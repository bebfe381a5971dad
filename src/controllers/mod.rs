pub mod venues;
pub mod users;
pub mod bookings;
pub mod drafts;
pub mod payment;

use axum::{http::StatusCode, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::CacheError;
use crate::catalog::CatalogError;
use crate::services::flow::{BookingDraft, FlowError};
use crate::services::selection::SelectionError;
use crate::store::StoreError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(venues::routes())
        .merge(users::routes())
        .merge(bookings::routes())
        .merge(drafts::routes())
        .merge(payment::routes())
}

// --- Ошибки API ---

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub message: String,
}

pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

pub fn to_api_error(status: StatusCode, message: &str) -> (StatusCode, Json<ApiError>) {
    (status, Json(ApiError { success: false, message: message.to_string() }))
}

impl From<FlowError> for (StatusCode, Json<ApiError>) {
    fn from(e: FlowError) -> Self {
        let status = match &e {
            FlowError::Catalog(CatalogError::UnknownVenue(_))
            | FlowError::Catalog(CatalogError::UnknownBuilding { .. })
            | FlowError::Catalog(CatalogError::UnknownFloor { .. })
            | FlowError::Selection(SelectionError::UnknownSeat(_)) => StatusCode::NOT_FOUND,
            FlowError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
            FlowError::Selection(SelectionError::CapacityExceeded { .. })
            | FlowError::WrongStep { .. }
            | FlowError::NotTeamBooking => StatusCode::CONFLICT,
            FlowError::Selection(SelectionError::WrongCount { .. })
            | FlowError::Booking(_)
            | FlowError::SeatUnavailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        to_api_error(status, &e.to_string())
    }
}

impl From<StoreError> for (StatusCode, Json<ApiError>) {
    fn from(e: StoreError) -> Self {
        match &e {
            StoreError::NotFound(_) => to_api_error(StatusCode::NOT_FOUND, &e.to_string()),
            StoreError::Unavailable => to_api_error(StatusCode::SERVICE_UNAVAILABLE, &e.to_string()),
            StoreError::Rejected { conflict: true, message } => to_api_error(StatusCode::CONFLICT, message),
            StoreError::Rejected { conflict: false, message } => {
                to_api_error(StatusCode::UNPROCESSABLE_ENTITY, message)
            }
            StoreError::Backend(_) => {
                tracing::error!("Booking store failure: {}", e);
                to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Booking store error")
            }
        }
    }
}

impl From<CacheError> for (StatusCode, Json<ApiError>) {
    fn from(e: CacheError) -> Self {
        tracing::error!("Draft cache failure: {:?}", e);
        to_api_error(StatusCode::INTERNAL_SERVER_ERROR, "Draft storage error")
    }
}

/// Загрузить черновик или вернуть 404.
pub(crate) async fn load_draft(state: &AppState, id: Uuid) -> ApiResult<BookingDraft> {
    state
        .drafts
        .load(id)
        .await?
        .ok_or_else(|| to_api_error(StatusCode::NOT_FOUND, &format!("Draft {} not found or expired", id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_rejections_keep_message() {
        let (status, Json(body)) = <(StatusCode, Json<ApiError>)>::from(StoreError::Rejected {
            conflict: false,
            message: "Seat already booked".to_string(),
        });
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.message, "Seat already booked");

        let (status, _) = <(StatusCode, Json<ApiError>)>::from(StoreError::Rejected {
            conflict: true,
            message: "Booking changed".to_string(),
        });
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, Json(body)) = <(StatusCode, Json<ApiError>)>::from(StoreError::Backend("boom".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Booking store error");
    }
}

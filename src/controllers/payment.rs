use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::{load_draft, ApiResult};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/drafts/{id}/payment", post(complete_payment))
}

/// POST /api/drafts/{id}/payment
///
/// Заглушка платёжного шлюза: деньги не списываются, черновик закрывается.
pub async fn complete_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let mut draft = load_draft(&state, id).await?;
    draft.complete_payment()?;
    state.drafts.discard(id).await?;

    tracing::info!("Draft {} completed, booking {:?}", id, draft.booking_id);

    Ok(Json(json!({
        "success": true,
        "bookingId": draft.booking_id,
        "step": draft.step,
        "message": "Your booking has been processed."
    })))
}

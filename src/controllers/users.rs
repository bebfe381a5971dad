use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use super::{to_api_error, ApiResult};
use crate::models::{NewUser, User};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/users", get(find_users).post(create_user))
}

#[derive(Debug, Deserialize)]
struct UsersQuery {
    email: String,
}

// GET /api/users?email=
async fn find_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UsersQuery>,
) -> ApiResult<Json<Vec<User>>> {
    let user = state.store.find_user_by_email(&params.email).await?;
    Ok(Json(user.into_iter().collect()))
}

// POST /api/users - существующий пользователь с тем же email возвращается как есть
async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewUser>,
) -> ApiResult<impl IntoResponse> {
    req.validate()
        .map_err(|e| to_api_error(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string()))?;

    if let Some(existing) = state.store.find_user_by_email(&req.email).await? {
        return Ok((StatusCode::OK, Json(existing)));
    }

    let user = state.store.create_user(&req).await?;
    tracing::info!("Created user {} <{}>", user.id, user.email);
    Ok((StatusCode::CREATED, Json(user)))
}

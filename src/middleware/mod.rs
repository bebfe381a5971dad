use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::controllers::{to_api_error, ApiError};
use crate::models::NewUser;

pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Пользователь, от имени которого идёт запрос. Это не аутентификация:
/// email берётся из `X-User-Email` (или из конфига), пользователь
/// находится или создаётся в хранилище.
#[derive(Debug, Clone)]
pub struct RequestUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl FromRequestParts<Arc<crate::AppState>> for RequestUser {
    type Rejection = (StatusCode, Json<ApiError>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let defaults = &state.config.users;
        let candidate = NewUser {
            email: header(&parts.headers, USER_EMAIL_HEADER).unwrap_or_else(|| defaults.email.clone()),
            name: header(&parts.headers, USER_NAME_HEADER).unwrap_or_else(|| defaults.name.clone()),
        };
        candidate
            .validate()
            .map_err(|e| to_api_error(StatusCode::BAD_REQUEST, &e.to_string()))?;

        let user = match state.store.find_user_by_email(&candidate.email).await? {
            Some(user) => user,
            None => {
                let user = state.store.create_user(&candidate).await?;
                tracing::info!("Registered user {} <{}>", user.id, user.email);
                user
            }
        };

        Ok(RequestUser { id: user.id, email: user.email, name: user.name })
    }
}

//! Клиент для внешнего REST API бронирований (`/users`, `/bookings`).
//! Все сетевые вызовы проходят через `CircuitBreaker`.

use futures::future::{BoxFuture, FutureExt};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::{BookingStore, StoreError, StoreResult};
use crate::config::RemoteStoreConfig;
use crate::models::{Booking, NewBooking, NewUser, User};
use crate::services::circuit_breaker::CircuitBreaker;

// тело ошибки удалённого API
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct RemoteBookingStore {
    base_url: String,
    http_client: reqwest::Client,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl RemoteBookingStore {
    pub fn from_config(config: &RemoteStoreConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
            circuit_breaker: Arc::new(CircuitBreaker::new(
                config.failure_threshold,
                config.breaker_timeout_seconds,
            )),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Отправляет запрос через Circuit Breaker и приводит ответ к `StoreError`.
    async fn send(&self, what: &str, request: RequestBuilder) -> StoreResult<Response> {
        if !self.circuit_breaker.can_execute() {
            warn!("Circuit breaker is OPEN - blocking booking store request ({})", what);
            return Err(StoreError::Unavailable);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                debug!("{} -> {}", what, status);
                if status.is_server_error() {
                    self.circuit_breaker.record_failure();
                    return Err(StoreError::Backend(format!("{} returned {}", what, status)));
                }
                self.circuit_breaker.record_success();
                if status == StatusCode::NOT_FOUND {
                    Err(StoreError::NotFound(what.to_string()))
                } else if status.is_client_error() {
                    let message = response
                        .json::<ErrorBody>()
                        .await
                        .map(|body| body.message)
                        .unwrap_or_else(|_| format!("{} was rejected with {}", what, status));
                    warn!("{} rejected by booking store ({}): {}", what, status, message);
                    Err(StoreError::Rejected { conflict: status == StatusCode::CONFLICT, message })
                } else if !status.is_success() {
                    Err(StoreError::Backend(format!("{} returned {}", what, status)))
                } else {
                    Ok(response)
                }
            }
            Err(e) => {
                error!("Booking store request failed ({}): {:?}", what, e);
                self.circuit_breaker.record_failure();
                if e.is_timeout() || e.is_connect() {
                    Err(StoreError::Unavailable)
                } else {
                    Err(StoreError::Backend(e.to_string()))
                }
            }
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, what: &str, request: RequestBuilder) -> StoreResult<T> {
        self.send(what, request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| StoreError::Backend(format!("{} returned malformed body: {}", what, e)))
    }
}

impl BookingStore for RemoteBookingStore {
    fn find_user_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, StoreResult<Option<User>>> {
        async move {
            let request = self.http_client.get(self.url("/users")).query(&[("email", email)]);
            let users: Vec<User> = self.send_json("Users", request).await?;
            Ok(users.into_iter().find(|u| u.email == email))
        }
        .boxed()
    }

    fn create_user<'a>(&'a self, user: &'a NewUser) -> BoxFuture<'a, StoreResult<User>> {
        async move {
            let request = self.http_client.post(self.url("/users")).json(user);
            self.send_json("User", request).await
        }
        .boxed()
    }

    fn list_bookings<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, StoreResult<Vec<Booking>>> {
        async move {
            let request = self.http_client.get(self.url("/bookings")).query(&[("user", user_id)]);
            let bookings: Vec<Booking> = self.send_json("Bookings", request).await?;
            // API может игнорировать фильтр
            Ok(bookings.into_iter().filter(|b| b.record.user == user_id).collect())
        }
        .boxed()
    }

    fn get_booking<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Booking>> {
        async move {
            let request = self.http_client.get(self.url(&format!("/bookings/{}", id)));
            self.send_json(&format!("Booking {}", id), request).await
        }
        .boxed()
    }

    fn create_booking<'a>(&'a self, booking: &'a NewBooking) -> BoxFuture<'a, StoreResult<Booking>> {
        async move {
            let request = self.http_client.post(self.url("/bookings")).json(booking);
            self.send_json("Booking", request).await
        }
        .boxed()
    }

    fn update_booking<'a>(&'a self, id: &'a str, booking: &'a NewBooking) -> BoxFuture<'a, StoreResult<Booking>> {
        async move {
            let request = self.http_client.put(self.url(&format!("/bookings/{}", id))).json(booking);
            self.send_json(&format!("Booking {}", id), request).await
        }
        .boxed()
    }

    fn delete_booking<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<()>> {
        async move {
            let request = self.http_client.delete(self.url(&format!("/bookings/{}", id)));
            self.send(&format!("Booking {}", id), request).await?;
            Ok(())
        }
        .boxed()
    }
}

//! Хранилище бронирований и пользователей.
//!
//! Внешний сервис с точки зрения движка выбора мест: контроллеры
//! работают с ним через `BookingStore`, конкретная реализация выбирается
//! в конфиге (`BOOKING_STORE=postgres|remote|memory`).

pub mod memory;
pub mod postgres;
pub mod remote;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::models::{Booking, NewBooking, NewUser, User};

pub use memory::MemoryBookingStore;
pub use postgres::PgBookingStore;
pub use remote::RemoteBookingStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Booking store is temporarily unavailable")]
    Unavailable,
    /// Хранилище отклонило запрос (4xx), например дубль брони.
    #[error("{message}")]
    Rejected { conflict: bool, message: String },
    #[error("Booking store error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound("Record".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => StoreError::Unavailable,
            other => StoreError::Backend(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Object-safe: методы возвращают `BoxFuture`, чтобы хранить `Arc<dyn BookingStore>` в `AppState`.
pub trait BookingStore: Send + Sync {
    fn find_user_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, StoreResult<Option<User>>>;

    fn create_user<'a>(&'a self, user: &'a NewUser) -> BoxFuture<'a, StoreResult<User>>;

    /// Все брони пользователя, без фильтра по дате.
    fn list_bookings<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, StoreResult<Vec<Booking>>>;

    fn get_booking<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Booking>>;

    fn create_booking<'a>(&'a self, booking: &'a NewBooking) -> BoxFuture<'a, StoreResult<Booking>>;

    fn update_booking<'a>(&'a self, id: &'a str, booking: &'a NewBooking) -> BoxFuture<'a, StoreResult<Booking>>;

    fn delete_booking<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<()>>;
}

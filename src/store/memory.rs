use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BookingStore, StoreError, StoreResult};
use crate::models::{Booking, NewBooking, NewUser, User};

/// Хранилище в памяти процесса: для локального запуска и тестов.
#[derive(Default)]
pub struct MemoryBookingStore {
    users: RwLock<Vec<User>>,
    bookings: RwLock<HashMap<String, Booking>>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookingStore for MemoryBookingStore {
    fn find_user_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, StoreResult<Option<User>>> {
        async move {
            let users = self.users.read().await;
            Ok(users.iter().find(|u| u.email == email).cloned())
        }
        .boxed()
    }

    fn create_user<'a>(&'a self, user: &'a NewUser) -> BoxFuture<'a, StoreResult<User>> {
        async move {
            let created = User {
                id: Uuid::new_v4().to_string(),
                name: user.name.clone(),
                email: user.email.clone(),
            };
            self.users.write().await.push(created.clone());
            Ok(created)
        }
        .boxed()
    }

    fn list_bookings<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, StoreResult<Vec<Booking>>> {
        async move {
            let bookings = self.bookings.read().await;
            let mut found: Vec<Booking> = bookings
                .values()
                .filter(|b| b.record.user == user_id)
                .cloned()
                .collect();
            found.sort_by(|a, b| a.record.date.cmp(&b.record.date).then_with(|| a.id.cmp(&b.id)));
            Ok(found)
        }
        .boxed()
    }

    fn get_booking<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Booking>> {
        async move {
            self.bookings
                .read()
                .await
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(format!("Booking {}", id)))
        }
        .boxed()
    }

    fn create_booking<'a>(&'a self, booking: &'a NewBooking) -> BoxFuture<'a, StoreResult<Booking>> {
        async move {
            let created = Booking { id: Uuid::new_v4().to_string(), record: booking.clone() };
            self.bookings.write().await.insert(created.id.clone(), created.clone());
            Ok(created)
        }
        .boxed()
    }

    fn update_booking<'a>(&'a self, id: &'a str, booking: &'a NewBooking) -> BoxFuture<'a, StoreResult<Booking>> {
        async move {
            let mut bookings = self.bookings.write().await;
            let existing = bookings
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(format!("Booking {}", id)))?;
            existing.record = booking.clone();
            Ok(existing.clone())
        }
        .boxed()
    }

    fn delete_booking<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<()>> {
        async move {
            self.bookings
                .write()
                .await
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound(format!("Booking {}", id)))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookedSeat;
    use crate::services::selection::BookingMode;
    use chrono::NaiveDate;

    fn booking(user: &str, day: u32) -> NewBooking {
        NewBooking {
            user: user.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 7, day).unwrap(),
            venue: "Main Office".to_string(),
            building: "A".to_string(),
            floor: "1".to_string(),
            mode: BookingMode::Solo,
            seats: vec![BookedSeat { id: 1 }],
            team_members: Vec::new(),
        }
    }

    #[tokio::test]
    async fn crud_cycle() {
        let store = MemoryBookingStore::new();

        let created = store.create_booking(&booking("u-1", 10)).await.unwrap();
        assert_eq!(store.get_booking(&created.id).await.unwrap(), created);

        let mut changed = booking("u-1", 12);
        changed.seats = vec![BookedSeat { id: 2 }];
        let updated = store.update_booking(&created.id, &changed).await.unwrap();
        assert_eq!(updated.record.seat_ids(), vec![2]);

        store.delete_booking(&created.id).await.unwrap();
        assert!(matches!(store.get_booking(&created.id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete_booking(&created.id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn lists_only_own_bookings_in_date_order() {
        let store = MemoryBookingStore::new();
        store.create_booking(&booking("u-1", 20)).await.unwrap();
        store.create_booking(&booking("u-2", 5)).await.unwrap();
        store.create_booking(&booking("u-1", 3)).await.unwrap();

        let listed = store.list_bookings("u-1").await.unwrap();
        let days: Vec<String> = listed.iter().map(|b| b.record.date.to_string()).collect();
        assert_eq!(days, vec!["2025-07-03", "2025-07-20"]);
    }

    #[tokio::test]
    async fn users_by_email() {
        let store = MemoryBookingStore::new();
        assert!(store.find_user_by_email("test@example.com").await.unwrap().is_none());

        let user = store
            .create_user(&NewUser { name: "Test User".to_string(), email: "test@example.com".to_string() })
            .await
            .unwrap();
        assert_eq!(store.find_user_by_email("test@example.com").await.unwrap(), Some(user));
    }
}

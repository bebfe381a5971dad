use futures::future::{BoxFuture, FutureExt};
use sqlx::types::Json;
use sqlx::FromRow;
use std::num::NonZeroU32;
use uuid::Uuid;

use super::{BookingStore, StoreError, StoreResult};
use crate::database::Database;
use crate::models::{BookedSeat, Booking, NewBooking, NewUser, TeamMember, User};
use crate::services::selection::BookingMode;

pub struct PgBookingStore {
    db: Database,
}

impl PgBookingStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

// Строка таблицы bookings
#[derive(Debug, FromRow)]
struct BookingRow {
    id: String,
    user_id: String,
    date: chrono::NaiveDate,
    venue: String,
    building: String,
    floor: String,
    booking_type: String,
    team_size: Option<i32>,
    seats: Vec<i64>,
    team_members: Json<Vec<TeamMember>>,
}

const BOOKING_COLUMNS: &str =
    "id, user_id, date, venue, building, floor, booking_type, team_size, seats, team_members";

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let mode = match (row.booking_type.as_str(), row.team_size) {
            ("self", _) => BookingMode::Solo,
            ("team", Some(size)) => {
                let target_count = u32::try_from(size)
                    .ok()
                    .and_then(NonZeroU32::new)
                    .ok_or_else(|| StoreError::Backend(format!("booking {} has team_size {}", row.id, size)))?;
                BookingMode::Team { target_count }
            }
            (other, _) => {
                return Err(StoreError::Backend(format!(
                    "booking {} has unexpected booking_type '{}'",
                    row.id, other
                )))
            }
        };

        let seats = row
            .seats
            .iter()
            .map(|&id| {
                u32::try_from(id)
                    .map(|id| BookedSeat { id })
                    .map_err(|_| StoreError::Backend(format!("booking {} has seat id {}", row.id, id)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Booking {
            id: row.id,
            record: NewBooking {
                user: row.user_id,
                date: row.date,
                venue: row.venue,
                building: row.building,
                floor: row.floor,
                mode,
                seats,
                team_members: row.team_members.0,
            },
        })
    }
}

fn mode_columns(mode: &BookingMode) -> (&'static str, Option<i32>) {
    match mode {
        BookingMode::Solo => ("self", None),
        BookingMode::Team { target_count } => ("team", i32::try_from(target_count.get()).ok()),
    }
}

fn seat_column(booking: &NewBooking) -> Vec<i64> {
    booking.seats.iter().map(|seat| i64::from(seat.id)).collect()
}

impl BookingStore for PgBookingStore {
    fn find_user_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, StoreResult<Option<User>>> {
        async move {
            let user = sqlx::query_as::<_, User>("SELECT id, name, email FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.db.pool)
                .await?;
            Ok(user)
        }
        .boxed()
    }

    fn create_user<'a>(&'a self, user: &'a NewUser) -> BoxFuture<'a, StoreResult<User>> {
        async move {
            let created = sqlx::query_as::<_, User>(
                "INSERT INTO users (id, name, email)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (email) DO UPDATE SET name = users.name
                 RETURNING id, name, email",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&user.name)
            .bind(&user.email)
            .fetch_one(&self.db.pool)
            .await?;
            Ok(created)
        }
        .boxed()
    }

    fn list_bookings<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, StoreResult<Vec<Booking>>> {
        async move {
            let rows = sqlx::query_as::<_, BookingRow>(&format!(
                "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY date, created_at",
                BOOKING_COLUMNS
            ))
            .bind(user_id)
            .fetch_all(&self.db.pool)
            .await?;

            rows.into_iter().map(Booking::try_from).collect()
        }
        .boxed()
    }

    fn get_booking<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Booking>> {
        async move {
            let row = sqlx::query_as::<_, BookingRow>(&format!(
                "SELECT {} FROM bookings WHERE id = $1",
                BOOKING_COLUMNS
            ))
            .bind(id)
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Booking {}", id)))?;

            Booking::try_from(row)
        }
        .boxed()
    }

    fn create_booking<'a>(&'a self, booking: &'a NewBooking) -> BoxFuture<'a, StoreResult<Booking>> {
        async move {
            let (booking_type, team_size) = mode_columns(&booking.mode);
            let row = sqlx::query_as::<_, BookingRow>(&format!(
                "INSERT INTO bookings (id, user_id, date, venue, building, floor, booking_type, team_size, seats, team_members)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                 RETURNING {}",
                BOOKING_COLUMNS
            ))
            .bind(Uuid::new_v4().to_string())
            .bind(&booking.user)
            .bind(booking.date)
            .bind(&booking.venue)
            .bind(&booking.building)
            .bind(&booking.floor)
            .bind(booking_type)
            .bind(team_size)
            .bind(seat_column(booking))
            .bind(Json(&booking.team_members))
            .fetch_one(&self.db.pool)
            .await?;

            Booking::try_from(row)
        }
        .boxed()
    }

    fn update_booking<'a>(&'a self, id: &'a str, booking: &'a NewBooking) -> BoxFuture<'a, StoreResult<Booking>> {
        async move {
            let (booking_type, team_size) = mode_columns(&booking.mode);
            let row = sqlx::query_as::<_, BookingRow>(&format!(
                "UPDATE bookings
                 SET date = $2, venue = $3, building = $4, floor = $5, booking_type = $6,
                     team_size = $7, seats = $8, team_members = $9, updated_at = NOW()
                 WHERE id = $1
                 RETURNING {}",
                BOOKING_COLUMNS
            ))
            .bind(id)
            .bind(booking.date)
            .bind(&booking.venue)
            .bind(&booking.building)
            .bind(&booking.floor)
            .bind(booking_type)
            .bind(team_size)
            .bind(seat_column(booking))
            .bind(Json(&booking.team_members))
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Booking {}", id)))?;

            Booking::try_from(row)
        }
        .boxed()
    }

    fn delete_booking<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<()>> {
        async move {
            let deleted = sqlx::query("DELETE FROM bookings WHERE id = $1")
                .bind(id)
                .execute(&self.db.pool)
                .await?
                .rows_affected();

            if deleted == 0 {
                return Err(StoreError::NotFound(format!("Booking {}", id)));
            }
            Ok(())
        }
        .boxed()
    }
}

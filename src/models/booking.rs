use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::models::SeatId;
use crate::services::selection::BookingMode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TeamMember {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Email is not valid"))]
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedSeat {
    pub id: SeatId,
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Booking requires exactly {required} seat(s), got {actual}")]
    SeatCount { required: usize, actual: usize },
    #[error("Seat {0} is listed more than once")]
    DuplicateSeat(SeatId),
    #[error("Please enter details for exactly {expected} team members, got {actual}")]
    RosterSize { expected: usize, actual: usize },
    #[error("Team member {index} is invalid: {errors}")]
    InvalidMember { index: usize, errors: ValidationErrors },
}

/// Бронь до сохранения в хранилище.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub user: String,
    pub date: NaiveDate,
    pub venue: String,
    pub building: String,
    pub floor: String,
    #[serde(flatten)]
    pub mode: BookingMode,
    pub seats: Vec<BookedSeat>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub team_members: Vec<TeamMember>,
}

impl NewBooking {
    pub fn seat_ids(&self) -> Vec<SeatId> {
        self.seats.iter().map(|seat| seat.id).collect()
    }

    /// Проверка формы брони без справочника: количество мест и состав команды.
    pub fn validate_shape(&self) -> Result<(), BookingError> {
        let required = self.mode.required_count();
        if self.seats.len() != required {
            return Err(BookingError::SeatCount { required, actual: self.seats.len() });
        }

        let mut seen = HashSet::new();
        for seat in &self.seats {
            if !seen.insert(seat.id) {
                return Err(BookingError::DuplicateSeat(seat.id));
            }
        }

        let expected = if self.mode.is_team() { required } else { 0 };
        validate_roster(&self.team_members, expected)
    }
}

/// Состав команды: ровно `expected` участников с непустым именем и корректным email.
pub fn validate_roster(members: &[TeamMember], expected: usize) -> Result<(), BookingError> {
    if members.len() != expected {
        return Err(BookingError::RosterSize { expected, actual: members.len() });
    }
    for (index, member) in members.iter().enumerate() {
        member
            .validate()
            .map_err(|errors| BookingError::InvalidMember { index: index + 1, errors })?;
    }
    Ok(())
}

/// Сохранённая бронь.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub record: NewBooking,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;

    fn team_booking(seats: &[SeatId], members: Vec<TeamMember>) -> NewBooking {
        NewBooking {
            user: "u-1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 7, 15).unwrap(),
            venue: "Branch Office".to_string(),
            building: "C".to_string(),
            floor: "2".to_string(),
            mode: BookingMode::Team { target_count: NonZeroU32::new(2).unwrap() },
            seats: seats.iter().map(|&id| BookedSeat { id }).collect(),
            team_members: members,
        }
    }

    fn member(name: &str, email: &str) -> TeamMember {
        TeamMember { name: name.to_string(), email: email.to_string() }
    }

    #[test]
    fn wire_shape_matches_booking_resource() {
        let booking = Booking {
            id: "b-2".to_string(),
            record: team_booking(
                &[5, 6],
                vec![member("John Doe", "john@example.com"), member("Jane Smith", "jane@example.com")],
            ),
        };

        let json = serde_json::to_value(&booking).unwrap();
        assert_eq!(json["bookingType"], "team");
        assert_eq!(json["numberOfTeamMembers"], 2);
        assert_eq!(json["seats"], serde_json::json!([{"id": 5}, {"id": 6}]));
        assert_eq!(json["teamMembers"][1]["email"], "jane@example.com");
        assert_eq!(json["date"], "2025-07-15");

        let back: Booking = serde_json::from_value(json).unwrap();
        assert_eq!(back, booking);
    }

    #[test]
    fn accepts_mongo_style_id() {
        let booking: Booking = serde_json::from_value(serde_json::json!({
            "_id": "64b0c0ffee",
            "user": "u-1",
            "date": "2025-07-10",
            "venue": "Main Office",
            "building": "A",
            "floor": "3",
            "bookingType": "self",
            "seats": [{"id": 12}]
        }))
        .unwrap();

        assert_eq!(booking.id, "64b0c0ffee");
        assert_eq!(booking.record.mode, BookingMode::Solo);
        assert!(booking.record.team_members.is_empty());
    }

    #[test]
    fn shape_checks() {
        let ok = team_booking(&[5, 6], vec![member("A", "a@example.com"), member("B", "b@example.com")]);
        assert!(ok.validate_shape().is_ok());

        let short = team_booking(&[5], vec![]);
        assert!(matches!(short.validate_shape(), Err(BookingError::SeatCount { required: 2, actual: 1 })));

        let dup = team_booking(&[5, 5], vec![]);
        assert!(matches!(dup.validate_shape(), Err(BookingError::DuplicateSeat(5))));

        let no_roster = team_booking(&[5, 6], vec![member("A", "a@example.com")]);
        assert!(matches!(no_roster.validate_shape(), Err(BookingError::RosterSize { expected: 2, actual: 1 })));

        let bad_email = team_booking(&[5, 6], vec![member("A", "a@example.com"), member("B", "not-an-email")]);
        assert!(matches!(bad_email.validate_shape(), Err(BookingError::InvalidMember { index: 2, .. })));
    }
}

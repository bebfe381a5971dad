//! selection.rs
//!
//! Движок выбора мест: набор выбранных мест для одной бронируемой заявки.
//!
//! - `Solo` режим: не больше одного места, новый клик заменяет предыдущий выбор.
//! - `Team` режим: не больше `target_count` мест, лишний клик отклоняется
//!   с `CapacityExceeded`, снятие выбора разрешено всегда.
//! - Забронированные места никогда не попадают в набор.
//! - Подтверждение (`validate_for_confirm`) только проверяет точное количество
//!   и не меняет состояние.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::num::NonZeroU32;
use thiserror::Error;

use crate::models::{Floor, SeatId};

/// Режим бронирования: для себя или для команды из `target_count` человек.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "bookingType")]
pub enum BookingMode {
    #[serde(rename = "self")]
    Solo,
    #[serde(rename = "team")]
    Team {
        #[serde(rename = "numberOfTeamMembers")]
        target_count: NonZeroU32,
    },
}

impl BookingMode {
    /// Точное количество мест, которое нужно выбрать для подтверждения.
    pub fn required_count(&self) -> usize {
        match self {
            BookingMode::Solo => 1,
            BookingMode::Team { target_count } => target_count.get() as usize,
        }
    }

    pub fn is_team(&self) -> bool {
        matches!(self, BookingMode::Team { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Seat {0} does not exist on this floor.")]
    UnknownSeat(SeatId),
    #[error("You can select a maximum of {limit} seats for your team.")]
    CapacityExceeded { limit: usize },
    #[error("{}", wrong_count_message(.required, .team))]
    WrongCount {
        required: usize,
        actual: usize,
        team: bool,
    },
}

fn wrong_count_message(required: &usize, team: &bool) -> String {
    if *team {
        format!("Please select exactly {} seats for team booking.", required)
    } else {
        "Please select exactly one seat for self-booking.".to_string()
    }
}

/// Результат успешного клика по месту.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToggleOutcome {
    Selected,
    Deselected,
    /// Solo: новое место вытеснило предыдущее.
    Replaced { previous: SeatId },
    /// Клик по занятому месту.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    mode: BookingMode,
    seats: BTreeSet<SeatId>,
}

impl SelectionState {
    /// Создает выбор для нового заказа. При редактировании `previously_selected`
    /// пересекается со свободными местами этажа, несуществующие id отбрасываются.
    /// Если мест больше, чем позволяет режим, остаются наименьшие id.
    pub fn init(mode: BookingMode, floor: &Floor, previously_selected: Option<&[SeatId]>) -> Self {
        let seats = previously_selected
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(|id| floor.seat(*id).is_some_and(|seat| !seat.booked))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .take(mode.required_count())
            .collect();
        Self { mode, seats }
    }

    pub fn mode(&self) -> BookingMode {
        self.mode
    }

    pub fn seats(&self) -> &BTreeSet<SeatId> {
        &self.seats
    }

    pub fn seat_ids(&self) -> Vec<SeatId> {
        self.seats.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn contains(&self, seat_id: SeatId) -> bool {
        self.seats.contains(&seat_id)
    }

    /// Обработка одного клика по месту. При ошибке состояние не меняется.
    pub fn toggle(&mut self, seat_id: SeatId, floor: &Floor) -> Result<ToggleOutcome, SelectionError> {
        let seat = floor.seat(seat_id).ok_or(SelectionError::UnknownSeat(seat_id))?;
        if seat.booked {
            return Ok(ToggleOutcome::Ignored);
        }

        if self.seats.remove(&seat_id) {
            return Ok(ToggleOutcome::Deselected);
        }

        match self.mode {
            BookingMode::Solo => {
                let previous = self.seats.iter().next().copied();
                self.seats.clear();
                self.seats.insert(seat_id);
                Ok(match previous {
                    Some(previous) => ToggleOutcome::Replaced { previous },
                    None => ToggleOutcome::Selected,
                })
            }
            BookingMode::Team { target_count } => {
                let limit = target_count.get() as usize;
                if self.seats.len() >= limit {
                    return Err(SelectionError::CapacityExceeded { limit });
                }
                self.seats.insert(seat_id);
                Ok(ToggleOutcome::Selected)
            }
        }
    }

    pub fn validate_for_confirm(&self) -> Result<(), SelectionError> {
        let required = self.mode.required_count();
        if self.seats.len() == required {
            Ok(())
        } else {
            Err(SelectionError::WrongCount {
                required,
                actual: self.seats.len(),
                team: self.mode.is_team(),
            })
        }
    }
}

/// Как отрисовать кнопку места.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatAppearance {
    Unavailable,
    Chosen,
    Available,
}

impl SeatAppearance {
    pub fn of(booked: bool, selected: bool) -> Self {
        if booked {
            SeatAppearance::Unavailable
        } else if selected {
            SeatAppearance::Chosen
        } else {
            SeatAppearance::Available
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Seat;

    fn floor(seats: &[(SeatId, bool)]) -> Floor {
        Floor {
            number: "1".to_string(),
            seats: seats.iter().map(|&(id, booked)| Seat { id, booked }).collect(),
        }
    }

    fn team(n: u32) -> BookingMode {
        BookingMode::Team { target_count: NonZeroU32::new(n).unwrap() }
    }

    #[test]
    fn solo_happy_path() {
        let floor = floor(&[(1, false), (2, true)]);
        let mut state = SelectionState::init(BookingMode::Solo, &floor, None);

        assert_eq!(state.toggle(1, &floor), Ok(ToggleOutcome::Selected));
        assert_eq!(state.toggle(2, &floor), Ok(ToggleOutcome::Ignored));
        assert_eq!(state.seat_ids(), vec![1]);
        assert!(state.validate_for_confirm().is_ok());
    }

    #[test]
    fn solo_deselect_blocks_confirm() {
        let floor = floor(&[(1, false), (2, true)]);
        let mut state = SelectionState::init(BookingMode::Solo, &floor, Some(&[1]));

        assert_eq!(state.toggle(1, &floor), Ok(ToggleOutcome::Deselected));
        assert!(state.is_empty());

        let err = state.validate_for_confirm().unwrap_err();
        assert_eq!(err, SelectionError::WrongCount { required: 1, actual: 0, team: false });
        assert_eq!(err.to_string(), "Please select exactly one seat for self-booking.");
    }

    #[test]
    fn solo_new_seat_replaces_previous() {
        let floor = floor(&[(1, false), (2, false)]);
        let mut state = SelectionState::init(BookingMode::Solo, &floor, None);

        state.toggle(1, &floor).unwrap();
        assert_eq!(state.toggle(2, &floor), Ok(ToggleOutcome::Replaced { previous: 1 }));
        assert_eq!(state.seat_ids(), vec![2]);
    }

    #[test]
    fn team_capacity_is_enforced() {
        let floor = floor(&[(1, false), (3, false), (5, false)]);
        let mut state = SelectionState::init(team(2), &floor, None);

        state.toggle(1, &floor).unwrap();
        state.toggle(3, &floor).unwrap();
        let err = state.toggle(5, &floor).unwrap_err();

        assert_eq!(err, SelectionError::CapacityExceeded { limit: 2 });
        assert_eq!(err.to_string(), "You can select a maximum of 2 seats for your team.");
        assert_eq!(state.seat_ids(), vec![1, 3]);
        assert!(state.validate_for_confirm().is_ok());
    }

    #[test]
    fn team_of_one_rejects_second_seat() {
        let floor = floor(&[(1, false), (2, false)]);
        let mut state = SelectionState::init(team(1), &floor, None);

        state.toggle(1, &floor).unwrap();
        assert!(matches!(state.toggle(2, &floor), Err(SelectionError::CapacityExceeded { limit: 1 })));
        assert!(!state.contains(2));
    }

    #[test]
    fn team_wrong_count_names_required_count() {
        let floor = floor(&[(1, false), (2, false), (3, false)]);
        let mut state = SelectionState::init(team(3), &floor, None);
        state.toggle(1, &floor).unwrap();

        let err = state.validate_for_confirm().unwrap_err();
        assert_eq!(err.to_string(), "Please select exactly 3 seats for team booking.");
    }

    #[test]
    fn unknown_seat_leaves_state_untouched() {
        let floor = floor(&[(1, false)]);
        let mut state = SelectionState::init(BookingMode::Solo, &floor, Some(&[1]));

        assert_eq!(state.toggle(42, &floor), Err(SelectionError::UnknownSeat(42)));
        assert_eq!(state.seat_ids(), vec![1]);
    }

    #[test]
    fn seeding_drops_stale_and_booked_ids() {
        let floor = floor(&[(1, false), (2, true), (3, false)]);

        let state = SelectionState::init(BookingMode::Solo, &floor, Some(&[9]));
        assert!(state.is_empty());

        let state = SelectionState::init(team(3), &floor, Some(&[2, 3, 9, 1, 3]));
        assert_eq!(state.seat_ids(), vec![1, 3]);
    }

    #[test]
    fn seeding_is_capped_by_mode() {
        let floor = floor(&[(1, false), (2, false), (3, false)]);
        let state = SelectionState::init(BookingMode::Solo, &floor, Some(&[3, 1, 2]));
        assert_eq!(state.seat_ids(), vec![1]);

        let state = SelectionState::init(team(2), &floor, Some(&[3, 2, 1]));
        assert_eq!(state.seat_ids(), vec![1, 2]);
    }

    #[test]
    fn appearance_mapping() {
        assert_eq!(SeatAppearance::of(true, true), SeatAppearance::Unavailable);
        assert_eq!(SeatAppearance::of(true, false), SeatAppearance::Unavailable);
        assert_eq!(SeatAppearance::of(false, true), SeatAppearance::Chosen);
        assert_eq!(SeatAppearance::of(false, false), SeatAppearance::Available);
    }

    #[test]
    fn mode_wire_format() {
        let json = serde_json::to_value(team(2)).unwrap();
        assert_eq!(json, serde_json::json!({"bookingType": "team", "numberOfTeamMembers": 2}));

        let solo: BookingMode = serde_json::from_value(serde_json::json!({"bookingType": "self"})).unwrap();
        assert_eq!(solo, BookingMode::Solo);

        let zero = serde_json::from_value::<BookingMode>(
            serde_json::json!({"bookingType": "team", "numberOfTeamMembers": 0}),
        );
        assert!(zero.is_err());
    }
}

//! flow.rs
//!
//! Черновик бронирования и переходы между экранами:
//! SeatSelection -> (TeamMemberDetails) -> Confirmation -> Payment -> Completed.
//!
//! Черновик это обычное значение: контроллер загружает его из кеша,
//! применяет одну операцию и сохраняет обратно. Глобального "текущего
//! бронирования" нет.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::{CatalogError, VenueCatalog};
use crate::models::{
    booking::validate_roster, BookedSeat, Booking, BookingError, Floor, NewBooking, SeatId, TeamMember,
};
use crate::services::selection::{
    BookingMode, SeatAppearance, SelectionError, SelectionState, ToggleOutcome,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    pub date: NaiveDate,
    pub venue: String,
    pub building: String,
    pub floor: String,
    #[serde(flatten)]
    pub mode: BookingMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    SeatSelection,
    TeamMemberDetails,
    Confirmation,
    Payment,
    Completed,
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error("Action is not available at step {actual:?}, expected {expected:?}")]
    WrongStep { expected: FlowStep, actual: FlowStep },
    #[error("Team member details are only collected for team bookings")]
    NotTeamBooking,
    #[error("Seat {0} is not available on this floor")]
    SeatUnavailable(SeatId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub id: Uuid,
    /// Заполнен при редактировании существующей брони.
    pub booking_id: Option<String>,
    pub details: BookingDetails,
    pub step: FlowStep,
    pub selection: SelectionState,
    pub team_members: Vec<TeamMember>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatView {
    pub id: SeatId,
    pub booked: bool,
    pub selected: bool,
    pub appearance: SeatAppearance,
}

/// Данные для экрана подтверждения.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSummary {
    pub draft_id: Uuid,
    pub is_update: bool,
    #[serde(flatten)]
    pub details: BookingDetails,
    pub seats: Vec<BookedSeat>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub team_members: Vec<TeamMember>,
    pub step: FlowStep,
}

impl BookingDraft {
    pub fn start(details: BookingDetails, catalog: &VenueCatalog) -> Result<Self, FlowError> {
        let floor = resolve(catalog, &details)?;
        let selection = SelectionState::init(details.mode, floor, None);
        Ok(Self {
            id: Uuid::new_v4(),
            booking_id: None,
            details,
            step: FlowStep::SeatSelection,
            selection,
            team_members: Vec::new(),
        })
    }

    /// Черновик для изменения сохранённой брони. Места, которых больше нет
    /// на этаже или которые заняты, молча отбрасываются.
    pub fn edit(booking: &Booking, catalog: &VenueCatalog) -> Result<Self, FlowError> {
        let record = &booking.record;
        let details = BookingDetails {
            date: record.date,
            venue: record.venue.clone(),
            building: record.building.clone(),
            floor: record.floor.clone(),
            mode: record.mode,
        };
        let floor = resolve(catalog, &details)?;
        let selection = SelectionState::init(details.mode, floor, Some(record.seat_ids().as_slice()));
        Ok(Self {
            id: Uuid::new_v4(),
            booking_id: Some(booking.id.clone()),
            details,
            step: FlowStep::SeatSelection,
            selection,
            team_members: record.team_members.clone(),
        })
    }

    pub fn is_update(&self) -> bool {
        self.booking_id.is_some()
    }

    /// Возврат к деталям бронирования. Текущий выбор пересаживается на новый этаж.
    pub fn revise_details(&mut self, details: BookingDetails, catalog: &VenueCatalog) -> Result<(), FlowError> {
        if matches!(self.step, FlowStep::Payment | FlowStep::Completed) {
            return Err(FlowError::WrongStep { expected: FlowStep::SeatSelection, actual: self.step });
        }
        let floor = resolve(catalog, &details)?;
        let selection = SelectionState::init(details.mode, floor, Some(self.selection.seat_ids().as_slice()));
        if details.mode != self.details.mode {
            self.team_members.clear();
        }
        self.details = details;
        self.selection = selection;
        self.step = FlowStep::SeatSelection;
        Ok(())
    }

    pub fn toggle_seat(&mut self, seat_id: SeatId, catalog: &VenueCatalog) -> Result<ToggleOutcome, FlowError> {
        self.expect_step(FlowStep::SeatSelection)?;
        let floor = resolve(catalog, &self.details)?;
        Ok(self.selection.toggle(seat_id, floor)?)
    }

    pub fn seat_map(&self, catalog: &VenueCatalog) -> Result<Vec<SeatView>, FlowError> {
        let floor = resolve(catalog, &self.details)?;
        Ok(floor
            .seats
            .iter()
            .map(|seat| {
                let selected = self.selection.contains(seat.id);
                SeatView {
                    id: seat.id,
                    booked: seat.booked,
                    selected,
                    appearance: SeatAppearance::of(seat.booked, selected),
                }
            })
            .collect())
    }

    /// Кнопка "Confirm Booking" на экране выбора мест.
    pub fn confirm_seats(&mut self) -> Result<FlowStep, FlowError> {
        self.expect_step(FlowStep::SeatSelection)?;
        self.selection.validate_for_confirm()?;
        self.step = if self.details.mode.is_team() {
            FlowStep::TeamMemberDetails
        } else {
            FlowStep::Confirmation
        };
        Ok(self.step)
    }

    pub fn set_team_members(&mut self, members: Vec<TeamMember>) -> Result<(), FlowError> {
        if !self.details.mode.is_team() {
            return Err(FlowError::NotTeamBooking);
        }
        self.expect_step(FlowStep::TeamMemberDetails)?;
        validate_roster(&members, self.details.mode.required_count())?;
        self.team_members = members;
        self.step = FlowStep::Confirmation;
        Ok(())
    }

    pub fn summary(&self) -> DraftSummary {
        DraftSummary {
            draft_id: self.id,
            is_update: self.is_update(),
            details: self.details.clone(),
            seats: self.booked_seats(),
            team_members: self.team_members.clone(),
            step: self.step,
        }
    }

    pub fn to_booking_payload(&self, user_id: &str) -> Result<NewBooking, FlowError> {
        self.expect_step(FlowStep::Confirmation)?;
        let booking = NewBooking {
            user: user_id.to_string(),
            date: self.details.date,
            venue: self.details.venue.clone(),
            building: self.details.building.clone(),
            floor: self.details.floor.clone(),
            mode: self.details.mode,
            seats: self.booked_seats(),
            team_members: if self.details.mode.is_team() { self.team_members.clone() } else { Vec::new() },
        };
        booking.validate_shape()?;
        Ok(booking)
    }

    pub fn mark_submitted(&mut self, booking_id: String) -> Result<(), FlowError> {
        self.expect_step(FlowStep::Confirmation)?;
        self.booking_id = Some(booking_id);
        self.step = FlowStep::Payment;
        Ok(())
    }

    /// Оплата пока заглушка: просто закрываем черновик.
    pub fn complete_payment(&mut self) -> Result<(), FlowError> {
        self.expect_step(FlowStep::Payment)?;
        self.step = FlowStep::Completed;
        Ok(())
    }

    fn booked_seats(&self) -> Vec<BookedSeat> {
        self.selection.seats().iter().map(|&id| BookedSeat { id }).collect()
    }

    fn expect_step(&self, expected: FlowStep) -> Result<(), FlowError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(FlowError::WrongStep { expected, actual: self.step })
        }
    }
}

fn resolve<'a>(catalog: &'a VenueCatalog, details: &BookingDetails) -> Result<&'a Floor, CatalogError> {
    catalog.resolve(&details.venue, &details.building, &details.floor)
}

/// Проверка брони, пришедшей напрямую через API: форма и наличие свободных мест на этаже.
pub fn validate_booking(booking: &NewBooking, catalog: &VenueCatalog) -> Result<(), FlowError> {
    booking.validate_shape()?;
    let floor = catalog.resolve(&booking.venue, &booking.building, &booking.floor)?;
    let requested = booking.seat_ids();
    let selection = SelectionState::init(booking.mode, floor, Some(requested.as_slice()));
    if let Some(missing) = requested.iter().find(|id| !selection.contains(**id)) {
        return Err(FlowError::SeatUnavailable(*missing));
    }
    Ok(())
}

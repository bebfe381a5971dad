use serde::{Deserialize, Serialize};

/// Номер места, уникален в пределах этажа.
pub type SeatId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub id: SeatId,
    #[serde(default)]
    pub booked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Floor {
    pub number: String,
    pub seats: Vec<Seat>,
}

impl Floor {
    pub fn seat(&self, id: SeatId) -> Option<&Seat> {
        self.seats.iter().find(|seat| seat.id == id)
    }

    pub fn free_seats(&self) -> usize {
        self.seats.iter().filter(|seat| !seat.booked).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub name: String,
    pub floors: Vec<Floor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    #[serde(rename = "venue")]
    pub name: String,
    pub buildings: Vec<Building>,
}

use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::models::{Building, Floor, Seat, Venue};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Venue '{0}' not found")]
    UnknownVenue(String),
    #[error("Building '{building}' not found in venue '{venue}'")]
    UnknownBuilding { venue: String, building: String },
    #[error("Floor '{floor}' not found in building '{building}'")]
    UnknownFloor { building: String, floor: String },
    #[error("Duplicate {kind} '{name}' in catalog")]
    Duplicate { kind: &'static str, name: String },
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Справочник площадок: venue -> building -> floor -> seat.
/// Только для чтения, разделяется через `Arc`.
#[derive(Debug, Clone)]
pub struct VenueCatalog {
    venues: Vec<Venue>,
}

// Краткая сводка для списка площадок
#[derive(Debug, Serialize)]
pub struct VenueSummary {
    pub venue: String,
    pub buildings: Vec<BuildingSummary>,
}

#[derive(Debug, Serialize)]
pub struct BuildingSummary {
    pub name: String,
    pub floors: Vec<FloorSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorSummary {
    pub number: String,
    pub total_seats: usize,
    pub free_seats: usize,
}

impl VenueCatalog {
    pub fn new(venues: Vec<Venue>) -> Result<Self, CatalogError> {
        let catalog = Self { venues };
        catalog.check_unique()?;
        Ok(catalog)
    }

    /// Загрузить из JSON файла, либо встроенный справочник если путь не задан.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        let catalog = match path {
            Some(path) => {
                let data = std::fs::read_to_string(path)?;
                let venues: Vec<Venue> = serde_json::from_str(&data)?;
                info!("Loaded venue catalog from {}", path.display());
                Self::new(venues)?
            }
            None => {
                info!("Using built-in venue catalog");
                Self::builtin()
            }
        };
        Ok(catalog)
    }

    /// Встроенный справочник. Каждое пятое место считается занятым.
    pub fn builtin() -> Self {
        let floor = |number: &str, seats: u32| Floor {
            number: number.to_string(),
            seats: (1..=seats).map(|id| Seat { id, booked: id % 5 == 0 }).collect(),
        };

        Self {
            venues: vec![
                Venue {
                    name: "Main Office".to_string(),
                    buildings: vec![
                        Building {
                            name: "A".to_string(),
                            floors: vec![floor("1", 30), floor("2", 40), floor("3", 25)],
                        },
                        Building {
                            name: "B".to_string(),
                            floors: vec![floor("1", 35), floor("2", 45), floor("3", 20), floor("4", 50)],
                        },
                    ],
                },
                Venue {
                    name: "Branch Office".to_string(),
                    buildings: vec![Building {
                        name: "C".to_string(),
                        floors: vec![floor("1", 15), floor("2", 20)],
                    }],
                },
            ],
        }
    }

    pub fn venues(&self) -> &[Venue] {
        &self.venues
    }

    pub fn resolve(&self, venue: &str, building: &str, floor: &str) -> Result<&Floor, CatalogError> {
        let found_venue = self
            .venues
            .iter()
            .find(|v| v.name == venue)
            .ok_or_else(|| CatalogError::UnknownVenue(venue.to_string()))?;

        let found_building = found_venue
            .buildings
            .iter()
            .find(|b| b.name == building)
            .ok_or_else(|| CatalogError::UnknownBuilding {
                venue: venue.to_string(),
                building: building.to_string(),
            })?;

        found_building
            .floors
            .iter()
            .find(|f| f.number == floor)
            .ok_or_else(|| CatalogError::UnknownFloor {
                building: building.to_string(),
                floor: floor.to_string(),
            })
    }

    pub fn summary(&self) -> Vec<VenueSummary> {
        self.venues
            .iter()
            .map(|v| VenueSummary {
                venue: v.name.clone(),
                buildings: v
                    .buildings
                    .iter()
                    .map(|b| BuildingSummary {
                        name: b.name.clone(),
                        floors: b
                            .floors
                            .iter()
                            .map(|f| FloorSummary {
                                number: f.number.clone(),
                                total_seats: f.seats.len(),
                                free_seats: f.free_seats(),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect()
    }

    fn check_unique(&self) -> Result<(), CatalogError> {
        unique("venue", self.venues.iter().map(|v| v.name.clone()))?;
        for venue in &self.venues {
            unique("building", venue.buildings.iter().map(|b| format!("{}/{}", venue.name, b.name)))?;
            for building in &venue.buildings {
                unique(
                    "floor",
                    building.floors.iter().map(|f| format!("{}/{}/{}", venue.name, building.name, f.number)),
                )?;
                for floor in &building.floors {
                    unique(
                        "seat",
                        floor.seats.iter().map(|s| {
                            format!("{}/{}/{}/{}", venue.name, building.name, floor.number, s.id)
                        }),
                    )?;
                }
            }
        }
        Ok(())
    }
}

fn unique(kind: &'static str, names: impl Iterator<Item = String>) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.clone()) {
            return Err(CatalogError::Duplicate { kind, name });
        }
    }
    Ok(())
}

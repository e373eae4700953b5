//! Driver registry
//!
//! Maps numeric car indices to the driver occupying that car. The registry is owned by
//! whatever tracks the race's participants; the flattener only reads it.

use serde::{Deserialize, Serialize};

/// A registered driver.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "PascalCase")]
pub struct Driver {
    /// Driver name as shown in timing screens
    pub name: String,
    /// Team name
    pub team: String,
}

impl Driver {
    pub fn new(name: impl Into<String>, team: impl Into<String>) -> Self {
        Self { name: name.into(), team: team.into() }
    }
}

/// Drivers indexed by car index.
///
/// Indices at or beyond [`len`](Self::len) have no registered driver; extractors skip
/// them, which tolerates a driver list that is still being populated.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(transparent)]
pub struct DriverRegistry {
    drivers: Vec<Driver>,
}

impl DriverRegistry {
    pub fn new(drivers: Vec<Driver>) -> Self {
        Self { drivers }
    }

    /// Driver registered for a car index.
    pub fn get(&self, car_index: usize) -> Option<&Driver> {
        self.drivers.get(car_index)
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Driver)> {
        self.drivers.iter().enumerate()
    }
}

impl FromIterator<Driver> for DriverRegistry {
    fn from_iter<I: IntoIterator<Item = Driver>>(iter: I) -> Self {
        Self { drivers: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_beyond_bounds_are_none() {
        let registry: DriverRegistry =
            [Driver::new("HAMILTON", "Mercedes"), Driver::new("VERSTAPPEN", "Red Bull Racing")]
                .into_iter()
                .collect();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(1).map(|d| d.team.as_str()), Some("Red Bull Racing"));
        assert!(registry.get(2).is_none());
        assert!(registry.get(21).is_none());
    }
}

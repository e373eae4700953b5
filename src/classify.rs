//! Packet shape classification.
//!
//! Maps a packet's declared type name to its [`PacketKind`] and the extraction
//! [`Strategy`] that flattens it. Classification is a pure function of the type name.

use serde::{Deserialize, Serialize};

use crate::{IngestError, Result};

/// Packet kinds the flattener understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum PacketKind {
    CarSetups,
    Motion,
    CarDamage,
    CarTelemetry,
    CarStatus,
    LapData,
    Session,
    SessionHistory,
}

/// Extraction strategy selected for a packet kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Scalars, corner arrays and one per-driver list (car-telemetry family)
    CarArray,
    /// Per-driver lap-state records
    LapData,
    /// Session-wide scalars and named record lists
    Session,
    /// One driver's historical lap records
    SessionHistory,
}

impl PacketKind {
    pub const ALL: [PacketKind; 8] = [
        PacketKind::CarSetups,
        PacketKind::Motion,
        PacketKind::CarDamage,
        PacketKind::CarTelemetry,
        PacketKind::CarStatus,
        PacketKind::LapData,
        PacketKind::Session,
        PacketKind::SessionHistory,
    ];

    /// Classify a declared packet type name.
    pub fn from_type_name(type_name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name() == type_name)
            .ok_or_else(|| IngestError::unrecognized(type_name))
    }

    /// Canonical type name emitted by the packet decoder.
    pub const fn type_name(&self) -> &'static str {
        match self {
            PacketKind::CarSetups => "PacketCarSetupData",
            PacketKind::Motion => "PacketMotionData",
            PacketKind::CarDamage => "PacketCarDamageData",
            PacketKind::CarTelemetry => "PacketCarTelemetryData",
            PacketKind::CarStatus => "PacketCarStatusData",
            PacketKind::LapData => "PacketLapData",
            PacketKind::Session => "PacketSessionData",
            PacketKind::SessionHistory => "PacketSessionHistoryData",
        }
    }

    pub const fn strategy(&self) -> Strategy {
        match self {
            PacketKind::CarSetups
            | PacketKind::Motion
            | PacketKind::CarDamage
            | PacketKind::CarTelemetry
            | PacketKind::CarStatus => Strategy::CarArray,
            PacketKind::LapData => Strategy::LapData,
            PacketKind::Session => Strategy::Session,
            PacketKind::SessionHistory => Strategy::SessionHistory,
        }
    }
}

/// Select the extraction strategy for a declared packet type name.
pub fn classify(type_name: &str) -> Result<Strategy> {
    PacketKind::from_type_name(type_name).map(|kind| kind.strategy())
}

/// Derive the metric family (measurement) name from a packet type name by removing
/// the `Packet`, `Data` and `Car` tokens.
pub fn measurement_name(type_name: &str) -> String {
    type_name.replace("Packet", "").replace("Data", "").replace("Car", "")
}

#[cfg(test)]
mod tests {
    use super::{PacketKind, Strategy, classify, measurement_name};
    use crate::IngestError;
    use proptest::prelude::{prop_assert, prop_assert_eq, prop_assume, proptest};

    proptest! {
        #[test]
        fn prop_classification_is_idempotent(index in 0usize..8, repeats in 1usize..8) {
            let name = PacketKind::ALL[index].type_name();
            let first = PacketKind::from_type_name(name).unwrap();
            for _ in 0..repeats {
                let again = PacketKind::from_type_name(name).unwrap();
                prop_assert_eq!(again, first);
                prop_assert_eq!(again.strategy(), first.strategy());
            }
        }

        #[test]
        fn prop_unknown_names_are_rejected(name in "[A-Za-z]{0,30}") {
            prop_assume!(!PacketKind::ALL.iter().any(|k| k.type_name() == name));
            let is_unrecognized = matches!(
                PacketKind::from_type_name(&name),
                Err(IngestError::UnrecognizedPacketType { .. })
            );
            prop_assert!(is_unrecognized);
        }
    }

    #[test]
    fn car_family_uses_car_array_strategy() {
        for name in [
            "PacketCarSetupData",
            "PacketMotionData",
            "PacketCarDamageData",
            "PacketCarTelemetryData",
            "PacketCarStatusData",
        ] {
            let kind = PacketKind::from_type_name(name).unwrap();
            assert_eq!(kind.strategy(), Strategy::CarArray, "{name}");
        }
    }

    #[test]
    fn remaining_kinds_have_dedicated_strategies() {
        assert_eq!(PacketKind::LapData.strategy(), Strategy::LapData);
        assert_eq!(PacketKind::Session.strategy(), Strategy::Session);
        assert_eq!(PacketKind::SessionHistory.strategy(), Strategy::SessionHistory);
        assert_eq!(classify("PacketLapData").unwrap(), Strategy::LapData);
    }

    #[test]
    fn event_and_participant_packets_are_unrecognized() {
        assert!(PacketKind::from_type_name("PacketEventData").is_err());
        assert!(PacketKind::from_type_name("PacketParticipantsData").is_err());
    }

    #[test]
    fn measurement_names_strip_tokens() {
        assert_eq!(measurement_name("PacketCarTelemetryData"), "Telemetry");
        assert_eq!(measurement_name("PacketCarSetupData"), "Setup");
        assert_eq!(measurement_name("PacketMotionData"), "Motion");
        assert_eq!(measurement_name("PacketLapData"), "Lap");
        assert_eq!(measurement_name("PacketSessionHistoryData"), "SessionHistory");
        assert_eq!(measurement_name("test_laps"), "test_laps");
    }
}

//! TypeScript Generation Tests
//!
//! Validates that Lapflux types can be exported to TypeScript when the tauri feature is
//! enabled.

#[cfg(feature = "tauri")]
#[test]
fn test_core_types_implement_specta_type() {
    use specta::Type;

    // If this compiles, all types are properly configured for TypeScript export.
    fn assert_type<T: Type>() {}

    // Context types
    assert_type::<lapflux::RaceContext>();
    assert_type::<lapflux::Session>();
    assert_type::<lapflux::Driver>();
    assert_type::<lapflux::LapSnapshot>();

    // Output types
    assert_type::<lapflux::Point>();
    assert_type::<lapflux::TagValue>();
    assert_type::<lapflux::Scalar>();
    assert_type::<lapflux::DroppedField>();
    assert_type::<lapflux::LapValidFlags>();

    // Pipeline types
    assert_type::<lapflux::IngestStats>();
    assert_type::<lapflux::PipelineConfig>();
    assert_type::<lapflux::PacketKind>();
    assert_type::<lapflux::Pacing>();
}

#[cfg(not(feature = "tauri"))]
#[test]
fn test_tauri_feature_disabled() {
    // When tauri feature is disabled, types should still compile without specta::Type
    let _ = lapflux::Pacing::Unpaced;
}

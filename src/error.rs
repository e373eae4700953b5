//! Error types for packet ingestion.
//!
//! All errors implement the `std::error::Error` trait and carry structured context
//! for debugging and recovery guidance.
//!
//! ## Error Categories
//!
//! - **Classification Errors**: a packet type the flattener has no strategy for
//! - **Decode Errors**: structured records missing expected keys or holding wrong types
//! - **Schema Errors**: packet schema descriptors that cannot drive extraction
//! - **Source/Sink Errors**: failures of the collaborators around the core
//! - **File Errors**: problems reading capture or context files
//!
//! The flattening core performs no I/O, so none of its failures are transient.
//! Only source and sink failures report themselves as retryable:
//!
//! ```rust
//! use lapflux::IngestError;
//!
//! let error = IngestError::sink_failed("metrics database unavailable");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ingestion operations.
pub type Result<T, E = IngestError> = std::result::Result<T, E>;

/// Main error type for ingestion operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum IngestError {
    #[error("Unrecognized packet type '{packet_type}'")]
    UnrecognizedPacketType { packet_type: String },

    #[error("Field '{field}' not found in {context}")]
    FieldNotFound { field: String, context: String },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Type conversion error: {details}")]
    TypeConversion { details: String },

    #[error("Schema validation failed: {reason}")]
    SchemaValidation { reason: String },

    #[error("Capture file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Packet source failed: {reason}")]
    Source {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Point sink failed: {reason}")]
    Sink {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl IngestError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            IngestError::Source { .. } => true,
            IngestError::Sink { .. } => true,
            IngestError::UnrecognizedPacketType { .. } => false,
            IngestError::FieldNotFound { .. } => false,
            IngestError::Parse { .. } => false,
            IngestError::TypeConversion { .. } => false,
            IngestError::SchemaValidation { .. } => false,
            IngestError::File { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            IngestError::UnrecognizedPacketType { .. } => vec![
                "Filter packet types before they reach the flattener",
                "Check the packet type name matches the decoder output",
            ],
            IngestError::FieldNotFound { .. } => vec![
                "Check the decoder emits the expected packet layout",
                "Verify the game telemetry format version",
            ],
            IngestError::Parse { .. } => vec![
                "Check the structured record is a mapping of field names",
                "Verify source data integrity",
            ],
            IngestError::TypeConversion { .. } => vec![
                "Check lap numbers and car indices are non-negative integers",
                "Verify expected vs actual data types",
            ],
            IngestError::SchemaValidation { .. } => vec![
                "Declare at most one per-driver list per packet schema",
                "Declare the lap history field for session history packets",
            ],
            IngestError::File { .. } => vec![
                "Check file exists and is readable",
                "Verify the capture is a multi-document YAML stream",
                "Check file permissions",
            ],
            IngestError::Source { .. } => vec![
                "Check the upstream decoder is still running",
                "Retry once the packet feed is restored",
            ],
            IngestError::Sink { .. } => vec![
                "Check the time-series database is reachable",
                "Retry the write from the sink's own retry policy",
            ],
        }
    }

    /// Helper constructor for packet types without an extraction strategy.
    pub fn unrecognized(packet_type: impl Into<String>) -> Self {
        IngestError::UnrecognizedPacketType { packet_type: packet_type.into() }
    }

    /// Helper constructor for missing expected keys.
    pub fn field_not_found(field: impl Into<String>, context: impl Into<String>) -> Self {
        IngestError::FieldNotFound { field: field.into(), context: context.into() }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        IngestError::File { path, source }
    }

    /// Helper constructor for schema validation errors.
    pub fn schema_validation_error(reason: impl Into<String>) -> Self {
        IngestError::SchemaValidation { reason: reason.into() }
    }

    /// Helper constructor for source failures.
    pub fn source_failed(reason: impl Into<String>) -> Self {
        IngestError::Source { reason: reason.into(), source: None }
    }

    /// Helper constructor for sink failures.
    pub fn sink_failed(reason: impl Into<String>) -> Self {
        IngestError::Sink { reason: reason.into(), source: None }
    }

    /// Helper constructor for sink failures with source.
    pub fn sink_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        IngestError::Sink { reason: reason.into(), source: Some(source) }
    }
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
          #[test]
          fn error_messages_carry_their_context(
            packet_type in "[A-Za-z]{1,24}",
            field in "\\w+",
            context in "[a-z ]{1,20}",
            details in ".*"
          ) {
            let unrecognized = IngestError::unrecognized(packet_type.clone());
            prop_assert!(unrecognized.to_string().contains(&packet_type));

            let missing = IngestError::field_not_found(field.clone(), context.clone());
            let msg = missing.to_string();
            prop_assert!(msg.contains(&field));
            prop_assert!(msg.contains(&context));

            let conversion = IngestError::TypeConversion { details: details.clone() };
            prop_assert!(conversion.to_string().contains(&details));
          }

          #[test]
          fn sink_errors_preserve_their_source_chain(reason in ".*", base in ".*") {
            let err = IngestError::sink_failed_with_source(
                reason.clone(),
                Box::new(std::io::Error::other(base.clone())),
            );
            let source = std::error::Error::source(&err);
            prop_assert!(source.is_some());
            prop_assert!(source.unwrap().to_string().contains(&base));
            prop_assert!(err.to_string().contains(&reason));
          }
        }
    }

    #[test]
    fn only_collaborator_failures_are_retryable() {
        assert!(IngestError::source_failed("feed closed").is_retryable());
        assert!(IngestError::sink_failed("db down").is_retryable());
        assert!(!IngestError::unrecognized("PacketEventData").is_retryable());
        assert!(!IngestError::field_not_found("header", "packet").is_retryable());
        assert!(!IngestError::schema_validation_error("two lists").is_retryable());
    }

    #[test]
    fn every_variant_offers_suggestions() {
        let errors = [
            IngestError::unrecognized("PacketEventData"),
            IngestError::field_not_found("lap_time_in_ms", "lap history record"),
            IngestError::Parse { context: "header".into(), details: "not a mapping".into() },
            IngestError::TypeConversion { details: "lap -1".into() },
            IngestError::schema_validation_error("missing lap history"),
            IngestError::file_error(PathBuf::from("/tmp/x"), std::io::Error::other("gone")),
            IngestError::source_failed("closed"),
            IngestError::sink_failed("closed"),
        ];

        for error in &errors {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty(), "{error} has no suggestions");
            assert!(suggestions.iter().all(|s| s.len() > 5));
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<IngestError>();
    }

    #[test]
    fn io_errors_convert_to_file_errors() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "capture.yaml");
        let err: IngestError = io_err.into();

        match err {
            IngestError::File { source, .. } => assert_eq!(source.to_string(), "capture.yaml"),
            other => panic!("Expected File error variant, got {other:?}"),
        }
    }
}

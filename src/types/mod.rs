//! Core types for decoded telemetry packets.
//!
//! This module provides the data structures the flattener walks:
//!
//! - [`Scalar`] is a single numeric value passed through to points unchanged
//! - [`Corners`] holds a per-wheel quantity in [`Corner::ALL`] order
//! - [`FieldValue`] is the tagged sum over every field shape a packet can carry
//! - [`Record`] and [`Field`] keep field declaration order
//! - [`Packet`] is one decoded snapshot, [`RawPacket`] the structured record before decoding
//! - [`PacketSchema`] declares the field shapes of one packet kind
//!
//! ## Usage Example
//!
//! ```rust
//! use lapflux::types::{Corner, Corners, FieldValue, Packet, PacketHeader, Scalar};
//! use lapflux::PacketKind;
//!
//! let packet = Packet::new(PacketKind::Motion, PacketHeader::new(0))
//!     .with("wheel_slip", Corners::from([0.1, 0.2, 0.3, 0.4]))
//!     .with("g_force_lateral", Scalar::Float(1.7));
//!
//! match packet.get("wheel_slip") {
//!     Some(FieldValue::Corners(corners)) => {
//!         assert_eq!(corners.get(Corner::FrontLeft), Scalar::Float(0.3));
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

mod packet;
mod pacing;
mod record;
mod schema;
mod value;

// Re-export all public types
pub use packet::{Packet, PacketHeader, RawPacket};
pub use pacing::Pacing;
pub use record::{Field, Record};
pub use schema::{FieldShape, PacketSchema};
pub use value::{Corner, Corners, FieldValue, Scalar};

//! Common types and utilities for the ndnd forwarding daemon.
//!
//! This crate provides the pieces shared by the forwarding core, the
//! transport layer, and the command-line tools: names, the TLV codec,
//! packet types, face URIs, errors, and metric primitives.

pub mod error;
pub mod metrics;
pub mod name;
pub mod packet;
pub mod tlv;
pub mod uri;

/// Reexport of common types
pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Maximum size of an NDN packet on the wire.
pub const MAX_PACKET_SIZE: usize = 8800;

//! Error types for the ndnd forwarding daemon.

use thiserror::Error;

/// All possible errors that can occur within the ndnd libraries.
#[derive(Error, Debug)]
pub enum Error {
    /// Error related to TLV encoding/decoding.
    #[error("TLV error: {0}")]
    Tlv(String),

    /// Error related to NDN packet processing.
    #[error("packet error: {0}")]
    Packet(String),

    /// Error related to face URI parsing.
    #[error("face URI error: {0}")]
    Uri(String),

    /// Error related to a face or its transport.
    #[error("face error: {0}")]
    Face(String),

    /// A strategy name that is not installed was referenced.
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("other error: {0}")]
    Other(String),
}

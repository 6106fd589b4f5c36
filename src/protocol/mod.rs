//! Protocol definitions for the gateway LAN protocol.
//!
//! This module contains the wire-level pieces:
//! - Inbound message classification and report decoding
//! - Outbound command encoding
//! - Write-key derivation
//! - Device model identifiers

pub mod cipher;
pub mod command;
pub mod message;
pub mod model;

pub use cipher::{FALLBACK_KEY, IV, derive_key, write_key};
pub use command::Command;
pub use message::{Message, Report, ReportData, parse_message};
pub use model::DeviceModel;

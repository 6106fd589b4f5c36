//! Data types for gateway entities.
//!
//! This module contains the core data structures used throughout the library:
//! - Gateways and sub-devices
//! - Logical accessories and their keys
//! - Normalized readings and battery status

pub mod accessory;
pub mod device;
pub mod reading;

pub use accessory::{Accessory, AccessoryKey, AccessoryKind, Category};
pub use device::{Device, Gateway, PASSWORD_LEN, short_sid};
pub use reading::{Battery, Button, PressKind, Reading, ReadingValue};

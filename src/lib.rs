//! # mijia
//!
//! A Rust bridge for MiJia/Aqara gateways speaking the LAN UDP protocol.
//!
//! Gateways are discovered over multicast, their ZigBee devices enumerated,
//! and device reports decoded into normalized readings. Wall switches and
//! plugs can be controlled with encrypted write commands.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mijia::{Bridge, Config, Event};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mijia::Error> {
//!     let config = Config::from_toml_str(
//!         r#"
//!         sid = ["f0b429aa1463"]
//!         password = ["0123456789abcdef"]
//!         "#,
//!     )?;
//!     let (bridge, handle) = Bridge::bind(config)?;
//!
//!     let mut events = handle.subscribe(None);
//!     tokio::spawn(bridge.run_until(std::future::pending()));
//!
//!     while let Some(event) = events.recv().await {
//!         if let Event::Reading(reading) = event {
//!             println!("{}: {:?}", reading.key, reading.value);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`protocol`] - Wire messages, commands, write-key cipher, device models
//! - [`types`] - Gateways, devices, accessories, readings
//! - [`registry`] - In-memory gateway/device/accessory bookkeeping
//! - [`discovery`] - `whois` / `iam` / `get_id_list` handling
//! - [`parser`] - Per-model report decoding
//! - [`commander`] - Deduplicated, encrypted write commands
//! - [`sweeper`] - Eviction of silent accessories
//! - [`event`] - Broadcast events for the accessory directory
//! - [`transport`] - UDP transport
//! - [`engine`] - The [`Engine`] tying the above together
//! - [`bridge`] - Async run loop around the engine

pub mod bridge;
pub mod commander;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod event;
pub mod parser;
pub mod protocol;
pub mod registry;
pub mod sweeper;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use bridge::{Bridge, BridgeHandle};
pub use commander::{Commander, CommanderTable, SendOutcome, SwitchCommander};
pub use config::Config;
pub use discovery::Discovery;
pub use engine::Engine;
pub use error::{Error, Result};
pub use event::{Event, EventDispatcher, EventFilter, EventKind, Subscription};
pub use parser::{ParseContext, Parser, ParserKind};
pub use protocol::{Command, DeviceModel, Message, Report, ReportData, parse_message};
pub use registry::{EvictionPolicy, Registry};
pub use sweeper::Sweeper;
pub use transport::{RecordingTransport, Transport, UdpConfig, UdpTransport};
pub use types::{
    Accessory, AccessoryKey, AccessoryKind, Battery, Button, Category, Device, Gateway, PressKind,
    Reading, ReadingValue,
};

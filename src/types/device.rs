//! Gateway and sub-device records.

use std::net::SocketAddr;
use std::time::Instant;

use crate::protocol::DeviceModel;

/// Length of a gateway password (an AES-128 key).
pub const PASSWORD_LEN: usize = 16;

/// A gateway known to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gateway {
    /// Gateway sid.
    pub sid: String,
    /// Latest session token; replaced on every `get_id_list_ack` and heartbeat.
    pub token: Option<String>,
    /// Configured password, if any.
    pub password: Option<[u8; PASSWORD_LEN]>,
    /// Unicast address the gateway last answered from.
    pub addr: Option<SocketAddr>,
    /// Last time the gateway or one of its devices was heard from.
    pub last_seen: Option<Instant>,
}

impl Gateway {
    /// Creates an empty gateway record.
    #[must_use]
    pub fn new(sid: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            token: None,
            password: None,
            addr: None,
            last_seen: None,
        }
    }
}

/// A sub-device (sensor, switch, plug) behind a gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Device sid.
    pub sid: String,
    /// Owning gateway, once known.
    pub gateway_sid: Option<String>,
    /// Model from the latest report.
    pub model: Option<DeviceModel>,
    /// Latest reported battery voltage in millivolts.
    pub battery_mv: Option<u32>,
}

impl Device {
    /// Creates an empty device record.
    #[must_use]
    pub fn new(sid: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            gateway_sid: None,
            model: None,
            battery_mv: None,
        }
    }

    /// Last four characters of the sid, used as a short display name.
    #[must_use]
    pub fn short_sid(&self) -> &str {
        short_sid(&self.sid)
    }
}

/// Returns the last four characters of a sid.
#[must_use]
pub fn short_sid(sid: &str) -> &str {
    let start = sid
        .char_indices()
        .rev()
        .nth(3)
        .map_or(0, |(idx, _)| idx);
    &sid[start..]
}

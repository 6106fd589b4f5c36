//! Gateway discovery and device enumeration.
//!
//! ```text
//! bridge  -- whois (multicast) -------------->  gateway
//! bridge  <-------------------------- iam  --  gateway
//! bridge  -- get_id_list (unicast) ---------->  gateway
//! bridge  <-------------- get_id_list_ack  --  gateway
//! bridge  -- read {sid} (one per device) ---->  gateway
//! ```
//!
//! Gateway heartbeats carry a fresh token and keep write keys current
//! between discovery rounds.

use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::protocol::{Command, DeviceModel};
use crate::registry::Registry;
use crate::transport::Transport;

/// Default interval between `whois` broadcasts.
pub const DEFAULT_DISCOVERY_INTERVAL: Duration = Duration::from_secs(300);

/// Discovery handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discovery {
    interval: Duration,
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new()
    }
}

impl Discovery {
    /// Creates discovery with the default interval.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            interval: DEFAULT_DISCOVERY_INTERVAL,
        }
    }

    /// Sets the broadcast interval.
    #[must_use]
    pub const fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Returns the broadcast interval.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.interval
    }

    /// Broadcasts `whois` to the multicast group.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects the datagram.
    pub fn broadcast_whois(&self, transport: &dyn Transport) -> Result<()> {
        tracing::debug!("broadcasting whois");
        transport.broadcast(Command::Whois.encode())
    }

    /// Handles `iam`: records the announced address and asks for the
    /// gateway's device list.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects the datagram.
    pub fn handle_iam(
        &self,
        registry: &mut Registry,
        sid: Option<&str>,
        ip: IpAddr,
        port: u16,
        now: Instant,
        transport: &dyn Transport,
    ) -> Result<()> {
        let addr = SocketAddr::new(ip, port);
        if let Some(sid) = sid {
            registry.upsert_gateway(sid, None, Some(addr), now);
        }

        tracing::debug!(
            "gateway {} at {addr}, requesting device list",
            sid.unwrap_or("?")
        );
        transport.send_to(Command::GetIdList.encode(), addr)
    }

    /// Handles `get_id_list_ack`: records the token and device ownership,
    /// then asks the gateway for the state of every listed device.
    ///
    /// Read requests go to `from`, the address the reply came from.
    ///
    /// # Errors
    ///
    /// Returns the first transport error; remaining reads are still sent.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_id_list(
        &self,
        registry: &mut Registry,
        gateway_sid: &str,
        token: Option<&str>,
        devices: &[String],
        from: SocketAddr,
        now: Instant,
        transport: &dyn Transport,
    ) -> Result<()> {
        registry.upsert_gateway(gateway_sid, token, Some(from), now);
        tracing::info!(
            "gateway {gateway_sid} at {from} lists {} devices",
            devices.len()
        );

        let mut first_error = None;
        for device_sid in devices {
            registry.upsert_device(device_sid, Some(gateway_sid), None);
            let read = Command::Read {
                sid: device_sid.clone(),
            };
            if let Err(e) = transport.send_to(read.encode(), from) {
                tracing::warn!("failed to request state of {device_sid}: {}", e);
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Handles `heartbeat`.
    ///
    /// Gateway heartbeats replace the gateway's token. Sub-device
    /// heartbeats are ignored. Returns true if a token was refreshed.
    pub fn handle_heartbeat(
        &self,
        registry: &mut Registry,
        sid: &str,
        model: &DeviceModel,
        token: Option<&str>,
        now: Instant,
    ) -> bool {
        if !model.is_gateway() {
            tracing::trace!("heartbeat from {model}({sid}) ignored");
            return false;
        }

        registry.upsert_gateway(sid, token, None, now);
        tracing::debug!("heartbeat from gateway {sid}");
        token.is_some()
    }
}

//! Transport layer for gateway communication.
//!
//! This module provides the abstraction the engine sends datagrams through.
//! Sends never wait: a datagram is either accepted by the transport
//! immediately or the send fails.

pub mod recording;
pub mod udp;

use std::net::SocketAddr;

use bytes::Bytes;

use crate::error::Result;

/// Trait for transport implementations.
pub trait Transport: Send + Sync {
    /// Sends a datagram to a single gateway.
    fn send_to(&self, payload: Bytes, target: SocketAddr) -> Result<()>;

    /// Sends a datagram to the discovery multicast group.
    fn broadcast(&self, payload: Bytes) -> Result<()>;
}

pub use recording::RecordingTransport;
pub use udp::{UdpConfig, UdpTransport};

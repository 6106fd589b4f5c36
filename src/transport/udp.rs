//! UDP transport with multicast group membership.
//!
//! Gateways answer on the unicast port and push reports to the multicast
//! group, so a single socket bound to the receive port and joined to the
//! group carries all inbound traffic.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;

use bytes::Bytes;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Default local receive port.
pub const DEFAULT_BIND_PORT: u16 = 9898;

/// Default discovery multicast group.
pub const DEFAULT_MULTICAST_ADDR: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 50);

/// Default discovery multicast port.
pub const DEFAULT_MULTICAST_PORT: u16 = 4321;

/// Largest datagram a gateway sends.
pub const MAX_DATAGRAM_LEN: usize = 2048;

/// Configuration for the UDP transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpConfig {
    /// Local port to bind.
    pub bind_port: u16,
    /// Multicast group to join and to send `whois` to.
    pub multicast_addr: Ipv4Addr,
    /// Destination port for multicast sends.
    pub multicast_port: u16,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl UdpConfig {
    /// Creates a configuration with the protocol defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bind_port: DEFAULT_BIND_PORT,
            multicast_addr: DEFAULT_MULTICAST_ADDR,
            multicast_port: DEFAULT_MULTICAST_PORT,
        }
    }

    /// Sets the local port.
    #[must_use]
    pub const fn bind_port(mut self, port: u16) -> Self {
        self.bind_port = port;
        self
    }

    /// Sets the multicast group.
    #[must_use]
    pub const fn multicast_addr(mut self, addr: Ipv4Addr) -> Self {
        self.multicast_addr = addr;
        self
    }

    /// Sets the multicast destination port.
    #[must_use]
    pub const fn multicast_port(mut self, port: u16) -> Self {
        self.multicast_port = port;
        self
    }

    /// Multicast destination for broadcasts.
    #[must_use]
    pub const fn multicast_target(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.multicast_addr, self.multicast_port))
    }
}

/// Creates a bound, non-blocking socket that other processes may share.
fn create_reusable_socket(config: &UdpConfig) -> io::Result<std::net::UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;

    socket.set_reuse_address(true)?;

    #[cfg(unix)]
    socket.set_reuse_port(true)?;

    let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, config.bind_port));
    socket.bind(&addr.into())?;
    socket.join_multicast_v4(&config.multicast_addr, &Ipv4Addr::UNSPECIFIED)?;
    socket.set_multicast_loop_v4(false)?;
    socket.set_nonblocking(true)?;

    Ok(socket.into())
}

/// UDP transport shared between the receive loop and the engine.
///
/// Cloning is cheap; clones share one socket.
#[derive(Debug, Clone)]
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    multicast_target: SocketAddr,
}

impl UdpTransport {
    /// Binds the socket and joins the multicast group.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be created, bound or joined.
    pub fn bind(config: &UdpConfig) -> Result<Self> {
        let std_socket = create_reusable_socket(config)?;
        let socket = UdpSocket::from_std(std_socket)?;
        tracing::info!(
            "listening on port {}, multicast group {}",
            config.bind_port,
            config.multicast_target()
        );

        Ok(Self {
            socket: Arc::new(socket),
            multicast_target: config.multicast_target(),
        })
    }

    /// Local address of the socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Receives one datagram.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket fails.
    pub async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        Ok(self.socket.recv_from(buf).await?)
    }

    fn try_send(&self, payload: &[u8], target: SocketAddr) -> Result<()> {
        match self.socket.try_send_to(payload, target) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                tracing::warn!("socket busy, dropped datagram to {target}");
                Err(Error::Io(e))
            }
            Err(e) => Err(Error::Io(e)),
        }
    }
}

impl Transport for UdpTransport {
    fn send_to(&self, payload: Bytes, target: SocketAddr) -> Result<()> {
        tracing::trace!("-> {target}: {}", String::from_utf8_lossy(&payload));
        self.try_send(&payload, target)
    }

    fn broadcast(&self, payload: Bytes) -> Result<()> {
        tracing::trace!(
            "-> {}: {}",
            self.multicast_target,
            String::from_utf8_lossy(&payload)
        );
        self.try_send(&payload, self.multicast_target)
    }
}

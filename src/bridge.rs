//! Async run loop around the [`Engine`].
//!
//! One task owns the engine and multiplexes socket receive, the discovery
//! and sweep timers, and set requests from [`BridgeHandle`]s. Every branch
//! runs to completion before the next is polled.

use std::future::Future;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};

use crate::commander::SendOutcome;
use crate::config::Config;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::event::{EventDispatcher, EventFilter, Subscription};
use crate::transport::UdpTransport;
use crate::transport::udp::MAX_DATAGRAM_LEN;
use crate::types::AccessoryKey;

/// Capacity of the set-request channel.
const REQUEST_CAPACITY: usize = 32;

/// A set request from the accessory directory.
#[derive(Debug)]
struct SetRequest {
    key: AccessoryKey,
    on: bool,
    reply: oneshot::Sender<Result<SendOutcome>>,
}

/// Handle for talking to a running bridge.
#[derive(Clone)]
pub struct BridgeHandle {
    requests: mpsc::Sender<SetRequest>,
    events: EventDispatcher,
}

impl BridgeHandle {
    /// Requests a new on/off state for an accessory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the bridge has stopped, or the
    /// engine's error for this request.
    pub async fn set(&self, key: AccessoryKey, on: bool) -> Result<SendOutcome> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(SetRequest { key, on, reply })
            .await
            .map_err(|_| Error::ChannelClosed)?;
        response.await.map_err(|_| Error::ChannelClosed)?
    }

    /// Subscribes to bridge events.
    #[must_use]
    pub fn subscribe(&self, filter: Option<EventFilter>) -> Subscription {
        self.events.subscribe(filter)
    }
}

/// The bridge: an engine bound to a UDP socket.
pub struct Bridge {
    engine: Engine<UdpTransport>,
    socket: UdpTransport,
    requests: mpsc::Receiver<SetRequest>,
}

impl Bridge {
    /// Binds the socket and builds the engine.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the socket cannot be
    /// bound.
    pub fn bind(config: Config) -> Result<(Self, BridgeHandle)> {
        let socket = UdpTransport::bind(&config.udp())?;
        let engine = Engine::new(config, socket.clone())?;
        Ok(Self::with_engine(engine, socket))
    }

    fn with_engine(engine: Engine<UdpTransport>, socket: UdpTransport) -> (Self, BridgeHandle) {
        let (tx, rx) = mpsc::channel(REQUEST_CAPACITY);
        let handle = BridgeHandle {
            requests: tx,
            events: engine.events().clone(),
        };
        let bridge = Self {
            engine,
            socket,
            requests: rx,
        };
        (bridge, handle)
    }

    /// Returns the engine.
    #[must_use]
    pub const fn engine(&self) -> &Engine<UdpTransport> {
        &self.engine
    }

    /// Runs until `shutdown` completes.
    ///
    /// The first discovery broadcast goes out immediately; the first sweep
    /// after one sweep interval.
    pub async fn run_until<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut buf = vec![0u8; MAX_DATAGRAM_LEN];

        let mut discovery = tokio::time::interval(self.engine.discovery().period());
        discovery.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let sweep_period = self.engine.sweeper().period();
        let mut sweep = tokio::time::interval_at(Instant::now() + sweep_period, sweep_period);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut requests_open = true;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("bridge shutting down");
                    return;
                }
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, from)) => {
                        self.engine
                            .handle_datagram(&buf[..len], from, Instant::now().into_std());
                    }
                    Err(e) => tracing::error!("receive failed: {}", e),
                },
                _ = discovery.tick() => {
                    if let Err(e) = self.engine.discover() {
                        tracing::warn!("discovery broadcast failed: {}", e);
                    }
                }
                _ = sweep.tick() => {
                    self.engine.sweep(Instant::now().into_std());
                }
                request = self.requests.recv(), if requests_open => match request {
                    Some(SetRequest { key, on, reply }) => {
                        let result = self.engine.set(&key, on);
                        if let Err(ref e) = result {
                            tracing::warn!("set {key} failed: {}", e);
                        }
                        // caller may have given up waiting
                        let _ = reply.send(result);
                    }
                    None => {
                        tracing::debug!("all bridge handles dropped");
                        requests_open = false;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_after_bridge_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = BridgeHandle {
            requests: tx,
            events: EventDispatcher::new(4),
        };

        let err = handle
            .set(AccessoryKey::from("PLUGp"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ChannelClosed));
    }

    #[tokio::test]
    async fn test_set_reply_dropped() {
        let (tx, mut rx) = mpsc::channel::<SetRequest>(1);
        let handle = BridgeHandle {
            requests: tx,
            events: EventDispatcher::new(4),
        };

        let responder = tokio::spawn(async move {
            let request = rx.recv().await.unwrap();
            assert_eq!(request.key.as_str(), "LWsw");
            assert!(request.on);
            drop(request.reply);
        });

        let err = handle
            .set(AccessoryKey::from("LWsw"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ChannelClosed));
        responder.await.unwrap();
    }
}

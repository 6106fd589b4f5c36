//! In-memory transport that records outbound datagrams.

use std::net::SocketAddr;
use std::sync::Mutex;

use bytes::Bytes;

use crate::error::Result;
use crate::transport::Transport;

/// Transport that keeps every datagram instead of sending it.
///
/// Broadcasts are recorded with target `None`.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(Bytes, Option<SocketAddr>)>>,
}

impl RecordingTransport {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns unicast datagrams in send order.
    #[must_use]
    pub fn sent(&self) -> Vec<(Bytes, SocketAddr)> {
        self.all()
            .into_iter()
            .filter_map(|(payload, target)| target.map(|addr| (payload, addr)))
            .collect()
    }

    /// Returns broadcast datagrams in send order.
    #[must_use]
    pub fn broadcasts(&self) -> Vec<Bytes> {
        self.all()
            .into_iter()
            .filter(|(_, target)| target.is_none())
            .map(|(payload, _)| payload)
            .collect()
    }

    /// Returns every datagram in send order.
    #[must_use]
    pub fn all(&self) -> Vec<(Bytes, Option<SocketAddr>)> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.clear();
        }
    }

    fn record(&self, payload: Bytes, target: Option<SocketAddr>) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((payload, target));
        }
    }
}

impl Transport for RecordingTransport {
    fn send_to(&self, payload: Bytes, target: SocketAddr) -> Result<()> {
        self.record(payload, Some(target));
        Ok(())
    }

    fn broadcast(&self, payload: Bytes) -> Result<()> {
        self.record(payload, None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let transport = RecordingTransport::new();
        let addr: SocketAddr = "10.0.0.1:9898".parse().unwrap();

        transport.broadcast(Bytes::from_static(b"a")).unwrap();
        transport.send_to(Bytes::from_static(b"b"), addr).unwrap();

        assert_eq!(transport.all().len(), 2);
        assert_eq!(transport.broadcasts(), vec![Bytes::from_static(b"a")]);
        assert_eq!(transport.sent(), vec![(Bytes::from_static(b"b"), addr)]);

        transport.clear();
        assert!(transport.all().is_empty());
    }
}

//! Gateway, device and accessory bookkeeping.
//!
//! The registry is a plain in-memory store owned by the [`Engine`]. Every
//! mutation takes an explicit `now` so time-based behavior can be driven
//! deterministically.
//!
//! [`Engine`]: crate::engine::Engine

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::types::{AccessoryKey, Device, Gateway, PASSWORD_LEN};

/// Last-seen bookkeeping for one logical accessory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessoryEntry {
    /// Backing device sid.
    pub device_sid: String,
    /// Last time the backing device reported.
    pub last_seen: Instant,
    /// True once the accessory has been announced to the directory.
    pub announced: bool,
}

/// Staleness thresholds used to pick accessories for eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Maximum silence of a device while its gateway keeps reporting.
    pub device_timeout: Duration,
    /// Maximum silence regardless of gateway activity.
    pub absolute_timeout: Duration,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            device_timeout: Duration::from_secs(3600),
            absolute_timeout: Duration::from_secs(24 * 3600),
        }
    }
}

/// In-memory registry of gateways, devices and accessories.
#[derive(Debug, Default)]
pub struct Registry {
    gateways: HashMap<String, Gateway>,
    devices: HashMap<String, Device>,
    accessories: HashMap<AccessoryKey, AccessoryEntry>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Gateways ====================

    /// Creates or updates a gateway and marks it as seen.
    ///
    /// Fields passed as `None` keep their previous value.
    pub fn upsert_gateway(
        &mut self,
        sid: &str,
        token: Option<&str>,
        addr: Option<SocketAddr>,
        now: Instant,
    ) -> &Gateway {
        let gateway = self
            .gateways
            .entry(sid.to_string())
            .or_insert_with(|| Gateway::new(sid));
        if let Some(token) = token {
            gateway.token = Some(token.to_string());
        }
        if let Some(addr) = addr {
            gateway.addr = Some(addr);
        }
        gateway.last_seen = Some(now);
        gateway
    }

    /// Stores the configured password of a gateway.
    pub fn set_password(&mut self, sid: &str, password: [u8; PASSWORD_LEN]) {
        self.gateways
            .entry(sid.to_string())
            .or_insert_with(|| Gateway::new(sid))
            .password = Some(password);
    }

    /// Returns a gateway by sid.
    #[must_use]
    pub fn gateway(&self, sid: &str) -> Option<&Gateway> {
        self.gateways.get(sid)
    }

    /// Returns all known gateways.
    pub fn gateways(&self) -> impl Iterator<Item = &Gateway> {
        self.gateways.values()
    }

    /// Returns the configured password of a gateway.
    #[must_use]
    pub fn lookup_password(&self, gateway_sid: &str) -> Option<&[u8; PASSWORD_LEN]> {
        self.gateways.get(gateway_sid)?.password.as_ref()
    }

    /// Returns the most recent token of a gateway.
    #[must_use]
    pub fn lookup_token(&self, gateway_sid: &str) -> Option<&str> {
        self.gateways.get(gateway_sid)?.token.as_deref()
    }

    // ==================== Devices ====================

    /// Creates or updates a device.
    ///
    /// Fields passed as `None` keep their previous value.
    pub fn upsert_device(
        &mut self,
        sid: &str,
        gateway_sid: Option<&str>,
        battery_mv: Option<u32>,
    ) -> &mut Device {
        let device = self
            .devices
            .entry(sid.to_string())
            .or_insert_with(|| Device::new(sid));
        if let Some(gateway_sid) = gateway_sid {
            device.gateway_sid = Some(gateway_sid.to_string());
        }
        if let Some(mv) = battery_mv {
            device.battery_mv = Some(mv);
        }
        device
    }

    /// Returns a device by sid.
    #[must_use]
    pub fn device(&self, sid: &str) -> Option<&Device> {
        self.devices.get(sid)
    }

    /// Returns the sid of the gateway owning a device.
    #[must_use]
    pub fn gateway_of(&self, device_sid: &str) -> Option<&str> {
        self.devices.get(device_sid)?.gateway_sid.as_deref()
    }

    /// Returns the cached battery voltage of a device.
    #[must_use]
    pub fn battery_of(&self, device_sid: &str) -> Option<u32> {
        self.devices.get(device_sid)?.battery_mv
    }

    // ==================== Accessories ====================

    /// Records `now` as the last-seen time of an accessory.
    ///
    /// Returns true if the accessory was not tracked before.
    pub fn touch(&mut self, key: &AccessoryKey, device_sid: &str, now: Instant) -> bool {
        if let Some(entry) = self.accessories.get_mut(key) {
            entry.last_seen = now;
            entry.device_sid = device_sid.to_string();
            false
        } else {
            self.accessories.insert(
                key.clone(),
                AccessoryEntry {
                    device_sid: device_sid.to_string(),
                    last_seen: now,
                    announced: false,
                },
            );
            true
        }
    }

    /// Marks an accessory as announced to the directory.
    ///
    /// Returns true the first time it is called for a tracked accessory.
    pub fn mark_announced(&mut self, key: &AccessoryKey) -> bool {
        match self.accessories.get_mut(key) {
            Some(entry) if !entry.announced => {
                entry.announced = true;
                true
            }
            _ => false,
        }
    }

    /// Returns the bookkeeping entry of an accessory.
    #[must_use]
    pub fn accessory(&self, key: &AccessoryKey) -> Option<&AccessoryEntry> {
        self.accessories.get(key)
    }

    /// Number of tracked accessories.
    #[must_use]
    pub fn accessory_count(&self) -> usize {
        self.accessories.len()
    }

    /// Returns accessories that have gone stale under `policy`.
    ///
    /// An accessory is stale if its gateway was seen more than
    /// `device_timeout` after the accessory, or if the accessory itself was
    /// last seen more than `absolute_timeout` before `now`.
    #[must_use]
    pub fn devices_due_for_eviction(
        &self,
        now: Instant,
        policy: &EvictionPolicy,
    ) -> Vec<AccessoryKey> {
        let mut due: Vec<AccessoryKey> = self
            .accessories
            .iter()
            .filter(|(_, entry)| self.is_stale(entry, now, policy))
            .map(|(key, _)| key.clone())
            .collect();
        due.sort();
        due
    }

    fn is_stale(&self, entry: &AccessoryEntry, now: Instant, policy: &EvictionPolicy) -> bool {
        let gateway_seen = self
            .gateway_of(&entry.device_sid)
            .and_then(|sid| self.gateways.get(sid))
            .and_then(|gateway| gateway.last_seen);

        let silent_behind_live_gateway = gateway_seen.is_some_and(|seen| {
            seen.saturating_duration_since(entry.last_seen) > policy.device_timeout
        });
        let silent_too_long =
            now.saturating_duration_since(entry.last_seen) > policy.absolute_timeout;

        silent_behind_live_gateway || silent_too_long
    }

    /// Removes accessories from the registry.
    ///
    /// Gateway and device records are kept; a device that reports again
    /// recreates its accessories.
    pub fn remove_accessories(&mut self, keys: &[AccessoryKey]) {
        for key in keys {
            self.accessories.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "192.168.1.20:9898".parse().unwrap()
    }

    #[test]
    fn test_upsert_gateway_keeps_fields() {
        let mut registry = Registry::new();
        let t = Instant::now();
        registry.upsert_gateway("gw", Some("tok1"), Some(addr()), t);
        registry.upsert_gateway("gw", None, None, t);

        let gw = registry.gateway("gw").unwrap();
        assert_eq!(gw.token.as_deref(), Some("tok1"));
        assert_eq!(gw.addr, Some(addr()));
    }

    #[test]
    fn test_token_replaced() {
        let mut registry = Registry::new();
        let t = Instant::now();
        registry.upsert_gateway("gw", Some("tok1"), None, t);
        registry.upsert_gateway("gw", Some("tok2"), None, t);
        assert_eq!(registry.lookup_token("gw"), Some("tok2"));
    }

    #[test]
    fn test_password_lookup() {
        let mut registry = Registry::new();
        assert!(registry.lookup_password("gw").is_none());
        registry.set_password("gw", *b"0987654321qwerty");
        assert_eq!(registry.lookup_password("gw"), Some(b"0987654321qwerty"));
        assert!(registry.lookup_token("gw").is_none());
    }

    #[test]
    fn test_upsert_device() {
        let mut registry = Registry::new();
        registry.upsert_device("dev", None, Some(3000));
        registry.upsert_device("dev", Some("gw"), None);

        assert_eq!(registry.gateway_of("dev"), Some("gw"));
        assert_eq!(registry.battery_of("dev"), Some(3000));
    }

    #[test]
    fn test_touch_and_announce() {
        let mut registry = Registry::new();
        let key = AccessoryKey::new("Mot", "dev");
        let t = Instant::now();

        assert!(registry.touch(&key, "dev", t));
        assert!(!registry.touch(&key, "dev", t + Duration::from_secs(1)));
        assert_eq!(
            registry.accessory(&key).unwrap().last_seen,
            t + Duration::from_secs(1)
        );

        assert!(registry.mark_announced(&key));
        assert!(!registry.mark_announced(&key));
    }

    #[test]
    fn test_eviction_gateway_alive() {
        let mut registry = Registry::new();
        let t = Instant::now();
        let key = AccessoryKey::new("Mot", "dev");
        registry.upsert_device("dev", Some("gw"), None);
        registry.touch(&key, "dev", t);
        registry.upsert_gateway("gw", None, None, t + Duration::from_secs(3700));

        let due = registry
            .devices_due_for_eviction(t + Duration::from_secs(3700), &EvictionPolicy::default());
        assert_eq!(due, vec![key]);
    }

    #[test]
    fn test_eviction_gateway_silent() {
        let mut registry = Registry::new();
        let t = Instant::now();
        let key = AccessoryKey::new("Mag", "dev");
        registry.touch(&key, "dev", t);

        let policy = EvictionPolicy::default();
        assert!(
            registry
                .devices_due_for_eviction(t + Duration::from_secs(86_000), &policy)
                .is_empty()
        );
        assert_eq!(
            registry.devices_due_for_eviction(t + Duration::from_secs(90_000), &policy),
            vec![key]
        );
    }

    #[test]
    fn test_no_eviction_within_thresholds() {
        let mut registry = Registry::new();
        let t = Instant::now();
        let key = AccessoryKey::new("Mot", "dev");
        registry.upsert_device("dev", Some("gw"), None);
        registry.touch(&key, "dev", t);
        registry.upsert_gateway("gw", None, None, t + Duration::from_secs(3500));

        assert!(
            registry
                .devices_due_for_eviction(t + Duration::from_secs(3500), &EvictionPolicy::default())
                .is_empty()
        );
    }

    #[test]
    fn test_remove_accessories_keeps_devices() {
        let mut registry = Registry::new();
        let key = AccessoryKey::new("PLUG", "dev");
        registry.upsert_device("dev", Some("gw"), None);
        registry.touch(&key, "dev", Instant::now());

        registry.remove_accessories(std::slice::from_ref(&key));
        assert!(registry.accessory(&key).is_none());
        assert!(registry.device("dev").is_some());
    }
}

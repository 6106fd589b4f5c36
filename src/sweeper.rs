//! Periodic eviction of accessories whose devices stopped reporting.

use std::time::{Duration, Instant};

use crate::registry::{EvictionPolicy, Registry};
use crate::types::AccessoryKey;

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Staleness sweeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sweeper {
    policy: EvictionPolicy,
    interval: Duration,
}

impl Default for Sweeper {
    fn default() -> Self {
        Self::new(EvictionPolicy::default())
    }
}

impl Sweeper {
    /// Creates a sweeper with the default interval.
    #[must_use]
    pub const fn new(policy: EvictionPolicy) -> Self {
        Self {
            policy,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Sets the sweep interval.
    #[must_use]
    pub const fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Returns the sweep interval.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.interval
    }

    /// Returns the eviction policy.
    #[must_use]
    pub const fn policy(&self) -> &EvictionPolicy {
        &self.policy
    }

    /// Removes every stale accessory and returns them as one batch.
    pub fn sweep(&self, registry: &mut Registry, now: Instant) -> Vec<AccessoryKey> {
        let stale = registry.devices_due_for_eviction(now, &self.policy);
        if stale.is_empty() {
            tracing::debug!("sweep: {} accessories, none stale", registry.accessory_count());
            return stale;
        }

        registry.remove_accessories(&stale);
        tracing::info!(
            "sweep: evicted {} stale accessories: {}",
            stale.len(),
            stale
                .iter()
                .map(AccessoryKey::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
        stale
    }
}

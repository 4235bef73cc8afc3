//! Per-address session limits.
//!
//! The registry is the only state shared between sessions. The lock is held
//! for a single increment or decrement and never across I/O.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

pub const DEFAULT_MAX_PER_ADDRESS: usize = 5;

#[derive(Debug)]
pub struct AdmissionController {
    max_per_address: usize,
    counts: Mutex<HashMap<String, usize>>,
}

impl AdmissionController {
    pub fn new(max_per_address: usize) -> Self {
        Self {
            max_per_address,
            counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_per_address(&self) -> usize {
        self.max_per_address
    }

    /// Takes a slot for `address`. Returns false, changing nothing, when the
    /// address already holds the maximum.
    pub fn acquire(&self, address: &str) -> bool {
        let host = normalize_address(address);
        let mut counts = lock_unpoisoned(&self.counts);
        let count = counts.get(&host).copied().unwrap_or(0);
        if count >= self.max_per_address {
            drop(counts);
            warn!(address = %host, limit = self.max_per_address, "admission rejected");
            return false;
        }
        counts.insert(host, count + 1);
        true
    }

    /// Returns a slot. Untracked addresses are ignored; entries that reach
    /// zero are removed.
    pub fn release(&self, address: &str) {
        let host = normalize_address(address);
        let mut counts = lock_unpoisoned(&self.counts);
        let Some(count) = counts.get_mut(&host) else {
            drop(counts);
            debug!(address = %host, "release for untracked address ignored");
            return;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            counts.remove(&host);
        }
    }

    pub fn active_count(&self, address: &str) -> usize {
        let host = normalize_address(address);
        lock_unpoisoned(&self.counts)
            .get(&host)
            .copied()
            .unwrap_or(0)
    }

    /// Number of distinct addresses currently holding at least one slot.
    pub fn tracked_addresses(&self) -> usize {
        lock_unpoisoned(&self.counts).len()
    }

    /// [`Self::acquire`] wrapped in a guard that releases on drop.
    pub fn try_admit(self: &Arc<Self>, address: &str) -> Option<AdmissionGuard> {
        if !self.acquire(address) {
            return None;
        }
        Some(AdmissionGuard {
            controller: Arc::clone(self),
            address: address.to_string(),
        })
    }
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PER_ADDRESS)
    }
}

/// Holds one admission slot for the lifetime of a connection.
#[derive(Debug)]
pub struct AdmissionGuard {
    controller: Arc<AdmissionController>,
    address: String,
}

impl AdmissionGuard {
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Drop for AdmissionGuard {
    fn drop(&mut self) {
        self.controller.release(&self.address);
    }
}

/// Host part of a peer address: `ip:port` and `[v6]:port` lose the port,
/// anything else is used as-is.
pub fn normalize_address(address: &str) -> String {
    let address = address.trim();
    if let Some(rest) = address.strip_prefix('[') {
        if let Some((host, _)) = rest.split_once(']') {
            return host.to_string();
        }
        return address.to_string();
    }
    match address.split_once(':') {
        Some((host, port)) if !port.contains(':') => host.to_string(),
        _ => address.to_string(),
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

//! Fixed-window hit counters keyed by client, and client key extraction.
//!
//! The counter backs the slow-down stage. Memory is bounded two
//! ways: expired windows are swept every `cleanup_interval` hits, and the
//! number of tracked keys never exceeds `max_keys` (the oldest window is
//! dropped to make room).

use std::collections::HashMap;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use axum::extract::ConnectInfo;
use axum::http::Extensions;

const DEFAULT_CLEANUP_INTERVAL: u64 = 100;

/// Key used when the peer address is unknown.
pub const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of recording one hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// Hits in the current window, this one included.
    pub count: u32,
    /// Time until the current window ends.
    pub reset_in: Duration,
}

#[derive(Debug)]
pub struct WindowedCounter {
    window: Duration,
    max_keys: usize,
    cleanup_interval: u64,
    state: RwLock<HashMap<String, Window>>,
    hits: AtomicU64,
}

impl WindowedCounter {
    pub fn new(window: Duration, max_keys: usize) -> Self {
        Self {
            window,
            max_keys: max_keys.max(1),
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            state: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
        }
    }

    /// Record a hit for `key` now.
    pub fn hit(&self, key: &str) -> Hit {
        self.hit_at(key, Instant::now())
    }

    pub(crate) fn hit_at(&self, key: &str, now: Instant) -> Hit {
        let seen = self.hits.fetch_add(1, Ordering::Relaxed);
        if seen > 0 && seen % self.cleanup_interval == 0 {
            self.cleanup_at(now);
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        if !state.contains_key(key) && state.len() >= self.max_keys {
            self.sweep(&mut state, now);
            if state.len() >= self.max_keys {
                if let Some(oldest) = state
                    .iter()
                    .min_by_key(|(_, w)| w.started)
                    .map(|(k, _)| k.clone())
                {
                    tracing::debug!(evicted = %oldest, "client table full, evicting oldest window");
                    state.remove(&oldest);
                }
            }
        }

        let entry = state.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.saturating_duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }
        entry.count = entry.count.saturating_add(1);

        Hit {
            count: entry.count,
            reset_in: self
                .window
                .saturating_sub(now.saturating_duration_since(entry.started)),
        }
    }

    fn cleanup_at(&self, now: Instant) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        self.sweep(&mut state, now);
    }

    fn sweep(&self, state: &mut HashMap<String, Window>, now: Instant) {
        let before = state.len();
        state.retain(|_, w| now.saturating_duration_since(w.started) < self.window);
        let removed = before - state.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = state.len(), "swept expired client windows");
        }
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Normalize a peer address into a limiter key.
///
/// IPv4-mapped IPv6 addresses collapse to their IPv4 form; other IPv6
/// addresses are grouped by their /56 prefix so a single allocation cannot
/// rotate through addresses to dodge the limit.
pub fn normalize_ip(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => {
                let s = v6.segments();
                let prefix = Ipv6Addr::new(s[0], s[1], s[2], s[3] & 0xff00, 0, 0, 0, 0);
                format!("{prefix}/56")
            }
        },
    }
}

/// The limiter key for a request, from the connection's peer address.
pub fn client_key(extensions: &Extensions) -> String {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| normalize_ip(addr.ip()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

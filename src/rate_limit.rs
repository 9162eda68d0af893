use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::time::{Duration, Instant};

use crate::metrics::TRACKED_CLIENTS;

// Rate limit entry - tracks requests per IP/key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientWindow {
    pub count: u32,
    pub window_start: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Reject,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// Fixed-window admission counter keyed by caller identity.
///
/// Each identity gets at most `limit` admissions per window. The window
/// restarts on the first request after it has expired, so a burst that
/// straddles a boundary can see up to `2 * limit` admissions.
pub struct AdmissionGateway {
    windows: DashMap<String, ClientWindow>,
    limit: u32,
    window: Duration,
}

impl AdmissionGateway {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
            window,
        }
    }

    // Admit or reject one request from `identity` at `now`
    pub fn admit(&self, identity: &str, now: Instant) -> Decision {
        // the entry guard holds the shard lock for the whole read-modify-write
        let decision = match self.windows.entry(identity.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(ClientWindow {
                    count: 1,
                    window_start: now,
                });
                Decision::Allow
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();

                // window expired..? reset it
                if now.saturating_duration_since(entry.window_start) > self.window {
                    entry.count = 1;
                    entry.window_start = now;
                    Decision::Allow
                } else if entry.count >= self.limit {
                    Decision::Reject
                } else {
                    entry.count += 1;
                    Decision::Allow
                }
            }
        };

        TRACKED_CLIENTS.set(self.windows.len() as f64);
        decision
    }

    pub fn check(&self, identity: &str) -> Decision {
        self.admit(identity, Instant::now())
    }

    // drop every window older than the window length, returns how many went
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, entry| now.saturating_duration_since(entry.window_start) <= self.window);
        let after = self.windows.len();

        TRACKED_CLIENTS.set(after as f64);
        before.saturating_sub(after)
    }

    pub fn get(&self, identity: &str) -> Option<ClientWindow> {
        self.windows.get(identity).map(|entry| *entry.value())
    }

    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

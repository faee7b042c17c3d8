/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Per-peer round-trip samples and a robust cross-peer average, used for deadline tuning.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use ed25519_dalek::VerifyingKey;

use crate::logging::debug;

/// Samples a peer's window retains. Once the window holds more than 5 entries, the oldest is
/// evicted before the next insertion.
const LATENCY_WINDOW_CAPACITY: usize = 6;

/// The average latency assumed for a peer before any samples exist, in milliseconds.
pub(crate) const DEFAULT_AVG_LATENCY_MILLIS: u64 = 100;

/// Sliding windows of round-trip samples, one per peer. Read and written directly from handler
/// contexts, so the map sits behind its own lock rather than going through the state executor.
pub(crate) struct LatencyTracker {
    windows: Mutex<HashMap<VerifyingKey, VecDeque<u64>>>,
}

impl LatencyTracker {
    pub(crate) fn new() -> LatencyTracker {
        LatencyTracker {
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Append a millisecond round-trip sample to the peer's window, evicting the oldest sample
    /// once the window is full.
    pub(crate) fn on_pong(&self, peer: VerifyingKey, millis: u64) {
        let mut windows = self.windows.lock().unwrap();
        let window = windows.entry(peer).or_insert_with(VecDeque::new);
        if window.len() > LATENCY_WINDOW_CAPACITY - 1 {
            window.pop_front();
        }
        window.push_back(millis);
    }

    /// The mean latency of the fastest two-thirds (at least one) of the given peers, in
    /// milliseconds. Peers without samples are ignored; if no peer has samples the result is
    /// zero.
    pub(crate) fn avg_latency(&self, peers: &[VerifyingKey]) -> Duration {
        let windows = self.windows.lock().unwrap();
        let mut means: Vec<u64> = peers
            .iter()
            .filter_map(|peer| {
                windows
                    .get(peer)
                    .filter(|window| !window.is_empty())
                    .map(|window| window.iter().sum::<u64>() / window.len() as u64)
            })
            .collect();

        if means.is_empty() {
            return Duration::ZERO;
        }

        means.sort_unstable();
        let valid_count = (means.len() * 2 / 3).max(1);
        let avg = means[..valid_count].iter().sum::<u64>() / valid_count as u64;

        debug::avg_latency(avg as u128);
        Duration::from_millis(avg)
    }
}

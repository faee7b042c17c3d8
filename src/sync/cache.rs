/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Deduplication of outbound sync requests, so that a gap reported by many peers at once is
//! only requested from one of them until the dedup window elapses.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::types::basic::{BlockIndex, CryptoHash};

/// The artifact a sync request is asking for: a prepare-block by its view index, or a quorum
/// certificate by its block hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum CacheKey {
    Index(BlockIndex),
    Hash(CryptoHash),
}

/// Tracks which artifact keys have an outstanding request. Touched directly from handler
/// contexts, so it carries its own lock.
pub(crate) struct SyncCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, Instant>>,
}

impl SyncCache {
    pub(crate) fn new(ttl: Duration) -> SyncCache {
        SyncCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Record that a request for `key` is being considered now. Returns whether the key was
    /// absent or expired, i.e., whether the caller should actually send the request. The entry's
    /// expiry is refreshed either way.
    pub(crate) fn add_or_replace(&self, key: CacheKey) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|_, expiry| *expiry > now);

        let was_absent = !entries.contains_key(&key);
        entries.insert(key, now + self.ttl);
        was_absent
    }
}

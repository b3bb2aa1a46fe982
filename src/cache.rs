//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Cdrx.
//! The Cdrx project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Cdrx Lookup Cache
//!
//! Thread-safe memo of enrichment lookups shared by every stage of a
//! pipeline and by every caller driving that pipeline.
//!
//! The cache is one namespace partitioned by key prefix (`subscriber_…`,
//! `device_…`, `geo_…`). Each prefix is written by exactly one stage, and the
//! value stored under it is the matching [`CdrCacheValue`] variant.
//!
//! ## Expiry
//!
//! A TTL is accepted at construction. Under [`CdrCacheExpiry::Never`] it is
//! stored but never consulted: entries live for the life of the process and
//! the cache grows with the number of distinct correlation keys seen. Under
//! [`CdrCacheExpiry::OnRead`] an entry older than the TTL reads as a miss and
//! is overwritten by the next `set`. There is no capacity bound in either
//! mode.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use log::trace;
use serde::{Deserialize, Serialize};

use crate::enrichers::device::CdrDeviceClass;
use crate::enrichers::geo::CdrGeoLocation;
use crate::enrichers::subscriber::CdrSubscriberProfile;

/// Default TTL handed to new caches.
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Whether the configured TTL is enforced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CdrCacheExpiry {
    /// Entries never expire; the TTL is informational only.
    #[default]
    Never,
    /// Entries older than the TTL are treated as misses.
    OnRead,
}

/// Value stored in the cache, tagged by the stage that owns it.
#[derive(Clone, Debug, PartialEq)]
pub enum CdrCacheValue {
    Subscriber(CdrSubscriberProfile),
    Device(CdrDeviceClass),
    Geo(CdrGeoLocation),
}

/// A cached value together with the moment it was stored.
#[derive(Clone, Debug)]
pub struct CdrCacheEntry {
    pub value: CdrCacheValue,
    pub inserted_at: Instant,
}

/// Concurrency-safe lookup cache.
///
/// Readers share the lock; writers take it exclusively. Neither `get` nor
/// `set` can fail: a poisoned lock is recovered rather than reported, since
/// every write leaves the map in a consistent state.
#[derive(Debug)]
pub struct CdrLookupCache {
    ttl: Duration,
    expiry: CdrCacheExpiry,
    entries: RwLock<HashMap<String, CdrCacheEntry>>,
}

impl Default for CdrLookupCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TTL_SECS))
    }
}

impl CdrLookupCache {
    /// Creates a cache that stores `ttl` but never expires entries.
    pub fn new(ttl: Duration) -> Self {
        Self::with_expiry(ttl, CdrCacheExpiry::Never)
    }

    pub fn with_expiry(ttl: Duration, expiry: CdrCacheExpiry) -> Self {
        Self {
            ttl,
            expiry,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn expiry(&self) -> CdrCacheExpiry {
        self.expiry
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CdrCacheEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CdrCacheEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_stale(&self, entry: &CdrCacheEntry) -> bool {
        match self.expiry {
            CdrCacheExpiry::Never => false,
            CdrCacheExpiry::OnRead => entry.inserted_at.elapsed() > self.ttl,
        }
    }

    /// Returns the value cached under `key`, if any.
    pub fn get(&self, key: &str) -> Option<CdrCacheValue> {
        let entries = self.read();
        let entry = entries.get(key)?;
        if self.is_stale(entry) {
            trace!("cache entry expired: {key}");
            return None;
        }
        trace!("cache hit: {key}");
        Some(entry.value.clone())
    }

    /// Stores `value` under `key`, silently replacing any previous value.
    pub fn set(&self, key: impl Into<String>, value: CdrCacheValue) {
        let key = key.into();
        trace!("cache set: {key}");
        self.write().insert(
            key,
            CdrCacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Removes entries older than the TTL. Does nothing under `Never`.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        if self.expiry == CdrCacheExpiry::Never {
            return 0;
        }
        let mut entries = self.write();
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.inserted_at.elapsed() <= ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }
}

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

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::cache::{CdrCacheValue, CdrLookupCache};
use crate::enricher::{enrich_record, CdrBoxedEnricher, CdrEnricher};
use crate::enrichers::CdrStageKind;
use crate::errors::Result;
use crate::record::CdrRecord;

pub const STAGE_NAME: &str = "GeoEnricher";

/// Location resolved from a cell identifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CdrGeoLocation {
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl CdrGeoLocation {
    fn new(region: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            region: region.to_string(),
            latitude,
            longitude,
        }
    }

    /// Resolves a location from the prefix of a cell id.
    ///
    /// Unknown cells map to region `"Unknown"` at (0.0, 0.0).
    pub fn lookup(cell_id: &str) -> Self {
        if cell_id.starts_with("NYC") {
            Self::new("New York", 40.7128, -74.0060)
        } else if cell_id.starts_with("LAX") {
            Self::new("Los Angeles", 34.0522, -118.2437)
        } else {
            Self::new("Unknown", 0.0, 0.0)
        }
    }

    fn apply_to(&self, record: &mut CdrRecord) {
        record.location_region = Some(self.region.clone());
        record.latitude = Some(self.latitude);
        record.longitude = Some(self.longitude);
    }
}

/// Populates `location_region`, `latitude` and `longitude`.
#[derive(Debug)]
pub struct CdrGeoEnricher {
    cache: Arc<CdrLookupCache>,
}

impl CdrGeoEnricher {
    pub fn new(cache: Arc<CdrLookupCache>) -> Self {
        Self { cache }
    }

    fn resolve(&self, cell_id: &str) -> CdrGeoLocation {
        let key = CdrStageKind::Geo.cache_key(cell_id);
        if let Some(CdrCacheValue::Geo(location)) = self.cache.get(&key) {
            return location;
        }
        debug!("geo lookup for cell '{cell_id}'");
        let location = CdrGeoLocation::lookup(cell_id);
        self.cache.set(key, CdrCacheValue::Geo(location.clone()));
        location
    }
}

impl CdrEnricher for CdrGeoEnricher {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    fn enrich(&self, data: &[u8]) -> Result<Vec<u8>> {
        enrich_record(data, |record| {
            self.resolve(&record.cell_id).apply_to(record);
        })
    }
}

pub fn geo_factory(cache: Arc<CdrLookupCache>) -> CdrBoxedEnricher {
    Box::new(CdrGeoEnricher::new(cache))
}

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

//! # Enrichers Module
//!
//! Built-in enrichment stages. Each one follows the same two steps: build a
//! cache key from its correlation field, then either copy the cached
//! attributes onto the record or run a deterministic prefix lookup, write
//! the result onto the record and cache it.
//!
//! - **subscriber**: `imsi` → subscriber type, service plan, account type
//! - **device**: `imei` → device class
//! - **geo**: `cell_id` → region, latitude, longitude
//!
//! Lookups are total. A key that matches no rule, including the empty key,
//! resolves to the stage's default.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CdrError;

pub mod device;
pub mod geo;
pub mod subscriber;

pub use device::{CdrDeviceClass, CdrDeviceEnricher};
pub use geo::{CdrGeoEnricher, CdrGeoLocation};
pub use subscriber::{CdrSubscriberEnricher, CdrSubscriberProfile};

/// Closed set of built-in stages.
///
/// Parses from the source names used in configuration (`"subscriber"`,
/// `"device"`, `"geo"`) and maps to the stage names recorded in
/// `enrichment_status`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CdrStageKind {
    Subscriber,
    Device,
    Geo,
}

impl CdrStageKind {
    pub const ALL: [CdrStageKind; 3] = [
        CdrStageKind::Subscriber,
        CdrStageKind::Device,
        CdrStageKind::Geo,
    ];

    /// Source name as written in configuration.
    pub fn source(&self) -> &'static str {
        match self {
            CdrStageKind::Subscriber => "subscriber",
            CdrStageKind::Device => "device",
            CdrStageKind::Geo => "geo",
        }
    }

    /// Stage name as recorded in `enrichment_status`.
    pub fn stage_name(&self) -> &'static str {
        match self {
            CdrStageKind::Subscriber => subscriber::STAGE_NAME,
            CdrStageKind::Device => device::STAGE_NAME,
            CdrStageKind::Geo => geo::STAGE_NAME,
        }
    }

    /// Prefix namespacing this stage's cache keys.
    pub fn cache_prefix(&self) -> &'static str {
        match self {
            CdrStageKind::Subscriber => "subscriber_",
            CdrStageKind::Device => "device_",
            CdrStageKind::Geo => "geo_",
        }
    }

    pub fn cache_key(&self, correlation: &str) -> String {
        format!("{}{}", self.cache_prefix(), correlation)
    }
}

impl fmt::Display for CdrStageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source())
    }
}

impl FromStr for CdrStageKind {
    type Err = CdrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subscriber" => Ok(CdrStageKind::Subscriber),
            "device" => Ok(CdrStageKind::Device),
            "geo" => Ok(CdrStageKind::Geo),
            other => Err(CdrError::validation(format!(
                "unknown enrichment source '{other}'"
            ))),
        }
    }
}

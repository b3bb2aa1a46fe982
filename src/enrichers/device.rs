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

use std::fmt;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::cache::{CdrCacheValue, CdrLookupCache};
use crate::enricher::{enrich_record, CdrBoxedEnricher, CdrEnricher};
use crate::enrichers::CdrStageKind;
use crate::errors::Result;

pub const STAGE_NAME: &str = "DeviceEnricher";

/// Device class resolved from an IMEI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CdrDeviceClass {
    Smartphone,
    IotDevice,
    FeaturePhone,
}

impl CdrDeviceClass {
    /// Resolves the class from the leading digits of an IMEI.
    pub fn lookup(imei: &str) -> Self {
        if imei.starts_with("35") {
            CdrDeviceClass::Smartphone
        } else if imei.starts_with("86") {
            CdrDeviceClass::IotDevice
        } else {
            CdrDeviceClass::FeaturePhone
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CdrDeviceClass::Smartphone => "smartphone",
            CdrDeviceClass::IotDevice => "iot_device",
            CdrDeviceClass::FeaturePhone => "feature_phone",
        }
    }
}

impl fmt::Display for CdrDeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Populates `device_type`.
#[derive(Debug)]
pub struct CdrDeviceEnricher {
    cache: Arc<CdrLookupCache>,
}

impl CdrDeviceEnricher {
    pub fn new(cache: Arc<CdrLookupCache>) -> Self {
        Self { cache }
    }

    fn resolve(&self, imei: &str) -> CdrDeviceClass {
        let key = CdrStageKind::Device.cache_key(imei);
        if let Some(CdrCacheValue::Device(class)) = self.cache.get(&key) {
            return class;
        }
        debug!("device lookup for imei '{imei}'");
        let class = CdrDeviceClass::lookup(imei);
        self.cache.set(key, CdrCacheValue::Device(class));
        class
    }
}

impl CdrEnricher for CdrDeviceEnricher {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    fn enrich(&self, data: &[u8]) -> Result<Vec<u8>> {
        enrich_record(data, |record| {
            let class = self.resolve(&record.imei);
            record.device_type = Some(class.as_str().to_string());
        })
    }
}

pub fn device_factory(cache: Arc<CdrLookupCache>) -> CdrBoxedEnricher {
    Box::new(CdrDeviceEnricher::new(cache))
}

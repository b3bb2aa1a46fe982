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

pub const STAGE_NAME: &str = "SubscriberEnricher";

/// Subscriber attributes resolved from an IMSI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdrSubscriberProfile {
    pub subscriber_type: String,
    pub service_plan: String,
    pub account_type: String,
}

impl CdrSubscriberProfile {
    fn new(subscriber_type: &str, service_plan: &str, account_type: &str) -> Self {
        Self {
            subscriber_type: subscriber_type.to_string(),
            service_plan: service_plan.to_string(),
            account_type: account_type.to_string(),
        }
    }

    /// Resolves a profile from the leading digits of an IMSI.
    pub fn lookup(imsi: &str) -> Self {
        if imsi.starts_with("001") {
            Self::new("premium", "unlimited_5g", "postpaid")
        } else if imsi.starts_with("002") {
            Self::new("standard", "basic_4g", "prepaid")
        } else {
            Self::new("basic", "voice_only", "prepaid")
        }
    }

    fn apply_to(&self, record: &mut CdrRecord) {
        record.subscriber_type = Some(self.subscriber_type.clone());
        record.service_plan = Some(self.service_plan.clone());
        record.account_type = Some(self.account_type.clone());
    }
}

/// Populates `subscriber_type`, `service_plan` and `account_type`.
#[derive(Debug)]
pub struct CdrSubscriberEnricher {
    cache: Arc<CdrLookupCache>,
}

impl CdrSubscriberEnricher {
    pub fn new(cache: Arc<CdrLookupCache>) -> Self {
        Self { cache }
    }

    fn resolve(&self, imsi: &str) -> CdrSubscriberProfile {
        let key = CdrStageKind::Subscriber.cache_key(imsi);
        if let Some(CdrCacheValue::Subscriber(profile)) = self.cache.get(&key) {
            return profile;
        }
        debug!("subscriber lookup for imsi '{imsi}'");
        let profile = CdrSubscriberProfile::lookup(imsi);
        self.cache.set(key, CdrCacheValue::Subscriber(profile.clone()));
        profile
    }
}

impl CdrEnricher for CdrSubscriberEnricher {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    fn enrich(&self, data: &[u8]) -> Result<Vec<u8>> {
        enrich_record(data, |record| {
            self.resolve(&record.imsi).apply_to(record);
        })
    }
}

pub fn subscriber_factory(cache: Arc<CdrLookupCache>) -> CdrBoxedEnricher {
    Box::new(CdrSubscriberEnricher::new(cache))
}

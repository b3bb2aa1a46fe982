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

//! # Cdrx Configuration
//!
//! [`CdrConfig`] describes one enrichment pipeline: which stages run and in
//! what order, how the lookup cache behaves, how batches are scheduled, and
//! how the crate logs. It is read once and handed to
//! [`CdrBatchProcessor::from_config`](crate::batch::CdrBatchProcessor::from_config);
//! the resulting pipeline never looks at it again.
//!
//! ```yaml
//! enrichment_sources: [subscriber, device, geo]
//! cache:
//!   ttl_secs: 300
//!   expiry: never      # or on_read
//! batch:
//!   workers: 4
//! log:
//!   level: INFO
//!   json_format: true
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::{CdrCacheExpiry, CdrLookupCache, DEFAULT_TTL_SECS};
use crate::enrichers::CdrStageKind;
use crate::errors::{CdrError, Result};
use crate::logging::CdrLogConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CdrCacheConfig {
    pub ttl_secs: u64,
    pub expiry: CdrCacheExpiry,
}

impl Default for CdrCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL_SECS,
            expiry: CdrCacheExpiry::Never,
        }
    }
}

impl CdrCacheConfig {
    pub fn build_cache(&self) -> CdrLookupCache {
        CdrLookupCache::with_expiry(Duration::from_secs(self.ttl_secs), self.expiry)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CdrBatchConfig {
    /// Worker threads for parallel batches; `None` means one per CPU.
    pub workers: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CdrConfig {
    /// Stage source names in run order.
    pub enrichment_sources: Vec<String>,
    pub cache: CdrCacheConfig,
    pub batch: CdrBatchConfig,
    pub log: CdrLogConfig,
}

impl Default for CdrConfig {
    fn default() -> Self {
        Self {
            enrichment_sources: CdrStageKind::ALL
                .iter()
                .map(|kind| kind.source().to_string())
                .collect(),
            cache: CdrCacheConfig::default(),
            batch: CdrBatchConfig::default(),
            log: CdrLogConfig::default(),
        }
    }
}

impl CdrConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads a `.json` file as JSON and anything else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|err| CdrError::Io(format!("{}: {err}", path.display())))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    pub fn enrichment_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enrichment_sources = sources.into_iter().map(Into::into).collect();
        self
    }

    pub fn cache_ttl_secs(mut self, secs: u64) -> Self {
        self.cache.ttl_secs = secs;
        self
    }

    pub fn cache_expiry(mut self, expiry: CdrCacheExpiry) -> Self {
        self.cache.expiry = expiry;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.batch.workers = Some(workers);
        self
    }

    pub fn log(mut self, log: CdrLogConfig) -> Self {
        self.log = log;
        self
    }
}

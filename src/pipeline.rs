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

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::warn;

use crate::cache::CdrLookupCache;
use crate::enricher::{execute_enricher, CdrBoxedEnricher, CdrEnricher};
use crate::enrichers::{device, geo, subscriber, CdrStageKind};
use crate::errors::{CdrError, Result};
use crate::record::{CdrRecord, CdrStageOutcome};

/// Builds a stage that shares the pipeline's lookup cache.
pub type CdrEnricherFactory = fn(Arc<CdrLookupCache>) -> CdrBoxedEnricher;

pub const COMPOSITE_NAME: &str = "CompositeEnricher";

/// Ordered chain of stages applied to one record.
///
/// A failing stage never aborts the chain. Its attempted output is dropped,
/// it is recorded as `failed` in `enrichment_status`, and the next stage
/// runs on the last good wire form.
#[derive(Debug)]
pub struct CdrCompositeEnricher {
    stages: Vec<CdrBoxedEnricher>,
}

impl CdrCompositeEnricher {
    /// Constructs a composite from stages in the order they should run.
    ///
    /// Fails when two stages share a name, since each name is one
    /// `enrichment_status` key.
    pub fn new(stages: Vec<CdrBoxedEnricher>) -> Result<Self> {
        validate(&stages)?;
        Ok(CdrCompositeEnricher { stages })
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs every stage and returns the decoded result.
    ///
    /// Fails only when `data` itself cannot be decoded.
    pub fn run(&self, data: &[u8]) -> Result<CdrRecord> {
        let mut latest = CdrRecord::from_slice(data)?;
        let mut status = latest.enrichment_status.clone();
        let mut current: Cow<'_, [u8]> = Cow::Borrowed(data);

        for stage in &self.stages {
            let name = stage.name();
            let attempt = execute_enricher(stage.as_ref(), &current)
                .and_then(|out| CdrRecord::from_slice(&out).map(|record| (out, record)));

            match attempt {
                Ok((out, record)) => {
                    status.record(name, CdrStageOutcome::Success);
                    latest = record;
                    current = Cow::Owned(out);
                }
                Err(err) => {
                    warn!("enricher {name} failed: {err}");
                    status.record(name, CdrStageOutcome::Failed);
                }
            }
        }

        latest.enrichment_status = status;
        Ok(latest)
    }
}

impl CdrEnricher for CdrCompositeEnricher {
    fn name(&self) -> &'static str {
        COMPOSITE_NAME
    }

    fn enrich(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.run(data)?.to_vec()
    }
}

/// Builder that knows how to instantiate stages from source names.
///
/// All stages produced by one builder share its lookup cache.
pub struct CdrPipelineBuilder {
    cache: Arc<CdrLookupCache>,
    factories: HashMap<String, CdrEnricherFactory>,
    stages: Vec<CdrBoxedEnricher>,
}

impl CdrPipelineBuilder {
    /// Creates a builder with no registered sources.
    pub fn new(cache: Arc<CdrLookupCache>) -> Self {
        CdrPipelineBuilder {
            cache,
            factories: HashMap::new(),
            stages: Vec::new(),
        }
    }

    /// Creates a builder pre-loaded with the subscriber, device and geo stages.
    pub fn with_defaults(cache: Arc<CdrLookupCache>) -> Self {
        let mut builder = Self::new(cache);
        builder.register_defaults();
        builder
    }

    /// Registers a factory for the given source name.
    pub fn register(&mut self, source: impl Into<String>, factory: CdrEnricherFactory) {
        self.factories
            .insert(normalize(&source.into()), factory);
    }

    fn register_defaults(&mut self) {
        for kind in CdrStageKind::ALL {
            let factory = match kind {
                CdrStageKind::Subscriber => subscriber::subscriber_factory as CdrEnricherFactory,
                CdrStageKind::Device => device::device_factory as CdrEnricherFactory,
                CdrStageKind::Geo => geo::geo_factory as CdrEnricherFactory,
            };
            self.register(kind.source(), factory);
        }
    }

    pub fn cache(&self) -> &Arc<CdrLookupCache> {
        &self.cache
    }

    fn instantiate(&self, source: &str) -> Option<CdrBoxedEnricher> {
        match self.factories.get(&normalize(source)) {
            Some(factory) => Some(factory(self.cache.clone())),
            None => {
                warn!("unknown enrichment source: {source}");
                None
            }
        }
    }

    /// Appends the stage registered under `source`.
    ///
    /// Unknown sources are logged and skipped.
    pub fn with_source(mut self, source: &str) -> Self {
        if let Some(stage) = self.instantiate(source) {
            self.stages.push(stage);
        }
        self
    }

    /// Appends a caller-built stage.
    pub fn with_stage(mut self, stage: CdrBoxedEnricher) -> Self {
        self.stages.push(stage);
        self
    }

    /// Finishes the stages added so far.
    pub fn build(self) -> Result<CdrCompositeEnricher> {
        CdrCompositeEnricher::new(self.stages)
    }

    /// Builds a fresh composite from an ordered list of source names,
    /// ignoring stages added through `with_source`/`with_stage`.
    pub fn build_from_sources<S: AsRef<str>>(&self, sources: &[S]) -> Result<CdrCompositeEnricher> {
        let stages = sources
            .iter()
            .filter_map(|source| self.instantiate(source.as_ref()))
            .collect();
        CdrCompositeEnricher::new(stages)
    }
}

fn validate(stages: &[CdrBoxedEnricher]) -> Result<()> {
    let mut seen = HashSet::new();
    for stage in stages {
        if !seen.insert(stage.name()) {
            return Err(CdrError::pipeline(
                stage.name(),
                "stage name registered more than once",
            ));
        }
    }
    Ok(())
}

fn normalize(source: &str) -> String {
    source.trim().to_ascii_lowercase()
}

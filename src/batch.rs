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

//! # Cdrx Batch Module
//!
//! [`CdrBatchProcessor`] is the entry point of the enrichment core. It runs
//! the composite pipeline over one record or over a batch, isolating each
//! record's failure from the rest of the batch.
//!
//! ## Result Contract
//!
//! `process_batch` returns `Ok(records)` when every record succeeded. If any
//! record failed it returns a [`CdrBatchError`] that still carries every
//! record that did succeed, in input order. Failed records are logged and
//! counted but not identified.
//!
//! With the `parallel` feature, `process_batch_parallel` gives the same
//! contract while spreading records over a bounded Rayon pool.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::CdrConfig;
use crate::enricher::CdrEnricher;
use crate::errors::{CdrBatchError, CdrError, Result};
use crate::pipeline::{CdrCompositeEnricher, CdrPipelineBuilder};

/// Applies a composite enricher to single records and to batches.
pub struct CdrBatchProcessor {
    enricher: CdrCompositeEnricher,
    workers: usize,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl CdrBatchProcessor {
    /// Wraps an already-built composite.
    pub fn new(enricher: CdrCompositeEnricher) -> Self {
        CdrBatchProcessor {
            enricher,
            workers: num_cpus::get(),
            #[cfg(feature = "parallel")]
            pool: None,
        }
    }

    /// Builds the cache, the stages listed in `config.enrichment_sources`,
    /// and the processor around them.
    pub fn from_config(config: &CdrConfig) -> Result<Self> {
        let cache = Arc::new(config.cache.build_cache());
        let enricher = CdrPipelineBuilder::with_defaults(cache)
            .build_from_sources(config.enrichment_sources.as_slice())?;
        let processor = Self::new(enricher);
        match config.batch.workers {
            Some(workers) => processor.with_workers(workers),
            None => Ok(processor),
        }
    }

    /// Bounds parallel batch processing to `workers` threads.
    pub fn with_workers(mut self, workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(CdrError::validation("workers must be greater than zero"));
        }
        #[cfg(feature = "parallel")]
        {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|index| format!("cdrx-worker-{index}"))
                .build()
                .map_err(|err| CdrError::internal(format!("failed to build worker pool: {err}")))?;
            self.pool = Some(pool);
        }
        self.workers = workers;
        Ok(self)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn enricher(&self) -> &CdrCompositeEnricher {
        &self.enricher
    }

    /// Enriches one serialized record.
    ///
    /// Fails only when the record cannot be decoded; stage failures are
    /// reported inside the record's `enrichment_status`.
    pub fn process_one(&self, data: &[u8]) -> Result<Vec<u8>> {
        debug!("processing CDR with stages {:?}", self.enricher.stage_names());
        self.enricher.enrich(data)
    }

    /// Enriches every record of `batch` in order.
    pub fn process_batch<B: AsRef<[u8]>>(
        &self,
        batch: &[B],
    ) -> std::result::Result<Vec<Vec<u8>>, CdrBatchError> {
        let results = batch
            .iter()
            .enumerate()
            .map(|(index, data)| (index, self.process_one(data.as_ref())));
        collect_batch(results, batch.len())
    }

    /// Enriches `batch` on the worker pool, keeping input order.
    ///
    /// Uses the pool configured by [`with_workers`](Self::with_workers), or
    /// Rayon's global pool when none was configured.
    #[cfg(feature = "parallel")]
    pub fn process_batch_parallel<B: AsRef<[u8]> + Sync>(
        &self,
        batch: &[B],
    ) -> std::result::Result<Vec<Vec<u8>>, CdrBatchError> {
        use rayon::prelude::*;

        let run = || {
            batch
                .par_iter()
                .enumerate()
                .map(|(index, data)| (index, self.process_one(data.as_ref())))
                .collect::<Vec<_>>()
        };
        let results = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };
        collect_batch(results.into_iter(), batch.len())
    }
}

fn collect_batch<I>(results: I, total: usize) -> std::result::Result<Vec<Vec<u8>>, CdrBatchError>
where
    I: Iterator<Item = (usize, Result<Vec<u8>>)>,
{
    let mut processed = Vec::with_capacity(total);
    let mut failed = 0usize;

    for (index, result) in results {
        match result {
            Ok(data) => processed.push(data),
            Err(err) => {
                warn!("failed to process CDR {index}: {err}");
                failed += 1;
            }
        }
    }

    info!(
        "batch complete: {} processed, {failed} failed",
        processed.len()
    );

    if failed > 0 {
        return Err(CdrBatchError {
            failed,
            total,
            processed,
        });
    }
    Ok(processed)
}

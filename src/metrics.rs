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

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::errors::Result;
use crate::record::{CdrRecord, CdrStageOutcome};

/// Summary of how well a batch of records was enriched.
#[derive(Debug, Serialize, Default, PartialEq)]
pub struct CdrEnrichmentMetrics {
    pub total_records: usize,
    /// Records on which every attempted stage succeeded.
    pub fully_enriched: usize,
    pub stage_success: BTreeMap<String, usize>,
    pub stage_failed: BTreeMap<String, usize>,
    /// `fully_enriched / total_records`, or 0.0 for an empty batch.
    pub coverage: f64,
}

impl CdrEnrichmentMetrics {
    pub fn compute(records: &[CdrRecord]) -> Self {
        let mut metrics = CdrEnrichmentMetrics {
            total_records: records.len(),
            ..Default::default()
        };

        if records.is_empty() {
            return metrics;
        }

        for record in records {
            let status = &record.enrichment_status;
            if status.all_succeeded() {
                metrics.fully_enriched += 1;
            }
            for (stage, outcome) in status.iter() {
                let counts = match outcome {
                    CdrStageOutcome::Success => &mut metrics.stage_success,
                    CdrStageOutcome::Failed => &mut metrics.stage_failed,
                };
                *counts.entry(stage.to_string()).or_insert(0) += 1;
            }
        }

        metrics.coverage = metrics.fully_enriched as f64 / metrics.total_records as f64;
        metrics
    }

    /// Decodes serialized records and computes metrics over them.
    pub fn compute_from_bytes<B: AsRef<[u8]>>(batch: &[B]) -> Result<Self> {
        let records = batch
            .iter()
            .map(|data| CdrRecord::from_slice(data.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::compute(&records))
    }

    pub fn as_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

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

//! # Cdrx Enricher Module
//!
//! This module defines [`CdrEnricher`], the contract every enrichment stage
//! implements, and small helpers for running one.
//!
//! ## Stage Contract
//!
//! A stage receives the current wire form of a record and returns a new wire
//! form with the fields it owns populated. It must leave every other field
//! as it found it, and it must not rely on another stage having run first:
//! any stage may be left out of a given pipeline.
//!
//! ```rust
//! use cdrx::enricher::{enrich_record, CdrEnricher};
//! use cdrx::errors::Result;
//!
//! #[derive(Debug)]
//! struct ServiceTagger;
//!
//! impl CdrEnricher for ServiceTagger {
//!     fn name(&self) -> &'static str {
//!         "ServiceTagger"
//!     }
//!
//!     fn enrich(&self, data: &[u8]) -> Result<Vec<u8>> {
//!         enrich_record(data, |record| {
//!             record.extra.insert("service_group".into(), "data".into());
//!         })
//!     }
//! }
//! ```

use crate::errors::{CdrError, Result};
use crate::record::CdrRecord;

/// Contract that every enrichment stage fulfils.
pub trait CdrEnricher: std::fmt::Debug {
    /// Stable stage name, used as the key into `enrichment_status`.
    ///
    /// Must be unique within a pipeline.
    fn name(&self) -> &'static str;

    /// Enriches one serialized record.
    ///
    /// Returns an error only when the input cannot be decoded or the stage
    /// cannot otherwise complete. Lookup misses are not errors.
    fn enrich(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Boxed stage as stored by pipelines.
pub type CdrBoxedEnricher = Box<dyn CdrEnricher + Send + Sync>;

/// Decodes `data`, applies `apply`, and re-encodes the record.
pub fn enrich_record<F>(data: &[u8], apply: F) -> Result<Vec<u8>>
where
    F: FnOnce(&mut CdrRecord),
{
    let mut record = CdrRecord::from_slice(data)?;
    apply(&mut record);
    record.to_vec()
}

/// Runs a stage and tags any error with the stage name.
pub fn execute_enricher(enricher: &dyn CdrEnricher, data: &[u8]) -> Result<Vec<u8>> {
    enricher
        .enrich(data)
        .map_err(|err| CdrError::stage(enricher.name(), err.to_string()))
}

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

//! # Cdrx Core Library
//!
//! Cdrx enriches call data records (CDRs) with subscriber, device and
//! location attributes. Records travel between stages in their serialized
//! form, lookups are memoized in a cache shared by every stage, and a
//! failing stage marks the record instead of dropping it.
//!
//! ## Module Overview
//!
//! - **record**: CdrRecord, its wire format, and per-stage enrichment status
//! - **cache**: CdrLookupCache, the shared concurrent lookup memo
//! - **enricher**: the CdrEnricher stage contract
//! - **enrichers**: built-in subscriber, device and geo stages
//! - **pipeline**: CdrCompositeEnricher and the source-name builder
//! - **batch**: CdrBatchProcessor, sequential and parallel batch runs
//! - **config**: YAML/JSON pipeline configuration
//! - **logging**: optional `log` backend
//! - **metrics**: enrichment coverage over a batch
//!
//! ## Feature Flags
//!
//! - `parallel`: Enables `process_batch_parallel` on a bounded Rayon pool
//! - `full`: Enables all features
//!
//! ## Quick Start
//!
//! ```rust
//! use cdrx::{CdrBatchProcessor, CdrConfig};
//!
//! let processor = CdrBatchProcessor::from_config(&CdrConfig::default()).unwrap();
//! let out = processor
//!     .process_one(br#"{"id":"cdr_001","imsi":"001234567890123","cell_id":"NYC001"}"#)
//!     .unwrap();
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return `Result<T, CdrError>`. Batch runs return
//! [`CdrBatchError`], which carries the records that did succeed.

#![allow(non_snake_case)]

pub mod errors;
pub mod record;
pub mod cache;
pub mod enricher;
pub mod enrichers;
pub mod pipeline;
pub mod batch;
pub mod config;
pub mod logging;
pub mod metrics;

pub use errors::{CdrBatchError, CdrError, Result};
pub use record::{CdrEnrichmentStatus, CdrRecord, CdrRecordBatch, CdrStageOutcome};
pub use cache::{CdrCacheEntry, CdrCacheExpiry, CdrCacheValue, CdrLookupCache, DEFAULT_TTL_SECS};
pub use enricher::{enrich_record, execute_enricher, CdrBoxedEnricher, CdrEnricher};
pub use enrichers::{
    CdrDeviceClass, CdrDeviceEnricher, CdrGeoEnricher, CdrGeoLocation, CdrStageKind,
    CdrSubscriberEnricher, CdrSubscriberProfile,
};
pub use pipeline::{CdrCompositeEnricher, CdrEnricherFactory, CdrPipelineBuilder, COMPOSITE_NAME};
pub use batch::CdrBatchProcessor;
pub use config::{CdrBatchConfig, CdrCacheConfig, CdrConfig};
pub use logging::{CdrLogConfig, CdrLogger};
pub use metrics::CdrEnrichmentMetrics;

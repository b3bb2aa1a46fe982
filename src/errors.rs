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

//! # Cdrx Error Module
//!
//! This module defines the error types used throughout the Cdrx enrichment
//! pipeline.
//!
//! ## Propagation Policy
//!
//! - **Serde**: the input bytes cannot be decoded into a record. Fatal to a
//!   single `process_one` or composite call and propagated to the caller.
//! - **Stage**: a stage could not complete. Absorbed by the composite into the
//!   record's `enrichment_status`, never surfaced from a composite call.
//! - **Batch**: one or more records of a batch failed. Reported as a count,
//!   alongside every record that did succeed (see [`CdrBatchError`]).
//!
//! Lookup misses are not errors at all; every lookup resolves to a value.

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience result type used throughout Cdrx.
pub type Result<T> = std::result::Result<T, CdrError>;

/// Canonical error enumeration for Cdrx.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum CdrError {
    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    /// Malformed input bytes or an unserializable record.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Validation errors triggered by invalid parameters or configuration.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Any failure raised by an enrichment stage.
    #[error("stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },

    /// Failures that occur while assembling or running a pipeline.
    #[error("pipeline error at stage '{stage}': {message}")]
    Pipeline { stage: String, message: String },

    /// Aggregate failure of a batch, without the surviving records.
    #[error("failed to process {failed} of {total} CDRs")]
    Batch { failed: usize, total: usize },

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for CdrError {
    fn from(err: io::Error) -> Self {
        CdrError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CdrError {
    fn from(err: serde_json::Error) -> Self {
        CdrError::Serde(err.to_string())
    }
}

impl From<serde_yaml::Error> for CdrError {
    fn from(err: serde_yaml::Error) -> Self {
        CdrError::Serde(err.to_string())
    }
}

impl CdrError {
    /// Helper to construct simple validation errors.
    pub fn validation<T: Into<String>>(message: T) -> Self {
        CdrError::Validation {
            message: message.into(),
        }
    }

    /// Helper to construct serialization errors.
    pub fn serde<T: Into<String>>(message: T) -> Self {
        CdrError::Serde(message.into())
    }

    /// Helper to construct stage errors.
    pub fn stage(name: impl Into<String>, message: impl Into<String>) -> Self {
        CdrError::Stage {
            stage: name.into(),
            message: message.into(),
        }
    }

    /// Helper to construct pipeline errors.
    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        CdrError::Pipeline {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        CdrError::Internal(message.into())
    }
}

/// Aggregate error returned by a batch run with at least one failed record.
///
/// The records that did succeed travel with the error, in input order, so a
/// partial failure never discards finished work. The error does not say
/// which indices failed; compare `processed.len()` with `total` to learn how
/// many were dropped.
#[derive(Debug, Error, Serialize, Deserialize)]
#[error("failed to process {failed} CDRs")]
pub struct CdrBatchError {
    /// Number of records that could not be processed.
    pub failed: usize,
    /// Number of records submitted.
    pub total: usize,
    /// Successfully enriched records, in input order.
    pub processed: Vec<Vec<u8>>,
}

impl CdrBatchError {
    /// Consumes the error and returns the successfully processed records.
    pub fn into_processed(self) -> Vec<Vec<u8>> {
        self.processed
    }
}

impl From<CdrBatchError> for CdrError {
    fn from(err: CdrBatchError) -> Self {
        CdrError::Batch {
            failed: err.failed,
            total: err.total,
        }
    }
}

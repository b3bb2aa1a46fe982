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

//! # Cdrx Record Module
//!
//! This module provides [`CdrRecord`], the call data record that flows
//! through the enrichment pipeline, and [`CdrEnrichmentStatus`], the
//! per-stage outcome report carried alongside it.
//!
//! ## Wire Format
//!
//! Records travel between stages as JSON objects. Enrichment fields are
//! omitted until a stage populates them, so a partially enriched record and
//! a fully enriched one differ only by which fields are present:
//!
//! ```json
//! {"id":"cdr_001","imsi":"001234567890123","imei":"351234567890123",
//!  "cell_id":"NYC001","event_type":"data_session","duration":3600,
//!  "data_volume":1024000,"subscriber_type":"premium",
//!  "enrichment_status":{"SubscriberEnricher":"success"}}
//! ```
//!
//! Every base field defaults when missing. `timestamp` and the top-level
//! fields the record does not model are never reinterpreted: they are kept
//! as JSON values (numbers with their original digits) and written back
//! unchanged.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::de::{self, DeserializeOwned, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::errors::{CdrError, Result};

/// Outcome of one stage for one record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CdrStageOutcome {
    Success,
    Failed,
}

impl CdrStageOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CdrStageOutcome::Success => "success",
            CdrStageOutcome::Failed => "failed",
        }
    }
}

impl fmt::Display for CdrStageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-stage outcomes, kept in the order the stages were attempted.
///
/// Serializes as a JSON object `{stageName: "success" | "failed"}` whose keys
/// appear in insertion order. Recording a stage that is already present
/// replaces its outcome in place, so each stage name appears at most once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CdrEnrichmentStatus {
    entries: Vec<(String, CdrStageOutcome)>,
}

impl CdrEnrichmentStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of a stage.
    pub fn record(&mut self, stage: impl Into<String>, outcome: CdrStageOutcome) {
        let stage = stage.into();
        match self.entries.iter_mut().find(|(name, _)| *name == stage) {
            Some(entry) => entry.1 = outcome,
            None => self.entries.push((stage, outcome)),
        }
    }

    pub fn get(&self, stage: &str) -> Option<CdrStageOutcome> {
        self.entries
            .iter()
            .find(|(name, _)| name == stage)
            .map(|(_, outcome)| *outcome)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(stage, outcome)` pairs in attempt order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, CdrStageOutcome)> {
        self.entries
            .iter()
            .map(|(name, outcome)| (name.as_str(), *outcome))
    }

    /// Stage names in attempt order.
    pub fn stages(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// True when at least one stage ran and none failed.
    pub fn all_succeeded(&self) -> bool {
        !self.entries.is_empty()
            && self
                .entries
                .iter()
                .all(|(_, outcome)| *outcome == CdrStageOutcome::Success)
    }
}

impl Serialize for CdrEnrichmentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, outcome) in &self.entries {
            map.serialize_entry(name, outcome)?;
        }
        map.end()
    }
}

struct StatusVisitor;

impl<'de> Visitor<'de> for StatusVisitor {
    type Value = CdrEnrichmentStatus;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of stage names to \"success\" or \"failed\"")
    }

    fn visit_unit<E: serde::de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(CdrEnrichmentStatus::default())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut status = CdrEnrichmentStatus::default();
        while let Some((stage, outcome)) = access.next_entry::<String, CdrStageOutcome>()? {
            status.record(stage, outcome);
        }
        Ok(status)
    }
}

impl<'de> Deserialize<'de> for CdrEnrichmentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // `any` rather than `map` so an explicit null decodes as empty
        deserializer.deserialize_any(StatusVisitor)
    }
}

/// Call data record enriched by the pipeline.
///
/// `imsi`, `imei` and `cell_id` are the correlation keys the subscriber,
/// device and geo stages look up; an empty string is a valid "no correlation
/// available" value. The base fields are opaque to the pipeline and pass
/// through unchanged. Each enrichment field is owned by exactly one stage.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CdrRecord {
    pub id: String,
    pub imsi: String,
    pub msisdn: String,
    pub imei: String,
    pub cell_id: String,
    /// Event time exactly as received, usually an RFC 3339 string.
    pub timestamp: Option<Value>,
    pub event_type: String,
    pub service_id: String,
    pub duration: i64,
    pub data_volume: i64,

    // subscriber stage
    pub subscriber_type: Option<String>,
    pub service_plan: Option<String>,
    pub account_type: Option<String>,

    // device stage
    pub device_type: Option<String>,

    // geo stage
    pub location_region: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Outcome of every stage attempted on this record.
    pub enrichment_status: CdrEnrichmentStatus,

    /// Top-level fields not modelled above, preserved verbatim.
    pub extra: Map<String, Value>,
}

/// Wire names of the modelled fields, in encoding order.
pub const CDR_FIELDS: [&str; 18] = [
    "id",
    "imsi",
    "msisdn",
    "imei",
    "cell_id",
    "timestamp",
    "event_type",
    "service_id",
    "duration",
    "data_volume",
    "subscriber_type",
    "service_plan",
    "account_type",
    "device_type",
    "location_region",
    "latitude",
    "longitude",
    "enrichment_status",
];

fn take<T>(fields: &mut Map<String, Value>, key: &str) -> serde_json::Result<T>
where
    T: DeserializeOwned + Default,
{
    match fields.remove(key) {
        Some(value) => serde_json::from_value(value)
            .map_err(|err| de::Error::custom(format!("field `{key}`: {err}"))),
        None => Ok(T::default()),
    }
}

impl CdrRecord {
    fn from_fields(mut fields: Map<String, Value>) -> serde_json::Result<Self> {
        Ok(CdrRecord {
            id: take(&mut fields, "id")?,
            imsi: take(&mut fields, "imsi")?,
            msisdn: take(&mut fields, "msisdn")?,
            imei: take(&mut fields, "imei")?,
            cell_id: take(&mut fields, "cell_id")?,
            // kept as-is, null included
            timestamp: fields.remove("timestamp"),
            event_type: take(&mut fields, "event_type")?,
            service_id: take(&mut fields, "service_id")?,
            duration: take(&mut fields, "duration")?,
            data_volume: take(&mut fields, "data_volume")?,
            subscriber_type: take(&mut fields, "subscriber_type")?,
            service_plan: take(&mut fields, "service_plan")?,
            account_type: take(&mut fields, "account_type")?,
            device_type: take(&mut fields, "device_type")?,
            location_region: take(&mut fields, "location_region")?,
            latitude: take(&mut fields, "latitude")?,
            longitude: take(&mut fields, "longitude")?,
            enrichment_status: take(&mut fields, "enrichment_status")?,
            extra: fields,
        })
    }
}

impl<'de> Deserialize<'de> for CdrRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        CdrRecord::from_fields(fields).map_err(de::Error::custom)
    }
}

fn serialize_some<M: SerializeMap, T: Serialize>(
    map: &mut M,
    key: &str,
    value: &Option<T>,
) -> std::result::Result<(), M::Error> {
    match value {
        Some(value) => map.serialize_entry(key, value),
        None => Ok(()),
    }
}

impl Serialize for CdrRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("imsi", &self.imsi)?;
        map.serialize_entry("msisdn", &self.msisdn)?;
        map.serialize_entry("imei", &self.imei)?;
        map.serialize_entry("cell_id", &self.cell_id)?;
        serialize_some(&mut map, "timestamp", &self.timestamp)?;
        map.serialize_entry("event_type", &self.event_type)?;
        map.serialize_entry("service_id", &self.service_id)?;
        map.serialize_entry("duration", &self.duration)?;
        map.serialize_entry("data_volume", &self.data_volume)?;
        serialize_some(&mut map, "subscriber_type", &self.subscriber_type)?;
        serialize_some(&mut map, "service_plan", &self.service_plan)?;
        serialize_some(&mut map, "account_type", &self.account_type)?;
        serialize_some(&mut map, "device_type", &self.device_type)?;
        serialize_some(&mut map, "location_region", &self.location_region)?;
        serialize_some(&mut map, "latitude", &self.latitude)?;
        serialize_some(&mut map, "longitude", &self.longitude)?;
        if !self.enrichment_status.is_empty() {
            map.serialize_entry("enrichment_status", &self.enrichment_status)?;
        }
        for (key, value) in &self.extra {
            if !CDR_FIELDS.contains(&key.as_str()) {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

impl CdrRecord {
    /// Creates an empty record with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        CdrRecord {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Decodes a record from its wire form.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data)
            .map_err(|err| CdrError::serde(format!("failed to decode CDR: {err}")))
    }

    /// Encodes the record into its wire form.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Pretty-printed JSON, mostly for diagnostics.
    pub fn to_pretty_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses `timestamp` as RFC 3339, keeping its UTC offset.
    ///
    /// `None` when the field is absent or not an RFC 3339 string.
    pub fn event_time(&self) -> Option<DateTime<FixedOffset>> {
        let text = self.timestamp.as_ref()?.as_str()?;
        DateTime::parse_from_rfc3339(text).ok()
    }
}

/// Convenience alias for working on decoded batches of records.
pub type CdrRecordBatch = Vec<CdrRecord>;

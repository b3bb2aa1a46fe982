//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Cdrx.
//! The Cdrx project belongs to the Dunimd Team.

use std::fs;
use std::sync::Arc;

use cdrx::{
    CdrBatchProcessor, CdrCacheExpiry, CdrConfig, CdrEnrichmentMetrics, CdrError,
    CdrLookupCache, CdrPipelineBuilder, CdrRecord,
};
use serde_json::json;
use tempfile::tempdir;

fn sample_cdrs() -> Vec<Vec<u8>> {
    vec![
        json!({
            "id": "cdr_001", "imsi": "001234567890123", "msisdn": "+1234567890",
            "imei": "351234567890123", "cell_id": "NYC001",
            "timestamp": "2025-08-06T12:00:00Z", "event_type": "data_session",
            "service_id": "internet", "duration": 3600, "data_volume": 1024000
        }),
        json!({
            "id": "cdr_002", "imsi": "002345678901234", "msisdn": "+1234567891",
            "imei": "861234567890123", "cell_id": "LAX002",
            "timestamp": "2025-08-06T12:05:00Z", "event_type": "voice_call",
            "service_id": "voice", "duration": 180, "data_volume": 0
        }),
        json!({
            "id": "cdr_003", "imsi": "003456789012345", "msisdn": "+1234567892",
            "imei": "354567890123456", "cell_id": "CHI003",
            "timestamp": "2025-08-06T12:10:00Z", "event_type": "sms",
            "service_id": "messaging", "duration": 0, "data_volume": 160
        }),
    ]
    .into_iter()
    .map(|value| serde_json::to_vec(&value).unwrap())
    .collect()
}

fn processor() -> CdrBatchProcessor {
    CdrBatchProcessor::from_config(&CdrConfig::default()).unwrap()
}

fn ids(batch: &[Vec<u8>]) -> Vec<String> {
    batch
        .iter()
        .map(|data| CdrRecord::from_slice(data).unwrap().id)
        .collect()
}

/// The three sample CDRs enrich to their expected attributes.
#[test]
fn test_batch_sample_cdrs() {
    let out = processor().process_batch(&sample_cdrs()).unwrap();
    let records: Vec<CdrRecord> = out
        .iter()
        .map(|data| CdrRecord::from_slice(data).unwrap())
        .collect();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].subscriber_type.as_deref(), Some("premium"));
    assert_eq!(records[0].location_region.as_deref(), Some("New York"));
    assert_eq!(records[1].subscriber_type.as_deref(), Some("standard"));
    assert_eq!(records[1].device_type.as_deref(), Some("iot_device"));
    assert_eq!(records[1].location_region.as_deref(), Some("Los Angeles"));
    assert_eq!(records[2].subscriber_type.as_deref(), Some("basic"));
    assert_eq!(records[2].device_type.as_deref(), Some("smartphone"));
    assert_eq!(records[2].location_region.as_deref(), Some("Unknown"));
    assert!(records.iter().all(|r| r.enrichment_status.all_succeeded()));
}

/// A malformed record is counted while the others are still returned in order.
#[test]
fn test_batch_partial_failure() {
    let mut batch = sample_cdrs();
    batch.insert(1, br#"{"invalid": json}"#.to_vec());

    let err = processor().process_batch(&batch).unwrap_err();
    assert_eq!(err.failed, 1);
    assert_eq!(err.total, 4);
    assert_eq!(err.to_string(), "failed to process 1 CDRs");
    assert_eq!(ids(&err.processed), vec!["cdr_001", "cdr_002", "cdr_003"]);

    let aggregate: CdrError = err.into();
    assert!(matches!(aggregate, CdrError::Batch { failed: 1, total: 4 }));
}

/// Two valid records and one invalid yield two results and an error.
#[test]
fn test_batch_two_of_three() {
    let batch = vec![
        br#"{"id":"a","imsi":"001"}"#.to_vec(),
        b"not json".to_vec(),
        br#"{"id":"b","imsi":"002"}"#.to_vec(),
    ];
    let err = processor().process_batch(&batch).unwrap_err();

    assert_eq!(err.failed, 1);
    assert_eq!(ids(&err.into_processed()), vec!["a", "b"]);
}

/// An empty batch yields an empty result.
#[test]
fn test_batch_empty() {
    let batch: Vec<Vec<u8>> = Vec::new();
    assert!(processor().process_batch(&batch).unwrap().is_empty());
}

/// `process_one` surfaces decode failures directly.
#[test]
fn test_process_one() {
    let processor = processor();
    let out = processor.process_one(&sample_cdrs()[0]).unwrap();
    assert_eq!(CdrRecord::from_slice(&out).unwrap().enrichment_status.len(), 3);

    assert!(processor.process_one(b"").is_err());
}

/// The parallel path keeps input order and matches the sequential output.
#[cfg(feature = "parallel")]
#[test]
fn test_batch_parallel_matches_sequential() {
    let mut batch = Vec::new();
    for i in 0..64 {
        batch.push(serde_json::to_vec(&json!({"id": format!("cdr_{i:03}"), "imsi": "001", "cell_id": "LAX"})).unwrap());
    }
    batch.push(b"{".to_vec());

    let processor = processor().with_workers(4).unwrap();
    assert_eq!(processor.workers(), 4);

    let sequential = processor.process_batch(&batch).unwrap_err();
    let parallel = processor.process_batch_parallel(&batch).unwrap_err();

    assert_eq!(parallel.failed, 1);
    assert_eq!(parallel.total, 65);
    assert_eq!(parallel.processed, sequential.processed);
    assert_eq!(ids(&parallel.processed)[0], "cdr_000");
    assert_eq!(ids(&parallel.processed)[63], "cdr_063");
}

/// Zero workers is a configuration error.
#[test]
fn test_batch_rejects_zero_workers() {
    let config = CdrConfig::new().workers(0);
    let err = CdrBatchProcessor::from_config(&config).err().unwrap();
    assert!(matches!(err, CdrError::Validation { .. }));
}

/// A processor can wrap a hand-built composite.
#[test]
fn test_batch_with_custom_composite() {
    let composite = CdrPipelineBuilder::with_defaults(Arc::new(CdrLookupCache::default()))
        .with_source("device")
        .build()
        .unwrap();
    let processor = CdrBatchProcessor::new(composite);

    let out = processor.process_batch(&sample_cdrs()).unwrap();
    let metrics = CdrEnrichmentMetrics::compute_from_bytes(&out).unwrap();

    assert_eq!(processor.enricher().stage_names(), vec!["DeviceEnricher"]);
    assert_eq!(metrics.total_records, 3);
    assert_eq!(metrics.fully_enriched, 3);
    assert_eq!(metrics.stage_success["DeviceEnricher"], 3);
}

/// A YAML configuration file selects stages and cache behaviour.
#[test]
fn test_batch_from_yaml_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cdrx.yaml");
    fs::write(
        &path,
        "enrichment_sources: [geo, weather]\ncache:\n  ttl_secs: 60\n  expiry: on_read\nbatch:\n  workers: 2\n",
    )
    .unwrap();

    let config = CdrConfig::from_path(&path).unwrap();
    assert_eq!(config.cache.expiry, CdrCacheExpiry::OnRead);

    let processor = CdrBatchProcessor::from_config(&config).unwrap();
    assert_eq!(processor.workers(), 2);
    assert_eq!(processor.enricher().stage_names(), vec!["GeoEnricher"]);

    let out = processor.process_batch(&sample_cdrs()).unwrap();
    let record = CdrRecord::from_slice(&out[1]).unwrap();
    assert_eq!(record.location_region.as_deref(), Some("Los Angeles"));
    assert!(record.subscriber_type.is_none());
}

/// A JSON configuration file is recognised by its extension.
#[test]
fn test_batch_from_json_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cdrx.json");
    fs::write(&path, r#"{"enrichment_sources": ["subscriber"], "log": {"level": "DEBUG"}}"#).unwrap();

    let config = CdrConfig::from_path(&path).unwrap();
    assert_eq!(config.log.level, "DEBUG");
    assert_eq!(config.cache.ttl_secs, 300);

    let processor = CdrBatchProcessor::from_config(&config).unwrap();
    assert_eq!(processor.enricher().stage_names(), vec!["SubscriberEnricher"]);
}

/// A missing configuration file is an IO error.
#[test]
fn test_config_missing_file() {
    let dir = tempdir().unwrap();
    let err = CdrConfig::from_path(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, CdrError::Io(_)));
}

/// Timestamps keep their offset, precision and type through the full pipeline.
#[test]
fn test_process_one_preserves_timestamp_verbatim() {
    let processor = processor();
    for timestamp in [
        r#""2025-08-06T12:00:00+02:00""#,
        r#""2025-08-06T12:00:00.500000000Z""#,
        "1754481600",
    ] {
        let input = format!(r#"{{"id":"cdr_t","imsi":"001","timestamp":{timestamp}}}"#);
        let out = String::from_utf8(processor.process_one(input.as_bytes()).unwrap()).unwrap();

        assert!(out.contains(&format!(r#""timestamp":{timestamp}"#)), "{out}");
        assert!(out.contains(r#""subscriber_type":"premium""#));
    }
}

/// Unknown numeric fields keep every digit through the full pipeline.
#[test]
fn test_process_one_preserves_large_unknown_numbers() {
    let input = br#"{"id":"a","big":123456789012345678901234567890,"ratio":0.10000000000000000001}"#;
    let out = String::from_utf8(processor().process_one(input).unwrap()).unwrap();

    assert!(out.contains(r#""big":123456789012345678901234567890"#), "{out}");
    assert!(out.contains(r#""ratio":0.10000000000000000001"#), "{out}");
}

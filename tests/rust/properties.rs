//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Cdrx.
//! The Cdrx project belongs to the Dunimd Team.

use std::sync::Arc;

use cdrx::{
    CdrDeviceClass, CdrEnricher, CdrGeoLocation, CdrLookupCache, CdrPipelineBuilder, CdrRecord,
    CdrSubscriberProfile,
};
use proptest::prelude::*;
use serde_json::{json, Value};

/// JSON text for a timestamp in one of the shapes seen in the wild.
fn timestamp_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "2025-0[1-9]-1[0-9]T1[0-9]:[0-5][0-9]:[0-5][0-9](\\.[0-9]{1,9})?(Z|[+-]0[0-9]:[03]0)"
            .prop_map(|text| format!("\"{text}\"")),
        (0i64..4_000_000_000).prop_map(|secs| secs.to_string()),
        Just("null".to_string()),
    ]
}

/// JSON text for an unmodelled field, including numbers beyond f64 precision.
fn extra_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[1-9][0-9]{18,30}",
        "-?[0-9]\\.[0-9]{17,25}",
        "[a-z ]{0,10}".prop_map(|text| format!("\"{text}\"")),
        Just("true".to_string()),
        Just(r#"{"nested":[1,2.50,"x"]}"#.to_string()),
    ]
}

fn encode(id: &str, imsi: &str, imei: &str, cell_id: &str, duration: i64, data_volume: i64) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": id,
        "imsi": imsi,
        "imei": imei,
        "cell_id": cell_id,
        "duration": duration,
        "data_volume": data_volume,
    }))
    .unwrap()
}

proptest! {
    /// Lookups are pure functions of their key.
    #[test]
    fn test_lookups_are_deterministic(key in "[0-9A-Z]{0,16}") {
        prop_assert_eq!(CdrSubscriberProfile::lookup(&key), CdrSubscriberProfile::lookup(&key));
        prop_assert_eq!(CdrDeviceClass::lookup(&key), CdrDeviceClass::lookup(&key));
        prop_assert_eq!(CdrGeoLocation::lookup(&key), CdrGeoLocation::lookup(&key));
    }

    /// Cached and uncached pipelines produce the same record.
    #[test]
    fn test_cache_does_not_change_results(
        imsi in "(001|002|00[3-9])[0-9]{0,12}",
        imei in "(35|86|[0-9]{2})[0-9]{0,13}",
        cell in "(NYC|LAX|[A-Z]{3})[0-9]{0,3}",
    ) {
        let input = encode("p", &imsi, &imei, &cell, 1, 1);
        let warm = CdrPipelineBuilder::with_defaults(Arc::new(CdrLookupCache::default()))
            .build_from_sources(&["subscriber", "device", "geo"])
            .unwrap();

        let first = warm.run(&input).unwrap();
        let second = warm.run(&input).unwrap();
        let cold = CdrPipelineBuilder::with_defaults(Arc::new(CdrLookupCache::default()))
            .build_from_sources(&["subscriber", "device", "geo"])
            .unwrap()
            .run(&input)
            .unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first, &cold);
    }

    /// Every field no stage owns passes through the full pipeline untouched.
    #[test]
    fn test_unowned_fields_survive_enrichment(
        id in "[a-z0-9_]{1,12}",
        imsi in "[0-9]{0,15}",
        msisdn in "\\+?[0-9]{0,15}",
        event_type in "[a-z_]{0,12}",
        service_id in "[a-z_]{0,12}",
        timestamp in timestamp_text(),
        duration in any::<i64>(),
        data_volume in any::<i64>(),
        extras in proptest::collection::btree_map("x_[a-z]{1,8}", extra_text(), 0..4),
    ) {
        let mut input = format!(
            r#"{{"id":"{id}","imsi":"{imsi}","msisdn":"{msisdn}","event_type":"{event_type}","service_id":"{service_id}","timestamp":{timestamp},"duration":{duration},"data_volume":{data_volume}"#
        );
        for (key, value) in &extras {
            input.push_str(&format!(r#","{key}":{value}"#));
        }
        input.push('}');

        let out = CdrPipelineBuilder::with_defaults(Arc::new(CdrLookupCache::default()))
            .build_from_sources(&["subscriber", "device", "geo"])
            .unwrap()
            .enrich(input.as_bytes())
            .unwrap();

        let before: Value = serde_json::from_str(&input).unwrap();
        let after: Value = serde_json::from_slice(&out).unwrap();
        let before = before.as_object().unwrap();
        for (key, value) in before {
            prop_assert_eq!(Some(value), after.get(key), "field {}", key);
        }
        for (key, value) in &extras {
            let expected = format!(r#""{key}":{value}"#);
            prop_assert!(String::from_utf8_lossy(&out).contains(&expected), "missing {}", expected);
        }
    }

    /// The status holds exactly one entry per configured stage.
    #[test]
    fn test_status_has_one_entry_per_stage(
        sources in proptest::sample::subsequence(vec!["subscriber", "device", "geo"], 0..=3),
    ) {
        let composite = CdrPipelineBuilder::with_defaults(Arc::new(CdrLookupCache::default()))
            .build_from_sources(&sources)
            .unwrap();
        let record: CdrRecord = composite.run(&encode("s", "001", "35", "NYC", 0, 0)).unwrap();

        prop_assert_eq!(record.enrichment_status.len(), sources.len());
        prop_assert_eq!(record.enrichment_status.stages(), composite.stage_names());
    }
}

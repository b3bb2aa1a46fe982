//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Cdrx.
//! The Cdrx project belongs to the Dunimd Team.
//!
//! Mediation demo
//!
//! Enriches three sample CDRs with the default pipeline and prints the
//! results to stdout. An optional argument names a YAML or JSON config file.

use anyhow::Context;
use chrono::{SecondsFormat, TimeZone, Utc};
use serde_json::Value;
use cdrx::{CdrBatchProcessor, CdrConfig, CdrEnrichmentMetrics, CdrLogger, CdrRecord};

#[allow(clippy::too_many_arguments)]
fn sample_cdr(
    id: &str,
    imsi: &str,
    imei: &str,
    cell_id: &str,
    minute: u32,
    event_type: &str,
    duration: i64,
    data_volume: i64,
) -> CdrRecord {
    CdrRecord {
        imsi: imsi.to_string(),
        msisdn: format!("+123456789{}", &id[id.len() - 1..]),
        imei: imei.to_string(),
        cell_id: cell_id.to_string(),
        timestamp: Utc
            .with_ymd_and_hms(2025, 8, 6, 12, minute, 0)
            .single()
            .map(|at| Value::String(at.to_rfc3339_opts(SecondsFormat::Secs, true))),
        event_type: event_type.to_string(),
        duration,
        data_volume,
        ..CdrRecord::new(id)
    }
}

fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => CdrConfig::from_path(&path).with_context(|| format!("loading {path}"))?,
        None => CdrConfig::default(),
    };
    CdrLogger::init(&config.log)?;

    let processor = CdrBatchProcessor::from_config(&config)?;

    let cdrs = [
        sample_cdr("cdr_001", "001234567890123", "351234567890123", "NYC001", 0, "data_session", 3600, 1024000),
        sample_cdr("cdr_002", "002345678901234", "861234567890123", "LAX002", 5, "voice_call", 180, 0),
        sample_cdr("cdr_003", "003456789012345", "354567890123456", "CHI003", 10, "sms", 0, 160),
    ];
    let batch = cdrs
        .iter()
        .map(CdrRecord::to_vec)
        .collect::<cdrx::Result<Vec<_>>>()?;

    let enriched = match processor.process_batch(&batch) {
        Ok(enriched) => enriched,
        Err(err) => {
            eprintln!("{err}");
            err.into_processed()
        }
    };

    for (original, data) in cdrs.iter().zip(&enriched) {
        let record = CdrRecord::from_slice(data)?;
        println!("Original CDR {}:", original.id);
        println!("{}", original.to_pretty_string()?);
        println!("Enriched CDR {}:", record.id);
        println!("{}", record.to_pretty_string()?);
    }

    let metrics = CdrEnrichmentMetrics::compute_from_bytes(&enriched)?;
    eprintln!();
    eprintln!("Enrichment completed:");
    eprintln!("  Records:        {}", metrics.total_records);
    eprintln!("  Fully enriched: {}", metrics.fully_enriched);
    eprintln!("  Coverage:       {:.0}%", metrics.coverage * 100.0);

    Ok(())
}

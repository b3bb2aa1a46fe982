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

//! # Cdrx Logging
//!
//! The crate logs through the `log` facade. [`CdrLogger`] is an optional
//! backend for hosts that have none: it filters by level and writes one line
//! per event to stderr and, optionally, to an append-only file, either as
//! JSON or as plain text.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::{Mutex, OnceLock, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use log::{LevelFilter, Log, Metadata, Record};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::errors::{CdrError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CdrLogConfig {
    /// One of TRACE, DEBUG, INFO, WARNING, ERROR, OFF.
    pub level: String,
    pub console_enabled: bool,
    pub json_format: bool,
    /// Append log lines to this file when set.
    pub file_path: Option<String>,
}

impl Default for CdrLogConfig {
    fn default() -> Self {
        CdrLogConfig {
            level: "INFO".to_string(),
            console_enabled: true,
            json_format: true,
            file_path: None,
        }
    }
}

impl CdrLogConfig {
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.to_ascii_uppercase().as_str() {
            "TRACE" => LevelFilter::Trace,
            "DEBUG" => LevelFilter::Debug,
            "WARN" | "WARNING" => LevelFilter::Warn,
            "ERROR" => LevelFilter::Error,
            "OFF" => LevelFilter::Off,
            _ => LevelFilter::Info,
        }
    }
}

/// Level-filtering `log` backend writing JSON or text lines.
pub struct CdrLogger {
    level: LevelFilter,
    console: bool,
    json: bool,
    file: Option<Mutex<File>>,
}

static LOGGER: OnceLock<CdrLogger> = OnceLock::new();

impl CdrLogger {
    /// Fails when the configured log file cannot be opened for appending.
    pub fn new(config: &CdrLogConfig) -> Result<Self> {
        let file = match &config.file_path {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|err| CdrError::Io(format!("{path}: {err}")))?;
                Some(Mutex::new(file))
            }
            None => None,
        };
        Ok(CdrLogger {
            level: config.level_filter(),
            console: config.console_enabled,
            json: config.json_format,
            file,
        })
    }

    /// Installs the global logger. The first call wins; later calls are
    /// no-ops. Fails if the log file cannot be opened or some other `log`
    /// backend is already installed.
    pub fn init(config: &CdrLogConfig) -> Result<()> {
        if LOGGER.get().is_some() {
            return Ok(());
        }
        if LOGGER.set(CdrLogger::new(config)?).is_err() {
            return Ok(());
        }
        let logger = LOGGER
            .get()
            .ok_or_else(|| CdrError::internal("logger missing after install"))?;
        log::set_logger(logger)
            .map_err(|err| CdrError::internal(format!("failed to install logger: {err}")))?;
        log::set_max_level(logger.level);
        Ok(())
    }
}

/// Renders one log line.
pub fn format_line(
    level: log::Level,
    target: &str,
    message: &str,
    at: DateTime<Utc>,
    as_json: bool,
) -> String {
    if as_json {
        json!({
            "level": level.as_str(),
            "target": target,
            "message": message,
            "timestamp_ms": at.timestamp_millis(),
        })
        .to_string()
    } else {
        format!(
            "{} {:<5} {target}: {message}",
            at.to_rfc3339_opts(SecondsFormat::Millis, true),
            level.as_str(),
        )
    }
}

impl Log for CdrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            record.level(),
            record.target(),
            &record.args().to_string(),
            Utc::now(),
            self.json,
        );
        if self.console {
            eprintln!("{line}");
        }
        if let Some(file) = &self.file {
            let mut file = file.lock().unwrap_or_else(PoisonError::into_inner);
            let _ = writeln!(file, "{line}");
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            let _ = file.lock().unwrap_or_else(PoisonError::into_inner).flush();
        }
    }
}

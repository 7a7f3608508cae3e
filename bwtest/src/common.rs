//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Common types used throughout the library.

use std::fmt;

use serde::Serialize;

/// Severity of a [`LogEntry`].
///
/// `Fatal` means the run produced no usable measurement; `Error` means
/// the measurement is degraded but usable. `Success` mirrors the
/// positive frame-rate confirmation emitted by some stats providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Fatal,
    Success,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let display = match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
            LogLevel::Success => "success",
        };
        write!(f, "{}", display)
    }
}

/// One line of the diagnostic trail carried by the final report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message)
    }
}

/// Appends an entry to a report log, mirroring it to the process log.
pub fn push_entry(log: &mut Vec<LogEntry>, level: LogLevel, message: impl Into<String>) {
    let entry = LogEntry::new(level, message);
    match level {
        LogLevel::Info | LogLevel::Success => log::info!("{}", entry.message),
        LogLevel::Warn => log::warn!("{}", entry.message),
        LogLevel::Error | LogLevel::Fatal => log::error!("{}", entry.message),
    }
    log.push(entry);
}

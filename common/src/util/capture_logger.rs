//
//  Copyright 2024 Google, Inc.
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at:
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

//! A logger for processes that embed the capture writer.
//!
//! Uses the env_logger crate that allows control of logging through
//! the RUST_LOG environment variable.

use chrono::{DateTime, Datelike, Timelike, Utc};
use env_logger::{Builder, Env};
use log::{Level, Record};
use std::{ffi::OsStr, io::Write, path::Path};

/// Initiating the environment for logging with given prefix.
///
/// Lines look like `{prefix} I 01-01 00:01:40.200 writer.rs:42 - message`.
/// Calling this after a logger is already installed is a no-op.
pub fn init(prefix: &'static str) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format(move |buf, record| {
        writeln!(
            buf,
            "{} {} {} {}:{} - {}",
            prefix,
            level_to_string(record.level()),
            log_time(Utc::now()),
            format_file(record),
            record.line().unwrap_or(0),
            record.args()
        )
    });
    let _ = builder.try_init();
}

/// Initiating the environment for logging in Rust tests.
///
/// Safe to call from every test; only the first call installs the logger.
pub fn init_for_test() {
    let mut binding = Builder::from_env(Env::default().default_filter_or("info"));
    let builder = binding.is_test(true);
    builder.format(move |buf, record| {
        writeln!(
            buf,
            "{} {} \t| capture-test: {}",
            level_to_string(record.level()),
            log_time(Utc::now()),
            record.args()
        )
    });
    let _ = builder.try_init();
}

/// Formats a UTC instant as `MM-DD HH:MM:SS.mmm`.
fn log_time(now: DateTime<Utc>) -> String {
    format!(
        "{:02}-{:02} {:02}:{:02}:{:02}.{:03}",
        now.month(),
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
        now.timestamp_subsec_millis(),
    )
}

/// Helper function for parsing the file name from given record file path
fn format_file<'a>(record: &'a Record<'a>) -> &'a str {
    record
        .file()
        .and_then(|filepath| Path::new(filepath).file_name())
        .and_then(OsStr::to_str)
        .unwrap_or("N/A")
}

/// Helper function for translating log levels to string.
fn level_to_string(level: Level) -> &'static str {
    match level {
        Level::Error => "E",
        Level::Warn => "W",
        Level::Info => "I",
        Level::Debug => "D",
        Level::Trace => "T",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_init_for_test_twice() {
        init_for_test();
        init_for_test();
        log::info!("Hello capture");
    }

    #[test]
    fn test_init_after_test_logger() {
        init_for_test();
        init("tund");
        log::info!("still logging");
    }

    #[test]
    fn test_log_time() {
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        assert_eq!(log_time(epoch), "01-01 00:00:00.000");
        let twok = Utc.timestamp_opt(946684900, 200_000_000).unwrap();
        assert_eq!(log_time(twok), "01-01 00:01:40.200");
    }

    #[test]
    fn test_level_to_string() {
        assert_eq!(level_to_string(Level::Error), "E");
        assert_eq!(level_to_string(Level::Trace), "T");
    }
}

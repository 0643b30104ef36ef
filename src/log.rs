// Oracle-session - Session layer for Oracle database over ODPI-C
//
//-----------------------------------------------------------------------------
// Copyright (c) 2017-2023 Kubo Takehiro <kubo@jiubao.org>. All rights reserved.
// This program is free software: you can modify it and/or redistribute it
// under the terms of:
//
// (i)  the Universal Permissive License v 1.0 or at your option, any
//      later version (http://oss.oracle.com/licenses/upl); and/or
//
// (ii) the Apache License v 2.0. (http://www.apache.org/licenses/LICENSE-2.0)
//-----------------------------------------------------------------------------

//! In-memory session log

use chrono::DateTime;
use chrono::Local;
use std::fmt;
use std::time::Instant;

/// Which entries a session records in its in-memory log
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Records nothing.
    Off,
    /// Records connections, failures and lines passed to [`Session::log`](crate::Session::log).
    Basic,
    /// Records also one timing entry per successful operation.
    #[default]
    Timing,
}

/// Category of a log entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogCategory {
    Connection,
    Failure,
    Timing,
    /// Line added by the application
    Note,
}

impl LogCategory {
    fn min_level(self) -> LogLevel {
        match self {
            LogCategory::Timing => LogLevel::Timing,
            _ => LogLevel::Basic,
        }
    }
}

/// One timestamped line of the session log
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    timestamp: DateTime<Local>,
    category: LogCategory,
    message: String,
}

impl LogEntry {
    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn category(&self) -> LogCategory {
        self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.6f"),
            self.message
        )
    }
}

/// Ordered, append-only log owned by a session
#[derive(Clone, Debug, Default)]
pub struct SessionLog {
    level: LogLevel,
    entries: Vec<LogEntry>,
}

impl SessionLog {
    pub fn new(level: LogLevel) -> SessionLog {
        SessionLog {
            level,
            entries: Vec::new(),
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Appends an entry when the log level records `category`.
    /// Returns true when the entry was appended.
    pub fn push<M>(&mut self, category: LogCategory, message: M) -> bool
    where
        M: Into<String>,
    {
        if self.level < category.min_level() {
            return false;
        }
        self.entries.push(LogEntry {
            timestamp: Local::now(),
            category,
            message: message.into(),
        });
        true
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries joined with newlines.
    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Entries joined with `<br/>`. Newlines inside entries become `<br />`.
    pub fn to_html(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.to_string().replace('\n', "<br />\n"))
            .collect::<Vec<_>>()
            .join("<br/>")
    }
}

/// Returns the seconds elapsed from `start` to `end`. Zero when `end` precedes `start`.
pub fn elapsed(start: Instant, end: Instant) -> f64 {
    end.saturating_duration_since(start).as_secs_f64()
}

/// Formats seconds with six decimals, e.g. `0.012345`.
pub fn format_elapsed(secs: f64) -> String {
    format!("{:.6}", secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn level_filters_entries() {
        let mut log = SessionLog::new(LogLevel::Off);
        assert!(!log.push(LogCategory::Connection, "connected"));
        assert!(!log.push(LogCategory::Timing, "took 0.1s"));
        assert!(log.is_empty());

        let mut log = SessionLog::new(LogLevel::Basic);
        assert!(log.push(LogCategory::Connection, "connected"));
        assert!(log.push(LogCategory::Failure, "failed"));
        assert!(!log.push(LogCategory::Timing, "took 0.1s"));
        assert_eq!(log.len(), 2);

        let mut log = SessionLog::default();
        assert_eq!(log.level(), LogLevel::Timing);
        assert!(log.push(LogCategory::Timing, "took 0.1s"));
        assert_eq!(log.entries()[0].category(), LogCategory::Timing);
        assert_eq!(log.entries()[0].message(), "took 0.1s");
    }

    #[test]
    fn entries_keep_insertion_order() {
        let mut log = SessionLog::new(LogLevel::Timing);
        for i in 0..5 {
            log.push(LogCategory::Note, format!("line {}", i));
        }
        let messages: Vec<_> = log.entries().iter().map(LogEntry::message).collect();
        assert_eq!(messages, ["line 0", "line 1", "line 2", "line 3", "line 4"]);
        assert!(log.entries()[0].timestamp() <= log.entries()[4].timestamp());
    }

    #[test]
    fn render_text_and_html() {
        let mut log = SessionLog::new(LogLevel::Basic);
        log.push(LogCategory::Note, "first");
        log.push(LogCategory::Failure, "second\n SQL: select 1 from dual");
        let text = log.to_text();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(" first"));
        assert!(lines[1].ends_with(" second"));
        assert_eq!(lines[2], " SQL: select 1 from dual");

        let html = log.to_html();
        assert!(html.contains(" first<br/>"));
        assert!(html.contains(" second<br />\n SQL: select 1 from dual"));
        assert!(SessionLog::default().to_html().is_empty());
    }

    #[test]
    fn elapsed_seconds() {
        let start = Instant::now();
        let end = start + Duration::from_millis(1500);
        assert!((elapsed(start, end) - 1.5).abs() < 1e-9);
        assert_eq!(elapsed(end, start), 0.0);
        assert_eq!(format_elapsed(1.5), "1.500000");
        assert_eq!(format_elapsed(0.0123456789), "0.012346");
    }
}

use serde::{Deserialize, Serialize};

use crate::formats::time::parse_bracketed_timestamp;

/// Requested clip range in seconds of source video time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Both ends go through the permissive bracketed parser, so garbage reads as `0`.
    pub fn parse(start: &str, end: &str) -> Self {
        Self {
            start: parse_bracketed_timestamp(start),
            end: parse_bracketed_timestamp(end),
        }
    }

    pub fn contains(&self, seconds: f64) -> bool {
        self.start <= seconds && seconds <= self.end
    }

    pub fn is_ordered(&self) -> bool {
        self.end >= self.start
    }

    pub fn duration_secs(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub timestamp_secs: f64,
    pub speaker: String,
    pub text: String,
}

/// A token with its estimated offset from the start of the requested range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub offset_ms: i64,
}

impl Word {
    pub fn new(text: impl Into<String>, offset_ms: i64) -> Self {
        Self {
            text: text.into(),
            offset_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionEvent {
    pub start_ms: i64,
    pub end_ms: i64,
    pub text: String,
}

impl CaptionEvent {
    pub fn duration_ms(&self) -> i64 {
        (self.end_ms - self.start_ms).max(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TitleBlock {
    pub lines: Vec<String>,
}

impl TitleBlock {
    pub fn joined(&self, separator: &str) -> String {
        self.lines.join(separator)
    }
}

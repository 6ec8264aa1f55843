//! Error types for the timeline core
//!
//! Data problems (bad dates) are reported per record and never abort a load.
//! Registration and overlay misuse fail fast.

use thiserror::Error;

/// A date value that could not be turned into a calendar date
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// Text did not match `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
    #[error("unrecognized date `{0}` (expected YYYY, YYYY-MM or YYYY-MM-DD)")]
    Unparseable(String),
    /// Year number outside what a calendar date can hold
    #[error("year {0} is out of range")]
    YearOutOfRange(i64),
}

/// A raw record rejected during a data load
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record #{index} ({title:?}) rejected: {source}")]
pub struct RecordError {
    /// Position of the record in the caller's sequence
    pub index: usize,
    pub title: String,
    #[source]
    pub source: DateError,
}

/// Errors raised by canvas and lane operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    #[error("a lane named `{0}` is already registered")]
    DuplicateLane(String),
    #[error("no lane named `{0}`")]
    UnknownLane(String),
    /// The overlay was pointed at something that is not an item of the canvas
    #[error("overlay target mismatch: lane `{lane}` has no item titled `{title}`")]
    OverlayTargetMismatch { lane: String, title: String },
    #[error("invalid date range: start {start} is not before end {end}")]
    InvalidDateRange { start: String, end: String },
    #[error("canvas is detached")]
    Detached,
}

/// Error type for configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

//! Recording source adapters
//!
//! This module provides adapters that parse tabular recording sources (CSV,
//! JSON, NDJSON) and map them to [`Recording`] values.

mod json;
mod table;

pub use json::{JsonFormat, JsonRecordingAdapter};
pub use table::CsvRecordingAdapter;

use crate::error::ComputeError;
use crate::types::Recording;

/// Cell values treated as "no pulse recording"
pub const MISSING_PULSE_TOKENS: &[&str] = &["NaN", "nan", "NA", "N/A", "null"];

/// Trait for recording source adapters
pub trait RecordingAdapter {
    /// Parse a raw source into recordings
    fn parse(&self, raw: &str) -> Result<Vec<Recording>, ComputeError>;
}

/// Parse the comma separated pulse timestamps of one recording.
///
/// Returns `Ok(None)` for an empty cell or a missing-value token. The
/// timestamps are returned as found; ordering is checked when gaps are
/// computed.
pub fn parse_pulses(raw: &str) -> Result<Option<Vec<f64>>, ComputeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || MISSING_PULSE_TOKENS.contains(&trimmed) {
        return Ok(None);
    }

    trimmed
        .split(',')
        .map(|token| {
            let token = token.trim();
            token.parse::<f64>().map_err(|e| {
                ComputeError::ParseError(format!("invalid pulse timestamp '{token}': {e}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

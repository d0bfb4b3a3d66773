//! JSON recordings adapter
//!
//! Accepts either a JSON array or newline-delimited JSON of recording objects
//! using the same field names as the CSV table. `pet_id` may be a number or a
//! string; `ecg_pulses` may be a comma separated string, an array of numbers,
//! or null/absent.

use crate::error::ComputeError;
use crate::types::{Recording, SubjectAttributes, SubjectId};
use serde::Deserialize;
use tracing::debug;

use super::{parse_pulses, RecordingAdapter};

/// JSON container format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonFormat {
    /// A single JSON array of recordings
    Array,
    /// One recording object per line
    Ndjson,
}

/// JSON recordings adapter
#[derive(Debug, Clone)]
pub struct JsonRecordingAdapter {
    format: JsonFormat,
}

impl JsonRecordingAdapter {
    pub fn new(format: JsonFormat) -> Self {
        Self { format }
    }

    pub fn array() -> Self {
        Self::new(JsonFormat::Array)
    }

    pub fn ndjson() -> Self {
        Self::new(JsonFormat::Ndjson)
    }
}

impl RecordingAdapter for JsonRecordingAdapter {
    fn parse(&self, raw: &str) -> Result<Vec<Recording>, ComputeError> {
        let rows: Vec<RawRecording> = match self.format {
            JsonFormat::Array => serde_json::from_str(raw)?,
            JsonFormat::Ndjson => parse_ndjson(raw)?,
        };

        let recordings = rows
            .into_iter()
            .enumerate()
            .map(|(row, raw)| raw.into_recording(row))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(recordings = recordings.len(), format = ?self.format, "parsed JSON recordings");
        Ok(recordings)
    }
}

fn parse_ndjson(ndjson: &str) -> Result<Vec<RawRecording>, ComputeError> {
    let mut rows = Vec::new();
    for (line_num, line) in ndjson.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<RawRecording>(trimmed) {
            Ok(row) => rows.push(row),
            Err(e) => {
                return Err(ComputeError::ParseError(format!(
                    "Failed to parse line {}: {}",
                    line_num + 1,
                    e
                )));
            }
        }
    }
    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct RawRecording {
    #[serde(default, alias = "row_index")]
    index: Option<usize>,
    pet_id: RawId,
    breeds: String,
    weight: f64,
    age: f64,
    duration: f64,
    #[serde(default)]
    ecg_pulses: Option<RawPulses>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPulses {
    Values(Vec<f64>),
    Text(String),
}

impl RawRecording {
    fn into_recording(self, row: usize) -> Result<Recording, ComputeError> {
        let pet_id = match self.pet_id {
            RawId::Number(n) => SubjectId::new(n.to_string()),
            RawId::Text(s) if !s.trim().is_empty() => SubjectId::new(s.trim()),
            RawId::Text(_) => {
                return Err(ComputeError::MissingField(format!("pet_id (row {row})")));
            }
        };

        let ecg_pulses = match self.ecg_pulses {
            None => None,
            Some(RawPulses::Values(values)) => Some(values),
            Some(RawPulses::Text(text)) => parse_pulses(&text)
                .map_err(|e| ComputeError::ParseError(format!("row {row}: {e}")))?,
        };

        Ok(Recording {
            row_index: self.index.unwrap_or(row),
            pet_id,
            attributes: SubjectAttributes {
                breeds: self.breeds,
                weight: self.weight,
                age: self.age,
            },
            duration: self.duration,
            ecg_pulses,
        })
    }
}

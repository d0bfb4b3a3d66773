//! Summary encoding
//!
//! This module encodes subject summaries into JSON payloads carrying producer
//! and provenance metadata, and writes summary tables as CSV. Missing values
//! become `null` in JSON and empty cells in CSV.

use crate::error::ComputeError;
use crate::types::{
    Producer, Provenance, Recording, RecordingSummary, SubjectSummary, SubjectSummaryPayload,
};
use crate::{FLUX_VERSION, PRODUCER_NAME};
use chrono::Utc;
use csv::Writer;
use uuid::Uuid;

/// Current summary payload schema version
pub const SUMMARY_SCHEMA_VERSION: &str = "vitals.subject_summary.v1";

/// Encoder for subject summary payloads
pub struct SummaryEncoder {
    instance_id: String,
}

impl Default for SummaryEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Wrap subject summaries in a payload describing how they were produced
    pub fn encode(
        &self,
        source: &str,
        recordings: &[Recording],
        subjects: Vec<SubjectSummary>,
    ) -> SubjectSummaryPayload {
        let producer = Producer {
            name: PRODUCER_NAME.to_string(),
            version: FLUX_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let provenance = Provenance {
            source: source.to_string(),
            computed_at_utc: Utc::now().to_rfc3339(),
            recordings: recordings.len(),
            recordings_without_pulses: recordings.iter().filter(|r| !r.has_pulses()).count(),
        };

        SubjectSummaryPayload {
            schema_version: SUMMARY_SCHEMA_VERSION.to_string(),
            producer,
            provenance,
            subjects,
        }
    }

    /// Encode to pretty JSON string
    pub fn encode_to_json(
        &self,
        source: &str,
        recordings: &[Recording],
        subjects: Vec<SubjectSummary>,
    ) -> Result<String, ComputeError> {
        let payload = self.encode(source, recordings, subjects);
        serde_json::to_string_pretty(&payload).map_err(ComputeError::JsonError)
    }
}

/// Write subject summaries as a CSV table
pub fn subjects_to_csv(subjects: &[SubjectSummary]) -> Result<String, ComputeError> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(["pet_id", "breeds", "weight", "age", "recordings", "max_mean_gap"])?;

    for subject in subjects {
        writer.write_record([
            subject.pet_id.to_string(),
            subject.attributes.breeds.clone(),
            subject.attributes.weight.to_string(),
            subject.attributes.age.to_string(),
            subject.recordings.to_string(),
            optional_cell(subject.max_mean_gap),
        ])?;
    }

    finish(writer)
}

/// Write per-recording summaries as a CSV table
pub fn recordings_to_csv(summaries: &[RecordingSummary]) -> Result<String, ComputeError> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record([
        "index",
        "pet_id",
        "breeds",
        "weight",
        "age",
        "duration",
        "pulse_count",
        "mean_gap",
    ])?;

    for summary in summaries {
        writer.write_record([
            summary.row_index.to_string(),
            summary.pet_id.to_string(),
            summary.attributes.breeds.clone(),
            summary.attributes.weight.to_string(),
            summary.attributes.age.to_string(),
            summary.duration.to_string(),
            summary.pulse_count.map(|c| c.to_string()).unwrap_or_default(),
            optional_cell(summary.mean_gap),
        ])?;
    }

    finish(writer)
}

fn optional_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String, ComputeError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ComputeError::EncodingError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ComputeError::EncodingError(e.to_string()))
}

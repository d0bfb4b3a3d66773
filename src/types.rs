//! Core types for the Vitals Flux pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: parsed recordings, per-recording summaries, per-subject summaries,
//! and the encoded output payload.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Subject (dog) identifier as found in the `pet_id` column
///
/// Identifiers that are both integers compare numerically, so `"9"` sorts
/// before `"10"`. Anything else falls back to string order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for SubjectId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.parse::<i64>(), other.0.parse::<i64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for SubjectId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Static attributes of a subject, expected to be identical across all of its recordings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectAttributes {
    /// Main breed of the dog
    pub breeds: String,
    /// Weight at the time of measurement (kg)
    pub weight: f64,
    /// Age at the time of measurement (years)
    pub age: f64,
}

/// One ECG recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    /// Row index from the source table
    pub row_index: usize,
    /// Subject identifier
    pub pet_id: SubjectId,
    /// Static subject attributes as recorded on this row
    #[serde(flatten)]
    pub attributes: SubjectAttributes,
    /// Recording duration (seconds), the horizon for pulse offsets
    pub duration: f64,
    /// Pulse timestamps (seconds from the start of the signal), absent when not recorded
    pub ecg_pulses: Option<Vec<f64>>,
}

impl Recording {
    pub fn has_pulses(&self) -> bool {
        self.ecg_pulses.is_some()
    }
}

/// Per-recording summary derived from the pulse gaps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingSummary {
    pub row_index: usize,
    pub pet_id: SubjectId,
    #[serde(flatten)]
    pub attributes: SubjectAttributes,
    pub duration: f64,
    /// Number of detected pulses
    pub pulse_count: Option<usize>,
    /// Mean inter-pulse gap (seconds), including the leading and trailing gaps
    pub mean_gap: Option<f64>,
}

/// One row per subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectSummary {
    pub pet_id: SubjectId,
    #[serde(flatten)]
    pub attributes: SubjectAttributes,
    /// Number of recordings for this subject, including those without pulses
    pub recordings: usize,
    /// Maximum `mean_gap` over the subject's recordings that have pulses
    pub max_mean_gap: Option<f64>,
}

/// Producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Provenance of an encoded table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    /// Free-form description of the input (file name, "stdin", ...)
    pub source: String,
    pub computed_at_utc: String,
    /// Number of input recordings
    pub recordings: usize,
    /// Number of input recordings without pulse data
    pub recordings_without_pulses: usize,
}

/// Complete subject summary payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectSummaryPayload {
    pub schema_version: String,
    pub producer: Producer,
    pub provenance: Provenance,
    pub subjects: Vec<SubjectSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_id_numeric_order() {
        let mut ids = vec![
            SubjectId::new("10"),
            SubjectId::new("9"),
            SubjectId::new("rex"),
            SubjectId::new("22"),
        ];
        ids.sort();

        let ordered: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(ordered, vec!["9", "10", "22", "rex"]);
    }

    #[test]
    fn test_recording_serializes_flat() {
        let recording = Recording {
            row_index: 3,
            pet_id: SubjectId::new("22"),
            attributes: SubjectAttributes {
                breeds: "Beagle".to_string(),
                weight: 12.5,
                age: 4.0,
            },
            duration: 4.0,
            ecg_pulses: None,
        };

        let value = serde_json::to_value(&recording).unwrap();
        assert_eq!(value["pet_id"], "22");
        assert_eq!(value["breeds"], "Beagle");
        assert_eq!(value["weight"], 12.5);
        assert!(value["ecg_pulses"].is_null());
    }
}

//! Per-recording feature derivation
//!
//! This module reduces each recording's pulse timestamps to a single summary:
//! the mean of the inter-pulse gaps, with the leading and trailing gaps
//! included. Recordings without pulses keep a missing `mean_gap`.

use crate::deltas::{deltas, mean};
use crate::error::ComputeError;
use crate::types::{Recording, RecordingSummary};

/// Feature deriver for computing per-recording summaries
pub struct RecordingFeatureDeriver;

impl RecordingFeatureDeriver {
    /// Derive the summary of one recording
    pub fn derive(recording: &Recording) -> Result<RecordingSummary, ComputeError> {
        let mean_gap = compute_mean_gap(recording)?;
        let pulse_count = recording.ecg_pulses.as_ref().map(Vec::len);

        Ok(RecordingSummary {
            row_index: recording.row_index,
            pet_id: recording.pet_id.clone(),
            attributes: recording.attributes.clone(),
            duration: recording.duration,
            pulse_count,
            mean_gap,
        })
    }
}

/// Mean inter-pulse gap, `None` when the recording has no pulse data
fn compute_mean_gap(recording: &Recording) -> Result<Option<f64>, ComputeError> {
    match &recording.ecg_pulses {
        Some(pulses) => {
            let gaps = deltas(pulses, recording.duration).map_err(|e| match e {
                ComputeError::InvalidInput(msg) => ComputeError::InvalidInput(format!(
                    "recording {} (pet_id {}): {}",
                    recording.row_index, recording.pet_id, msg
                )),
                other => other,
            })?;
            Ok(mean(&gaps))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SubjectAttributes, SubjectId};

    fn make_recording(pulses: Option<Vec<f64>>, duration: f64) -> Recording {
        Recording {
            row_index: 4,
            pet_id: SubjectId::new("22"),
            attributes: SubjectAttributes {
                breeds: "Beagle".to_string(),
                weight: 12.5,
                age: 4.0,
            },
            duration,
            ecg_pulses: pulses,
        }
    }

    #[test]
    fn test_mean_gap() {
        let recording = make_recording(Some(vec![0.98, 2.51, 2.82, 3.39]), 4.0);
        let summary = RecordingFeatureDeriver::derive(&recording).unwrap();

        // 5 gaps over 4 seconds
        assert!((summary.mean_gap.unwrap() - 0.8).abs() < 1e-12);
        assert_eq!(summary.pulse_count, Some(4));
    }

    #[test]
    fn test_empty_pulse_list_spans_duration() {
        let recording = make_recording(Some(vec![]), 3.0);
        let summary = RecordingFeatureDeriver::derive(&recording).unwrap();

        assert_eq!(summary.mean_gap, Some(3.0));
        assert_eq!(summary.pulse_count, Some(0));
    }

    #[test]
    fn test_missing_pulses_stay_missing() {
        let recording = make_recording(None, 4.0);
        let summary = RecordingFeatureDeriver::derive(&recording).unwrap();

        assert_eq!(summary.mean_gap, None);
        assert_eq!(summary.pulse_count, None);
        assert_eq!(summary.row_index, 4);
    }

    #[test]
    fn test_invalid_pulses_name_the_recording() {
        let recording = make_recording(Some(vec![3.0, 1.0]), 4.0);
        let result = RecordingFeatureDeriver::derive(&recording);

        assert!(matches!(
            result,
            Err(ComputeError::InvalidInput(ref m)) if m.contains("recording 4") && m.contains("pet_id 22")
        ));
    }
}

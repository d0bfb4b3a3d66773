//! Pipeline orchestration
//!
//! This module provides the public API for Vitals Flux.
//! It orchestrates the full pipeline from a raw recordings table to one
//! summary row per subject.

use crate::adapters::{CsvRecordingAdapter, RecordingAdapter};
use crate::config::PipelineConfig;
use crate::encoder::SummaryEncoder;
use crate::error::ComputeError;
use crate::features::RecordingFeatureDeriver;
use crate::regression::RegressionObservations;
use crate::series::{delta_traces, pulse_scatter, DeltaTrace, ScatterRow};
use crate::types::{
    Recording, RecordingSummary, SubjectAttributes, SubjectId, SubjectSummary,
    SubjectSummaryPayload,
};
use crate::validation::SubjectValidator;
use std::collections::BTreeMap;
use tracing::debug;

/// Convert a raw CSV recordings table to a subject summary JSON payload.
///
/// # Arguments
/// * `raw_csv` - Recordings table with `pet_id`, `breeds`, `weight`, `age`,
///   `duration` and `ecg_pulses` columns
///
/// # Returns
/// Pretty-printed JSON payload with one subject summary per `pet_id`
///
/// # Example
/// ```ignore
/// let payload = csv_to_subject_summaries(std::fs::read_to_string("dogs.csv")?)?;
/// ```
pub fn csv_to_subject_summaries(raw_csv: String) -> Result<String, ComputeError> {
    let recordings = CsvRecordingAdapter::new().parse(&raw_csv)?;
    let subjects = aggregate_subjects(&recordings)?;
    SummaryEncoder::new().encode_to_json("csv", &recordings, subjects)
}

/// Summarize every recording (Step A).
///
/// Recordings without pulses are kept with a missing `mean_gap`. The first
/// recording with invalid pulses aborts the whole call.
pub fn summarize_recordings(recordings: &[Recording]) -> Result<Vec<RecordingSummary>, ComputeError> {
    let summaries = recordings
        .iter()
        .map(RecordingFeatureDeriver::derive)
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        recordings = summaries.len(),
        missing = summaries.iter().filter(|s| s.mean_gap.is_none()).count(),
        "summarized recordings"
    );

    Ok(summaries)
}

/// Produce one summary row per subject.
///
/// Pipeline stages:
/// 1. SubjectValidator - Verify static attributes per subject (all offenders reported)
/// 2. RecordingFeatureDeriver - Mean inter-pulse gap per recording
/// 3. Reduction - Maximum present mean gap per subject
pub fn aggregate_subjects(recordings: &[Recording]) -> Result<Vec<SubjectSummary>, ComputeError> {
    // Stage 1: attribute invariance
    let attributes = SubjectValidator::verify(recordings)?;

    // Stage 2: per-recording summaries
    let summaries = summarize_recordings(recordings)?;

    // Stage 3: per-subject reduction
    Ok(reduce_subjects(attributes, &summaries))
}

/// Reduce verified per-recording summaries to one row per subject.
///
/// Subjects whose recordings all lack a `mean_gap` get a missing
/// `max_mean_gap`. Rows are ordered by subject identifier.
pub fn reduce_subjects(
    attributes: BTreeMap<SubjectId, SubjectAttributes>,
    summaries: &[RecordingSummary],
) -> Vec<SubjectSummary> {
    let mut reductions: BTreeMap<&SubjectId, (usize, Option<f64>)> = BTreeMap::new();
    for summary in summaries {
        let (count, max) = reductions.entry(&summary.pet_id).or_insert((0, None));
        *count += 1;
        *max = max_present(*max, summary.mean_gap);
    }

    let subjects: Vec<SubjectSummary> = attributes
        .into_iter()
        .map(|(pet_id, attributes)| {
            let (recordings, max_mean_gap) =
                reductions.get(&pet_id).copied().unwrap_or((0, None));
            SubjectSummary {
                pet_id,
                attributes,
                recordings,
                max_mean_gap,
            }
        })
        .collect();

    debug!(
        subjects = subjects.len(),
        missing = subjects.iter().filter(|s| s.max_mean_gap.is_none()).count(),
        "reduced subjects"
    );

    subjects
}

fn max_present(current: Option<f64>, candidate: Option<f64>) -> Option<f64> {
    match (current, candidate) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Processor bundling configuration, parsing and encoding.
///
/// Use this when the table delimiter, scatter limit or model priors differ from
/// the defaults.
pub struct VitalsProcessor {
    config: PipelineConfig,
    encoder: SummaryEncoder,
}

impl Default for VitalsProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl VitalsProcessor {
    /// Create a new processor with default settings
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    /// Create a processor with explicit configuration
    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            config,
            encoder: SummaryEncoder::new(),
        }
    }

    /// Load configuration from JSON
    pub fn load_config(&mut self, json: &str) -> Result<(), ComputeError> {
        self.config =
            PipelineConfig::from_json(json).map_err(|e| ComputeError::ParseError(e.to_string()))?;
        Ok(())
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Parse a CSV recordings table using the configured delimiter
    pub fn parse_csv(&self, raw_csv: &str) -> Result<Vec<Recording>, ComputeError> {
        CsvRecordingAdapter::with_delimiter(self.config.delimiter)?.parse(raw_csv)
    }

    /// Parse a CSV table and encode its subject summaries
    pub fn process_csv(
        &self,
        raw_csv: &str,
        source: &str,
    ) -> Result<SubjectSummaryPayload, ComputeError> {
        let recordings = self.parse_csv(raw_csv)?;
        self.process_recordings(&recordings, source)
    }

    /// Aggregate already parsed recordings and encode the result
    pub fn process_recordings(
        &self,
        recordings: &[Recording],
        source: &str,
    ) -> Result<SubjectSummaryPayload, ComputeError> {
        let subjects = aggregate_subjects(recordings)?;
        Ok(self.encoder.encode(source, recordings, subjects))
    }

    /// Scatter rows for one subject, limited to the configured pulse count
    pub fn pulse_scatter(&self, recordings: &[Recording], pet_id: &SubjectId) -> Vec<ScatterRow> {
        pulse_scatter(recordings, pet_id, self.config.scatter_limit)
    }

    /// Delta traces for one subject
    pub fn delta_traces(
        &self,
        recordings: &[Recording],
        pet_id: &SubjectId,
    ) -> Result<Vec<DeltaTrace>, ComputeError> {
        delta_traces(recordings, pet_id)
    }

    /// Regression observations with the configured priors
    pub fn observations(
        &self,
        recordings: &[Recording],
    ) -> Result<RegressionObservations, ComputeError> {
        let subjects = aggregate_subjects(recordings)?;
        Ok(RegressionObservations::with_model(
            &subjects,
            self.config.model.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn make_recording(
        row: usize,
        id: &str,
        weight: f64,
        pulses: Option<Vec<f64>>,
        duration: f64,
    ) -> Recording {
        Recording {
            row_index: row,
            pet_id: SubjectId::new(id),
            attributes: SubjectAttributes {
                breeds: "Golden Retriever".to_string(),
                weight,
                age: 7.0,
            },
            duration,
            ecg_pulses: pulses,
        }
    }

    fn sample_csv() -> &'static str {
        "\
,duration,pet_id,breeds,weight,age,ecg_pulses
0,4.0,1,Beagle,12.5,4.0,\"0.98,2.51,2.82,3.39\"
1,6.0,1,Beagle,12.5,4.0,\"1.0,2.0\"
2,4.0,1,Beagle,12.5,4.0,
3,3.0,2,Labrador,30.0,6.5,
"
    }

    #[test]
    fn test_two_subjects() {
        let recordings = vec![
            make_recording(0, "S1", 20.0, Some(vec![0.98, 2.51, 2.82, 3.39]), 4.0),
            make_recording(1, "S1", 20.0, None, 4.0),
            make_recording(2, "S1", 20.0, Some(vec![1.0, 2.0, 3.0]), 8.0),
            make_recording(3, "S2", 9.0, Some(vec![]), 5.0),
        ];

        let subjects = aggregate_subjects(&recordings).unwrap();

        assert_eq!(subjects.len(), 2);
        assert_eq!(subjects[0].pet_id, SubjectId::new("S1"));
        assert_eq!(subjects[0].recordings, 3);
        // mean gaps: 4 / 5 = 0.8 and 8 / 4 = 2.0
        assert!((subjects[0].max_mean_gap.unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(subjects[1].pet_id, SubjectId::new("S2"));
        assert_eq!(subjects[1].max_mean_gap, Some(5.0));
        assert_eq!(subjects[1].attributes.weight, 9.0);
    }

    #[test]
    fn test_inconsistent_weight_produces_no_rows() {
        let recordings = vec![
            make_recording(0, "S1", 20.0, Some(vec![1.0]), 4.0),
            make_recording(1, "S1", 21.0, Some(vec![1.0]), 4.0),
        ];

        match aggregate_subjects(&recordings) {
            Err(ComputeError::InconsistentSubjectAttributes(ids)) => {
                assert_eq!(ids, vec!["S1".to_string()]);
            }
            other => panic!("expected inconsistent attributes, got {other:?}"),
        }
    }

    #[test]
    fn test_all_missing_group() {
        let recordings = vec![
            make_recording(0, "S3", 15.0, None, 4.0),
            make_recording(1, "S3", 15.0, None, 6.0),
        ];

        let subjects = aggregate_subjects(&recordings).unwrap();

        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].max_mean_gap, None);
        assert_eq!(subjects[0].recordings, 2);
    }

    #[test]
    fn test_invalid_pulses_abort_aggregation() {
        let recordings = vec![
            make_recording(0, "S1", 20.0, Some(vec![1.0]), 4.0),
            make_recording(1, "S2", 10.0, Some(vec![2.0, 1.0]), 4.0),
        ];

        assert!(matches!(
            aggregate_subjects(&recordings),
            Err(ComputeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_missing_rows_are_kept() {
        let recordings = vec![
            make_recording(0, "S1", 20.0, None, 4.0),
            make_recording(1, "S1", 20.0, Some(vec![2.0]), 4.0),
        ];

        let summaries = summarize_recordings(&recordings).unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].mean_gap, None);
        assert_eq!(summaries[1].mean_gap, Some(2.0));
    }

    #[test]
    fn test_max_present() {
        assert_eq!(max_present(None, None), None);
        assert_eq!(max_present(None, Some(1.0)), Some(1.0));
        assert_eq!(max_present(Some(2.0), None), Some(2.0));
        assert_eq!(max_present(Some(2.0), Some(3.0)), Some(3.0));
    }

    #[test]
    fn test_csv_to_subject_summaries() {
        let json = csv_to_subject_summaries(sample_csv().to_string()).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        let subjects = payload["subjects"].as_array().unwrap();
        assert_eq!(subjects.len(), 2);
        assert_eq!(subjects[0]["pet_id"], "1");
        assert_eq!(subjects[0]["recordings"], 3);
        // max(0.8, 6 / 3 = 2.0)
        assert!((subjects[0]["max_mean_gap"].as_f64().unwrap() - 2.0).abs() < 1e-12);
        assert!(subjects[1]["max_mean_gap"].is_null());
        assert_eq!(payload["provenance"]["recordings_without_pulses"], 2);
    }

    #[test]
    fn test_processor_uses_config() {
        let mut processor = VitalsProcessor::new();
        processor
            .load_config(r#"{"scatter_limit": 2, "delimiter": ";"}"#)
            .unwrap();

        let raw = "pet_id;breeds;weight;age;duration;ecg_pulses\n\
                   4;Pug;8;3;5;0.5,1.5,2.5,3.5\n\
                   5;Pug;9;3;5;\n";
        let recordings = processor.parse_csv(raw).unwrap();
        let rows = processor.pulse_scatter(&recordings, &SubjectId::new("4"));

        assert_eq!(rows[0].pulses, vec![0.5, 1.5]);

        let observations = processor.observations(&recordings).unwrap();
        assert_eq!(observations.weights(), vec![8.0]);
        assert_eq!(observations.skipped_subjects, vec![SubjectId::new("5")]);
    }

    #[test]
    fn test_process_csv() {
        let processor = VitalsProcessor::new();
        let payload = processor.process_csv(sample_csv(), "dogs.csv").unwrap();

        assert_eq!(payload.subjects.len(), 2);
        assert_eq!(payload.provenance.source, "dogs.csv");
        assert_eq!(payload.provenance.recordings, 4);
    }
}

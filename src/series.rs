//! Plotting series
//!
//! Builds plot-ready data for a single subject without rendering anything:
//! - pulse scatter rows: the first pulses of each recording, one Y level per recording
//! - delta traces: each recording's inter-pulse gaps spread evenly over `0..=duration`

use crate::deltas::deltas;
use crate::error::ComputeError;
use crate::types::{Recording, SubjectId};
use serde::{Deserialize, Serialize};

/// One scatter row: pulses of a recording drawn at Y = `row`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterRow {
    /// Y level, counting the subject's recordings that have pulses
    pub row: usize,
    /// Source row index of the recording
    pub row_index: usize,
    /// Leading pulse timestamps (seconds)
    pub pulses: Vec<f64>,
}

/// Inter-pulse gaps of one recording laid out over its duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaTrace {
    /// Legend label, the recording's position among the subject's traces
    pub label: String,
    pub row_index: usize,
    pub duration: f64,
    /// `(x, gap)` points
    pub points: Vec<(f64, f64)>,
}

/// Scatter rows of the first `limit` pulses of every recording of `pet_id`.
///
/// Recordings without pulses are skipped and do not consume a Y level.
pub fn pulse_scatter(recordings: &[Recording], pet_id: &SubjectId, limit: usize) -> Vec<ScatterRow> {
    subject_pulses(recordings, pet_id)
        .enumerate()
        .map(|(row, (recording, pulses))| ScatterRow {
            row,
            row_index: recording.row_index,
            pulses: pulses.iter().take(limit).copied().collect(),
        })
        .collect()
}

/// Delta traces of every recording of `pet_id` that has pulses
pub fn delta_traces(
    recordings: &[Recording],
    pet_id: &SubjectId,
) -> Result<Vec<DeltaTrace>, ComputeError> {
    subject_pulses(recordings, pet_id)
        .enumerate()
        .map(|(i, (recording, pulses))| {
            let gaps = deltas(pulses, recording.duration)?;
            let xs = linspace(0.0, recording.duration, gaps.len());
            Ok(DeltaTrace {
                label: i.to_string(),
                row_index: recording.row_index,
                duration: recording.duration,
                points: xs.into_iter().zip(gaps).collect(),
            })
        })
        .collect()
}

/// `n` evenly spaced values from `start` to `end`, both included
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

fn subject_pulses<'a>(
    recordings: &'a [Recording],
    pet_id: &'a SubjectId,
) -> impl Iterator<Item = (&'a Recording, &'a Vec<f64>)> + 'a {
    recordings
        .iter()
        .filter(move |r| &r.pet_id == pet_id)
        .filter_map(|r| r.ecg_pulses.as_ref().map(|pulses| (r, pulses)))
}

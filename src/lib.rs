//! Vitals Flux - Compute engine for ECG pulse interval summaries
//!
//! Flux turns a table of dog vital-sign recordings into per-subject summaries
//! through a deterministic pipeline: table adaptation → attribute validation
//! → inter-pulse gaps → per-recording mean → per-subject maximum.
//!
//! ## Modules
//!
//! - **Core**: [`deltas`] computes the gaps between pulse timestamps, [`pipeline`]
//!   aggregates them per recording and per subject
//! - **Outputs**: [`encoder`] for JSON/CSV tables, [`series`] for plot-ready data,
//!   [`regression`] for the observed data of a weight → mean gap model

pub mod adapters;
pub mod config;
pub mod deltas;
pub mod encoder;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod regression;
pub mod series;
pub mod types;
pub mod validation;

pub use adapters::{parse_pulses, CsvRecordingAdapter, JsonRecordingAdapter, RecordingAdapter};
pub use config::PipelineConfig;
pub use deltas::{deltas, mean};
pub use error::ComputeError;
pub use pipeline::{
    aggregate_subjects, csv_to_subject_summaries, summarize_recordings, VitalsProcessor,
};
pub use types::{Recording, RecordingSummary, SubjectAttributes, SubjectId, SubjectSummary};
pub use validation::verify_subject_attributes;

/// Flux version embedded in all summary payloads
pub const FLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for summary payloads
pub const PRODUCER_NAME: &str = "vitals-flux";

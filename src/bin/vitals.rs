//! Vitals CLI - Command-line interface for Vitals Flux
//!
//! Commands:
//! - summarize: One summary row per subject
//! - recordings: Mean inter-pulse gap per recording
//! - validate: Check subject attribute consistency
//! - deltas: Inter-pulse gaps of a single pulse list
//! - scatter / trace: Plot-ready series for one subject
//! - observations: Regression observations and model priors

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use vitals_flux::adapters::{JsonRecordingAdapter, RecordingAdapter};
use vitals_flux::encoder::{recordings_to_csv, subjects_to_csv};
use vitals_flux::types::{Recording, SubjectId};
use vitals_flux::validation::{AttributeConflict, SubjectValidator};
use vitals_flux::{parse_pulses, summarize_recordings, VitalsProcessor};
use vitals_flux::{FLUX_VERSION, PRODUCER_NAME};

/// Vitals - ECG pulse interval summaries for dog vital-sign recordings
#[derive(Parser)]
#[command(name = "vitals")]
#[command(version = FLUX_VERSION)]
#[command(about = "Summarize ECG pulse intervals per recording and per subject", long_about = None)]
struct Cli {
    /// Log pipeline stages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One summary row per subject (max mean inter-pulse gap)
    Summarize {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Mean inter-pulse gap of every recording
    Recordings {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,
    },

    /// Check that every recording of a subject has the same breed, weight and age
    Validate {
        #[command(flatten)]
        source: SourceArgs,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inter-pulse gaps of a comma separated pulse list
    Deltas {
        /// Pulse timestamps, e.g. "0.98,2.51,2.82,3.39"
        #[arg(long, allow_hyphen_values = true)]
        values: String,

        /// Total recording duration
        #[arg(long, allow_hyphen_values = true)]
        total: f64,
    },

    /// Leading pulses of each recording of one subject
    Scatter {
        #[command(flatten)]
        source: SourceArgs,

        /// Subject identifier
        #[arg(long)]
        pet_id: String,

        /// Pulses per recording (overrides the configured limit)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Inter-pulse gaps over time for each recording of one subject
    Trace {
        #[command(flatten)]
        source: SourceArgs,

        /// Subject identifier
        #[arg(long)]
        pet_id: String,
    },

    /// Observed (weight, max mean gap) pairs with the model priors
    Observations {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Input file path (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Input format
    #[arg(long, default_value = "csv")]
    input_format: InputFormat,

    /// Pipeline configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// Delimited text with a header row
    Csv,
    /// JSON array of recordings
    Json,
    /// Newline-delimited JSON (one recording per line)
    Ndjson,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one row per line)
    Ndjson,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// CSV table
    Csv,
}

/// Initialize tracing subscriber for verbose output
fn init_tracing(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), VitalsCliError> {
    match command {
        Commands::Summarize {
            source,
            output,
            output_format,
        } => cmd_summarize(&source, &output, output_format),

        Commands::Recordings {
            source,
            output,
            output_format,
        } => cmd_recordings(&source, &output, output_format),

        Commands::Validate { source, json } => cmd_validate(&source, json),

        Commands::Deltas { values, total } => cmd_deltas(&values, total),

        Commands::Scatter {
            source,
            pet_id,
            limit,
        } => cmd_scatter(&source, &pet_id, limit),

        Commands::Trace { source, pet_id } => cmd_trace(&source, &pet_id),

        Commands::Observations { source } => cmd_observations(&source),
    }
}

fn cmd_summarize(
    source: &SourceArgs,
    output: &Path,
    output_format: OutputFormat,
) -> Result<(), VitalsCliError> {
    let (processor, recordings) = load(source)?;
    let payload = processor.process_recordings(&recordings, &source_name(&source.input))?;

    let data = match output_format {
        OutputFormat::Ndjson => to_ndjson(&payload.subjects)?,
        OutputFormat::Json => serde_json::to_string(&payload)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&payload)?,
        OutputFormat::Csv => subjects_to_csv(&payload.subjects)?,
    };

    write_output(output, &data)
}

fn cmd_recordings(
    source: &SourceArgs,
    output: &Path,
    output_format: OutputFormat,
) -> Result<(), VitalsCliError> {
    let (_, recordings) = load(source)?;
    let summaries = summarize_recordings(&recordings)?;

    let data = match output_format {
        OutputFormat::Ndjson => to_ndjson(&summaries)?,
        OutputFormat::Json => serde_json::to_string(&summaries)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&summaries)?,
        OutputFormat::Csv => recordings_to_csv(&summaries)?,
    };

    write_output(output, &data)
}

fn cmd_validate(source: &SourceArgs, json: bool) -> Result<(), VitalsCliError> {
    let (_, recordings) = load(source)?;
    let conflicts = SubjectValidator::find_conflicts(&recordings);

    let mut subjects: Vec<&SubjectId> = recordings.iter().map(|r| &r.pet_id).collect();
    subjects.sort();
    subjects.dedup();

    let report = ValidationReport {
        total_recordings: recordings.len(),
        total_subjects: subjects.len(),
        inconsistent_subjects: conflicts.len(),
        conflicts,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Recordings:            {}", report.total_recordings);
        println!("Subjects:              {}", report.total_subjects);
        println!("Inconsistent subjects: {}", report.inconsistent_subjects);

        if !report.conflicts.is_empty() {
            println!("\nConflicts:");
            for conflict in &report.conflicts {
                println!(
                    "  - pet_id {} (rows {:?}):",
                    conflict.pet_id, conflict.row_indices
                );
                for variant in &conflict.variants {
                    println!(
                        "      breeds={} weight={} age={}",
                        variant.breeds, variant.weight, variant.age
                    );
                }
            }
        }
    }

    if report.inconsistent_subjects > 0 {
        Err(VitalsCliError::ValidationFailed(report.inconsistent_subjects))
    } else {
        Ok(())
    }
}

fn cmd_deltas(values: &str, total: f64) -> Result<(), VitalsCliError> {
    let pulses = parse_pulses(values)?.unwrap_or_default();
    let gaps = vitals_flux::deltas(&pulses, total)?;
    println!("{}", serde_json::to_string(&gaps)?);
    Ok(())
}

fn cmd_scatter(
    source: &SourceArgs,
    pet_id: &str,
    limit: Option<usize>,
) -> Result<(), VitalsCliError> {
    let (mut processor, recordings) = load(source)?;
    if let Some(limit) = limit {
        let mut config = processor.config().clone();
        config.scatter_limit = limit;
        processor = VitalsProcessor::with_config(config);
    }

    let pet_id = SubjectId::new(pet_id);
    let rows = processor.pulse_scatter(&recordings, &pet_id);
    if rows.is_empty() {
        return Err(VitalsCliError::NoRecordings(pet_id.to_string()));
    }

    print!("{}", to_ndjson(&rows)?);
    Ok(())
}

fn cmd_trace(source: &SourceArgs, pet_id: &str) -> Result<(), VitalsCliError> {
    let (processor, recordings) = load(source)?;

    let pet_id = SubjectId::new(pet_id);
    let traces = processor.delta_traces(&recordings, &pet_id)?;
    if traces.is_empty() {
        return Err(VitalsCliError::NoRecordings(pet_id.to_string()));
    }

    print!("{}", to_ndjson(&traces)?);
    Ok(())
}

fn cmd_observations(source: &SourceArgs) -> Result<(), VitalsCliError> {
    let (processor, recordings) = load(source)?;
    let observations = processor.observations(&recordings)?;
    println!("{}", serde_json::to_string_pretty(&observations)?);
    Ok(())
}

// Helper functions

fn load(source: &SourceArgs) -> Result<(VitalsProcessor, Vec<Recording>), VitalsCliError> {
    let mut processor = VitalsProcessor::new();
    if let Some(config_path) = &source.config {
        let config_json = fs::read_to_string(config_path)?;
        processor.load_config(&config_json)?;
    }

    let input_data = read_input(&source.input)?;
    let recordings = match source.input_format {
        InputFormat::Csv => processor.parse_csv(&input_data)?,
        InputFormat::Json => JsonRecordingAdapter::array().parse(&input_data)?,
        InputFormat::Ndjson => JsonRecordingAdapter::ndjson().parse(&input_data)?,
    };

    if recordings.is_empty() {
        return Err(VitalsCliError::NoRecordings("input".to_string()));
    }

    tracing::debug!(
        producer = PRODUCER_NAME,
        recordings = recordings.len(),
        "loaded input"
    );

    Ok((processor, recordings))
}

fn read_input(input: &Path) -> Result<String, VitalsCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), VitalsCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
        if !data.ends_with('\n') {
            println!();
        }
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn source_name(input: &Path) -> String {
    if input.to_string_lossy() == "-" {
        "stdin".to_string()
    } else {
        input.display().to_string()
    }
}

fn to_ndjson<T: serde::Serialize>(rows: &[T]) -> Result<String, VitalsCliError> {
    let mut lines: Vec<String> = Vec::with_capacity(rows.len());
    for row in rows {
        lines.push(serde_json::to_string(row)?);
    }
    Ok(lines.join("\n") + "\n")
}

// Error types

#[derive(Debug)]
enum VitalsCliError {
    Io(io::Error),
    Compute(vitals_flux::ComputeError),
    Json(serde_json::Error),
    NoRecordings(String),
    ValidationFailed(usize),
}

impl From<io::Error> for VitalsCliError {
    fn from(e: io::Error) -> Self {
        VitalsCliError::Io(e)
    }
}

impl From<vitals_flux::ComputeError> for VitalsCliError {
    fn from(e: vitals_flux::ComputeError) -> Self {
        VitalsCliError::Compute(e)
    }
}

impl From<serde_json::Error> for VitalsCliError {
    fn from(e: serde_json::Error) -> Self {
        VitalsCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<VitalsCliError> for CliError {
    fn from(e: VitalsCliError) -> Self {
        use vitals_flux::ComputeError;

        match e {
            VitalsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            VitalsCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::InvalidInput(_) => (
                        "INVALID_INPUT",
                        "Pulse timestamps must be sorted, non-negative and within the duration",
                    ),
                    ComputeError::InconsistentSubjectAttributes(_) => (
                        "INCONSISTENT_SUBJECT",
                        "Run 'vitals validate' for details",
                    ),
                    _ => (
                        "PARSE_ERROR",
                        "Ensure input has pet_id, breeds, weight, age, duration and ecg_pulses",
                    ),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            VitalsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            VitalsCliError::NoRecordings(what) => CliError {
                code: "NO_RECORDINGS".to_string(),
                message: format!("No recordings found for {}", what),
                hint: Some("Check the input file and the pet_id".to_string()),
            },
            VitalsCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} subjects have inconsistent attributes", count),
                hint: Some("Fix the conflicting rows and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_recordings: usize,
    total_subjects: usize,
    inconsistent_subjects: usize,
    conflicts: Vec<AttributeConflict>,
}

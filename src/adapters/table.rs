//! CSV recordings adapter
//!
//! Parses the delimited-text dog vitals table. Columns are located by header
//! name; unknown columns are ignored. A leading unnamed (or `index`) column is
//! taken as the row index.

use crate::error::ComputeError;
use crate::types::{Recording, SubjectAttributes, SubjectId};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use super::{parse_pulses, RecordingAdapter};

/// CSV recordings adapter
#[derive(Debug, Clone)]
pub struct CsvRecordingAdapter {
    delimiter: u8,
}

impl Default for CsvRecordingAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvRecordingAdapter {
    /// Comma separated adapter
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Adapter with a custom single-byte delimiter
    pub fn with_delimiter(delimiter: char) -> Result<Self, ComputeError> {
        if !delimiter.is_ascii() {
            return Err(ComputeError::ParseError(format!(
                "delimiter must be a single ASCII character, got '{delimiter}'"
            )));
        }
        Ok(Self {
            delimiter: delimiter as u8,
        })
    }
}

impl RecordingAdapter for CsvRecordingAdapter {
    fn parse(&self, raw: &str) -> Result<Vec<Recording>, ComputeError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(Trim::All)
            .from_reader(raw.as_bytes());

        let columns = Columns::locate(reader.headers()?)?;
        let mut recordings = Vec::new();

        for (row, result) in reader.records().enumerate() {
            let record = result?;
            recordings.push(columns.to_recording(&record, row)?);
        }

        debug!(
            recordings = recordings.len(),
            indexed = columns.index.is_some(),
            "parsed CSV recordings"
        );

        Ok(recordings)
    }
}

/// Positions of the known columns in a header row
struct Columns {
    index: Option<usize>,
    pet_id: usize,
    breeds: usize,
    weight: usize,
    age: usize,
    duration: usize,
    ecg_pulses: usize,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, ComputeError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| ComputeError::MissingField(format!("column '{name}'")))
        };

        let index = match headers.get(0) {
            Some("") | Some("index") => Some(0),
            _ => None,
        };

        Ok(Self {
            index,
            pet_id: find("pet_id")?,
            breeds: find("breeds")?,
            weight: find("weight")?,
            age: find("age")?,
            duration: find("duration")?,
            ecg_pulses: find("ecg_pulses")?,
        })
    }

    fn to_recording(&self, record: &StringRecord, row: usize) -> Result<Recording, ComputeError> {
        let row_index = match self.index {
            Some(col) => {
                let raw = required(record, col, "index", row)?;
                raw.parse::<usize>().map_err(|e| {
                    ComputeError::ParseError(format!("row {row}: invalid index '{raw}': {e}"))
                })?
            }
            None => row,
        };

        let pet_id = SubjectId::new(required(record, self.pet_id, "pet_id", row)?);
        let attributes = SubjectAttributes {
            breeds: required(record, self.breeds, "breeds", row)?.to_string(),
            weight: number(record, self.weight, "weight", row)?,
            age: number(record, self.age, "age", row)?,
        };
        let duration = number(record, self.duration, "duration", row)?;
        let ecg_pulses = parse_pulses(record.get(self.ecg_pulses).unwrap_or(""))
            .map_err(|e| ComputeError::ParseError(format!("row {row}: {e}")))?;

        Ok(Recording {
            row_index,
            pet_id,
            attributes,
            duration,
            ecg_pulses,
        })
    }
}

fn required<'r>(
    record: &'r StringRecord,
    col: usize,
    name: &str,
    row: usize,
) -> Result<&'r str, ComputeError> {
    match record.get(col) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ComputeError::MissingField(format!("{name} (row {row})"))),
    }
}

fn number(record: &StringRecord, col: usize, name: &str, row: usize) -> Result<f64, ComputeError> {
    let raw = required(record, col, name, row)?;
    let value = raw.parse::<f64>().map_err(|e| {
        ComputeError::ParseError(format!("row {row}: invalid {name} '{raw}': {e}"))
    })?;
    if !value.is_finite() {
        return Err(ComputeError::MissingField(format!("{name} (row {row})")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
,duration,pet_id,breeds,weight,age,ecg_pulses
0,4.0,22,Beagle,12.5,4.0,\"0.98,2.51,2.82,3.39\"
1,4.0,22,Beagle,12.5,4.0,
7,5.0,32,Labrador,30.0,6.5,\"1.0, 2.0\"
";

    #[test]
    fn test_parse_indexed_table() {
        let recordings = CsvRecordingAdapter::new().parse(SAMPLE).unwrap();

        assert_eq!(recordings.len(), 3);
        assert_eq!(recordings[0].row_index, 0);
        assert_eq!(recordings[0].pet_id, SubjectId::new("22"));
        assert_eq!(recordings[0].attributes.breeds, "Beagle");
        assert_eq!(recordings[0].ecg_pulses, Some(vec![0.98, 2.51, 2.82, 3.39]));
        assert_eq!(recordings[1].ecg_pulses, None);
        assert_eq!(recordings[2].row_index, 7);
        assert_eq!(recordings[2].duration, 5.0);
        assert_eq!(recordings[2].ecg_pulses, Some(vec![1.0, 2.0]));
    }

    #[test]
    fn test_unindexed_table_uses_row_numbers() {
        let raw = "pet_id,breeds,weight,age,duration,ecg_pulses,notes\n\
                   5,Pug,8,3,2,1.0,first\n\
                   5,Pug,8,3,2,NaN,second\n";
        let recordings = CsvRecordingAdapter::new().parse(raw).unwrap();

        assert_eq!(recordings[0].row_index, 0);
        assert_eq!(recordings[1].row_index, 1);
        assert_eq!(recordings[0].ecg_pulses, Some(vec![1.0]));
        assert_eq!(recordings[1].ecg_pulses, None);
    }

    #[test]
    fn test_custom_delimiter() {
        let raw = "pet_id;breeds;weight;age;duration;ecg_pulses\n\
                   5;Pug;8;3;2;0.5,1.5\n";
        let adapter = CsvRecordingAdapter::with_delimiter(';').unwrap();
        let recordings = adapter.parse(raw).unwrap();

        assert_eq!(recordings[0].ecg_pulses, Some(vec![0.5, 1.5]));
    }

    #[test]
    fn test_missing_column() {
        let raw = "pet_id,breeds,weight,age,ecg_pulses\n5,Pug,8,3,1.0\n";
        let result = CsvRecordingAdapter::new().parse(raw);

        assert!(matches!(result, Err(ComputeError::MissingField(ref m)) if m.contains("duration")));
    }

    #[test]
    fn test_invalid_number() {
        let raw = "pet_id,breeds,weight,age,duration,ecg_pulses\n5,Pug,heavy,3,2,1.0\n";
        let result = CsvRecordingAdapter::new().parse(raw);

        assert!(matches!(result, Err(ComputeError::ParseError(ref m)) if m.contains("weight")));
    }

    #[test]
    fn test_invalid_pulse_token() {
        let raw = "pet_id,breeds,weight,age,duration,ecg_pulses\n5,Pug,8,3,2,\"1.0,x\"\n";
        assert!(CsvRecordingAdapter::new().parse(raw).is_err());
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        assert!(CsvRecordingAdapter::with_delimiter('§').is_err());
    }
}

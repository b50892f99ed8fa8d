use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::config::OutputFormat;
use crate::sim_params::SimParams;

/// State and metrics of the simulation after one completed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSnapshot {
    /// Zero-based index of the step this snapshot closes.
    pub step: u32,
    /// Fraction of agents classified happy during the step.
    pub happy_fraction: f64,
    pub happy_count: u32,
    pub unhappy_count: u32,
    /// Agents moved during the step's relocation pass.
    pub relocated: u32,
    /// Row-major cell values after relocation. Only present when
    /// `output.save_cells_in_snapshot` is enabled.
    #[serde(default)]
    pub cells: Option<Vec<u8>>,
}

/// Everything a finished run hands to downstream consumers (plots, frames).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub params: SimParams,
    /// Row-major layout right after initialization.
    pub initial_cells: Vec<u8>,
    pub snapshots: Vec<StepSnapshot>,
    /// One happy fraction per executed step.
    pub happiness: Vec<f64>,
}

impl RunRecord {
    pub fn steps_executed(&self) -> usize {
        self.happiness.len()
    }
}

/// Serializes a run record in the requested format.
pub fn write_run_record<W: Write>(writer: W, record: &RunRecord, format: OutputFormat) -> Result<()> {
    let mut writer = writer;
    match format {
        OutputFormat::Json => serde_json::to_writer(&mut writer, record)
            .context("Failed to serialize run record to JSON")?,
        OutputFormat::Bincode => bincode::serialize_into(&mut writer, record)
            .context("Failed to serialize run record to bincode")?,
        OutputFormat::MessagePack => rmp_serde::encode::write_named(&mut writer, record)
            .context("Failed to serialize run record to MessagePack")?,
    }
    writer.flush().context("Failed to flush run record")?;
    Ok(())
}

/// Reads a run record written by [`write_run_record`].
pub fn read_run_record<R: Read>(reader: R, format: OutputFormat) -> Result<RunRecord> {
    let record = match format {
        OutputFormat::Json => serde_json::from_reader(reader)
            .context("Failed to parse JSON run record")?,
        OutputFormat::Bincode => bincode::deserialize_from(reader)
            .context("Failed to parse bincode run record")?,
        OutputFormat::MessagePack => rmp_serde::decode::from_read(reader)
            .context("Failed to parse MessagePack run record")?,
    };
    Ok(record)
}

pub fn save_run_record<P: AsRef<Path>>(path: P, record: &RunRecord, format: OutputFormat) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create run record file '{}'", path.display()))?;
    write_run_record(BufWriter::new(file), record, format)
}

/// Loads a run record, picking the format from the file extension.
pub fn load_run_record<P: AsRef<Path>>(path: P) -> Result<RunRecord> {
    let path = path.as_ref();
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let format = OutputFormat::from_extension(ext)
        .with_context(|| format!("Unknown run record extension '{}' for '{}'", ext, path.display()))?;
    let file = File::open(path)
        .with_context(|| format!("Failed to open run record '{}'", path.display()))?;
    read_run_record(BufReader::new(file), format)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> RunRecord {
        RunRecord {
            params: SimParams {
                cells_side: 3,
                num_cells: 9,
                num_agents: 4,
                type_counts: [5, 2, 2],
                alike_preference: 0.5,
                tlength: 2,
                record_interval_steps: 1,
                seed: 11,
            },
            initial_cells: vec![1, 0, 2, 0, 1, 0, 2, 0, 0],
            snapshots: vec![
                StepSnapshot {
                    step: 0,
                    happy_fraction: 0.5,
                    happy_count: 2,
                    unhappy_count: 2,
                    relocated: 2,
                    cells: Some(vec![0, 1, 2, 0, 1, 0, 0, 2, 0]),
                },
                StepSnapshot {
                    step: 1,
                    happy_fraction: 1.0,
                    happy_count: 4,
                    unhappy_count: 0,
                    relocated: 0,
                    cells: None,
                },
            ],
            happiness: vec![0.5, 1.0],
        }
    }

    #[test]
    fn every_format_reads_back_what_it_wrote() {
        let record = sample_record();
        for format in [OutputFormat::Json, OutputFormat::Bincode, OutputFormat::MessagePack] {
            let mut buffer = Vec::new();
            write_run_record(&mut buffer, &record, format).unwrap();
            let decoded = read_run_record(buffer.as_slice(), format).unwrap();
            assert_eq!(decoded, record, "format {:?}", format);
        }
    }

    #[test]
    fn json_writes_missing_cells_as_null() {
        let mut buffer = Vec::new();
        write_run_record(&mut buffer, &sample_record(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["snapshots"][0]["cells"].as_array().map(Vec::len), Some(9));
        assert!(value["snapshots"][1]["cells"].is_null());
    }

    #[test]
    fn load_picks_format_from_extension() {
        let path = std::env::temp_dir().join(format!("segregation-record-{}.msgpack", std::process::id()));
        let record = sample_record();
        save_run_record(&path, &record, OutputFormat::MessagePack).unwrap();
        let loaded = load_run_record(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.steps_executed(), 2);
        assert_eq!(loaded, record);
    }

    #[test]
    fn unknown_extension_is_an_error() {
        assert!(load_run_record("run.yaml").is_err());
    }
}

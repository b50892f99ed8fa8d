use crate::grid::Grid;
use anyhow::{Context, Result};
use log::info;
use segregation_common::{save_run_record, OutputConfig, RunRecord};
use std::io::Write;
use std::path::PathBuf;

pub fn run_record_path(output: &OutputConfig) -> PathBuf {
    PathBuf::from(format!("{}_run.{}", output.base_filename, output.format.extension()))
}

pub fn happiness_csv_path(output: &OutputConfig) -> PathBuf {
    PathBuf::from(format!("{}_happiness.csv", output.base_filename))
}

pub fn final_grid_csv_path(output: &OutputConfig) -> PathBuf {
    PathBuf::from(format!("{}_final_grid.csv", output.base_filename))
}

/// Writes `step,happy_fraction` rows, one per executed step.
pub fn write_happiness_csv<W: Write>(writer: W, happiness: &[f64]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(["step", "happy_fraction"])?;
    for (step, fraction) in happiness.iter().enumerate() {
        writer.write_record(&[step.to_string(), format!("{:.6}", fraction)])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes one CSV row per grid row, no header.
pub fn write_grid_csv<W: Write>(writer: W, grid: &Grid) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    for row in grid.to_rows() {
        writer.write_record(row.iter().map(u8::to_string))?;
    }
    writer.flush()?;
    Ok(())
}

/// Saves whatever `output` asks for. Returns the paths written.
pub fn save_outputs(output: &OutputConfig, record: &RunRecord, final_grid: &Grid) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if output.save_snapshots {
        let path = run_record_path(output);
        save_run_record(&path, record, output.format)?;
        info!(
            "Run record with {} snapshots saved to {} ({:?} format)",
            record.snapshots.len(),
            path.display(),
            output.format
        );
        written.push(path);
    } else {
        info!("Skipping saving the run record as per config (save_snapshots is false).");
    }

    if output.save_happiness {
        let path = happiness_csv_path(output);
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create happiness file '{}'", path.display()))?;
        write_happiness_csv(file, &record.happiness)?;
        info!("Happiness record saved to {}", path.display());
        written.push(path);
    }

    if output.save_final_grid {
        let path = final_grid_csv_path(output);
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create grid file '{}'", path.display()))?;
        write_grid_csv(file, final_grid)?;
        info!("Final grid saved to {}", path.display());
        written.push(path);
    }

    Ok(written)
}

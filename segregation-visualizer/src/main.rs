use anyhow::{anyhow, Context, Result};
use clap::Parser;
use env_logger::Builder;
use image::{Rgba, RgbaImage};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use log::{info, warn, LevelFilter};
use palette::{FromColor, Hsv, Srgb};
use plotters::prelude::*;
use rayon::prelude::*;
use segregation_common::{load_run_record, RunRecord};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Command-line arguments for the visualizer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run record written by the engine (.json, .bin or .msgpack)
    #[arg(short, long)]
    input: PathBuf,

    /// Directory receiving the grid frames and the happiness chart
    #[arg(short, long, default_value = "frames")]
    output_dir: PathBuf,

    /// Edge length of one grid cell in pixels
    #[arg(long, default_value_t = 8)]
    cell_px: u32,

    /// Width of the happiness chart in pixels
    #[arg(long, default_value_t = 1024)]
    chart_width: u32,

    /// Height of the happiness chart in pixels
    #[arg(long, default_value_t = 600)]
    chart_height: u32,

    /// Color of empty cells (black, white, gray, red, green, blue, yellow, cyan, magenta)
    #[arg(long, default_value = "white")]
    empty_color: String,

    /// Only draw the happiness chart
    #[arg(long)]
    skip_frames: bool,
}

// Color definitions for named colors (RGBA format)
const COLOR_MAP: &[(&str, [u8; 4])] = &[
    ("black", [0, 0, 0, 255]),
    ("white", [255, 255, 255, 255]),
    ("gray", [128, 128, 128, 255]),
    ("red", [255, 0, 0, 255]),
    ("green", [0, 255, 0, 255]),
    ("blue", [0, 0, 255, 255]),
    ("yellow", [255, 255, 0, 255]),
    ("cyan", [0, 255, 255, 255]),
    ("magenta", [255, 0, 255, 255]),
];

/// Parse a color name to RGBA values
fn parse_color(color_name: &str) -> [u8; 4] {
    for &(name, color) in COLOR_MAP {
        if name.eq_ignore_ascii_case(color_name) {
            return color;
        }
    }
    // Default to white if color not found
    warn!("Color '{}' not recognized, using white.", color_name);
    [255, 255, 255, 255]
}

/// One color per agent type, evenly spaced around the HSV hue circle.
fn agent_type_colors(count: usize) -> Vec<[u8; 4]> {
    (0..count)
        .map(|i| {
            let hue = 20.0 + 360.0 * i as f32 / count as f32;
            let rgb = Srgb::from_color(Hsv::new(hue, 0.75, 0.85));
            [
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
                255,
            ]
        })
        .collect()
}

/// A grid layout waiting to be drawn.
struct FrameSource<'a> {
    /// 0 for the initial layout, `step + 1` afterwards.
    index: usize,
    cells: &'a [u8],
}

/// Paints each cell as a `cell_px` square: `empty_color` for 0, `type_colors[v - 1]` for agents.
fn draw_frame(cells: &[u8], side: u32, cell_px: u32, empty_color: [u8; 4], type_colors: &[[u8; 4]]) -> RgbaImage {
    let size = side * cell_px;
    let mut image = RgbaImage::from_pixel(size, size, Rgba(empty_color));

    for (idx, &value) in cells.iter().enumerate() {
        if value == 0 {
            continue;
        }
        let color = type_colors
            .get(usize::from(value) - 1)
            .copied()
            .unwrap_or([0, 0, 0, 255]);
        let row = idx as u32 / side;
        let col = idx as u32 % side;
        for y in row * cell_px..(row + 1) * cell_px {
            for x in col * cell_px..(col + 1) * cell_px {
                image.put_pixel(x, y, Rgba(color));
            }
        }
    }
    image
}

/// Layouts to draw, skipping any whose length does not match the grid.
fn frame_sources(record: &RunRecord) -> Vec<FrameSource<'_>> {
    let side = record.params.cells_side as usize;
    let num_cells = side * side;
    let initial = FrameSource { index: 0, cells: record.initial_cells.as_slice() };
    let snapshots = record.snapshots.iter().filter_map(|snapshot| {
        snapshot.cells.as_deref().map(|cells| FrameSource {
            index: snapshot.step as usize + 1,
            cells,
        })
    });

    std::iter::once(initial)
        .chain(snapshots)
        .filter(|source| {
            let fits = source.cells.len() == num_cells;
            if !fits {
                warn!(
                    "Skipping frame {}: layout has {} cells, expected {}.",
                    source.index,
                    source.cells.len(),
                    num_cells
                );
            }
            fits
        })
        .collect()
}

/// Renders every layout in the record to `frame_NNNNN.png`, in parallel.
fn render_frames(record: &RunRecord, args: &Args) -> Result<usize> {
    let side = record.params.cells_side;
    let empty_color = parse_color(&args.empty_color);
    let type_colors = agent_type_colors(2);
    let sources = frame_sources(record);

    if sources.len() <= 1 {
        warn!("No snapshot carries a grid layout; at most the initial frame will be drawn.");
        warn!("Enable output.save_cells_in_snapshot in the engine config to record layouts.");
    }

    let progress_bar = ProgressBar::new(sources.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames ({percent}%) [{eta}]")?
            .progress_chars("#>-"),
    );

    sources
        .par_iter()
        .progress_with(progress_bar.clone())
        .try_for_each(|source| -> Result<()> {
            let image = draw_frame(source.cells, side, args.cell_px, empty_color, &type_colors);
            let path = args.output_dir.join(format!("frame_{:05}.png", source.index));
            image
                .save(&path)
                .with_context(|| format!("Failed to write frame {}", path.display()))
        })?;

    progress_bar.finish_with_message(format!("Rendered {} frames", sources.len()));
    Ok(sources.len())
}

/// (step, happy fraction) pairs for the chart's line series.
fn chart_points(happiness: &[f64]) -> Vec<(u32, f64)> {
    happiness
        .iter()
        .enumerate()
        .map(|(step, &fraction)| (step as u32, fraction))
        .collect()
}

/// Draws the happiness-over-time line chart.
fn draw_happiness_chart(path: &Path, happiness: &[f64], width: u32, height: u32) -> Result<()> {
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("Failed to clear chart: {}", e))?;

    let steps = (happiness.len() as u32).max(1);
    let mut chart = ChartBuilder::on(&root)
        .caption("Happy fraction per step", ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(56)
        .build_cartesian_2d(0u32..steps, 0f64..1f64)
        .map_err(|e| anyhow!("Failed to build chart: {}", e))?;

    chart
        .configure_mesh()
        .x_desc("Step")
        .y_desc("Happy fraction")
        .draw()
        .map_err(|e| anyhow!("Failed to draw chart mesh: {}", e))?;

    chart
        .draw_series(LineSeries::new(chart_points(happiness), &BLUE))
        .map_err(|e| anyhow!("Failed to draw happiness series: {}", e))?;

    root.present()
        .map_err(|e| anyhow!("Failed to write chart '{}': {}", path.display(), e))?;
    Ok(())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    run_with_args(args)
}

fn run_with_args(args: Args) -> Result<()> {
    // Initialize logger
    Builder::from_default_env()
        .filter(None, LevelFilter::Info)
        .init();

    info!("Starting Segregation Visualizer...");
    info!("Input file: {}", args.input.display());
    info!("Output directory: {}", args.output_dir.display());

    let record = load_run_record(&args.input)?;
    info!(
        "Loaded run: {}x{} grid, {} agents, alike preference {:.3}, {} steps, {} snapshots",
        record.params.cells_side,
        record.params.cells_side,
        record.params.num_agents,
        record.params.alike_preference,
        record.steps_executed(),
        record.snapshots.len()
    );

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create output directory {}", args.output_dir.display()))?;

    let start_time = Instant::now();

    if args.skip_frames {
        info!("Skipping grid frames as requested.");
    } else {
        let frame_count = render_frames(&record, &args)?;
        info!("Rendered {} frames in {:.2?}", frame_count, start_time.elapsed());
    }

    if record.happiness.is_empty() {
        warn!("Run record has an empty happiness record; skipping chart.");
    } else {
        let chart_path = args.output_dir.join("happiness.png");
        draw_happiness_chart(&chart_path, &record.happiness, args.chart_width, args.chart_height)?;
        info!("Happiness chart saved to {}", chart_path.display());
    }

    info!("Visualization completed in {:.2?}", start_time.elapsed());
    Ok(())
}

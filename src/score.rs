use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{warn, LevelFilter};

use model::ascii_grid::read_raster;
use model::cli::StoreVariant;
use model::scoring::{self, Metric};

mod minimal_logger;

/// Score an arrival-time raster written by an earlier run.
fn main() -> Result<()> {
    let mut arrivals = PathBuf::from("output/arrival_times.asc");
    let mut control_points = PathBuf::from("sites/dates.txt");
    let mut metric: Option<Metric> = None;
    let mut quiet = false;
    {
        let mut parser = argparse::ArgumentParser::new();
        parser.set_description("Compare simulated arrival times with dated sites");
        parser.refer(&mut arrivals).add_argument(
            "arrivals",
            argparse::Store,
            "Grid-ASCII raster of arrival times",
        );
        parser.refer(&mut control_points).add_argument(
            "control_points",
            argparse::Store,
            "file with `name x y date` rows",
        );
        parser.refer(&mut metric).add_option(
            &["--metric"],
            StoreVariant,
            "rmse (default) or mean_absolute",
        );
        parser.refer(&mut quiet).add_option(
            &["-q", "--quiet"],
            argparse::StoreTrue,
            "do not report individual control points",
        );
        parser.parse_args_or_exit();
    }
    minimal_logger::init(if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    });

    let raster = read_raster(&arrivals)
        .with_context(|| format!("Failed to read arrival times from {}", arrivals.display()))?;
    let (geometry, arrival_times) = scoring::arrivals_from_raster(&raster);
    let points = scoring::load_control_points(&control_points);
    let score = scoring::score_arrivals(
        &geometry,
        &arrival_times,
        &points,
        metric.unwrap_or_default(),
    );
    score.log_report();
    match score.value() {
        Some(value) => println!("{}", value),
        None => warn!("No control points to score against"),
    }
    Ok(())
}

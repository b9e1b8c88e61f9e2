/*!
What a running simulation reports about itself.

Progress goes to the log. Occupancy snapshots are written as Grid-ASCII rasters
with 1 for inhabited and 0 for empty cells, one file `<stem>_<year>.asc` per
snapshot, so that the spread of the expansion can be animated afterwards.
 */
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde_derive::{Deserialize, Serialize};

use crate::ascii_grid::write_raster;
use crate::error::RasterError;
use crate::simulation::Simulation;
use crate::Years;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Log progress every this many steps. 0 never logs.
    pub log_every: u32,
    /// Write an occupancy snapshot every this many steps. 0 never writes.
    pub snapshot_every: u32,
    pub snapshot_stem: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            log_every: 100,
            snapshot_every: 0,
            snapshot_stem: None,
        }
    }
}

fn due(every: u32, step: u32) -> bool {
    every > 0 && step % every == 0
}

/// Called after every step.
pub fn observe(simulation: &Simulation, o: &Settings) {
    let step = simulation.steps();
    if due(o.log_every, step) {
        info!(
            "Year {}: {} settled cells, {} persons",
            simulation.year(),
            simulation.settled().len(),
            total_population(simulation)
        );
    }
    if let Some(stem) = &o.snapshot_stem {
        if due(o.snapshot_every, step) {
            let path = snapshot_path(stem, simulation.year());
            if let Err(e) = write_occupancy(simulation, &path) {
                warn!("Skipping snapshot: {}", e);
            }
        }
    }
}

pub fn total_population(simulation: &Simulation) -> f64 {
    simulation
        .settled()
        .iter()
        .map(|&cell| simulation.grid().population(cell))
        .sum()
}

pub fn snapshot_path(stem: &Path, year: Years) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(format!("_{}.asc", year));
    PathBuf::from(name)
}

pub fn write_occupancy(simulation: &Simulation, path: &Path) -> Result<(), RasterError> {
    let grid = simulation.grid();
    let occupied: Vec<u8> = grid
        .populations()
        .values()
        .iter()
        .map(|&p| if p > 0. { 1 } else { 0 })
        .collect();
    write_raster(path, &grid.geometry().header(0.), &occupied)
}

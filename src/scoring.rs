/*!
Comparison of simulated arrival times with independently dated sites.

A control point whose cell was never reached by the simulation is matched with
the first settled cell around it, in row-major order. If none of the nine cells
was settled, the simulated date is 0 and the whole observed date counts as
error, which ranks runs that never reach a site far below runs that reach it
late.
 */
use std::path::Path;

use log::{info, warn};
use serde_derive::{Deserialize, Serialize};

use crate::ascii_grid::Raster;
use crate::geometry::{Cell, GridGeometry};
use crate::grid::Grid;
use crate::layer::Layer;
use crate::neighborhood::MOORE;
use crate::Years;

/// A dated archaeological site, in projected coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub date: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Root mean squared error
    Rmse,
    MeanAbsolute,
}

impl Default for Metric {
    fn default() -> Metric {
        Metric::Rmse
    }
}

/// One control point and the arrival time it was matched with.
#[derive(Debug, Clone, PartialEq)]
pub struct PointScore {
    pub name: String,
    pub cell: Cell,
    pub observed: f64,
    /// 0 if neither the cell nor its neighbours were settled
    pub simulated: Years,
}

impl PointScore {
    pub fn residual(&self) -> f64 {
        f64::from(self.simulated) - self.observed
    }

    pub fn reached(&self) -> bool {
        self.simulated != 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub metric: Metric,
    pub points: Vec<PointScore>,
}

impl Score {
    /// The aggregated error, or `None` without control points.
    pub fn value(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f64;
        let residuals = self.points.iter().map(PointScore::residual);
        Some(match self.metric {
            Metric::Rmse => (residuals.map(|r| r * r).sum::<f64>() / n).sqrt(),
            Metric::MeanAbsolute => residuals.map(f64::abs).sum::<f64>() / n,
        })
    }

    pub fn unreached(&self) -> usize {
        self.points.iter().filter(|p| !p.reached()).count()
    }

    pub fn log_report(&self) {
        for p in &self.points {
            info!(
                "{}: observed {}, simulated {} at {:?}",
                p.name, p.observed, p.simulated, p.cell
            );
        }
        if self.unreached() > 0 {
            warn!(
                "{} of {} control points were never reached",
                self.unreached(),
                self.points.len()
            );
        }
    }
}

/// Parse `name x y date` rows. Blank lines and lines starting with `#` are
/// skipped, malformed rows are skipped with a warning.
pub fn parse_control_points(text: &str) -> Vec<ControlPoint> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .filter_map(|(i, line)| match parse_row(line) {
            Some(point) => Some(point),
            None => {
                warn!("Skipping malformed control point on line {}: {:?}", i + 1, line);
                None
            }
        })
        .collect()
}

fn parse_row(line: &str) -> Option<ControlPoint> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if let [name, x, y, date] = fields[..] {
        Some(ControlPoint {
            name: name.to_string(),
            x: x.parse().ok()?,
            y: y.parse().ok()?,
            date: date.parse().ok()?,
        })
    } else {
        None
    }
}

pub fn load_control_points(path: &Path) -> Vec<ControlPoint> {
    match std::fs::read_to_string(path) {
        Ok(text) => parse_control_points(&text),
        Err(e) => {
            warn!("No control points from {}: {}", path.display(), e);
            vec![]
        }
    }
}

fn arrival_at(geometry: &GridGeometry, arrivals: &Layer<Years>, cell: Cell) -> Years {
    if geometry.contains(cell) {
        arrivals[cell]
    } else {
        0
    }
}

/// The arrival time of the cell, or of the first settled cell around it.
fn simulated_arrival(geometry: &GridGeometry, arrivals: &Layer<Years>, cell: Cell) -> Years {
    let own = arrival_at(geometry, arrivals, cell);
    if own != 0 {
        return own;
    }
    MOORE
        .iter()
        .map(|&offset| arrival_at(geometry, arrivals, cell.offset(offset)))
        .find(|&t| t != 0)
        .unwrap_or(0)
}

pub fn score_arrivals(
    geometry: &GridGeometry,
    arrivals: &Layer<Years>,
    control_points: &[ControlPoint],
    metric: Metric,
) -> Score {
    let points = control_points
        .iter()
        .map(|point| {
            let cell = geometry.to_grid(point.x, point.y);
            PointScore {
                name: point.name.clone(),
                cell,
                observed: point.date,
                simulated: simulated_arrival(geometry, arrivals, cell),
            }
        })
        .collect();
    Score { metric, points }
}

pub fn score(grid: &Grid, control_points: &[ControlPoint], metric: Metric) -> Score {
    score_arrivals(grid.geometry(), grid.arrival_times(), control_points, metric)
}

/// Arrival times from a raster written earlier. Cells holding the raster's
/// no-data value count as never settled.
pub fn arrivals_from_raster(raster: &Raster) -> (GridGeometry, Layer<Years>) {
    let geometry = GridGeometry::from_header(&raster.header);
    let nodata = raster.header.nodata;
    let values: Vec<Years> = raster
        .values
        .iter()
        .map(|&v| if v == nodata { 0 } else { v.round() as Years })
        .collect();
    let arrivals = Layer::from_values(&geometry, values).unwrap_or_else(|| Layer::new(&geometry));
    (geometry, arrivals)
}

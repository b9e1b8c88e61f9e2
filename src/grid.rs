use std::path::Path;

use log::{debug, info, warn};

use crate::ascii_grid::{read_raster, write_raster, Header, Raster};
use crate::config::LayerSources;
use crate::error::{RasterError, SetupError};
use crate::geometry::{Cell, GridGeometry};
use crate::layer::Layer;
use crate::neighborhood::Neighborhood;
use crate::parameters::ElevationBand;
use crate::snapshots::SnapshotSeries;
use crate::Years;

/// The read-only part of the parameters the grid needs to decide whether a
/// cell can receive migrants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Habitat {
    /// In whole persons. A cell holding this many is full.
    pub capacity: f64,
    pub vegetation_threshold: f64,
    pub suitability_threshold: f64,
    pub elevation: ElevationBand,
}

/// A time-sliced layer together with the slice currently loaded into it.
#[derive(Debug, Clone)]
struct SlicedLayer {
    values: Layer<f64>,
    slices: SnapshotSeries,
    loaded: Option<Years>,
}

impl SlicedLayer {
    fn new(values: Layer<f64>, slices: SnapshotSeries) -> SlicedLayer {
        SlicedLayer {
            values,
            slices,
            loaded: None,
        }
    }

    /// Load the slice nearest to `year`, unless it is already loaded. Any
    /// problem with the slice leaves the previous values in place.
    fn refresh(&mut self, geometry: &GridGeometry, year: Years, name: &str) {
        let (slice, path) = match self.slices.nearest(year) {
            None => return,
            Some(nearest) => nearest,
        };
        if self.loaded == Some(slice) {
            return;
        }
        let raster = match read_raster(path) {
            Ok(raster) => raster,
            Err(e) => {
                warn!("Keeping previous {} layer: {}", name, e);
                return;
            }
        };
        if raster.header.columns != geometry.columns || raster.header.rows != geometry.rows {
            warn!(
                "Keeping previous {} layer: {}",
                name,
                shape_error(geometry, &raster.header)
            );
            return;
        }
        self.values.overwrite(&raster.values);
        self.loaded = Some(slice);
        debug!("Year {}: loaded {} slice {}", year, name, slice);
    }
}

/**
The study area: a fixed raster with the environmental layers that decide where
people can live, and the demographic layers the simulation writes.

Population is counted in whole persons. Arrival times are 0 for cells that were
never settled.
 */
#[derive(Debug, Clone)]
pub struct Grid {
    geometry: GridGeometry,
    habitat: Habitat,
    neighborhood: Neighborhood,

    elevation: Layer<f64>,
    vegetation: SlicedLayer,
    suitability: Option<SlicedLayer>,

    population: Layer<f64>,
    arrival_time: Layer<Years>,
}

impl Grid {
    /// A grid with the given elevation, no vegetation (all 0) and no
    /// suitability layer.
    pub fn new(
        geometry: GridGeometry,
        elevation: Layer<f64>,
        habitat: Habitat,
        neighborhood: Neighborhood,
    ) -> Grid {
        Grid {
            vegetation: SlicedLayer::new(Layer::new(&geometry), SnapshotSeries::empty()),
            suitability: None,
            population: Layer::new(&geometry),
            arrival_time: Layer::new(&geometry),
            geometry,
            habitat,
            neighborhood,
            elevation,
        }
    }

    pub fn with_vegetation(mut self, vegetation: Layer<f64>, slices: SnapshotSeries) -> Grid {
        self.vegetation = SlicedLayer::new(vegetation, slices);
        self
    }

    pub fn with_suitability(mut self, suitability: Layer<f64>, slices: SnapshotSeries) -> Grid {
        self.suitability = Some(SlicedLayer::new(suitability, slices));
        self
    }

    /// Build the grid from the layers on disk. The elevation layer defines
    /// the study area and must exist; the time-sliced layers are only
    /// indexed here and read by `refresh`.
    pub fn load(
        sources: &LayerSources,
        habitat: Habitat,
        neighborhood: Neighborhood,
    ) -> Result<Grid, SetupError> {
        let Raster { header, values } =
            read_raster(&sources.elevation).map_err(SetupError::Elevation)?;
        let geometry = GridGeometry::from_header(&header);
        info!(
            "Study area: {}x{} cells of {} from ({}, {})",
            geometry.columns, geometry.rows, geometry.cell_size, geometry.origin_x, geometry.origin_y
        );
        let elevation = Layer::from_values(&geometry, values)
            .ok_or_else(|| SetupError::Elevation(shape_error(&geometry, &header)))?;

        let vegetation_slices = SnapshotSeries::scan(&sources.vegetation);
        info!("{} vegetation slices", vegetation_slices.len());
        let mut grid = Grid::new(geometry, elevation, habitat, neighborhood)
            .with_vegetation(Layer::new(&geometry), vegetation_slices);

        let suitability_slices = sources
            .suitability_series
            .as_ref()
            .map(SnapshotSeries::scan)
            .unwrap_or_default();
        let suitability = match &sources.suitability {
            Some(path) => load_static(path, &geometry)?,
            None => None,
        };
        match suitability {
            Some(layer) => grid = grid.with_suitability(layer, suitability_slices),
            None if sources.suitability_series.is_some() => {
                grid = grid.with_suitability(Layer::new(&geometry), suitability_slices)
            }
            None => {}
        }
        Ok(grid)
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn habitat(&self) -> &Habitat {
        &self.habitat
    }

    pub fn to_grid(&self, x: f64, y: f64) -> Cell {
        self.geometry.to_grid(x, y)
    }

    pub fn to_projected(&self, cell: Cell) -> (f64, f64) {
        self.geometry.to_projected(cell)
    }

    pub fn population(&self, cell: Cell) -> f64 {
        self.population[cell]
    }

    pub fn set_population(&mut self, cell: Cell, persons: f64) {
        self.population[cell] = persons;
    }

    pub fn arrival_time(&self, cell: Cell) -> Years {
        self.arrival_time[cell]
    }

    pub fn set_arrival_time(&mut self, cell: Cell, year: Years) {
        self.arrival_time[cell] = year;
    }

    pub fn elevation(&self, cell: Cell) -> f64 {
        self.elevation[cell]
    }

    pub fn vegetation(&self, cell: Cell) -> f64 {
        self.vegetation.values[cell]
    }

    pub fn suitability(&self, cell: Cell) -> Option<f64> {
        self.suitability.as_ref().map(|s| s.values[cell])
    }

    /// The score used to rank destinations: suitability where that layer
    /// exists, vegetation otherwise.
    pub fn habitat_score(&self, cell: Cell) -> f64 {
        self.suitability(cell)
            .unwrap_or_else(|| self.vegetation(cell))
    }

    pub fn arrival_times(&self) -> &Layer<Years> {
        &self.arrival_time
    }

    pub fn populations(&self) -> &Layer<f64> {
        &self.population
    }

    /// Whether the environment of a cell allows settlement, regardless of
    /// how many people live there.
    pub fn is_habitable(&self, cell: Cell) -> bool {
        self.geometry.contains(cell)
            && self.habitat.elevation.contains(self.elevation[cell])
            && self.vegetation(cell) >= self.habitat.vegetation_threshold
            && self
                .suitability(cell)
                .map_or(true, |s| s >= self.habitat.suitability_threshold)
    }

    /// Whether a cell can receive migrants. Cells outside the study area
    /// are never suitable.
    pub fn is_suitable(&self, cell: Cell) -> bool {
        self.is_habitable(cell) && self.population[cell] < self.habitat.capacity
    }

    fn suitable_at(&self, cell: Cell, offsets: &[(i32, i32)]) -> Vec<Cell> {
        offsets
            .iter()
            .map(|&offset| cell.offset(offset))
            .filter(|&c| self.is_suitable(c))
            .collect()
    }

    /// Suitable cells among the eight immediate neighbours.
    pub fn neighbors(&self, cell: Cell) -> Vec<Cell> {
        self.suitable_at(cell, self.neighborhood.moore())
    }

    /// Suitable cells at leap distance.
    pub fn leap_cells(&self, cell: Cell) -> Vec<Cell> {
        self.suitable_at(cell, self.neighborhood.leap())
    }

    /// Bring the time-sliced layers to the slice nearest to `year`.
    pub fn refresh(&mut self, year: Years) {
        let geometry = self.geometry;
        self.vegetation.refresh(&geometry, year, "vegetation");
        if let Some(suitability) = &mut self.suitability {
            suitability.refresh(&geometry, year, "suitability");
        }
    }

    /// Write the arrival times as a Grid-ASCII raster, 0 marking cells that
    /// were never settled.
    pub fn write_arrival_times(&self, path: &Path) -> Result<(), RasterError> {
        write_raster(path, &self.geometry.header(0.), self.arrival_time.values())
    }
}

fn shape_error(geometry: &GridGeometry, header: &Header) -> RasterError {
    RasterError::Shape {
        columns: geometry.columns,
        rows: geometry.rows,
        found_columns: header.columns,
        found_rows: header.rows,
    }
}

/// A static layer that is configured but absent is skipped with a warning.
fn load_static(path: &Path, geometry: &GridGeometry) -> Result<Option<Layer<f64>>, SetupError> {
    if !path.exists() {
        warn!(
            "Suitability layer {} not found, settling without it",
            path.display()
        );
        return Ok(None);
    }
    let raster = read_raster(path).map_err(SetupError::Suitability)?;
    if raster.header.columns != geometry.columns || raster.header.rows != geometry.rows {
        return Err(SetupError::Suitability(shape_error(geometry, &raster.header)));
    }
    Ok(Layer::from_values(geometry, raster.values))
}

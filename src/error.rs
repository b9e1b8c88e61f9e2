use std::path::PathBuf;

use thiserror::Error;

/// Problems reading or writing a Grid-ASCII raster.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("could not access raster {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("raster header line {line}: expected `{expected}`, found {found:?}")]
    Header {
        line: usize,
        expected: &'static str,
        found: String,
    },
    #[error("raster value {value:?} at row {row} is not a number")]
    Value { row: usize, value: String },
    #[error("raster declares {expected} cells but contains {found}")]
    CellCount { expected: usize, found: usize },
    #[error("raster is {found_columns}x{found_rows}, the study area is {columns}x{rows}")]
    Shape {
        columns: usize,
        rows: usize,
        found_columns: usize,
        found_rows: usize,
    },
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid parameter `{name}`: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Failures that prevent a simulation from starting. None of these can
/// happen once the first step has run.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("elevation layer is required: {0}")]
    Elevation(#[source] RasterError),
    #[error("static suitability layer: {0}")]
    Suitability(#[source] RasterError),
    #[error("origin ({x}, {y}) lies outside the study area")]
    OriginOutsideGrid { x: f64, y: f64 },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

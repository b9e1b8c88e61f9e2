/*!
Grid-ASCII rasters

All spatial input and output of the model uses the plain-text raster layout
known from ArcInfo: six header lines giving the number of columns and rows,
the lower left corner, the cell size and the no-data sentinel, followed by one
line of values per row, starting with the northernmost row.

```text
NCOLS 255
NROWS 330
XLLCORNER -2985163.8955
YLLCORNER -3022031.214
CELLSIZE 25000
NODATA_value 0
0 0 0 4381 4377 …
```
 */

use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use itertools::Itertools;

use crate::error::RasterError;

const KEYWORDS: [&str; 6] = [
    "NCOLS",
    "NROWS",
    "XLLCORNER",
    "YLLCORNER",
    "CELLSIZE",
    "NODATA_value",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Header {
    pub columns: usize,
    pub rows: usize,
    /// Western edge of the raster
    pub x_corner: f64,
    /// Southern edge of the raster
    pub y_corner: f64,
    pub cell_size: f64,
    pub nodata: f64,
}

impl Header {
    pub fn cells(&self) -> usize {
        self.columns * self.rows
    }
}

/// A raster as it was read from disk, values in row-major order.
#[derive(Debug, Clone)]
pub struct Raster {
    pub header: Header,
    pub values: Vec<f64>,
}

fn header_value<'a>(line_number: usize, line: Option<&'a str>) -> Result<&'a str, RasterError> {
    let expected = KEYWORDS[line_number];
    let line = line.unwrap_or("");
    let mut fields = line.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(key), Some(value), None) if key.eq_ignore_ascii_case(expected) => Ok(value),
        _ => Err(RasterError::Header {
            line: line_number + 1,
            expected,
            found: line.to_string(),
        }),
    }
}

fn parse_header_field<T: std::str::FromStr>(
    line_number: usize,
    line: Option<&str>,
) -> Result<T, RasterError> {
    let value = header_value(line_number, line)?;
    value.parse().map_err(|_| RasterError::Header {
        line: line_number + 1,
        expected: KEYWORDS[line_number],
        found: value.to_string(),
    })
}

pub fn parse_raster(text: &str) -> Result<Raster, RasterError> {
    let mut lines = text.lines();
    let header = Header {
        columns: parse_header_field(0, lines.next())?,
        rows: parse_header_field(1, lines.next())?,
        x_corner: parse_header_field(2, lines.next())?,
        y_corner: parse_header_field(3, lines.next())?,
        cell_size: parse_header_field(4, lines.next())?,
        nodata: parse_header_field(5, lines.next())?,
    };

    let mut values = Vec::with_capacity(header.cells());
    for (row, line) in lines.enumerate() {
        for field in line.split_whitespace() {
            let value = field.parse::<f64>().map_err(|_| RasterError::Value {
                row,
                value: field.to_string(),
            })?;
            values.push(value);
        }
    }
    if values.len() != header.cells() {
        return Err(RasterError::CellCount {
            expected: header.cells(),
            found: values.len(),
        });
    }
    Ok(Raster { header, values })
}

pub fn read_raster(path: &Path) -> Result<Raster, RasterError> {
    let text = std::fs::read_to_string(path).map_err(|source| RasterError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_raster(&text)
}

/// Write `values` (row-major, `header.cells()` of them) with the given
/// header, creating parent directories as needed.
pub fn write_raster<T: Display>(
    path: &Path,
    header: &Header,
    values: &[T],
) -> Result<(), RasterError> {
    debug_assert_eq!(values.len(), header.cells());
    let io_error = |source| RasterError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
    }
    let mut file = BufWriter::new(File::create(path).map_err(io_error)?);
    write_header(&mut file, header).map_err(io_error)?;
    for row in values.chunks(header.columns) {
        writeln!(file, "{}", row.iter().join(" ")).map_err(io_error)?;
    }
    file.flush().map_err(io_error)
}

fn write_header<W: Write>(w: &mut W, header: &Header) -> std::io::Result<()> {
    writeln!(w, "{} {}", KEYWORDS[0], header.columns)?;
    writeln!(w, "{} {}", KEYWORDS[1], header.rows)?;
    writeln!(w, "{} {}", KEYWORDS[2], header.x_corner)?;
    writeln!(w, "{} {}", KEYWORDS[3], header.y_corner)?;
    writeln!(w, "{} {}", KEYWORDS[4], header.cell_size)?;
    writeln!(w, "{} {}", KEYWORDS[5], header.nodata)
}

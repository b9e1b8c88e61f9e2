use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::warn;
use serde_derive::{Deserialize, Serialize};

use crate::Years;

/// Where a time-sliced layer lives on disk: one Grid-ASCII file per slice,
/// named `<prefix><year>.asc`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SeriesLocation {
    pub directory: PathBuf,
    pub prefix: String,
}

/// The slices of a time-sliced layer that actually exist, by year.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSeries {
    slices: BTreeMap<Years, PathBuf>,
}

impl SnapshotSeries {
    pub fn empty() -> SnapshotSeries {
        SnapshotSeries::default()
    }

    /// List the slices in a directory. A missing directory gives an empty
    /// series; the layer then keeps its initial values for the whole run.
    pub fn scan(location: &SeriesLocation) -> SnapshotSeries {
        let entries = match std::fs::read_dir(&location.directory) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "No time slices in {}: {}",
                    location.directory.display(),
                    e
                );
                return SnapshotSeries::empty();
            }
        };
        let slices: BTreeMap<Years, PathBuf> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let path = entry.path();
                let year = slice_year(&path, &location.prefix)?;
                Some((year, path))
            })
            .collect();
        if slices.is_empty() {
            warn!(
                "No files named {}<year>.asc in {}",
                location.prefix,
                location.directory.display()
            );
        }
        SnapshotSeries { slices }
    }

    pub fn from_slices<I: IntoIterator<Item = (Years, PathBuf)>>(slices: I) -> SnapshotSeries {
        SnapshotSeries {
            slices: slices.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// The slice closest to `year`. Of two equally close slices, the one
    /// with the larger year number is used.
    pub fn nearest(&self, year: Years) -> Option<(Years, &Path)> {
        let below = self.slices.range(..=year).next_back();
        let above = self.slices.range(year..).next();
        let (&slice, path) = match (below, above) {
            (Some(b), Some(a)) => {
                if i64::from(*a.0) - i64::from(year) <= i64::from(year) - i64::from(*b.0) {
                    a
                } else {
                    b
                }
            }
            (Some(b), None) => b,
            (None, Some(a)) => a,
            (None, None) => return None,
        };
        Some((slice, path.as_path()))
    }
}

fn slice_year(path: &Path, prefix: &str) -> Option<Years> {
    let name = path.file_name()?.to_str()?;
    name.strip_prefix(prefix)?.strip_suffix(".asc")?.parse().ok()
}

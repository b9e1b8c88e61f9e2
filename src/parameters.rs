use serde_derive::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::grid::Habitat;
use crate::Years;

/// When a cell is crowded enough to send out migrants.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FissionThreshold {
    /// A fixed number of persons
    Absolute(f64),
    /// A proportion of the carrying capacity
    FractionOfCapacity(f64),
    /// The carrying capacity itself
    Capacity,
}

/// How many persons leave a cell that undergoes fission.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Emigration {
    /// Everyone above the fission threshold
    Excess,
    /// A fixed share of the current population
    Share(f64),
}

/// Which of the candidate cells receive the migrants.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DispersalRule {
    EvenSplit,
    RandomPick,
    BestSuitability,
}

/// Which cells at leap distance count as leapfrogging targets.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeapRing {
    /// Cells whose rounded distance is exactly the leap distance
    Exact,
    /// Cells beyond the immediate neighbours, up to the leap distance
    Within,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Clock {
    /// Years before present, counting down
    Backward,
    /// Calendar years, counting up
    Forward,
}

impl Clock {
    pub fn advance(self, year: Years) -> Years {
        match self {
            Clock::Backward => year - 1,
            Clock::Forward => year + 1,
        }
    }

    /// Whether `year` lies beyond `stop` in the direction of the clock.
    pub fn passed(self, year: Years, stop: Years) -> bool {
        match self {
            Clock::Backward => year < stop,
            Clock::Forward => year > stop,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Seed {
    /// Reproducible runs
    Fixed(u64),
    /// A different stream for every run, for stochastic ensembles
    FromClock,
}

impl Seed {
    pub fn resolve(self) -> u64 {
        match self {
            Seed::Fixed(seed) => seed,
            Seed::FromClock => std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0),
        }
    }
}

/// Elevations (in the units of the elevation layer) that can be settled,
/// `minimum <= elevation < maximum`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ElevationBand {
    pub minimum: f64,
    pub maximum: f64,
}

impl ElevationBand {
    pub fn contains(&self, elevation: f64) -> bool {
        self.minimum <= elevation && elevation < self.maximum
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Parameters {
    pub start_year: Years,
    pub stop_year: Years,
    pub clock: Clock,
    /// Projected coordinates of the centre of origin
    pub origin: (f64, f64),
    /// Initial population of the origin, as a proportion of capacity
    pub initial_fraction: f64,

    /// Persons per cell, already scaled by the cell area
    pub capacity: f64,
    pub growth_rate: f64,
    pub fission_threshold: FissionThreshold,
    pub emigration: Emigration,
    pub dispersal: DispersalRule,
    /// In cells. 0 disables leapfrogging.
    pub leap_distance: u32,
    pub leap_ring: LeapRing,

    pub vegetation_threshold: f64,
    pub suitability_threshold: f64,
    pub elevation: ElevationBand,

    /// Reload the time-sliced layers in every year divisible by this. 0
    /// keeps the environment of the start year.
    pub refresh_every: u32,
    /// Stop once more than this many cells have been settled
    pub saturation_cap: usize,
    pub seed: Seed,
}

impl Parameters {
    /// The fission threshold in persons.
    pub fn fission_threshold(&self) -> f64 {
        match self.fission_threshold {
            FissionThreshold::Absolute(persons) => persons,
            FissionThreshold::FractionOfCapacity(f) => f * self.capacity,
            FissionThreshold::Capacity => self.capacity,
        }
    }

    /// The largest whole number of persons a cell holds after growth.
    pub fn ceiling(&self) -> f64 {
        self.capacity.floor()
    }

    /// Whether a cell with this many persons undergoes fission. Growth never
    /// takes a cell beyond the ceiling, so a capacity threshold is reached
    /// when the cell is full.
    pub fn is_crowded(&self, population: f64) -> bool {
        match self.fission_threshold {
            FissionThreshold::Capacity => population >= self.ceiling(),
            _ => population > self.fission_threshold(),
        }
    }

    pub fn habitat(&self) -> Habitat {
        Habitat {
            capacity: self.ceiling(),
            vegetation_threshold: self.vegetation_threshold,
            suitability_threshold: self.suitability_threshold,
            elevation: self.elevation,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(name: &'static str, reason: &str) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid {
                name,
                reason: reason.to_string(),
            })
        }

        if !(self.capacity >= 1.) {
            return invalid("capacity", "must hold at least one person");
        }
        if !(self.growth_rate >= 0. && self.growth_rate.is_finite()) {
            return invalid("growth_rate", "must be a non-negative number");
        }
        if !(self.initial_fraction > 0. && self.initial_fraction <= 1.) {
            return invalid("initial_fraction", "must lie in (0, 1]");
        }
        match self.fission_threshold {
            FissionThreshold::Absolute(p) if !(p >= 0.) => {
                return invalid("fission_threshold", "must not be negative")
            }
            FissionThreshold::FractionOfCapacity(f) if !(f >= 0. && f <= 1.) => {
                return invalid("fission_threshold", "fraction must lie in [0, 1]")
            }
            FissionThreshold::Capacity if self.emigration == Emigration::Excess => {
                return invalid("emigration", "a full cell has no excess over its capacity")
            }
            FissionThreshold::Capacity => {}
            _ if self.fission_threshold() >= self.ceiling() => {
                return invalid(
                    "fission_threshold",
                    "is never exceeded by a full cell, use `capacity` instead",
                )
            }
            _ => {}
        }
        if let Emigration::Share(s) = self.emigration {
            if !(s > 0. && s <= 1.) {
                return invalid("emigration", "share must lie in (0, 1]");
            }
        }
        if !(self.elevation.minimum < self.elevation.maximum) {
            return invalid("elevation", "minimum must lie below maximum");
        }
        if self.saturation_cap == 0 {
            return invalid("saturation_cap", "must be positive");
        }
        // 0 marks cells that were never settled, so no simulated year may be 0.
        if self.start_year == 0
            || self.stop_year == 0
            || self.start_year.signum() != self.stop_year.signum()
        {
            return invalid("stop_year", "the simulated years must not include year 0");
        }
        if self.clock.passed(self.start_year, self.stop_year) {
            return invalid("stop_year", "lies before the start year on this clock");
        }
        Ok(())
    }
}

impl Default for Parameters {
    /// The reference run: an expansion starting 4400 BP in south-western
    /// Amazonia on a 25 km grid in South America Albers projection.
    fn default() -> Parameters {
        Parameters {
            start_year: 4400,
            stop_year: 500,
            clock: Clock::Backward,
            origin: (-167889.855960219, 2409569.58522236),
            initial_fraction: 1.0,

            // 1 person/km² on 625 km² cells
            capacity: 625.,
            growth_rate: 0.02,
            fission_threshold: FissionThreshold::FractionOfCapacity(0.6),
            emigration: Emigration::Share(0.4),
            dispersal: DispersalRule::EvenSplit,
            leap_distance: 0,
            leap_ring: LeapRing::Within,

            vegetation_threshold: 0.5,
            suitability_threshold: 0.1,
            elevation: ElevationBand {
                minimum: 0.,
                maximum: 1000.,
            },

            // The paleovegetation reconstructions come in centennial slices.
            refresh_every: 100,
            // About half the raster is land; past that the continent is full.
            saturation_cap: 40_000,
            seed: Seed::Fixed(0),
        }
    }
}

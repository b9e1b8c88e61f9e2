use log::{debug, info, warn};

use crate::dispersal::DispersalPolicy;
use crate::error::SetupError;
use crate::geometry::Cell;
use crate::grid::Grid;
use crate::observation;
use crate::parameters::{Emigration, Parameters};
use crate::Years;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The step budget was used up
    StepsExhausted,
    /// The clock went past the stop year
    ReachedStopYear,
    /// More cells were settled than the saturation cap allows
    Saturated,
}

/**
The state of a run: the grid with its populations and arrival times, the cells
settled so far in the order they were settled, and the clock.

A cell enters the settled list exactly once, at the step in which it first
receives people, and its arrival time is set at the same moment. Cells that
later lose all their inhabitants stay on the list.
 */
#[derive(Debug, Clone)]
pub struct Simulation {
    grid: Grid,
    parameters: Parameters,
    policy: DispersalPolicy,
    seed: u64,
    settled: Vec<Cell>,
    year: Years,
    steps: u32,
}

impl Simulation {
    /// Seed the origin cell and load the environment of the start year. The
    /// grid must have been built with the habitat of the same parameters.
    pub fn initialize(parameters: Parameters, mut grid: Grid) -> Result<Simulation, SetupError> {
        parameters.validate()?;
        let (x, y) = parameters.origin;
        let origin = grid.to_grid(x, y);
        if !grid.geometry().contains(origin) {
            return Err(SetupError::OriginOutsideGrid { x, y });
        }

        grid.refresh(parameters.start_year);
        if !grid.is_habitable(origin) {
            warn!(
                "The origin {:?} is not habitable in {}, settling it anyway",
                origin, parameters.start_year
            );
        }

        let seed = parameters.seed.resolve();
        info!("Random seed: {}", seed);
        let founders = (parameters.initial_fraction * parameters.capacity)
            .round()
            .max(1.)
            .min(parameters.ceiling());
        grid.set_population(origin, founders);
        grid.set_arrival_time(origin, parameters.start_year);
        info!(
            "{} founders at {:?} in {}",
            founders, origin, parameters.start_year
        );

        Ok(Simulation {
            grid,
            policy: DispersalPolicy::new(parameters.dispersal, seed),
            seed,
            settled: vec![origin],
            year: parameters.start_year,
            steps: 0,
            parameters,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// The seed the random number generator was started from, also when it
    /// was taken from the clock.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn settled(&self) -> &[Cell] {
        &self.settled
    }

    /// The year the next step will simulate.
    pub fn year(&self) -> Years {
        self.year
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Logistic-free growth: every settled cell grows by the rounded growth
    /// increment and is capped at the carrying capacity.
    pub fn grow(&mut self) {
        let ceiling = self.parameters.ceiling();
        let r = self.parameters.growth_rate;
        for &cell in &self.settled {
            let n = self.grid.population(cell);
            self.grid.set_population(cell, (n + (n * r).round()).min(ceiling));
        }
    }

    fn migrants(&self, population: f64, threshold: f64) -> u64 {
        let leaving = match self.parameters.emigration {
            Emigration::Excess => population - threshold,
            Emigration::Share(share) => population * share,
        };
        leaving.round().max(0.).min(population) as u64
    }

    /// Crowded cells send migrants to free neighbours, or to cells at leap
    /// distance when all neighbours are taken. Only cells settled before this
    /// phase disperse; cells settled during it wait for the next step.
    pub fn disperse(&mut self) {
        let threshold = self.parameters.fission_threshold();
        let ceiling = self.parameters.ceiling();
        let leaping = self.parameters.leap_distance > 0;
        let settled_before = self.settled.len();
        for i in 0..settled_before {
            let cell = self.settled[i];
            let population = self.grid.population(cell);
            if !self.parameters.is_crowded(population) {
                continue;
            }
            let migrants = self.migrants(population, threshold);
            if migrants == 0 {
                continue;
            }

            let mut candidates = self.grid.neighbors(cell);
            if candidates.is_empty() && leaping {
                candidates = self.grid.leap_cells(cell);
            }
            if candidates.is_empty() {
                self.grid.set_population(cell, population.min(ceiling));
                continue;
            }

            let allocation = self.policy.allocate(&candidates, migrants, &self.grid);
            let moved: u64 = allocation.iter().map(|&(_, persons)| persons).sum();
            self.grid.set_population(cell, population - moved as f64);
            for (destination, persons) in allocation {
                let before = self.grid.population(destination);
                self.grid.set_population(destination, before + persons as f64);
                if self.grid.arrival_time(destination) == 0 {
                    self.settle(destination);
                }
            }
        }
    }

    fn settle(&mut self, cell: Cell) {
        debug!("Year {}: settled {:?}", self.year, cell);
        self.grid.set_arrival_time(cell, self.year);
        self.settled.push(cell);
    }

    /// Reload the time-sliced layers in years that are multiples of the
    /// refresh interval.
    pub fn refresh_environment(&mut self) {
        let every = self.parameters.refresh_every as Years;
        if every > 0 && self.year % every == 0 {
            self.grid.refresh(self.year);
        }
    }

    pub fn step(&mut self) {
        self.grow();
        self.disperse();
        self.refresh_environment();
        self.year = self.parameters.clock.advance(self.year);
        self.steps += 1;
    }

    /// Step until the stop year has been simulated, the settlement saturates,
    /// or `max_steps` steps have run.
    pub fn run(&mut self, max_steps: u32, o: &observation::Settings) -> Termination {
        for _ in 0..max_steps {
            self.step();
            observation::observe(self, o);
            if self.settled.len() > self.parameters.saturation_cap {
                info!(
                    "Saturated with {} settled cells in {}",
                    self.settled.len(),
                    self.year
                );
                return Termination::Saturated;
            }
            if self.parameters.clock.passed(self.year, self.parameters.stop_year) {
                info!("Reached {}", self.parameters.stop_year);
                return Termination::ReachedStopYear;
            }
        }
        info!("Ended after {} steps in {}", self.steps, self.year);
        Termination::StepsExhausted
    }
}
